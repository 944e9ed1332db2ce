/// Readiness direction a half-connection is registered for.
///
/// A descriptor is watched for exactly one direction at a time; switching
/// phase means re-registering with the other variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interest {
    /// Wake when the descriptor has data (or EOF/error) to read.
    Readable,

    /// Wake when the descriptor can accept writes (or a connect completed).
    Writable,
}
