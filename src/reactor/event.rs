/// A readiness event reported by the poller.
///
/// Error and hang-up conditions are folded into `readable` so that the
/// owning handler observes them through its next receive call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Event {
    /// Token the descriptor was registered with.
    pub(crate) token: u64,

    /// The descriptor is readable (or errored / hung up).
    pub(crate) readable: bool,

    /// The descriptor is writable.
    pub(crate) writable: bool,
}
