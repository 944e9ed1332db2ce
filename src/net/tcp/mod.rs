//! TCP socket implementation.
//!
//! - [`listener`]: the listening socket and `accept`,
//! - [`stream`]: client and target connections with single-shot I/O.

pub(crate) mod listener;
pub(crate) mod stream;
