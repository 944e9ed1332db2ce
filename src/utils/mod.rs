//! Small data structures used by the proxy core.
//!
//! This module exposes a generation-checked [`Slab`] used by the connection
//! registry to map poller tokens to half-connections.

mod slab;

pub use slab::Handle;
pub(crate) use slab::Slab;
