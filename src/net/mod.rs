//! TCP sockets owned by half-connections.
//!
//! These types are thin, non-blocking wrappers over raw descriptors. They do
//! not register themselves anywhere; the connection registry decides what
//! the poller watches. Dropping a socket closes its descriptor.

mod tcp;

pub(crate) use tcp::listener::TcpListener;
pub(crate) use tcp::stream::TcpStream;
