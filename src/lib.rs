//! # Sluice
//!
//! **Sluice** is a forward HTTP proxy built around a single-threaded,
//! non-blocking, readiness-driven connection engine.
//!
//! Clients send absolute-form `GET` requests
//! (`GET http://host[:port]/path HTTP/1.x`). For each one the proxy resolves
//! the target, rewrites the request line to origin-form, opens a
//! non-blocking connection to the origin, sends the request and relays the
//! response back until the origin closes.
//!
//! All sockets are multiplexed over one `epoll` instance driven by one
//! thread. There are no locks: the [`Proxy`] context owns the poller, the
//! connection [`Registry`] and the receive buffer, and every handler runs to
//! completion without blocking.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sluice::{Config, Proxy};
//!
//! fn main() -> Result<(), sluice::Error> {
//!     let config = Config::default();
//!     let mut proxy = Proxy::bind(&config)?;
//!     proxy.run()
//! }
//! ```
//!
//! ## Modules
//!
//! - [`http`]: URL resolution and request rewriting
//! - [`proxy`]: the dispatcher, registry and relay handlers
//! - [`config`]: command-line and environment configuration
//! - [`logging`]: `tracing` subscriber setup
//!
//! ## Limitations
//!
//! Each relay step is a single `send`/`recv`. A short write is logged and
//! the unsent tail is dropped rather than buffered. Only `GET` is proxied,
//! one request per connection, without keep-alive, TLS or bodies.

mod net;
mod reactor;
mod utils;

pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod proxy;

pub use config::{Config, LogFormat};
pub use error::Error;
pub use proxy::{HalfConnection, Proxy, Registry, Resolve, Role, State, SystemResolver};
pub use reactor::Interest;
pub use utils::Handle;
