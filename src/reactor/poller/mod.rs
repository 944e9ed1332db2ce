//! Platform I/O poller.
//!
//! The poller is the readiness-polling primitive the dispatcher depends on:
//! register, modify and deregister descriptor interest, and wait for
//! readiness with an optional timeout.
//!
//! Only the Linux `epoll` backend exists; the concrete type is selected at
//! compile time.

pub(crate) mod common;

#[cfg(target_os = "linux")]
mod epoll;

#[cfg(target_os = "linux")]
pub(crate) type Poller = epoll::EpollPoller;

#[cfg(not(target_os = "linux"))]
compile_error!("sluice requires Linux (epoll)");

#[cfg(unix)]
pub(crate) mod unix;

#[cfg(unix)]
pub(crate) use unix as platform;
