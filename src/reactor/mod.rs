//! Readiness polling primitives.
//!
//! This module wraps the operating system pieces the dispatcher is built on:
//! - the `epoll` poller and its interest model,
//! - raw socket syscalls,
//! - readiness events,
//! - idle deadlines for the timer heap.
//!
//! Everything here is single-threaded and owned by the dispatcher context.

mod event;
mod timer;

pub(crate) mod poller;

pub(crate) use event::Event;
pub(crate) use poller::Poller;
pub use poller::common::Interest;
pub(crate) use timer::TimerEntry;
