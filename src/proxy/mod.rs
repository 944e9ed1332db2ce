//! The readiness-driven proxy engine.
//!
//! A [`Proxy`] is the explicit context object that owns everything the event
//! loop touches:
//! - the poller,
//! - the connection registry,
//! - the shared receive buffer,
//! - the idle timer heap,
//! - the hostname resolver.
//!
//! One thread drives it. Each call to [`Proxy::turn`] waits for readiness
//! once, dispatches the delivered events in order, then fires expired idle
//! timers. [`Proxy::run`] repeats that forever.
//!
//! ```text
//! Listening ──accept──▶ Client/AwaitingRequest ──GET──▶ Target/Connecting
//!                              │                             │ writable: send
//!                              ▼                             ▼
//!                       Client/Forwarded ◀──relay── Target/AwaitingResponse
//! ```

mod connection;
mod handlers;
mod registry;
mod resolver;

pub use connection::{Client, ClientPhase, HalfConnection, Listener, Role, State, Target, TargetPhase};
pub use registry::Registry;
pub use resolver::{Resolve, SystemResolver};

use crate::config::Config;
use crate::error::Error;
use crate::net::TcpListener;
use crate::reactor::{Event, Poller, TimerEntry};
use crate::utils::Handle;

use std::collections::BinaryHeap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// A forward HTTP proxy bound to one listening socket.
pub struct Proxy<R = SystemResolver> {
    poller: Poller,
    registry: Registry,

    /// Events collected by the last poll.
    events: Vec<Event>,

    /// Scratch space for every receive; never retained across events.
    buffer: Vec<u8>,

    /// Idle deadlines, earliest first.
    timers: BinaryHeap<TimerEntry>,
    idle_timeout: Option<Duration>,

    resolver: R,
    local_addr: SocketAddr,
}

impl Proxy<SystemResolver> {
    /// Binds the listening socket and prepares the event loop.
    pub fn bind(config: &Config) -> Result<Self, Error> {
        Self::with_resolver(config, SystemResolver)
    }
}

impl<R: Resolve> Proxy<R> {
    /// Like [`Proxy::bind`], resolving target hostnames with `resolver`.
    pub fn with_resolver(config: &Config, resolver: R) -> Result<Self, Error> {
        config.validate()?;

        let poller = Poller::new(config.max_events)?;
        let socket = TcpListener::bind(config.listen_addr(), config.backlog)?;
        let local_addr = socket.local_addr()?;

        let mut registry = Registry::new();
        registry.register_listener(&poller, socket)?;

        info!(address = %local_addr, backlog = config.backlog, "listening");

        Ok(Self {
            poller,
            registry,
            events: Vec::with_capacity(config.max_events),
            buffer: vec![0; config.buffer_size],
            timers: BinaryHeap::new(),
            idle_timeout: config.idle_timeout(),
            resolver,
            local_addr,
        })
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The live half-connections.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Runs the event loop until polling fails.
    pub fn run(&mut self) -> Result<(), Error> {
        loop {
            self.turn(None)?;
        }
    }

    /// Performs one wait cycle.
    ///
    /// Blocks for at most `max_wait` (forever if `None`), shortened to the
    /// next idle deadline. Returns the number of events dispatched.
    pub fn turn(&mut self, max_wait: Option<Duration>) -> Result<usize, Error> {
        let timeout = self.poll_timeout(max_wait);
        self.poller.poll(&mut self.events, timeout)?;

        let events = std::mem::take(&mut self.events);
        for event in &events {
            self.dispatch(*event);
        }
        let dispatched = events.len();
        self.events = events;

        self.fire_timers(Instant::now());

        Ok(dispatched)
    }

    /// Destroys every half-connection, the listener included, and closes
    /// the poller.
    pub fn shutdown(mut self) {
        for handle in self.registry.handles() {
            self.registry.destroy(&self.poller, handle);
        }
        debug!("proxy shut down");
    }

    fn poll_timeout(&self, max_wait: Option<Duration>) -> Option<Duration> {
        let next_timer = self
            .timers
            .peek()
            .map(|t| t.deadline.saturating_duration_since(Instant::now()));

        match (max_wait, next_timer) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Schedules an idle check for a new half-connection.
    fn arm_idle_timer(&mut self, handle: Handle) {
        if let Some(idle) = self.idle_timeout {
            self.timers.push(TimerEntry {
                deadline: Instant::now() + idle,
                handle,
            });
        }
    }

    /// Destroys half-connections that saw no I/O for the idle timeout.
    ///
    /// A half-connection that was active since its deadline was set is
    /// re-armed relative to its last activity.
    fn fire_timers(&mut self, now: Instant) {
        let Some(idle) = self.idle_timeout else {
            return;
        };

        while let Some(timer) = self.timers.peek() {
            if timer.deadline > now {
                break;
            }

            let Some(timer) = self.timers.pop() else {
                break;
            };

            let Some(last_active) = self.registry.last_active(timer.handle) else {
                continue;
            };

            let deadline = last_active + idle;
            if deadline <= now {
                info!(handle = %timer.handle, idle_ms = idle.as_millis() as u64, "idle timeout");
                self.destroy(timer.handle);
            } else {
                self.timers.push(TimerEntry {
                    deadline,
                    handle: timer.handle,
                });
            }
        }
    }

    fn destroy(&mut self, handle: Handle) {
        if let Some(role) = self.registry.destroy(&self.poller, handle) {
            debug!(%handle, ?role, "destroyed");
        }
    }
}

impl<R> std::fmt::Debug for Proxy<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Proxy")
            .field("local_addr", &self.local_addr)
            .field("connections", &self.registry.len())
            .finish()
    }
}
