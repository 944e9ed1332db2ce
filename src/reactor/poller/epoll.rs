//! Linux `epoll`-based poller.
//!
//! Responsibilities:
//! - Register descriptors with a single readiness interest
//! - Switch a descriptor between readable and writable interest
//! - Block waiting for readiness, optionally bounded by a timeout
//!
//! The poller is level-triggered: a descriptor that stays ready is reported
//! again on the next wait, so handlers may perform a single I/O call per
//! event.

use super::common::Interest;
use crate::reactor::event::Event;

use libc::{
    EPOLL_CLOEXEC, EPOLL_CTL_ADD, EPOLL_CTL_DEL, EPOLL_CTL_MOD, EPOLLERR, EPOLLHUP, EPOLLIN,
    EPOLLOUT, EPOLLRDHUP, epoll_create1, epoll_ctl, epoll_event, epoll_wait,
};
use std::io;
use std::os::unix::io::RawFd;
use std::time::Duration;

/// Linux `epoll` poller.
///
/// Owns the epoll instance and a reusable buffer sized for the maximum
/// number of events returned by one wait.
pub(crate) struct EpollPoller {
    /// Epoll file descriptor.
    epoll: RawFd,

    /// Reusable buffer for kernel events.
    events: Vec<epoll_event>,
}

impl EpollPoller {
    /// Creates a poller returning at most `max_events` events per wait.
    pub(crate) fn new(max_events: usize) -> io::Result<Self> {
        let epoll = unsafe { epoll_create1(EPOLL_CLOEXEC) };
        if epoll < 0 {
            return Err(io::Error::last_os_error());
        }

        let empty = epoll_event { events: 0, u64: 0 };

        Ok(Self {
            epoll,
            events: vec![empty; max_events.max(1)],
        })
    }

    /// Registers a descriptor under `token`.
    pub(crate) fn register(&self, fd: RawFd, token: u64, interest: Interest) -> io::Result<()> {
        self.ctl(EPOLL_CTL_ADD, fd, token, interest)
    }

    /// Replaces the interest of an already registered descriptor.
    pub(crate) fn reregister(&self, fd: RawFd, token: u64, interest: Interest) -> io::Result<()> {
        self.ctl(EPOLL_CTL_MOD, fd, token, interest)
    }

    /// Removes a descriptor from the poller.
    pub(crate) fn deregister(&self, fd: RawFd) -> io::Result<()> {
        let rc = unsafe { epoll_ctl(self.epoll, EPOLL_CTL_DEL, fd, std::ptr::null_mut()) };
        if rc < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }

    fn ctl(&self, op: i32, fd: RawFd, token: u64, interest: Interest) -> io::Result<()> {
        let flags = match interest {
            Interest::Readable => EPOLLIN | EPOLLRDHUP,
            Interest::Writable => EPOLLOUT,
        };

        let mut event = epoll_event {
            events: flags as u32,
            u64: token,
        };

        let rc = unsafe { epoll_ctl(self.epoll, op, fd, &mut event) };
        if rc < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }

    /// Waits for readiness events.
    ///
    /// Blocks until at least one descriptor is ready or the timeout expires
    /// (`None` waits indefinitely). `events` is cleared and refilled in the
    /// order the kernel delivered them. An interrupted wait returns with no
    /// events.
    pub(crate) fn poll(&mut self, events: &mut Vec<Event>, timeout: Option<Duration>) -> io::Result<()> {
        events.clear();

        let timeout_ms = match timeout {
            None => -1,
            Some(t) if t.is_zero() => 0,
            // Round up so a sub-millisecond deadline does not spin.
            Some(t) => t.as_millis().clamp(1, i32::MAX as u128) as i32,
        };

        let n = unsafe {
            epoll_wait(
                self.epoll,
                self.events.as_mut_ptr(),
                self.events.len() as i32,
                timeout_ms,
            )
        };

        if n < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(());
            }
            return Err(err);
        }

        for ev in &self.events[..n as usize] {
            let flags = ev.events;
            let token = ev.u64;

            events.push(Event {
                token,
                readable: flags & ((EPOLLIN | EPOLLRDHUP | EPOLLERR | EPOLLHUP) as u32) != 0,
                writable: flags & ((EPOLLOUT | EPOLLERR | EPOLLHUP) as u32) != 0,
            });
        }

        Ok(())
    }
}

impl Drop for EpollPoller {
    /// Closes the epoll instance.
    fn drop(&mut self) {
        unsafe { libc::close(self.epoll) };
    }
}
