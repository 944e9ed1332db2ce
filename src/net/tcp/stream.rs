use crate::reactor::poller::platform::{
    domain_of, sys_close, sys_connect, sys_get_socket_error, sys_recv, sys_send, sys_shutdown,
    sys_socket,
};

use std::io;
use std::net::{Shutdown, SocketAddr};
use std::os::fd::{AsRawFd, RawFd};

/// A non-blocking TCP connection.
///
/// Every I/O method performs exactly one system call; would-block conditions
/// surface as `io::ErrorKind::WouldBlock` and are left to the caller.
pub(crate) struct TcpStream {
    fd: RawFd,
}

impl TcpStream {
    /// Wraps an already connected, non-blocking descriptor.
    pub(crate) fn from_raw(fd: RawFd) -> Self {
        Self { fd }
    }

    /// Starts a non-blocking connection to `addr`.
    ///
    /// Returns as soon as the connect is in flight. Completion is signalled by
    /// writable readiness and checked with [`take_error`](Self::take_error).
    pub(crate) fn connect(addr: SocketAddr) -> io::Result<Self> {
        let fd = sys_socket(domain_of(&addr))?;
        let stream = Self { fd };

        match sys_connect(fd, &addr) {
            Ok(()) => Ok(stream),
            Err(err) if err.raw_os_error() == Some(libc::EINPROGRESS) => Ok(stream),
            Err(err) => Err(err),
        }
    }

    /// Receives up to `buffer.len()` bytes.
    pub(crate) fn recv(&self, buffer: &mut [u8]) -> io::Result<usize> {
        sys_recv(self.fd, buffer)
    }

    /// Sends as much of `buffer` as the kernel accepts in one call.
    pub(crate) fn send(&self, buffer: &[u8]) -> io::Result<usize> {
        sys_send(self.fd, buffer)
    }

    /// Returns the pending socket error, if any.
    pub(crate) fn take_error(&self) -> io::Result<()> {
        sys_get_socket_error(self.fd)
    }

    /// Shuts down the read, write, or both halves of this connection.
    pub(crate) fn shutdown(&self, how: Shutdown) -> io::Result<()> {
        sys_shutdown(self.fd, how)
    }
}

impl AsRawFd for TcpStream {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

#[cfg(test)]
impl From<std::net::TcpStream> for TcpStream {
    fn from(stream: std::net::TcpStream) -> Self {
        use std::os::fd::IntoRawFd;

        stream
            .set_nonblocking(true)
            .expect("failed to set non-blocking");
        Self::from_raw(stream.into_raw_fd())
    }
}

impl Drop for TcpStream {
    /// Closes the connection.
    fn drop(&mut self) {
        sys_close(self.fd);
    }
}
