use super::stream::TcpStream;
use crate::reactor::poller::platform::{
    domain_of, sys_accept, sys_bind, sys_close, sys_listen, sys_set_reuseaddr, sys_socket,
    sys_sockname,
};

use std::io;
use std::net::SocketAddr;
use std::os::fd::{AsRawFd, RawFd};

/// A non-blocking listening socket.
pub(crate) struct TcpListener {
    /// File descriptor of the listening socket.
    fd: RawFd,
}

impl TcpListener {
    /// Creates a listening socket bound to `addr`.
    ///
    /// This function:
    /// - creates a non-blocking socket,
    /// - enables `SO_REUSEADDR`,
    /// - binds and starts listening with the given accept backlog.
    pub(crate) fn bind(addr: SocketAddr, backlog: i32) -> io::Result<Self> {
        let fd = sys_socket(domain_of(&addr))?;
        let listener = Self { fd };

        sys_set_reuseaddr(fd)?;
        sys_bind(fd, &addr)?;
        sys_listen(fd, backlog)?;

        Ok(listener)
    }

    /// Accepts one pending connection.
    ///
    /// Fails with `WouldBlock` when the accept queue is empty.
    pub(crate) fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        let (fd, addr) = sys_accept(self.fd)?;

        Ok((TcpStream::from_raw(fd), addr))
    }

    /// Returns the local socket address of this listener.
    pub(crate) fn local_addr(&self) -> io::Result<SocketAddr> {
        sys_sockname(self.fd)
    }
}

impl AsRawFd for TcpListener {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for TcpListener {
    /// Closes the listening socket.
    fn drop(&mut self) {
        sys_close(self.fd);
    }
}
