use libc::{
    AF_INET, AF_INET6, F_GETFL, F_SETFL, MSG_NOSIGNAL, O_NONBLOCK, SHUT_RD, SHUT_RDWR, SHUT_WR,
    SO_ERROR, SO_REUSEADDR, SOCK_STREAM, SOL_SOCKET, accept, bind, c_int, close, connect, fcntl,
    getsockname, getsockopt, listen, recv, send, setsockopt, shutdown, sockaddr, sockaddr_in,
    sockaddr_in6, sockaddr_storage, socket, socklen_t,
};
use std::net::{Ipv4Addr, Ipv6Addr, Shutdown, SocketAddr, SocketAddrV4, SocketAddrV6};
use std::os::fd::RawFd;
use std::{io, mem};

/// Receives from a socket into `buffer` with a single `recv(2)` call.
///
/// `Ok(0)` means the peer closed its write side.
pub(crate) fn sys_recv(fd: RawFd, buffer: &mut [u8]) -> io::Result<usize> {
    let n = unsafe { recv(fd, buffer.as_mut_ptr() as *mut _, buffer.len(), 0) };
    if n < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(n as usize)
    }
}

/// Sends `buffer` with a single `send(2)` call.
///
/// Uses `MSG_NOSIGNAL` so writing to a closed peer yields `EPIPE` instead of
/// raising `SIGPIPE`.
pub(crate) fn sys_send(fd: RawFd, buffer: &[u8]) -> io::Result<usize> {
    let n = unsafe { send(fd, buffer.as_ptr() as *const _, buffer.len(), MSG_NOSIGNAL) };
    if n < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(n as usize)
    }
}

/// Closes a file descriptor.
pub(crate) fn sys_close(fd: RawFd) {
    unsafe { close(fd) };
}

/// Sets a file descriptor to non-blocking mode.
pub(crate) fn sys_set_nonblocking(fd: RawFd) -> io::Result<()> {
    let flags = unsafe { fcntl(fd, F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }

    let rc = unsafe { fcntl(fd, F_SETFL, flags | O_NONBLOCK) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

/// Creates a non-blocking stream socket.
pub(crate) fn sys_socket(domain: c_int) -> io::Result<RawFd> {
    let fd = unsafe { socket(domain, SOCK_STREAM | libc::SOCK_CLOEXEC, 0) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }

    if let Err(e) = sys_set_nonblocking(fd) {
        unsafe { close(fd) };
        return Err(e);
    }

    Ok(fd)
}

/// Binds a socket to an address.
pub(crate) fn sys_bind(fd: RawFd, addr: &SocketAddr) -> io::Result<()> {
    let (storage, len) = socketaddr_to_storage(addr);

    let rc = unsafe { bind(fd, &storage as *const _ as *const sockaddr, len) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Marks a socket as listening with the given accept backlog.
pub(crate) fn sys_listen(fd: RawFd, backlog: i32) -> io::Result<()> {
    let rc = unsafe { listen(fd, backlog) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Accepts one pending connection.
///
/// The returned socket is set to non-blocking mode.
pub(crate) fn sys_accept(fd: RawFd) -> io::Result<(RawFd, SocketAddr)> {
    let mut storage: sockaddr_storage = unsafe { mem::zeroed() };
    let mut len = mem::size_of::<sockaddr_storage>() as socklen_t;

    let client_fd = unsafe { accept(fd, &mut storage as *mut _ as *mut sockaddr, &mut len) };

    if client_fd < 0 {
        return Err(io::Error::last_os_error());
    }

    if let Err(e) = sys_set_nonblocking(client_fd) {
        unsafe { close(client_fd) };
        return Err(e);
    }

    match sockaddr_storage_to_socketaddr(&storage) {
        Ok(addr) => Ok((client_fd, addr)),
        Err(e) => {
            unsafe { close(client_fd) };
            Err(e)
        }
    }
}

/// Returns the local address of a socket.
pub(crate) fn sys_sockname(fd: RawFd) -> io::Result<SocketAddr> {
    let mut storage: sockaddr_storage = unsafe { mem::zeroed() };
    let mut len = mem::size_of::<sockaddr_storage>() as socklen_t;

    let rc = unsafe { getsockname(fd, &mut storage as *mut _ as *mut sockaddr, &mut len) };

    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        sockaddr_storage_to_socketaddr(&storage)
    }
}

/// Initiates a connection.
///
/// On a non-blocking socket this usually fails with `EINPROGRESS`; callers
/// decide whether that counts as success.
pub(crate) fn sys_connect(fd: RawFd, addr: &SocketAddr) -> io::Result<()> {
    let (storage, len) = socketaddr_to_storage(addr);

    let rc = unsafe { connect(fd, &storage as *const _ as *const sockaddr, len) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Reads and clears the pending socket error (`SO_ERROR`).
///
/// Returns `Err` carrying the pending error, e.g. `ECONNREFUSED` after a
/// failed non-blocking connect.
pub(crate) fn sys_get_socket_error(fd: RawFd) -> io::Result<()> {
    let mut err: c_int = 0;
    let mut len = mem::size_of::<c_int>() as socklen_t;

    let rc = unsafe {
        getsockopt(
            fd,
            SOL_SOCKET,
            SO_ERROR,
            &mut err as *mut _ as *mut _,
            &mut len,
        )
    };

    if rc < 0 {
        Err(io::Error::last_os_error())
    } else if err != 0 {
        Err(io::Error::from_raw_os_error(err))
    } else {
        Ok(())
    }
}

/// Shuts down a socket.
pub(crate) fn sys_shutdown(fd: RawFd, how: Shutdown) -> io::Result<()> {
    let how = match how {
        Shutdown::Read => SHUT_RD,
        Shutdown::Write => SHUT_WR,
        Shutdown::Both => SHUT_RDWR,
    };

    let rc = unsafe { shutdown(fd, how) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Enables `SO_REUSEADDR` on a socket.
pub(crate) fn sys_set_reuseaddr(fd: RawFd) -> io::Result<()> {
    let yes: c_int = 1;
    let rc = unsafe {
        setsockopt(
            fd,
            SOL_SOCKET,
            SO_REUSEADDR,
            &yes as *const _ as *const _,
            mem::size_of::<c_int>() as socklen_t,
        )
    };

    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Returns the address family constant for `addr`.
pub(crate) fn domain_of(addr: &SocketAddr) -> c_int {
    match addr {
        SocketAddr::V4(_) => AF_INET,
        SocketAddr::V6(_) => AF_INET6,
    }
}

/// Converts a `sockaddr_storage` to a Rust `SocketAddr`.
pub(crate) fn sockaddr_storage_to_socketaddr(storage: &sockaddr_storage) -> io::Result<SocketAddr> {
    match storage.ss_family as c_int {
        AF_INET => {
            let addr = unsafe { &*(storage as *const _ as *const sockaddr_in) };
            let ip = Ipv4Addr::from(u32::from_be(addr.sin_addr.s_addr));
            let port = u16::from_be(addr.sin_port);

            Ok(SocketAddr::V4(SocketAddrV4::new(ip, port)))
        }

        AF_INET6 => {
            let addr = unsafe { &*(storage as *const _ as *const sockaddr_in6) };
            let ip = Ipv6Addr::from(addr.sin6_addr.s6_addr);
            let port = u16::from_be(addr.sin6_port);

            Ok(SocketAddr::V6(SocketAddrV6::new(
                ip,
                port,
                addr.sin6_flowinfo,
                addr.sin6_scope_id,
            )))
        }

        _ => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "unsupported address family",
        )),
    }
}

/// Converts a `SocketAddr` to a `sockaddr_storage`.
pub(crate) fn socketaddr_to_storage(addr: &SocketAddr) -> (sockaddr_storage, socklen_t) {
    let mut storage: sockaddr_storage = unsafe { mem::zeroed() };

    match addr {
        SocketAddr::V4(v4) => {
            let sa = unsafe { &mut *(&mut storage as *mut _ as *mut sockaddr_in) };
            sa.sin_family = AF_INET as _;
            sa.sin_port = v4.port().to_be();
            sa.sin_addr.s_addr = u32::from(*v4.ip()).to_be();

            (storage, mem::size_of::<sockaddr_in>() as socklen_t)
        }

        SocketAddr::V6(v6) => {
            let sa = unsafe { &mut *(&mut storage as *mut _ as *mut sockaddr_in6) };
            sa.sin6_family = AF_INET6 as _;
            sa.sin6_port = v6.port().to_be();
            sa.sin6_addr.s6_addr = v6.ip().octets();
            sa.sin6_flowinfo = v6.flowinfo();
            sa.sin6_scope_id = v6.scope_id();

            (storage, mem::size_of::<sockaddr_in6>() as socklen_t)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sockaddr_conversion_preserves_v4_and_v6() {
        for text in ["127.0.0.1:8081", "[::1]:9000"] {
            let addr: SocketAddr = text.parse().unwrap();
            let (storage, _) = socketaddr_to_storage(&addr);
            assert_eq!(sockaddr_storage_to_socketaddr(&storage).unwrap(), addr);
        }
    }
}
