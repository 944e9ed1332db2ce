use std::io;
use std::net::{SocketAddr, ToSocketAddrs};

/// Hostname resolution used when opening a target connection.
pub trait Resolve {
    /// Resolves `host` to an IPv4 socket address on `port`.
    fn resolve(&self, host: &str, port: u16) -> io::Result<SocketAddr>;
}

/// Resolver backed by the system's `getaddrinfo`.
///
/// The lookup blocks the loop thread for its duration.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemResolver;

impl Resolve for SystemResolver {
    fn resolve(&self, host: &str, port: u16) -> io::Result<SocketAddr> {
        (host, port)
            .to_socket_addrs()?
            .find(SocketAddr::is_ipv4)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no IPv4 address"))
    }
}

impl<F> Resolve for F
where
    F: Fn(&str, u16) -> io::Result<SocketAddr>,
{
    fn resolve(&self, host: &str, port: u16) -> io::Result<SocketAddr> {
        self(host, port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_ipv4_literal() {
        let addr = SystemResolver.resolve("127.0.0.1", 9000).unwrap();
        assert_eq!(addr, "127.0.0.1:9000".parse().unwrap());
    }

    #[test]
    fn closures_act_as_resolvers() {
        let fixed = |_: &str, port: u16| -> io::Result<SocketAddr> {
            Ok(SocketAddr::from(([10, 0, 0, 1], port)))
        };
        assert_eq!(
            fixed.resolve("anything", 80).unwrap(),
            "10.0.0.1:80".parse().unwrap()
        );
    }
}
