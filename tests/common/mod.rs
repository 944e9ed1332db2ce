#![allow(dead_code)]

use sluice::{Config, Proxy, Resolve};

use std::io::{self, Read, Write};
use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// A loopback-only config on an ephemeral port.
pub fn config() -> Config {
    Config {
        bind: Ipv4Addr::LOCALHOST.into(),
        port: 0,
        ..Config::default()
    }
}

/// Drives the proxy until `done` holds or five seconds pass.
pub fn pump<R: Resolve>(proxy: &mut Proxy<R>, mut done: impl FnMut(&Proxy<R>) -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);

    while Instant::now() < deadline {
        if done(proxy) {
            return true;
        }
        proxy
            .turn(Some(Duration::from_millis(10)))
            .expect("proxy turn failed");
    }

    done(proxy)
}

/// Connects a non-blocking client to the proxy and sends `request`.
pub fn client(proxy: SocketAddr, request: &[u8]) -> TcpStream {
    let mut stream = TcpStream::connect(proxy).expect("failed to connect to proxy");
    if !request.is_empty() {
        stream.write_all(request).expect("failed to send request");
    }
    stream
        .set_nonblocking(true)
        .expect("failed to set non-blocking");
    stream
}

/// Reads whatever is available into `out`. Returns `true` on EOF.
pub fn read_available(stream: &mut TcpStream, out: &mut Vec<u8>) -> bool {
    let mut chunk = [0u8; 1024];

    loop {
        match stream.read(&mut chunk) {
            Ok(0) => return true,
            Ok(n) => out.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return false,
            Err(e) if e.kind() == io::ErrorKind::ConnectionReset => return true,
            Err(e) => panic!("client read failed: {e}"),
        }
    }
}

/// An origin server that answers one connection with `response`, then
/// closes. The join handle yields the request head it received.
pub fn origin(response: &'static [u8]) -> (SocketAddr, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind origin");
    let addr = listener.local_addr().expect("failed to get origin address");

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("origin accept failed");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("failed to set timeout");

        let mut request = Vec::new();
        let mut chunk = [0u8; 512];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut chunk).expect("origin read failed");
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);
        }

        stream.write_all(response).expect("origin write failed");
        request
    });

    (addr, handle)
}

/// A port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind");
    listener.local_addr().expect("no local address").port()
}
