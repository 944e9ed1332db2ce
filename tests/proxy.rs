mod common;

use common::{client, closed_port, config, origin, pump, read_available};
use sluice::http::TargetInfo;
use sluice::{Config, Proxy, Role, State};

use std::io;
use std::net::{SocketAddr, TcpListener};

#[test]
fn relays_response_and_closes_both_sides() {
    let response = b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nhi";
    let (origin_addr, origin) = origin(response);

    let mut proxy = Proxy::bind(&config()).expect("failed to bind proxy");
    let request = format!(
        "GET http://localhost:{}/ HTTP/1.1\r\nHost: localhost\r\n\r\n",
        origin_addr.port()
    );
    let mut stream = client(proxy.local_addr(), request.as_bytes());

    let mut received = Vec::new();
    assert!(
        pump(&mut proxy, |_| read_available(&mut stream, &mut received)),
        "client never saw the end of the response"
    );
    assert_eq!(received, response);

    let forwarded = origin.join().expect("origin panicked");
    assert_eq!(forwarded, b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n");

    drop(stream);
    assert!(pump(&mut proxy, |p| p.registry().count(Role::Client) == 0));
    assert_eq!(proxy.registry().count(Role::Target), 0);
    assert_eq!(proxy.registry().count(Role::Listener), 1);
}

#[test]
fn non_get_request_is_closed_without_contacting_origin() {
    let origin = TcpListener::bind("127.0.0.1:0").unwrap();
    origin.set_nonblocking(true).unwrap();
    let port = origin.local_addr().unwrap().port();

    let mut proxy = Proxy::bind(&config()).unwrap();
    let request = format!("POST http://localhost:{port}/ HTTP/1.1\r\n\r\n");
    let mut stream = client(proxy.local_addr(), request.as_bytes());

    let mut received = Vec::new();
    let mut max_targets = 0;
    assert!(pump(&mut proxy, |p| {
        max_targets = max_targets.max(p.registry().count(Role::Target));
        read_available(&mut stream, &mut received)
    }));

    assert!(received.is_empty());
    assert_eq!(max_targets, 0);
    assert_eq!(proxy.registry().count(Role::Client), 0);
    assert_eq!(
        origin.accept().map(|_| ()).unwrap_err().kind(),
        io::ErrorKind::WouldBlock
    );
}

#[test]
fn url_without_port_or_path_uses_defaults() {
    let target = TargetInfo::parse("http://example.com").unwrap();
    assert_eq!(target.host, "example.com");
    assert_eq!(target.port, 80);
    assert_eq!(target.path, "/");
}

#[test]
fn refused_origin_destroys_target_and_leaves_client_silent() {
    let port = closed_port();

    let mut proxy = Proxy::bind(&config()).unwrap();
    let request = format!("GET http://127.0.0.1:{port}/ HTTP/1.1\r\nHost: x\r\n\r\n");
    let mut stream = client(proxy.local_addr(), request.as_bytes());

    assert!(pump(&mut proxy, |p| {
        p.registry().count_state(State::Forwarded) == 1 && p.registry().count(Role::Target) == 0
    }));

    let mut received = Vec::new();
    assert!(!read_available(&mut stream, &mut received));
    assert!(received.is_empty());

    // The orphaned client is only reclaimed once it goes away itself.
    drop(stream);
    assert!(pump(&mut proxy, |p| p.registry().count(Role::Client) == 0));
}

#[test]
fn malformed_and_truncated_requests_are_dropped() {
    let mut proxy = Proxy::bind(&config()).unwrap();

    for request in [
        &b"NOT HTTP AT ALL\r\n\r\n"[..],
        b"GET http://localhost/ HTTP/1.1\r\nHost: localhost\r\n",
        b"GET /relative HTTP/1.1\r\n\r\n",
        b"GET http://:80/ HTTP/1.1\r\n\r\n",
    ] {
        let mut stream = client(proxy.local_addr(), request);
        let mut received = Vec::new();

        assert!(
            pump(&mut proxy, |_| read_available(&mut stream, &mut received)),
            "request {:?} was not rejected",
            String::from_utf8_lossy(request)
        );
        assert!(received.is_empty());
    }

    assert_eq!(proxy.registry().count(Role::Client), 0);
    assert_eq!(proxy.registry().count(Role::Target), 0);
}

#[test]
fn unresolvable_host_closes_client() {
    let resolver = |host: &str, _port: u16| -> io::Result<SocketAddr> {
        Err(io::Error::new(io::ErrorKind::NotFound, host.to_owned()))
    };
    let mut proxy = Proxy::with_resolver(&config(), resolver).unwrap();
    let mut stream = client(
        proxy.local_addr(),
        b"GET http://nowhere.invalid/ HTTP/1.1\r\n\r\n",
    );

    let mut received = Vec::new();
    assert!(pump(&mut proxy, |_| read_available(&mut stream, &mut received)));
    assert!(received.is_empty());
    assert_eq!(proxy.registry().count(Role::Target), 0);
}

#[test]
fn large_response_is_relayed_in_buffer_sized_chunks() {
    static BODY: [u8; 4096] = [b'z'; 4096];
    let response: &'static [u8] = &BODY;
    let (origin_addr, origin) = origin(response);

    let resolver = move |host: &str, port: u16| -> io::Result<SocketAddr> {
        assert_eq!(host, "origin.test");
        Ok(SocketAddr::new(origin_addr.ip(), port))
    };
    let config = Config {
        buffer_size: 512,
        ..config()
    };
    let mut proxy = Proxy::with_resolver(&config, resolver).unwrap();

    let request = format!(
        "GET http://origin.test:{}/data?x=1 HTTP/1.0\r\nAccept: */*\r\n\r\n",
        origin_addr.port()
    );
    let mut stream = client(proxy.local_addr(), request.as_bytes());

    let mut received = Vec::new();
    assert!(pump(&mut proxy, |_| read_available(&mut stream, &mut received)));
    assert_eq!(received.len(), BODY.len());
    assert!(received.iter().all(|&b| b == b'z'));

    let forwarded = origin.join().unwrap();
    assert_eq!(forwarded, b"GET /data?x=1 HTTP/1.0\r\nAccept: */*\r\n\r\n");
}

#[test]
fn concurrent_sessions_are_multiplexed() {
    let (first_addr, first) = origin(b"HTTP/1.0 200 OK\r\n\r\nfirst");
    let (second_addr, second) = origin(b"HTTP/1.0 200 OK\r\n\r\nsecond");

    let mut proxy = Proxy::bind(&config()).unwrap();
    let mut a = client(
        proxy.local_addr(),
        format!("GET http://127.0.0.1:{}/a HTTP/1.1\r\n\r\n", first_addr.port()).as_bytes(),
    );
    let mut b = client(
        proxy.local_addr(),
        format!("GET http://127.0.0.1:{}/b HTTP/1.1\r\n\r\n", second_addr.port()).as_bytes(),
    );

    let (mut got_a, mut got_b) = (Vec::new(), Vec::new());
    let (mut done_a, mut done_b) = (false, false);
    assert!(pump(&mut proxy, |_| {
        done_a = done_a || read_available(&mut a, &mut got_a);
        done_b = done_b || read_available(&mut b, &mut got_b);
        done_a && done_b
    }));

    assert_eq!(got_a, b"HTTP/1.0 200 OK\r\n\r\nfirst");
    assert_eq!(got_b, b"HTTP/1.0 200 OK\r\n\r\nsecond");
    assert_eq!(first.join().unwrap(), b"GET /a HTTP/1.1\r\n\r\n");
    assert_eq!(second.join().unwrap(), b"GET /b HTTP/1.1\r\n\r\n");
}
