//! Acceptor, connector and stream over real loopback sockets.

use std::thread;
use std::time::Duration;

use blocknet::echo::echo_session;
use blocknet::net::{Acceptor, Connector, NetError};

mod common;

#[test]
fn ping_on_fixed_port() {
    let mut acceptor = Acceptor::new();
    acceptor.start(Some("127.0.0.1"), 9000).unwrap();

    let connector = Connector::new();
    let mut client = connector.connect(Some("127.0.0.1"), 9000).unwrap();
    let mut server = acceptor.accept().unwrap();

    client.write_string("ping").unwrap();
    assert_eq!(server.read_str(256).unwrap(), "ping");

    connector.close(client);
    acceptor.close(server);
}

#[test]
fn string_round_trip() {
    let (_acceptor, mut client, mut server) = common::connected_pair();

    let long = "x".repeat(4000);
    for payload in ["", "a", "hello world", "ünïcödé ✓", long.as_str()] {
        client.write_string(payload).unwrap();
        assert_eq!(server.read_str(8192).unwrap(), payload);
    }
}

#[test]
fn read_string_fills_caller_buffer() {
    let (_acceptor, mut client, mut server) = common::connected_pair();

    server.write_string("pong").unwrap();
    let mut buf = [0u8; 16];
    let len = client.read_string(&mut buf).unwrap();
    assert_eq!(&buf[..len], b"pong\0");
}

#[test]
fn bytes_arrive_in_order_across_partial_reads() {
    let (_acceptor, mut client, mut server) = common::connected_pair();

    let writer = thread::spawn(move || {
        let pieces: [&[u8]; 3] = [b"abc", b"defg", b"hij"];
        for piece in pieces {
            client.write(piece).unwrap();
            thread::sleep(Duration::from_millis(20));
        }
        client
    });

    let mut buf = [0u8; 10];
    server.read(&mut buf).unwrap();
    assert_eq!(&buf, b"abcdefghij");
    writer.join().unwrap();
}

#[test]
fn large_write_read() {
    let (_acceptor, mut client, mut server) = common::connected_pair();

    let data: Vec<u8> = (0..256 * 1024).map(|i| (i % 251) as u8).collect();
    let expected = data.clone();

    let writer = thread::spawn(move || {
        client.write(&data).unwrap();
        client
    });

    let mut buf = vec![0u8; expected.len()];
    server.read(&mut buf).unwrap();
    assert_eq!(buf, expected);
    writer.join().unwrap();
}

#[test]
fn typed_values_cross_the_wire() {
    let (_acceptor, mut client, mut server) = common::connected_pair();

    client.write_value(&-7i32).unwrap();
    client.write_value(&u64::MAX).unwrap();
    client.write_value(&true).unwrap();
    client.write_value(&1.5f32).unwrap();

    assert_eq!(server.read_value::<i32>().unwrap(), -7);
    assert_eq!(server.read_value::<u64>().unwrap(), u64::MAX);
    assert!(server.read_value::<bool>().unwrap());
    assert_eq!(server.read_value::<f32>().unwrap(), 1.5);
}

#[test]
fn dropped_stream_closes_socket() {
    let (_acceptor, client, mut server) = common::connected_pair();

    drop(client);

    let mut buf = [0u8; 4];
    let err = server.read(&mut buf).unwrap_err();
    assert!(matches!(err, NetError::Closed { received: 0, .. } | NetError::Read(_)));
}

#[test]
fn peer_closing_mid_message_fails_read() {
    let (_acceptor, mut client, mut server) = common::connected_pair();

    client.write(b"ab").unwrap();
    drop(client);

    let mut buf = [0u8; 4];
    assert!(matches!(
        server.read(&mut buf),
        Err(NetError::Closed { received: 2, expected: 4 })
    ));
}

#[test]
fn connect_to_unused_port_fails() {
    let port = common::unused_port();
    let connector = Connector::new().with_connect_timeout(Some(Duration::from_secs(2)));
    assert!(connector.connect(Some("127.0.0.1"), port).is_err());
}

#[test]
fn start_fails_when_port_taken() {
    let (_first, port) = common::loopback_acceptor();

    let mut second = Acceptor::new();
    assert!(second.start(Some("127.0.0.1"), port).is_err());
}

#[test]
fn connector_is_reusable() {
    let (acceptor, port) = common::loopback_acceptor();
    let connector = Connector::new();

    let mut first = connector.connect(Some("127.0.0.1"), port).unwrap();
    let mut second = connector.connect(Some("127.0.0.1"), port).unwrap();
    let mut accepted_first = acceptor.accept().unwrap();
    let mut accepted_second = acceptor.accept().unwrap();

    first.write_string("one").unwrap();
    second.write_string("two").unwrap();
    assert_eq!(accepted_first.read_str(16).unwrap(), "one");
    assert_eq!(accepted_second.read_str(16).unwrap(), "two");
    assert_ne!(first.id(), second.id());
}

#[test]
fn closing_a_stream_keeps_acceptor_listening() {
    let (acceptor, port) = common::loopback_acceptor();
    let connector = Connector::new();

    let _client = connector.connect(Some("localhost"), port).unwrap();
    let server = acceptor.accept().unwrap();
    acceptor.close(server);

    let mut client = connector.connect(Some("127.0.0.1"), port).unwrap();
    let mut server = acceptor.accept().unwrap();
    client.write_string("still here").unwrap();
    assert_eq!(server.read_str(64).unwrap(), "still here");
}

#[test]
fn read_deadline_bounds_a_stalled_peer() {
    let (acceptor, port) = common::loopback_acceptor();
    let acceptor = acceptor.with_read_deadline(Some(Duration::from_millis(100)));

    let _client = Connector::new().connect(Some("127.0.0.1"), port).unwrap();
    let mut server = acceptor.accept().unwrap();
    assert_eq!(server.read_deadline(), Some(Duration::from_millis(100)));

    let mut buf = [0u8; 1];
    assert!(matches!(
        server.read(&mut buf),
        Err(NetError::Timeout { received: 0, expected: 1 })
    ));
}

#[test]
fn accepted_stream_reports_peer() {
    let (_acceptor, client, server) = common::connected_pair();
    assert_eq!(server.peer_addr().unwrap(), client.local_addr().unwrap());
}

#[test]
fn echo_session_round_trips_then_ends_on_hang_up() {
    let (_acceptor, mut client, mut server) = common::connected_pair();

    let session = thread::spawn(move || echo_session(&mut server, 64 * 1024));

    client.write_string("hi").unwrap();
    assert_eq!(client.read_str(64).unwrap(), "hi");
    client.write_string("again").unwrap();
    assert_eq!(client.read_str(64).unwrap(), "again");
    drop(client);

    assert_eq!(session.join().unwrap().unwrap(), 2);
}

#[test]
fn echo_session_rejects_oversized_prefix_without_panicking() {
    let (_acceptor, mut client, mut server) = common::connected_pair();

    let session = thread::spawn(move || echo_session(&mut server, 64 * 1024));

    client.write_value(&70_000u32).unwrap();
    client.write(&vec![b'x'; 70_000]).unwrap();

    let result = session.join().expect("echo session must not panic");
    assert!(matches!(
        result,
        Err(NetError::Oversized { len: 70_000, max: 65_536 })
    ));
}
