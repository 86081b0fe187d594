//! Shared helpers for integration tests.

use blocknet::net::{Acceptor, Connector, Stream};

/// Start an acceptor on an ephemeral loopback port.
pub fn loopback_acceptor() -> (Acceptor, u16) {
    let mut acceptor = Acceptor::new();
    acceptor.start(Some("127.0.0.1"), 0).unwrap();
    let port = acceptor.local_addr().unwrap().port();
    (acceptor, port)
}

/// A connected (client, server) stream pair plus the acceptor that made it.
///
/// The kernel completes the handshake against the backlog, so connecting
/// before accepting does not need a second thread.
#[allow(dead_code)]
pub fn connected_pair() -> (Acceptor, Stream, Stream) {
    let (acceptor, port) = loopback_acceptor();
    let client = Connector::new().connect(Some("127.0.0.1"), port).unwrap();
    let server = acceptor.accept().unwrap();
    (acceptor, client, server)
}

/// A port nothing is listening on.
#[allow(dead_code)]
pub fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
