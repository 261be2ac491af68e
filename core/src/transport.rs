//! Blocking transport used to carry a single exchange.
//!
//! # Design
//! `Transport` is the seam between the protocol engine and the network.
//! `TcpTransport` opens a plain TCP stream, or a TLS stream through
//! `rustls` for the secure scheme. Each connection serves exactly one
//! request and is closed when dropped.

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};
use tracing::{debug, trace};

use crate::endpoint::Endpoint;
use crate::error::HttpError;

/// Upper bound on establishing a connection. Reads are not bounded.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Opens connections for the client.
pub trait Transport {
    type Stream: Read + Write;

    fn connect(&self, endpoint: &Endpoint) -> Result<Self::Stream, HttpError>;
}

/// An open connection, plain or TLS.
pub enum Connection {
    Plain(TcpStream),
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Connection::Plain(stream) => stream.read(buf),
            // A TCP close without close_notify ends the stream.
            Connection::Tls(stream) => match stream.read(buf) {
                Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                    trace!("peer closed without close_notify");
                    Ok(0)
                }
                other => other,
            },
        }
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Connection::Plain(stream) => stream.write(buf),
            Connection::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Connection::Plain(stream) => stream.flush(),
            Connection::Tls(stream) => stream.flush(),
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Connection::Tls(stream) = self {
            if !stream.conn.is_handshaking() {
                stream.conn.send_close_notify();
                while stream.conn.wants_write() {
                    match stream.conn.write_tls(&mut stream.sock) {
                        Ok(0) | Err(_) => break,
                        Ok(_) => {}
                    }
                }
            }
        }
        trace!("connection closed");
    }
}

/// TCP transport with a fixed connect timeout and TLS for the secure scheme.
#[derive(Clone)]
pub struct TcpTransport {
    connect_timeout: Duration,
    tls_config: Arc<ClientConfig>,
}

impl TcpTransport {
    /// Transport trusting the `webpki-roots` certificate set.
    pub fn new() -> Self {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let config = ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();
        Self::with_tls_config(Arc::new(config))
    }

    pub fn with_tls_config(tls_config: Arc<ClientConfig>) -> Self {
        Self {
            connect_timeout: CONNECT_TIMEOUT,
            tls_config,
        }
    }

    fn open_tcp(&self, endpoint: &Endpoint) -> Result<TcpStream, HttpError> {
        if endpoint.host.is_empty() {
            return Err(HttpError::connection("no host to connect to"));
        }

        let mut last_err = None;
        for addr in (endpoint.connect_host(), endpoint.port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => {
                    debug!("connected to {addr}");
                    return Ok(stream);
                }
                Err(err) => {
                    trace!("connect to {addr} failed: {err}");
                    last_err = Some(err);
                }
            }
        }

        Err(match last_err {
            Some(err) => err.into(),
            None => HttpError::connection(format!("could not resolve {}", endpoint.host)),
        })
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for TcpTransport {
    type Stream = Connection;

    fn connect(&self, endpoint: &Endpoint) -> Result<Connection, HttpError> {
        let tcp = self.open_tcp(endpoint)?;
        if !endpoint.secure {
            return Ok(Connection::Plain(tcp));
        }

        let server_name = ServerName::try_from(endpoint.connect_host().to_string())
            .map_err(|e| HttpError::connection(format!("invalid server name: {e}")))?;
        let conn = ClientConnection::new(self.tls_config.clone(), server_name)
            .map_err(|e| HttpError::connection(e.to_string()))?;
        Ok(Connection::Tls(Box::new(StreamOwned::new(conn, tcp))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn endpoint(host: &str, port: u16) -> Endpoint {
        Endpoint {
            host: host.to_string(),
            port,
            secure: false,
            path: "/".to_string(),
            query: None,
        }
    }

    #[test]
    fn connects_to_a_listening_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let conn = TcpTransport::new().connect(&endpoint("127.0.0.1", port)).unwrap();
        assert!(matches!(conn, Connection::Plain(_)));
    }

    #[test]
    fn refused_connection_carries_os_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = TcpTransport::new()
            .connect(&endpoint("127.0.0.1", port))
            .err()
            .unwrap();
        match err {
            HttpError::Connection { code, .. } => assert!(code.is_some()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn connects_to_an_ipv6_literal() {
        let Ok(listener) = TcpListener::bind("[::1]:0") else {
            return;
        };
        let port = listener.local_addr().unwrap().port();
        let endpoint = Endpoint::from_url(&format!("http://[::1]:{port}/")).unwrap();
        let conn = TcpTransport::new().connect(&endpoint).unwrap();
        assert!(matches!(conn, Connection::Plain(_)));
    }

    #[test]
    fn empty_host_fails_without_io() {
        let err = TcpTransport::new().connect(&endpoint("", 80)).err().unwrap();
        assert!(matches!(err, HttpError::Connection { code: None, .. }));
    }
}
