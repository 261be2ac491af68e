//! Minimal one-shot HTTP/1.1 client.
//!
//! # Overview
//! Builds a request, sends it over a freshly opened TCP or TLS connection
//! and parses the raw response, including chunked transfer-encoding and
//! JSON content negotiation. 4xx and 5xx responses are returned as distinct
//! errors. Every call owns its connection for its whole lifetime; nothing is
//! reused between calls.
//!
//! # Design
//! - `HttpClient` is the façade: `send`, `send_json` and `execute`.
//! - `RequestBuilder` validates the method and URL before any I/O.
//! - `wire` renders the request bytes, `response` parses the reply and
//!   `status` classifies the status code as soon as it is read.
//! - `Transport` is the network seam; `TcpTransport` is the real one.
//!
//! ```no_run
//! use oneshot_http::{Headers, HttpClient};
//!
//! let client = HttpClient::new();
//! let response = client.send("GET", "http://example.com/", "", Headers::new())?;
//! println!("{} {}", response.status_code, response.reason_phrase);
//! # Ok::<(), oneshot_http::HttpError>(())
//! ```

pub mod client;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod request;
pub mod response;
pub mod status;
pub mod transport;
pub mod wire;

pub use client::HttpClient;
pub use endpoint::{Endpoint, UrlParts};
pub use error::HttpError;
pub use http::{Body, Headers, HttpRequest, HttpResponse, Method, APPLICATION_JSON, PROTOCOL};
pub use request::RequestBuilder;
pub use status::{classify, StatusClass};
pub use transport::{Connection, TcpTransport, Transport, CONNECT_TIMEOUT};
