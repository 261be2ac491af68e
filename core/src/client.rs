//! One-shot HTTP client.
//!
//! # Design
//! `HttpClient` holds only its transport and carries no state between
//! calls. Every call builds and validates a request, opens a fresh
//! connection, writes the request, parses the whole response and closes the
//! connection again, on success and failure alike. There is no pooling,
//! redirect handling or retrying.

use std::io::BufReader;

use serde::Serialize;
use tracing::{debug, warn};

use crate::endpoint::Endpoint;
use crate::error::HttpError;
use crate::http::{Body, Headers, HttpRequest, HttpResponse, APPLICATION_JSON};
use crate::request::RequestBuilder;
use crate::response::read_response;
use crate::transport::{TcpTransport, Transport};
use crate::wire::write_request;

/// Synchronous client that performs one request per connection.
#[derive(Clone, Default)]
pub struct HttpClient<T = TcpTransport> {
    transport: T,
}

impl HttpClient {
    pub fn new() -> Self {
        Self::with_transport(TcpTransport::new())
    }
}

impl<T: Transport> HttpClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    /// Send a request and return the parsed response.
    ///
    /// Fails with `InvalidRequest` before any I/O when the method or URL is
    /// rejected, and with `ClientError`/`ServerError` for 4xx/5xx responses.
    pub fn send<B, I, K, V>(
        &self,
        method: &str,
        url: &str,
        body: B,
        headers: I,
    ) -> Result<HttpResponse, HttpError>
    where
        B: Into<Body>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let request = RequestBuilder::new()
            .method(method)
            .url(url)
            .body(body)
            .headers(headers)
            .build()?;
        self.execute(&request)
    }

    /// Send `body` encoded as JSON.
    ///
    /// `Content-type` and `Accept` are set to `application/json`, replacing
    /// any values the caller passed under those names.
    pub fn send_json<S, I, K, V>(
        &self,
        method: &str,
        url: &str,
        body: &S,
        headers: I,
    ) -> Result<HttpResponse, HttpError>
    where
        S: Serialize + ?Sized,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let value = serde_json::to_value(body)
            .map_err(|e| HttpError::InvalidRequest(format!("body is not serializable: {e}")))?;

        let mut headers: Headers = headers.into_iter().collect();
        headers.insert("Content-type", APPLICATION_JSON);
        headers.insert("Accept", APPLICATION_JSON);

        self.send(method, url, Body::Json(value), headers)
    }

    /// Perform the exchange for an already built request.
    pub fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        let result = self.exchange(request);
        match &result {
            Ok(response) => debug!(
                "{} {} -> {} {}",
                request.method(),
                request.url(),
                response.status_code,
                response.reason_phrase
            ),
            Err(err @ (HttpError::ClientError { .. } | HttpError::ServerError { .. })) => {
                debug!("{} {} -> {err}", request.method(), request.url())
            }
            Err(err) => warn!("{} {} failed: {err}", request.method(), request.url()),
        }
        result
    }

    fn exchange(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        let endpoint = Endpoint::from_url(request.url())?;
        debug!(
            "connecting to {}:{} (secure: {})",
            endpoint.host, endpoint.port, endpoint.secure
        );

        let mut stream = self.transport.connect(&endpoint)?;
        write_request(&mut stream, request, &endpoint)?;
        read_response(BufReader::new(&mut stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::io::{self, Cursor, Read, Write};
    use std::rc::Rc;

    /// Transport that replays a canned response and records what was written.
    struct CannedTransport {
        response: Vec<u8>,
        written: Rc<RefCell<Vec<u8>>>,
        connects: Rc<RefCell<Vec<Endpoint>>>,
    }

    struct CannedStream {
        input: Cursor<Vec<u8>>,
        written: Rc<RefCell<Vec<u8>>>,
    }

    impl Read for CannedStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for CannedStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Transport for CannedTransport {
        type Stream = CannedStream;

        fn connect(&self, endpoint: &Endpoint) -> Result<CannedStream, HttpError> {
            self.connects.borrow_mut().push(endpoint.clone());
            Ok(CannedStream {
                input: Cursor::new(self.response.clone()),
                written: self.written.clone(),
            })
        }
    }

    struct RefusingTransport;

    impl Transport for RefusingTransport {
        type Stream = CannedStream;

        fn connect(&self, _endpoint: &Endpoint) -> Result<CannedStream, HttpError> {
            Err(io::Error::from_raw_os_error(111).into())
        }
    }

    fn canned(response: &str) -> (HttpClient<CannedTransport>, Rc<RefCell<Vec<u8>>>) {
        let written = Rc::new(RefCell::new(Vec::new()));
        let transport = CannedTransport {
            response: response.as_bytes().to_vec(),
            written: written.clone(),
            connects: Rc::new(RefCell::new(Vec::new())),
        };
        (HttpClient::with_transport(transport), written)
    }

    fn wire(written: &Rc<RefCell<Vec<u8>>>) -> String {
        String::from_utf8(written.borrow().clone()).unwrap()
    }

    #[test]
    fn send_writes_request_and_parses_response() {
        let (client, written) = canned("HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\nhello");
        let res = client
            .send("POST", "http://Example.com/Post", "hello", Headers::new())
            .unwrap();

        assert_eq!(res.status_code, "200");
        assert_eq!(res.body.as_text(), Some("hello"));
        assert_eq!(
            wire(&written),
            "POST /post HTTP/1.1\r\nHost: example.com\r\nContent-length: 5\r\n\
             Connection: close\r\n\r\nhello\r\n\r\n"
        );
    }

    #[test]
    fn send_json_encodes_body_and_sets_negotiation_headers() {
        let (client, written) = canned("HTTP/1.1 200 OK\r\n\r\n");
        client
            .send_json(
                "POST",
                "http://example.com/post",
                &json!({"foo1": "bar1", "foo2": "bar2"}),
                Headers::new(),
            )
            .unwrap();

        let wire = wire(&written);
        assert!(wire.contains("\r\nContent-type: application/json\r\n"), "{wire}");
        assert!(wire.contains("\r\nAccept: application/json\r\n"), "{wire}");
        assert!(wire.contains("Content-length: 29\r\n"), "{wire}");
        assert!(wire.ends_with("\r\n\r\n{\"foo1\":\"bar1\",\"foo2\":\"bar2\"}\r\n\r\n"));
    }

    #[test]
    fn send_json_overrides_caller_negotiation_headers() {
        let (client, written) = canned("HTTP/1.1 200 OK\r\n\r\n");
        client
            .send_json(
                "PUT",
                "http://example.com/put",
                &json!({}),
                [("Content-type", "text/html"), ("X-Trace", "1")],
            )
            .unwrap();

        let wire = wire(&written);
        assert!(wire.contains(
            "Host: example.com\r\nContent-type: application/json\r\nX-Trace: 1\r\n\
             Accept: application/json\r\nContent-length: 2\r\n"
        ), "{wire}");
        assert!(!wire.contains("text/html"));
    }

    #[test]
    fn send_json_accepts_serializable_structs() {
        #[derive(Serialize)]
        struct Payload {
            data: &'static str,
        }

        let (client, written) = canned("HTTP/1.1 200 OK\r\n\r\n");
        client
            .send_json("PATCH", "http://example.com", &Payload { data: "x" }, Headers::new())
            .unwrap();
        assert!(wire(&written).contains("{\"data\":\"x\"}"));
    }

    #[test]
    fn json_response_is_decoded() {
        let (client, _) = canned("HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n{\"a\":1}");
        let res = client.send("GET", "http://example.com", "", Headers::new()).unwrap();
        assert_eq!(res.body.as_json(), Some(&json!({"a": 1})));
    }

    #[test]
    fn status_errors_are_returned() {
        let (client, _) = canned("HTTP/1.1 404 Not Found\r\n\r\n");
        let err = client.send("GET", "http://example.com", "", Headers::new()).unwrap_err();
        assert!(matches!(err, HttpError::ClientError { ref status } if status == "404"));

        let (client, _) = canned("HTTP/1.1 503 Service Unavailable\r\n\r\n");
        let err = client.send("GET", "http://example.com", "", Headers::new()).unwrap_err();
        assert!(matches!(err, HttpError::ServerError { ref status } if status == "503"));
    }

    #[test]
    fn invalid_request_never_connects() {
        let (client, written) = canned("HTTP/1.1 200 OK\r\n\r\n");
        let err = client.send("get", "http://example.com", "", Headers::new()).unwrap_err();
        assert!(matches!(err, HttpError::InvalidRequest(_)));
        let err = client.send("GET", "///", "", Headers::new()).unwrap_err();
        assert!(matches!(err, HttpError::InvalidRequest(_)));
        assert!(client.transport.connects.borrow().is_empty());
        assert!(written.borrow().is_empty());
    }

    #[test]
    fn secure_url_connects_on_443() {
        let (client, _) = canned("HTTP/1.1 200 OK\r\n\r\n");
        client
            .send("GET", "https://example.com:8443/get", "", Headers::new())
            .unwrap();
        let connects = client.transport.connects.borrow();
        assert_eq!(connects.len(), 1);
        assert!(connects[0].secure);
        assert_eq!(connects[0].port, 443);
    }

    #[test]
    fn connection_failure_is_surfaced() {
        let client = HttpClient::with_transport(RefusingTransport);
        let err = client.send("GET", "http://example.com", "", Headers::new()).unwrap_err();
        assert!(matches!(err, HttpError::Connection { code: Some(111), .. }));
    }
}
