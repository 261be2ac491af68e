//! HTTP/1.1 request serialization.

use std::fmt::Write as _;
use std::io::Write;

use tracing::trace;

use crate::endpoint::Endpoint;
use crate::error::HttpError;
use crate::http::HttpRequest;

const CRLF: &str = "\r\n";

/// Render `request` into the exact bytes written to the connection.
///
/// The client always declares `Content-length` and `Connection: close`, and
/// terminates the body with a blank line.
pub fn render_request(request: &HttpRequest, endpoint: &Endpoint) -> Vec<u8> {
    let body = request.body().render();

    // Writing into a String cannot fail.
    let mut out = String::new();
    let _ = write!(
        out,
        "{} {} {}{CRLF}",
        request.method(),
        endpoint.target(),
        request.protocol()
    );
    let _ = write!(out, "Host: {}{CRLF}", endpoint.host);
    for (name, value) in request.headers().iter() {
        let _ = write!(out, "{name}: {value}{CRLF}");
    }
    let _ = write!(out, "Content-length: {}{CRLF}", body.len());
    let _ = write!(out, "Connection: close{CRLF}{CRLF}");
    out.push_str(&body);
    out.push_str(CRLF);
    out.push_str(CRLF);
    out.into_bytes()
}

/// Write `request` to an open connection.
pub fn write_request<W: Write>(
    stream: &mut W,
    request: &HttpRequest,
    endpoint: &Endpoint,
) -> Result<(), HttpError> {
    let bytes = render_request(request, endpoint);
    stream.write_all(&bytes)?;
    stream.flush()?;
    trace!("wrote {} request bytes", bytes.len());
    Ok(())
}
