//! Response parsing: status line, headers, body and content negotiation.
//!
//! # Design
//! The parser walks the stream in four stages: status line, headers, body,
//! done. The status code is classified as soon as the status line is read,
//! so a 4xx/5xx response fails without its headers or body being touched.
//!
//! Lines are read whole and trimmed of surrounding whitespace. Chunked
//! bodies are decoded a line at a time: the chunk size acts as a budget that
//! each line read draws down, and a new size line is expected once the
//! budget is spent. Line breaks inside a chunk are dropped and a chunk that
//! ends mid-line pulls the following line into the body. Bodies without
//! chunked framing are read raw until the peer closes the connection.

use std::io::{BufRead, Read};

use tracing::trace;

use crate::error::HttpError;
use crate::http::{Body, Headers, HttpResponse, APPLICATION_JSON};
use crate::status::check_status;

const CHUNKED: &str = "chunked";

/// Read one complete response from `reader`.
pub fn read_response<R: BufRead>(mut reader: R) -> Result<HttpResponse, HttpError> {
    let (protocol, status_code, reason_phrase) = read_status_line(&mut reader)?;
    check_status(&status_code)?;

    let headers = read_headers(&mut reader)?;
    let raw = if headers.get("Transfer-Encoding") == Some(CHUNKED) {
        decode_chunked(&mut reader)?
    } else {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        String::from_utf8_lossy(&buf).into_owned()
    };
    let body = negotiate_content(&headers, raw)?;

    Ok(HttpResponse {
        protocol,
        status_code,
        reason_phrase,
        headers,
        body,
    })
}

/// Split the status line into protocol, status code and reason phrase.
///
/// The reason phrase is everything after the second space, so multi-word
/// phrases such as `Not Found` survive intact.
fn read_status_line<R: BufRead>(reader: &mut R) -> Result<(String, String, String), HttpError> {
    let line = read_line(reader)?
        .ok_or_else(|| HttpError::connection("connection closed before status line"))?;
    let line = trim_line(&line);
    trace!("status line: {line}");

    let (protocol, rest) = line
        .split_once(' ')
        .ok_or_else(|| HttpError::connection(format!("malformed status line: {line}")))?;
    let (status, reason) = rest.split_once(' ').unwrap_or((rest, ""));
    Ok((protocol.to_string(), status.to_string(), reason.to_string()))
}

fn read_headers<R: BufRead>(reader: &mut R) -> Result<Headers, HttpError> {
    let mut headers = Headers::new();
    while let Some(line) = read_line(reader)? {
        let line = trim_line(&line);
        if line.is_empty() {
            break;
        }
        trace!("header: {line}");
        match line.split_once(": ") {
            Some((name, value)) => headers.insert(name, value),
            None => headers.insert(line, ""),
        }
    }
    Ok(headers)
}

/// Decode a chunked body, treating each chunk size as a line budget.
pub fn decode_chunked<R: BufRead>(reader: &mut R) -> Result<String, HttpError> {
    let mut body = String::new();
    let mut remaining: Option<u64> = None;

    while let Some(line) = read_line(reader)? {
        let line = trim_line(&line);
        match remaining {
            None => {
                let size = chunk_size(line);
                trace!("chunk size: {size}");
                if size == 0 {
                    break;
                }
                remaining = Some(size);
                continue;
            }
            Some(left) => {
                let len = line.len() as u64;
                remaining = if len >= left { None } else { Some(left - len) };
            }
        }
        body.push_str(line);
    }

    Ok(body)
}

/// Decode the body as JSON when the response declares a JSON content type.
pub fn negotiate_content(headers: &Headers, raw: String) -> Result<Body, HttpError> {
    let is_json = headers
        .get("Content-Type")
        .is_some_and(|value| value.contains(APPLICATION_JSON));
    if !is_json {
        return Ok(Body::Text(raw));
    }

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Body::Json(value)),
        Err(_) => Err(HttpError::JsonConversion { body: raw }),
    }
}

/// Hex value of a chunk-size line, ignoring every non-hex character.
fn chunk_size(line: &str) -> u64 {
    line.chars()
        .filter_map(|c| c.to_digit(16))
        .fold(0u64, |acc, d| acc.saturating_mul(16).saturating_add(u64::from(d)))
}

/// Next line including its terminator, or `None` at end of stream.
fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<String>, HttpError> {
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

fn trim_line(line: &str) -> &str {
    line.trim_matches(|c| matches!(c, ' ' | '\t' | '\n' | '\r' | '\0' | '\x0B'))
}
