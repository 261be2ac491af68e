//! URL decomposition and connection parameters.
//!
//! # Design
//! Absolute URLs are parsed with the `url` crate. Input without a scheme is
//! still accepted: `//host/path` is read as a scheme-relative URL and
//! anything else as a bare path with an optional query. The only input
//! rejected is one that yields neither a host nor a path.

use url::{ParseError, Url};

use crate::error::HttpError;

const DEFAULT_PORT: u16 = 80;
const SECURE_PORT: u16 = 443;
const SECURE_SCHEME: &str = "https";

/// Components of a request URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts {
    pub scheme: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub path: Option<String>,
    pub query: Option<String>,
}

impl UrlParts {
    pub fn parse(raw: &str) -> Result<Self, HttpError> {
        let invalid = || HttpError::InvalidRequest(format!("invalid URL given: {raw}"));

        if raw.trim().is_empty() {
            return Err(invalid());
        }

        let parts = if raw.starts_with("//") {
            let url = Url::parse(&format!("http:{raw}")).map_err(|_| invalid())?;
            UrlParts {
                scheme: None,
                ..UrlParts::from_url(&url)
            }
        } else {
            match Url::parse(raw) {
                Ok(url) => UrlParts::from_url(&url),
                Err(ParseError::RelativeUrlWithoutBase) => UrlParts::from_relative(raw),
                Err(_) => return Err(invalid()),
            }
        };

        if parts.host.is_none() && parts.path.is_none() {
            return Err(invalid());
        }
        Ok(parts)
    }

    fn from_url(url: &Url) -> Self {
        let path = url.path();
        UrlParts {
            scheme: Some(url.scheme().to_string()),
            host: url.host_str().filter(|h| !h.is_empty()).map(str::to_string),
            port: url.port(),
            path: (!path.is_empty()).then(|| path.to_string()),
            query: url.query().map(str::to_string),
        }
    }

    fn from_relative(raw: &str) -> Self {
        let without_fragment = raw.split_once('#').map_or(raw, |(rest, _)| rest);
        let (path, query) = match without_fragment.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (without_fragment, None),
        };
        UrlParts {
            scheme: None,
            host: None,
            port: None,
            path: (!path.is_empty()).then(|| path.to_string()),
            query,
        }
    }
}

/// Where and how to connect for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    /// Request target path, `/` when the URL has none.
    pub path: String,
    pub query: Option<String>,
}

impl Endpoint {
    /// Derive connection parameters from a request URL.
    ///
    /// The secure scheme always connects to port 443, whatever port the URL
    /// names.
    pub fn from_url(raw: &str) -> Result<Self, HttpError> {
        let parts = UrlParts::parse(raw)?;
        let secure = parts.scheme.as_deref() == Some(SECURE_SCHEME);
        let port = if secure {
            SECURE_PORT
        } else {
            parts.port.unwrap_or(DEFAULT_PORT)
        };

        Ok(Endpoint {
            host: parts.host.unwrap_or_default(),
            port,
            secure,
            path: parts.path.unwrap_or_else(|| "/".to_string()),
            query: parts.query,
        })
    }

    /// Host as given to the resolver and to TLS: IPv6 literals lose the
    /// brackets they carry in URLs and in the `Host` header.
    pub fn connect_host(&self) -> &str {
        self.host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(&self.host)
    }

    /// `<path>[?<query>]` as written on the request line.
    pub fn target(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }
}
