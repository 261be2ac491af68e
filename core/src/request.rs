//! Request construction and validation.
//!
//! # Design
//! `RequestBuilder` is a consuming builder: every step takes the builder by
//! value and hands it back, and `build` performs all validation at once.
//! The method token must match a supported method exactly. The URL is
//! lower-cased and must decompose into at least a host or a path.

use crate::endpoint::UrlParts;
use crate::error::HttpError;
use crate::http::{Body, Headers, HttpRequest, Method};

#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: String,
    url: String,
    headers: Headers,
    body: Body,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self {
            method: Method::Get.as_str().to_string(),
            url: String::new(),
            headers: Headers::new(),
            body: Body::default(),
        }
    }
}

impl RequestBuilder {
    /// A builder for a `GET` with no URL, headers or body.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(self, method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..self
        }
    }

    pub fn url(self, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..self
        }
    }

    /// Add a header. A repeated name replaces the earlier value.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers.extend(headers);
        self
    }

    pub fn body(self, body: impl Into<Body>) -> Self {
        Self {
            body: body.into(),
            ..self
        }
    }

    pub fn build(self) -> Result<HttpRequest, HttpError> {
        let method: Method = self.method.parse()?;
        let url = self.url.to_lowercase();
        UrlParts::parse(&url)?;

        Ok(HttpRequest {
            method,
            url,
            headers: self.headers,
            body: self.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(method: &str, url: &str) -> Result<HttpRequest, HttpError> {
        RequestBuilder::new().method(method).url(url).build()
    }

    #[test]
    fn accepts_every_supported_method_unchanged() {
        for method in Method::ALL {
            let request = build(method.as_str(), "http://example.com").unwrap();
            assert_eq!(request.method(), method);
            assert_eq!(request.method().as_str(), method.as_str());
        }
    }

    #[test]
    fn rejects_lower_case_and_unknown_methods() {
        for token in ["get", "INVALID"] {
            assert!(matches!(
                build(token, "http://example.com"),
                Err(HttpError::InvalidRequest(_))
            ));
        }
    }

    #[test]
    fn url_is_lower_cased() {
        let request = build("GET", "HTTPS://WWW.Google.com.au/").unwrap();
        assert_eq!(request.url(), "https://www.google.com.au/");
    }

    #[test]
    fn scheme_less_url_is_accepted() {
        let request = build("GET", "www.php.net/downloads").unwrap();
        assert_eq!(request.url(), "www.php.net/downloads");
    }

    #[test]
    fn slashes_only_url_is_rejected() {
        assert!(matches!(build("GET", "///"), Err(HttpError::InvalidRequest(_))));
    }

    #[test]
    fn headers_are_last_write_wins() {
        let request = RequestBuilder::new()
            .url("http://example.com")
            .headers([("X", "a")])
            .headers([("X", "b")])
            .build()
            .unwrap();
        let pairs: Vec<_> = request.headers().iter().collect();
        assert_eq!(pairs, vec![("X", "b")]);
    }

    #[test]
    fn body_and_protocol() {
        let request = RequestBuilder::new()
            .method("POST")
            .url("http://example.com")
            .body("Example body content")
            .build()
            .unwrap();
        assert_eq!(request.body().as_text(), Some("Example body content"));
        assert_eq!(request.protocol(), "HTTP/1.1");
    }
}
