//! Capabilities a host hands to a plugin during the access phase.
//!
//! A plugin only sees the traits of this module, never a concrete host type, so it can be
//! driven by the http host in [`crate::layer`] as well as by a test fake.
use hyper::{
    header::{HeaderName, HeaderValue},
    http::request::Parts,
    HeaderMap, Method, Uri,
};

use crate::BoxResult;

/// Write access to the headers of the response the host is going to send.
pub trait ResponseHeaderWriter {
    /// Set a response header, replacing any value set before under the same name.
    fn set_header(&mut self, name: &str, value: &str);
}

/// Per-request handle passed to [`Plugin::access`](crate::Plugin::access).
pub trait Exchange: ResponseHeaderWriter + Send {
    fn request_method(&self) -> &Method;
    fn request_uri(&self) -> &Uri;
    fn request_headers(&self) -> &HeaderMap;
}

/// Response header writes queued during the access phase.
///
/// Names are compared ignoring ascii case, a later write to a name overwrites the earlier one.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResponseHeaderEdits {
    edits: Vec<(String, String)>,
}

impl ResponseHeaderEdits {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn get(&self, name: &str) -> Option<&str> {
        self.edits.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }
    pub fn len(&self) -> usize {
        self.edits.len()
    }
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.edits.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Write the queued headers into a response header map, each one as an overwrite.
    ///
    /// # Errors
    /// A queued name or value is not a valid http header, in which case `headers` is left untouched.
    pub fn apply(self, headers: &mut HeaderMap) -> BoxResult<()> {
        let mut parsed = Vec::with_capacity(self.edits.len());
        for (name, value) in self.edits {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| format!("[Hg.Plugin] invalid response header name {name:?}: {e}"))?;
            let header_value = HeaderValue::from_str(&value).map_err(|e| format!("[Hg.Plugin] invalid value for response header {name}: {e}"))?;
            parsed.push((header_name, header_value));
        }
        for (name, value) in parsed {
            headers.insert(name, value);
        }
        Ok(())
    }
}

impl ResponseHeaderWriter for ResponseHeaderEdits {
    fn set_header(&mut self, name: &str, value: &str) {
        if let Some((_, slot)) = self.edits.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            value.clone_into(slot);
        } else {
            self.edits.push((name.to_owned(), value.to_owned()));
        }
    }
}

/// The [`Exchange`] of an http request, the response header writes are queued until the response is ready.
#[derive(Debug)]
pub struct HttpExchange<'a> {
    parts: &'a Parts,
    response_headers: ResponseHeaderEdits,
}

impl<'a> HttpExchange<'a> {
    pub fn new(parts: &'a Parts) -> Self {
        Self {
            parts,
            response_headers: ResponseHeaderEdits::default(),
        }
    }
    pub fn response_headers(&self) -> &ResponseHeaderEdits {
        &self.response_headers
    }
    pub fn into_response_headers(self) -> ResponseHeaderEdits {
        self.response_headers
    }
}

impl ResponseHeaderWriter for HttpExchange<'_> {
    #[inline]
    fn set_header(&mut self, name: &str, value: &str) {
        self.response_headers.set_header(name, value)
    }
}

impl Exchange for HttpExchange<'_> {
    fn request_method(&self) -> &Method {
        &self.parts.method
    }
    fn request_uri(&self) -> &Uri {
        &self.parts.uri
    }
    fn request_headers(&self) -> &HeaderMap {
        &self.parts.headers
    }
}

#[cfg(test)]
mod test {
    use hyper::Request;

    use super::*;

    #[test]
    fn test_edits_overwrite() {
        let mut edits = ResponseHeaderEdits::new();
        edits.set_header("x-plugin", "first");
        edits.set_header("X-Plugin", "second");
        edits.set_header("x-other", "other");
        assert_eq!(edits.len(), 2);
        assert_eq!(edits.get("x-plugin"), Some("second"));

        let mut headers = HeaderMap::new();
        headers.insert("x-plugin", HeaderValue::from_static("upstream"));
        headers.append("x-plugin", HeaderValue::from_static("upstream-2"));
        headers.insert("server", HeaderValue::from_static("upstream"));
        edits.apply(&mut headers).expect("valid headers");
        assert_eq!(headers.get_all("x-plugin").iter().collect::<Vec<_>>(), vec!["second"]);
        assert_eq!(headers.get("x-other").expect("x-other is set"), "other");
        assert_eq!(headers.get("server").expect("server is kept"), "upstream");
    }

    #[test]
    fn test_invalid_edits_leave_headers_untouched() {
        let mut edits = ResponseHeaderEdits::new();
        edits.set_header("x-plugin", "fine");
        edits.set_header("x-broken", "line\nbreak");
        let mut headers = HeaderMap::new();
        assert!(edits.apply(&mut headers).is_err());
        assert!(headers.is_empty());

        let mut edits = ResponseHeaderEdits::new();
        edits.set_header("bad name", "value");
        assert!(edits.apply(&mut headers).is_err());
    }

    #[test]
    fn test_http_exchange() {
        let (parts, _) = Request::post("http://example.com/path?q=1").header("x-hi", "hello").body(()).expect("valid request").into_parts();
        let mut exchange = HttpExchange::new(&parts);
        assert_eq!(exchange.request_method(), &Method::POST);
        assert_eq!(exchange.request_uri().path(), "/path");
        assert_eq!(exchange.request_headers().get("x-hi").expect("x-hi is set"), "hello");
        exchange.set_header("x-plugin", "hello");
        assert_eq!(exchange.response_headers().get("x-plugin"), Some("hello"));
        assert_eq!(exchange.into_response_headers().len(), 1);
    }
}
