//! Request and response snapshots
//!
//! Plain data types passed between the controller, the network and
//! cache storage. Header names are case-insensitive and stored lowercased.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// HTTP request method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    /// Whether a response to this method can be served from cache
    pub fn is_cacheable(&self) -> bool {
        matches!(self, Self::Get | Self::Head)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "OPTIONS" => Ok(Self::Options),
            other => Err(format!("unsupported method '{}'", other)),
        }
    }
}

/// Request mode, mirroring the fetch `mode` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level browsing context load
    Navigate,
    SameOrigin,
    NoCors,
    #[default]
    Cors,
}

/// Case-insensitive header map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, replacing any previous value
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.0
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.insert(k, v);
        }
        headers
    }
}

/// An intercepted request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub mode: RequestMode,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl Request {
    /// A plain subresource GET
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            mode: RequestMode::default(),
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    /// A top-level navigation, as a browser would issue it
    pub fn navigate(url: impl Into<String>) -> Self {
        Self::get(url)
            .with_mode(RequestMode::Navigate)
            .with_header("accept", "text/html,application/xhtml+xml")
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Whether this is a page load: navigate mode, or a GET accepting HTML.
    ///
    /// A request without an `Accept` header is never a navigation.
    pub fn is_navigation(&self) -> bool {
        if self.mode == RequestMode::Navigate {
            return true;
        }
        self.method == Method::Get
            && self
                .headers
                .get("accept")
                .is_some_and(|accept| accept.contains("text/html"))
    }

    /// URL used as the cache key
    pub fn cache_key(&self) -> &str {
        cache_key(&self.url)
    }
}

/// Strip the fragment from a URL; fragments never reach the cache
pub fn cache_key(url: &str) -> &str {
    url.split_once('#').map_or(url, |(base, _)| base)
}

/// A response snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub url: String,
    pub status: u16,
    pub headers: Headers,
    #[serde(skip)]
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            status,
            headers: Headers::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Status in the 2xx range
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigate_mode_is_navigation() {
        let request = Request::get("/app/").with_mode(RequestMode::Navigate);
        assert!(request.is_navigation());
    }

    #[test]
    fn html_accept_is_navigation() {
        let request = Request::get("/app/about.html").with_header("Accept", "text/html");
        assert!(request.is_navigation());
    }

    #[test]
    fn missing_accept_is_not_navigation() {
        let request = Request::get("/app/data.json");
        assert!(request.headers.get("accept").is_none());
        assert!(!request.is_navigation());
    }

    #[test]
    fn post_accepting_html_is_not_navigation() {
        let request = Request::get("/app/form")
            .with_method(Method::Post)
            .with_header("accept", "text/html");
        assert!(!request.is_navigation());
    }

    #[test]
    fn image_accept_is_not_navigation() {
        let request = Request::get("/app/icon.png").with_header("accept", "image/*");
        assert!(!request.is_navigation());
    }

    #[test]
    fn headers_case_insensitive() {
        let headers: Headers = [("Content-Type", "text/html")].into_iter().collect();
        assert_eq!(headers.get("content-type"), Some("text/html"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/html"));
    }

    #[test]
    fn cache_key_strips_fragment() {
        assert_eq!(cache_key("/app/index.html#top"), "/app/index.html");
        assert_eq!(cache_key("/app/"), "/app/");
    }

    #[test]
    fn response_ok_range() {
        assert!(Response::new("/", 200, "").ok());
        assert!(Response::new("/", 204, "").ok());
        assert!(!Response::new("/", 304, "").ok());
        assert!(!Response::new("/", 404, "").ok());
    }

    #[test]
    fn method_parse() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("DELETE".parse::<Method>().unwrap(), Method::Delete);
        assert!("BREW".parse::<Method>().is_err());
    }
}
