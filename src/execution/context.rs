//! Transport state made available to field resolvers.

use crate::log_query_debug;
use actix_web::cookie::Cookie;
use actix_web::http::header::{HeaderMap, HeaderName, HeaderValue};
use actix_web::HttpRequest;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

/// Capability key for the [`RequestSnapshot`].
pub const REQUEST_KEY: &str = "request";
/// Capability key for the [`ResponseHandle`].
pub const RESPONSE_KEY: &str = "response";

/// Read-only copy of the inbound transport request.
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    method: String,
    path: String,
    query_string: String,
    headers: HeaderMap,
    peer_addr: Option<SocketAddr>,
}

impl RequestSnapshot {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            query_string: String::new(),
            headers: HeaderMap::new(),
            peer_addr: None,
        }
    }

    pub fn from_request(request: &HttpRequest) -> Self {
        Self {
            method: request.method().to_string(),
            path: request.path().to_string(),
            query_string: request.query_string().to_string(),
            headers: request.headers().clone(),
            peer_addr: request.peer_addr(),
        }
    }

    /// Add a header; names or values that are not valid HTTP are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::from_str(value)) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn with_peer_addr(mut self, peer_addr: SocketAddr) -> Self {
        self.peer_addr = Some(peer_addr);
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of the named header, if it is valid text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }
}

/// Headers and cookies collected for the transport response.
#[derive(Debug, Default)]
pub struct PendingResponse {
    pub headers: Vec<(HeaderName, HeaderValue)>,
    pub cookies: Vec<Cookie<'static>>,
    committed: bool,
}

/// Lets resolvers add headers and cookies to the transport response.
///
/// Writes are buffered and handed to the dispatcher once execution is done.
/// After that, or on a detached handle, writes are dropped.
#[derive(Debug, Clone, Default)]
pub struct ResponseHandle {
    pending: Arc<Mutex<PendingResponse>>,
}

impl ResponseHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle whose response head has already been written.
    pub fn detached() -> Self {
        let handle = Self::default();
        if let Ok(mut pending) = handle.pending.lock() {
            pending.committed = true;
        }
        handle
    }

    pub fn insert_header(&self, name: &str, value: &str) {
        let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::from_str(value))
        else {
            log_query_debug!("Ignoring invalid response header '{}'", name);
            return;
        };
        if let Ok(mut pending) = self.pending.lock() {
            if pending.committed {
                log_query_debug!(
                    "Response already committed; dropping header '{}'",
                    name.as_str()
                );
            } else {
                pending.headers.push((name, value));
            }
        }
    }

    pub fn add_cookie(&self, cookie: Cookie<'static>) {
        if let Ok(mut pending) = self.pending.lock() {
            if pending.committed {
                log_query_debug!(
                    "Response already committed; dropping cookie '{}'",
                    cookie.name()
                );
            } else {
                pending.cookies.push(cookie);
            }
        }
    }

    pub fn is_committed(&self) -> bool {
        self.pending
            .lock()
            .map(|pending| pending.committed)
            .unwrap_or(true)
    }

    /// Take everything written so far and refuse further writes.
    pub(crate) fn commit(&self) -> PendingResponse {
        match self.pending.lock() {
            Ok(mut pending) => {
                pending.committed = true;
                PendingResponse {
                    headers: std::mem::take(&mut pending.headers),
                    cookies: std::mem::take(&mut pending.cookies),
                    committed: true,
                }
            }
            Err(_) => PendingResponse::default(),
        }
    }
}

/// A capability looked up by key.
#[derive(Debug, Clone, Copy)]
pub enum Capability<'a> {
    Request(&'a RequestSnapshot),
    Response(&'a ResponseHandle),
}

/// Per-execution context handed to resolvers by reference.
#[derive(Debug)]
pub struct ExecutionContext {
    request: RequestSnapshot,
    response: ResponseHandle,
}

impl ExecutionContext {
    pub fn new(request: RequestSnapshot, response: ResponseHandle) -> Self {
        Self { request, response }
    }

    /// Snapshot `request` and pair it with `response`.
    pub fn bind(request: &HttpRequest, response: ResponseHandle) -> Self {
        Self::new(RequestSnapshot::from_request(request), response)
    }

    /// Look up a capability by key (`"request"` or `"response"`).
    pub fn get(&self, key: &str) -> Option<Capability<'_>> {
        match key {
            REQUEST_KEY => Some(Capability::Request(&self.request)),
            RESPONSE_KEY => Some(Capability::Response(&self.response)),
            _ => None,
        }
    }

    pub fn request(&self) -> &RequestSnapshot {
        &self.request
    }

    pub fn response(&self) -> &ResponseHandle {
        &self.response
    }
}
