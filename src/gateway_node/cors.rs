//! Cross-origin headers for development setups where the UI is served from a
//! different origin than the gateway.

use crate::log_cors_debug;
use actix_web::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN,
    REFERER,
};
use actix_web::{HttpRequest, HttpResponseBuilder};
use url::Url;

/// Headers granted to a development client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsHeaders {
    pub allow_origin: String,
    pub allow_headers: String,
    pub allow_credentials: bool,
}

/// Grants the referring origin access when development mode is on.
#[derive(Debug, Clone)]
pub struct DevCorsNegotiator {
    devel_mode: bool,
    allow_headers: String,
}

impl DevCorsNegotiator {
    pub fn new(devel_mode: bool, allow_headers: &[String]) -> Self {
        Self {
            devel_mode,
            allow_headers: allow_headers.join(", "),
        }
    }

    /// A negotiator that never grants anything.
    pub fn disabled() -> Self {
        Self::new(false, &[])
    }

    pub fn negotiate(&self, referrer: Option<&str>) -> Option<CorsHeaders> {
        if !self.devel_mode {
            return None;
        }
        let allow_origin = origin_of(referrer?)?;
        log_cors_debug!("Allowing development origin {}", allow_origin);
        Some(CorsHeaders {
            allow_origin,
            allow_headers: self.allow_headers.clone(),
            allow_credentials: true,
        })
    }

    /// Negotiate using the `Referer` header of `request`.
    pub fn negotiate_request(&self, request: &HttpRequest) -> Option<CorsHeaders> {
        let referrer = request
            .headers()
            .get(REFERER)
            .and_then(|value| value.to_str().ok());
        self.negotiate(referrer)
    }

    /// Add the negotiated headers, if any, to a response under construction.
    pub fn apply(&self, request: &HttpRequest, response: &mut HttpResponseBuilder) {
        if let Some(headers) = self.negotiate_request(request) {
            response.insert_header((ACCESS_CONTROL_ALLOW_ORIGIN, headers.allow_origin));
            response.insert_header((ACCESS_CONTROL_ALLOW_HEADERS, headers.allow_headers));
            response.insert_header((
                ACCESS_CONTROL_ALLOW_CREDENTIALS,
                headers.allow_credentials.to_string(),
            ));
        }
    }
}

/// `scheme://host[:port]` of an absolute URL.
pub fn origin_of(referrer: &str) -> Option<String> {
    let url = match Url::parse(referrer) {
        Ok(url) => url,
        Err(e) => {
            log_cors_debug!("Ignoring unparsable referrer '{}': {}", referrer, e);
            return None;
        }
    };
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}
