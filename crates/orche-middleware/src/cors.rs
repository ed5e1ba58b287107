//! CORS (Cross-Origin Resource Sharing) enforcement.
//!
//! A [`Cors`] is built from declared [`CorsOptions`] and used in two places:
//!
//! - as the `OPTIONS` responder the route compiler registers ahead of a
//!   unit declared with `preflight: true` ([`Cors::preflight`])
//! - as the wrapper around a verb handler declared with `corsOptions`
//!   ([`Cors::apply`]), which decorates the response before the handler runs
//!
//! ## Preflight Requests
//!
//! The responder validates the origin, the requested method and the
//! requested headers. A rejected preflight gets `403 Forbidden`; an accepted
//! one gets `optionsSuccessStatus` (204 by default) with the CORS headers.

use http::header::CONTENT_TYPE;
use http::{HeaderMap, Method, StatusCode};
use orche_core::{AllowedOrigins, CorsOptions, Exchange, Flow};

/// CORS header names.
pub mod headers {
    /// `Access-Control-Allow-Origin` header.
    pub const ALLOW_ORIGIN: &str = "access-control-allow-origin";
    /// `Access-Control-Allow-Methods` header.
    pub const ALLOW_METHODS: &str = "access-control-allow-methods";
    /// `Access-Control-Allow-Headers` header.
    pub const ALLOW_HEADERS: &str = "access-control-allow-headers";
    /// `Access-Control-Allow-Credentials` header.
    pub const ALLOW_CREDENTIALS: &str = "access-control-allow-credentials";
    /// `Access-Control-Max-Age` header.
    pub const MAX_AGE: &str = "access-control-max-age";
    /// `Access-Control-Expose-Headers` header.
    pub const EXPOSE_HEADERS: &str = "access-control-expose-headers";
    /// `Access-Control-Request-Method` header (preflight).
    pub const REQUEST_METHOD: &str = "access-control-request-method";
    /// `Access-Control-Request-Headers` header (preflight).
    pub const REQUEST_HEADERS: &str = "access-control-request-headers";
    /// `Origin` header.
    pub const ORIGIN: &str = "origin";
    /// `Vary` header.
    pub const VARY: &str = "vary";
}

/// CORS enforcement for one declared policy.
#[derive(Debug, Clone, Default)]
pub struct Cors {
    options: CorsOptions,
}

impl Cors {
    /// Creates the enforcement for `options`.
    pub fn new(options: CorsOptions) -> Self {
        Self { options }
    }

    /// Returns the enforced options.
    pub fn options(&self) -> &CorsOptions {
        &self.options
    }

    /// Returns true if the request is a CORS preflight.
    pub fn is_preflight(method: &Method, headers: &HeaderMap) -> bool {
        method == Method::OPTIONS
            && headers.contains_key(headers::ORIGIN)
            && headers.contains_key(headers::REQUEST_METHOD)
    }

    /// Answers a preflight request. Always terminates the exchange.
    pub fn preflight(&self, exchange: &Exchange) -> Flow {
        let (origin, requested_method, requested_headers) = {
            let request = exchange.request().read();
            (
                request.header(headers::ORIGIN).map(str::to_string),
                request.header(headers::REQUEST_METHOD).map(str::to_string),
                request.header(headers::REQUEST_HEADERS).map(str::to_string),
            )
        };
        let response = exchange.response();

        if let Some(origin) = origin.as_deref() {
            if !self.options.origin.is_allowed(origin) {
                return self.forbidden(exchange, "Origin not allowed");
            }
        }

        if let Some(method) = requested_method.as_deref() {
            if !self
                .options
                .methods
                .iter()
                .any(|m| m.eq_ignore_ascii_case(method.trim()))
            {
                return self.forbidden(exchange, "Method not allowed");
            }
        }

        let allow_headers = match (&self.options.allowed_headers, requested_headers.as_deref()) {
            (Some(allowed), Some(requested)) => {
                let allowed_lower: Vec<String> =
                    allowed.iter().map(|h| h.to_ascii_lowercase()).collect();
                if !allowed_lower.iter().any(|h| h == "*") {
                    for header in requested.split(',').map(|h| h.trim().to_ascii_lowercase()) {
                        if !header.is_empty() && !allowed_lower.contains(&header) {
                            return self.forbidden(exchange, &format!("Header '{header}' not allowed"));
                        }
                    }
                }
                Some(allowed.join(","))
            }
            (Some(allowed), None) => Some(allowed.join(",")),
            // Reflect what the browser asked for.
            (None, requested) => requested.map(str::to_string),
        };

        self.origin_headers(exchange, origin.as_deref());
        response.header(headers::ALLOW_METHODS, &self.options.methods.join(","));
        if let Some(value) = allow_headers.filter(|v| !v.is_empty()) {
            response.header(headers::ALLOW_HEADERS, &value);
        }
        if let Some(max_age) = self.options.max_age {
            response.header(headers::MAX_AGE, &max_age.to_string());
        }
        response.header(
            headers::VARY,
            "Origin, Access-Control-Request-Method, Access-Control-Request-Headers",
        );

        let status = StatusCode::from_u16(self.options.options_success_status)
            .unwrap_or(StatusCode::NO_CONTENT);
        response.status(status).send(Vec::new());
        tracing::debug!(status = status.as_u16(), "preflight answered");
        Flow::Responded
    }

    /// Adds CORS headers for a regular request and lets it continue.
    ///
    /// Requests from disallowed origins continue without CORS headers.
    pub fn apply(&self, exchange: &Exchange) -> Flow {
        let origin = exchange
            .request()
            .read()
            .header(headers::ORIGIN)
            .map(str::to_string);

        match origin.as_deref() {
            Some(origin) if !self.options.origin.is_allowed(origin) => {
                tracing::debug!(origin, "origin not allowed, no CORS headers added");
            }
            origin => {
                self.origin_headers(exchange, origin);
                if !self.options.exposed_headers.is_empty() {
                    exchange
                        .response()
                        .header(headers::EXPOSE_HEADERS, &self.options.exposed_headers.join(","));
                }
            }
        }
        Flow::Next
    }

    fn origin_headers(&self, exchange: &Exchange, origin: Option<&str>) {
        let response = exchange.response();
        match (&self.options.origin, origin) {
            // `*` cannot be combined with credentials; echo the origin instead.
            (AllowedOrigins::Any, Some(origin)) if self.options.credentials => {
                response.header(headers::ALLOW_ORIGIN, origin);
                response.header(headers::VARY, "Origin");
            }
            (AllowedOrigins::Any, _) => {
                response.header(headers::ALLOW_ORIGIN, "*");
            }
            (AllowedOrigins::List(_), Some(origin)) => {
                response.header(headers::ALLOW_ORIGIN, origin);
                response.header(headers::VARY, "Origin");
            }
            (AllowedOrigins::List(_), None) => {}
        }
        if self.options.credentials {
            response.header(headers::ALLOW_CREDENTIALS, "true");
        }
    }

    fn forbidden(&self, exchange: &Exchange, message: &str) -> Flow {
        tracing::debug!(reason = message, "preflight rejected");
        exchange
            .response()
            .status(StatusCode::FORBIDDEN)
            .header(CONTENT_TYPE.as_str(), "text/plain")
            .send(message.to_string());
        Flow::Responded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orche_core::RawRequest;

    fn preflight_exchange(origin: &str, method: &str, req_headers: Option<&str>) -> Exchange {
        let mut request = RawRequest::new(Method::OPTIONS, "/orche/computers");
        request.set_header("Origin", origin);
        request.set_header("Access-Control-Request-Method", method);
        if let Some(h) = req_headers {
            request.set_header("Access-Control-Request-Headers", h);
        }
        Exchange::new(request)
    }

    #[test]
    fn test_is_preflight() {
        let ex = preflight_exchange("https://a.io", "POST", None);
        let req = ex.request().read();
        assert!(Cors::is_preflight(&req.method, &req.headers));
        assert!(!Cors::is_preflight(&Method::GET, &req.headers));
    }

    #[test]
    fn test_preflight_default_options() {
        let ex = preflight_exchange("https://a.io", "POST", Some("x-token"));
        assert_eq!(Cors::default().preflight(&ex), Flow::Responded);

        let state = ex.into_response();
        assert_eq!(state.status, StatusCode::NO_CONTENT);
        assert_eq!(state.headers[headers::ALLOW_ORIGIN], "*");
        assert_eq!(state.headers[headers::ALLOW_METHODS], "GET,HEAD,PUT,PATCH,POST,DELETE");
        assert_eq!(state.headers[headers::ALLOW_HEADERS], "x-token");
    }

    #[test]
    fn test_preflight_disallowed_origin() {
        let cors = Cors::new(CorsOptions::default().origins(["https://a.io"]));
        let ex = preflight_exchange("https://evil.io", "GET", None);
        cors.preflight(&ex);
        assert_eq!(ex.into_response().status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_preflight_disallowed_method() {
        let cors = Cors::new(CorsOptions::default().methods(["GET"]));
        let ex = preflight_exchange("https://a.io", "DELETE", None);
        cors.preflight(&ex);
        assert_eq!(ex.into_response().status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_preflight_disallowed_header() {
        let cors = Cors::new(CorsOptions::default().allowed_headers(["Content-Type"]));
        let ex = preflight_exchange("https://a.io", "GET", Some("content-type, x-secret"));
        cors.preflight(&ex);
        let state = ex.into_response();
        assert_eq!(state.status, StatusCode::FORBIDDEN);
        assert_eq!(state.body, "Header 'x-secret' not allowed");
    }

    #[test]
    fn test_preflight_with_credentials_and_max_age() {
        let cors = Cors::new(CorsOptions::default().credentials(true).max_age(600));
        let ex = preflight_exchange("https://a.io", "GET", None);
        cors.preflight(&ex);
        let state = ex.into_response();
        assert_eq!(state.headers[headers::ALLOW_ORIGIN], "https://a.io");
        assert_eq!(state.headers[headers::ALLOW_CREDENTIALS], "true");
        assert_eq!(state.headers[headers::MAX_AGE], "600");
    }

    #[test]
    fn test_apply_adds_headers_and_continues() {
        let cors = Cors::new(
            CorsOptions::default()
                .origins(["https://a.io"])
                .exposed_headers(["x-request-id"]),
        );
        let mut request = RawRequest::new(Method::GET, "/");
        request.set_header("Origin", "https://a.io");
        let ex = Exchange::new(request);

        assert_eq!(cors.apply(&ex), Flow::Next);
        let state = ex.into_response();
        assert_eq!(state.headers[headers::ALLOW_ORIGIN], "https://a.io");
        assert_eq!(state.headers[headers::EXPOSE_HEADERS], "x-request-id");
        assert!(!state.sent);
    }

    #[test]
    fn test_apply_disallowed_origin_adds_nothing() {
        let cors = Cors::new(CorsOptions::default().origins(["https://a.io"]));
        let mut request = RawRequest::new(Method::GET, "/");
        request.set_header("Origin", "https://evil.io");
        let ex = Exchange::new(request);

        assert_eq!(cors.apply(&ex), Flow::Next);
        assert!(ex.into_response().headers.get(headers::ALLOW_ORIGIN).is_none());
    }
}
