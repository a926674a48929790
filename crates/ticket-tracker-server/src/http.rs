//! 🏗 HTTP request implementation

use std::io;
use std::io::Read;

use ticket_tracker_core::{Config, RawRequest, Request, RequestKind, RequestMethod, RouteError};
use tiny_http::{Header, Response};
use uuid::Uuid;

/// Methods listed in preflight responses
const ALLOWED_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, OPTIONS";
/// Headers a cross-origin client may send unless the preflight asks for others
const ALLOWED_HEADERS: &str = "Content-Type, X-Request-Id";
/// Seconds a browser may cache a preflight response
const PREFLIGHT_MAX_AGE: &str = "1800";

struct HTTPRequest {
    inner: tiny_http::Request,
    /// Origin to grant cross-origin access to, if it is allowed
    cors_origin: Option<String>,
}

impl RawRequest for HTTPRequest {
    fn url(&self) -> &str {
        self.inner.url()
    }

    fn method(&self) -> RequestMethod {
        method(self.inner.method())
    }

    fn read_string(&mut self) -> io::Result<String> {
        let mut s = String::with_capacity(self.inner.body_length().unwrap_or(0));
        self.inner.as_reader().read_to_string(&mut s)?;
        Ok(s)
    }

    fn respond_with_json(self: Box<Self>, status: u16, json: String, request_id: Uuid) {
        let mut res = Response::from_string(json).with_status_code(status);
        add_header(&mut res, "Content-Type", "application/json");
        self.respond(res, request_id)
    }

    fn respond_with_status(self: Box<Self>, status: u16, request_id: Uuid) {
        self.respond(Response::empty(status), request_id)
    }
}

impl HTTPRequest {
    /// Add HTTP headers (CORS, X-Request-Id) to `res` and send it
    fn respond<R: Read>(self, mut res: Response<R>, request_id: Uuid) {
        add_response_cors_headers(&mut res, self.cors_origin.as_deref());
        send(self.inner, res, request_id);
    }
}

/// Parse the given HTTP request
///
/// If [`None`] is returned, the request was already answered (preflight,
/// unknown route, wrong method).
pub fn parse(rq: tiny_http::Request, config: &Config) -> Option<Request> {
    let mut request_id = None;
    let mut origin = None;
    let mut preflight_headers = None;
    for hdr in rq.headers() {
        if hdr.field.equiv("x-request-id") {
            if let Ok(id) = Uuid::parse_str(hdr.value.as_str()) {
                request_id = Some(id);
            }
        } else if hdr.field.equiv("origin") {
            origin = Some(hdr.value.as_str().to_owned());
        } else if hdr.field.equiv("access-control-request-headers") {
            preflight_headers = Some(hdr.value.as_str().to_owned());
        }
    }
    let request_id = request_id.unwrap_or_else(Uuid::new_v4);
    let cors_origin = origin.filter(|origin| config.is_origin_allowed(origin));

    let method = method(rq.method());
    if method == RequestMethod::Options {
        let mut res = Response::empty(204);
        if let Some(origin) = cors_origin.as_deref() {
            add_response_cors_headers(&mut res, Some(origin));
            add_header(&mut res, "Access-Control-Allow-Methods", ALLOWED_METHODS);
            add_header(
                &mut res,
                "Access-Control-Allow-Headers",
                preflight_headers.as_deref().unwrap_or(ALLOWED_HEADERS),
            );
            add_header(&mut res, "Access-Control-Max-Age", PREFLIGHT_MAX_AGE);
        }
        send(rq, res, request_id);
        return None;
    }

    let kind = match RequestKind::route(method, rq.url()) {
        Ok(kind) => kind,
        Err(RouteError::NotFound) => {
            tracing::debug!(%request_id, url = rq.url(), "no such route");
            let mut res = Response::from_string(
                "🦀 could not find the service you are looking for!

Valid requests are:
  GET    /api/tickets
  POST   /api/tickets
  GET    /api/tickets/{id}
  PUT    /api/tickets/{id}
  PATCH  /api/tickets/{id}/status
  DELETE /api/tickets/{id}",
            )
            .with_status_code(404);
            add_response_cors_headers(&mut res, cors_origin.as_deref());
            send(rq, res, request_id);
            return None;
        }
        Err(RouteError::MethodNotAllowed(allowed)) => {
            tracing::debug!(%request_id, method = method.as_str(), url = rq.url(), "method not allowed");
            let mut res = Response::empty(405);
            add_header(&mut res, "Allow", &allow_header(allowed));
            add_response_cors_headers(&mut res, cors_origin.as_deref());
            send(rq, res, request_id);
            return None;
        }
    };

    Some(Request::from_raw(
        kind,
        request_id,
        Box::new(HTTPRequest {
            inner: rq,
            cors_origin,
        }),
    ))
}

fn method(method: &tiny_http::Method) -> RequestMethod {
    match method {
        tiny_http::Method::Get => RequestMethod::Get,
        tiny_http::Method::Post => RequestMethod::Post,
        tiny_http::Method::Put => RequestMethod::Put,
        tiny_http::Method::Patch => RequestMethod::Patch,
        tiny_http::Method::Delete => RequestMethod::Delete,
        tiny_http::Method::Options => RequestMethod::Options,
        _ => RequestMethod::Other,
    }
}

/// Value of the `Allow` header for a path serving `methods`
///
/// Every path also answers `OPTIONS` preflights.
fn allow_header(methods: &[RequestMethod]) -> String {
    methods
        .iter()
        .chain([&RequestMethod::Options])
        .map(RequestMethod::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Tag `res` with the request id and send it
fn send<R: Read>(rq: tiny_http::Request, mut res: Response<R>, request_id: Uuid) {
    add_header(&mut res, "X-Request-Id", &request_id.hyphenated().to_string());
    if let Err(e) = rq.respond(res) {
        tracing::warn!(%request_id, error = %e, "HTTP response failed");
    }
}

/// Add CORS headers to `res` if the request came from an allowed origin
fn add_response_cors_headers<R: Read>(res: &mut Response<R>, origin: Option<&str>) {
    if let Some(origin) = origin {
        add_header(res, "Access-Control-Allow-Origin", origin);
        add_header(res, "Access-Control-Expose-Headers", "X-Request-Id");
        add_header(res, "Vary", "Origin");
    }
}

fn add_header<R: Read>(res: &mut Response<R>, field: &str, value: &str) {
    match Header::from_bytes(field.as_bytes(), value.as_bytes()) {
        Ok(header) => res.add_header(header),
        Err(()) => tracing::warn!(field, "dropping invalid response header"),
    }
}
