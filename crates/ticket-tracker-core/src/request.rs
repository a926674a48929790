use std::io;

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::{RouteError, Ticket, TicketError, TicketId};

/// Kind of the request, i.e. the resolved route
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum RequestKind {
    /// `GET /api/tickets`: list all tickets
    ListTickets,

    /// `GET /api/tickets/{id}`: fetch one ticket
    GetTicket(TicketId),

    /// `POST /api/tickets`: create a ticket from a [`crate::TicketDraft`]
    CreateTicket,

    /// `PUT /api/tickets/{id}`: replace title and description from a
    /// [`crate::TicketDraft`]
    UpdateTicket(TicketId),

    /// `PATCH /api/tickets/{id}/status`: change the state from a
    /// [`crate::StatusChange`]
    UpdateStatus(TicketId),

    /// `DELETE /api/tickets/{id}`: remove a ticket
    DeleteTicket(TicketId),
}

impl RequestKind {
    /// Prefix shared by all routes
    pub const BASE_PATH: &'static str = "/api/tickets";

    /// Resolve a request line into a [`RequestKind`]
    ///
    /// Query strings and trailing slashes are ignored. An `{id}` segment that
    /// is not a decimal [`u64`] does not name a resource.
    pub fn route(method: RequestMethod, url: &str) -> Result<Self, RouteError> {
        use RequestMethod::*;
        const COLLECTION: &[RequestMethod] = &[Get, Post];
        const TICKET: &[RequestMethod] = &[Get, Put, Delete];
        const STATUS: &[RequestMethod] = &[Patch];

        let path = url.split('?').next().unwrap_or(url).trim_end_matches('/');
        let rest = path
            .strip_prefix(Self::BASE_PATH)
            .ok_or(RouteError::NotFound)?;
        let segments: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.strip_prefix('/')
                .ok_or(RouteError::NotFound)?
                .split('/')
                .collect()
        };

        match segments.as_slice() {
            [] => match method {
                Get => Ok(RequestKind::ListTickets),
                Post => Ok(RequestKind::CreateTicket),
                _ => Err(RouteError::MethodNotAllowed(COLLECTION)),
            },
            [id] => {
                let id = parse_id(id)?;
                match method {
                    Get => Ok(RequestKind::GetTicket(id)),
                    Put => Ok(RequestKind::UpdateTicket(id)),
                    Delete => Ok(RequestKind::DeleteTicket(id)),
                    _ => Err(RouteError::MethodNotAllowed(TICKET)),
                }
            }
            [id, "status"] => {
                let id = parse_id(id)?;
                match method {
                    Patch => Ok(RequestKind::UpdateStatus(id)),
                    _ => Err(RouteError::MethodNotAllowed(STATUS)),
                }
            }
            _ => Err(RouteError::NotFound),
        }
    }

    /// Method and path that resolve to this kind
    pub fn request_line(&self) -> (RequestMethod, String) {
        use RequestKind::*;
        let base = Self::BASE_PATH;
        match *self {
            ListTickets => (RequestMethod::Get, base.to_string()),
            CreateTicket => (RequestMethod::Post, base.to_string()),
            GetTicket(id) => (RequestMethod::Get, format!("{base}/{id}")),
            UpdateTicket(id) => (RequestMethod::Put, format!("{base}/{id}")),
            DeleteTicket(id) => (RequestMethod::Delete, format!("{base}/{id}")),
            UpdateStatus(id) => (RequestMethod::Patch, format!("{base}/{id}/status")),
        }
    }
}

fn parse_id(segment: &str) -> Result<TicketId, RouteError> {
    // `u64::from_str` accepts a leading `+`, a path segment must not have one
    if segment.bytes().all(|b| b.is_ascii_digit()) {
        segment.parse().map_err(|_| RouteError::NotFound)
    } else {
        Err(RouteError::NotFound)
    }
}

/// HTTP request method
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum RequestMethod {
    /// GET request
    Get,
    /// POST request, has a payload
    Post,
    /// PUT request, has a payload
    Put,
    /// PATCH request, has a payload
    Patch,
    /// DELETE request
    Delete,
    /// OPTIONS request, i.e. a CORS preflight
    Options,
    /// Any method the tracker does not serve
    Other,
}

impl RequestMethod {
    /// Upper-case method name as it appears on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Patch => "PATCH",
            RequestMethod::Delete => "DELETE",
            RequestMethod::Options => "OPTIONS",
            RequestMethod::Other => "OTHER",
        }
    }
}

/// Request sent by a client
pub struct Request {
    kind: RequestKind,
    request_id: Uuid,
    raw: Box<dyn RawRequest + Send>,
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("kind", &self.kind)
            .field("request_id", &self.request_id)
            .field("raw", &format_args!(".."))
            .finish()
    }
}

/// Interface for handling requests from clients
pub trait RequestHandler {
    /// Handle a request
    ///
    /// This method may be called concurrently from different threads. Every
    /// request must be answered exactly once.
    fn handle(&self, request: Request);

    /// Shut the handler down
    ///
    /// Called once after the transport has stopped delivering requests.
    fn shutdown(self);
}

/// A raw request, implemented by the transport (HTTP server or test harness)
pub trait RawRequest {
    /// Get the URL
    fn url(&self) -> &str;
    /// Get the request method
    fn method(&self) -> RequestMethod;

    /// Read the request body as string
    fn read_string(&mut self) -> io::Result<String>;

    /// Respond with a JSON document
    fn respond_with_json(self: Box<Self>, status: u16, json: String, request_id: Uuid);
    /// Respond with an empty body
    fn respond_with_status(self: Box<Self>, status: u16, request_id: Uuid);
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl Request {
    /// Get the request's kind
    #[inline]
    pub fn kind(&self) -> &RequestKind {
        &self.kind
    }

    /// Get the id correlating this request with its response and log lines
    #[inline]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Get the request URL
    #[inline]
    pub fn url(&self) -> &str {
        self.raw.url()
    }

    /// Get the request method
    #[inline]
    pub fn method(&self) -> RequestMethod {
        self.raw.method()
    }

    /// Read the payload as a UTF-8 string
    ///
    /// This method has side effects and should be called only once per
    /// request.
    #[inline]
    pub fn read_string(&mut self) -> io::Result<String> {
        self.raw.read_string()
    }

    /// Read the payload as a JSON document of type `T`
    ///
    /// Unreadable or malformed bodies are a [`TicketError::Validation`].
    pub fn read_json<T: DeserializeOwned>(&mut self) -> Result<T, TicketError> {
        let body = self
            .read_string()
            .map_err(|e| TicketError::Validation(format!("Invalid request body: {e}")))?;
        serde_json::from_str(&body)
            .map_err(|e| TicketError::Validation(format!("Invalid request body: {e}")))
    }

    /// Respond with `200 OK` and the ticket
    pub fn respond_with_ticket(self, ticket: &Ticket) {
        self.respond_with(200, ticket);
    }

    /// Respond with `201 Created` and the new ticket
    pub fn respond_with_created(self, ticket: &Ticket) {
        self.respond_with(201, ticket);
    }

    /// Respond with `200 OK` and a JSON array of tickets
    pub fn respond_with_tickets(self, tickets: &[Ticket]) {
        self.respond_with(200, tickets);
    }

    /// Respond with `204 No Content`
    pub fn respond_with_no_content(self) {
        self.raw.respond_with_status(204, self.request_id);
    }

    /// Respond with `404 Not Found` and an empty body
    pub fn respond_with_not_found(self) {
        self.raw.respond_with_status(404, self.request_id);
    }

    /// Respond with `400 Bad Request` and `{"error": err}`
    pub fn respond_with_err(self, err: impl AsRef<str>) {
        self.respond_with(400, &ErrorBody { error: err.as_ref() });
    }

    /// Respond with the status code matching a failed operation
    pub fn respond_with_error(self, err: &TicketError) {
        match err {
            TicketError::Validation(msg) => self.respond_with_err(msg),
            TicketError::NotFound(_) => self.respond_with_not_found(),
        }
    }

    fn respond_with<T: Serialize + ?Sized>(self, status: u16, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.raw.respond_with_json(status, json, self.request_id),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize response");
                self.raw.respond_with_status(500, self.request_id);
            }
        }
    }

    /// Create a new request from a [`RawRequest`]
    #[inline]
    pub fn from_raw(kind: RequestKind, request_id: Uuid, raw: Box<dyn RawRequest + Send>) -> Self {
        Self {
            kind,
            request_id,
            raw,
        }
    }
}
