use thiserror::Error;

use crate::{RequestMethod, TicketId};

/// Failure of a ticket operation
///
/// Both variants are request-scoped: the HTTP layer answers
/// [`TicketError::Validation`] with `400` and a JSON error message, and
/// [`TicketError::NotFound`] with an empty `404`.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TicketError {
    /// The client sent malformed or invalid input
    #[error("{0}")]
    Validation(String),

    /// No ticket with the given id exists
    #[error("ticket {0} not found")]
    NotFound(TicketId),
}

impl TicketError {
    /// Shorthand for a [`TicketError::Validation`]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Failure to map a method and URL onto a [`crate::RequestKind`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The path does not name any resource
    #[error("could not find the service you are looking for")]
    NotFound,

    /// The path exists, but not for this method
    ///
    /// Carries the methods the path does serve.
    #[error("method not allowed")]
    MethodNotAllowed(&'static [RequestMethod]),
}
