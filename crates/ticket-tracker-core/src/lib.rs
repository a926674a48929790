//! 🏗 Domain types and infrastructure for handling requests
#![warn(missing_docs)]

mod config;
mod error;
mod request;
mod ticket;

pub use config::{Config, ConfigError};
pub use error::{RouteError, TicketError};
pub use request::{RawRequest, Request, RequestHandler, RequestKind, RequestMethod};
pub use ticket::{StatusChange, Ticket, TicketDraft, TicketId, TicketStatus};
