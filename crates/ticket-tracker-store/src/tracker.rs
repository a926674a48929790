//! Implementation of the ticket API on top of the store
use std::sync::Arc;

use ticket_tracker_core::{
    Request, RequestHandler, RequestKind, StatusChange, Ticket, TicketDraft, TicketError, TicketId,
};

use crate::TicketStore;

/// Request handler serving the ticket API
///
/// The tracker itself holds no state besides the shared store, so it can be
/// called from any number of threads at once.
pub struct Tracker {
    store: Arc<TicketStore>,
}

impl Tracker {
    /// Create a new [`Tracker`] serving `store`
    pub fn new(store: Arc<TicketStore>) -> Self {
        Self { store }
    }

    /// The store this tracker serves
    pub fn store(&self) -> &Arc<TicketStore> {
        &self.store
    }

    fn create(&self, rq: &mut Request) -> Result<Ticket, TicketError> {
        let draft: TicketDraft = rq.read_json()?;
        self.store
            .create(draft.title.unwrap_or_default(), draft.description)
    }

    fn update(&self, rq: &mut Request, id: TicketId) -> Result<Ticket, TicketError> {
        let draft: TicketDraft = rq.read_json()?;
        self.store
            .update(id, draft.title.unwrap_or_default(), draft.description)
    }

    fn update_status(&self, rq: &mut Request, id: TicketId) -> Result<Ticket, TicketError> {
        let change: StatusChange = rq.read_json()?;
        let status = change
            .status
            .ok_or_else(|| TicketError::validation("Status is required"))?;
        self.store.update_status(id, &status)
    }
}

impl RequestHandler for Tracker {
    fn handle(&self, mut rq: Request) {
        match *rq.kind() {
            RequestKind::ListTickets => {
                let tickets = self.store.list();
                rq.respond_with_tickets(&tickets);
            }
            RequestKind::GetTicket(id) => match self.store.get(id) {
                Ok(ticket) => rq.respond_with_ticket(&ticket),
                Err(err) => rq.respond_with_error(&err),
            },
            RequestKind::CreateTicket => match self.create(&mut rq) {
                Ok(ticket) => {
                    tracing::info!(id = ticket.id, "ticket created");
                    rq.respond_with_created(&ticket);
                }
                Err(err) => {
                    tracing::debug!(%err, "rejected ticket creation");
                    rq.respond_with_error(&err);
                }
            },
            RequestKind::UpdateTicket(id) => match self.update(&mut rq, id) {
                Ok(ticket) => rq.respond_with_ticket(&ticket),
                Err(err) => {
                    tracing::debug!(id, %err, "rejected ticket update");
                    rq.respond_with_error(&err);
                }
            },
            RequestKind::UpdateStatus(id) => match self.update_status(&mut rq, id) {
                Ok(ticket) => rq.respond_with_ticket(&ticket),
                Err(err) => {
                    tracing::debug!(id, %err, "rejected status change");
                    rq.respond_with_error(&err);
                }
            },
            RequestKind::DeleteTicket(id) => {
                if self.store.delete(id) {
                    tracing::info!(id, "ticket deleted");
                    rq.respond_with_no_content();
                } else {
                    rq.respond_with_not_found();
                }
            }
        }
    }

    fn shutdown(self) {
        tracing::info!(tickets = self.store.len(), "tracker shut down");
    }
}
