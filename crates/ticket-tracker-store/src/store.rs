//! In-memory ticket store

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use ticket_tracker_core::{Ticket, TicketError, TicketId, TicketStatus};

/// Example tickets the store is seeded with on startup
const EXAMPLE_TICKETS: [(&str, &str); 3] = [
    (
        "Setup CI/CD Pipeline",
        "Initial setup of GitHub Actions workflow",
    ),
    ("Configure Kubernetes", "Set up K8s deployment manifests"),
    (
        "Implement Authentication",
        "Add JWT authentication to the system",
    ),
];

/// Authoritative holder of all tickets
///
/// All operations take `&self`; the map locks per shard and ids come from an
/// atomic counter, so a single store can be shared between threads behind an
/// [`std::sync::Arc`].
#[derive(Debug)]
pub struct TicketStore {
    tickets: DashMap<TicketId, Ticket>,
    /// Next id to hand out, never decremented
    next_id: AtomicU64,
}

impl Default for TicketStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TicketStore {
    /// Create an empty [`TicketStore`]. The first ticket gets id 1.
    pub fn new() -> Self {
        Self {
            tickets: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create the example tickets
    pub fn seed_examples(&self) -> Result<Vec<Ticket>, TicketError> {
        EXAMPLE_TICKETS
            .iter()
            .map(|(title, description)| {
                self.create(title.to_string(), Some(description.to_string()))
            })
            .collect()
    }

    /// Get all tickets, ordered by id
    pub fn list(&self) -> Vec<Ticket> {
        let mut tickets: Vec<Ticket> = self.tickets.iter().map(|e| e.value().clone()).collect();
        tickets.sort_unstable_by_key(|t| t.id);
        tickets
    }

    /// Get the ticket with the given id
    pub fn get(&self, id: TicketId) -> Result<Ticket, TicketError> {
        self.tickets
            .get(&id)
            .map(|t| t.value().clone())
            .ok_or(TicketError::NotFound(id))
    }

    /// Create an open ticket
    pub fn create(&self, title: String, description: Option<String>) -> Result<Ticket, TicketError> {
        validate_title(&title)?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let ticket = Ticket::new(id, title, description);
        self.tickets.insert(id, ticket.clone());
        tracing::debug!(id, "created ticket");
        Ok(ticket)
    }

    /// Replace title and description of a ticket
    pub fn update(
        &self,
        id: TicketId,
        title: String,
        description: Option<String>,
    ) -> Result<Ticket, TicketError> {
        let mut ticket = self.tickets.get_mut(&id).ok_or(TicketError::NotFound(id))?;
        validate_title(&title)?;

        ticket.title = title;
        ticket.description = description;
        ticket.touch();
        tracing::debug!(id, "updated ticket");
        Ok(ticket.clone())
    }

    /// Set the status of a ticket from its wire name, ignoring case
    pub fn update_status(&self, id: TicketId, status: &str) -> Result<Ticket, TicketError> {
        let mut ticket = self.tickets.get_mut(&id).ok_or(TicketError::NotFound(id))?;
        let status: TicketStatus = status.parse()?;

        ticket.status = status;
        ticket.touch();
        tracing::debug!(id, %status, "changed ticket status");
        Ok(ticket.clone())
    }

    /// Remove a ticket. Returns whether it existed.
    pub fn delete(&self, id: TicketId) -> bool {
        let removed = self.tickets.remove(&id).is_some();
        if removed {
            tracing::debug!(id, "deleted ticket");
        }
        removed
    }

    /// Number of stored tickets
    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    /// Whether the store holds no tickets
    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }
}

fn validate_title(title: &str) -> Result<(), TicketError> {
    if title.trim().is_empty() {
        return Err(TicketError::validation("Title cannot be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn create_assigns_increasing_ids() {
        let store = TicketStore::new();
        let a = store.create("a".into(), None).unwrap();
        let b = store.create("b".into(), Some("second".into())).unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(b.status, TicketStatus::Open);
        assert_eq!(b.description.as_deref(), Some("second"));
        assert_eq!(b.created_at, b.updated_at);
    }

    #[test]
    fn blank_titles_are_never_stored() {
        let store = TicketStore::new();
        for title in ["", " ", "\t\n"] {
            assert_eq!(
                store.create(title.into(), None),
                Err(TicketError::validation("Title cannot be empty"))
            );
        }
        assert!(store.is_empty());

        // rejected creations do not consume ids
        assert_eq!(store.create("ok".into(), None).unwrap().id, 1);
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let store = TicketStore::new();
        let first = store.create("first".into(), None).unwrap();
        let second = store.create("second".into(), None).unwrap();

        assert!(store.delete(second.id));
        assert!(store.delete(first.id));
        assert!(!store.delete(first.id));

        let third = store.create("third".into(), None).unwrap();
        assert_eq!(third.id, 3);
        assert_eq!(store.get(first.id), Err(TicketError::NotFound(first.id)));
    }

    #[test]
    fn missing_ids_are_not_found() {
        let store = TicketStore::new();
        store.create("exists".into(), None).unwrap();

        assert_eq!(store.get(99), Err(TicketError::NotFound(99)));
        assert_eq!(
            store.update(99, "title".into(), None),
            Err(TicketError::NotFound(99))
        );
        // the id check happens before input validation
        assert_eq!(
            store.update(99, "".into(), None),
            Err(TicketError::NotFound(99))
        );
        assert_eq!(
            store.update_status(99, "garbage"),
            Err(TicketError::NotFound(99))
        );
        assert!(!store.delete(99));
    }

    #[test]
    fn update_refreshes_updated_at_only() {
        let store = TicketStore::new();
        let before = store.create("old".into(), Some("old text".into())).unwrap();

        let after = store.update(before.id, "new".into(), None).unwrap();
        assert_eq!(after.title, "new");
        assert_eq!(after.description, None);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);
        assert_eq!(store.get(before.id).unwrap(), after);
    }

    #[test]
    fn update_rejects_blank_title() {
        let store = TicketStore::new();
        let ticket = store.create("keep".into(), None).unwrap();

        assert!(matches!(
            store.update(ticket.id, "  ".into(), Some("x".into())),
            Err(TicketError::Validation(_))
        ));
        assert_eq!(store.get(ticket.id).unwrap(), ticket);
    }

    #[test]
    fn update_status_ignores_case() {
        let store = TicketStore::new();
        let ticket = store.create("t".into(), None).unwrap();

        let mut last = ticket.updated_at;
        for text in ["closed", "open", "OPEN", "Open", "In_Progress"] {
            let updated = store.update_status(ticket.id, text).unwrap();
            assert_eq!(updated.status.as_str(), text.to_ascii_uppercase());
            assert!(updated.updated_at > last, "status change must refresh updatedAt");
            assert_eq!(updated.created_at, ticket.created_at);
            last = updated.updated_at;
        }

        let before = store.get(ticket.id).unwrap();
        assert!(matches!(
            store.update_status(ticket.id, "unknown"),
            Err(TicketError::Validation(_))
        ));
        assert_eq!(store.get(ticket.id).unwrap(), before);
    }

    #[test]
    fn list_is_ordered_by_id() {
        let store = TicketStore::new();
        for i in 0..20 {
            store.create(format!("ticket {i}"), None).unwrap();
        }
        store.delete(5);

        let ids: Vec<_> = store.list().iter().map(|t| t.id).collect();
        let expected: Vec<_> = (1..=20).filter(|&id| id != 5).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn seeds_three_examples() {
        let store = TicketStore::new();
        let seeded = store.seed_examples().unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(seeded[0].title, "Setup CI/CD Pipeline");
        assert_eq!(seeded[2].id, 3);
        assert!(seeded.iter().all(|t| t.status == TicketStatus::Open));
    }

    #[test]
    fn concurrent_creates_get_distinct_ids() {
        let store = Arc::new(TicketStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                thread::spawn(move || {
                    (0..250)
                        .map(|j| store.create(format!("{i}-{j}"), None).unwrap().id)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<_> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 2_000);
        assert_eq!(store.len(), 2_000);
        assert_eq!(ids.first(), Some(&1));
        assert_eq!(ids.last(), Some(&2_000));
    }
}
