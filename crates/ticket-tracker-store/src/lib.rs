//! Ticket storage and the request handler serving the ticket API
//!
//! The [store] owns every ticket for the lifetime of the process; the
//! [tracker] translates requests into store operations. [`launch()`] wires
//! both together for the transport.

#![allow(rustdoc::private_intra_doc_links)]
use std::sync::Arc;

use ticket_tracker_core::Config;

mod store;
mod tracker;

pub use store::TicketStore;
pub use tracker::Tracker;

/// Entrypoint of the tracker
///
/// Constructs a fresh store, seeds it if the configuration asks for it, and
/// returns the handler the transport serves requests to.
pub fn launch(config: &Config) -> Tracker {
    let store = Arc::new(TicketStore::new());

    if config.seed {
        match store.seed_examples() {
            Ok(seeded) => tracing::info!(tickets = seeded.len(), "seeded example tickets"),
            Err(err) => tracing::warn!(%err, "could not seed example tickets"),
        }
    }

    Tracker::new(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_respects_seed_flag() {
        let seeded = launch(&Config::default());
        assert_eq!(seeded.store().len(), 3);

        let empty = launch(&Config {
            seed: false,
            ..Config::default()
        });
        assert!(empty.store().is_empty());
    }
}
