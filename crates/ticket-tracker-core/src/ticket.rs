use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::TicketError;

/// Identifier of a ticket, assigned by the store on creation
pub type TicketId = u64;

/// Workflow state of a ticket
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    /// Newly created, nobody is working on it
    #[default]
    Open,
    /// Work has started
    InProgress,
    /// Done
    Closed,
}

impl TicketStatus {
    /// All states, in workflow order
    pub const ALL: [TicketStatus; 3] = [Self::Open, Self::InProgress, Self::Closed];

    /// Wire name of the state, e.g. `IN_PROGRESS`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::InProgress => "IN_PROGRESS",
            Self::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = TicketError;

    /// Parse a wire name, ignoring ASCII case (`open`, `Open` and `OPEN` are
    /// the same state)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                TicketError::validation("Invalid status. Must be one of: OPEN, IN_PROGRESS, CLOSED")
            })
    }
}

/// A tracked work item
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Unique, immutable identifier
    pub id: TicketId,
    /// Never blank
    pub title: String,
    /// Free text, serialized as `null` when absent
    pub description: Option<String>,
    /// Workflow state
    pub status: TicketStatus,
    /// Set once on creation
    pub created_at: DateTime<Utc>,
    /// Refreshed by every mutation
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Create an [`TicketStatus::Open`] ticket stamped with the current time
    pub fn new(id: TicketId, title: String, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            description,
            status: TicketStatus::Open,
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh `updated_at`
    ///
    /// The new value is always later than the old one, even if the clock has
    /// not moved since the last refresh.
    pub fn touch(&mut self) {
        let now = Utc::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::nanoseconds(1)
        };
    }
}

/// Body of a create or update request
///
/// A missing `title` is accepted here and rejected by the store like an empty
/// one.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct TicketDraft {
    /// Title of the ticket
    #[serde(default)]
    pub title: Option<String>,
    /// Optional free text
    #[serde(default)]
    pub description: Option<String>,
}

impl TicketDraft {
    /// A draft with a title and no description
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            description: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Body of a status change request
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct StatusChange {
    /// Requested state, parsed case-insensitively by the store
    #[serde(default)]
    pub status: Option<String>,
}

impl StatusChange {
    /// A status change to the given (unparsed) state
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
        }
    }
}
