//! Outbound event envelopes.
//!
//! Everything the agent tells the coordinator travels as
//! `{"type": ..., "data": {...}}`. Two event types exist:
//!
//! | Type | Payload | Emitted |
//! |------|---------|---------|
//! | `STATUS_UPDATE` | snapshot only | after every page, on `STATUS` |
//! | `PROGRESS` | snapshot + message | at every lifecycle milestone |
//!
//! There is no correlation with inbound commands; composing layers must
//! subscribe to these events rather than await replies.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::scrape::StatusSnapshot;

// ============================================================================
// ProgressData
// ============================================================================

/// Payload of a `PROGRESS` event: a snapshot plus a human-readable
/// milestone message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressData {
    /// Session projection at the time of the milestone.
    #[serde(flatten)]
    pub snapshot: StatusSnapshot,
    /// Milestone description (start, page done, exhausted, exported).
    pub message: String,
}

// ============================================================================
// OutboundEvent
// ============================================================================

/// An event broadcast from the agent to the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OutboundEvent {
    /// Bare status snapshot.
    #[serde(rename = "STATUS_UPDATE")]
    StatusUpdate(StatusSnapshot),

    /// Status snapshot plus milestone message.
    #[serde(rename = "PROGRESS")]
    Progress(ProgressData),
}

impl OutboundEvent {
    /// Creates a `STATUS_UPDATE` event.
    #[inline]
    #[must_use]
    pub fn status(snapshot: StatusSnapshot) -> Self {
        Self::StatusUpdate(snapshot)
    }

    /// Creates a `PROGRESS` event.
    #[inline]
    #[must_use]
    pub fn progress(snapshot: StatusSnapshot, message: impl Into<String>) -> Self {
        Self::Progress(ProgressData {
            snapshot,
            message: message.into(),
        })
    }

    /// The carried snapshot, whichever the event type.
    #[must_use]
    pub fn snapshot(&self) -> &StatusSnapshot {
        match self {
            Self::StatusUpdate(snapshot) => snapshot,
            Self::Progress(data) => &data.snapshot,
        }
    }

    /// Wire name of the event type.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::StatusUpdate(_) => "STATUS_UPDATE",
            Self::Progress(_) => "PROGRESS",
        }
    }

    /// Serializes the event into one text frame.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
