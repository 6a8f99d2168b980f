//! Scrape session state and status snapshots.
//!
//! One [`ScrapeSession`] value holds everything mutable about a run:
//! lifecycle state, current page, the stop flag, and the accumulated
//! dataset. It is owned by the orchestrator's dispatch loop and never
//! shared; remote observers only ever see [`StatusSnapshot`] projections.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ============================================================================
// Record
// ============================================================================

/// One extracted table row.
///
/// Serializes to a flat JSON object with `rowIndex` and `page` first,
/// then every column in extraction order:
///
/// ```json
/// { "rowIndex": 1, "page": 1, "column_1": "...", "column_2": "..." }
/// ```
///
/// Column order is significant: it drives the CSV header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 1-based position within the dataset, unique per run.
    pub row_index: u64,
    /// Page the row was extracted from.
    pub page: u32,
    /// Column key → cell value, in extraction order.
    pub columns: Vec<(String, String)>,
}

impl Record {
    /// All field keys in serialization order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys = Vec::with_capacity(self.columns.len() + 2);
        keys.push("rowIndex");
        keys.push("page");
        keys.extend(self.columns.iter().map(|(k, _)| k.as_str()));
        keys
    }

    /// Looks up a field by key, rendering numeric fields as strings.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<String> {
        match key {
            "rowIndex" => Some(self.row_index.to_string()),
            "page" => Some(self.page.to_string()),
            _ => self
                .columns
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone()),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len() + 2))?;
        map.serialize_entry("rowIndex", &self.row_index)?;
        map.serialize_entry("page", &self.page)?;
        for (key, value) in &self.columns {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = Record;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a flat record object with rowIndex and page")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Record, A::Error> {
                let mut row_index: Option<u64> = None;
                let mut page: Option<u32> = None;
                let mut columns: Vec<(String, String)> = Vec::new();

                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "rowIndex" => row_index = Some(map.next_value()?),
                        "page" => page = Some(map.next_value()?),
                        _ => columns.push((key, map.next_value()?)),
                    }
                }

                Ok(Record {
                    row_index: row_index.ok_or_else(|| de::Error::missing_field("rowIndex"))?,
                    page: page.ok_or_else(|| de::Error::missing_field("page"))?,
                    columns,
                })
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

// ============================================================================
// SessionState
// ============================================================================

/// Lifecycle state of a scrape run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No run in progress.
    #[default]
    Idle,
    /// Pagination loop active.
    Running,
    /// Terminal per run: exporting, then back to [`SessionState::Idle`].
    Finishing,
}

// ============================================================================
// ScrapeSession
// ============================================================================

/// The mutable state of one scrape run.
///
/// Exactly one session exists per agent. The dataset is append-only for
/// the lifetime of a run; only [`ScrapeSession::clear`] or a fresh run
/// empties it.
#[derive(Debug, Clone)]
pub struct ScrapeSession {
    /// Lifecycle state.
    pub state: SessionState,
    /// 1-based page currently showing.
    pub current_page: u32,
    /// Cooperative cancellation flag.
    ///
    /// Once set, cleared only by `CLEAR` or a fresh `START`.
    pub stop_requested: bool,
    /// Observable processing flag, independent of [`SessionState`].
    pub is_processing: bool,
    /// Accumulated records, in extraction order.
    pub dataset: Vec<Record>,
}

impl Default for ScrapeSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrapeSession {
    /// Creates an idle session on page 1 with an empty dataset.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            current_page: 1,
            stop_requested: false,
            is_processing: false,
            dataset: Vec::new(),
        }
    }

    /// Resets the session for a fresh run.
    pub fn begin_run(&mut self) {
        self.state = SessionState::Running;
        self.current_page = 1;
        self.stop_requested = false;
        self.is_processing = true;
        self.dataset.clear();
    }

    /// Unconditional forced reset, legal in any state including mid-run.
    pub fn clear(&mut self) {
        self.state = SessionState::Idle;
        self.current_page = 1;
        self.stop_requested = false;
        self.is_processing = false;
        self.dataset.clear();
    }

    /// Row index the next appended record must carry.
    ///
    /// Keeps `row_index` values exactly `1..=N` with no gaps.
    #[inline]
    #[must_use]
    pub fn next_row_index(&self) -> u64 {
        self.dataset.len() as u64 + 1
    }

    /// Read-only projection of the session, stamped now.
    #[must_use]
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            is_processing: self.is_processing,
            current_page: self.current_page,
            total_records: self.dataset.len(),
            stop_requested: self.stop_requested,
            timestamp: Utc::now(),
        }
    }
}

// ============================================================================
// StatusSnapshot
// ============================================================================

/// Read-only projection of a [`ScrapeSession`].
///
/// Emitted on the control channel; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    /// Whether a run is being processed.
    pub is_processing: bool,
    /// Page currently showing.
    pub current_page: u32,
    /// Dataset size at snapshot time.
    pub total_records: usize,
    /// Whether a stop has been requested.
    pub stop_requested: bool,
    /// Snapshot creation time.
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(row_index: u64) -> Record {
        Record {
            row_index,
            page: 1,
            columns: vec![
                ("column_1".to_string(), "a".to_string()),
                ("column_2".to_string(), "b".to_string()),
            ],
        }
    }

    #[test]
    fn test_record_serializes_flat_in_order() {
        let json = serde_json::to_string(&record(7)).expect("serialize");
        assert_eq!(
            json,
            r#"{"rowIndex":7,"page":1,"column_1":"a","column_2":"b"}"#
        );
    }

    #[test]
    fn test_record_round_trip() {
        let original = record(3);
        let json = serde_json::to_string(&original).expect("serialize");
        let back: Record = serde_json::from_str(&json).expect("parse");
        assert_eq!(back, original);
    }

    #[test]
    fn test_record_field_lookup() {
        let r = record(9);
        assert_eq!(r.field("rowIndex").as_deref(), Some("9"));
        assert_eq!(r.field("page").as_deref(), Some("1"));
        assert_eq!(r.field("column_2").as_deref(), Some("b"));
        assert_eq!(r.field("column_9"), None);
    }

    #[test]
    fn test_record_keys_order() {
        let r = record(1);
        assert_eq!(r.keys(), vec!["rowIndex", "page", "column_1", "column_2"]);
    }

    #[test]
    fn test_begin_run_resets() {
        let mut session = ScrapeSession::new();
        session.dataset.push(record(1));
        session.current_page = 4;
        session.stop_requested = true;

        session.begin_run();

        assert_eq!(session.state, SessionState::Running);
        assert_eq!(session.current_page, 1);
        assert!(!session.stop_requested);
        assert!(session.is_processing);
        assert!(session.dataset.is_empty());
    }

    #[test]
    fn test_clear_is_unconditional() {
        let mut session = ScrapeSession::new();
        session.begin_run();
        session.dataset.push(record(1));
        session.current_page = 3;
        session.stop_requested = true;

        // Mid-run forced reset.
        assert!(session.is_processing);
        session.clear();

        assert_eq!(session.state, SessionState::Idle);
        assert_eq!(session.current_page, 1);
        assert!(!session.stop_requested);
        assert!(!session.is_processing);
        assert!(session.dataset.is_empty());
    }

    #[test]
    fn test_next_row_index() {
        let mut session = ScrapeSession::new();
        assert_eq!(session.next_row_index(), 1);
        session.dataset.push(record(1));
        session.dataset.push(record(2));
        assert_eq!(session.next_row_index(), 3);
    }

    #[test]
    fn test_snapshot_projection() {
        let mut session = ScrapeSession::new();
        session.begin_run();
        session.dataset.push(record(1));

        let snapshot = session.snapshot();
        assert!(snapshot.is_processing);
        assert_eq!(snapshot.current_page, 1);
        assert_eq!(snapshot.total_records, 1);
        assert!(!snapshot.stop_requested);
    }

    #[test]
    fn test_snapshot_serde_camel_case() {
        let snapshot = StatusSnapshot {
            is_processing: true,
            current_page: 2,
            total_records: 10,
            stop_requested: false,
            timestamp: Utc::now(),
        };

        let json = serde_json::to_string(&snapshot).expect("serialize");
        assert!(json.contains("\"isProcessing\":true"));
        assert!(json.contains("\"currentPage\":2"));
        assert!(json.contains("\"totalRecords\":10"));
        assert!(json.contains("\"stopRequested\":false"));
        assert!(json.contains("\"timestamp\""));
    }
}
