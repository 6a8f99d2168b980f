//! Booking Scraper - Remote-controlled multi-page table scraping agent.
//!
//! This library extracts tabular records from a paginated page under
//! remote command, accumulates them in one session-owned dataset, and
//! serializes the result to CSV/JSON artifacts.
//!
//! # Architecture
//!
//! The agent follows a coordinator-agent model:
//!
//! - **Coordinator (remote)**: Sends commands, receives events via WebSocket
//! - **Agent (this crate)**: Runs the pagination state machine, emits events
//!
//! Key design principles:
//!
//! - One [`Orchestrator`] dispatch loop owns all mutable session state
//! - Protocol is fire-and-forget: commands in, events out, no correlation
//! - Page access hides behind the [`PageAccessor`] capability trait
//! - Cancellation is cooperative and lands only at page boundaries
//!
//! # Quick Start
//!
//! ```no_run
//! use booking_scraper::{ControlChannel, DirectorySink, DomPage, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() {
//!     // A page accessor over the current document; navigation is
//!     // supplied by a Navigator implementation.
//!     let page = DomPage::fixed("<html>…</html>");
//!
//!     let (orchestrator, commands, events) =
//!         Orchestrator::new(page, DirectorySink::new("exports"));
//!     let channel = ControlChannel::new("ws://127.0.0.1:3000", commands, events);
//!
//!     // The channel reconnects forever; the orchestrator runs until
//!     // its command channel closes.
//!     tokio::spawn(channel.run());
//!     orchestrator.run().await;
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`page`] | Page access, locator synthesis, region selection |
//! | [`scrape`] | Session state and the pagination orchestrator |
//! | [`export`] | CSV/JSON serialization and artifact delivery |
//! | [`protocol`] | Wire message types (commands in, events out) |
//! | [`transport`] | WebSocket control channel with reconnection |
//! | [`storage`] | Record store for the interactive selection path |
//! | [`error`] | Error types and [`Result`] alias |
//!
//! # Remote surface
//!
//! Inbound envelopes: `{"type": "START"|"STOP"|"EXPORT"|"CLEAR"|
//! "STATUS"|"SCRAPE_CURRENT_PAGE"}`. Outbound envelopes:
//! `{"type": "STATUS_UPDATE"|"PROGRESS", "data": {...}}`. An HTTP
//! gateway mapping `POST /api/start` etc. onto these envelopes sits in
//! front of the coordinator socket; it is an external collaborator and
//! responds before the command takes effect — observe events, do not
//! await replies.

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Dataset serialization and artifact delivery.
pub mod export;

/// Page access, locator synthesis, and region selection.
pub mod page;

/// Wire protocol message types.
///
/// Defines inbound command and outbound event envelopes.
pub mod protocol;

/// Session state, extraction rules, and the orchestrator.
pub mod scrape;

/// Record store contract for interactive accumulation.
pub mod storage;

/// WebSocket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Error types
pub use error::{Error, Result};

// Export types
pub use export::{Artifact, ArtifactSink, DirectorySink, ExportFormat};

// Page types
pub use page::{
    DomPage, ElementBox, HighlightChange, Locator, Navigator, NextControl, NoNavigation,
    PageAccessor, Point, Rect, RegionSelection, RegionSelector, css_path, representative_locator,
    resolve_css, xpath,
};

// Protocol types
pub use protocol::{Command, Inbound, OutboundEvent, ProgressData, decode_inbound};

// Scrape types
pub use scrape::{Orchestrator, Record, ScrapeSession, SessionState, StatusSnapshot};

// Storage types
pub use storage::{JsonFileStore, RecordStore};

// Transport types
pub use transport::ControlChannel;
