//! The pagination state machine.
//!
//! One dispatch loop owns the [`ScrapeSession`] and consumes a single
//! inbound command channel; outbound events leave through a single
//! event channel. There is no other mutable state and no lock: mutual
//! exclusion is the loop itself.
//!
//! # Sequencing
//!
//! A page step (extract → append → emit → resolve control → maybe
//! navigate) runs to completion before any queued command is served;
//! commands arriving during the settle delay are served before the next
//! step. `STOP` therefore takes effect only at a page boundary, and a
//! `START` during a run is observed — and dropped — between steps.
//!
//! # Example
//!
//! ```ignore
//! use booking_scraper::{DirectorySink, DomPage, Orchestrator};
//!
//! let page = DomPage::new(initial_html, navigator);
//! let (orchestrator, commands, events) = Orchestrator::new(page, DirectorySink::new("out"));
//! tokio::spawn(orchestrator.run());
//! // feed `commands`, consume `events`
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tracing::{debug, error, info, trace, warn};

use crate::error::Error;
use crate::export::{self, ArtifactSink, ExportFormat};
use crate::page::{NextControl, PageAccessor};
use crate::protocol::{Command, OutboundEvent};

use super::extract::records_from_rows;
use super::session::{ScrapeSession, SessionState};

// ============================================================================
// Constants
// ============================================================================

/// Blind wait between triggering navigation and extracting the next
/// page. Time-based, not load-signaled: a slow network can race this.
pub const SETTLE_DELAY: Duration = Duration::from_millis(2000);

// ============================================================================
// Orchestrator
// ============================================================================

/// Remote-drivable scrape orchestrator.
///
/// Owns the session for its whole lifetime; created together with its
/// command sender and event receiver.
pub struct Orchestrator<P, S> {
    page: P,
    sink: S,
    session: ScrapeSession,
    commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<OutboundEvent>,
    settle: Duration,
    step_due: Option<Instant>,
}

impl<P: PageAccessor, S: ArtifactSink> Orchestrator<P, S> {
    /// Creates an orchestrator plus its command and event endpoints.
    #[must_use]
    pub fn new(
        page: P,
        sink: S,
    ) -> (
        Self,
        mpsc::UnboundedSender<Command>,
        mpsc::UnboundedReceiver<OutboundEvent>,
    ) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let orchestrator = Self {
            page,
            sink,
            session: ScrapeSession::new(),
            commands: command_rx,
            events: event_tx,
            settle: SETTLE_DELAY,
            step_due: None,
        };

        (orchestrator, command_tx, event_rx)
    }

    /// Overrides the settle delay (tests use milliseconds).
    #[must_use]
    pub fn with_settle_delay(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Read access to the owned session.
    #[inline]
    #[must_use]
    pub fn session(&self) -> &ScrapeSession {
        &self.session
    }

    /// Runs the dispatch loop until the command channel closes.
    pub async fn run(mut self) {
        debug!("orchestrator started");

        loop {
            if self.session.state == SessionState::Running {
                let due = self.step_due.unwrap_or_else(Instant::now);

                tokio::select! {
                    biased;

                    command = self.commands.recv() => match command {
                        Some(command) => self.dispatch(command).await,
                        None => break,
                    },

                    () = time::sleep_until(due) => {
                        self.step_due = None;
                        self.step_page().await;
                    }
                }
            } else {
                match self.commands.recv().await {
                    Some(command) => self.dispatch(command).await,
                    None => break,
                }
            }
        }

        debug!("orchestrator terminated");
    }

    // ========================================================================
    // Command Dispatch
    // ========================================================================

    async fn dispatch(&mut self, command: Command) {
        debug!(command = command.name(), "command received");

        match command {
            Command::Start => self.handle_start(),
            Command::Stop => self.handle_stop(),
            Command::Status => self.emit_status(),
            Command::Clear => self.handle_clear(),
            Command::Export => self.export_dataset().await,
            Command::ScrapeCurrentPage => self.scrape_current_page().await,
        }
    }

    fn handle_start(&mut self) {
        if self.session.state == SessionState::Running {
            // Not queued, not an error: the running run wins.
            debug!("START ignored: run already in progress");
            return;
        }

        self.session.begin_run();
        self.step_due = Some(Instant::now());
        info!("scrape run started");
        self.emit_progress("scrape run started");
    }

    fn handle_stop(&mut self) {
        self.session.stop_requested = true;
        self.session.is_processing = false;
        info!("stop requested; run will finish at the next page boundary");
    }

    fn handle_clear(&mut self) {
        let was_processing = self.session.is_processing;
        self.session.clear();
        self.step_due = None;
        info!(was_processing, "session cleared");
        self.emit_status();
    }

    // ========================================================================
    // Page Stepping
    // ========================================================================

    /// Extracts the current page and decides what happens next.
    async fn step_page(&mut self) {
        let page = self.session.current_page;

        let rows = match self.page.table_rows().await {
            Ok(rows) => rows,
            Err(err) => {
                warn!(page, error = %err, "table read failed; treating as end of pagination");
                Vec::new()
            }
        };

        // Missing table, missing body, or zero rows all look the same
        // here; "not yet rendered" is indistinguishable from "done".
        if rows.is_empty() {
            debug!(page, "no table rows");
            self.emit_progress(format!("pagination exhausted at page {page}"));
            self.finish_run().await;
            return;
        }

        let start = self.session.next_row_index();
        let records = records_from_rows(start, page, &rows);
        let count = records.len();
        self.session.dataset.extend(records);

        info!(page, rows = count, total = self.session.dataset.len(), "page extracted");
        self.emit_progress(format!(
            "page {page} extracted ({count} rows, {} total)",
            self.session.dataset.len()
        ));
        self.emit_status();

        let control = match self.page.next_control(page).await {
            Ok(control) => control,
            Err(err) => {
                warn!(page, error = %err, "next control lookup failed");
                None
            }
        };

        if !control.as_ref().is_some_and(NextControl::advances) {
            self.emit_progress(format!("pagination exhausted at page {page}"));
            self.finish_run().await;
            return;
        }

        // Stop takes effect here, at the page boundary: page extracted,
        // control never activated.
        if self.session.stop_requested {
            info!(page, "stop requested; finishing without navigation");
            self.finish_run().await;
            return;
        }

        if let Err(err) = self.page.activate_next(page).await {
            warn!(page, error = %err, "navigation failed; finishing");
            self.finish_run().await;
            return;
        }

        self.session.current_page += 1;
        self.step_due = Some(Instant::now() + self.settle);
        trace!(
            page = self.session.current_page,
            settle_ms = self.settle.as_millis() as u64,
            "navigated; settling before extraction"
        );
    }

    /// One-shot extraction outside the run lifecycle.
    ///
    /// Appends to the dataset with continuing row indices but leaves
    /// `is_processing`, `current_page`, and the state untouched, and
    /// triggers no export.
    async fn scrape_current_page(&mut self) {
        let page = self.session.current_page;

        let rows = match self.page.table_rows().await {
            Ok(rows) => rows,
            Err(err) => {
                warn!(page, error = %err, "current page extraction failed");
                return;
            }
        };

        if rows.is_empty() {
            warn!(page, "current page has no table rows");
            self.emit_progress("current page has no rows");
            return;
        }

        let start = self.session.next_row_index();
        let records = records_from_rows(start, page, &rows);
        let count = records.len();
        self.session.dataset.extend(records);

        info!(page, rows = count, "current page scraped");
        self.emit_progress(format!("current page scraped ({count} rows)"));
        self.emit_status();
    }

    // ========================================================================
    // Finishing & Export
    // ========================================================================

    /// Terminal phase of a run: export, final snapshot, back to idle.
    ///
    /// The dataset survives; only `CLEAR` empties it.
    async fn finish_run(&mut self) {
        self.session.state = SessionState::Finishing;
        self.step_due = None;

        self.export_dataset().await;

        self.session.is_processing = false;
        self.session.state = SessionState::Idle;
        self.emit_status();
        info!(
            total = self.session.dataset.len(),
            "run finished; dataset retained until CLEAR"
        );
    }

    /// Exports the current dataset as CSV and JSON artifacts.
    ///
    /// An empty dataset degrades to a warning-level progress event.
    async fn export_dataset(&mut self) {
        if self.session.dataset.is_empty() {
            warn!("nothing to export");
            self.emit_progress("no data to export");
            return;
        }

        let stamp = Utc::now();
        for format in [ExportFormat::Csv, ExportFormat::Json] {
            match export::artifact(&self.session.dataset, format, stamp) {
                Ok(artifact) => {
                    let filename = artifact.filename.clone();
                    match self.sink.deliver(artifact).await {
                        Ok(()) => info!(filename = %filename, "artifact delivered"),
                        Err(err) => {
                            error!(filename = %filename, error = %err, "artifact delivery failed");
                        }
                    }
                }
                Err(err @ Error::EmptyDataset) => {
                    // Unreachable behind the guard above; keep the arm
                    // so a future caller cannot silently drop it.
                    warn!(error = %err, "export skipped");
                }
                Err(err) => error!(format = format.as_str(), error = %err, "export failed"),
            }
        }

        self.emit_progress(format!(
            "export complete ({} records)",
            self.session.dataset.len()
        ));
    }

    // ========================================================================
    // Event Emission
    // ========================================================================

    fn emit(&self, event: OutboundEvent) {
        if self.events.send(event).is_err() {
            trace!("event receiver dropped");
        }
    }

    fn emit_status(&self) {
        self.emit(OutboundEvent::status(self.session.snapshot()));
    }

    fn emit_progress(&self, message: impl Into<String>) {
        self.emit(OutboundEvent::progress(self.session.snapshot(), message));
    }
}

// ============================================================================
// Tests
// ============================================================================
