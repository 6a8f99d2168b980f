//! End-to-end state machine scenarios against a scripted page.
//!
//! The fake page accessor replays a fixed sequence of pages, so every
//! lifecycle path (full run, cooperative stop, forced clear, one-shot
//! extraction) is exercised without a document or a socket.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::timeout;

use booking_scraper::{
    Artifact, ArtifactSink, Command, NextControl, Orchestrator, OutboundEvent, PageAccessor,
    Result, StatusSnapshot,
};

// ============================================================================
// Fakes
// ============================================================================

/// Scripted multi-page site. Page N has a live next control whenever a
/// page N+1 exists.
struct FakePage {
    pages: Vec<Vec<Vec<String>>>,
    current: Mutex<usize>,
    clicks: Mutex<u32>,
    read_delay: Duration,
}

impl FakePage {
    fn new(pages: Vec<Vec<Vec<String>>>) -> Arc<Self> {
        Arc::new(Self {
            pages,
            current: Mutex::new(0),
            clicks: Mutex::new(0),
            read_delay: Duration::ZERO,
        })
    }

    fn with_read_delay(pages: Vec<Vec<Vec<String>>>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            pages,
            current: Mutex::new(0),
            clicks: Mutex::new(0),
            read_delay: delay,
        })
    }

    fn clicks(&self) -> u32 {
        *self.clicks.lock()
    }
}

/// Shareable handle over a `FakePage`: the orchestrator takes one clone
/// while the test keeps another to inspect click counts. A local newtype
/// is needed because the orphan rule forbids implementing the foreign
/// `PageAccessor` trait directly for `Arc<FakePage>`.
#[derive(Clone)]
struct SharedPage(Arc<FakePage>);

#[async_trait]
impl PageAccessor for SharedPage {
    async fn table_rows(&self) -> Result<Vec<Vec<String>>> {
        if self.0.read_delay > Duration::ZERO {
            tokio::time::sleep(self.0.read_delay).await;
        }
        let current = *self.0.current.lock();
        Ok(self.0.pages.get(current).cloned().unwrap_or_default())
    }

    async fn next_control(&self, _page: u32) -> Result<Option<NextControl>> {
        let current = *self.0.current.lock();
        Ok((current + 1 < self.0.pages.len()).then(|| NextControl {
            label: "Next".to_string(),
            enabled: true,
        }))
    }

    async fn activate_next(&self, _page: u32) -> Result<()> {
        *self.0.clicks.lock() += 1;
        *self.0.current.lock() += 1;
        Ok(())
    }
}

/// Sink that keeps every delivered artifact in memory.
#[derive(Clone, Default)]
struct CollectingSink {
    artifacts: Arc<Mutex<Vec<Artifact>>>,
}

impl CollectingSink {
    fn artifacts(&self) -> Vec<Artifact> {
        self.artifacts.lock().clone()
    }
}

#[async_trait]
impl ArtifactSink for CollectingSink {
    async fn deliver(&self, artifact: Artifact) -> Result<()> {
        self.artifacts.lock().push(artifact);
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

fn rows(values: &[&[&str]]) -> Vec<Vec<String>> {
    values
        .iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect()
}

fn spawn_agent(
    page: Arc<FakePage>,
    settle: Duration,
) -> (
    CollectingSink,
    mpsc::UnboundedSender<Command>,
    mpsc::UnboundedReceiver<OutboundEvent>,
) {
    let sink = CollectingSink::default();
    let (orchestrator, commands, events) = Orchestrator::new(SharedPage(page), sink.clone());
    tokio::spawn(orchestrator.with_settle_delay(settle).run());
    (sink, commands, events)
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<OutboundEvent>) -> OutboundEvent {
    timeout(Duration::from_secs(3), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Collects events until a PROGRESS message matches `needle`.
async fn events_until_message(
    events: &mut mpsc::UnboundedReceiver<OutboundEvent>,
    needle: &str,
) -> Vec<OutboundEvent> {
    let mut seen = Vec::new();
    loop {
        let event = next_event(events).await;
        let done = matches!(
            &event,
            OutboundEvent::Progress(data) if data.message.contains(needle)
        );
        seen.push(event);
        if done {
            return seen;
        }
    }
}

fn progress_messages(events: &[OutboundEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            OutboundEvent::Progress(data) => Some(data.message.clone()),
            OutboundEvent::StatusUpdate(_) => None,
        })
        .collect()
}

fn json_artifact(sink: &CollectingSink) -> serde_json::Value {
    let artifacts = sink.artifacts();
    let json = artifacts
        .iter()
        .find(|a| a.filename.ends_with(".json"))
        .expect("json artifact");
    serde_json::from_str(&json.body).expect("parse json artifact")
}

fn row_indices(dump: &serde_json::Value) -> Vec<u64> {
    dump.as_array()
        .expect("array dump")
        .iter()
        .map(|record| record["rowIndex"].as_u64().expect("rowIndex"))
        .collect()
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn full_run_over_two_pages() {
    // Page 1: two rows; page 2: one row; no control after page 2.
    let page = FakePage::new(vec![
        rows(&[&["1", "a"], &["2", "b"]]),
        rows(&[&["3", "c"]]),
    ]);
    let (sink, commands, mut events) = spawn_agent(Arc::clone(&page), Duration::from_millis(20));

    commands.send(Command::Start).expect("send");
    let seen = events_until_message(&mut events, "export complete").await;

    // Final snapshot: idle, dataset retained, parked on page 2.
    let final_status = next_event(&mut events).await;
    let OutboundEvent::StatusUpdate(snapshot) = final_status else {
        panic!("expected final STATUS_UPDATE, got {final_status:?}");
    };
    assert!(!snapshot.is_processing);
    assert_eq!(snapshot.current_page, 2);
    assert_eq!(snapshot.total_records, 3);

    let messages = progress_messages(&seen);
    assert!(messages[0].contains("started"));
    assert!(messages.iter().any(|m| m.contains("page 1 extracted")));
    assert!(messages.iter().any(|m| m.contains("page 2 extracted")));
    assert!(messages.iter().any(|m| m.contains("pagination exhausted")));
    assert!(messages.last().expect("messages").contains("export complete (3 records)"));

    // Exactly one navigation, both artifact formats, gapless indices.
    assert_eq!(page.clicks(), 1);
    let artifacts = sink.artifacts();
    assert_eq!(artifacts.len(), 2);
    assert!(artifacts.iter().any(|a| a.filename.ends_with(".csv")));

    let dump = json_artifact(&sink);
    assert_eq!(row_indices(&dump), vec![1, 2, 3]);
    assert_eq!(dump[0]["page"], 1);
    assert_eq!(dump[2]["page"], 2);
    assert_eq!(dump[2]["column_2"], "c");
}

#[tokio::test]
async fn dataset_length_matches_per_page_sum() {
    let page = FakePage::new(vec![
        rows(&[&["a"], &["b"], &["c"]]),
        rows(&[&["d"]]),
        rows(&[&["e"], &["f"]]),
    ]);
    let (sink, commands, mut events) = spawn_agent(Arc::clone(&page), Duration::from_millis(10));

    commands.send(Command::Start).expect("send");
    events_until_message(&mut events, "export complete").await;

    let dump = json_artifact(&sink);
    assert_eq!(row_indices(&dump), vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(page.clicks(), 2);
}

#[tokio::test]
async fn stop_finishes_at_page_boundary() {
    let page = FakePage::new(vec![
        rows(&[&["1"], &["2"]]),
        rows(&[&["3"]]),
        rows(&[&["4"]]),
    ]);
    let (sink, commands, mut events) = spawn_agent(Arc::clone(&page), Duration::from_millis(500));

    commands.send(Command::Start).expect("send");

    // Wait for page 1's snapshot, then stop during the settle delay.
    loop {
        if let OutboundEvent::StatusUpdate(snapshot) = next_event(&mut events).await {
            assert!(snapshot.is_processing);
            assert_eq!(snapshot.total_records, 2);
            break;
        }
    }
    commands.send(Command::Stop).expect("send");

    let seen = events_until_message(&mut events, "export complete").await;

    // Page 2 was still extracted; page 3 never reached.
    let dump = json_artifact(&sink);
    assert_eq!(row_indices(&dump), vec![1, 2, 3]);
    assert_eq!(page.clicks(), 1);

    let messages = progress_messages(&seen);
    assert!(messages.iter().any(|m| m.contains("page 2 extracted")));
    assert!(!messages.iter().any(|m| m.contains("page 3")));
    assert!(messages.last().expect("messages").contains("export complete (3 records)"));
}

#[tokio::test]
async fn stop_and_status_queued_behind_inflight_step() {
    // Extraction takes 150ms, so commands sent at +50ms land mid-step.
    let page = FakePage::with_read_delay(
        vec![rows(&[&["1"], &["2"]]), rows(&[&["3"]]), rows(&[&["4"]])],
        Duration::from_millis(150),
    );
    let (_sink, commands, mut events) = spawn_agent(Arc::clone(&page), Duration::from_millis(300));

    commands.send(Command::Start).expect("send");
    tokio::time::sleep(Duration::from_millis(50)).await;
    commands.send(Command::Stop).expect("send");
    commands.send(Command::Status).expect("send");

    // The in-flight step's own snapshot still reports processing: the
    // queued STOP cannot take effect until the boundary.
    let mut snapshots: Vec<StatusSnapshot> = Vec::new();
    let seen = events_until_message(&mut events, "export complete").await;
    for event in &seen {
        if let OutboundEvent::StatusUpdate(snapshot) = event {
            snapshots.push(snapshot.clone());
        }
    }

    assert!(snapshots[0].is_processing);
    assert!(!snapshots[0].stop_requested);
    assert_eq!(snapshots[0].total_records, 2);

    // The queued STATUS reply reflects the processed STOP.
    assert!(!snapshots[1].is_processing);
    assert!(snapshots[1].stop_requested);

    // Navigation to page 2 had already happened; page 3 never did.
    assert_eq!(page.clicks(), 1);
    let last = snapshots.last().expect("snapshots");
    assert_eq!(last.total_records, 3);
}

#[tokio::test]
async fn clear_mid_run_forces_reset() {
    let page = FakePage::new(vec![
        rows(&[&["1"]]),
        rows(&[&["2"]]),
        rows(&[&["3"]]),
    ]);
    let (sink, commands, mut events) = spawn_agent(Arc::clone(&page), Duration::from_millis(500));

    commands.send(Command::Start).expect("send");

    // Confirm the run is live (page 1 snapshot shows processing).
    loop {
        if let OutboundEvent::StatusUpdate(snapshot) = next_event(&mut events).await {
            assert!(snapshot.is_processing);
            break;
        }
    }

    commands.send(Command::Clear).expect("send");

    // CLEAR replies with a zeroed snapshot even though a run was live.
    loop {
        if let OutboundEvent::StatusUpdate(snapshot) = next_event(&mut events).await {
            assert!(!snapshot.is_processing);
            assert_eq!(snapshot.current_page, 1);
            assert_eq!(snapshot.total_records, 0);
            assert!(!snapshot.stop_requested);
            break;
        }
    }

    // The killed run never finished: no export happened, and a STATUS
    // round-trip shows the session still idle and empty.
    commands.send(Command::Status).expect("send");
    let event = next_event(&mut events).await;
    let OutboundEvent::StatusUpdate(snapshot) = event else {
        panic!("expected STATUS_UPDATE, got {event:?}");
    };
    assert!(!snapshot.is_processing);
    assert_eq!(snapshot.total_records, 0);
    assert!(sink.artifacts().is_empty());
}

#[tokio::test]
async fn start_while_running_is_dropped() {
    let page = FakePage::new(vec![
        rows(&[&["1"]]),
        rows(&[&["2"]]),
        rows(&[&["3"]]),
    ]);
    let (sink, commands, mut events) = spawn_agent(Arc::clone(&page), Duration::from_millis(60));

    commands.send(Command::Start).expect("send");
    // Fired straight into the running session: must not reset anything.
    commands.send(Command::Start).expect("send");

    let seen = events_until_message(&mut events, "export complete").await;
    let messages = progress_messages(&seen);

    let starts = messages.iter().filter(|m| m.contains("started")).count();
    assert_eq!(starts, 1);

    // All three pages arrived with continuous indices: the second START
    // neither restarted pagination nor cleared rows.
    let dump = json_artifact(&sink);
    assert_eq!(row_indices(&dump), vec![1, 2, 3]);
    assert_eq!(page.clicks(), 2);
}

#[tokio::test]
async fn scrape_current_page_is_lifecycle_free() {
    let page = FakePage::new(vec![rows(&[&["1", "a"], &["2", "b"]])]);
    let (sink, commands, mut events) = spawn_agent(Arc::clone(&page), Duration::from_millis(10));

    commands.send(Command::ScrapeCurrentPage).expect("send");

    let seen = events_until_message(&mut events, "current page scraped").await;
    assert!(progress_messages(&seen)[0].contains("(2 rows)"));

    let event = next_event(&mut events).await;
    let OutboundEvent::StatusUpdate(snapshot) = event else {
        panic!("expected STATUS_UPDATE, got {event:?}");
    };
    assert!(!snapshot.is_processing);
    assert_eq!(snapshot.current_page, 1);
    assert_eq!(snapshot.total_records, 2);

    // No run lifecycle: nothing navigated, nothing exported.
    assert_eq!(page.clicks(), 0);
    assert!(sink.artifacts().is_empty());

    // A second one-shot keeps appending with continuing indices.
    commands.send(Command::ScrapeCurrentPage).expect("send");
    events_until_message(&mut events, "current page scraped").await;

    commands.send(Command::Export).expect("send");
    events_until_message(&mut events, "export complete").await;

    let dump = json_artifact(&sink);
    assert_eq!(row_indices(&dump), vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn export_on_empty_dataset_warns() {
    let page = FakePage::new(vec![]);
    let (sink, commands, mut events) = spawn_agent(page, Duration::from_millis(10));

    commands.send(Command::Export).expect("send");

    let event = next_event(&mut events).await;
    let OutboundEvent::Progress(data) = event else {
        panic!("expected PROGRESS, got {event:?}");
    };
    assert_eq!(data.message, "no data to export");
    assert!(sink.artifacts().is_empty());
}

#[tokio::test]
async fn missing_table_ends_run_immediately() {
    // Zero pages: the very first extraction sees no rows.
    let page = FakePage::new(vec![]);
    let (sink, commands, mut events) = spawn_agent(Arc::clone(&page), Duration::from_millis(10));

    commands.send(Command::Start).expect("send");
    let seen = events_until_message(&mut events, "no data to export").await;

    let messages = progress_messages(&seen);
    assert!(messages.iter().any(|m| m.contains("pagination exhausted at page 1")));

    let event = next_event(&mut events).await;
    let OutboundEvent::StatusUpdate(snapshot) = event else {
        panic!("expected STATUS_UPDATE, got {event:?}");
    };
    assert!(!snapshot.is_processing);
    assert_eq!(snapshot.total_records, 0);
    assert_eq!(page.clicks(), 0);
    assert!(sink.artifacts().is_empty());
}

#[tokio::test]
async fn column_split_flows_through_to_artifacts() {
    // Columns 3 and 4 split into four line parts each.
    let page = FakePage::new(vec![rows(&[&[
        "1",
        "EGLV123",
        "TPE\nKEL",
        "2024-03-01\n2024-03-05",
        "40ft",
    ]])]);
    let (sink, commands, mut events) = spawn_agent(page, Duration::from_millis(10));

    commands.send(Command::Start).expect("send");
    events_until_message(&mut events, "export complete").await;

    let dump = json_artifact(&sink);
    let record = &dump[0];
    assert_eq!(record["column_3"], "TPE\nKEL");
    assert_eq!(record["column_3_part_1"], "TPE");
    assert_eq!(record["column_3_part_2"], "KEL");
    assert_eq!(record["column_3_part_3"], "");
    assert_eq!(record["column_4_part_2"], "2024-03-05");
    assert!(record.get("column_5_part_1").is_none());

    // CSV header mirrors the first record's key order.
    let artifacts = sink.artifacts();
    let csv = artifacts
        .iter()
        .find(|a| a.filename.ends_with(".csv"))
        .expect("csv artifact");
    let header = csv.body.lines().next().expect("header");
    assert_eq!(
        header,
        "rowIndex,page,column_1,column_2,column_3,column_3_part_1,column_3_part_2,\
         column_3_part_3,column_3_part_4,column_4,column_4_part_1,column_4_part_2,\
         column_4_part_3,column_4_part_4,column_5"
    );
}
