//! Scrape session, extraction rules, and the pagination orchestrator.
//!
//! | Piece | Responsibility |
//! |-------|----------------|
//! | [`ScrapeSession`] | all mutable run state, owned in one place |
//! | [`record_from_cells`] | cell texts → [`Record`] with sub-field split |
//! | [`Orchestrator`] | the `Idle → Running → Finishing` state machine |

mod extract;
mod orchestrator;
mod session;

pub use extract::{SPLIT_COLUMNS, SPLIT_PART_COUNT, record_from_cells, records_from_rows};
pub use orchestrator::{Orchestrator, SETTLE_DELAY};
pub use session::{Record, ScrapeSession, SessionState, StatusSnapshot};
