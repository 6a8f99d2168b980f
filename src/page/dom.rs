//! HTML-snapshot page accessor.
//!
//! [`DomPage`] holds the current document text and parses it with
//! `scraper` on every access. Navigation is delegated to a
//! [`Navigator`] capability that produces the post-activation document;
//! in production that seam fronts a live browser, in tests it replays
//! scripted snapshots.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use ego_tree::NodeRef;
use parking_lot::Mutex;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, trace};

use crate::error::{Error, Result};

use super::{NextControl, PageAccessor};

// ============================================================================
// Constants
// ============================================================================

/// Fixed selector for the booking table on the target page.
pub const TABLE_SELECTOR: &str = "#eeb1_bookingList > table.Design1";

/// Next-page control on page 1 (the only pagination link present).
pub const NEXT_CONTROL_FIRST_PAGE: &str = "#eeb1_bookingList td.Page a:nth-of-type(1)";

/// Next-page control on later pages (a Prev link occupies slot 1).
pub const NEXT_CONTROL_LATER_PAGES: &str = "#eeb1_bookingList td.Page a:nth-of-type(2)";

/// Data rows inside the booking table.
const ROW_SELECTOR: &str = "tbody > tr";

/// Cells inside a data row.
const CELL_SELECTOR: &str = "td";

// ============================================================================
// Navigator
// ============================================================================

/// Produces the document that follows a next-page activation.
///
/// This is the crate's seam to whatever actually clicks: a live
/// browser, an HTTP round-trip, or a scripted snapshot sequence.
#[async_trait]
pub trait Navigator: Send + Sync {
    /// Returns the document text showing after leaving `page`.
    async fn advance(&self, page: u32) -> Result<String>;
}

/// Navigator for read-only snapshots; any advance fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNavigation;

#[async_trait]
impl Navigator for NoNavigation {
    async fn advance(&self, page: u32) -> Result<String> {
        Err(Error::navigation(page, "no navigator attached"))
    }
}

// ============================================================================
// DomPage
// ============================================================================

/// Page accessor over an HTML snapshot.
pub struct DomPage<N> {
    html: Mutex<String>,
    navigator: N,
}

impl DomPage<NoNavigation> {
    /// Creates a read-only page from a single snapshot.
    #[must_use]
    pub fn fixed(html: impl Into<String>) -> Self {
        Self::new(html, NoNavigation)
    }
}

impl<N> DomPage<N> {
    /// Creates a page from an initial snapshot and a navigator.
    #[must_use]
    pub fn new(html: impl Into<String>, navigator: N) -> Self {
        Self {
            html: Mutex::new(html.into()),
            navigator,
        }
    }

    /// Replaces the current document (external refresh).
    pub fn set_document(&self, html: impl Into<String>) {
        *self.html.lock() = html.into();
    }

    /// Parses the current document.
    ///
    /// Used by the interactive selection paths, which synthesize
    /// locators against whatever the page shows right now.
    #[must_use]
    pub fn document(&self) -> Html {
        Html::parse_document(&self.html.lock())
    }
}

#[async_trait]
impl<N: Navigator> PageAccessor for DomPage<N> {
    async fn table_rows(&self) -> Result<Vec<Vec<String>>> {
        let document = self.document();

        let table_sel = parse_selector(TABLE_SELECTOR)?;
        let row_sel = parse_selector(ROW_SELECTOR)?;
        let cell_sel = parse_selector(CELL_SELECTOR)?;

        let Some(table) = document.select(&table_sel).next() else {
            trace!(selector = TABLE_SELECTOR, "booking table not found");
            return Ok(Vec::new());
        };

        let mut rows = Vec::new();
        for row in table.select(&row_sel) {
            let cells: Vec<String> = row.select(&cell_sel).map(cell_text).collect();
            // Header rows carry <th> only and produce no cells.
            if !cells.is_empty() {
                rows.push(cells);
            }
        }

        debug!(rows = rows.len(), "table rows extracted");
        Ok(rows)
    }

    async fn next_control(&self, page: u32) -> Result<Option<NextControl>> {
        let selector = if page <= 1 {
            NEXT_CONTROL_FIRST_PAGE
        } else {
            NEXT_CONTROL_LATER_PAGES
        };
        let sel = parse_selector(selector)?;

        let document = self.document();
        let control = document.select(&sel).next().map(|el| NextControl {
            label: el.text().collect::<String>().trim().to_string(),
            enabled: !is_disabled(el),
        });

        trace!(page, selector, found = control.is_some(), "next control resolved");
        Ok(control)
    }

    async fn activate_next(&self, page: u32) -> Result<()> {
        let next = self.navigator.advance(page).await?;
        self.set_document(next);
        debug!(page, "navigation activated");
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|_| Error::selector(selector))
}

/// Cell text with `<br>` rendered as a line break, lines trimmed and
/// blank lines dropped — the structure the column splitter divides on.
fn cell_text(cell: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(*cell, &mut raw);

    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&text.text),
            Node::Element(el) if el.name() == "br" => out.push('\n'),
            Node::Element(_) => collect_text(child, out),
            _ => {}
        }
    }
}

fn is_disabled(el: ElementRef<'_>) -> bool {
    el.value().attr("disabled").is_some()
        || el.value().classes().any(|class| class.eq_ignore_ascii_case("disabled"))
}

// ============================================================================
// Tests
// ============================================================================
