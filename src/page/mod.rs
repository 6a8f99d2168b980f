//! Page access, locator synthesis, and region selection.
//!
//! This module contains everything that touches the document:
//!
//! - [`PageAccessor`] - capability trait the orchestrator scrapes through
//! - [`DomPage`] - HTML-snapshot implementation backed by `scraper`
//! - [`css_path`]/[`xpath`] - locator synthesis for interactive selection
//! - [`RegionSelector`] - rectangle-based multi-element picker
//!
//! The orchestrator never sees a document: it only calls the trait, so
//! the pagination state machine is testable against a scripted fake.

// ============================================================================
// Modules
// ============================================================================

mod dom;
mod locator;
mod region;

pub use dom::{
    DomPage, NEXT_CONTROL_FIRST_PAGE, NEXT_CONTROL_LATER_PAGES, Navigator, NoNavigation,
    TABLE_SELECTOR,
};
pub use locator::{Locator, css_path, representative_locator, resolve_css, xpath};
pub use region::{ElementBox, HighlightChange, Point, Rect, RegionSelection, RegionSelector};

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;

// ============================================================================
// NextControl
// ============================================================================

/// Resolved state of the next-page control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextControl {
    /// Visible text of the control.
    pub label: String,
    /// Whether the control can be activated.
    pub enabled: bool,
}

impl NextControl {
    /// Returns `true` when activating the control would advance the
    /// pagination: present, non-empty label, not disabled.
    #[must_use]
    pub fn advances(&self) -> bool {
        self.enabled && !self.label.trim().is_empty()
    }
}

// ============================================================================
// PageAccessor
// ============================================================================

/// Capability interface over the target page.
///
/// The fixed selector chain (table → `tbody` → `tr` → `td`) and the
/// page-dependent next-control lookup live behind this trait so the
/// orchestrator's state machine never touches a real document.
#[async_trait]
pub trait PageAccessor: Send + Sync {
    /// Cell texts of every data row of the booking table, in DOM order.
    ///
    /// An empty result means the table, its body, or its rows are
    /// absent — indistinguishable from a page that has not rendered
    /// yet, and treated by the orchestrator as end of pagination.
    async fn table_rows(&self) -> Result<Vec<Vec<String>>>;

    /// Resolves the next-page control for the given 1-based page.
    ///
    /// The control sits in a different DOM position on page 1 than on
    /// later pages; implementations must support both forms. `None`
    /// means no control was found.
    async fn next_control(&self, page: u32) -> Result<Option<NextControl>>;

    /// Activates the next-page control.
    ///
    /// Completion only means the activation was issued; the new
    /// document is awaited by the caller's settle delay, not signaled.
    async fn activate_next(&self, page: u32) -> Result<()>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_control_advances() {
        let control = NextControl {
            label: "Next".to_string(),
            enabled: true,
        };
        assert!(control.advances());
    }

    #[test]
    fn test_next_control_blank_label_does_not_advance() {
        let control = NextControl {
            label: "   ".to_string(),
            enabled: true,
        };
        assert!(!control.advances());
    }

    #[test]
    fn test_next_control_disabled_does_not_advance() {
        let control = NextControl {
            label: "Next".to_string(),
            enabled: false,
        };
        assert!(!control.advances());
    }
}
