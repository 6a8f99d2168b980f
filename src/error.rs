//! Error types for the scraping agent.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use booking_scraper::{Result, Error};
//!
//! async fn example(page: &impl PageAccessor) -> Result<()> {
//!     let rows = page.table_rows().await?;
//!     println!("{} rows on screen", rows.len());
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Page access | [`Error::Selector`], [`Error::Page`], [`Error::Navigation`] |
//! | Control channel | [`Error::Connection`], [`Error::ConnectionClosed`] |
//! | Export | [`Error::UnsupportedFormat`], [`Error::EmptyDataset`] |
//! | Storage | [`Error::Storage`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Page Access Errors
    // ========================================================================
    /// Invalid CSS selector.
    ///
    /// Returned when a selector string cannot be parsed.
    #[error("Invalid selector: {selector}")]
    Selector {
        /// The selector that failed to parse.
        selector: String,
    },

    /// Page access failed.
    ///
    /// Returned when the page accessor cannot read the document.
    #[error("Page access error: {message}")]
    Page {
        /// Description of the page access failure.
        message: String,
    },

    /// Page navigation failed.
    ///
    /// Returned when activating the next-page control does not
    /// produce a new document.
    #[error("Navigation failed on page {page}: {message}")]
    Navigation {
        /// Page that was showing when navigation was triggered.
        page: u32,
        /// Description of the navigation failure.
        message: String,
    },

    // ========================================================================
    // Control Channel Errors
    // ========================================================================
    /// Control channel connection failed.
    ///
    /// Returned when the WebSocket connection to the coordinator
    /// cannot be established. Never fatal: the channel reconnects.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Control channel closed.
    ///
    /// Returned when the connection is lost during an operation.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Export Errors
    // ========================================================================
    /// Unsupported export format.
    ///
    /// Returned by the local export path when the requested format
    /// is neither `csv` nor `json`.
    #[error("Unsupported export format: {format}")]
    UnsupportedFormat {
        /// The rejected format string.
        format: String,
    },

    /// Export requested on an empty dataset.
    ///
    /// Returned by the local export path only; the remote `EXPORT`
    /// command degrades to a warning instead.
    #[error("No data to export")]
    EmptyDataset,

    // ========================================================================
    // Storage Errors
    // ========================================================================
    /// Record store operation failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an invalid selector error.
    #[inline]
    pub fn selector(selector: impl Into<String>) -> Self {
        Self::Selector {
            selector: selector.into(),
        }
    }

    /// Creates a page access error.
    #[inline]
    pub fn page(message: impl Into<String>) -> Self {
        Self::Page {
            message: message.into(),
        }
    }

    /// Creates a navigation error.
    #[inline]
    pub fn navigation(page: u32, message: impl Into<String>) -> Self {
        Self::Navigation {
            page,
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates an unsupported export format error.
    #[inline]
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Creates a storage error.
    #[inline]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::ConnectionClosed | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this is a page access error.
    #[inline]
    #[must_use]
    pub fn is_page_error(&self) -> bool {
        matches!(
            self,
            Self::Selector { .. } | Self::Page { .. } | Self::Navigation { .. }
        )
    }

    /// Returns `true` if this error rejects an export request.
    #[inline]
    #[must_use]
    pub fn is_export_rejection(&self) -> bool {
        matches!(self, Self::UnsupportedFormat { .. } | Self::EmptyDataset)
    }
}

// ============================================================================
// Tests
// ============================================================================
