//! Locator synthesis for DOM nodes.
//!
//! Builds a CSS path or an XPath that uniquely addresses a node in a
//! parsed document. Both builders are pure: same document, same node,
//! same string.
//!
//! # Example
//!
//! ```ignore
//! use booking_scraper::page::{css_path, xpath};
//! use scraper::{Html, Selector};
//!
//! let doc = Html::parse_document("<div id=\"list\"><span class=\"tag\">x</span></div>");
//! let sel = Selector::parse("span").unwrap();
//! let node = doc.select(&sel).next().unwrap();
//!
//! assert_eq!(css_path(node), "#list > span.tag");
//! assert_eq!(xpath(node), "/html/body/div/span");
//! ```
//!
//! The two builders treat ids differently on purpose: `css_path` stops
//! climbing at the first ancestor carrying an id, while `xpath` only
//! short-circuits when the target node itself has one.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Locator
// ============================================================================

/// A string address for a specific DOM node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path")]
pub enum Locator {
    /// CSS selector path.
    #[serde(rename = "css")]
    Css(String),

    /// XPath expression.
    #[serde(rename = "xpath")]
    XPath(String),
}

impl Locator {
    /// Creates a CSS locator.
    #[inline]
    pub fn css(path: impl Into<String>) -> Self {
        Self::Css(path.into())
    }

    /// Creates an XPath locator.
    #[inline]
    pub fn xpath(path: impl Into<String>) -> Self {
        Self::XPath(path.into())
    }

    /// Returns the locator kind for the protocol.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Css(_) => "css",
            Self::XPath(_) => "xpath",
        }
    }

    /// Returns the path string.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Css(p) | Self::XPath(p) => p,
        }
    }

    /// Derives the representative CSS locator for an element summary.
    ///
    /// Preference order: `#id`, then the full class list, then the bare
    /// tag name. This is the single-element simplification used after a
    /// region selection.
    #[must_use]
    pub fn representative(tag: &str, id: Option<&str>, classes: &[String]) -> Self {
        if let Some(id) = id
            && !id.is_empty()
        {
            return Self::Css(format!("#{id}"));
        }
        if !classes.is_empty() {
            return Self::Css(format!(".{}", classes.join(".")));
        }
        Self::Css(tag.to_string())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.path())
    }
}

// ============================================================================
// CSS Path
// ============================================================================

/// Builds a CSS path addressing `node`, joined root→node with `" > "`.
///
/// Climbs ancestors toward the document root. A level carrying an id is
/// emitted as `#id` and ends the climb; every other level is emitted as
/// `tag.class1.class2…`, with `:nth-of-type(k)` appended when the parent
/// holds more than one child of the same tag.
#[must_use]
pub fn css_path(node: ElementRef<'_>) -> String {
    let mut segments: Vec<String> = Vec::new();
    let mut current = Some(node);

    while let Some(el) = current {
        let element = el.value();

        // An id pins the whole remaining ancestry.
        if let Some(id) = element.id()
            && !id.is_empty()
        {
            segments.push(format!("#{id}"));
            break;
        }

        let mut segment = element.name().to_string();
        for class in element.classes() {
            segment.push('.');
            segment.push_str(class);
        }

        let parent = el.parent().and_then(ElementRef::wrap);
        if let Some(parent) = parent {
            if let Some(position) = nth_of_type(parent, el) {
                segment.push_str(&format!(":nth-of-type({position})"));
            }
        }

        segments.push(segment);
        current = parent;
    }

    segments.reverse();
    segments.join(" > ")
}

/// Returns the 1-based position of `el` among same-tag children of
/// `parent`, or `None` when it has no same-tag siblings.
fn nth_of_type(parent: ElementRef<'_>, el: ElementRef<'_>) -> Option<usize> {
    let tag = el.value().name();
    let mut position = 0;
    let mut count = 0;

    for sibling in parent.children().filter_map(ElementRef::wrap) {
        if sibling.value().name() == tag {
            count += 1;
            if sibling.id() == el.id() {
                position = count;
            }
        }
    }

    (count > 1).then_some(position)
}

// ============================================================================
// XPath
// ============================================================================

/// Builds an XPath addressing `node`, joined with `/` and a leading `/`.
///
/// When the node itself carries an id the result is `//*[@id="..."]`.
/// Ancestors never short-circuit on ids; each level is emitted as
/// `tag[index]` with index = preceding same-tag siblings + 1, and the
/// `[index]` part omitted when no same-tag sibling precedes.
#[must_use]
pub fn xpath(node: ElementRef<'_>) -> String {
    if let Some(id) = node.value().id()
        && !id.is_empty()
    {
        return format!("//*[@id=\"{id}\"]");
    }

    let mut segments: Vec<String> = Vec::new();
    let mut current = Some(node);

    while let Some(el) = current {
        let tag = el.value().name();
        let preceding = el
            .prev_siblings()
            .filter_map(ElementRef::wrap)
            .filter(|sibling| sibling.value().name() == tag)
            .count();

        if preceding > 0 {
            segments.push(format!("{tag}[{}]", preceding + 1));
        } else {
            segments.push(tag.to_string());
        }

        current = el.parent().and_then(ElementRef::wrap);
    }

    segments.reverse();
    format!("/{}", segments.join("/"))
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolves a CSS path back to a node in `document`.
///
/// Returns the first match, which for a freshly synthesized path on an
/// unchanged document is the original node.
///
/// # Errors
///
/// Returns [`Error::Selector`] if the path does not parse.
pub fn resolve_css<'a>(document: &'a Html, path: &str) -> Result<Option<ElementRef<'a>>> {
    let selector = Selector::parse(path).map_err(|_| Error::selector(path))?;
    Ok(document.select(&selector).next())
}

/// Derives the representative locator for a live node.
///
/// See [`Locator::representative`] for the preference order.
#[must_use]
pub fn representative_locator(node: ElementRef<'_>) -> Locator {
    let element = node.value();
    let classes: Vec<String> = element.classes().map(str::to_string).collect();
    Locator::representative(element.name(), element.id(), &classes)
}

// ============================================================================
// Tests
// ============================================================================
