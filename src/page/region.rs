//! Rectangle-based multi-element selection.
//!
//! A drag gesture sweeps out a viewport rectangle; every element whose
//! bounding box sits fully inside the rectangle is part of the selection.
//! The contained set is recomputed from scratch on every pointer move so
//! highlighting tracks the live rectangle, and the finished selection is
//! summarized by count plus one representative locator taken from the
//! first contained element in DOM order.
//!
//! # Example
//!
//! ```ignore
//! use booking_scraper::page::{Point, RegionSelector};
//!
//! let mut drag = RegionSelector::begin(Point::new(10.0, 10.0));
//! let change = drag.update(Point::new(300.0, 200.0), &elements);
//! // restyle change.added / change.removed ...
//! let selection = drag.finish(Point::new(300.0, 200.0), &elements);
//! println!("{} elements boxed", selection.count());
//! ```

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::locator::Locator;

// ============================================================================
// Geometry
// ============================================================================

/// A point in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal offset from the viewport origin.
    pub x: f64,
    /// Vertical offset from the viewport origin.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned viewport rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Width (non-negative).
    pub width: f64,
    /// Height (non-negative).
    pub height: f64,
}

impl Rect {
    /// Creates a rectangle from origin and size.
    #[inline]
    #[must_use]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Creates the rectangle spanned by two opposite corners.
    ///
    /// The corners may be given in any order; the result is normalized
    /// to non-negative width and height.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        let left = a.x.min(b.x);
        let top = a.y.min(b.y);
        Self {
            left,
            top,
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    /// Right edge.
    #[inline]
    #[must_use]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Bottom edge.
    #[inline]
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Returns `true` when `other` lies fully inside `self`.
    ///
    /// Containment is checked on all four edges; touching an edge still
    /// counts as inside. Partial overlap never qualifies.
    #[must_use]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

// ============================================================================
// ElementBox
// ============================================================================

/// Geometry and identity snapshot of one page element.
///
/// The slice handed to the selector must be in DOM order; the index of a
/// box doubles as its DOM position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementBox {
    /// Lower-cased tag name.
    pub tag: String,
    /// Element id, when present.
    pub id: Option<String>,
    /// Class tokens in attribute order.
    pub classes: Vec<String>,
    /// Bounding box in viewport coordinates.
    pub rect: Rect,
}

impl ElementBox {
    /// One-line summary used when reporting a finished selection.
    ///
    /// Format: `tag#id.class1.class2`.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = self.tag.clone();
        if let Some(id) = &self.id {
            out.push('#');
            out.push_str(id);
        }
        for class in &self.classes {
            out.push('.');
            out.push_str(class);
        }
        out
    }
}

// ============================================================================
// HighlightChange
// ============================================================================

/// Delta between two consecutive highlight sets.
///
/// Indices refer to the element slice passed to
/// [`RegionSelector::update`]. `removed` entries must have their
/// styling cleared; the previous set is replaced, not extended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightChange {
    /// Newly contained elements.
    pub added: Vec<usize>,
    /// Elements that dropped out of the rectangle.
    pub removed: Vec<usize>,
}

// ============================================================================
// RegionSelection
// ============================================================================

/// A finalized region selection.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSelection {
    /// The final rectangle.
    pub region: Rect,
    /// Indices of contained elements, in DOM order.
    pub contained: Vec<usize>,
    /// Per-element summaries, in DOM order.
    pub summaries: Vec<String>,
    /// Representative locator of the FIRST contained element only.
    ///
    /// `None` when the rectangle contained nothing.
    pub locator: Option<Locator>,
}

impl RegionSelection {
    /// Number of contained elements.
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.contained.len()
    }
}

// ============================================================================
// RegionSelector
// ============================================================================

/// Drag-in-progress state for a region selection.
///
/// Created on pointer-down, fed every pointer-move, consumed on
/// pointer-up.
#[derive(Debug)]
pub struct RegionSelector {
    origin: Point,
    highlighted: FxHashSet<usize>,
}

impl RegionSelector {
    /// Starts a drag at `origin`.
    #[must_use]
    pub fn begin(origin: Point) -> Self {
        Self {
            origin,
            highlighted: FxHashSet::default(),
        }
    }

    /// Rectangle between the drag origin and `current`.
    #[inline]
    #[must_use]
    pub fn region(&self, current: Point) -> Rect {
        Rect::from_corners(self.origin, current)
    }

    /// Recomputes the contained set for the rectangle up to `current`.
    ///
    /// Runs on every move event. The previous highlight set is replaced
    /// wholesale; the returned delta tells the caller which elements to
    /// style and which to clear.
    pub fn update(&mut self, current: Point, elements: &[ElementBox]) -> HighlightChange {
        let region = self.region(current);
        let next: FxHashSet<usize> = contained_indices(&region, elements).into_iter().collect();

        let mut added: Vec<usize> = next.difference(&self.highlighted).copied().collect();
        let mut removed: Vec<usize> = self.highlighted.difference(&next).copied().collect();
        added.sort_unstable();
        removed.sort_unstable();

        self.highlighted = next;
        HighlightChange { added, removed }
    }

    /// Finalizes the drag at `current`.
    ///
    /// The contained set is recomputed one last time; the representative
    /// locator describes only the first element in DOM order.
    #[must_use]
    pub fn finish(self, current: Point, elements: &[ElementBox]) -> RegionSelection {
        let region = self.region(current);
        let contained = contained_indices(&region, elements);

        let summaries = contained
            .iter()
            .map(|&i| elements[i].summary())
            .collect();

        let locator = contained.first().map(|&i| {
            let first = &elements[i];
            Locator::representative(&first.tag, first.id.as_deref(), &first.classes)
        });

        RegionSelection {
            region,
            contained,
            summaries,
            locator,
        }
    }
}

/// Indices of elements fully contained in `region`, in slice order.
fn contained_indices(region: &Rect, elements: &[ElementBox]) -> Vec<usize> {
    elements
        .iter()
        .enumerate()
        .filter(|(_, el)| region.contains_rect(&el.rect))
        .map(|(i, _)| i)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
