// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Wrap Grid: an eagerly-realizing wrap panel.
//!
//! [`WrapGrid`] places uniform cells in wrapped lines, realizing every item
//! up front (the scaffolding is virtualization-shaped, but this panel does
//! not virtualize). It supports flat and grouped sources through two context
//! variants:
//!
//! - [`WrapGridContext`]: flat sources, with incremental handling of live
//!   collection changes (inserted items shift container bookkeeping via the
//!   pool's `insert_space`, removals slide it back down).
//! - [`GroupedWrapGridContext`]: grouped sources, with a realized group
//!   header per group. Any collection change recycles everything and rebuilds
//!   on the next measure (the grouped path keeps no incremental state).
//!
//! The cell size comes from the panel's `item_width`/`item_height` when set,
//! or from the first item otherwise. Items-per-line comes from the viewport's
//! minor-axis size, or from `maximum_rows_or_columns` when that is set.
//! Invisible items stay realized but are excluded from line math, so a
//! visibility toggle reflows the grid without a rebuild.
//!
//! Both contexts carry a logical-scroll contract: a settable clamped offset,
//! readonly extent/viewport, per-orientation scrollability flags, line/page
//! scroll sizes, and [`ScrollAlign`]-based bring-into-view. Host presenters
//! feed header and footer sizes in; the reported extent composes them with
//! the items-only extent along the scroll axis.
//!
//! A context without a viewport measures to zero and realizes nothing: an
//! off-screen panel never materializes its source.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod grouped;
mod iterable;
mod trace;

use kurbo::Size;
use trellis_flow::{Orientation, ScrollOrientation};
use trellis_items::Container;

pub(crate) use trace::wrap_trace;

pub use grouped::GroupedWrapGridContext;
pub use iterable::WrapGridContext;

// Re-exported so hosts can drive bring-into-view without an extra dependency.
pub use trellis_flow::ScrollAlign;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub(crate) struct WrapFlags: u8 {
        /// The realized set no longer matches the source; rebuild on the
        /// next measure.
        const ITEMS_DIRTY = 1;
        /// A viewport or content change since the last measure pass.
        const MEASURE_INVALID = 1 << 1;
    }
}

/// Wrap panel properties: orientation, cell size, items-per-line cap.
///
/// The panel object itself is stateless across passes; per-panel state lives
/// in a [`WrapGridContext`] or [`GroupedWrapGridContext`]. After changing a
/// property, dirty the context ([`WrapGridContext::mark_items_dirty`] /
/// [`GroupedWrapGridContext::mark_items_dirty`]) and measure again.
#[derive(Clone, Debug)]
pub struct WrapGrid {
    orientation: Orientation,
    item_width: Option<f64>,
    item_height: Option<f64>,
    maximum_rows_or_columns: usize,
}

impl Default for WrapGrid {
    fn default() -> Self {
        Self {
            orientation: Orientation::Horizontal,
            item_width: None,
            item_height: None,
            maximum_rows_or_columns: 0,
        }
    }
}

impl WrapGrid {
    /// Creates a horizontally flowing wrap grid with inferred cell size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The direction items advance within a line.
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Sets the item-flow orientation.
    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    /// Explicit cell width; `None` until resolved from the first item.
    #[must_use]
    pub const fn item_width(&self) -> Option<f64> {
        self.item_width
    }

    /// Sets the explicit cell width.
    pub fn set_item_width(&mut self, width: Option<f64>) {
        self.item_width = width;
    }

    /// Explicit cell height; `None` until resolved from the first item.
    #[must_use]
    pub const fn item_height(&self) -> Option<f64> {
        self.item_height
    }

    /// Sets the explicit cell height.
    pub fn set_item_height(&mut self, height: Option<f64>) {
        self.item_height = height;
    }

    /// Items-per-line override; 0 derives the count from the viewport.
    #[must_use]
    pub const fn maximum_rows_or_columns(&self) -> usize {
        self.maximum_rows_or_columns
    }

    /// Sets the items-per-line override; 0 derives the count from the viewport.
    pub fn set_maximum_rows_or_columns(&mut self, maximum: usize) {
        self.maximum_rows_or_columns = maximum;
    }

    pub(crate) const fn scroll_axis(&self) -> ScrollOrientation {
        self.orientation.scroll_orientation()
    }

    pub(crate) const fn has_explicit_cell(&self) -> bool {
        self.item_width.is_some() && self.item_height.is_some()
    }
}

/// Floor for non-`std` builds (`f64::floor` lives in `std`).
pub(crate) fn floor(x: f64) -> f64 {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Callers keep values within index-scale ranges"
    )]
    let truncated = x as i64 as f64;
    if x < truncated {
        truncated - 1.0
    } else {
        truncated
    }
}

/// Resolves the uniform cell size from explicit properties and (when needed)
/// the first item's measured size.
pub(crate) fn resolve_cell_size(grid: &WrapGrid, measured_first: Option<Size>) -> Option<Size> {
    match (grid.item_width(), grid.item_height()) {
        (Some(width), Some(height)) => Some(Size::new(width, height)),
        (width, height) => measured_first.map(|measured| {
            Size::new(
                width.unwrap_or(measured.width),
                height.unwrap_or(measured.height),
            )
        }),
    }
}

/// Items placed along the minor axis before wrapping. Always ≥ 1.
pub(crate) fn resolve_max_rows_or_columns(
    grid: &WrapGrid,
    viewport_minor: f64,
    item_minor: f64,
) -> usize {
    if grid.maximum_rows_or_columns() > 0 {
        return grid.maximum_rows_or_columns();
    }
    if item_minor > 0.0 && viewport_minor.is_finite() {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "The ratio is non-negative and saturates at usize::MAX"
        )]
        let fits = floor(viewport_minor / item_minor).max(0.0) as usize;
        fits.max(1)
    } else {
        1
    }
}

/// Combines the items-only extent with host-supplied header and footer sizes
/// along the scroll axis.
pub(crate) fn compose_extent(
    axis: ScrollOrientation,
    panel: Size,
    header: Size,
    footer: Size,
) -> Size {
    let major = axis.major(panel) + axis.major(header) + axis.major(footer);
    let minor = axis
        .minor(panel)
        .max(axis.minor(header))
        .max(axis.minor(footer));
    axis.size(major, minor)
}

/// Counts the visible containers among `ids`.
pub(crate) fn visible_count<C: Container>(
    pool: &trellis_items::ContainerPool<C>,
    ids: &[trellis_items::ContainerId],
) -> usize {
    ids.iter()
        .filter(|&&id| pool.get(id).is_some_and(|container| container.is_visible()))
        .count()
}
