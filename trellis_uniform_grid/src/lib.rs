// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Uniform Grid: a virtualizing uniform grid layout.
//!
//! [`UniformGridLayout`] lays items out in equal-size cells, wrapping lines
//! along the scroll axis, and realizes only what the viewport needs. It is
//! built on the flow core from [`trellis_flow`]:
//!
//! - The cell size comes from `min_item_width`/`min_item_height` when set, or
//!   from measuring item 0 otherwise (a guarded, pool-free probe).
//! - Items-per-line derives from the viewport's minor-axis size, capped by
//!   `maximum_rows_or_columns` when that is > 0, and is never below 1.
//! - [`ItemsStretch`] distributes leftover minor-axis pixels:
//!   [`ItemsStretch::Fill`] widens cells, [`ItemsStretch::Uniform`] widens
//!   them while preserving aspect ratio.
//! - Anchors always resolve to line starts, so a viewport-driven partial
//!   realization can never split a line.
//!
//! Property setters invalidate layout by bumping a generation the per-context
//! state observes; hosts simply measure again.
//!
//! ## Example
//!
//! Ten 50×50 items in a 220-wide viewport wrap into lines of four:
//!
//! ```rust
//! use kurbo::{Rect, Size};
//! use trellis_flow::{Layout, LayoutContext, LayoutState};
//! use trellis_items::{ContainerPool, SizedContainer, VecSource};
//! use trellis_uniform_grid::UniformGridLayout;
//!
//! let source = VecSource::new((0..10).collect::<Vec<_>>());
//! let mut pool = ContainerPool::new();
//! let mut state = LayoutState::new();
//! let mut make = |_index: usize| SizedContainer::new(Size::new(50.0, 50.0));
//!
//! let grid = UniformGridLayout::new();
//! let mut ctx = LayoutContext {
//!     source: &source,
//!     pool: &mut pool,
//!     state: &mut state,
//!     viewport: Some(Rect::new(0.0, 0.0, 220.0, 150.0)),
//!     make: &mut make,
//! };
//! grid.initialize_for_context(&mut ctx);
//!
//! let desired = grid.measure(&mut ctx, Size::new(220.0, f64::INFINITY));
//! // floor(220 / 50) = 4 per line, ceil(10 / 4) = 3 lines.
//! assert_eq!(desired, Size::new(200.0, 150.0));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod state;

use kurbo::{Rect, Size};
use trellis_flow::{
    FlowAnchor, FlowDelegate, IndexBasedLayoutOrientation, Layout, LayoutContext,
    LineJustification, Orientation, ScrollOrientation,
};
use trellis_items::{Container, ItemSource, SourceChange};

pub use state::{UniformGridLayoutState, apply_stretch, extra_pixels_in_line, items_per_line};

use state::floor;

/// How cells absorb leftover minor-axis space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ItemsStretch {
    /// Cells keep their resolved size; leftover space goes to justification.
    #[default]
    None,
    /// Cells widen along the minor axis to fill the line.
    Fill,
    /// Cells widen along the minor axis and grow along the major axis in
    /// proportion, preserving aspect ratio.
    Uniform,
}

/// A virtualizing layout placing items in equal-size wrapped cells.
///
/// One layout instance can serve many panels; all per-panel state lives in
/// the context's [`UniformGridLayoutState`].
#[derive(Clone, Debug)]
pub struct UniformGridLayout {
    orientation: Orientation,
    min_item_width: Option<f64>,
    min_item_height: Option<f64>,
    min_row_spacing: f64,
    min_column_spacing: f64,
    items_justification: LineJustification,
    items_stretch: ItemsStretch,
    maximum_rows_or_columns: usize,
    generation: u64,
}

impl Default for UniformGridLayout {
    fn default() -> Self {
        Self {
            orientation: Orientation::Horizontal,
            min_item_width: None,
            min_item_height: None,
            min_row_spacing: 0.0,
            min_column_spacing: 0.0,
            items_justification: LineJustification::Start,
            items_stretch: ItemsStretch::None,
            maximum_rows_or_columns: 0,
            generation: 0,
        }
    }
}

impl UniformGridLayout {
    /// Creates a layout with horizontal item flow and no explicit cell size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The direction items advance within a line.
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Sets the item-flow orientation, flipping the scroll orientation.
    pub fn set_orientation(&mut self, orientation: Orientation) {
        if self.orientation != orientation {
            self.orientation = orientation;
            self.touch();
        }
    }

    /// How consecutive indices progress visually; re-derived whenever the
    /// orientation flips.
    #[must_use]
    pub const fn index_based_layout_orientation(&self) -> IndexBasedLayoutOrientation {
        self.orientation.index_based_layout_orientation()
    }

    /// Explicit cell width, if set.
    #[must_use]
    pub const fn min_item_width(&self) -> Option<f64> {
        self.min_item_width
    }

    /// Sets the explicit cell width; `None` infers it from item 0.
    pub fn set_min_item_width(&mut self, width: Option<f64>) {
        if self.min_item_width != width {
            self.min_item_width = width;
            self.touch();
        }
    }

    /// Explicit cell height, if set.
    #[must_use]
    pub const fn min_item_height(&self) -> Option<f64> {
        self.min_item_height
    }

    /// Sets the explicit cell height; `None` infers it from item 0.
    pub fn set_min_item_height(&mut self, height: Option<f64>) {
        if self.min_item_height != height {
            self.min_item_height = height;
            self.touch();
        }
    }

    /// Minimum vertical gap between rows.
    #[must_use]
    pub const fn min_row_spacing(&self) -> f64 {
        self.min_row_spacing
    }

    /// Sets the minimum vertical gap between rows.
    pub fn set_min_row_spacing(&mut self, spacing: f64) {
        if self.min_row_spacing != spacing {
            self.min_row_spacing = spacing;
            self.touch();
        }
    }

    /// Minimum horizontal gap between columns.
    #[must_use]
    pub const fn min_column_spacing(&self) -> f64 {
        self.min_column_spacing
    }

    /// Sets the minimum horizontal gap between columns.
    pub fn set_min_column_spacing(&mut self, spacing: f64) {
        if self.min_column_spacing != spacing {
            self.min_column_spacing = spacing;
            self.touch();
        }
    }

    /// Minor-axis distribution of each line's leftover space.
    #[must_use]
    pub const fn items_justification(&self) -> LineJustification {
        self.items_justification
    }

    /// Sets the line justification.
    pub fn set_items_justification(&mut self, justification: LineJustification) {
        if self.items_justification != justification {
            self.items_justification = justification;
            self.touch();
        }
    }

    /// The stretch policy.
    #[must_use]
    pub const fn items_stretch(&self) -> ItemsStretch {
        self.items_stretch
    }

    /// Sets the stretch policy.
    pub fn set_items_stretch(&mut self, stretch: ItemsStretch) {
        if self.items_stretch != stretch {
            self.items_stretch = stretch;
            self.touch();
        }
    }

    /// Cap on items per line; 0 derives the count from the viewport.
    #[must_use]
    pub const fn maximum_rows_or_columns(&self) -> usize {
        self.maximum_rows_or_columns
    }

    /// Sets the items-per-line cap; 0 derives the count from the viewport.
    pub fn set_maximum_rows_or_columns(&mut self, maximum: usize) {
        if self.maximum_rows_or_columns != maximum {
            self.maximum_rows_or_columns = maximum;
            self.touch();
        }
    }

    /// Bumped by every layout-affecting property change; per-context state
    /// re-resolves when it observes a new value.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub(crate) fn explicit_major_item_size(&self) -> Option<f64> {
        match self.orientation {
            Orientation::Horizontal => self.min_item_height,
            Orientation::Vertical => self.min_item_width,
        }
    }

    pub(crate) fn explicit_minor_item_size(&self) -> Option<f64> {
        match self.orientation {
            Orientation::Horizontal => self.min_item_width,
            Orientation::Vertical => self.min_item_height,
        }
    }

    pub(crate) fn minor_item_spacing(&self) -> f64 {
        match self.orientation {
            Orientation::Horizontal => self.min_column_spacing,
            Orientation::Vertical => self.min_row_spacing,
        }
    }

    pub(crate) fn line_item_spacing(&self) -> f64 {
        match self.orientation {
            Orientation::Horizontal => self.min_row_spacing,
            Orientation::Vertical => self.min_column_spacing,
        }
    }

    /// The constraint item 0 is measured against.
    ///
    /// Explicit cell sizes constrain the probe directly (with any stretch
    /// extra folded into the minor axis); otherwise the pass's available size
    /// is used as-is.
    pub(crate) fn probe_constraint(&self, available: Size) -> Size {
        let axis = self.orientation.scroll_orientation();
        let minor = match self.explicit_minor_item_size() {
            Some(minor) => {
                let extra = match self.items_stretch {
                    ItemsStretch::None => 0.0,
                    ItemsStretch::Fill | ItemsStretch::Uniform => extra_pixels_in_line(
                        self.maximum_rows_or_columns,
                        axis.minor(available),
                        minor,
                        self.minor_item_spacing(),
                    ),
                };
                minor + extra
            }
            None => axis.minor(available),
        };
        let major = self
            .explicit_major_item_size()
            .unwrap_or(axis.major(available));
        axis.size(major, minor)
    }

    fn delegate_for(&self, state: &UniformGridLayoutState) -> GridDelegate {
        GridDelegate {
            axis: self.orientation.scroll_orientation(),
            item: state.effective_item_size(),
            items_per_line: state.items_per_line(),
            minor_spacing: self.minor_item_spacing(),
            line_spacing: self.line_item_spacing(),
            justification: self.items_justification,
        }
    }
}

impl<S: ItemSource, C: Container> Layout<S, C> for UniformGridLayout {
    fn initialize_for_context(&self, ctx: &mut LayoutContext<'_, S, C>) {
        ctx.state.install(UniformGridLayoutState::new);
    }

    fn uninitialize_for_context(&self, ctx: &mut LayoutContext<'_, S, C>) {
        ctx.state.clear();
    }

    fn measure(&self, ctx: &mut LayoutContext<'_, S, C>, available: Size) -> Size {
        // No viewport yet: the panel is not on screen, so realizing anything
        // would be wasted (and could realize the entire source).
        let Some(viewport) = ctx.viewport else {
            return Size::ZERO;
        };
        let state = ctx.state.get_mut::<UniformGridLayoutState>();
        state.resolve(self, ctx.source, ctx.pool, &mut *ctx.make, available);
        let delegate = self.delegate_for(state);
        state
            .flow
            .measure(ctx.source, ctx.pool, &delegate, &mut *ctx.make, available, viewport)
    }

    fn arrange(&self, ctx: &mut LayoutContext<'_, S, C>, final_size: Size) -> Size {
        let state = ctx.state.get_mut::<UniformGridLayoutState>();
        let delegate = self.delegate_for(state);
        state.flow.arrange(ctx.pool, &delegate, final_size)
    }

    fn on_items_changed(&self, ctx: &mut LayoutContext<'_, S, C>, change: SourceChange) {
        let state = ctx.state.get_mut::<UniformGridLayoutState>();
        let touches_first = match change {
            SourceChange::Added { index, .. }
            | SourceChange::Removed { index, .. }
            | SourceChange::Replaced { index, .. } => index == 0,
            SourceChange::Moved {
                old_index,
                new_index,
                ..
            } => old_index == 0 || new_index == 0,
            SourceChange::Reset => true,
        };
        if touches_first {
            // Item 0 drives the inferred cell size.
            state.invalidate_item_size();
        }
        state.flow.on_items_changed(ctx.pool, change);
    }
}

/// The flow-delegate view over a resolved pass: all values are precomputed
/// copies, so the algorithm can call freely without touching the state.
#[derive(Clone, Copy, Debug)]
struct GridDelegate {
    axis: ScrollOrientation,
    item: Size,
    items_per_line: usize,
    minor_spacing: f64,
    line_spacing: f64,
    justification: LineJustification,
}

impl FlowDelegate for GridDelegate {
    fn scroll_orientation(&self) -> ScrollOrientation {
        self.axis
    }

    fn measure_size(&self, _index: usize, _available: Size) -> Size {
        self.item
    }

    fn arrange_size(&self, _index: usize, _measured: Size) -> Size {
        // Cells are uniform regardless of what the content wanted.
        self.item
    }

    fn should_break_line(&self, index: usize, remaining_minor: f64) -> bool {
        remaining_minor < 0.0 || index % self.items_per_line == 0
    }

    fn anchor_for_realization_rect(&self, realization_rect: Rect, item_count: usize) -> FlowAnchor {
        debug_assert!(item_count > 0, "anchors are only resolved for non-empty sources");
        let line_major = self.axis.major(self.item) + self.line_spacing;
        let line = if line_major > 0.0 {
            let ratio = self.axis.major_origin(realization_rect).max(0.0) / line_major;
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Line numbers are clamped to the line count right after"
            )]
            let line = floor(ratio).max(0.0) as usize;
            line
        } else {
            0
        };
        let last_line_start = (item_count - 1) / self.items_per_line * self.items_per_line;
        let index = line
            .saturating_mul(self.items_per_line)
            .min(last_line_start);
        FlowAnchor {
            index,
            major_offset: (index / self.items_per_line) as f64 * line_major,
        }
    }

    fn anchor_index_for_target(&self, target: usize, item_count: usize) -> usize {
        if item_count == 0 {
            return 0;
        }
        target.min(item_count - 1) / self.items_per_line * self.items_per_line
    }

    fn extent(
        &self,
        item_count: usize,
        _available: Size,
        _first_realized: Option<(usize, Rect)>,
        last_realized: Option<(usize, Rect)>,
    ) -> Rect {
        if item_count == 0 {
            return Rect::ZERO;
        }
        let lines = item_count.div_ceil(self.items_per_line);
        let line_major = self.axis.major(self.item);
        let mut major = lines as f64 * (line_major + self.line_spacing) - self.line_spacing;
        let per_line = self.items_per_line.min(item_count);
        let minor =
            per_line as f64 * (self.axis.minor(self.item) + self.minor_spacing) - self.minor_spacing;
        // Fold in realized bounds so oversized measurements never shrink the
        // extent below realized content.
        if let Some((_, bounds)) = last_realized {
            major = major.max(self.axis.major_end(bounds));
        }
        self.axis.rect(0.0, 0.0, major.max(0.0), minor.max(0.0))
    }

    fn min_item_spacing(&self) -> f64 {
        self.minor_spacing
    }

    fn line_spacing(&self) -> f64 {
        self.line_spacing
    }

    fn line_justification(&self) -> LineJustification {
        self.justification
    }
}
