// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The flat-source wrap grid context.

use alloc::vec::Vec;

use kurbo::{Rect, Size, Vec2};
use trellis_flow::{ScrollAlign, ScrollOrientation, aligned_offset};
use trellis_items::{Container, ContainerId, ContainerPool, ItemSource, SourceChange};

use crate::{
    WrapFlags, WrapGrid, compose_extent, resolve_cell_size, resolve_max_rows_or_columns,
    visible_count, wrap_trace,
};

/// Per-panel state for a [`WrapGrid`] over a flat source.
///
/// Owns the viewport, scroll offset, extent bookkeeping, the resolved cell
/// size and items-per-line, and the ordered child list. The realized child
/// count equals the item count whenever [`WrapGridContext::are_items_dirty`]
/// is false.
#[derive(Debug)]
pub struct WrapGridContext {
    viewport: Option<Rect>,
    offset: Vec2,
    extent: Size,
    panel_extent: Size,
    item_size: Option<Size>,
    max_rows_or_columns: usize,
    children: Vec<ContainerId>,
    header_size: Size,
    footer_size: Size,
    flags: WrapFlags,
}

impl Default for WrapGridContext {
    fn default() -> Self {
        Self::new()
    }
}

impl WrapGridContext {
    /// Creates a context with no viewport and a pending rebuild.
    #[must_use]
    pub fn new() -> Self {
        Self {
            viewport: None,
            offset: Vec2::ZERO,
            extent: Size::ZERO,
            panel_extent: Size::ZERO,
            item_size: None,
            max_rows_or_columns: 1,
            children: Vec::new(),
            header_size: Size::ZERO,
            footer_size: Size::ZERO,
            flags: WrapFlags::ITEMS_DIRTY | WrapFlags::MEASURE_INVALID,
        }
    }

    /// The current viewport, if the host has delivered one.
    #[must_use]
    pub const fn viewport(&self) -> Option<Rect> {
        self.viewport
    }

    /// Delivers an effective-viewport change. Invalidates measure without
    /// re-entering it; repeated deliveries coalesce into one pass.
    pub fn set_viewport(&mut self, viewport: Rect) {
        if self.viewport != Some(viewport) {
            self.viewport = Some(viewport);
            self.flags.insert(WrapFlags::MEASURE_INVALID);
        }
    }

    /// The current scroll offset.
    #[must_use]
    pub const fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Sets the scroll offset, clamped so the viewport stays within the
    /// extent.
    pub fn set_offset(&mut self, offset: Vec2) {
        let viewport = self.viewport.map(|rect| rect.size()).unwrap_or(Size::ZERO);
        let max_x = (self.extent.width - viewport.width).max(0.0);
        let max_y = (self.extent.height - viewport.height).max(0.0);
        self.offset = Vec2::new(offset.x.clamp(0.0, max_x), offset.y.clamp(0.0, max_y));
    }

    /// Total scrollable size, header and footer included.
    #[must_use]
    pub const fn extent(&self) -> Size {
        self.extent
    }

    /// Items-only size, before header/footer composition.
    #[must_use]
    pub const fn panel_extent(&self) -> Size {
        self.panel_extent
    }

    /// The resolved uniform cell size; `None` until a measure resolved it.
    #[must_use]
    pub const fn item_size(&self) -> Option<Size> {
        self.item_size
    }

    /// The resolved items-per-line. Always ≥ 1.
    #[must_use]
    pub const fn max_rows_or_columns(&self) -> usize {
        self.max_rows_or_columns
    }

    /// Whether the realized set no longer matches the source.
    #[must_use]
    pub const fn are_items_dirty(&self) -> bool {
        self.flags.contains(WrapFlags::ITEMS_DIRTY)
    }

    /// Forces a full rebuild on the next measure. Call after changing
    /// layout-affecting [`WrapGrid`] properties.
    pub fn mark_items_dirty(&mut self) {
        self.flags
            .insert(WrapFlags::ITEMS_DIRTY | WrapFlags::MEASURE_INVALID);
    }

    /// Whether a measure pass is pending.
    #[must_use]
    pub const fn needs_measure(&self) -> bool {
        self.flags
            .intersects(WrapFlags::ITEMS_DIRTY.union(WrapFlags::MEASURE_INVALID))
    }

    /// The realized children, in item order.
    #[must_use]
    pub fn children(&self) -> &[ContainerId] {
        &self.children
    }

    /// Host-presenter header size, composed into the extent.
    pub fn set_header_size(&mut self, size: Size) {
        if self.header_size != size {
            self.header_size = size;
            self.flags.insert(WrapFlags::MEASURE_INVALID);
        }
    }

    /// Host-presenter footer size, composed into the extent.
    pub fn set_footer_size(&mut self, size: Size) {
        if self.footer_size != size {
            self.footer_size = size;
            self.flags.insert(WrapFlags::MEASURE_INVALID);
        }
    }

    /// Whether this panel scrolls vertically (horizontal item flow).
    #[must_use]
    pub fn can_scroll_vertically(&self, grid: &WrapGrid) -> bool {
        grid.scroll_axis() == ScrollOrientation::Vertical
    }

    /// Whether this panel scrolls horizontally (vertical item flow).
    #[must_use]
    pub fn can_scroll_horizontally(&self, grid: &WrapGrid) -> bool {
        grid.scroll_axis() == ScrollOrientation::Horizontal
    }

    /// One line's worth of scroll along the major axis.
    #[must_use]
    pub fn line_scroll_size(&self, grid: &WrapGrid) -> f64 {
        self.item_size
            .map(|cell| grid.scroll_axis().major(cell))
            .unwrap_or(0.0)
    }

    /// One page's worth of scroll along the major axis.
    #[must_use]
    pub fn page_scroll_size(&self, grid: &WrapGrid) -> f64 {
        self.viewport
            .map(|rect| grid.scroll_axis().major(rect.size()))
            .unwrap_or(0.0)
    }

    /// Scrolls so the line containing `index` is brought into view.
    pub fn scroll_to_index(&mut self, grid: &WrapGrid, index: usize, align: ScrollAlign) {
        let (Some(cell), Some(viewport)) = (self.item_size, self.viewport) else {
            return;
        };
        let axis = grid.scroll_axis();
        let line = index / self.max_rows_or_columns.max(1);
        let item_major = axis.major(cell);
        // The header scrolls with the content, so lines start past it.
        let origin = axis.major(self.header_size) + line as f64 * item_major;
        let current = axis.major_component(self.offset);
        let target = aligned_offset(align, origin, item_major, axis.major(viewport.size()), current);
        self.set_offset(axis.with_major(self.offset, target));
    }

    /// Runs a measure pass.
    ///
    /// With no viewport this is a no-op returning zero; nothing is realized
    /// until the panel is actually on screen. A dirty pass materializes and
    /// measures every item and re-resolves the cell size and items-per-line;
    /// a clean pass re-measures the existing children and refreshes the
    /// extent only if it changed.
    pub fn measure<S, C>(
        &mut self,
        grid: &WrapGrid,
        source: &S,
        pool: &mut ContainerPool<C>,
        make: &mut dyn FnMut(usize) -> C,
        available: Size,
    ) -> Size
    where
        S: ItemSource,
        C: Container,
    {
        let Some(viewport) = self.viewport else {
            return Size::ZERO;
        };
        self.flags.remove(WrapFlags::MEASURE_INVALID);
        let axis = grid.scroll_axis();

        if self.flags.contains(WrapFlags::ITEMS_DIRTY) {
            self.children.clear();
            if source.is_empty() {
                self.item_size = resolve_cell_size(grid, None);
                self.panel_extent = Size::ZERO;
                self.extent = compose_extent(axis, Size::ZERO, self.header_size, self.footer_size);
                self.flags.remove(WrapFlags::ITEMS_DIRTY);
                return self.extent;
            }

            let measured_first = if grid.has_explicit_cell() {
                None
            } else {
                let id = pool.materialize_with(0, || make(0));
                pool.get_mut(id).map(|container| container.measure(available))
            };
            let cell = resolve_cell_size(grid, measured_first).unwrap_or(Size::ZERO);
            self.item_size = Some(cell);

            for index in 0..source.len() {
                let id = pool.materialize_with(index, || make(index));
                if let Some(container) = pool.get_mut(id) {
                    container.measure(cell);
                }
                self.children.push(id);
            }
            self.max_rows_or_columns =
                resolve_max_rows_or_columns(grid, axis.minor(viewport.size()), axis.minor(cell));
            self.flags.remove(WrapFlags::ITEMS_DIRTY);
            wrap_trace!(
                "wrap grid rebuilt: {} children, {} per line",
                self.children.len(),
                self.max_rows_or_columns
            );
        } else {
            let cell = self.item_size.unwrap_or(Size::ZERO);
            for &id in &self.children {
                if let Some(container) = pool.get_mut(id) {
                    container.measure(cell);
                }
            }
            self.max_rows_or_columns =
                resolve_max_rows_or_columns(grid, axis.minor(viewport.size()), axis.minor(cell));
        }

        self.update_extent(grid, pool);
        debug_assert_eq!(
            self.children.len(),
            source.len(),
            "realized children track the source 1:1 when clean"
        );
        self.extent
    }

    /// Runs an arrange pass: an in-order walk stepping by the cell size,
    /// wrapping at items-per-line. Invisible children are skipped without
    /// advancing.
    pub fn arrange<C: Container>(
        &mut self,
        grid: &WrapGrid,
        pool: &mut ContainerPool<C>,
        final_size: Size,
    ) -> Size {
        let Some(cell) = self.item_size else {
            return final_size;
        };
        let axis = grid.scroll_axis();
        let mroc = self.max_rows_or_columns.max(1);
        let mut placed = 0_usize;
        for &id in &self.children {
            let Some(container) = pool.get_mut(id) else {
                continue;
            };
            if !container.is_visible() {
                continue;
            }
            let line = placed / mroc;
            let slot = placed % mroc;
            let bounds = axis.rect(
                line as f64 * axis.major(cell),
                slot as f64 * axis.minor(cell),
                axis.major(cell),
                axis.minor(cell),
            );
            container.arrange(bounds);
            placed += 1;
        }
        final_size
    }

    /// Applies a source change incrementally.
    ///
    /// Adds insert recycling-queue space at the insertion point (when not
    /// appending), then materialize and measure the new containers in place.
    /// Removes destroy the range and slide later bookkeeping down. Replace
    /// and move are remove-then-add. Reset clears everything and rebuilds on
    /// the next measure.
    pub fn on_items_changed<S, C>(
        &mut self,
        grid: &WrapGrid,
        source: &S,
        pool: &mut ContainerPool<C>,
        make: &mut dyn FnMut(usize) -> C,
        change: SourceChange,
    ) where
        S: ItemSource,
        C: Container,
    {
        if self.flags.contains(WrapFlags::ITEMS_DIRTY) {
            // A rebuild is already pending; only a reset still matters, to
            // release whatever is realized.
            if matches!(change, SourceChange::Reset) {
                self.reset(pool);
            }
            return;
        }
        match change {
            SourceChange::Added { index, count } => {
                self.add_items(grid, source, pool, make, index, count);
            }
            SourceChange::Removed { index, count } => {
                self.remove_items(grid, pool, index, count);
            }
            SourceChange::Replaced {
                index,
                old_count,
                new_count,
            } => {
                self.remove_items(grid, pool, index, old_count);
                self.add_items(grid, source, pool, make, index, new_count);
            }
            SourceChange::Moved {
                old_index,
                count,
                new_index,
            } => {
                // Deliberately remove-then-add, not an in-place move.
                self.remove_items(grid, pool, old_index, count);
                self.add_items(grid, source, pool, make, new_index, count);
            }
            SourceChange::Reset => self.reset(pool),
        }
        self.flags.insert(WrapFlags::MEASURE_INVALID);
    }

    fn add_items<S, C>(
        &mut self,
        grid: &WrapGrid,
        source: &S,
        pool: &mut ContainerPool<C>,
        make: &mut dyn FnMut(usize) -> C,
        index: usize,
        count: usize,
    ) where
        S: ItemSource,
        C: Container,
    {
        let old_len = source.len().saturating_sub(count);
        if index < old_len {
            // Deferred visual insertion: later bindings shift up and keep
            // their containers.
            pool.insert_space(index, count);
        }
        let cell = self.item_size.unwrap_or(Size::ZERO);
        for offset in 0..count {
            let item = index + offset;
            let id = pool.materialize_with(item, || make(item));
            if let Some(container) = pool.get_mut(id) {
                container.measure(cell);
            }
            self.children.insert(item, id);
        }
        if index == 0 {
            self.refresh_cell_size(grid, pool);
        }
        self.update_extent(grid, pool);
    }

    fn remove_items<C: Container>(
        &mut self,
        grid: &WrapGrid,
        pool: &mut ContainerPool<C>,
        index: usize,
        count: usize,
    ) {
        self.children.drain(index..index + count);
        pool.remove_range(index, count);
        if index == 0 {
            self.refresh_cell_size(grid, pool);
        }
        self.update_extent(grid, pool);
    }

    fn reset<C>(&mut self, pool: &mut ContainerPool<C>) {
        pool.clear();
        self.children.clear();
        if !self.flags.contains(WrapFlags::ITEMS_DIRTY) {
            wrap_trace!("wrap grid reset: realized set released");
        }
        self.item_size = None;
        self.flags
            .insert(WrapFlags::ITEMS_DIRTY | WrapFlags::MEASURE_INVALID);
    }

    /// Re-derives the inferred cell size after item 0 changed.
    fn refresh_cell_size<C: Container>(&mut self, grid: &WrapGrid, pool: &ContainerPool<C>) {
        if grid.has_explicit_cell() {
            return;
        }
        let measured = self
            .children
            .first()
            .and_then(|&id| pool.get(id))
            .map(Container::desired_size);
        if let Some(cell) = resolve_cell_size(grid, measured) {
            self.item_size = Some(cell);
        }
    }

    fn update_extent<C: Container>(&mut self, grid: &WrapGrid, pool: &ContainerPool<C>) {
        let axis = grid.scroll_axis();
        let cell = self.item_size.unwrap_or(Size::ZERO);
        let mroc = self.max_rows_or_columns.max(1);
        let visible = visible_count(pool, &self.children);
        let lines = visible.div_ceil(mroc);
        self.panel_extent = axis.size(
            lines as f64 * axis.major(cell),
            visible.min(mroc) as f64 * axis.minor(cell),
        );
        self.extent = compose_extent(axis, self.panel_extent, self.header_size, self.footer_size);
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Rect, Size, Vec2};
    use trellis_flow::ScrollAlign;
    use trellis_items::{ContainerPool, SizedContainer, VecSource};

    use super::WrapGridContext;
    use crate::WrapGrid;

    fn fifty(_index: usize) -> SizedContainer {
        SizedContainer::new(Size::new(50.0, 50.0))
    }

    fn grid_50() -> WrapGrid {
        let mut grid = WrapGrid::new();
        grid.set_item_width(Some(50.0));
        grid.set_item_height(Some(50.0));
        grid
    }

    fn measured_context(
        source: &VecSource<usize>,
        grid: &WrapGrid,
        pool: &mut ContainerPool<SizedContainer>,
    ) -> WrapGridContext {
        let mut ctx = WrapGridContext::new();
        ctx.set_viewport(Rect::new(0.0, 0.0, 220.0, 150.0));
        let mut make = fifty;
        ctx.measure(grid, source, pool, &mut make, Size::new(220.0, f64::INFINITY));
        ctx
    }

    #[test]
    fn no_viewport_measures_to_zero_and_realizes_nothing() {
        let source = VecSource::new((0..10).collect());
        let grid = grid_50();
        let mut pool = ContainerPool::new();
        let mut ctx = WrapGridContext::new();
        let mut make = fifty;
        let desired = ctx.measure(
            &grid,
            &source,
            &mut pool,
            &mut make,
            Size::new(220.0, f64::INFINITY),
        );
        assert_eq!(desired, Size::ZERO);
        assert_eq!(pool.realized_count(), 0);
        assert!(ctx.are_items_dirty());
    }

    #[test]
    fn ten_items_in_a_220_viewport_extend_to_200_by_150() {
        let source = VecSource::new((0..10).collect());
        let grid = grid_50();
        let mut pool = ContainerPool::new();
        let ctx = measured_context(&source, &grid, &mut pool);

        assert_eq!(ctx.max_rows_or_columns(), 4);
        assert_eq!(ctx.extent(), Size::new(200.0, 150.0));
        assert_eq!(ctx.panel_extent(), Size::new(200.0, 150.0));
        assert_eq!(ctx.children().len(), 10);
        assert_eq!(pool.realized_count(), 10);
        assert!(!ctx.are_items_dirty());
    }

    #[test]
    fn cell_size_is_inferred_from_the_first_item() {
        let source = VecSource::new((0..10).collect());
        let grid = WrapGrid::new();
        let mut pool = ContainerPool::new();
        let ctx = measured_context(&source, &grid, &mut pool);
        assert_eq!(ctx.item_size(), Some(Size::new(50.0, 50.0)));
        assert_eq!(ctx.extent(), Size::new(200.0, 150.0));
    }

    #[test]
    fn arrange_wraps_at_items_per_line() {
        let source = VecSource::new((0..10).collect());
        let grid = grid_50();
        let mut pool = ContainerPool::new();
        let mut ctx = measured_context(&source, &grid, &mut pool);
        ctx.arrange(&grid, &mut pool, Size::new(220.0, 150.0));

        let bounds = |index: usize| {
            pool.get(ctx.children()[index])
                .and_then(SizedContainer::arranged)
        };
        assert_eq!(bounds(0), Some(Rect::new(0.0, 0.0, 50.0, 50.0)));
        assert_eq!(bounds(3), Some(Rect::new(150.0, 0.0, 200.0, 50.0)));
        // Index 4 wraps to the second row.
        assert_eq!(bounds(4), Some(Rect::new(0.0, 50.0, 50.0, 100.0)));
        assert_eq!(bounds(9), Some(Rect::new(50.0, 100.0, 100.0, 150.0)));
    }

    #[test]
    fn header_and_footer_compose_into_the_extent() {
        let source = VecSource::new((0..10).collect());
        let grid = grid_50();
        let mut pool = ContainerPool::new();
        let mut ctx = WrapGridContext::new();
        ctx.set_viewport(Rect::new(0.0, 0.0, 220.0, 150.0));
        ctx.set_header_size(Size::new(220.0, 20.0));
        ctx.set_footer_size(Size::new(220.0, 10.0));
        let mut make = fifty;
        let desired = ctx.measure(
            &grid,
            &source,
            &mut pool,
            &mut make,
            Size::new(220.0, f64::INFINITY),
        );
        assert_eq!(desired, Size::new(220.0, 180.0));
        assert_eq!(ctx.panel_extent(), Size::new(200.0, 150.0));
    }

    #[test]
    fn add_then_remove_restores_children_and_extent() {
        let mut source = VecSource::new((0..10).collect());
        let grid = grid_50();
        let mut pool = ContainerPool::new();
        let mut ctx = measured_context(&source, &grid, &mut pool);
        let before_extent = ctx.extent();
        let id_at_5 = pool.container_from_index(5);
        let mut make = fifty;

        let change = source.insert_many(2, alloc::vec![90, 91, 92]);
        ctx.on_items_changed(&grid, &source, &mut pool, &mut make, change);
        assert_eq!(ctx.children().len(), 13);
        assert_eq!(ctx.extent(), Size::new(200.0, 200.0));
        // The shifted items kept their containers.
        assert_eq!(pool.container_from_index(8), id_at_5);

        let change = source.remove_many(2, 3);
        ctx.on_items_changed(&grid, &source, &mut pool, &mut make, change);
        assert_eq!(ctx.children().len(), 10);
        assert_eq!(ctx.extent(), before_extent);
        assert_eq!(pool.container_from_index(5), id_at_5);
    }

    #[test]
    fn replace_and_move_rebuild_the_affected_range() {
        let mut source = VecSource::new((0..10).collect());
        let grid = grid_50();
        let mut pool = ContainerPool::new();
        let mut ctx = measured_context(&source, &grid, &mut pool);
        let mut make = fifty;

        let change = source.replace(4, 99);
        ctx.on_items_changed(&grid, &source, &mut pool, &mut make, change);
        assert_eq!(ctx.children().len(), 10);
        assert_eq!(ctx.extent(), Size::new(200.0, 150.0));

        let change = source.move_item(0, 7);
        ctx.on_items_changed(&grid, &source, &mut pool, &mut make, change);
        assert_eq!(ctx.children().len(), 10);
        assert_eq!(pool.realized_count(), 10);
    }

    #[test]
    fn invisible_items_leave_row_math_but_stay_realized() {
        let source = VecSource::new((0..10).collect());
        let grid = grid_50();
        let mut pool = ContainerPool::new();
        let mut ctx = measured_context(&source, &grid, &mut pool);

        for index in [3, 7] {
            let id = ctx.children()[index];
            if let Some(container) = pool.get_mut(id) {
                container.set_visible(false);
            }
        }
        let mut make = fifty;
        let desired = ctx.measure(
            &grid,
            &source,
            &mut pool,
            &mut make,
            Size::new(220.0, f64::INFINITY),
        );
        // ceil(8 / 4) = 2 rows, but all ten stay realized.
        assert_eq!(desired, Size::new(200.0, 100.0));
        assert_eq!(pool.realized_count(), 10);
        assert_eq!(ctx.children().len(), 10);

        // The arrange walk skips the hidden cells without advancing.
        ctx.arrange(&grid, &mut pool, Size::new(220.0, 100.0));
        let fourth_visible = pool
            .get(ctx.children()[4])
            .and_then(SizedContainer::arranged);
        assert_eq!(fourth_visible, Some(Rect::new(150.0, 0.0, 200.0, 50.0)));
    }

    #[test]
    fn reset_clears_and_marks_dirty() {
        let mut source = VecSource::new((0..10).collect());
        let grid = grid_50();
        let mut pool = ContainerPool::new();
        let mut ctx = measured_context(&source, &grid, &mut pool);
        let mut make = fifty;

        let change = source.reset((0..4).collect(), None);
        ctx.on_items_changed(&grid, &source, &mut pool, &mut make, change);
        assert!(ctx.are_items_dirty());
        assert_eq!(ctx.children().len(), 0);
        assert_eq!(pool.realized_count(), 0);

        ctx.measure(
            &grid,
            &source,
            &mut pool,
            &mut make,
            Size::new(220.0, f64::INFINITY),
        );
        assert_eq!(ctx.children().len(), 4);
        assert_eq!(ctx.extent(), Size::new(200.0, 50.0));
    }

    #[test]
    fn scroll_contract_clamps_and_aligns() {
        let source = VecSource::new((0..40).collect());
        let grid = grid_50();
        let mut pool = ContainerPool::new();
        let mut ctx = measured_context(&source, &grid, &mut pool);
        // 40 items, 4 per row: extent height 500, viewport height 150.
        assert_eq!(ctx.extent(), Size::new(200.0, 500.0));
        assert!(ctx.can_scroll_vertically(&grid));
        assert!(!ctx.can_scroll_horizontally(&grid));
        assert_eq!(ctx.line_scroll_size(&grid), 50.0);
        assert_eq!(ctx.page_scroll_size(&grid), 150.0);

        ctx.set_offset(Vec2::new(0.0, 1000.0));
        assert_eq!(ctx.offset(), Vec2::new(0.0, 350.0));

        ctx.scroll_to_index(&grid, 20, ScrollAlign::Start);
        // Item 20 starts row 5, at y = 250.
        assert_eq!(ctx.offset(), Vec2::new(0.0, 250.0));
    }
}
