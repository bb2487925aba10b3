// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The grouped-source wrap grid context.

use alloc::vec::Vec;

use kurbo::{Point, Rect, Size, Vec2};
use smallvec::SmallVec;
use trellis_flow::{Orientation, ScrollAlign, ScrollOrientation, aligned_offset};
use trellis_items::{Container, ContainerId, ContainerPool, GroupMap, ItemSource, SourceChange};

use crate::{
    WrapFlags, WrapGrid, compose_extent, resolve_cell_size, resolve_max_rows_or_columns,
    wrap_trace,
};

/// Where a group landed during measure: its header rect and the origin of its
/// item block.
#[derive(Clone, Copy, Debug, Default)]
struct GroupPlacement {
    header_bounds: Rect,
    items_origin: Point,
}

/// Per-panel state for a [`WrapGrid`] over a grouped source.
///
/// Owns a realized group-header container per group (index-parallel with the
/// source's groups, in a private header pool) on top of the flat item
/// children. Realized header count + child count equals group count + item
/// count whenever [`GroupedWrapGridContext::are_items_dirty`] is false.
///
/// Unlike the flat context there is no incremental change handling: any
/// source change recycles every header and item and the next measure rebuilds
/// from scratch.
#[derive(Debug)]
pub struct GroupedWrapGridContext<C> {
    viewport: Option<Rect>,
    offset: Vec2,
    extent: Size,
    panel_extent: Size,
    item_size: Option<Size>,
    max_rows_or_columns: usize,
    children: Vec<ContainerId>,
    headers: Vec<ContainerId>,
    header_pool: ContainerPool<C>,
    placements: SmallVec<[GroupPlacement; 8]>,
    header_size: Size,
    footer_size: Size,
    flags: WrapFlags,
}

impl<C> Default for GroupedWrapGridContext<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> GroupedWrapGridContext<C> {
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
            headers: Vec::new(),
            header_pool: ContainerPool::new(),
            placements: SmallVec::new(),
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
    /// re-entering it.
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

    /// Items-and-group-headers size, before host header/footer composition.
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

    /// Forces a full rebuild on the next measure.
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

    /// The realized item children, in flat item order.
    #[must_use]
    pub fn children(&self) -> &[ContainerId] {
        &self.children
    }

    /// The realized group headers, index-parallel with the groups.
    #[must_use]
    pub fn headers(&self) -> &[ContainerId] {
        &self.headers
    }

    /// The realized header container for `group`.
    #[must_use]
    pub fn header_container(&self, group: usize) -> Option<&C> {
        self.headers
            .get(group)
            .and_then(|&id| self.header_pool.get(id))
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
}

impl<C: Container> GroupedWrapGridContext<C> {
    /// Runs a measure pass.
    ///
    /// With no viewport this is a no-op returning zero. A dirty pass realizes
    /// a header per group (via `make_header`, the host's
    /// choose-a-header-container hook; content binding is the factory's job)
    /// and every item, then computes per-group placement. A clean pass
    /// re-measures what is realized and refreshes the placement.
    pub fn measure<S>(
        &mut self,
        grid: &WrapGrid,
        source: &S,
        pool: &mut ContainerPool<C>,
        make_item: &mut dyn FnMut(usize) -> C,
        make_header: &mut dyn FnMut(usize) -> C,
        available: Size,
    ) -> Size
    where
        S: ItemSource,
    {
        let Some(viewport) = self.viewport else {
            return Size::ZERO;
        };
        let Some(groups) = source.groups() else {
            debug_assert!(false, "grouped context measured against an ungrouped source");
            return Size::ZERO;
        };
        self.flags.remove(WrapFlags::MEASURE_INVALID);
        let axis = grid.scroll_axis();
        let header_constraint = axis.size(f64::INFINITY, axis.minor(viewport.size()));

        if self.flags.contains(WrapFlags::ITEMS_DIRTY) {
            self.children.clear();
            self.headers.clear();

            let measured_first = if grid.has_explicit_cell() || source.is_empty() {
                None
            } else {
                let id = pool.materialize_with(0, || make_item(0));
                pool.get_mut(id).map(|container| container.measure(available))
            };
            let cell = resolve_cell_size(grid, measured_first).unwrap_or(Size::ZERO);
            self.item_size = Some(cell);
            self.max_rows_or_columns =
                resolve_max_rows_or_columns(grid, axis.minor(viewport.size()), axis.minor(cell));

            for group in 0..groups.group_count() {
                let id = self.header_pool.materialize_with(group, || make_header(group));
                if let Some(header) = self.header_pool.get_mut(id) {
                    header.measure(header_constraint);
                }
                self.headers.push(id);
            }
            for index in 0..source.len() {
                let id = pool.materialize_with(index, || make_item(index));
                if let Some(container) = pool.get_mut(id) {
                    container.measure(cell);
                }
                self.children.push(id);
            }
            self.flags.remove(WrapFlags::ITEMS_DIRTY);
            wrap_trace!(
                "grouped wrap grid rebuilt: {} groups, {} items",
                self.headers.len(),
                self.children.len()
            );
        } else {
            let cell = self.item_size.unwrap_or(Size::ZERO);
            for &id in &self.headers {
                if let Some(header) = self.header_pool.get_mut(id) {
                    header.measure(header_constraint);
                }
            }
            for &id in &self.children {
                if let Some(container) = pool.get_mut(id) {
                    container.measure(cell);
                }
            }
            self.max_rows_or_columns =
                resolve_max_rows_or_columns(grid, axis.minor(viewport.size()), axis.minor(cell));
        }

        self.update_placement(grid, groups, pool);
        debug_assert_eq!(
            self.children.len() + self.headers.len(),
            source.len() + groups.group_count(),
            "realized containers track items plus group headers 1:1 when clean"
        );
        self.extent
    }

    /// Runs an arrange pass: headers at their measured placement, each
    /// group's items wrapped within its block. Invisible items are skipped
    /// without advancing.
    pub fn arrange<S>(
        &mut self,
        grid: &WrapGrid,
        source: &S,
        pool: &mut ContainerPool<C>,
        final_size: Size,
    ) -> Size
    where
        S: ItemSource,
    {
        let Some(groups) = source.groups() else {
            return final_size;
        };
        let Some(cell) = self.item_size else {
            return final_size;
        };
        let mroc = self.max_rows_or_columns.max(1);

        for (group, placement) in self.placements.iter().enumerate() {
            if let Some(&header_id) = self.headers.get(group)
                && let Some(header) = self.header_pool.get_mut(header_id)
            {
                header.arrange(placement.header_bounds);
            }

            let start = groups.start_of(group);
            let len = groups.len_of(group);
            let mut placed = 0_usize;
            for index in start..start + len {
                let Some(&id) = self.children.get(index) else {
                    continue;
                };
                let Some(container) = pool.get_mut(id) else {
                    continue;
                };
                if !container.is_visible() {
                    continue;
                }
                let (column, row) = match grid.orientation() {
                    Orientation::Horizontal => (placed % mroc, placed / mroc),
                    Orientation::Vertical => (placed / mroc, placed % mroc),
                };
                let origin = placement.items_origin;
                let bounds = Rect::from_origin_size(
                    Point::new(
                        origin.x + column as f64 * cell.width,
                        origin.y + row as f64 * cell.height,
                    ),
                    cell,
                );
                container.arrange(bounds);
                placed += 1;
            }
        }
        final_size
    }

    /// Applies a source change: full clear-and-rebuild.
    ///
    /// Incremental grouped updates are deliberately not attempted: every
    /// header and item is released and the next measure rebuilds from
    /// scratch. A reset behaves identically, regardless of prior state.
    pub fn on_items_changed(&mut self, pool: &mut ContainerPool<C>, change: SourceChange) {
        let _ = change;
        pool.clear();
        self.header_pool.clear();
        self.children.clear();
        self.headers.clear();
        self.placements.clear();
        self.item_size = None;
        self.flags
            .insert(WrapFlags::ITEMS_DIRTY | WrapFlags::MEASURE_INVALID);
        wrap_trace!("grouped wrap grid change: realized set released for rebuild");
    }

    /// Scrolls so the line containing the item at flat `index` comes into
    /// view.
    pub fn scroll_to_index<S>(
        &mut self,
        grid: &WrapGrid,
        source: &S,
        index: usize,
        align: ScrollAlign,
    ) where
        S: ItemSource,
    {
        let Some(groups) = source.groups() else {
            return;
        };
        let (Some(cell), Some(viewport)) = (self.item_size, self.viewport) else {
            return;
        };
        let Some(group) = groups.group_of_item(index) else {
            return;
        };
        let Some(placement) = self.placements.get(group) else {
            return;
        };
        let axis = grid.scroll_axis();
        let mroc = self.max_rows_or_columns.max(1);
        let local = index - groups.start_of(group);
        let line = local / mroc;
        let item_major = axis.major(cell);
        let block_major = match grid.orientation() {
            Orientation::Horizontal => placement.items_origin.y,
            Orientation::Vertical => placement.items_origin.x,
        };
        let origin = axis.major(self.header_size) + block_major + line as f64 * item_major;
        let current = axis.major_component(self.offset);
        let target = aligned_offset(align, origin, item_major, axis.major(viewport.size()), current);
        self.set_offset(axis.with_major(self.offset, target));
    }

    fn visible_in_group(&self, groups: &GroupMap, group: usize, pool: &ContainerPool<C>) -> usize {
        let start = groups.start_of(group);
        let len = groups.len_of(group);
        self.children
            .get(start..(start + len).min(self.children.len()))
            .map(|ids| {
                ids.iter()
                    .filter(|&&id| pool.get(id).is_some_and(|container| container.is_visible()))
                    .count()
            })
            .unwrap_or(0)
    }

    fn update_placement(&mut self, grid: &WrapGrid, groups: &GroupMap, pool: &ContainerPool<C>) {
        let cell = self.item_size.unwrap_or(Size::ZERO);
        let mroc = self.max_rows_or_columns.max(1);
        let mut placements: SmallVec<[GroupPlacement; 8]> = SmallVec::new();

        match grid.orientation() {
            Orientation::Horizontal => {
                // Vertical scroll: each header spans the full panel width and
                // every group starts a fresh row beneath it.
                let width = self.viewport.map(|rect| rect.width()).unwrap_or(0.0);
                let mut y = 0.0_f64;
                for (group, &header_id) in self.headers.iter().enumerate() {
                    let header_height = self
                        .header_pool
                        .get(header_id)
                        .map(|header| header.desired_size().height)
                        .unwrap_or(0.0);
                    let header_bounds = Rect::new(0.0, y, width, y + header_height);
                    y += header_height;
                    let items_origin = Point::new(0.0, y);
                    let visible = self.visible_in_group(groups, group, pool);
                    let rows = visible.div_ceil(mroc);
                    y += rows as f64 * cell.height;
                    placements.push(GroupPlacement {
                        header_bounds,
                        items_origin,
                    });
                }
                self.panel_extent = Size::new(width, y);
            }
            Orientation::Vertical => {
                // Horizontal scroll: headers run along the top, each group's
                // column block grows downward beneath its header. A header
                // wider than its content pushes the next group to its right
                // edge.
                let mut x = 0.0_f64;
                let mut max_bottom = 0.0_f64;
                for (group, &header_id) in self.headers.iter().enumerate() {
                    let header_desired = self
                        .header_pool
                        .get(header_id)
                        .map(Container::desired_size)
                        .unwrap_or(Size::ZERO);
                    let header_bounds =
                        Rect::new(x, 0.0, x + header_desired.width, header_desired.height);
                    let items_origin = Point::new(x, header_desired.height);
                    let visible = self.visible_in_group(groups, group, pool);
                    let columns = visible.div_ceil(mroc);
                    let content_width = columns as f64 * cell.width;
                    let content_height = visible.min(mroc) as f64 * cell.height;
                    max_bottom = max_bottom.max(header_desired.height + content_height);
                    x += content_width.max(header_desired.width);
                    placements.push(GroupPlacement {
                        header_bounds,
                        items_origin,
                    });
                }
                self.panel_extent = Size::new(x, max_bottom);
            }
        }

        self.placements = placements;
        let axis = grid.scroll_axis();
        self.extent = compose_extent(axis, self.panel_extent, self.header_size, self.footer_size);
    }
}
