// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The incremental line-flowing algorithm.

use alloc::vec::Vec;
use core::ops::Range;

use kurbo::{Rect, Size};
use smallvec::SmallVec;
use trellis_items::{Container, ContainerPool, ItemSource, SourceChange};

use crate::ScrollOrientation;
use crate::flow_trace;

/// Where a measure pass starts realizing.
///
/// The index is always a line start; mid-line anchors would break the
/// invariant that every item in a line shares the same major-axis origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowAnchor {
    /// First index to realize.
    pub index: usize,
    /// Major-axis origin of the anchor's line, in content coordinates.
    pub major_offset: f64,
}

/// Minor-axis distribution of a line's leftover space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineJustification {
    /// Pack items at the line start.
    #[default]
    Start,
    /// Center the items within the line.
    Center,
    /// Pack items at the line end.
    End,
    /// Equal space around every item (half-size space at the line edges).
    SpaceAround,
    /// Equal space between items, none at the line edges.
    SpaceBetween,
    /// Equal space between items and at both line edges.
    SpaceEvenly,
}

/// The callbacks a layout supplies to drive [`FlowLayout`].
///
/// Implementations are expected to be cheap, side-effect-free views over
/// already-resolved state (item sizes, items-per-line); the algorithm calls
/// them freely during a pass.
pub trait FlowDelegate {
    /// The major (scroll) axis.
    fn scroll_orientation(&self) -> ScrollOrientation;

    /// Constraint used to measure the item at `index`.
    fn measure_size(&self, index: usize, available: Size) -> Size;

    /// Size used to place the item, given its measured size.
    fn arrange_size(&self, index: usize, measured: Size) -> Size {
        measured
    }

    /// Whether the item at `index` must start a new line.
    ///
    /// `remaining_minor` is the minor-axis space left in the current line if
    /// the item were placed on it (spacing included); a negative value means
    /// the item does not fit.
    fn should_break_line(&self, index: usize, remaining_minor: f64) -> bool;

    /// The anchor for a realization rect: the first index of the first line
    /// that intersects it, plus that line's major-axis origin.
    fn anchor_for_realization_rect(&self, realization_rect: Rect, item_count: usize) -> FlowAnchor;

    /// First index of the line containing `target`.
    fn anchor_index_for_target(&self, target: usize, item_count: usize) -> usize;

    /// Estimated total extent, given the realized first/last items when any
    /// are realized. Items outside the realized window contribute through
    /// this estimate only.
    fn extent(
        &self,
        item_count: usize,
        available: Size,
        first_realized: Option<(usize, Rect)>,
        last_realized: Option<(usize, Rect)>,
    ) -> Rect;

    /// Minor-axis spacing between items within a line.
    fn min_item_spacing(&self) -> f64 {
        0.0
    }

    /// Major-axis spacing between lines.
    fn line_spacing(&self) -> f64 {
        0.0
    }

    /// Minor-axis distribution applied during arrange.
    fn line_justification(&self) -> LineJustification {
        LineJustification::Start
    }
}

/// Incremental flow layout over a realized window of items.
///
/// The algorithm keeps the realized window (first index plus per-item bounds
/// in content coordinates) and the most recent extent estimate. Each measure
/// pass resolves an anchor from the realization rect, walks forward measuring
/// and placing items until a new line would start past the rect, recycles
/// containers that left the window, and refreshes the extent estimate so
/// hosts can scroll before every item has ever been realized.
#[derive(Debug, Default)]
pub struct FlowLayout {
    first_index: usize,
    bounds: Vec<Rect>,
    last_extent: Rect,
}

impl FlowLayout {
    /// Creates an empty flow layout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The realized index window `[start, end)`.
    #[must_use]
    pub fn realized_range(&self) -> Range<usize> {
        self.first_index..self.first_index + self.bounds.len()
    }

    /// Measure-space bounds of a realized item.
    ///
    /// Arrange-time justification is not reflected here.
    #[must_use]
    pub fn bounds_of(&self, index: usize) -> Option<Rect> {
        index
            .checked_sub(self.first_index)
            .and_then(|offset| self.bounds.get(offset))
            .copied()
    }

    /// The most recent extent estimate.
    #[must_use]
    pub const fn last_extent(&self) -> Rect {
        self.last_extent
    }

    /// Runs a measure pass.
    ///
    /// Realizes and measures the items the realization rect needs, recycles
    /// containers that left the window, and returns the estimated total
    /// extent as the desired size.
    pub fn measure<S, C, D>(
        &mut self,
        source: &S,
        pool: &mut ContainerPool<C>,
        delegate: &D,
        make: &mut dyn FnMut(usize) -> C,
        available: Size,
        realization_rect: Rect,
    ) -> Size
    where
        S: ItemSource,
        C: Container,
        D: FlowDelegate,
    {
        let count = source.len();
        if count == 0 {
            self.clear_window(pool);
            self.first_index = 0;
            self.last_extent = Rect::ZERO;
            return Size::ZERO;
        }

        let axis = delegate.scroll_orientation();
        let spacing = delegate.min_item_spacing();
        let line_spacing = delegate.line_spacing();
        let available_minor = axis.minor(available);
        let realization_end = axis.major_end(realization_rect);

        let mut anchor = delegate.anchor_for_realization_rect(realization_rect, count);
        anchor.index = anchor.index.min(count - 1);

        let old_start = self.first_index;
        let old_end = self.first_index + self.bounds.len();

        let mut new_bounds: Vec<Rect> = Vec::new();
        let mut line_major = anchor.major_offset;
        let mut line_major_size = 0.0_f64;
        let mut minor_used = 0.0_f64;
        let mut line_start = anchor.index;

        let mut index = anchor.index;
        while index < count {
            let id = pool.materialize_with(index, || make(index));
            let constraint = delegate.measure_size(index, available);
            let measured = match pool.get_mut(id) {
                Some(container) => container.measure(constraint),
                None => Size::ZERO,
            };
            let arrange_size = delegate.arrange_size(index, measured);
            let item_minor = axis.minor(arrange_size);
            let item_major = axis.major(arrange_size);

            if index > line_start {
                let remaining = available_minor - (minor_used + spacing + item_minor);
                if delegate.should_break_line(index, remaining) {
                    line_major += line_major_size + line_spacing;
                    line_major_size = 0.0;
                    minor_used = 0.0;
                    line_start = index;
                    if line_major >= realization_end {
                        // The new line starts past the realization rect; this
                        // item stays unrealized.
                        pool.dematerialize(index, 1);
                        break;
                    }
                }
            }

            let minor_origin = if index == line_start {
                0.0
            } else {
                minor_used + spacing
            };
            new_bounds.push(axis.rect(line_major, minor_origin, item_major, item_minor));
            minor_used = minor_origin + item_minor;
            line_major_size = line_major_size.max(item_major);
            index += 1;
        }

        let new_start = anchor.index;
        let new_end = anchor.index + new_bounds.len();

        // Recycle whatever fell out of the window.
        if old_start < new_start {
            let end = old_end.min(new_start);
            if end > old_start {
                pool.dematerialize(old_start, end - old_start);
            }
        }
        if old_end > new_end {
            let start = old_start.max(new_end);
            pool.dematerialize(start, old_end - start);
        }

        self.first_index = new_start;
        self.bounds = new_bounds;

        let first = self.bounds.first().map(|b| (new_start, *b));
        let last = self.bounds.last().map(|b| (new_end - 1, *b));
        self.last_extent = delegate.extent(count, available, first, last);
        flow_trace!(
            "flow window {}..{} extent {:?}",
            new_start,
            new_end,
            self.last_extent
        );

        self.last_extent.size()
    }

    /// Runs an arrange pass, applying per-line justification and placing the
    /// realized containers.
    pub fn arrange<C, D>(
        &mut self,
        pool: &mut ContainerPool<C>,
        delegate: &D,
        final_size: Size,
    ) -> Size
    where
        C: Container,
        D: FlowDelegate,
    {
        let axis = delegate.scroll_orientation();
        let justification = delegate.line_justification();
        let available_minor = axis.minor(final_size);

        // Lines are runs of realized items sharing a major-axis origin.
        let mut runs: SmallVec<[(usize, usize); 8]> = SmallVec::new();
        let mut i = 0;
        while i < self.bounds.len() {
            let major = axis.major_origin(self.bounds[i]);
            let mut j = i + 1;
            while j < self.bounds.len() && axis.major_origin(self.bounds[j]) == major {
                j += 1;
            }
            runs.push((i, j));
            i = j;
        }

        for (start, end) in runs {
            let used =
                axis.minor_end(self.bounds[end - 1]) - axis.minor_origin(self.bounds[start]);
            let leftover = if available_minor.is_finite() {
                (available_minor - used).max(0.0)
            } else {
                0.0
            };
            let n = (end - start) as f64;
            let (lead, gap) = match justification {
                LineJustification::Start => (0.0, 0.0),
                LineJustification::Center => (leftover / 2.0, 0.0),
                LineJustification::End => (leftover, 0.0),
                LineJustification::SpaceBetween => {
                    let gap = if end - start > 1 {
                        leftover / (n - 1.0)
                    } else {
                        0.0
                    };
                    (0.0, gap)
                }
                LineJustification::SpaceAround => (leftover / (2.0 * n), leftover / n),
                LineJustification::SpaceEvenly => (leftover / (n + 1.0), leftover / (n + 1.0)),
            };
            for (k, offset) in (start..end).enumerate() {
                let b = self.bounds[offset];
                let shift = lead + gap * k as f64;
                let placed = axis.rect(
                    axis.major_origin(b),
                    axis.minor_origin(b) + shift,
                    axis.major_extent(b),
                    axis.minor_extent(b),
                );
                if let Some(id) = pool.container_from_index(self.first_index + offset)
                    && let Some(container) = pool.get_mut(id)
                {
                    container.arrange(placed);
                }
            }
        }

        final_size
    }

    /// Repairs the realized window after a source change.
    ///
    /// Index-keyed cached state is suspect after a change: pure before-window
    /// inserts/removals shift the window, anything touching the window
    /// recycles it wholesale, and a reset clears the pool too. The extent
    /// estimate is left in place until the next measure recomputes it.
    pub fn on_items_changed<C>(&mut self, pool: &mut ContainerPool<C>, change: SourceChange) {
        let window_start = self.first_index;
        let window_end = self.first_index + self.bounds.len();
        match change {
            SourceChange::Added { index, count } => {
                if index <= window_start {
                    self.first_index += count;
                } else if index < window_end {
                    self.clear_window(pool);
                }
                pool.insert_space(index, count);
            }
            SourceChange::Removed { index, count } => {
                if index + count <= window_start {
                    self.first_index -= count;
                } else if index < window_end {
                    self.clear_window(pool);
                }
                pool.remove_range(index, count);
            }
            SourceChange::Replaced {
                index,
                old_count,
                new_count,
            } => {
                if index + old_count <= window_start {
                    self.first_index = self.first_index + new_count - old_count;
                } else if index < window_end {
                    self.clear_window(pool);
                }
                pool.remove_range(index, old_count);
                pool.insert_space(index, new_count);
            }
            SourceChange::Moved {
                old_index,
                count,
                new_index,
            } => {
                // A move invalidates both ends; rebuild the window next pass.
                self.clear_window(pool);
                pool.remove_range(old_index, count);
                pool.insert_space(new_index, count);
            }
            SourceChange::Reset => {
                self.bounds.clear();
                self.first_index = 0;
                pool.clear();
            }
        }
    }

    fn clear_window<C>(&mut self, pool: &mut ContainerPool<C>) {
        if !self.bounds.is_empty() {
            pool.dematerialize(self.first_index, self.bounds.len());
            self.bounds.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use kurbo::{Rect, Size};
    use trellis_items::{ContainerPool, SizedContainer, SourceChange, VecSource};

    use super::{FlowAnchor, FlowDelegate, FlowLayout, LineJustification};
    use crate::ScrollOrientation;

    /// Test-local floor (`f64::floor` lives in `std`).
    fn floor(x: f64) -> f64 {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Test values stay within index-scale ranges"
        )]
        let truncated = x as i64 as f64;
        if x < truncated { truncated - 1.0 } else { truncated }
    }

    /// Uniform 10x10 cells flowing horizontally (vertical scroll).
    struct UniformDelegate {
        items_per_line: usize,
        justification: LineJustification,
    }

    impl UniformDelegate {
        fn new(items_per_line: usize) -> Self {
            Self {
                items_per_line,
                justification: LineJustification::Start,
            }
        }

        const ITEM: Size = Size::new(10.0, 10.0);
    }

    impl FlowDelegate for UniformDelegate {
        fn scroll_orientation(&self) -> ScrollOrientation {
            ScrollOrientation::Vertical
        }

        fn measure_size(&self, _index: usize, _available: Size) -> Size {
            Self::ITEM
        }

        fn should_break_line(&self, index: usize, remaining_minor: f64) -> bool {
            remaining_minor < 0.0 || index % self.items_per_line == 0
        }

        fn anchor_for_realization_rect(
            &self,
            realization_rect: Rect,
            item_count: usize,
        ) -> FlowAnchor {
            let axis = self.scroll_orientation();
            let line_major = axis.major(Self::ITEM);
            let line = floor(axis.major_origin(realization_rect).max(0.0) / line_major);
            let last_line_start = (item_count - 1) / self.items_per_line * self.items_per_line;
            let index = ((line as usize) * self.items_per_line).min(last_line_start);
            FlowAnchor {
                index,
                major_offset: (index / self.items_per_line) as f64 * line_major,
            }
        }

        fn anchor_index_for_target(&self, target: usize, item_count: usize) -> usize {
            target.min(item_count - 1) / self.items_per_line * self.items_per_line
        }

        fn extent(
            &self,
            item_count: usize,
            _available: Size,
            _first_realized: Option<(usize, Rect)>,
            _last_realized: Option<(usize, Rect)>,
        ) -> Rect {
            let axis = self.scroll_orientation();
            let lines = item_count.div_ceil(self.items_per_line);
            axis.rect(
                0.0,
                0.0,
                lines as f64 * axis.major(Self::ITEM),
                self.items_per_line.min(item_count) as f64 * axis.minor(Self::ITEM),
            )
        }

        fn line_justification(&self) -> LineJustification {
            self.justification
        }
    }

    fn cell(_index: usize) -> SizedContainer {
        SizedContainer::new(UniformDelegate::ITEM)
    }

    #[test]
    fn empty_source_yields_zero_extent() {
        let source = VecSource::<u32>::new(vec![]);
        let mut pool = ContainerPool::new();
        let mut flow = FlowLayout::new();
        let delegate = UniformDelegate::new(4);

        let desired = flow.measure(
            &source,
            &mut pool,
            &delegate,
            &mut cell,
            Size::new(40.0, 30.0),
            Rect::new(0.0, 0.0, 40.0, 30.0),
        );
        assert_eq!(desired, Size::ZERO);
        assert_eq!(pool.realized_count(), 0);
        assert!(flow.realized_range().is_empty());
    }

    #[test]
    fn realizes_only_the_viewport_window() {
        let source = VecSource::new((0..100).collect());
        let mut pool = ContainerPool::new();
        let mut flow = FlowLayout::new();
        let delegate = UniformDelegate::new(4);

        let desired = flow.measure(
            &source,
            &mut pool,
            &delegate,
            &mut cell,
            Size::new(40.0, 30.0),
            Rect::new(0.0, 0.0, 40.0, 30.0),
        );

        // Three 10-unit lines intersect a 30-unit viewport.
        assert_eq!(flow.realized_range(), 0..12);
        assert_eq!(pool.realized_count(), 12);
        // 100 items over 4 per line: 25 lines of 10, 40 wide.
        assert_eq!(desired, Size::new(40.0, 250.0));

        assert_eq!(flow.bounds_of(0), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert_eq!(flow.bounds_of(5), Some(Rect::new(10.0, 10.0, 20.0, 20.0)));
    }

    #[test]
    fn scrolling_shifts_the_window_and_recycles() {
        let source = VecSource::new((0..100).collect());
        let mut pool = ContainerPool::new();
        let mut flow = FlowLayout::new();
        let delegate = UniformDelegate::new(4);
        let available = Size::new(40.0, 30.0);

        flow.measure(
            &source,
            &mut pool,
            &delegate,
            &mut cell,
            available,
            Rect::new(0.0, 0.0, 40.0, 30.0),
        );
        assert_eq!(flow.realized_range(), 0..12);

        flow.measure(
            &source,
            &mut pool,
            &delegate,
            &mut cell,
            available,
            Rect::new(0.0, 100.0, 40.0, 130.0),
        );
        assert_eq!(flow.realized_range(), 40..52);
        assert_eq!(pool.realized_count(), 12);
        assert_eq!(pool.container_from_index(0), None);
        assert_eq!(
            flow.bounds_of(40),
            Some(Rect::new(0.0, 100.0, 10.0, 110.0))
        );
    }

    #[test]
    fn arrange_applies_space_between() {
        let source = VecSource::new((0..4).collect());
        let mut pool = ContainerPool::new();
        let mut flow = FlowLayout::new();
        let mut delegate = UniformDelegate::new(2);
        delegate.justification = LineJustification::SpaceBetween;

        let final_size = Size::new(30.0, 20.0);
        flow.measure(
            &source,
            &mut pool,
            &delegate,
            &mut cell,
            final_size,
            Rect::new(0.0, 0.0, 30.0, 20.0),
        );
        flow.arrange(&mut pool, &delegate, final_size);

        // 30 available, 20 used: the second item of each line shifts by 10.
        let first = pool.container_from_index(0).and_then(|id| pool.get(id));
        assert_eq!(
            first.and_then(SizedContainer::arranged),
            Some(Rect::new(0.0, 0.0, 10.0, 10.0))
        );
        let second = pool.container_from_index(1).and_then(|id| pool.get(id));
        assert_eq!(
            second.and_then(SizedContainer::arranged),
            Some(Rect::new(20.0, 0.0, 30.0, 10.0))
        );
    }

    #[test]
    fn before_window_changes_shift_the_window() {
        let source = VecSource::new((0..100).collect());
        let mut pool = ContainerPool::new();
        let mut flow = FlowLayout::new();
        let delegate = UniformDelegate::new(4);
        let available = Size::new(40.0, 30.0);

        flow.measure(
            &source,
            &mut pool,
            &delegate,
            &mut cell,
            available,
            Rect::new(0.0, 100.0, 40.0, 130.0),
        );
        assert_eq!(flow.realized_range(), 40..52);

        flow.on_items_changed(&mut pool, SourceChange::Added { index: 0, count: 4 });
        assert_eq!(flow.realized_range(), 44..56);
        // The bindings moved with the items.
        assert_eq!(pool.container_from_index(40), None);
        assert!(pool.container_from_index(44).is_some());

        flow.on_items_changed(
            &mut pool,
            SourceChange::Removed { index: 0, count: 4 },
        );
        assert_eq!(flow.realized_range(), 40..52);
    }

    #[test]
    fn reset_clears_window_and_pool() {
        let source = VecSource::new((0..100).collect());
        let mut pool = ContainerPool::new();
        let mut flow = FlowLayout::new();
        let delegate = UniformDelegate::new(4);

        flow.measure(
            &source,
            &mut pool,
            &delegate,
            &mut cell,
            Size::new(40.0, 30.0),
            Rect::new(0.0, 0.0, 40.0, 30.0),
        );
        assert_ne!(pool.realized_count(), 0);

        flow.on_items_changed(&mut pool, SourceChange::Reset);
        assert!(flow.realized_range().is_empty());
        assert_eq!(pool.realized_count(), 0);
        assert_eq!(pool.pooled_count(), 0);
    }
}
