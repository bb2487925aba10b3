// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-context state: cell size resolution and stretch arithmetic.

use kurbo::Size;
use trellis_flow::FlowLayout;
use trellis_items::{Container, ContainerPool, ItemSource};

use crate::{ItemsStretch, UniformGridLayout};

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

/// Number of items placed along the minor axis before wrapping.
///
/// Always at least 1 (a too-narrow viewport degrades the layout instead of
/// dividing by zero), and capped at `max_items_per_line` when that is > 0.
/// An unconstrained (infinite) minor axis places everything on one line.
#[must_use]
pub fn items_per_line(
    available_minor: f64,
    item_minor: f64,
    minor_spacing: f64,
    max_items_per_line: usize,
) -> usize {
    let per_item = item_minor + minor_spacing;
    let fits = if available_minor.is_finite() && per_item > 0.0 {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "The ratio is non-negative and saturates at usize::MAX"
        )]
        let fits = floor(available_minor / per_item).max(0.0) as usize;
        fits
    } else {
        usize::MAX
    };
    let fits = fits.max(1);
    if max_items_per_line > 0 {
        fits.min(max_items_per_line)
    } else {
        fits
    }
}

/// Extra whole pixels available per item in a line, for stretch distribution.
///
/// Computes how many items fit (`max(1, floor(available / (item + spacing)))`,
/// capped at `max_items_per_line` when that is > 0), how much space they use
/// (`items * (item + spacing) - spacing`), and returns
/// `floor((available - used) / items)`. Whole-pixel truncation keeps the
/// layout pixel-stable; fractional distribution would drift.
#[must_use]
pub fn extra_pixels_in_line(
    max_items_per_line: usize,
    available_minor: f64,
    item_minor: f64,
    minor_spacing: f64,
) -> f64 {
    if !available_minor.is_finite() {
        return 0.0;
    }
    let per_item = item_minor + minor_spacing;
    let mut items = if per_item > 0.0 {
        floor(available_minor / per_item).max(1.0)
    } else {
        1.0
    };
    if max_items_per_line > 0 {
        items = items.min(max_items_per_line as f64);
    }
    let used = items * per_item - minor_spacing;
    floor((available_minor - used) / items)
}

/// Applies a stretch policy to a base cell size.
///
/// Returns the effective `(major, minor)` cell size given the extra
/// minor-axis pixels available per item:
///
/// - [`ItemsStretch::None`]: unchanged.
/// - [`ItemsStretch::Fill`]: the extra pixels widen the minor axis only.
/// - [`ItemsStretch::Uniform`]: the major axis additionally scales by
///   `extra / minor`, preserving the cell's aspect ratio.
#[must_use]
pub fn apply_stretch(
    stretch: ItemsStretch,
    base_major: f64,
    base_minor: f64,
    extra_minor: f64,
) -> (f64, f64) {
    match stretch {
        ItemsStretch::None => (base_major, base_minor),
        ItemsStretch::Fill => (base_major, base_minor + extra_minor),
        ItemsStretch::Uniform => {
            let major = if base_minor > 0.0 {
                base_major + base_major * (extra_minor / base_minor)
            } else {
                base_major
            };
            (major, base_minor + extra_minor)
        }
    }
}

/// Per-context state for [`UniformGridLayout`].
///
/// Owns the flow algorithm instance and the resolved cell size. The raw
/// item-0 measurement is expensive to obtain (it may require realizing the
/// item), so it is guarded by a one-shot validity flag that only explicit
/// triggers reset: a source reset, a change touching item 0, or a
/// size-affecting property change. The probe itself never clears the flag,
/// and the probe container never enters the pool; both are required to keep
/// the measurement from feeding back into the realize/recycle cycle and
/// re-invalidating layout forever.
#[derive(Debug, Default)]
pub struct UniformGridLayoutState {
    pub(crate) flow: FlowLayout,
    raw_item_size: Option<Size>,
    size_valid: bool,
    effective_item_size: Size,
    items_per_line: usize,
    seen_generation: u64,
}

impl UniformGridLayoutState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The resolved, stretch-adjusted cell size from the last measure.
    #[must_use]
    pub const fn effective_item_size(&self) -> Size {
        self.effective_item_size
    }

    /// The resolved items-per-line from the last measure. Always ≥ 1.
    #[must_use]
    pub fn items_per_line(&self) -> usize {
        self.items_per_line.max(1)
    }

    /// Whether the cached item-0 measurement is current.
    #[must_use]
    pub const fn is_effective_size_valid(&self) -> bool {
        self.size_valid
    }

    /// The realized index window from the last measure. Hosts diff this
    /// against their child list to create and destroy views.
    #[must_use]
    pub fn realized_range(&self) -> core::ops::Range<usize> {
        self.flow.realized_range()
    }

    /// Measure-space bounds of a realized item.
    #[must_use]
    pub fn bounds_of(&self, index: usize) -> Option<kurbo::Rect> {
        self.flow.bounds_of(index)
    }

    /// Forgets the cached item-0 measurement.
    pub(crate) fn invalidate_item_size(&mut self) {
        self.size_valid = false;
    }

    /// Resolves the effective cell size and items-per-line for this pass.
    pub(crate) fn resolve<S, C>(
        &mut self,
        grid: &UniformGridLayout,
        source: &S,
        pool: &mut ContainerPool<C>,
        make: &mut dyn FnMut(usize) -> C,
        available: Size,
    ) where
        S: ItemSource,
        C: Container,
    {
        if self.seen_generation != grid.generation() {
            self.size_valid = false;
            self.seen_generation = grid.generation();
        }
        if !self.size_valid {
            self.raw_item_size = Self::probe_item_size(grid, source, pool, make, available);
            self.size_valid = true;
        }

        let axis = grid.orientation().scroll_orientation();
        let raw = self.raw_item_size.unwrap_or(Size::ZERO);
        let base_major = grid.explicit_major_item_size().unwrap_or(axis.major(raw));
        let base_minor = grid.explicit_minor_item_size().unwrap_or(axis.minor(raw));
        let minor_spacing = grid.minor_item_spacing();
        let available_minor = axis.minor(available);
        let max_items = grid.maximum_rows_or_columns();

        let extra = match grid.items_stretch() {
            ItemsStretch::None => 0.0,
            ItemsStretch::Fill | ItemsStretch::Uniform => {
                extra_pixels_in_line(max_items, available_minor, base_minor, minor_spacing)
            }
        };
        let (major, minor) = apply_stretch(grid.items_stretch(), base_major, base_minor, extra);
        self.effective_item_size = axis.size(major, minor);
        self.items_per_line = items_per_line(available_minor, base_minor, minor_spacing, max_items);
    }

    /// Measures item 0 without disturbing the realized set.
    ///
    /// When item 0 is already realized it is measured in place. Otherwise a
    /// throwaway container is built and measured as a side channel. It never
    /// enters the pool, so no recycle traffic results from the probe.
    fn probe_item_size<S, C>(
        grid: &UniformGridLayout,
        source: &S,
        pool: &mut ContainerPool<C>,
        make: &mut dyn FnMut(usize) -> C,
        available: Size,
    ) -> Option<Size>
    where
        S: ItemSource,
        C: Container,
    {
        if source.is_empty() {
            return None;
        }
        let constraint = grid.probe_constraint(available);
        if let Some(id) = pool.container_from_index(0) {
            return pool.get_mut(id).map(|container| container.measure(constraint));
        }
        let mut probe = make(0);
        Some(probe.measure(constraint))
    }
}

#[cfg(test)]
mod tests {
    use super::{ItemsStretch, apply_stretch, extra_pixels_in_line, items_per_line};

    #[test]
    fn items_per_line_is_monotonic_and_clamped() {
        let mut previous = 0;
        for width in [0.0, 49.0, 50.0, 149.0, 220.0, 500.0] {
            let items = items_per_line(width, 50.0, 0.0, 0);
            assert!(items >= 1, "always at least one item per line");
            assert!(items >= previous, "wider viewports never fit fewer items");
            previous = items;
        }

        assert_eq!(items_per_line(220.0, 50.0, 0.0, 0), 4);
        assert_eq!(items_per_line(220.0, 50.0, 0.0, 3), 3);
        assert_eq!(items_per_line(f64::INFINITY, 50.0, 0.0, 6), 6);
    }

    #[test]
    fn extra_pixels_match_truncating_division() {
        // 220 available, 4 items of 50: 20 left over, 5 whole pixels each.
        assert_eq!(extra_pixels_in_line(0, 220.0, 50.0, 0.0), 5.0);
        // 223 available: floor(23 / 4) = 5, the odd 3 pixels stay undistributed.
        assert_eq!(extra_pixels_in_line(0, 223.0, 50.0, 0.0), 5.0);
        // Spacing reduces the fit count: 3 items of 60 use 170, 20 each left.
        assert_eq!(extra_pixels_in_line(0, 230.0, 50.0, 10.0), 20.0);
    }

    #[test]
    fn exactly_divisible_line_distributes_nothing() {
        assert_eq!(extra_pixels_in_line(0, 200.0, 50.0, 0.0), 0.0);
        let (major, minor) = apply_stretch(ItemsStretch::Fill, 50.0, 50.0, 0.0);
        assert_eq!((major, minor), (50.0, 50.0));
    }

    #[test]
    fn fill_widens_minor_only() {
        let (major, minor) = apply_stretch(ItemsStretch::Fill, 30.0, 50.0, 5.0);
        assert_eq!(major, 30.0);
        assert_eq!(minor, 55.0);
    }

    #[test]
    fn uniform_preserves_aspect_ratio() {
        let (base_major, base_minor) = (30.0, 50.0);
        let (major, minor) = apply_stretch(ItemsStretch::Uniform, base_major, base_minor, 5.0);
        assert_eq!(minor, 55.0);
        let before = base_major / base_minor;
        let after = major / minor;
        assert!((before - after).abs() < 1e-12, "aspect ratio must not drift");
    }
}
