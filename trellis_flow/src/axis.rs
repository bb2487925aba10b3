// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Orientation and major/minor axis accessors.

use kurbo::{Point, Rect, Size, Vec2};

/// The direction items advance within a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    /// Items advance left-to-right; lines stack downward.
    Horizontal,
    /// Items advance top-to-bottom; lines stack rightward.
    Vertical,
}

impl Orientation {
    /// The scroll orientation implied by this item-flow orientation.
    ///
    /// Lines stack along the scroll axis, so the two are logical inverses:
    /// horizontally flowing items wrap into vertically stacked lines and
    /// scroll vertically, and vice versa.
    #[must_use]
    pub const fn scroll_orientation(self) -> ScrollOrientation {
        match self {
            Self::Horizontal => ScrollOrientation::Vertical,
            Self::Vertical => ScrollOrientation::Horizontal,
        }
    }

    /// The index progression direction, for index-based navigation consumers.
    #[must_use]
    pub const fn index_based_layout_orientation(self) -> IndexBasedLayoutOrientation {
        match self {
            Self::Horizontal => IndexBasedLayoutOrientation::LeftToRight,
            Self::Vertical => IndexBasedLayoutOrientation::TopToBottom,
        }
    }
}

/// How consecutive indices progress visually.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexBasedLayoutOrientation {
    /// Index `i + 1` is to the right of (or wraps below) index `i`.
    LeftToRight,
    /// Index `i + 1` is below (or wraps right of) index `i`.
    TopToBottom,
}

/// The axis along which lines stack and content scrolls (the major axis).
///
/// The minor axis is the cross axis along which items within a line are
/// placed. All layout math in this workspace goes through these accessors so
/// the same algorithm serves both orientations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollOrientation {
    /// Content scrolls vertically; lines are rows.
    Vertical,
    /// Content scrolls horizontally; lines are columns.
    Horizontal,
}

impl ScrollOrientation {
    /// Major-axis component of `size`.
    #[must_use]
    pub const fn major(self, size: Size) -> f64 {
        match self {
            Self::Vertical => size.height,
            Self::Horizontal => size.width,
        }
    }

    /// Minor-axis component of `size`.
    #[must_use]
    pub const fn minor(self, size: Size) -> f64 {
        match self {
            Self::Vertical => size.width,
            Self::Horizontal => size.height,
        }
    }

    /// Builds a [`Size`] from major/minor components.
    #[must_use]
    pub const fn size(self, major: f64, minor: f64) -> Size {
        match self {
            Self::Vertical => Size::new(minor, major),
            Self::Horizontal => Size::new(major, minor),
        }
    }

    /// Builds a [`Point`] from major/minor components.
    #[must_use]
    pub const fn point(self, major: f64, minor: f64) -> Point {
        match self {
            Self::Vertical => Point::new(minor, major),
            Self::Horizontal => Point::new(major, minor),
        }
    }

    /// Builds a [`Rect`] from a major/minor origin and extents.
    #[must_use]
    pub fn rect(self, major_origin: f64, minor_origin: f64, major: f64, minor: f64) -> Rect {
        Rect::from_origin_size(
            self.point(major_origin, minor_origin),
            self.size(major, minor),
        )
    }

    /// Major-axis origin of `rect`.
    #[must_use]
    pub const fn major_origin(self, rect: Rect) -> f64 {
        match self {
            Self::Vertical => rect.y0,
            Self::Horizontal => rect.x0,
        }
    }

    /// Major-axis end of `rect`.
    #[must_use]
    pub const fn major_end(self, rect: Rect) -> f64 {
        match self {
            Self::Vertical => rect.y1,
            Self::Horizontal => rect.x1,
        }
    }

    /// Minor-axis origin of `rect`.
    #[must_use]
    pub const fn minor_origin(self, rect: Rect) -> f64 {
        match self {
            Self::Vertical => rect.x0,
            Self::Horizontal => rect.y0,
        }
    }

    /// Minor-axis end of `rect`.
    #[must_use]
    pub const fn minor_end(self, rect: Rect) -> f64 {
        match self {
            Self::Vertical => rect.x1,
            Self::Horizontal => rect.y1,
        }
    }

    /// Major-axis extent of `rect`.
    #[must_use]
    pub fn major_extent(self, rect: Rect) -> f64 {
        self.major(rect.size())
    }

    /// Minor-axis extent of `rect`.
    #[must_use]
    pub fn minor_extent(self, rect: Rect) -> f64 {
        self.minor(rect.size())
    }

    /// Major-axis component of an offset vector.
    #[must_use]
    pub const fn major_component(self, v: Vec2) -> f64 {
        match self {
            Self::Vertical => v.y,
            Self::Horizontal => v.x,
        }
    }

    /// Returns `v` with its major-axis component replaced.
    #[must_use]
    pub const fn with_major(self, v: Vec2, major: f64) -> Vec2 {
        match self {
            Self::Vertical => Vec2::new(v.x, major),
            Self::Horizontal => Vec2::new(major, v.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Rect, Size};

    use super::{Orientation, ScrollOrientation};

    #[test]
    fn orientation_inverts_scroll_orientation() {
        assert_eq!(
            Orientation::Horizontal.scroll_orientation(),
            ScrollOrientation::Vertical
        );
        assert_eq!(
            Orientation::Vertical.scroll_orientation(),
            ScrollOrientation::Horizontal
        );
    }

    #[test]
    fn major_minor_roundtrip() {
        let size = Size::new(3.0, 7.0);
        for axis in [ScrollOrientation::Vertical, ScrollOrientation::Horizontal] {
            let rebuilt = axis.size(axis.major(size), axis.minor(size));
            assert_eq!(rebuilt, size);
        }

        let rect = ScrollOrientation::Vertical.rect(10.0, 2.0, 20.0, 5.0);
        assert_eq!(rect, Rect::new(2.0, 10.0, 7.0, 30.0));
        assert_eq!(ScrollOrientation::Vertical.major_origin(rect), 10.0);
        assert_eq!(ScrollOrientation::Vertical.minor_extent(rect), 5.0);
    }
}
