// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scroll alignment for bring-into-view requests.

/// Alignment mode when scrolling a specific item into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAlign {
    /// Align the start (top/leading edge) of the item with the viewport.
    Start,
    /// Center the item within the viewport.
    Center,
    /// Align the end (bottom/trailing edge) of the item with the viewport.
    End,
    /// Move just enough to make the item fully visible, preferring the
    /// smallest change from the current scroll offset.
    Nearest,
}

/// Returns the major-axis scroll offset that brings an item into view.
///
/// - `item_origin`/`item_extent` describe the item along the major axis, in
///   content coordinates.
/// - `viewport_extent` is the viewport's major-axis size.
/// - `current` is the current scroll offset, consulted by
///   [`ScrollAlign::Nearest`].
///
/// The result is clamped to be non-negative; callers clamp against the
/// content extent themselves since they know it.
#[must_use]
pub fn aligned_offset(
    align: ScrollAlign,
    item_origin: f64,
    item_extent: f64,
    viewport_extent: f64,
    current: f64,
) -> f64 {
    let item_end = item_origin + item_extent;
    let offset = match align {
        ScrollAlign::Start => item_origin,
        ScrollAlign::End => item_end - viewport_extent,
        ScrollAlign::Center => item_origin + item_extent / 2.0 - viewport_extent / 2.0,
        ScrollAlign::Nearest => {
            let view_start = current;
            let view_end = current + viewport_extent;
            if item_origin >= view_start && item_end <= view_end {
                // Already fully visible; keep the current offset.
                current
            } else if item_origin < view_start {
                item_origin
            } else {
                item_end - viewport_extent
            }
        }
    };
    offset.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::{ScrollAlign, aligned_offset};

    #[test]
    fn alignment_offsets() {
        // Item 3 of a 10-unit strip, viewport of 30.
        let (origin, extent, viewport) = (30.0, 10.0, 30.0);
        assert_eq!(
            aligned_offset(ScrollAlign::Start, origin, extent, viewport, 0.0),
            30.0
        );
        assert_eq!(
            aligned_offset(ScrollAlign::End, origin, extent, viewport, 0.0),
            10.0
        );
        assert_eq!(
            aligned_offset(ScrollAlign::Center, origin, extent, viewport, 0.0),
            20.0
        );
    }

    #[test]
    fn nearest_moves_minimally() {
        // Fully visible: no movement.
        assert_eq!(
            aligned_offset(ScrollAlign::Nearest, 30.0, 10.0, 30.0, 20.0),
            20.0
        );
        // Above the viewport: align start.
        assert_eq!(
            aligned_offset(ScrollAlign::Nearest, 10.0, 10.0, 30.0, 25.0),
            10.0
        );
        // Below the viewport: align end.
        assert_eq!(
            aligned_offset(ScrollAlign::Nearest, 60.0, 10.0, 30.0, 0.0),
            40.0
        );
    }

    #[test]
    fn offsets_never_go_negative() {
        assert_eq!(
            aligned_offset(ScrollAlign::End, 0.0, 10.0, 30.0, 5.0),
            0.0
        );
    }
}
