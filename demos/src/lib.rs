// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared helpers for the Trellis demo examples.

use kurbo::{Rect, Size};
use trellis_items::Container;

/// A demo container that remembers its label and arranged bounds.
///
/// Stands in for a host framework's widget: it has a fixed desired size and
/// records where the layout placed it.
#[derive(Debug, Clone)]
pub struct LabelCell {
    label: String,
    size: Size,
    bounds: Option<Rect>,
}

impl LabelCell {
    /// Creates a cell with a label and fixed desired size.
    #[must_use]
    pub fn new(label: impl Into<String>, size: Size) -> Self {
        Self {
            label: label.into(),
            size,
            bounds: None,
        }
    }

    /// The cell's label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Where the last arrange pass placed this cell, if it has been arranged.
    #[must_use]
    pub const fn bounds(&self) -> Option<Rect> {
        self.bounds
    }
}

impl Container for LabelCell {
    fn measure(&mut self, _available: Size) -> Size {
        self.size
    }

    fn desired_size(&self) -> Size {
        self.size
    }

    fn arrange(&mut self, bounds: Rect) {
        self.bounds = Some(bounds);
    }
}
