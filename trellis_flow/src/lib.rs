// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Flow: the incremental line-flowing layout core.
//!
//! This crate provides the generic machinery shared by the Trellis layouts:
//!
//! - [`Orientation`] / [`ScrollOrientation`]: major/minor axis accessors over
//!   kurbo geometry. Lines stack along the major (scroll) axis; items advance
//!   along the minor axis within a line.
//! - [`LayoutState`] and [`LayoutContext`]: per-panel persistent layout state
//!   and the borrowed collaborators (source, container pool, viewport,
//!   container factory) a layout sees during a pass.
//! - [`Layout`]: the contract between a host panel and a virtualizing layout
//!   (initialize/uninitialize, measure, arrange, items-changed).
//! - [`FlowLayout`] with [`FlowDelegate`]: the incremental flow algorithm
//!   itself. Given an anchor, it walks forward realizing and measuring items,
//!   breaks lines via the delegate, recycles containers that left the window,
//!   and keeps a total-extent estimate so hosts can scroll before every item
//!   is realized.
//! - [`ScrollAlign`]: alignment modes for bringing an item into view.
//!
//! Hosts drive the cycle: a viewport change invalidates measure; measure
//! resolves an anchor and re-realizes the window; arrange places the realized
//! containers with per-line justification; the extent is reported upward for
//! scrollbar and offset math.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod algorithm;
mod axis;
mod context;
mod scroll;
mod trace;

pub(crate) use trace::flow_trace;

pub use algorithm::{FlowAnchor, FlowDelegate, FlowLayout, LineJustification};
pub use axis::{IndexBasedLayoutOrientation, Orientation, ScrollOrientation};
pub use context::{Layout, LayoutContext, LayoutState};
pub use scroll::{ScrollAlign, aligned_offset};
