// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Items: item sources and container realization for layout virtualization.
//!
//! This crate provides the data-side collaborators that the Trellis layout
//! crates consume: an ordered item source with change notifications and
//! optional grouping, and a container generator that realizes, recycles, and
//! re-indexes the visual containers bound to item indices.
//!
//! The core concepts are:
//!
//! - [`ItemSource`]: an ordered sequence of items with a length and optional
//!   [`GroupMap`] grouping. Layouts never read item values; they only count
//!   and realize.
//! - [`SourceChange`]: add/remove/replace/move/reset notifications delivered
//!   by the host, in order, before the next measure pass observes the source.
//! - [`Container`]: the narrow view of a realized visual container that
//!   layout needs: measure, desired size, arrange, visibility.
//! - [`ContainerPool`]: maps `index -> container` with generational
//!   [`ContainerId`] handles, a bounded recycle list, and index bookkeeping
//!   operations (`insert_space`, `remove_range`) for live collection
//!   mutation.
//! - [`VecSource`] and [`SizedContainer`]: ready-to-use implementations for
//!   hosts and tests.
//!
//! This crate deliberately does **not** know about widgets or any particular
//! UI framework. Host frameworks own the actual widget instances and
//! implement [`Container`] for whatever type they realize.
//!
//! ## Minimal example
//!
//! ```rust
//! use kurbo::Size;
//! use trellis_items::{ContainerPool, SizedContainer};
//!
//! let mut pool = ContainerPool::new();
//! let id = pool.materialize_with(0, || SizedContainer::new(Size::new(50.0, 50.0)));
//! assert_eq!(pool.index_from_container(id), Some(0));
//!
//! // Recycle, then re-bind: the pooled container is reused for the new index.
//! pool.dematerialize(0, 1);
//! let reused = pool.materialize_with(3, || SizedContainer::new(Size::ZERO));
//! assert_eq!(reused, id);
//! assert_eq!(pool.index_from_container(reused), Some(3));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod pool;
mod source;

pub use pool::{Container, ContainerId, ContainerPool, DEFAULT_RECYCLE_CAP, SizedContainer};
pub use source::{GroupMap, ItemSource, SourceChange, VecSource};
