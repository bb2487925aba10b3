// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-context layout state and the layout/panel contract.

use alloc::boxed::Box;
use core::any::Any;

use kurbo::{Rect, Size};
use trellis_items::{Container, ContainerPool, ItemSource, SourceChange};

/// Per-panel persistent layout state.
///
/// A layout installs its own state type the first time it is initialized for
/// a context and retrieves it on every pass until the panel detaches. The
/// state survives measure passes; layouts invalidate its contents explicitly
/// (size-affecting property changes, source resets), never by recreating it.
///
/// Handing a context that was initialized by one layout to a different layout
/// is a configuration error: [`LayoutState::get_mut`] panics when the slot
/// holds a foreign type.
#[derive(Default)]
pub struct LayoutState {
    inner: Option<Box<dyn Any>>,
}

impl core::fmt::Debug for LayoutState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LayoutState")
            .field("initialized", &self.inner.is_some())
            .finish()
    }
}

impl LayoutState {
    /// Creates an empty state slot.
    #[must_use]
    pub const fn new() -> Self {
        Self { inner: None }
    }

    /// Returns `true` once a layout has installed its state.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.inner.is_some()
    }

    /// Installs `T` if the slot is empty, then returns it.
    ///
    /// # Panics
    ///
    /// Panics if the slot already holds a different state type.
    pub fn install<T: 'static>(&mut self, make: impl FnOnce() -> T) -> &mut T {
        if self.inner.is_none() {
            self.inner = Some(Box::new(make()));
        }
        self.get_mut()
    }

    /// Returns the installed state.
    ///
    /// # Panics
    ///
    /// Panics if no state is installed, or if the slot holds a foreign type
    /// (the context was initialized by a different layout).
    pub fn get_mut<T: 'static>(&mut self) -> &mut T {
        self.inner
            .as_mut()
            .expect("layout state accessed before initialize_for_context")
            .downcast_mut::<T>()
            .expect("layout state holds a foreign type; this context was initialized by a different layout")
    }

    /// Drops the installed state. Called when the panel detaches.
    pub fn clear(&mut self) {
        self.inner = None;
    }
}

/// The collaborators a layout sees during a pass.
///
/// All fields are host-owned and borrowed for the duration of one call; the
/// layout itself stays free of per-panel state so one layout instance can
/// serve many panels.
pub struct LayoutContext<'a, S, C> {
    /// The item source being laid out.
    pub source: &'a S,
    /// The container generator/recycler for item containers.
    pub pool: &'a mut ContainerPool<C>,
    /// Per-context layout state.
    pub state: &'a mut LayoutState,
    /// Current viewport in panel content coordinates.
    ///
    /// `None` until the host has laid the panel out once; measure is a no-op
    /// returning zero until a real viewport arrives, which keeps an off-screen
    /// panel from realizing its entire source.
    pub viewport: Option<Rect>,
    /// Factory realizing the container for an item index.
    pub make: &'a mut dyn FnMut(usize) -> C,
}

impl<S, C> core::fmt::Debug for LayoutContext<'_, S, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LayoutContext")
            .field("viewport", &self.viewport)
            .field("realized", &self.pool.realized_count())
            .finish_non_exhaustive()
    }
}

/// A virtualizing layout driven by a host panel.
pub trait Layout<S: ItemSource, C: Container> {
    /// Prepares per-context state. Must be called once before measuring.
    fn initialize_for_context(&self, ctx: &mut LayoutContext<'_, S, C>);

    /// Drops per-context state when the panel detaches.
    fn uninitialize_for_context(&self, ctx: &mut LayoutContext<'_, S, C>);

    /// Measures the source against `available`, realizing what the viewport
    /// needs, and returns the desired size (the estimated total extent).
    fn measure(&self, ctx: &mut LayoutContext<'_, S, C>, available: Size) -> Size;

    /// Arranges the realized containers into `final_size`.
    fn arrange(&self, ctx: &mut LayoutContext<'_, S, C>, final_size: Size) -> Size;

    /// Reacts to a source change delivered by the host, in order, before the
    /// next measure pass.
    fn on_items_changed(&self, ctx: &mut LayoutContext<'_, S, C>, change: SourceChange);
}

#[cfg(test)]
mod tests {
    use super::LayoutState;

    #[test]
    fn install_then_get() {
        let mut state = LayoutState::new();
        assert!(!state.is_initialized());
        *state.install(|| 7_u32) += 1;
        assert_eq!(*state.get_mut::<u32>(), 8);
        state.clear();
        assert!(!state.is_initialized());
    }

    #[test]
    #[should_panic(expected = "foreign type")]
    fn foreign_state_type_is_fatal() {
        let mut state = LayoutState::new();
        state.install(|| 7_u32);
        let _ = state.get_mut::<i64>();
    }
}
