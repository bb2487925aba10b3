// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Container realization and recycling.

use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::{Rect, Size};

/// Default number of recycled containers kept for reuse.
pub const DEFAULT_RECYCLE_CAP: usize = 7;

/// The narrow view of a realized visual container that layout needs.
///
/// Host frameworks implement this for whatever widget/view type they realize.
/// Containers report visibility so layouts can exclude hidden items from line
/// math without dropping them from the realized set.
pub trait Container {
    /// Measures against `available` and returns the desired size.
    fn measure(&mut self, available: Size) -> Size;

    /// The desired size from the most recent measure.
    fn desired_size(&self) -> Size;

    /// Places the container at `bounds` in panel content coordinates.
    fn arrange(&mut self, bounds: Rect);

    /// Whether the container participates in line math.
    fn is_visible(&self) -> bool {
        true
    }
}

/// Identifier for a realized container (generational).
///
/// A handle goes stale when its slot is destroyed; all pool lookups check
/// liveness, so stale handles simply resolve to `None`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ContainerId(u32, u32);

impl ContainerId {
    const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
struct Entry<C> {
    container: C,
    /// Item index this container is bound to; `None` while recycled.
    index: Option<usize>,
}

/// Maps `index -> container` with materialize/recycle/index-bookkeeping.
///
/// Containers live in generational slots (the free list persists across
/// destroys). Unbinding either parks the container on a bounded recycle list
/// for reuse or drops it once the list is full.
///
/// Invariant: at most one container is bound to a given index at a time.
#[derive(Debug)]
pub struct ContainerPool<C> {
    slots: Vec<Option<Entry<C>>>,
    /// Last generation per slot (persists across frees).
    generations: Vec<u32>,
    free: Vec<usize>,
    bound: HashMap<usize, ContainerId>,
    recycled: Vec<ContainerId>,
    recycle_cap: usize,
}

impl<C> Default for ContainerPool<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> ContainerPool<C> {
    /// Creates a pool with [`DEFAULT_RECYCLE_CAP`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_recycle_cap(DEFAULT_RECYCLE_CAP)
    }

    /// Creates a pool keeping at most `cap` recycled containers.
    ///
    /// A cap of zero destroys containers on every dematerialize.
    #[must_use]
    pub fn with_recycle_cap(cap: usize) -> Self {
        Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free: Vec::new(),
            bound: HashMap::new(),
            recycled: Vec::new(),
            recycle_cap: cap,
        }
    }

    /// The container bound to `index`, if one is realized.
    #[must_use]
    pub fn container_from_index(&self, index: usize) -> Option<ContainerId> {
        self.bound.get(&index).copied()
    }

    /// The item index `id` is bound to, or `None` for stale or recycled handles.
    #[must_use]
    pub fn index_from_container(&self, id: ContainerId) -> Option<usize> {
        self.entry(id).and_then(|entry| entry.index)
    }

    /// Shared access to a live container.
    #[must_use]
    pub fn get(&self, id: ContainerId) -> Option<&C> {
        self.entry(id).map(|entry| &entry.container)
    }

    /// Mutable access to a live container.
    #[must_use]
    pub fn get_mut(&mut self, id: ContainerId) -> Option<&mut C> {
        self.entry_mut(id).map(|entry| &mut entry.container)
    }

    /// Returns `true` if `id` refers to a live (bound or recycled) container.
    #[must_use]
    pub fn contains(&self, id: ContainerId) -> bool {
        self.entry(id).is_some()
    }

    /// Number of containers currently bound to an index.
    #[must_use]
    pub fn realized_count(&self) -> usize {
        self.bound.len()
    }

    /// Number of containers parked on the recycle list.
    #[must_use]
    pub fn pooled_count(&self) -> usize {
        self.recycled.len()
    }

    /// Realizes a container for `index`.
    ///
    /// Returns the existing binding when `index` is already realized.
    /// Otherwise a recycled container is reused if one is available, and
    /// `make` is called only when a brand-new container is needed. Hosts that
    /// bind data per index should prepare the returned container afterwards
    /// (a reused container still carries its previous content).
    pub fn materialize_with(&mut self, index: usize, make: impl FnOnce() -> C) -> ContainerId {
        if let Some(&id) = self.bound.get(&index) {
            return id;
        }
        let id = match self.recycled.pop() {
            Some(id) => id,
            None => self.alloc(make()),
        };
        if let Some(entry) = self.entry_mut(id) {
            entry.index = Some(index);
        }
        self.bound.insert(index, id);
        id
    }

    /// Unbinds the containers for `start..start + count`, keeping item
    /// indices unchanged.
    ///
    /// This is the virtualization path: the items still exist, their
    /// containers just leave the realized set (recycled up to the cap,
    /// destroyed past it).
    pub fn dematerialize(&mut self, start: usize, count: usize) {
        for index in start..start.saturating_add(count) {
            if let Some(id) = self.bound.remove(&index) {
                self.unbind(id);
            }
        }
    }

    /// Destroys the containers for `start..start + count` and shifts bindings
    /// at `>= start + count` down by `count`.
    ///
    /// This is the collection-removal path: the items are gone, so later
    /// indices slide down.
    pub fn remove_range(&mut self, start: usize, count: usize) {
        if count == 0 {
            return;
        }
        let end = start.saturating_add(count);
        for index in start..end {
            if let Some(id) = self.bound.remove(&index) {
                self.destroy(id);
            }
        }
        self.shift_bindings(end, |index| index - count);
    }

    /// Shifts bindings at `>= start` up by `count` without materializing.
    ///
    /// Used when items are inserted but visual insertion is deferred.
    pub fn insert_space(&mut self, start: usize, count: usize) {
        if count == 0 {
            return;
        }
        self.shift_bindings(start, |index| index + count);
    }

    /// Drops every container, bound and recycled.
    pub fn clear(&mut self) {
        self.bound.clear();
        self.recycled.clear();
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if slot.take().is_some() {
                self.generations[idx] = self.generations[idx].wrapping_add(1);
                self.free.push(idx);
            }
        }
    }

    fn entry(&self, id: ContainerId) -> Option<&Entry<C>> {
        if self.generations.get(id.idx()) != Some(&id.1) {
            return None;
        }
        self.slots.get(id.idx())?.as_ref()
    }

    fn entry_mut(&mut self, id: ContainerId) -> Option<&mut Entry<C>> {
        if self.generations.get(id.idx()) != Some(&id.1) {
            return None;
        }
        self.slots.get_mut(id.idx())?.as_mut()
    }

    fn alloc(&mut self, container: C) -> ContainerId {
        let entry = Entry {
            container,
            index: None,
        };
        if let Some(idx) = self.free.pop() {
            self.slots[idx] = Some(entry);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Slot counts stay far below u32::MAX"
            )]
            return ContainerId::new(idx as u32, self.generations[idx]);
        }
        self.slots.push(Some(entry));
        self.generations.push(0);
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Slot counts stay far below u32::MAX"
        )]
        let idx = (self.slots.len() - 1) as u32;
        ContainerId::new(idx, 0)
    }

    fn unbind(&mut self, id: ContainerId) {
        if self.recycled.len() < self.recycle_cap {
            if let Some(entry) = self.entry_mut(id) {
                entry.index = None;
            }
            self.recycled.push(id);
        } else {
            self.destroy(id);
        }
    }

    fn destroy(&mut self, id: ContainerId) {
        let idx = id.idx();
        if self.generations.get(idx) != Some(&id.1) {
            return;
        }
        if let Some(slot) = self.slots.get_mut(idx)
            && slot.take().is_some()
        {
            self.generations[idx] = self.generations[idx].wrapping_add(1);
            self.free.push(idx);
        }
    }

    fn shift_bindings(&mut self, from: usize, map: impl Fn(usize) -> usize) {
        let moved: Vec<(usize, ContainerId)> = self
            .bound
            .iter()
            .filter(|&(&index, _)| index >= from)
            .map(|(&index, &id)| (index, id))
            .collect();
        for &(index, _) in &moved {
            self.bound.remove(&index);
        }
        for (index, id) in moved {
            let shifted = map(index);
            debug_assert!(
                !self.bound.contains_key(&shifted),
                "index shift collided with an existing binding"
            );
            if let Some(entry) = self.entry_mut(id) {
                entry.index = Some(shifted);
            }
            self.bound.insert(shifted, id);
        }
    }
}

/// A [`Container`] with a fixed desired size.
///
/// Useful for tests and headless hosts that drive layout without a widget
/// tree. The bounds from the most recent arrange pass are recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizedContainer {
    desired: Size,
    visible: bool,
    arranged: Option<Rect>,
}

impl SizedContainer {
    /// Creates a container with the given desired size.
    #[must_use]
    pub fn new(desired: Size) -> Self {
        Self {
            desired,
            visible: true,
            arranged: None,
        }
    }

    /// Sets the desired size.
    pub fn set_desired_size(&mut self, desired: Size) {
        self.desired = desired;
    }

    /// Sets visibility.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// The bounds from the most recent arrange pass, if any.
    #[must_use]
    pub const fn arranged(&self) -> Option<Rect> {
        self.arranged
    }
}

impl Container for SizedContainer {
    fn measure(&mut self, _available: Size) -> Size {
        self.desired
    }

    fn desired_size(&self) -> Size {
        self.desired
    }

    fn arrange(&mut self, bounds: Rect) {
        self.arranged = Some(bounds);
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Size;

    use super::{Container, ContainerPool, SizedContainer};

    fn cell() -> SizedContainer {
        SizedContainer::new(Size::new(10.0, 10.0))
    }

    #[test]
    fn materialize_is_idempotent_per_index() {
        let mut pool = ContainerPool::new();
        let a = pool.materialize_with(2, cell);
        let b = pool.materialize_with(2, cell);
        assert_eq!(a, b);
        assert_eq!(pool.realized_count(), 1);
    }

    #[test]
    fn dematerialize_recycles_and_rebinds() {
        let mut pool = ContainerPool::new();
        let a = pool.materialize_with(0, cell);
        pool.dematerialize(0, 1);
        assert_eq!(pool.realized_count(), 0);
        assert_eq!(pool.pooled_count(), 1);
        assert_eq!(pool.index_from_container(a), None);

        let b = pool.materialize_with(5, cell);
        assert_eq!(a, b);
        assert_eq!(pool.index_from_container(b), Some(5));
        assert_eq!(pool.pooled_count(), 0);
    }

    #[test]
    fn recycle_cap_bounds_the_pool() {
        let mut pool = ContainerPool::with_recycle_cap(2);
        for index in 0..5 {
            pool.materialize_with(index, cell);
        }
        pool.dematerialize(0, 5);
        assert_eq!(pool.pooled_count(), 2);
    }

    #[test]
    fn remove_range_shifts_later_bindings_down() {
        let mut pool = ContainerPool::new();
        let ids: alloc::vec::Vec<_> = (0..5).map(|i| pool.materialize_with(i, cell)).collect();

        pool.remove_range(1, 2);
        assert_eq!(pool.realized_count(), 3);
        // Index 0 is untouched; old 3 and 4 slide to 1 and 2.
        assert_eq!(pool.container_from_index(0), Some(ids[0]));
        assert_eq!(pool.container_from_index(1), Some(ids[3]));
        assert_eq!(pool.container_from_index(2), Some(ids[4]));
        // The removed containers are destroyed, not recycled.
        assert!(!pool.contains(ids[1]));
        assert!(!pool.contains(ids[2]));
    }

    #[test]
    fn insert_space_defers_materialization() {
        let mut pool = ContainerPool::new();
        let ids: alloc::vec::Vec<_> = (0..3).map(|i| pool.materialize_with(i, cell)).collect();

        pool.insert_space(1, 2);
        assert_eq!(pool.container_from_index(0), Some(ids[0]));
        assert_eq!(pool.container_from_index(1), None);
        assert_eq!(pool.container_from_index(2), None);
        assert_eq!(pool.container_from_index(3), Some(ids[1]));
        assert_eq!(pool.container_from_index(4), Some(ids[2]));
        assert_eq!(pool.index_from_container(ids[2]), Some(4));
    }

    #[test]
    fn stale_handles_resolve_to_none() {
        let mut pool = ContainerPool::with_recycle_cap(0);
        let id = pool.materialize_with(0, cell);
        pool.dematerialize(0, 1);
        assert!(!pool.contains(id));
        assert_eq!(pool.get(id), None);

        // The slot is reused under a fresh generation; the stale handle
        // still resolves to nothing.
        let fresh = pool.materialize_with(0, cell);
        assert_ne!(id, fresh);
        assert_eq!(pool.get(id), None);
        assert!(pool.contains(fresh));
    }

    #[test]
    fn clear_drops_everything() {
        let mut pool = ContainerPool::new();
        for index in 0..4 {
            pool.materialize_with(index, cell);
        }
        pool.dematerialize(3, 1);
        pool.clear();
        assert_eq!(pool.realized_count(), 0);
        assert_eq!(pool.pooled_count(), 0);
        assert_eq!(pool.container_from_index(0), None);
    }

    #[test]
    fn sized_container_records_arrange() {
        let mut c = SizedContainer::new(Size::new(4.0, 6.0));
        assert_eq!(c.measure(Size::new(100.0, 100.0)), Size::new(4.0, 6.0));
        c.arrange(kurbo::Rect::new(1.0, 2.0, 5.0, 8.0));
        assert_eq!(c.arranged(), Some(kurbo::Rect::new(1.0, 2.0, 5.0, 8.0)));
    }
}
