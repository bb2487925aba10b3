// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Item sources, grouping, and change notifications.

use alloc::vec::Vec;

/// A change to an ordered item source.
///
/// Hosts deliver changes in order, synchronously, before the next measure
/// pass observes the source. Indices refer to the positions the change took
/// effect at; the source itself has already been mutated when the change is
/// forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceChange {
    /// `count` items were inserted starting at `index`.
    Added {
        /// First inserted index.
        index: usize,
        /// Number of inserted items.
        count: usize,
    },
    /// `count` items were removed starting at `index`.
    Removed {
        /// First removed index.
        index: usize,
        /// Number of removed items.
        count: usize,
    },
    /// `old_count` items starting at `index` were replaced by `new_count` items.
    Replaced {
        /// First replaced index.
        index: usize,
        /// Number of items replaced.
        old_count: usize,
        /// Number of replacement items.
        new_count: usize,
    },
    /// `count` items moved from `old_index` to `new_index`.
    Moved {
        /// First index of the moved run before the move.
        old_index: usize,
        /// Number of moved items.
        count: usize,
        /// First index of the moved run after the move.
        new_index: usize,
    },
    /// Everything changed. All index-keyed bookkeeping held elsewhere is
    /// invalid, including container-to-index associations.
    Reset,
}

/// An ordered item source with optional grouping.
///
/// Item indices are contiguous and stable between change notifications. The
/// layout crates never read item values through this trait; hosts bind data
/// to containers in their own container factories.
pub trait ItemSource {
    /// Number of items.
    fn len(&self) -> usize;

    /// Returns `true` if there are no items.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grouping information, if this source is grouped.
    fn groups(&self) -> Option<&GroupMap> {
        None
    }
}

/// Ordered group sub-ranges over a flat item strip.
///
/// Groups partition `0..total_len()` into contiguous runs. Starts are kept as
/// a prefix table so group/item queries stay cheap. Zero-length groups are
/// allowed (a group whose header is shown with no items under it).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupMap {
    lens: Vec<usize>,
    starts: Vec<usize>,
}

impl GroupMap {
    /// Creates a group map from per-group item counts.
    #[must_use]
    pub fn new(lens: &[usize]) -> Self {
        let mut starts = Vec::with_capacity(lens.len());
        let mut pos = 0;
        for &len in lens {
            starts.push(pos);
            pos += len;
        }
        Self {
            lens: lens.to_vec(),
            starts,
        }
    }

    /// Number of groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.lens.len()
    }

    /// Returns `true` if there are no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lens.is_empty()
    }

    /// Number of items in the group at `group`.
    #[must_use]
    pub fn len_of(&self, group: usize) -> usize {
        self.lens.get(group).copied().unwrap_or(0)
    }

    /// Flat index of the first item of the group at `group`.
    #[must_use]
    pub fn start_of(&self, group: usize) -> usize {
        self.starts.get(group).copied().unwrap_or(self.total_len())
    }

    /// Total number of items across all groups.
    #[must_use]
    pub fn total_len(&self) -> usize {
        match (self.starts.last(), self.lens.last()) {
            (Some(start), Some(len)) => start + len,
            _ => 0,
        }
    }

    /// Group containing the flat item index, skipping zero-length groups.
    ///
    /// Returns `None` when `item` is out of bounds.
    #[must_use]
    pub fn group_of_item(&self, item: usize) -> Option<usize> {
        if item >= self.total_len() {
            return None;
        }
        let candidate = self.starts.partition_point(|&start| start <= item);
        // `partition_point` lands one past the last group starting at or
        // before `item`; zero-length groups share a start with their
        // successor, so walk back to the group that actually contains it.
        (0..candidate)
            .rev()
            .find(|&g| item >= self.starts[g] && item < self.starts[g] + self.lens[g])
    }
}

/// An in-memory [`ItemSource`] whose mutators report the [`SourceChange`]
/// the host should forward to panels observing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VecSource<T> {
    items: Vec<T>,
    groups: Option<GroupMap>,
}

impl<T> VecSource<T> {
    /// Creates a flat (ungrouped) source.
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            groups: None,
        }
    }

    /// Creates a grouped source.
    ///
    /// `group_lens` must sum to `items.len()`.
    #[must_use]
    pub fn grouped(items: Vec<T>, group_lens: &[usize]) -> Self {
        let groups = GroupMap::new(group_lens);
        debug_assert_eq!(
            groups.total_len(),
            items.len(),
            "group lengths must cover the item strip exactly"
        );
        Self {
            items,
            groups: Some(groups),
        }
    }

    /// Returns the item at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Appends an item.
    ///
    /// Incremental mutators are for flat sources; grouped sources change via
    /// [`VecSource::reset`].
    pub fn push(&mut self, item: T) -> SourceChange {
        debug_assert!(
            self.groups.is_none(),
            "grouped sources change via reset, not incremental mutation"
        );
        self.items.push(item);
        SourceChange::Added {
            index: self.items.len() - 1,
            count: 1,
        }
    }

    /// Inserts an item at `index`.
    pub fn insert(&mut self, index: usize, item: T) -> SourceChange {
        debug_assert!(
            self.groups.is_none(),
            "grouped sources change via reset, not incremental mutation"
        );
        self.items.insert(index, item);
        SourceChange::Added { index, count: 1 }
    }

    /// Inserts several items starting at `index`.
    pub fn insert_many(&mut self, index: usize, items: Vec<T>) -> SourceChange {
        debug_assert!(
            self.groups.is_none(),
            "grouped sources change via reset, not incremental mutation"
        );
        let count = items.len();
        for (offset, item) in items.into_iter().enumerate() {
            self.items.insert(index + offset, item);
        }
        SourceChange::Added { index, count }
    }

    /// Removes the item at `index`.
    pub fn remove(&mut self, index: usize) -> (T, SourceChange) {
        debug_assert!(
            self.groups.is_none(),
            "grouped sources change via reset, not incremental mutation"
        );
        let item = self.items.remove(index);
        (item, SourceChange::Removed { index, count: 1 })
    }

    /// Removes `count` items starting at `index`.
    pub fn remove_many(&mut self, index: usize, count: usize) -> SourceChange {
        debug_assert!(
            self.groups.is_none(),
            "grouped sources change via reset, not incremental mutation"
        );
        self.items.drain(index..index + count);
        SourceChange::Removed { index, count }
    }

    /// Replaces the item at `index`.
    pub fn replace(&mut self, index: usize, item: T) -> SourceChange {
        debug_assert!(
            self.groups.is_none(),
            "grouped sources change via reset, not incremental mutation"
        );
        self.items[index] = item;
        SourceChange::Replaced {
            index,
            old_count: 1,
            new_count: 1,
        }
    }

    /// Moves the item at `old_index` to `new_index`.
    ///
    /// `new_index` refers to the position after the item has been taken out.
    pub fn move_item(&mut self, old_index: usize, new_index: usize) -> SourceChange {
        debug_assert!(
            self.groups.is_none(),
            "grouped sources change via reset, not incremental mutation"
        );
        let item = self.items.remove(old_index);
        self.items.insert(new_index, item);
        SourceChange::Moved {
            old_index,
            count: 1,
            new_index,
        }
    }

    /// Replaces the entire contents, optionally regrouping.
    pub fn reset(&mut self, items: Vec<T>, group_lens: Option<&[usize]>) -> SourceChange {
        self.items = items;
        self.groups = group_lens.map(GroupMap::new);
        if let Some(groups) = &self.groups {
            debug_assert_eq!(
                groups.total_len(),
                self.items.len(),
                "group lengths must cover the item strip exactly"
            );
        }
        SourceChange::Reset
    }
}

impl<T> ItemSource for VecSource<T> {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn groups(&self) -> Option<&GroupMap> {
        self.groups.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::{GroupMap, ItemSource, SourceChange, VecSource};

    #[test]
    fn group_map_prefix_queries() {
        let groups = GroupMap::new(&[3, 0, 2]);
        assert_eq!(groups.group_count(), 3);
        assert_eq!(groups.total_len(), 5);
        assert_eq!(groups.start_of(0), 0);
        assert_eq!(groups.start_of(1), 3);
        assert_eq!(groups.start_of(2), 3);
        assert_eq!(groups.len_of(1), 0);

        // Items in the zero-length group's shadow resolve to the group that
        // actually contains them.
        assert_eq!(groups.group_of_item(2), Some(0));
        assert_eq!(groups.group_of_item(3), Some(2));
        assert_eq!(groups.group_of_item(4), Some(2));
        assert_eq!(groups.group_of_item(5), None);
    }

    #[test]
    fn vec_source_mutators_report_changes() {
        let mut source = VecSource::new(vec![1, 2, 3]);
        assert_eq!(source.len(), 3);

        assert_eq!(source.push(4), SourceChange::Added { index: 3, count: 1 });
        assert_eq!(
            source.insert(1, 9),
            SourceChange::Added { index: 1, count: 1 }
        );
        assert_eq!(source.get(1), Some(&9));

        let (item, change) = source.remove(1);
        assert_eq!(item, 9);
        assert_eq!(change, SourceChange::Removed { index: 1, count: 1 });

        assert_eq!(
            source.move_item(0, 2),
            SourceChange::Moved {
                old_index: 0,
                count: 1,
                new_index: 2
            }
        );
        assert_eq!(source.get(2), Some(&1));
    }

    #[test]
    fn reset_regroups() {
        let mut source = VecSource::new(vec![1, 2]);
        assert!(source.groups().is_none());

        let change = source.reset(vec![1, 2, 3, 4], Some(&[1, 3]));
        assert_eq!(change, SourceChange::Reset);
        let groups = source.groups().expect("reset installed groups");
        assert_eq!(groups.group_count(), 2);
        assert_eq!(groups.total_len(), 4);
    }
}
