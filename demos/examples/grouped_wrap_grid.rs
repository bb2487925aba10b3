// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A grouped wrap grid: headers, per-group item blocks, and the
//! clear-and-rebuild response to collection changes.

use kurbo::{Rect, Size};
use trellis_demos::LabelCell;
use trellis_items::{ContainerPool, ItemSource, VecSource};
use trellis_wrap_grid::{GroupedWrapGridContext, WrapGrid};

fn main() {
    let mut source = VecSource::grouped((0..13).collect::<Vec<_>>(), &[4, 6, 3]);
    let mut grid = WrapGrid::new();
    grid.set_item_width(Some(60.0));
    grid.set_item_height(Some(40.0));

    let mut pool = ContainerPool::new();
    let mut ctx = GroupedWrapGridContext::new();
    ctx.set_viewport(Rect::new(0.0, 0.0, 260.0, 600.0));

    let mut make_item = |index: usize| LabelCell::new(format!("item {index}"), Size::new(60.0, 40.0));
    let mut make_header =
        |group: usize| LabelCell::new(format!("group {group}"), Size::new(120.0, 24.0));
    let available = Size::new(260.0, f64::INFINITY);

    let extent = ctx.measure(
        &grid,
        &source,
        &mut pool,
        &mut make_item,
        &mut make_header,
        available,
    );
    ctx.arrange(&grid, &source, &mut pool, extent);
    println!(
        "{} groups, {} items, extent {extent:?}",
        ctx.headers().len(),
        ctx.children().len()
    );
    for group in 0..ctx.headers().len() {
        if let Some(header) = ctx.header_container(group) {
            println!("  {} at {:?}", header.label(), header.bounds());
        }
    }

    // Any grouped change releases everything and rebuilds on the next pass.
    let change = source.reset((0..8).collect::<Vec<_>>(), Some(&[5, 3]));
    ctx.on_items_changed(&mut pool, change);
    println!(
        "after reset: dirty = {}, {} containers live",
        ctx.are_items_dirty(),
        pool.realized_count()
    );

    let extent = ctx.measure(
        &grid,
        &source,
        &mut pool,
        &mut make_item,
        &mut make_header,
        available,
    );
    ctx.arrange(&grid, &source, &mut pool, extent);
    println!(
        "rebuilt: {} groups over {} items, extent {extent:?}",
        ctx.headers().len(),
        source.len()
    );
}
