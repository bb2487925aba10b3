// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scroll a virtualized uniform grid over ten thousand items.
//!
//! Only the items the viewport needs are ever realized; scrolling shifts the
//! window and recycles what left it.

use kurbo::{Rect, Size};
use trellis_demos::LabelCell;
use trellis_flow::{Layout, LayoutContext, LayoutState};
use trellis_items::{ContainerPool, VecSource};
use trellis_uniform_grid::{UniformGridLayout, UniformGridLayoutState};

fn main() {
    let source = VecSource::new((0..10_000).collect::<Vec<_>>());
    let mut pool = ContainerPool::new();
    let mut state = LayoutState::new();
    let mut make = |index: usize| LabelCell::new(format!("item {index}"), Size::new(50.0, 50.0));
    let grid = UniformGridLayout::new();
    let available = Size::new(220.0, f64::INFINITY);

    let mut ctx = LayoutContext {
        source: &source,
        pool: &mut pool,
        state: &mut state,
        viewport: Some(Rect::new(0.0, 0.0, 220.0, 150.0)),
        make: &mut make,
    };
    grid.initialize_for_context(&mut ctx);

    let extent = grid.measure(&mut ctx, available);
    grid.arrange(&mut ctx, extent);
    let range = ctx.state.get_mut::<UniformGridLayoutState>().realized_range();
    println!(
        "at the top: realized {range:?}, {} containers live",
        ctx.pool.realized_count()
    );

    // Scroll most of the way down and lay out again.
    ctx.viewport = Some(Rect::new(0.0, 120_000.0, 220.0, 120_150.0));
    let extent = grid.measure(&mut ctx, available);
    grid.arrange(&mut ctx, extent);
    let range = ctx.state.get_mut::<UniformGridLayoutState>().realized_range();
    println!(
        "after scrolling: realized {range:?}, {} containers live",
        ctx.pool.realized_count()
    );

    if let Some(first) = range.clone().next()
        && let Some(id) = ctx.pool.container_from_index(first)
        && let Some(cell) = ctx.pool.get(id)
    {
        println!("first visible cell {:?} at {:?}", cell.label(), cell.bounds());
    }
    println!("total extent: {extent:?}");
}
