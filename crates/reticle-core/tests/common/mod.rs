// SPDX-License-Identifier: Apache-2.0
#![allow(dead_code)]
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use reticle_core::geom::{BBox, Point, Rot, Trans};
use reticle_core::{ArraySpec, CellId, LayerIndex, LayerKey, LayoutStore, Shape};

// =============================================================================
// SHARED FIXTURE HIERARCHIES
// =============================================================================

/// Database unit used by every fixture: 1 dbu = 1 nm.
pub const DBU: f64 = 0.001;

/// Registers layer (1, 0) and returns its index.
pub fn layer0(store: &mut LayoutStore) -> LayerIndex {
    store.register_layer(LayerKey {
        layer: 1,
        datatype: 0,
    })
}

/// Resolves a cell the fixture created itself.
pub fn cell(store: &LayoutStore, name: &str) -> CellId {
    store.find_cell(name).expect("fixture cell missing")
}

/// An axis-aligned box shape.
pub fn boxed(x1: i64, y1: i64, x2: i64, y2: i64) -> Shape {
    Shape::Box(BBox::new(Point::new(x1, y1), Point::new(x2, y2)))
}

/// `TOP` placing `CHILD` once at (1000, 2000); `CHILD` carries a 500x500 box
/// at the origin on layer (1, 0).
pub fn two_level() -> LayoutStore {
    let mut s = LayoutStore::new("demo", "TOP", DBU).expect("store");
    let top = cell(&s, "TOP");
    let child = s.create_cell("CHILD").expect("cell");
    let l0 = layer0(&mut s);
    s.insert_shape(child, l0, boxed(0, 0, 500, 500))
        .expect("shape");
    s.insert_instance(top, child, Trans::translate(1000, 2000), None)
        .expect("instance");
    s
}

/// `TOP` placing a 3x2 array of `TILE` (row step 100, column step 200), each
/// tile carrying a 10x10 box on layer (1, 0).
pub fn arrayed() -> LayoutStore {
    let mut s = LayoutStore::new("demo", "TOP", DBU).expect("store");
    let top = cell(&s, "TOP");
    let tile = s.create_cell("TILE").expect("cell");
    let l0 = layer0(&mut s);
    s.insert_shape(tile, l0, boxed(0, 0, 10, 10)).expect("shape");
    let grid = ArraySpec {
        rows: 3,
        cols: 2,
        row_step: 100,
        col_step: 200,
    };
    s.insert_instance(top, tile, Trans::IDENTITY, Some(grid))
        .expect("instance");
    s
}

/// Diamond: `TOP` places `A` then `B`; both place `LEAF`.
pub fn diamond() -> LayoutStore {
    let mut s = LayoutStore::new("chip", "TOP", DBU).expect("store");
    let top = cell(&s, "TOP");
    let a = s.create_cell("A").expect("cell");
    let b = s.create_cell("B").expect("cell");
    let leaf = s.create_cell("LEAF").expect("cell");
    for (parent, child, dx) in [(top, a, 0), (top, b, 5000), (a, leaf, 100), (b, leaf, 200)] {
        s.insert_instance(parent, child, Trans::translate(dx, 0), None)
            .expect("instance");
    }
    s
}

/// Linear chain `TOP -> C1 -> C2 -> ... -> Cn`, each link shifted by (10, 0).
pub fn chain(n: u32) -> LayoutStore {
    let mut s = LayoutStore::new("demo", "TOP", DBU).expect("store");
    let mut parent = cell(&s, "TOP");
    for i in 1..=n {
        let child = s.create_cell(&format!("C{i}")).expect("cell");
        s.insert_instance(parent, child, Trans::translate(10, 0), None)
            .expect("instance");
        parent = child;
    }
    s
}

/// `TOP` places `CHILD` at (1000, 0) rotated 90 degrees; `CHILD` carries a
/// box (0, 0)..(300, 100) on layer (1, 0).
pub fn rotated() -> LayoutStore {
    let mut s = LayoutStore::new("demo", "TOP", DBU).expect("store");
    let top = cell(&s, "TOP");
    let child = s.create_cell("CHILD").expect("cell");
    let l0 = layer0(&mut s);
    s.insert_shape(child, l0, boxed(0, 0, 300, 100))
        .expect("shape");
    let t = Trans::new(Point::new(1000, 0), Rot::R90, false);
    s.insert_instance(top, child, t, None).expect("instance");
    s
}
