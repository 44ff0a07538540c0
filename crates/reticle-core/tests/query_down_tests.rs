// SPDX-License-Identifier: Apache-2.0
//! Downward traversal: structural vs expanded records, depth bounding,
//! subtree bounds, the strict guardrail, and the counting variant.

#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use reticle_core::geom::{BBox, Point};
use reticle_core::walk::{hierarchy_depth, query_down, query_down_stats, DownMode, InstanceKind};
use reticle_core::{ArraySpec, Guardrail, QueryError};

// =============================================================================
// RECORD SHAPE: STRUCTURAL VS EXPANDED
// =============================================================================

#[test]
fn structural_mode_keeps_array_edges_as_descriptors() {
    let s = common::arrayed();
    let recs = query_down(
        &s,
        "TOP",
        1,
        DownMode::Structural,
        false,
        Guardrail::new(100),
    )
    .expect("query");

    assert_eq!(recs.len(), 1);
    let r = &recs[0];
    assert_eq!(r.kind, InstanceKind::Array);
    assert_eq!((r.parent.as_str(), r.child.as_str()), ("TOP", "TILE"));
    assert_eq!(
        r.array,
        Some(ArraySpec {
            rows: 3,
            cols: 2,
            row_step: 100,
            col_step: 200,
        })
    );
    assert_eq!(r.element, None);
    assert_eq!(r.path, vec!["TOP".to_owned()]);
}

#[test]
fn expanded_mode_emits_one_record_per_element() {
    let s = common::arrayed();
    let recs = query_down(&s, "TOP", 1, DownMode::Expanded, false, Guardrail::new(100))
        .expect("query");

    assert_eq!(recs.len(), 6);
    for r in &recs {
        assert_eq!(r.kind, InstanceKind::Array);
        assert_eq!(r.array, None);
        assert!(r.element.is_some());
    }
    // Row-major enumeration: the last element is (2, 1), shifted by
    // (2*row_step, 1*col_step).
    let last = recs.last().expect("six records");
    let e = last.element.expect("element index");
    assert_eq!((e.row, e.col), (2, 1));
    assert_eq!(last.trans.disp, Point::new(200, 200));
}

// =============================================================================
// DEPTH BOUNDING
// =============================================================================

#[test]
fn depth_zero_means_direct_children() {
    let s = common::chain(3);
    let at_zero =
        query_down(&s, "TOP", 0, DownMode::Structural, false, Guardrail::new(100)).expect("query");
    let at_one =
        query_down(&s, "TOP", 1, DownMode::Structural, false, Guardrail::new(100)).expect("query");

    assert_eq!(at_zero, at_one);
    assert_eq!(at_zero.len(), 1);
    assert_eq!(at_zero[0].child, "C1");
}

#[test]
fn depth_limit_cuts_the_walk_not_the_records_above_it() {
    let s = common::chain(3);
    let recs =
        query_down(&s, "TOP", 2, DownMode::Structural, false, Guardrail::new(100)).expect("query");

    let edges: Vec<(String, String)> = recs
        .iter()
        .map(|r| (r.parent.clone(), r.child.clone()))
        .collect();
    assert_eq!(
        edges,
        vec![
            ("TOP".to_owned(), "C1".to_owned()),
            ("C1".to_owned(), "C2".to_owned()),
        ]
    );
    assert_eq!(recs[1].path, vec!["TOP".to_owned(), "C1".to_owned()]);
}

// =============================================================================
// SUBTREE BOUNDS
// =============================================================================

#[test]
fn bbox_is_mapped_into_the_root_frame() {
    let s = common::two_level();
    let recs =
        query_down(&s, "TOP", 1, DownMode::Structural, true, Guardrail::new(100)).expect("query");

    assert_eq!(
        recs[0].bbox,
        Some(BBox::new(Point::new(1000, 2000), Point::new(1500, 2500)))
    );
}

#[test]
fn bbox_unions_arrays_inside_the_child_subtree() {
    // WRAP holds the 3x2 TILE grid; the record for TOP -> WRAP must span
    // every element of that grid.
    let mut s = common::arrayed();
    let top = common::cell(&s, "TOP");
    let tile = common::cell(&s, "TILE");
    let wrap = s.create_cell("WRAP").expect("cell");
    let grid = ArraySpec {
        rows: 3,
        cols: 2,
        row_step: 100,
        col_step: 200,
    };
    s.insert_instance(wrap, tile, reticle_core::geom::Trans::IDENTITY, Some(grid))
        .expect("instance");
    s.insert_instance(
        top,
        wrap,
        reticle_core::geom::Trans::translate(10000, 0),
        None,
    )
    .expect("instance");

    let recs =
        query_down(&s, "TOP", 1, DownMode::Structural, true, Guardrail::new(100)).expect("query");

    // Record 0 is the direct array edge: its own bbox is the child subtree
    // placed by the record's transform, so a single 10x10 tile.
    assert_eq!(recs[0].bbox, Some(BBox::new(Point::ZERO, Point::new(10, 10))));
    // Record 1 is TOP -> WRAP: rows advance x by 100, columns advance y by
    // 200, so the grid union spans 210x210 at the placement offset.
    assert_eq!(
        recs[1].bbox,
        Some(BBox::new(Point::new(10000, 0), Point::new(10210, 210)))
    );
}

// =============================================================================
// GUARDRAIL: STRICT FOR LISTS, TRUNCATING FOR STATS
// =============================================================================

#[test]
fn strict_guardrail_rejects_oversized_result_sets() {
    let s = common::arrayed();
    let err = query_down(&s, "TOP", 1, DownMode::Expanded, false, Guardrail::new(3))
        .expect_err("limit 3 cannot hold 6 elements");

    assert_eq!(err, QueryError::TooManyResults { limit: 3 });
    assert_eq!(err.kind(), "TooManyResults");
}

#[test]
fn unknown_root_is_reported_by_name() {
    let s = common::two_level();
    let err = query_down(
        &s,
        "MISSING",
        1,
        DownMode::Structural,
        false,
        Guardrail::new(10),
    )
    .expect_err("no such cell");
    assert_eq!(err, QueryError::CellNotFound("MISSING".to_owned()));
}

#[test]
fn stats_count_expanded_placements_per_child() {
    let s = common::diamond();
    let stats = query_down_stats(&s, "TOP", 8, Guardrail::new(1000)).expect("stats");

    assert_eq!(stats.total, 4);
    assert_eq!(stats.by_child_cell.get("A"), Some(&1));
    assert_eq!(stats.by_child_cell.get("B"), Some(&1));
    assert_eq!(stats.by_child_cell.get("LEAF"), Some(&2));
    assert!(!stats.truncated);
}

#[test]
fn stats_truncate_instead_of_erroring() {
    let s = common::arrayed();
    let stats = query_down_stats(&s, "TOP", 1, Guardrail::new(4)).expect("stats");

    assert_eq!(stats.total, 4);
    assert!(stats.truncated);
}

// =============================================================================
// HIERARCHY DEPTH
// =============================================================================

#[test]
fn hierarchy_depth_counts_the_longest_chain() {
    assert_eq!(hierarchy_depth(&common::chain(4)).expect("depth"), 4);
    assert_eq!(hierarchy_depth(&common::diamond()).expect("depth"), 2);
}
