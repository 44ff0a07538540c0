// SPDX-License-Identifier: Apache-2.0
//! Downward traversal: bounded enumeration of instance edges below a root.
//!
//! `query_down` is strict: the guardrail tripping aborts the call with
//! [`QueryError::TooManyResults`] and discards everything collected.
//! `query_down_stats` is the truncating companion: it counts in expanded
//! semantics without materializing records and reports a `truncated` flag
//! instead of failing.

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::QueryError;
use crate::geom::{BBox, Trans};
use crate::ident::CellId;
use crate::limits::{Guardrail, Verdict};
use crate::store::{ArraySpec, Instance, LayoutStore};
use crate::walk::SegmentPath;

/// How array-bearing edges materialize into records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DownMode {
    /// One record per edge; array descriptors pass through unmodified.
    #[default]
    Structural,
    /// One record per array element, carrying its element index and
    /// effective transform. Non-array edges still emit once.
    Expanded,
}

/// Whether a record came from a single placement or an array edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum InstanceKind {
    /// Lone placement.
    Single,
    /// Placement backed by an array descriptor.
    Array,
}

/// Grid position of one expanded array element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementIndex {
    /// Row index, `0..rows`.
    pub row: u32,
    /// Column index, `0..cols`.
    pub col: u32,
}

/// One enumerated placement edge (or array element, in expanded mode).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstanceRecord {
    /// Single placement or array-backed.
    pub kind: InstanceKind,
    /// Name of the cell that owns the edge.
    pub parent: String,
    /// Name of the placed child cell.
    pub child: String,
    /// The record's own transform: the edge's base transform, or the
    /// element's effective transform in expanded mode.
    pub trans: Trans,
    /// Array descriptor, on structural records of array edges.
    #[cfg_attr(
        feature = "serde",
        serde(skip_serializing_if = "Option::is_none", default)
    )]
    pub array: Option<ArraySpec>,
    /// Element index, on expanded records of array edges.
    #[cfg_attr(
        feature = "serde",
        serde(skip_serializing_if = "Option::is_none", default)
    )]
    pub element: Option<ElementIndex>,
    /// Segment path from the root to `parent` (inclusive on both ends).
    pub path: SegmentPath,
    /// Child-cell geometry bounds in the root frame, when requested and the
    /// child subtree has any geometry.
    #[cfg_attr(
        feature = "serde",
        serde(skip_serializing_if = "Option::is_none", default)
    )]
    pub bbox: Option<BBox>,
}

/// Result of [`query_down_stats`]: per-child-name expanded placement counts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DownStats {
    /// Expanded placement count per child cell name, name-ordered.
    pub by_child_cell: BTreeMap<String, u64>,
    /// Sum over all children.
    pub total: u64,
    /// True when the guardrail stopped the count early.
    pub truncated: bool,
}

/// Depth 0 is accepted and behaves as depth 1 (direct children only).
fn effective_depth(max_depth: u32) -> u32 {
    max_depth.max(1)
}

struct Frame {
    cell: CellId,
    /// Accumulated transform mapping this cell's frame into the root frame.
    trans: Trans,
    /// Next instance edge of `cell` to process.
    next: usize,
}

/// Enumerates instance edges reachable from `root` within `max_depth`
/// levels, depth-first in declaration order.
///
/// An edge owned by a cell at nesting level `k` (root = 0) is reported iff
/// `k < max_depth`. An edge whose child is already on the current descent
/// path is reported but not descended into. `include_bbox` attaches the
/// child's recursive geometry bounds, placed by the record's transform chain;
/// boxes are memoized per call so shared subtrees are measured once.
///
/// # Errors
/// [`QueryError::CellNotFound`] for an unknown root;
/// [`QueryError::TooManyResults`] when the strict guardrail rejects a
/// record (no partial results).
pub fn query_down(
    store: &LayoutStore,
    root: &str,
    max_depth: u32,
    mode: DownMode,
    include_bbox: bool,
    guard: Guardrail,
) -> Result<Vec<InstanceRecord>, QueryError> {
    let root_id = store.resolve(root)?;
    let depth_limit = effective_depth(max_depth);

    let mut records: Vec<InstanceRecord> = Vec::new();
    let mut memo: FxHashMap<CellId, Option<BBox>> = FxHashMap::default();
    let mut on_path: FxHashSet<CellId> = FxHashSet::default();
    let mut path: SegmentPath = vec![store.cell_name(root_id).to_owned()];
    let mut frames = vec![Frame {
        cell: root_id,
        trans: Trans::IDENTITY,
        next: 0,
    }];
    on_path.insert(root_id);

    while let Some(top) = frames.last_mut() {
        let cell = top.cell;
        let acc = top.trans;
        let idx = top.next;
        let insts = store.instances(cell);

        if idx >= insts.len() {
            frames.pop();
            on_path.remove(&cell);
            path.pop();
            continue;
        }
        top.next = idx + 1;

        let inst = &insts[idx];
        let parent_name = store.cell_name(cell);
        let child_name = store.cell_name(inst.child);

        let child_box = if include_bbox {
            subtree_bbox(store, &mut memo, inst.child)
        } else {
            None
        };

        emit_edge(
            EmitCtx {
                records: &mut records,
                guard,
                parent: parent_name,
                child: child_name,
                path: &path,
                acc: &acc,
                child_box,
            },
            inst,
            mode,
        )?;

        // Descend once per edge; the child's own edges sit one level deeper.
        let child_level = path.len() as u32;
        if child_level < depth_limit && !on_path.contains(&inst.child) {
            on_path.insert(inst.child);
            path.push(child_name.to_owned());
            frames.push(Frame {
                cell: inst.child,
                trans: acc.compose(&inst.trans),
                next: 0,
            });
        }
    }

    Ok(records)
}

struct EmitCtx<'a> {
    records: &'a mut Vec<InstanceRecord>,
    guard: Guardrail,
    parent: &'a str,
    child: &'a str,
    path: &'a SegmentPath,
    acc: &'a Trans,
    child_box: Option<BBox>,
}

fn emit_edge(ctx: EmitCtx<'_>, inst: &Instance, mode: DownMode) -> Result<(), QueryError> {
    let EmitCtx {
        records,
        guard,
        parent,
        child,
        path,
        acc,
        child_box,
    } = ctx;

    let mut push = |trans: Trans, kind: InstanceKind, array: Option<ArraySpec>, element| {
        if guard.accept(records.len()) == Verdict::Reject {
            return Err(QueryError::TooManyResults {
                limit: guard.limit(),
            });
        }
        records.push(InstanceRecord {
            kind,
            parent: parent.to_owned(),
            child: child.to_owned(),
            trans,
            array,
            element,
            path: path.clone(),
            bbox: child_box.map(|b| b.transformed(&acc.compose(&trans))),
        });
        Ok(())
    };

    match (mode, inst.array) {
        (DownMode::Structural, array) => {
            let kind = if array.is_some() {
                InstanceKind::Array
            } else {
                InstanceKind::Single
            };
            push(inst.trans, kind, array, None)
        }
        (DownMode::Expanded, None) => push(inst.trans, InstanceKind::Single, None, None),
        (DownMode::Expanded, Some(a)) => {
            for row in 0..a.rows {
                for col in 0..a.cols {
                    push(
                        a.element_trans(&inst.trans, row, col),
                        InstanceKind::Array,
                        None,
                        Some(ElementIndex { row, col }),
                    )?;
                }
            }
            Ok(())
        }
    }
}

/// Counts reachable placements in expanded semantics without materializing
/// records. Never fails on volume: hitting the guardrail stops the count
/// with `truncated = true`.
///
/// # Errors
/// [`QueryError::CellNotFound`] for an unknown root.
pub fn query_down_stats(
    store: &LayoutStore,
    root: &str,
    max_depth: u32,
    guard: Guardrail,
) -> Result<DownStats, QueryError> {
    let root_id = store.resolve(root)?;
    let depth_limit = effective_depth(max_depth);
    let limit = guard.limit() as u64;

    let mut stats = DownStats::default();
    let mut on_path: FxHashSet<CellId> = FxHashSet::default();
    let mut level: u32 = 1;
    let mut frames = vec![Frame {
        cell: root_id,
        trans: Trans::IDENTITY,
        next: 0,
    }];
    on_path.insert(root_id);

    'walk: while let Some(top) = frames.last_mut() {
        let cell = top.cell;
        let idx = top.next;
        let insts = store.instances(cell);

        if idx >= insts.len() {
            frames.pop();
            on_path.remove(&cell);
            level -= 1;
            continue;
        }
        top.next = idx + 1;

        let inst = &insts[idx];
        let elements = inst.array.as_ref().map_or(1, ArraySpec::len);
        let room = limit - stats.total;
        let counted = elements.min(room);
        if counted > 0 {
            *stats
                .by_child_cell
                .entry(store.cell_name(inst.child).to_owned())
                .or_insert(0) += counted;
            stats.total += counted;
        }
        if counted < elements {
            stats.truncated = true;
            break 'walk;
        }

        if level < depth_limit && !on_path.contains(&inst.child) {
            on_path.insert(inst.child);
            level += 1;
            frames.push(Frame {
                cell: inst.child,
                trans: Trans::IDENTITY,
                next: 0,
            });
        }
    }

    Ok(stats)
}

enum BoxTask {
    Visit(CellId),
    Finish(CellId),
}

/// Recursive geometry bounds of `cell` in its own frame: all layers, all
/// descendants, every array element. `None` when the subtree holds no
/// shapes at all.
///
/// Memoized across one `query_down` call. A child currently on the
/// evaluation stack (cycle) contributes nothing to the inner occurrence;
/// the outer frame still measures the full subtree, so the walk terminates
/// with a best-effort box on cyclic designs.
fn subtree_bbox(
    store: &LayoutStore,
    memo: &mut FxHashMap<CellId, Option<BBox>>,
    cell: CellId,
) -> Option<BBox> {
    if let Some(cached) = memo.get(&cell) {
        return *cached;
    }

    let mut active: FxHashSet<CellId> = FxHashSet::default();
    let mut tasks = vec![BoxTask::Visit(cell)];

    while let Some(task) = tasks.pop() {
        match task {
            BoxTask::Visit(id) => {
                if memo.contains_key(&id) || active.contains(&id) {
                    continue;
                }
                active.insert(id);
                tasks.push(BoxTask::Finish(id));
                for inst in store.instances(id) {
                    tasks.push(BoxTask::Visit(inst.child));
                }
            }
            BoxTask::Finish(id) => {
                let mut acc: Option<BBox> = None;
                let mut merge = |b: BBox| {
                    acc = Some(acc.map_or(b, |prev| prev.union(&b)));
                };

                for (_, shapes) in store.cell(id).shape_layers() {
                    for shape in shapes {
                        merge(shape.bbox());
                    }
                }
                for inst in store.instances(id) {
                    let Some(child_box) = memo.get(&inst.child).copied().flatten() else {
                        continue;
                    };
                    merge(child_box.transformed(&inst.trans));
                    if let Some(a) = inst.array {
                        // The far corner element; with the base element it
                        // spans the whole grid, steps being pure translations.
                        let far = a.element_trans(&inst.trans, a.rows - 1, a.cols - 1);
                        merge(child_box.transformed(&far));
                    }
                }

                memo.insert(id, acc);
                active.remove(&id);
            }
        }
    }

    memo.get(&cell).copied().flatten()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::geom::Point;
    use crate::shape::Shape;
    use crate::store::LayerKey;

    fn two_level_store() -> LayoutStore {
        let mut s = LayoutStore::new("t", "TOP", 0.001).unwrap();
        let top = s.find_cell("TOP").unwrap();
        let a = s.create_cell("A").unwrap();
        let b = s.create_cell("B").unwrap();
        s.insert_instance(top, a, Trans::translate(100, 0), None)
            .unwrap();
        s.insert_instance(
            top,
            b,
            Trans::IDENTITY,
            Some(ArraySpec {
                rows: 3,
                cols: 2,
                row_step: 1000,
                col_step: 2000,
            }),
        )
        .unwrap();
        s.insert_instance(a, b, Trans::translate(0, 50), None)
            .unwrap();
        s
    }

    #[test]
    fn structural_keeps_array_edges_whole() {
        let s = two_level_store();
        let recs = query_down(
            &s,
            "TOP",
            1,
            DownMode::Structural,
            false,
            Guardrail::new(100),
        )
        .unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].child, "A");
        assert_eq!(recs[0].kind, InstanceKind::Single);
        assert_eq!(recs[1].child, "B");
        assert_eq!(recs[1].kind, InstanceKind::Array);
        assert_eq!(recs[1].array.unwrap().rows, 3);
        assert!(recs.iter().all(|r| r.path == vec!["TOP".to_owned()]));
    }

    #[test]
    fn expanded_emits_every_element_exactly_once() {
        let s = two_level_store();
        let recs = query_down(
            &s,
            "TOP",
            1,
            DownMode::Expanded,
            false,
            Guardrail::new(100),
        )
        .unwrap();
        // 1 single + 3x2 elements.
        assert_eq!(recs.len(), 7);

        let mut seen: Vec<(u32, u32)> = recs
            .iter()
            .filter_map(|r| r.element.map(|e| (e.row, e.col)))
            .collect();
        seen.sort_unstable();
        assert_eq!(
            seen,
            vec![(0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (2, 1)]
        );

        // Element (2, 1) sits at base shifted by (2*1000, 1*2000).
        let e21 = recs
            .iter()
            .find(|r| r.element == Some(ElementIndex { row: 2, col: 1 }))
            .unwrap();
        assert_eq!(e21.trans.disp, Point::new(2000, 2000));
    }

    #[test]
    fn depth_zero_clamps_to_direct_children() {
        let s = two_level_store();
        let zero = query_down(&s, "TOP", 0, DownMode::Structural, false, Guardrail::new(100))
            .unwrap();
        let one = query_down(&s, "TOP", 1, DownMode::Structural, false, Guardrail::new(100))
            .unwrap();
        assert_eq!(zero, one);
    }

    #[test]
    fn deeper_bound_reaches_nested_edges() {
        let s = two_level_store();
        let recs = query_down(
            &s,
            "TOP",
            2,
            DownMode::Structural,
            false,
            Guardrail::new(100),
        )
        .unwrap();
        // TOP->A, TOP->B, A->B. B has no children to descend into.
        assert_eq!(recs.len(), 3);
        let nested = recs.iter().find(|r| r.parent == "A").unwrap();
        assert_eq!(nested.path, vec!["TOP".to_owned(), "A".to_owned()]);
        assert_eq!(nested.child, "B");
    }

    #[test]
    fn strict_guardrail_discards_partial_output() {
        let s = two_level_store();
        let err = query_down(&s, "TOP", 1, DownMode::Structural, false, Guardrail::new(1))
            .unwrap_err();
        assert_eq!(err, QueryError::TooManyResults { limit: 1 });
    }

    #[test]
    fn unknown_root_is_not_found() {
        let s = two_level_store();
        let err =
            query_down(&s, "NOPE", 1, DownMode::Structural, false, Guardrail::new(10)).unwrap_err();
        assert_eq!(err, QueryError::CellNotFound("NOPE".into()));
    }

    #[test]
    fn include_bbox_places_child_geometry_in_root_frame() {
        let mut s = LayoutStore::new("t", "TOP", 0.001).unwrap();
        let top = s.find_cell("TOP").unwrap();
        let child = s.create_cell("CHILD").unwrap();
        let l0 = s.register_layer(LayerKey { layer: 1, datatype: 0 });
        s.insert_shape(
            child,
            l0,
            Shape::Box(BBox::new(Point::ZERO, Point::new(500, 500))),
        )
        .unwrap();
        s.insert_instance(top, child, Trans::translate(1000, 2000), None)
            .unwrap();

        let recs = query_down(&s, "TOP", 1, DownMode::Structural, true, Guardrail::new(10))
            .unwrap();
        assert_eq!(recs.len(), 1);
        let b = recs[0].bbox.unwrap();
        assert_eq!(
            (b.x1(), b.y1(), b.x2(), b.y2()),
            (1000, 2000, 1500, 2500)
        );
    }

    #[test]
    fn empty_child_has_no_bbox() {
        let mut s = LayoutStore::new("t", "TOP", 0.001).unwrap();
        let top = s.find_cell("TOP").unwrap();
        let hollow = s.create_cell("HOLLOW").unwrap();
        s.insert_instance(top, hollow, Trans::IDENTITY, None)
            .unwrap();

        let recs = query_down(&s, "TOP", 1, DownMode::Structural, true, Guardrail::new(10))
            .unwrap();
        assert_eq!(recs[0].bbox, None);
    }

    #[test]
    fn cycles_report_the_closing_edge_without_descending() {
        let mut s = LayoutStore::new("t", "A", 0.001).unwrap();
        let a = s.find_cell("A").unwrap();
        let b = s.create_cell("B").unwrap();
        s.insert_instance(a, b, Trans::IDENTITY, None).unwrap();
        s.insert_instance(b, a, Trans::IDENTITY, None).unwrap();

        let recs = query_down(&s, "A", 10, DownMode::Structural, false, Guardrail::new(100))
            .unwrap();
        // A->B, then B->A reported as a leaf; no second descent into A.
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[1].parent, "B");
        assert_eq!(recs[1].child, "A");
        assert_eq!(recs[1].path, vec!["A".to_owned(), "B".to_owned()]);
    }

    #[test]
    fn stats_count_expanded_elements() {
        let s = two_level_store();
        let stats = query_down_stats(&s, "TOP", 1, Guardrail::new(1000)).unwrap();
        assert_eq!(stats.total, 7);
        assert_eq!(stats.by_child_cell.get("A"), Some(&1));
        assert_eq!(stats.by_child_cell.get("B"), Some(&6));
        assert!(!stats.truncated);
    }

    #[test]
    fn stats_truncate_instead_of_failing() {
        let s = two_level_store();
        let stats = query_down_stats(&s, "TOP", 1, Guardrail::new(3)).unwrap();
        assert_eq!(stats.total, 3);
        assert!(stats.truncated);
    }

    #[test]
    fn bbox_covers_all_array_elements() {
        let mut s = LayoutStore::new("t", "TOP", 0.001).unwrap();
        let top = s.find_cell("TOP").unwrap();
        let tile = s.create_cell("TILE").unwrap();
        let l0 = s.register_layer(LayerKey { layer: 1, datatype: 0 });
        s.insert_shape(
            tile,
            l0,
            Shape::Box(BBox::new(Point::ZERO, Point::new(10, 10))),
        )
        .unwrap();
        // Grid spans x: 0..=210, y: 0..=110 over its elements.
        s.insert_instance(
            top,
            tile,
            Trans::IDENTITY,
            Some(ArraySpec {
                rows: 3,
                cols: 2,
                row_step: 100,
                col_step: 100,
            }),
        )
        .unwrap();
        // Nest once more so the memoized grid box feeds a parent union.
        let wrap = s.create_cell("WRAP").unwrap();
        s.insert_instance(wrap, top, Trans::translate(1000, 0), None)
            .unwrap();

        let recs = query_down(&s, "WRAP", 1, DownMode::Structural, true, Guardrail::new(10))
            .unwrap();
        let b = recs[0].bbox.unwrap();
        assert_eq!((b.x1(), b.y1(), b.x2(), b.y2()), (1000, 0, 1210, 110));
    }
}
