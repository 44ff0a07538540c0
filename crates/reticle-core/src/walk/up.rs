// SPDX-License-Identifier: Apache-2.0
//! Upward path enumeration: every placement path from the single root down
//! to a target cell.
//!
//! "Upward" names the question (who contains this cell), not the walk; the
//! search itself runs forward from the root so declaration order stays the
//! enumeration order. Strict guardrail: too many paths aborts the call.

use rustc_hash::FxHashSet;

use crate::error::QueryError;
use crate::ident::CellId;
use crate::limits::{Guardrail, Verdict};
use crate::store::LayoutStore;
use crate::walk::SegmentPath;

struct Frame {
    cell: CellId,
    next: usize,
}

/// Enumerates all distinct placement paths from the database's single root
/// cell to `target`.
///
/// Each returned path reads `[container, root, ..., target]`, where the
/// container is the database name. Branching follows instance edges, so two
/// sibling placements of the same child yield two (textually equal) paths;
/// an array edge is one placement regardless of element count. Reaching the
/// target ends a branch, and a branch never re-enters a cell already on its
/// path. An unreachable target yields zero paths.
///
/// # Errors
/// [`QueryError::CellNotFound`] for an unknown target;
/// [`QueryError::NoTopCell`] / [`QueryError::MultipleTopCells`] when the
/// database does not have exactly one root;
/// [`QueryError::TooManyResults`] when more than `max_paths` paths exist
/// (strict, no partial results).
pub fn query_up_paths(
    store: &LayoutStore,
    target: &str,
    guard: Guardrail,
) -> Result<Vec<SegmentPath>, QueryError> {
    let target_id = store.resolve(target)?;
    let root_id = store.single_top()?;

    let mut paths: Vec<SegmentPath> = Vec::new();
    let mut path: SegmentPath = vec![
        store.name().to_owned(),
        store.cell_name(root_id).to_owned(),
    ];

    if root_id == target_id {
        // Any deeper occurrence of the target would re-enter the root, which
        // the cycle guard forbids; this is the only path.
        paths.push(path);
        return Ok(paths);
    }

    let mut on_path: FxHashSet<CellId> = FxHashSet::default();
    on_path.insert(root_id);
    let mut frames = vec![Frame {
        cell: root_id,
        next: 0,
    }];

    while let Some(top) = frames.last_mut() {
        let cell = top.cell;
        let idx = top.next;
        let insts = store.instances(cell);

        if idx >= insts.len() {
            frames.pop();
            on_path.remove(&cell);
            path.pop();
            continue;
        }
        top.next = idx + 1;

        let child = insts[idx].child;
        if child == target_id {
            if guard.accept(paths.len()) == Verdict::Reject {
                return Err(QueryError::TooManyResults {
                    limit: guard.limit(),
                });
            }
            let mut hit = path.clone();
            hit.push(store.cell_name(child).to_owned());
            paths.push(hit);
        } else if !on_path.contains(&child) {
            on_path.insert(child);
            path.push(store.cell_name(child).to_owned());
            frames.push(Frame {
                cell: child,
                next: 0,
            });
        }
    }

    Ok(paths)
}
