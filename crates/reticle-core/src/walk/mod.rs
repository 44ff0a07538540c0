// SPDX-License-Identifier: Apache-2.0
//! Bounded traversal over the design graph.
//!
//! Three walkers share one discipline: explicit frame stacks instead of
//! native recursion, a stack-carried on-path set as the cycle guard (per
//! active path, never global), and a [`crate::limits::Guardrail`] consulted
//! on every candidate result. See each submodule for the per-operation
//! strict/truncating contract.

use rustc_hash::FxHashSet;

use crate::error::QueryError;
use crate::ident::CellId;
use crate::store::LayoutStore;

pub mod down;
pub mod shapes;
pub mod up;

pub use down::{
    query_down, query_down_stats, DownMode, DownStats, ElementIndex, InstanceKind, InstanceRecord,
};
pub use shapes::{shapes_rec, ShapeRecord, ShapeScan, Unit};
pub use up::query_up_paths;

/// Ordered cell names describing a containment chain.
pub type SegmentPath = Vec<String>;

/// Longest root-to-leaf instantiation chain, with the single top cell at
/// depth 0.
///
/// Memoized over the cell DAG; an edge that would re-enter a cell already on
/// the evaluation stack is skipped, so cyclic designs terminate with the
/// depth of their acyclic unrolling.
///
/// # Errors
/// Propagates the single-root precondition from
/// [`LayoutStore::single_top`].
pub fn hierarchy_depth(store: &LayoutStore) -> Result<u32, QueryError> {
    enum Task {
        Visit(CellId),
        Finish(CellId),
    }

    let top = store.single_top()?;
    let mut memo: rustc_hash::FxHashMap<CellId, u32> = rustc_hash::FxHashMap::default();
    let mut active: FxHashSet<CellId> = FxHashSet::default();
    let mut tasks = vec![Task::Visit(top)];

    while let Some(task) = tasks.pop() {
        match task {
            Task::Visit(id) => {
                if memo.contains_key(&id) || active.contains(&id) {
                    continue;
                }
                active.insert(id);
                tasks.push(Task::Finish(id));
                for inst in store.instances(id) {
                    tasks.push(Task::Visit(inst.child));
                }
            }
            Task::Finish(id) => {
                // Children cut by the cycle guard have no memo entry and
                // contribute nothing; the cell then counts as a leaf of the
                // acyclic unrolling.
                let depth = store
                    .instances(id)
                    .iter()
                    .filter_map(|inst| memo.get(&inst.child))
                    .max()
                    .map_or(0, |deepest| deepest + 1);
                memo.insert(id, depth);
                active.remove(&id);
            }
        }
    }

    Ok(memo.get(&top).copied().unwrap_or(0))
}
