// SPDX-License-Identifier: Apache-2.0
//! reticle-core: hierarchical layout database with bounded graph traversal.
//!
//! A [`LayoutStore`] holds cells, their per-layer shapes, and directed
//! instance edges (single placements or regular arrays) in exact integer
//! database units. The [`walk`] module answers the questions that matter on
//! such a graph: what is instantiated below a cell, how does a cell reach
//! the root, and which shapes exist in a subtree, with every traversal
//! bounded by an explicit [`Guardrail`] so no query can run away on a
//! pathological hierarchy.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::use_self
)]

/// Exact integer geometry: points, quarter-turn transforms, bounding boxes.
pub mod geom;

mod error;
mod ident;
mod limits;
mod shape;
mod store;
/// Bounded traversals: downward instance queries, upward path enumeration,
/// recursive shape sweeps, hierarchy depth.
pub mod walk;

// Re-exports for stable public API
/// Traversal failure taxonomy shared by every walker.
pub use error::QueryError;
/// Opaque identifiers for cells and layer-table slots.
pub use ident::{CellId, LayerIndex};
/// Result-count guardrail and the per-operation default limits.
pub use limits::{
    Guardrail, Verdict, DEFAULT_INSTANCE_RESULTS, DEFAULT_PATH_RESULTS, DEFAULT_SHAPE_RESULTS,
    DEFAULT_STATS_ELEMENTS,
};
/// Geometric primitives stored on cells.
pub use shape::{Shape, ShapeKind};
/// The layout database: cells, layers, shapes, and instance edges.
pub use store::{ArraySpec, BuildError, Cell, Instance, LayerKey, LayoutStore};
/// Containment chains reported by the walkers.
pub use walk::SegmentPath;
