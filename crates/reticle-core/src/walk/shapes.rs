// SPDX-License-Identifier: Apache-2.0
//! Recursive shape enumeration with hierarchical paths.
//!
//! Truncating contract: hitting the guardrail stops the walk and returns
//! what was collected with `truncated = true`. Partial geometry is still
//! useful, and the flag lets callers re-scope.

use rustc_hash::FxHashSet;

use crate::error::QueryError;
use crate::geom::Trans;
use crate::ident::{CellId, LayerIndex};
use crate::limits::{Guardrail, Verdict};
use crate::store::LayoutStore;
use crate::walk::SegmentPath;

/// Output coordinate system of a shape sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Unit {
    /// Raw integer database units, reported as floats with scale 1.
    #[cfg_attr(feature = "serde", serde(rename = "dbu"))]
    Dbu,
    /// Micrometers: dbu multiplied by the store's scale factor.
    #[cfg_attr(feature = "serde", serde(rename = "um"))]
    #[default]
    Micron,
}

impl Unit {
    /// Multiplier from dbu to this unit for a store with the given scale
    /// factor.
    #[must_use]
    pub fn scale(self, dbu: f64) -> f64 {
        match self {
            Self::Dbu => 1.0,
            Self::Micron => dbu,
        }
    }
}

/// One shape occurrence, placed into the start cell's frame.
///
/// Every coordinate is transformed in exact integer arithmetic along the
/// instance chain and scaled once at the end, so two occurrences of the same
/// shape under equal chains reproduce bit-identical output.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShapeRecord {
    /// Primitive kind.
    pub shape_type: crate::shape::ShapeKind,
    /// Transformed outline in the requested unit: polygon hull or path
    /// centerline. Empty for boxes, whose geometry is the bounding box.
    pub points: Vec<[f64; 2]>,
    /// Path width in the requested unit.
    #[cfg_attr(
        feature = "serde",
        serde(skip_serializing_if = "Option::is_none", default)
    )]
    pub width: Option<f64>,
    /// Bounding box of the shape alone as `[x1, y1, x2, y2]`, transformed
    /// and scaled like the points.
    pub bbox: [f64; 4],
    /// Layer the shape lives on.
    pub layer_index: LayerIndex,
    /// Child-cell names from the start cell down to and including the owning
    /// cell; empty for shapes of the start cell itself.
    pub hierarchy_path: SegmentPath,
    /// Accumulated dbu transform of the owning cell's frame, when requested.
    #[cfg_attr(
        feature = "serde",
        serde(skip_serializing_if = "Option::is_none", default)
    )]
    pub trans: Option<Trans>,
}

/// Result of a shape sweep.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShapeScan {
    /// Collected records, in walk order.
    pub shapes: Vec<ShapeRecord>,
    /// True when the guardrail stopped the sweep early.
    pub truncated: bool,
}

struct Frame {
    cell: CellId,
    /// Maps this cell's frame into the start cell's frame.
    trans: Trans,
    /// Next instance edge of `cell`.
    inst: usize,
    /// Next element within the current edge's grid (row-major linear).
    elem: u64,
}

struct LayerWalk<'a> {
    store: &'a LayoutStore,
    layer: LayerIndex,
    scale: f64,
    include_transform: bool,
    guard: Guardrail,
    out: &'a mut Vec<ShapeRecord>,
}

impl LayerWalk<'_> {
    /// Emits every shape of `cell` on the walk's layer. Returns `false` when
    /// the guardrail rejected one, which ends the whole sweep.
    fn emit(&mut self, cell: CellId, acc: &Trans, rel_path: &[String]) -> bool {
        for shape in self.store.shapes(cell, self.layer) {
            if self.guard.accept(self.out.len()) == Verdict::Reject {
                return false;
            }
            self.out.push(ShapeRecord {
                shape_type: shape.kind(),
                points: shape
                    .outline()
                    .iter()
                    .map(|&p| {
                        let q = acc.apply(p);
                        [q.x as f64 * self.scale, q.y as f64 * self.scale]
                    })
                    .collect(),
                width: shape.width().map(|w| w as f64 * self.scale),
                bbox: shape.bbox().transformed(acc).scaled(self.scale),
                layer_index: self.layer,
                hierarchy_path: rel_path.to_vec(),
                trans: self.include_transform.then_some(*acc),
            });
        }
        true
    }
}

/// Enumerates every shape on the requested layers in the subtree below
/// `start`, each with the cell-name path that reached it.
///
/// Each layer is walked independently, in the requested order (`None` walks
/// every registered layer in index order). The walk is depth-first preorder:
/// a cell's own shapes first, then its instance edges in declaration order,
/// array elements row-major, descending per element with the element's
/// effective transform. A child already on the current path is skipped, so
/// cyclic designs terminate with each placement reported once per path.
///
/// # Errors
/// [`QueryError::CellNotFound`] for an unknown start cell;
/// [`QueryError::LayerNotAvailable`] when an explicitly requested layer
/// index is not in the table (checked before any walking).
pub fn shapes_rec(
    store: &LayoutStore,
    start: &str,
    layers: Option<&[LayerIndex]>,
    unit: Unit,
    include_transform: bool,
    guard: Guardrail,
) -> Result<ShapeScan, QueryError> {
    let start_id = store.resolve(start)?;
    let layer_list: Vec<LayerIndex> = match layers {
        Some(requested) => {
            for &ix in requested {
                if !store.has_layer(ix) {
                    return Err(QueryError::LayerNotAvailable(ix.index()));
                }
            }
            requested.to_vec()
        }
        None => (0..store.layers().len() as u32).map(LayerIndex::new).collect(),
    };
    let scale = unit.scale(store.dbu());

    let mut shapes: Vec<ShapeRecord> = Vec::new();
    let mut truncated = false;

    'layers: for &layer in &layer_list {
        let mut walk = LayerWalk {
            store,
            layer,
            scale,
            include_transform,
            guard,
            out: &mut shapes,
        };
        let mut on_path: FxHashSet<CellId> = FxHashSet::default();
        let mut rel_path: SegmentPath = Vec::new();
        let mut frames = vec![Frame {
            cell: start_id,
            trans: Trans::IDENTITY,
            inst: 0,
            elem: 0,
        }];
        on_path.insert(start_id);

        if !walk.emit(start_id, &Trans::IDENTITY, &rel_path) {
            truncated = true;
            break 'layers;
        }

        while let Some(top) = frames.last_mut() {
            let insts = store.instances(top.cell);
            if top.inst >= insts.len() {
                let cell = top.cell;
                let is_start = frames.len() == 1;
                frames.pop();
                on_path.remove(&cell);
                if !is_start {
                    rel_path.pop();
                }
                continue;
            }

            let inst = &insts[top.inst];
            let elements = inst.array.as_ref().map_or(1, crate::store::ArraySpec::len);
            if top.elem >= elements {
                top.inst += 1;
                top.elem = 0;
                continue;
            }
            let e = top.elem;
            top.elem = e + 1;

            let etrans = inst.array.map_or(inst.trans, |a| {
                let cols = u64::from(a.cols);
                a.element_trans(&inst.trans, (e / cols) as u32, (e % cols) as u32)
            });
            let child = inst.child;
            if on_path.contains(&child) {
                continue;
            }
            let acc = top.trans.compose(&etrans);

            on_path.insert(child);
            rel_path.push(store.cell_name(child).to_owned());
            if !walk.emit(child, &acc, &rel_path) {
                truncated = true;
                break 'layers;
            }
            frames.push(Frame {
                cell: child,
                trans: acc,
                inst: 0,
                elem: 0,
            });
        }
    }

    Ok(ShapeScan { shapes, truncated })
}
