// SPDX-License-Identifier: Apache-2.0
//! In-memory design graph store: cells, per-layer shapes, instance edges.
//!
//! Pure data. Traversal lives in [`crate::walk`]; the store only resolves
//! names, hands out ordered edge and shape slices, and keeps the inbound
//! edge counts that make root detection cheap. Cyclic instantiation is
//! representable on purpose; every walker carries its own cycle guard.
use std::collections::BTreeMap;

use thiserror::Error;

use crate::error::QueryError;
use crate::geom::Trans;
use crate::ident::{CellId, LayerIndex};
use crate::shape::Shape;

/// Error returned by the build methods of [`LayoutStore`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// Cell names are unique; this one is taken.
    #[error("Cell '{0}' already exists")]
    DuplicateCell(String),
    /// A shape insert referenced a layer index that was never registered.
    #[error("Layer not available: index {0}")]
    LayerNotAvailable(u32),
    /// Shape contents failed validation.
    #[error("Malformed shape: {0}")]
    MalformedShape(&'static str),
    /// Array descriptors need at least one row and one column.
    #[error("Bad array: rows and cols must be >= 1 (got {rows}x{cols})")]
    BadArray {
        /// Requested row count.
        rows: u32,
        /// Requested column count.
        cols: u32,
    },
    /// The dbu scale factor must be a finite positive number.
    #[error("Bad dbu scale factor: {0}")]
    BadDbu(f64),
}

/// The `(layer, datatype)` pair a layer index was registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerKey {
    /// Layer number.
    pub layer: u32,
    /// Datatype number.
    pub datatype: u32,
}

/// A regular grid of placements sharing one child and base transform.
///
/// Element `(row, col)` with `0 <= row < rows`, `0 <= col < cols` sits at the
/// base transform shifted by `(row * row_step, col * col_step)`. Step vectors
/// are parent-frame displacements; the base rotation does not turn them.
/// Elements enumerate row-major (row outer, column inner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArraySpec {
    /// Number of rows; the row index advances x by `row_step`.
    pub rows: u32,
    /// Number of columns; the column index advances y by `col_step`.
    pub cols: u32,
    /// Per-row displacement in dbu.
    pub row_step: i64,
    /// Per-column displacement in dbu.
    pub col_step: i64,
}

impl ArraySpec {
    /// Total element count.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.rows as u64 * self.cols as u64
    }

    /// True when the grid has no elements (rejected at insert, so stored
    /// descriptors never are).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parent-frame displacement of element `(row, col)`.
    #[must_use]
    pub fn element_offset(&self, row: u32, col: u32) -> crate::geom::Point {
        crate::geom::Point::new(
            i64::from(row) * self.row_step,
            i64::from(col) * self.col_step,
        )
    }

    /// Effective transform of element `(row, col)` given the instance's base
    /// transform.
    #[must_use]
    pub fn element_trans(&self, base: &Trans, row: u32, col: u32) -> Trans {
        base.shifted(self.element_offset(row, col))
    }
}

/// A directed placement edge from a parent cell to a child cell.
///
/// The child is held as a store id, not an owning pointer; the store owns
/// every cell and never deletes one, so the reference cannot dangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    /// The placed child cell.
    pub child: CellId,
    /// Base rigid transform of the placement.
    pub trans: Trans,
    /// Grid descriptor; `None` for a single placement.
    pub array: Option<ArraySpec>,
}

/// A named, reusable definition: ordered child instances plus per-layer
/// shape lists.
#[derive(Debug, Clone)]
pub struct Cell {
    name: String,
    instances: Vec<Instance>,
    shapes: BTreeMap<LayerIndex, Vec<Shape>>,
    inbound: u32,
}

impl Cell {
    fn new(name: String) -> Self {
        Self {
            name,
            instances: Vec::new(),
            shapes: BTreeMap::new(),
            inbound: 0,
        }
    }

    /// Cell name, unique within the store.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Child instances in declaration order.
    #[must_use]
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// Shapes stored under `layer`, in insertion order. Empty for layers the
    /// cell has nothing on.
    #[must_use]
    pub fn shapes_on(&self, layer: LayerIndex) -> &[Shape] {
        self.shapes.get(&layer).map_or(&[], Vec::as_slice)
    }

    /// Layers this cell has shapes on, with the shapes, in index order.
    pub fn shape_layers(&self) -> impl Iterator<Item = (LayerIndex, &[Shape])> {
        self.shapes.iter().map(|(ix, v)| (*ix, v.as_slice()))
    }

    /// Number of inbound instance edges from anywhere in the store. Zero
    /// makes this a root cell.
    #[must_use]
    pub const fn inbound_count(&self) -> u32 {
        self.inbound
    }
}

/// The design database: cell table, name index, layer table, scale factor.
///
/// Cell ids are dense indices in creation order; name lookup goes through a
/// sorted index. Mutation is append-only, which is what keeps handed-out
/// [`CellId`]s permanently valid.
#[derive(Debug, Clone)]
pub struct LayoutStore {
    name: String,
    dbu: f64,
    cells: Vec<Cell>,
    names: BTreeMap<String, CellId>,
    layers: Vec<LayerKey>,
}

impl LayoutStore {
    /// Creates a store with one cell, `top_cell`, already present.
    ///
    /// `name` labels the database itself and becomes the implicit outer
    /// container element of upward paths. `dbu` is the scale factor in
    /// micrometers per integer unit.
    pub fn new(name: &str, top_cell: &str, dbu: f64) -> Result<Self, BuildError> {
        if !(dbu.is_finite() && dbu > 0.0) {
            return Err(BuildError::BadDbu(dbu));
        }
        let mut store = Self {
            name: name.to_owned(),
            dbu,
            cells: Vec::new(),
            names: BTreeMap::new(),
            layers: Vec::new(),
        };
        // The fresh store cannot collide on the first name.
        let _ = store.create_cell(top_cell)?;
        Ok(store)
    }

    /// Database name; the implicit container in upward paths.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Micrometers per dbu.
    #[must_use]
    pub fn dbu(&self) -> f64 {
        self.dbu
    }

    /// Adds an empty cell. Names are unique.
    pub fn create_cell(&mut self, name: &str) -> Result<CellId, BuildError> {
        if self.names.contains_key(name) {
            return Err(BuildError::DuplicateCell(name.to_owned()));
        }
        let id = CellId::new(self.cells.len() as u32);
        self.cells.push(Cell::new(name.to_owned()));
        self.names.insert(name.to_owned(), id);
        Ok(id)
    }

    /// Resolves a cell name.
    #[must_use]
    pub fn find_cell(&self, name: &str) -> Option<CellId> {
        self.names.get(name).copied()
    }

    /// Resolves a cell name or reports [`QueryError::CellNotFound`].
    pub fn resolve(&self, name: &str) -> Result<CellId, QueryError> {
        self.find_cell(name)
            .ok_or_else(|| QueryError::CellNotFound(name.to_owned()))
    }

    /// The cell behind an id minted by this store.
    #[must_use]
    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.index() as usize]
    }

    /// Cell name lookup by id.
    #[must_use]
    pub fn cell_name(&self, id: CellId) -> &str {
        self.cell(id).name()
    }

    /// All cells with their ids, in creation order.
    pub fn cells(&self) -> impl Iterator<Item = (CellId, &Cell)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, c)| (CellId::new(i as u32), c))
    }

    /// Number of cells in the store.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Registers `(layer, datatype)` and returns its index. Registering the
    /// same pair again returns the existing index.
    pub fn register_layer(&mut self, key: LayerKey) -> LayerIndex {
        if let Some(i) = self.layers.iter().position(|k| *k == key) {
            return LayerIndex::new(i as u32);
        }
        let ix = LayerIndex::new(self.layers.len() as u32);
        self.layers.push(key);
        ix
    }

    /// The layer table in index order.
    #[must_use]
    pub fn layers(&self) -> &[LayerKey] {
        &self.layers
    }

    /// True when `ix` is a registered layer index.
    #[must_use]
    pub fn has_layer(&self, ix: LayerIndex) -> bool {
        (ix.index() as usize) < self.layers.len()
    }

    /// Appends a shape under `layer` of `cell`.
    ///
    /// Validates the shape contents here so traversal never meets an empty
    /// point list: polygons need at least 3 points, paths at least 2 and a
    /// non-negative width.
    pub fn insert_shape(
        &mut self,
        cell: CellId,
        layer: LayerIndex,
        shape: Shape,
    ) -> Result<(), BuildError> {
        if !self.has_layer(layer) {
            return Err(BuildError::LayerNotAvailable(layer.index()));
        }
        match &shape {
            Shape::Box(_) => {}
            Shape::Polygon { points } => {
                if points.len() < 3 {
                    return Err(BuildError::MalformedShape("polygon needs at least 3 points"));
                }
            }
            Shape::Path { points, width } => {
                if points.len() < 2 {
                    return Err(BuildError::MalformedShape("path needs at least 2 points"));
                }
                if *width < 0 {
                    return Err(BuildError::MalformedShape("path width must be >= 0"));
                }
            }
        }
        self.cells[cell.index() as usize]
            .shapes
            .entry(layer)
            .or_default()
            .push(shape);
        Ok(())
    }

    /// Appends an instance edge to `parent` and bumps the child's inbound
    /// count. `array` of zero rows or columns is rejected. Self-instantiation
    /// and cycles are allowed here; walkers guard against them.
    pub fn insert_instance(
        &mut self,
        parent: CellId,
        child: CellId,
        trans: Trans,
        array: Option<ArraySpec>,
    ) -> Result<(), BuildError> {
        if let Some(a) = array {
            if a.is_empty() {
                return Err(BuildError::BadArray {
                    rows: a.rows,
                    cols: a.cols,
                });
            }
        }
        self.cells[child.index() as usize].inbound += 1;
        self.cells[parent.index() as usize].instances.push(Instance {
            child,
            trans,
            array,
        });
        Ok(())
    }

    /// Instances of `cell` in declaration order.
    #[must_use]
    pub fn instances(&self, cell: CellId) -> &[Instance] {
        self.cell(cell).instances()
    }

    /// Shapes of `cell` on `layer` in insertion order.
    #[must_use]
    pub fn shapes(&self, cell: CellId, layer: LayerIndex) -> &[Shape] {
        self.cell(cell).shapes_on(layer)
    }

    /// Root cells (no inbound edges) in creation order.
    pub fn root_cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.cells()
            .filter(|(_, c)| c.inbound_count() == 0)
            .map(|(id, _)| id)
    }

    /// The single root of the hierarchy.
    ///
    /// # Errors
    /// [`QueryError::NoTopCell`] when every cell has an inbound edge,
    /// [`QueryError::MultipleTopCells`] when more than one cell has none.
    pub fn single_top(&self) -> Result<CellId, QueryError> {
        let mut roots = self.root_cells();
        let Some(first) = roots.next() else {
            return Err(QueryError::NoTopCell);
        };
        let rest: Vec<CellId> = roots.collect();
        if rest.is_empty() {
            return Ok(first);
        }
        let mut names = vec![self.cell_name(first).to_owned()];
        names.extend(rest.into_iter().map(|id| self.cell_name(id).to_owned()));
        Err(QueryError::MultipleTopCells(names))
    }
}
