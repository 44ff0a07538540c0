// SPDX-License-Identifier: Apache-2.0
//! Session state and method dispatch.
//!
//! One [`Session`] holds the live layout and the current-layer cursor. The
//! whole session sits behind one exclusive lock in [`crate::net`]; dispatch
//! itself is synchronous and touches no I/O, which keeps it directly
//! testable without a socket.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use reticle_core::geom::{BBox, Point};
use reticle_core::walk::{
    hierarchy_depth, query_down, query_down_stats, query_up_paths, shapes_rec, Unit,
};
use reticle_core::{CellId, Guardrail, LayerIndex, LayerKey, LayoutStore, Shape, ShapeKind};
use reticle_proto::methods::{
    CellCreateParams, CellsResult, Coords, CreatedResult, DbuResult, HierarchyDepthResult,
    InsertedResult, InstanceArrayCreateParams, InstanceCreateParams, LayerEntry, LayerNewParams,
    LayerNewResult, LayersResult, LayoutNewParams, LayoutNewResult, PingResult, QueryDownParams,
    QueryDownResult, QueryDownStatsParams, ShapeCreateParams, ShapesRecParams, ShapesRecResult,
    TopCellResult, UpPathsParams, UpPathsResult,
};
use reticle_proto::{decode_request, method, ErrorCode, Response, RpcError};

/// Convention string reported by `layout.get_hierarchy_depth`.
const DEPTH_DEFINITION: &str =
    "top cell at depth 0; longest root-to-leaf instantiation chain, cycle-guarded";

/// Mutable service state shared by every connection.
#[derive(Debug, Default)]
pub struct Session {
    layout: Option<LayoutStore>,
    current_layer: Option<LayerIndex>,
}

fn parse_params<T: DeserializeOwned>(params: Option<&Value>) -> Result<T, RpcError> {
    let value = params
        .cloned()
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
    serde_json::from_value(value).map_err(|e| RpcError::invalid_params(e.to_string()))
}

fn to_result<T: Serialize>(payload: &T) -> Result<Value, RpcError> {
    serde_json::to_value(payload)
        .map_err(|e| RpcError::new(ErrorCode::InternalError, e.to_string()))
}

/// Snaps one wire coordinate to the dbu grid.
fn to_dbu(v: f64, unit: Unit, dbu: f64) -> i64 {
    match unit {
        Unit::Dbu => v.round() as i64,
        Unit::Micron => (v / dbu).round() as i64,
    }
}

fn shape_from_params(p: &ShapeCreateParams, dbu: f64) -> Result<Shape, RpcError> {
    let snap = |v: f64| to_dbu(v, p.units, dbu);
    match (p.shape_type, &p.coords) {
        (ShapeKind::Box, Coords::Flat(v)) => {
            let [x1, y1, x2, y2] = v.as_slice() else {
                return Err(RpcError::invalid_params(
                    "box coords must be [x1, y1, x2, y2]",
                ));
            };
            Ok(Shape::Box(BBox::new(
                Point::new(snap(*x1), snap(*y1)),
                Point::new(snap(*x2), snap(*y2)),
            )))
        }
        (ShapeKind::Box, Coords::Pairs(_)) => Err(RpcError::invalid_params(
            "box coords must be [x1, y1, x2, y2]",
        )),
        (ShapeKind::Polygon, Coords::Pairs(ps)) => Ok(Shape::Polygon {
            points: ps
                .iter()
                .map(|[x, y]| Point::new(snap(*x), snap(*y)))
                .collect(),
        }),
        (ShapeKind::Path, Coords::Pairs(ps)) => {
            let Some(width) = p.width else {
                return Err(RpcError::invalid_params("path requires width"));
            };
            Ok(Shape::Path {
                points: ps
                    .iter()
                    .map(|[x, y]| Point::new(snap(*x), snap(*y)))
                    .collect(),
                width: snap(width),
            })
        }
        (ShapeKind::Polygon | ShapeKind::Path, Coords::Flat(_)) => Err(RpcError::invalid_params(
            "polygon and path coords must be [[x, y], ...]",
        )),
    }
}

impl Session {
    /// Fresh session: no layout, no current layer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> Result<&LayoutStore, RpcError> {
        self.layout.as_ref().ok_or_else(|| {
            RpcError::new(
                ErrorCode::NoActiveLayout,
                "No active layout: call layout.new first",
            )
        })
    }

    fn store_mut(&mut self) -> Result<&mut LayoutStore, RpcError> {
        self.layout.as_mut().ok_or_else(|| {
            RpcError::new(
                ErrorCode::NoActiveLayout,
                "No active layout: call layout.new first",
            )
        })
    }

    /// Runs one method and returns its result payload.
    ///
    /// # Errors
    /// An [`RpcError`] carrying the wire code for every failure mode of the
    /// method, per the protocol's error table.
    pub fn dispatch(&mut self, name: &str, params: Option<&Value>) -> Result<Value, RpcError> {
        debug!(method = name, "dispatch");
        match name {
            method::PING => to_result(&PingResult { pong: true }),
            method::LAYOUT_NEW => self.layout_new(params),
            method::LAYER_NEW => self.layer_new(params),
            method::CELL_CREATE => self.cell_create(params),
            method::SHAPE_CREATE => self.shape_create(params),
            method::INSTANCE_CREATE => self.instance_create(params),
            method::INSTANCE_ARRAY_CREATE => self.instance_array_create(params),
            method::LAYOUT_GET_TOPCELL => self.get_topcell(),
            method::LAYOUT_GET_LAYERS => self.get_layers(),
            method::LAYOUT_GET_DBU => self.get_dbu(),
            method::LAYOUT_GET_CELLS => self.get_cells(),
            method::LAYOUT_GET_HIERARCHY_DEPTH => self.get_hierarchy_depth(),
            method::HIER_QUERY_DOWN => self.query_down(params),
            method::HIER_QUERY_DOWN_STATS => self.query_down_stats(params),
            method::HIER_QUERY_UP_PATHS => self.query_up_paths(params),
            method::HIER_SHAPES_REC => self.shapes_rec(params),
            other => Err(RpcError::new(
                ErrorCode::MethodNotFound,
                format!("Method not found: '{other}'"),
            )),
        }
    }

    fn layout_new(&mut self, params: Option<&Value>) -> Result<Value, RpcError> {
        let p: LayoutNewParams = parse_params(params)?;
        if self.layout.is_some() && !p.clear_previous {
            return Err(RpcError::new(
                ErrorCode::LayoutExists,
                "A layout is already active; pass clear_previous to replace it",
            ));
        }
        let store =
            LayoutStore::new(&p.name, &p.top_cell, p.dbu).map_err(|e| RpcError::from_build(&e))?;
        let dbu = store.dbu();
        self.layout = Some(store);
        self.current_layer = None;
        to_result(&LayoutNewResult {
            top_cell: p.top_cell,
            dbu,
        })
    }

    fn layer_new(&mut self, params: Option<&Value>) -> Result<Value, RpcError> {
        let p: LayerNewParams = parse_params(params)?;
        let store = self.store_mut()?;
        let ix = store.register_layer(LayerKey {
            layer: p.layer,
            datatype: p.datatype,
        });
        if p.as_current {
            self.current_layer = Some(ix);
        }
        to_result(&LayerNewResult {
            layer_index: ix.index(),
        })
    }

    fn cell_create(&mut self, params: Option<&Value>) -> Result<Value, RpcError> {
        let p: CellCreateParams = parse_params(params)?;
        let store = self.store_mut()?;
        store
            .create_cell(&p.name)
            .map_err(|e| RpcError::from_build(&e))?;
        to_result(&CreatedResult { created: true })
    }

    fn shape_create(&mut self, params: Option<&Value>) -> Result<Value, RpcError> {
        let p: ShapeCreateParams = parse_params(params)?;
        let current = self.current_layer;
        let store = self.store_mut()?;
        let cell = store.resolve(&p.cell).map_err(|e| RpcError::from_query(&e))?;
        let layer = match p.layer_index {
            Some(ix) => LayerIndex::new(ix),
            None => current.ok_or_else(|| {
                RpcError::invalid_params("layer_index required: no current layer is set")
            })?,
        };
        let shape = shape_from_params(&p, store.dbu())?;
        store
            .insert_shape(cell, layer, shape)
            .map_err(|e| RpcError::from_build(&e))?;
        to_result(&CreatedResult { created: true })
    }

    fn resolve_edge(
        store: &LayoutStore,
        parent: &str,
        child: &str,
    ) -> Result<(CellId, CellId), RpcError> {
        let parent_id = store.resolve(parent).map_err(|e| RpcError::from_query(&e))?;
        let child_id = store.find_cell(child).ok_or_else(|| {
            RpcError::new(
                ErrorCode::ChildCellNotFound,
                format!("Child cell not found: '{child}'"),
            )
        })?;
        Ok((parent_id, child_id))
    }

    fn instance_create(&mut self, params: Option<&Value>) -> Result<Value, RpcError> {
        let p: InstanceCreateParams = parse_params(params)?;
        let store = self.store_mut()?;
        let (parent, child) = Self::resolve_edge(store, &p.cell, &p.child_cell)?;
        store
            .insert_instance(parent, child, p.trans, None)
            .map_err(|e| RpcError::from_build(&e))?;
        to_result(&InsertedResult { inserted: true })
    }

    fn instance_array_create(&mut self, params: Option<&Value>) -> Result<Value, RpcError> {
        let p: InstanceArrayCreateParams = parse_params(params)?;
        let store = self.store_mut()?;
        let (parent, child) = Self::resolve_edge(store, &p.cell, &p.child_cell)?;
        store
            .insert_instance(parent, child, p.trans, Some(p.array))
            .map_err(|e| RpcError::from_build(&e))?;
        to_result(&InsertedResult { inserted: true })
    }

    fn get_topcell(&self) -> Result<Value, RpcError> {
        let store = self.store()?;
        let top = store.single_top().map_err(|e| RpcError::from_query(&e))?;
        to_result(&TopCellResult {
            top_cell: store.cell_name(top).to_owned(),
        })
    }

    fn get_layers(&self) -> Result<Value, RpcError> {
        let store = self.store()?;
        let layers = store
            .layers()
            .iter()
            .enumerate()
            .map(|(i, key)| LayerEntry {
                layer_index: i as u32,
                layer: key.layer,
                datatype: key.datatype,
            })
            .collect();
        to_result(&LayersResult { layers })
    }

    fn get_dbu(&self) -> Result<Value, RpcError> {
        let store = self.store()?;
        to_result(&DbuResult { dbu: store.dbu() })
    }

    fn get_cells(&self) -> Result<Value, RpcError> {
        let store = self.store()?;
        let cells = store.cells().map(|(_, c)| c.name().to_owned()).collect();
        to_result(&CellsResult { cells })
    }

    fn get_hierarchy_depth(&self) -> Result<Value, RpcError> {
        let store = self.store()?;
        let depth = hierarchy_depth(store).map_err(|e| RpcError::from_query(&e))?;
        to_result(&HierarchyDepthResult {
            depth,
            depth_definition: DEPTH_DEFINITION.to_owned(),
        })
    }

    fn query_down(&self, params: Option<&Value>) -> Result<Value, RpcError> {
        let p: QueryDownParams = parse_params(params)?;
        let store = self.store()?;
        let instances = query_down(
            store,
            &p.cell,
            p.depth,
            p.mode,
            p.include_bbox,
            Guardrail::new(p.max_results),
        )
        .map_err(|e| RpcError::from_query(&e))?;
        to_result(&QueryDownResult { instances })
    }

    fn query_down_stats(&self, params: Option<&Value>) -> Result<Value, RpcError> {
        let p: QueryDownStatsParams = parse_params(params)?;
        let store = self.store()?;
        let stats = query_down_stats(store, &p.cell, p.depth, Guardrail::new(p.max_results))
            .map_err(|e| RpcError::from_query(&e))?;
        to_result(&stats)
    }

    fn query_up_paths(&self, params: Option<&Value>) -> Result<Value, RpcError> {
        let p: UpPathsParams = parse_params(params)?;
        let store = self.store()?;
        let paths = query_up_paths(store, &p.cell, Guardrail::new(p.max_paths))
            .map_err(|e| RpcError::from_query(&e))?;
        to_result(&UpPathsResult { paths })
    }

    fn shapes_rec(&self, params: Option<&Value>) -> Result<Value, RpcError> {
        let p: ShapesRecParams = parse_params(params)?;
        let store = self.store()?;
        let layers: Option<Vec<LayerIndex>> = p
            .layers
            .as_ref()
            .map(|ixs| ixs.iter().copied().map(LayerIndex::new).collect());
        let scan = shapes_rec(
            store,
            &p.start_cell,
            layers.as_deref(),
            p.unit,
            p.include_transform,
            Guardrail::new(p.max_results),
        )
        .map_err(|e| RpcError::from_query(&e))?;
        to_result(&ShapesRecResult {
            shapes: scan.shapes,
            truncated: scan.truncated,
            unit: p.unit,
        })
    }
}

/// Decodes, dispatches, and serializes one request line.
///
/// Returns the response line without its trailing newline, or `None` for
/// notifications (executed, never answered). Decode failures always produce
/// a response, with a `null` id, since the request id never materialized.
pub fn handle_line(session: &mut Session, line: &str) -> Option<String> {
    let response = match decode_request(line) {
        Ok(req) => {
            let outcome = session.dispatch(&req.method, req.params.as_ref());
            let Some(id) = req.id else {
                // Notification: outcome is dropped, errors included.
                return None;
            };
            match outcome {
                Ok(result) => Response::success(id, result),
                Err(err) => Response::failure(Some(id), err),
            }
        }
        Err(wire) => Response::failure(None, RpcError::new(wire.code(), wire.to_string())),
    };
    serde_json::to_string(&response).ok()
}
