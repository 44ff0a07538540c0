// SPDX-License-Identifier: Apache-2.0
//! Wire schema for the Reticle query service.
//!
//! JSON-RPC 2.0, one JSON object per line. This crate owns everything both
//! sides must agree on: the request/response envelopes, the method name
//! strings, per-method parameter and result types (with their wire defaults
//! and aliases), and the error-code table. The server and client never
//! hand-build protocol JSON.

pub mod codes;
pub mod methods;

pub use codes::ErrorCode;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Protocol version string carried by every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// Method name strings shared by server dispatch and client wrappers.
pub mod method {
    /// Liveness probe.
    pub const PING: &str = "ping";
    /// Create or replace the active layout.
    pub const LAYOUT_NEW: &str = "layout.new";
    /// Register a `(layer, datatype)` pair.
    pub const LAYER_NEW: &str = "layer.new";
    /// Create an empty cell.
    pub const CELL_CREATE: &str = "cell.create";
    /// Append a shape to a cell.
    pub const SHAPE_CREATE: &str = "shape.create";
    /// Place a child cell once.
    pub const INSTANCE_CREATE: &str = "instance.create";
    /// Place a child cell as a regular grid.
    pub const INSTANCE_ARRAY_CREATE: &str = "instance_array.create";
    /// Resolve the single root cell.
    pub const LAYOUT_GET_TOPCELL: &str = "layout.get_topcell";
    /// List the layer table.
    pub const LAYOUT_GET_LAYERS: &str = "layout.get_layers";
    /// Report the dbu scale factor.
    pub const LAYOUT_GET_DBU: &str = "layout.get_dbu";
    /// List cells in creation order.
    pub const LAYOUT_GET_CELLS: &str = "layout.get_cells";
    /// Longest root-to-leaf instantiation chain.
    pub const LAYOUT_GET_HIERARCHY_DEPTH: &str = "layout.get_hierarchy_depth";
    /// Downward instance enumeration.
    pub const HIER_QUERY_DOWN: &str = "hier.query_down";
    /// Downward placement counting.
    pub const HIER_QUERY_DOWN_STATS: &str = "hier.query_down_stats";
    /// Upward path enumeration.
    pub const HIER_QUERY_UP_PATHS: &str = "hier.query_up_paths";
    /// Recursive shape sweep.
    pub const HIER_SHAPES_REC: &str = "hier.shapes_rec";
}

/// Request/response correlation id.
///
/// `Null` never appears in a valid request; it exists so error responses to
/// undecodable lines can still carry the mandatory `id` member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Integer id (the common case; clients count upward).
    Num(i64),
    /// String id.
    Str(String),
    /// JSON `null`, for responses that cannot be attributed to a request.
    Null,
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Null => f.write_str("null"),
        }
    }
}

/// One inbound request line.
///
/// A request without an `id` (absent or `null`) is a notification: the
/// server executes it but writes no response line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Always [`JSONRPC_VERSION`].
    pub jsonrpc: String,
    /// Correlation id; `None` marks a notification.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<RequestId>,
    /// Method name (see [`method`]).
    pub method: String,
    /// Parameter object; absent means no parameters.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub params: Option<Value>,
}

impl Request {
    /// A call expecting a response.
    #[must_use]
    pub fn call(id: i64, method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id: Some(RequestId::Num(id)),
            method: method.to_owned(),
            params,
        }
    }

    /// A notification: executed, never answered.
    #[must_use]
    pub fn notification(method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id: None,
            method: method.to_owned(),
            params,
        }
    }

    /// True when no response line may be written for this request.
    #[must_use]
    pub const fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// The error member of a failure response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    /// Numeric code from the table in [`codes`].
    pub code: i32,
    /// Human-readable message.
    pub message: String,
    /// Machine-readable details; always carries at least
    /// `{"type": <discriminator>}` when produced by this crate.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<Value>,
}

impl RpcError {
    /// Builds an error with the code's stable `data.type` discriminator.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.value(),
            message: message.into(),
            data: Some(serde_json::json!({ "type": code.kind() })),
        }
    }

    /// Maps a traversal failure onto the wire table, keeping its message.
    #[must_use]
    pub fn from_query(err: &reticle_core::QueryError) -> Self {
        Self::new(codes::for_query(err), err.to_string())
    }

    /// Maps a build failure onto the wire table, keeping its message.
    #[must_use]
    pub fn from_build(err: &reticle_core::BuildError) -> Self {
        Self::new(codes::for_build(err), err.to_string())
    }

    /// Shorthand for parameter validation failures.
    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    /// The `data.type` discriminator, when present.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.data.as_ref()?.get("type")?.as_str()
    }
}

/// One outbound response line: exactly one of `result` / `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Always [`JSONRPC_VERSION`].
    pub jsonrpc: String,
    /// Echo of the request id, or `null` when the request was undecodable.
    pub id: RequestId,
    /// Success payload.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result: Option<Value>,
    /// Failure payload.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<RpcError>,
}

impl Response {
    /// A success response.
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// A failure response; `None` id means the request never decoded.
    #[must_use]
    pub fn failure(id: Option<RequestId>, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id: id.unwrap_or(RequestId::Null),
            result: None,
            error: Some(error),
        }
    }
}

/// Rejection of an inbound line before dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// The line is not parseable JSON (wire code -32700).
    #[error("parse error: {0}")]
    Parse(String),
    /// Parsed JSON that is not a JSON-RPC 2.0 request (wire code -32600).
    #[error("invalid request: {0}")]
    InvalidRequest(&'static str),
}

impl WireError {
    /// The wire code this rejection maps to.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Parse(_) => ErrorCode::ParseError,
            Self::InvalidRequest(_) => ErrorCode::InvalidRequest,
        }
    }
}

/// Decodes one request line, distinguishing unparseable JSON from a
/// structurally invalid envelope.
///
/// Accepted id forms: absent, `null` (both mean notification), integer, or
/// string. `params`, when present, must be an object.
///
/// # Errors
/// [`WireError::Parse`] when the line is not JSON; [`WireError::InvalidRequest`]
/// when the envelope breaks a structural rule.
pub fn decode_request(line: &str) -> Result<Request, WireError> {
    let value: Value =
        serde_json::from_str(line).map_err(|e| WireError::Parse(e.to_string()))?;
    let Value::Object(mut obj) = value else {
        return Err(WireError::InvalidRequest("request must be a JSON object"));
    };

    match obj.get("jsonrpc") {
        Some(Value::String(v)) if v == JSONRPC_VERSION => {}
        _ => {
            return Err(WireError::InvalidRequest(
                "jsonrpc must be the string \"2.0\"",
            ))
        }
    }

    let method = match obj.get("method") {
        Some(Value::String(m)) => m.clone(),
        _ => return Err(WireError::InvalidRequest("method must be a string")),
    };

    let id = match obj.remove("id") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(RequestId::Str(s)),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => Some(RequestId::Num(i)),
            None => {
                return Err(WireError::InvalidRequest(
                    "id must be an integer or a string",
                ))
            }
        },
        Some(_) => {
            return Err(WireError::InvalidRequest(
                "id must be an integer or a string",
            ))
        }
    };

    let params = match obj.remove("params") {
        None | Some(Value::Null) => None,
        Some(p @ Value::Object(_)) => Some(p),
        Some(_) => return Err(WireError::InvalidRequest("params must be an object")),
    };

    Ok(Request {
        jsonrpc: JSONRPC_VERSION.to_owned(),
        id,
        method,
        params,
    })
}
