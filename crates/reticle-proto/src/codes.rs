// SPDX-License-Identifier: Apache-2.0
//! The wire error-code table.
//!
//! Codes -32700..-32600 are the JSON-RPC 2.0 reserved set; -32001..-32099 is
//! the implementation-defined range, used here for domain failures. Every
//! code has a stable `data.type` discriminator so clients dispatch on kind,
//! never on message text or raw numbers.

use reticle_core::{BuildError, QueryError};

/// Every error code the service can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Malformed JSON line.
    ParseError,
    /// Structurally invalid request envelope.
    InvalidRequest,
    /// Unknown method name.
    MethodNotFound,
    /// Bad or missing parameters (bad rot, zero array counts, bad coords).
    InvalidParams,
    /// Internal invariant violation.
    InternalError,
    /// A method needed a layout and none was created yet.
    NoActiveLayout,
    /// Named root/target/start/parent cell absent.
    CellNotFound,
    /// Instance child cell name absent.
    ChildCellNotFound,
    /// Requested layer index not in the layer table.
    LayerNotAvailable,
    /// Zero root cells.
    NoTopCell,
    /// More than one root cell.
    MultipleTopCells,
    /// Strict guardrail trip.
    TooManyResults,
    /// `cell.create` with an existing name.
    DuplicateCell,
    /// `layout.new` refused to replace a live layout.
    LayoutExists,
}

impl ErrorCode {
    /// The numeric wire code.
    #[must_use]
    pub const fn value(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::NoActiveLayout => -32001,
            Self::CellNotFound => -32002,
            Self::ChildCellNotFound => -32003,
            Self::LayerNotAvailable => -32004,
            Self::NoTopCell => -32005,
            Self::MultipleTopCells => -32006,
            Self::TooManyResults => -32007,
            Self::DuplicateCell => -32008,
            Self::LayoutExists => -32009,
        }
    }

    /// The stable `data.type` discriminator.
    #[must_use]
    pub const fn kind(self) -> &'static str {
        match self {
            Self::ParseError => "ParseError",
            Self::InvalidRequest => "InvalidRequest",
            Self::MethodNotFound => "MethodNotFound",
            Self::InvalidParams => "InvalidParams",
            Self::InternalError => "InternalError",
            Self::NoActiveLayout => "NoActiveLayout",
            Self::CellNotFound => "CellNotFound",
            Self::ChildCellNotFound => "ChildCellNotFound",
            Self::LayerNotAvailable => "LayerNotAvailable",
            Self::NoTopCell => "NoTopCell",
            Self::MultipleTopCells => "MultipleTopCells",
            Self::TooManyResults => "TooManyResults",
            Self::DuplicateCell => "DuplicateCell",
            Self::LayoutExists => "LayoutExists",
        }
    }

    /// Looks a code up by its numeric value (client-side classification).
    #[must_use]
    pub const fn from_value(code: i32) -> Option<Self> {
        match code {
            -32700 => Some(Self::ParseError),
            -32600 => Some(Self::InvalidRequest),
            -32601 => Some(Self::MethodNotFound),
            -32602 => Some(Self::InvalidParams),
            -32603 => Some(Self::InternalError),
            -32001 => Some(Self::NoActiveLayout),
            -32002 => Some(Self::CellNotFound),
            -32003 => Some(Self::ChildCellNotFound),
            -32004 => Some(Self::LayerNotAvailable),
            -32005 => Some(Self::NoTopCell),
            -32006 => Some(Self::MultipleTopCells),
            -32007 => Some(Self::TooManyResults),
            -32008 => Some(Self::DuplicateCell),
            -32009 => Some(Self::LayoutExists),
            _ => None,
        }
    }
}

/// The code a traversal failure maps to.
#[must_use]
pub const fn for_query(err: &QueryError) -> ErrorCode {
    match err {
        QueryError::CellNotFound(_) => ErrorCode::CellNotFound,
        QueryError::LayerNotAvailable(_) => ErrorCode::LayerNotAvailable,
        QueryError::NoTopCell => ErrorCode::NoTopCell,
        QueryError::MultipleTopCells(_) => ErrorCode::MultipleTopCells,
        QueryError::TooManyResults { .. } => ErrorCode::TooManyResults,
        QueryError::Internal(_) => ErrorCode::InternalError,
    }
}

/// The code a build failure maps to. Shape and array validation failures are
/// parameter errors on the wire.
#[must_use]
pub const fn for_build(err: &BuildError) -> ErrorCode {
    match err {
        BuildError::DuplicateCell(_) => ErrorCode::DuplicateCell,
        BuildError::LayerNotAvailable(_) => ErrorCode::LayerNotAvailable,
        BuildError::MalformedShape(_) | BuildError::BadArray { .. } | BuildError::BadDbu(_) => {
            ErrorCode::InvalidParams
        }
    }
}
