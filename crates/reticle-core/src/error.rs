// SPDX-License-Identifier: Apache-2.0
//! Query failure taxonomy.
//!
//! Every variant carries a stable discriminator ([`QueryError::kind`]) so
//! callers dispatch on kind, never on message text. Messages exist for
//! humans and logs.

use thiserror::Error;

/// Failure of a traversal operation.
///
/// Not-found and precondition failures abort with no partial data. The
/// guardrail trip ([`QueryError::TooManyResults`]) is raised only by the
/// strict operations; truncating operations report a flag instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The named cell does not exist in the store.
    #[error("Cell not found: '{0}'")]
    CellNotFound(String),

    /// A requested layer index is not in the layer table.
    #[error("Layer not available: index {0}")]
    LayerNotAvailable(u32),

    /// Upward queries need a root; every cell here has an inbound edge.
    #[error("No top cell: every cell is instantiated somewhere")]
    NoTopCell,

    /// Upward queries need exactly one root cell.
    #[error("Multiple top cells: {}", .0.join(", "))]
    MultipleTopCells(Vec<String>),

    /// A strict guardrail rejected a candidate result.
    #[error("Too many results: more than {limit} matches (safety limit; raise max_results or narrow the query)")]
    TooManyResults {
        /// The limit that tripped.
        limit: usize,
    },

    /// An internal invariant broke mid-walk. Indicates a bug, not bad input.
    #[error("Internal invariant violated: {0}")]
    Internal(&'static str),
}

impl QueryError {
    /// Stable machine-readable discriminator, mirrored into wire `data.type`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CellNotFound(_) => "CellNotFound",
            Self::LayerNotAvailable(_) => "LayerNotAvailable",
            Self::NoTopCell => "NoTopCell",
            Self::MultipleTopCells(_) => "MultipleTopCells",
            Self::TooManyResults { .. } => "TooManyResults",
            Self::Internal(_) => "InternalError",
        }
    }
}
