// SPDX-License-Identifier: Apache-2.0
//! Result-count guardrail.
//!
//! Every traversal consults one [`Guardrail`] before keeping a candidate
//! result. What a rejection means is a per-operation contract fixed at the
//! call site, never a runtime switch: `query_down` and `query_up_paths` are
//! strict (reject aborts the whole call with
//! [`crate::QueryError::TooManyResults`]), while `shapes_rec` and
//! `query_down_stats` truncate (reject stops the walk and sets a flag).

/// Default ceiling for `query_down` instance records.
pub const DEFAULT_INSTANCE_RESULTS: usize = 10_000;

/// Default ceiling for `query_up_paths` emitted paths.
pub const DEFAULT_PATH_RESULTS: usize = 1_000;

/// Default ceiling for `shapes_rec` shape records.
pub const DEFAULT_SHAPE_RESULTS: usize = 100_000;

/// Default ceiling for `query_down_stats` counted elements.
pub const DEFAULT_STATS_ELEMENTS: usize = 1_000_000;

/// Verdict on a single candidate result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Keep the candidate.
    Accept,
    /// Over the ceiling; the caller aborts or truncates per its contract.
    Reject,
}

/// Stateless result-count policy: at most `limit` results are ever kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guardrail {
    limit: usize,
}

impl Guardrail {
    /// Policy admitting at most `limit` results.
    #[must_use]
    pub const fn new(limit: usize) -> Self {
        Self { limit }
    }

    /// The configured ceiling.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Verdict for the next candidate given how many results are already
    /// kept. Accepts while `current_count < limit`, so the `limit + 1`-th
    /// candidate is the first rejected.
    #[must_use]
    pub const fn accept(&self, current_count: usize) -> Verdict {
        if current_count < self.limit {
            Verdict::Accept
        } else {
            Verdict::Reject
        }
    }
}
