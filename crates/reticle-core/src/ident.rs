// SPDX-License-Identifier: Apache-2.0
//! Identifier newtypes.
//!
//! Both ids are dense indices minted by [`crate::store::LayoutStore`]; the
//! store never deletes cells or layers, so an id stays valid for the life of
//! the store that issued it. Ids from one store mean nothing to another.

/// Identifies a cell definition within one [`crate::store::LayoutStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[repr(transparent)]
pub struct CellId(u32);

impl CellId {
    pub(crate) const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The dense index behind the id.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cell#{}", self.0)
    }
}

/// Index into the layout's layer table.
///
/// Traversal operates on indices only; the `(layer, datatype)` pair a layer
/// was registered under is presentation metadata (see
/// [`crate::store::LayerKey`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[repr(transparent)]
pub struct LayerIndex(u32);

impl LayerIndex {
    /// Wraps a raw table index.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The dense index behind the id.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for LayerIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}
