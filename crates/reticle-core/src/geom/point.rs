// SPDX-License-Identifier: Apache-2.0
//! Integer grid point.
//!
//! All stored geometry lives on the database-unit (dbu) integer grid; real
//! units only appear at the presentation edge (see `walk::shapes`).

/// A point on the integer dbu grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// Horizontal coordinate in dbu.
    #[cfg_attr(feature = "serde", serde(default))]
    pub x: i64,
    /// Vertical coordinate in dbu.
    #[cfg_attr(feature = "serde", serde(default))]
    pub y: i64,
}

impl Point {
    /// The origin `(0, 0)`.
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Builds a point from its coordinates.
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl std::ops::Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
