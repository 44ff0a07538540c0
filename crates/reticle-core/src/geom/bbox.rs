// SPDX-License-Identifier: Apache-2.0
//! Axis-aligned integer bounding box.

use super::point::Point;
use super::trans::Trans;

/// Axis-aligned bounding box on the dbu grid.
///
/// Invariant: `x1 <= x2` and `y1 <= y2`. Constructors normalize their
/// arguments, so a box built from any two opposite corners is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BBox {
    x1: i64,
    y1: i64,
    x2: i64,
    y2: i64,
}

impl BBox {
    /// Builds a box from two opposite corners, in any order.
    #[must_use]
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            x1: a.x.min(b.x),
            y1: a.y.min(b.y),
            x2: a.x.max(b.x),
            y2: a.y.max(b.y),
        }
    }

    /// Smallest box containing every point, or `None` for an empty set.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut it = points.into_iter();
        let first = it.next()?;
        let mut b = Self::new(first, first);
        for p in it {
            b.x1 = b.x1.min(p.x);
            b.y1 = b.y1.min(p.y);
            b.x2 = b.x2.max(p.x);
            b.y2 = b.y2.max(p.y);
        }
        Some(b)
    }

    /// Left edge.
    #[must_use]
    pub const fn x1(&self) -> i64 {
        self.x1
    }

    /// Bottom edge.
    #[must_use]
    pub const fn y1(&self) -> i64 {
        self.y1
    }

    /// Right edge.
    #[must_use]
    pub const fn x2(&self) -> i64 {
        self.x2
    }

    /// Top edge.
    #[must_use]
    pub const fn y2(&self) -> i64 {
        self.y2
    }

    /// Lower-left corner.
    #[must_use]
    pub const fn lower_left(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    /// Upper-right corner.
    #[must_use]
    pub const fn upper_right(&self) -> Point {
        Point::new(self.x2, self.y2)
    }

    /// Horizontal extent.
    #[must_use]
    pub const fn width(&self) -> i64 {
        self.x2 - self.x1
    }

    /// Vertical extent.
    #[must_use]
    pub const fn height(&self) -> i64 {
        self.y2 - self.y1
    }

    /// Smallest box containing both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }

    /// The box grown by `margin` on every side. Negative margins shrink;
    /// callers must not shrink past the box center.
    #[must_use]
    pub fn inflated(&self, margin: i64) -> Self {
        Self::new(
            Point::new(self.x1 - margin, self.y1 - margin),
            Point::new(self.x2 + margin, self.y2 + margin),
        )
    }

    /// The exact image of the box under a rigid transform.
    ///
    /// Quarter-turn rotations and mirrors map axis-aligned boxes to
    /// axis-aligned boxes, so transforming the two opposite corners and
    /// renormalizing loses nothing.
    #[must_use]
    pub fn transformed(&self, t: &Trans) -> Self {
        Self::new(t.apply(self.lower_left()), t.apply(self.upper_right()))
    }

    /// The four edges scaled into a real unit as `[x1, y1, x2, y2]`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> [f64; 4] {
        [
            self.x1 as f64 * factor,
            self.y1 as f64 * factor,
            self.x2 as f64 * factor,
            self.y2 as f64 * factor,
        ]
    }
}

impl std::fmt::Display for BBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})..({}, {})", self.x1, self.y1, self.x2, self.y2)
    }
}
