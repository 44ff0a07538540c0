// SPDX-License-Identifier: Apache-2.0
//! Rigid transform algebra.
//!
//! Conventions:
//! - A [`Trans`] applies to a point as mirror first (about the x axis), then
//!   rotation (counter-clockwise quarter turns), then displacement.
//! - Composition is written outer-first: `outer.compose(&inner)` is the
//!   transform that applies `inner` and then `outer`, i.e. the transform of a
//!   grandchild frame seen from the grandparent.
//!
//! Determinism: everything here is exact `i64` arithmetic; there is no
//! floating point anywhere in the algebra, so composing a chain in one order
//! always reproduces the same coordinates bit for bit.

use super::point::Point;

/// Rotation by a multiple of 90 degrees, counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "u16", try_from = "u16")
)]
pub enum Rot {
    /// No rotation.
    #[default]
    R0,
    /// Quarter turn (90°).
    R90,
    /// Half turn (180°).
    R180,
    /// Three-quarter turn (270°).
    R270,
}

impl Rot {
    /// All rotations in quarter-turn order.
    pub const ALL: [Self; 4] = [Self::R0, Self::R90, Self::R180, Self::R270];

    /// Rotation angle in degrees.
    #[must_use]
    pub const fn degrees(self) -> u16 {
        match self {
            Self::R0 => 0,
            Self::R90 => 90,
            Self::R180 => 180,
            Self::R270 => 270,
        }
    }

    /// Number of quarter turns, `0..=3`.
    #[must_use]
    pub const fn quarters(self) -> u8 {
        match self {
            Self::R0 => 0,
            Self::R90 => 1,
            Self::R180 => 2,
            Self::R270 => 3,
        }
    }

    /// Rotation from a quarter-turn count (wraps modulo 4).
    #[must_use]
    pub const fn from_quarters(q: u8) -> Self {
        match q % 4 {
            1 => Self::R90,
            2 => Self::R180,
            3 => Self::R270,
            _ => Self::R0,
        }
    }

    /// Parses a degree value; only the four quarter-turn angles are valid.
    #[must_use]
    pub const fn from_degrees(deg: u16) -> Option<Self> {
        match deg {
            0 => Some(Self::R0),
            90 => Some(Self::R90),
            180 => Some(Self::R180),
            270 => Some(Self::R270),
            _ => None,
        }
    }

    /// The inverse rotation.
    #[must_use]
    pub const fn inverse(self) -> Self {
        Self::from_quarters(4 - self.quarters())
    }

    /// Rotates a point about the origin.
    #[must_use]
    pub const fn apply(self, p: Point) -> Point {
        match self {
            Self::R0 => p,
            Self::R90 => Point::new(-p.y, p.x),
            Self::R180 => Point::new(-p.x, -p.y),
            Self::R270 => Point::new(p.y, -p.x),
        }
    }
}

impl From<Rot> for u16 {
    fn from(r: Rot) -> Self {
        r.degrees()
    }
}

impl TryFrom<u16> for Rot {
    type Error = String;

    fn try_from(deg: u16) -> Result<Self, Self::Error> {
        Self::from_degrees(deg).ok_or_else(|| format!("rot must be one of 0, 90, 180, 270 (got {deg})"))
    }
}

/// A rigid transform on the dbu grid: optional mirror about the x axis,
/// quarter-turn rotation, then integer displacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trans {
    /// Displacement, applied last.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub disp: Point,
    /// Rotation, applied after the mirror.
    #[cfg_attr(feature = "serde", serde(default))]
    pub rot: Rot,
    /// Mirror about the x axis, applied first.
    #[cfg_attr(feature = "serde", serde(default))]
    pub mirror: bool,
}

impl Trans {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        disp: Point::ZERO,
        rot: Rot::R0,
        mirror: false,
    };

    /// Builds a transform from its parts.
    #[must_use]
    pub const fn new(disp: Point, rot: Rot, mirror: bool) -> Self {
        Self { disp, rot, mirror }
    }

    /// A pure translation.
    #[must_use]
    pub const fn translate(x: i64, y: i64) -> Self {
        Self::new(Point::new(x, y), Rot::R0, false)
    }

    /// Applies the transform to a point: mirror, rotate, displace.
    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        let m = if self.mirror { Point::new(p.x, -p.y) } else { p };
        self.rot.apply(m) + self.disp
    }

    /// Returns the transform equivalent to applying `inner` first and then
    /// `self`.
    ///
    /// Used by the walkers to accumulate a child frame into the root frame:
    /// if `self` maps parent coordinates to root coordinates and `inner` maps
    /// child coordinates to parent coordinates, the result maps child
    /// coordinates to root coordinates.
    #[must_use]
    pub fn compose(&self, inner: &Self) -> Self {
        let q = if self.mirror {
            4 - inner.rot.quarters()
        } else {
            inner.rot.quarters()
        };
        Self {
            disp: self.apply(inner.disp),
            rot: Rot::from_quarters(self.rot.quarters() + q),
            mirror: self.mirror ^ inner.mirror,
        }
    }

    /// Returns a copy with `delta` added to the displacement, in the frame
    /// the transform maps into. Array element offsets use this: step vectors
    /// live in the parent frame and are not rotated by the base transform.
    #[must_use]
    pub fn shifted(&self, delta: Point) -> Self {
        Self {
            disp: self.disp + delta,
            ..*self
        }
    }

    /// True for the identity transform.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl std::fmt::Display for Trans {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let m = if self.mirror { "m" } else { "r" };
        write!(f, "{}{} {}", m, self.rot.degrees(), self.disp)
    }
}
