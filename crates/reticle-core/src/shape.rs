// SPDX-License-Identifier: Apache-2.0
//! Geometric primitives stored under a cell's layers.

use crate::geom::{BBox, Point};

/// Discriminates the three stored primitive kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ShapeKind {
    /// Axis-aligned rectangle.
    Box,
    /// Closed polygon hull.
    Polygon,
    /// Centerline path with a width.
    Path,
}

impl ShapeKind {
    /// Lowercase wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Box => "box",
            Self::Polygon => "polygon",
            Self::Path => "path",
        }
    }
}

/// A geometric primitive. Immutable once inserted into a store.
///
/// Shape contents are validated at insert time
/// ([`crate::store::LayoutStore::insert_shape`]): polygons carry at least
/// three points and paths at least two plus a non-negative width, so the
/// bounding-box accessors here never see an empty point list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Axis-aligned rectangle; the box is the whole geometry.
    Box(BBox),
    /// Closed polygon hull (implicitly closed; the last point does not repeat
    /// the first). Hole contours are not representable.
    Polygon {
        /// Hull vertices in ring order.
        points: Vec<Point>,
    },
    /// Centerline path.
    Path {
        /// Centerline vertices.
        points: Vec<Point>,
        /// Full width in dbu. The bounding box inflates the centerline box by
        /// `width / 2` (integer division) on every side.
        width: i64,
    },
}

impl Shape {
    /// The kind discriminator for records.
    #[must_use]
    pub const fn kind(&self) -> ShapeKind {
        match self {
            Self::Box(_) => ShapeKind::Box,
            Self::Polygon { .. } => ShapeKind::Polygon,
            Self::Path { .. } => ShapeKind::Path,
        }
    }

    /// Bounding box of the shape alone, in the owning cell's frame.
    #[must_use]
    pub fn bbox(&self) -> BBox {
        match self {
            Self::Box(b) => *b,
            Self::Polygon { points } => {
                BBox::from_points(points.iter().copied()).unwrap_or_default()
            }
            Self::Path { points, width } => BBox::from_points(points.iter().copied())
                .unwrap_or_default()
                .inflated(*width / 2),
        }
    }

    /// The outline points a record reports: polygon hulls and path
    /// centerlines. Boxes report no point list; their bounding box is the
    /// full geometry.
    #[must_use]
    pub fn outline(&self) -> &[Point] {
        match self {
            Self::Box(_) => &[],
            Self::Polygon { points } | Self::Path { points, .. } => points,
        }
    }

    /// Path width, when the shape is a path.
    #[must_use]
    pub const fn width(&self) -> Option<i64> {
        match self {
            Self::Path { width, .. } => Some(*width),
            _ => None,
        }
    }
}
