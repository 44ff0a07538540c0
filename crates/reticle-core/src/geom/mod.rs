// SPDX-License-Identifier: Apache-2.0
//! Integer geometry and the rigid transform algebra.

mod bbox;
mod point;
mod trans;

pub use bbox::BBox;
pub use point::Point;
pub use trans::{Rot, Trans};
