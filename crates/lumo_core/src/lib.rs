//! Lumo core value types
//!
//! Foundational geometry and color types shared by every Lumo crate:
//!
//! - Vectors, matrices and affine transforms
//! - Points, sizes and rectangles
//! - Colors and 4x5 color matrices
//! - Vector paths with Bezier flattening helpers

pub mod angle;
pub mod bezier;
pub mod color;
pub mod color_matrix;
pub mod geometry;
pub mod matrix;
pub mod path;
pub mod transform;
pub mod vector;

pub use angle::Angle;
pub use bezier::{CubicBezier, QuadraticBezier};
pub use color::Color;
pub use color_matrix::ColorMatrix;
pub use geometry::{Point, Rect, Size};
pub use matrix::{Matrix2, Matrix3};
pub use path::{Path, PathElement};
pub use transform::AffineTransform;
pub use vector::Vector2;
