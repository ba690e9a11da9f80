pub mod axis;
pub mod root;

pub use axis::{dominant_axis, Axis};
pub use root::{Bracket, BrentSolver};

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 3x3 matrix type.
pub type Matrix3 = nalgebra::Matrix3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Arcseconds per radian.
pub const ARCSEC_PER_RADIAN: f64 = 206_265.0;
