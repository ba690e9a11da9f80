pub mod diffract;
pub mod intersect;
pub mod reflect;

pub use diffract::{groove_vector, vecray, GrooveFrame};
pub use intersect::FreeDistance;
pub use reflect::reflect;
