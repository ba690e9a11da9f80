pub mod analysis;
pub mod config;
pub mod ensemble;
pub mod error;
pub mod geometry;
pub mod math;
pub mod operations;
pub mod pipeline;

pub use error::{Result, ScopeError};
