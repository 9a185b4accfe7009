pub mod complex;
pub mod error;
pub mod geometry;
pub mod io;
pub mod math;
pub mod operations;
pub mod slice;

pub use error::{Result, TagmeshError};
