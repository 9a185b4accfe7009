mod boundary;
mod cut_plane;
mod mesh_slice;

pub use boundary::{Boundary, BoundarySurface};
pub use cut_plane::CutPlane;
pub use mesh_slice::MeshSlice;
