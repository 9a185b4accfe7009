mod medit;
mod slice;

pub use medit::{load_medit, read_medit, save_medit, write_medit};
pub use slice::{write_off, write_stl};
