pub mod fs;
pub use fs::*;

pub mod virtual_path;
pub use virtual_path::*;
