mod context;
pub use context::*;

mod process;
pub use process::*;
