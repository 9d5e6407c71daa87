pub mod context;
pub use context::{Context, DefaultContext};

pub mod config;

pub mod errors;
pub use errors::{Error, Result};

pub mod command;
pub use command::run_cmd;

pub mod open_mode;
pub use open_mode::OpenMode;

pub mod tree;
pub use tree::{DocumentTree, FileInfo};

pub mod compat;
pub use compat::CompatTree;

pub mod process;
pub use process::{AbiSupport, ProcessIdentifier};

pub mod app;
pub use app::Application;

pub mod utils;
pub use utils::{VirtualPath, VIRTUAL_PATH_SEP_CHAR};

#[cfg(test)]
pub mod testing;
