use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("missing required env var: {0}")]
    MissingEnv(String),

    #[error("{0}")]
    IO(io::Error),

    #[error("command failed with status {0}: {1}")]
    CommandError(i32, String),

    #[error("failed to get basedirs")]
    NoBaseDirs,

    #[error("bad path {0:?}")]
    BadPath(PathBuf),

    #[error("no storage root has been set")]
    NoRoot,

    #[error("invalid open mode `{0}`")]
    InvalidOpenMode(String),

    #[error("{0} is not supported")]
    Unsupported(&'static str),

    #[error("invalid config {0}: {1}")]
    InvalidConfig(String, String),
}

impl Error {
    pub fn new_cfg<S: ToString + ?Sized>(path: &Path, s: &S) -> Self {
        Self::InvalidConfig(path.to_string_lossy().into_owned(), s.to_string())
    }

    /// The underlying [io::ErrorKind] if this error came from the filesystem
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::IO(e) => Some(e.kind()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.io_kind(), Some(io::ErrorKind::NotFound))
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::IO(err)
    }
}
