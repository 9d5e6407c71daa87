use std::borrow::Cow;
use std::fs::{self, create_dir_all};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

pub const VIRTUAL_PATH_SEP_CHAR: char = '/';

pub fn ensure_dir_exists(p: &Path) -> io::Result<()> {
    if p.exists() {
        return Ok(());
    }

    create_dir_all(p)
}

/// Strips any leading [VIRTUAL_PATH_SEP_CHAR] so the path can be joined onto a
/// root without replacing it.
pub fn trim_virtual_root(path: &str) -> &str {
    path.trim_start_matches(VIRTUAL_PATH_SEP_CHAR)
}

/// Converts a `/` separated virtual path into a relative OS path
#[cfg(unix)]
pub fn virtual_to_os_path(path: &str) -> Cow<'_, Path> {
    Cow::Borrowed(Path::new(trim_virtual_root(path)))
}

/// Converts a `/` separated virtual path into a relative OS path
#[cfg(not(unix))]
pub fn virtual_to_os_path(path: &str) -> Cow<'_, Path> {
    let trimmed = trim_virtual_root(path);
    if !trimmed.contains(VIRTUAL_PATH_SEP_CHAR) {
        return Cow::Borrowed(Path::new(trimmed));
    }
    let mut pb = PathBuf::new();
    for part in trimmed.split(VIRTUAL_PATH_SEP_CHAR) {
        if !part.is_empty() {
            pb.push(part);
        }
    }
    Cow::Owned(pb)
}

/// Returns the last segment of the path or an empty string if there is none
pub fn path_name_or_empty(path: &Path) -> String {
    path.file_name()
        .map(|it| it.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Makes `path` absolute against the current directory if it isn't already
pub fn make_absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(PathBuf::from(path));
    }
    Ok(std::env::current_dir()?.join(path))
}

pub fn read_file(path: &Path) -> crate::Result<String> {
    match fs::read_to_string(path) {
        Ok(v) => Ok(v),
        Err(e) => match e.kind() {
            ErrorKind::NotFound => Err(crate::Error::BadPath(PathBuf::from(path))),
            _ => Err(e.into()),
        },
    }
}
