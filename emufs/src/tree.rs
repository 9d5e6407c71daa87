//! Filesystem operations addressed by virtual paths.
//!
//! The emulator core addresses files relative to its user directory, for
//! example `/log/emu_log.txt`. A [DocumentTree] joins these onto the storage
//! root before touching the filesystem. Paths the core received from the
//! platform, which already point at the app's own storage, are recognised by
//! the package identifier they contain and used as-is.

use std::borrow::Cow;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::open_mode::OpenMode;
use crate::utils::{
    ensure_dir_exists, make_absolute, path_name_or_empty, virtual_to_os_path, VirtualPath,
};

/// Snapshot of a single resolved path
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub path: PathBuf,
    pub name: String,
    pub exists: bool,
    pub is_directory: bool,
    pub size: u64,
}

pub struct DocumentTree {
    root: Option<PathBuf>,
    package: String,
}

impl DocumentTree {
    pub fn new<S: Into<String>>(package: S) -> Self {
        Self {
            root: None,
            package: package.into(),
        }
    }

    pub fn with_root<S: Into<String>, P: AsRef<Path>>(package: S, root: P) -> io::Result<Self> {
        let mut it = Self::new(package);
        it.set_root(root)?;
        Ok(it)
    }

    /// Set the storage root, replacing any previous one.
    ///
    /// Relative roots are made absolute against the current directory here so
    /// that resolving never depends on where the process happens to be.
    pub fn set_root<P: AsRef<Path>>(&mut self, root: P) -> io::Result<()> {
        let root = make_absolute(root.as_ref())?;
        log::debug!("document tree root set to {}", root.display());
        self.root = Some(root);
        Ok(())
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn classify(&self, filepath: &str) -> VirtualPath {
        VirtualPath::classify(filepath, &self.package)
    }

    pub fn resolve_path(&self, filepath: &str) -> crate::Result<PathBuf> {
        log::trace!("resolve_path: {}", filepath);
        self.resolve(&self.classify(filepath))
            .map(Cow::into_owned)
    }

    pub fn resolve<'a>(&self, path: &'a VirtualPath) -> crate::Result<Cow<'a, Path>> {
        match path {
            VirtualPath::Resolved(p) => Ok(Cow::Borrowed(Path::new(p.as_str()))),
            VirtualPath::Relative(p) => {
                let root = self.root.as_ref().ok_or(crate::Error::NoRoot)?;
                let rel = virtual_to_os_path(p);
                if rel.as_os_str().is_empty() {
                    return Ok(Cow::Owned(root.clone()));
                }
                Ok(Cow::Owned(root.join(rel)))
            }
        }
    }

    /// Create the empty file `name` inside `filepath`, creating `filepath`
    /// first if needed. Fails if the file already exists.
    pub fn create_file(&self, filepath: &str, name: &str) -> crate::Result<PathBuf> {
        log::debug!("create_file: {} {}", filepath, name);
        let parent = self.resolve_path(filepath)?;
        ensure_dir_exists(&parent)?;
        let path = parent.join(name);
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        Ok(path)
    }

    /// Create the directory `name` inside `filepath`, creating every missing
    /// directory along the way, including any inside a nested `name`. Fails
    /// if the target already exists.
    pub fn create_dir(&self, filepath: &str, name: &str) -> crate::Result<PathBuf> {
        log::debug!("create_dir: {} {}", filepath, name);
        let path = self.resolve_path(filepath)?.join(virtual_to_os_path(name));
        if path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", path.display()),
            )
            .into());
        }
        fs::create_dir_all(&path)?;
        Ok(path)
    }

    pub fn open(&self, filepath: &str, mode: OpenMode) -> crate::Result<File> {
        log::debug!("open: {} ({})", filepath, mode);
        let path = self.resolve_path(filepath)?;
        Ok(mode.to_open_options().open(&path)?)
    }

    /// Open `filepath` and hand the raw descriptor to the caller, who becomes
    /// responsible for closing it.
    #[cfg(unix)]
    pub fn open_content_uri(
        &self,
        filepath: &str,
        mode: &str,
    ) -> crate::Result<std::os::fd::RawFd> {
        use std::os::fd::IntoRawFd;

        let mode = OpenMode::parse(mode)?;
        let file = self.open(filepath, mode)?;
        Ok(file.into_raw_fd())
    }

    pub fn file_name(&self, filepath: &str) -> crate::Result<String> {
        log::debug!("file_name: {}", filepath);
        let path = self.resolve_path(filepath)?;
        Ok(path_name_or_empty(&path))
    }

    /// Names of the entries in `filepath`, sorted. A missing path lists as
    /// empty.
    pub fn list(&self, filepath: &str) -> crate::Result<Vec<String>> {
        log::debug!("list: {}", filepath);
        let path = self.resolve_path(filepath)?;
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut names = fs::read_dir(&path)?
            .filter_map(|it| match it {
                Ok(entry) => Some(entry.file_name().to_string_lossy().into_owned()),
                Err(e) => {
                    log::warn!("skipping unreadable entry in {}: {}", path.display(), e);
                    None
                }
            })
            .collect::<Vec<String>>();
        names.sort();
        Ok(names)
    }

    /// Size in bytes, 0 for directories and missing paths
    pub fn file_size(&self, filepath: &str) -> crate::Result<u64> {
        log::debug!("file_size: {}", filepath);
        let path = self.resolve_path(filepath)?;
        match fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => Ok(0),
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    pub fn is_directory(&self, filepath: &str) -> crate::Result<bool> {
        log::debug!("is_directory: {}", filepath);
        Ok(self.resolve_path(filepath)?.is_dir())
    }

    pub fn exists(&self, filepath: &str) -> crate::Result<bool> {
        log::debug!("exists: {}", filepath);
        Ok(self.resolve_path(filepath)?.exists())
    }

    pub fn stat(&self, filepath: &str) -> crate::Result<FileInfo> {
        let path = self.resolve_path(filepath)?;
        let (exists, is_directory, size) = match fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => (true, true, 0),
            Ok(meta) => (true, false, meta.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => (false, false, 0),
            Err(e) => return Err(e.into()),
        };
        Ok(FileInfo {
            name: path_name_or_empty(&path),
            path,
            exists,
            is_directory,
            size,
        })
    }

    /// Copying between documents has never been supported
    pub fn copy_file(
        &self,
        source: &str,
        destination_parent: &str,
        destination_name: &str,
    ) -> crate::Result<()> {
        log::debug!(
            "copy_file: {} -> {} {}",
            source,
            destination_parent,
            destination_name
        );
        Err(crate::Error::Unsupported("copy"))
    }

    /// Rename with the platform's semantics, so a rename across filesystems
    /// fails rather than copying.
    pub fn rename(&self, filepath: &str, destination: &str) -> crate::Result<()> {
        log::debug!("rename: {} -> {}", filepath, destination);
        let from = self.resolve_path(filepath)?;
        let to = self.resolve_path(destination)?;
        fs::rename(&from, &to)?;
        Ok(())
    }

    /// Delete a file or an empty directory
    pub fn delete(&self, filepath: &str) -> crate::Result<()> {
        log::debug!("delete: {}", filepath);
        let path = self.resolve_path(filepath)?;
        if fs::symlink_metadata(&path)?.is_dir() {
            fs::remove_dir(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}
