use std::fmt::{Debug, Display, Formatter};

use serde::{Deserialize, Serialize};

/// VirtualPaths are how the emulator core addresses files.
///
/// A path is either:
///
/// Relative -> /log/emu_log.txt, joined onto the storage root on use
/// Resolved -> /storage/emulated/0/Android/data/org.example.emu/files/log,
///             already usable by the filesystem and passed through untouched
///
/// Raw strings coming from the core carry no tag, see [VirtualPath::classify]
/// for how one is chosen for them.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum VirtualPath {
    Relative(String),
    Resolved(String),
}

impl VirtualPath {
    pub fn relative<T: Into<String>>(value: T) -> Self {
        Self::Relative(value.into())
    }

    pub fn resolved<T: Into<String>>(value: T) -> Self {
        Self::Resolved(value.into())
    }

    /// Tag a raw path string.
    ///
    /// Any string containing `marker` (the host package identifier) is taken
    /// to be already resolved. This is a plain substring check, so a relative
    /// path that happens to contain the package name anywhere is treated as
    /// resolved as well. Construct the variants directly when the caller knows
    /// which one it has.
    pub fn classify<T: Into<String>>(raw: T, marker: &str) -> Self {
        let raw = raw.into();
        if !marker.is_empty() && raw.contains(marker) {
            Self::Resolved(raw)
        } else {
            Self::Relative(raw)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Relative(s) | Self::Resolved(s) => s,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

}

impl AsRef<str> for VirtualPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Debug for VirtualPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Relative(s) => write!(f, "VirtualPath::Relative(\"{}\")", s),
            Self::Resolved(s) => write!(f, "VirtualPath::Resolved(\"{}\")", s),
        }
    }
}

impl Display for VirtualPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
