use std::fmt::Display;
use std::path::Path;
use std::{borrow::Cow, path::PathBuf};
use toml::{Table, Value};

use crate::utils::read_file;
use crate::Context;

#[derive(Debug)]
pub enum Error {
    InvalidType,
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::InvalidType => "InvalidType",
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub struct ConfigMap<'c> {
    path: &'c Path,
    name: Option<Cow<'c, str>>,
    table: &'c Table,
}

#[derive(Clone, Debug)]
pub struct Config {
    path: PathBuf,
    base: Table,
}

impl Config {
    pub fn parse(source: &Path) -> crate::Result<Self> {
        let as_str = read_file(source)?;
        Self::parse_str(source, &as_str)
    }

    pub fn parse_str(source: &Path, content: &str) -> crate::Result<Self> {
        let base: Table = match toml::from_str(content) {
            Ok(v) => v,
            Err(e) => return Err(crate::Error::new_cfg(source, &e)),
        };
        Ok(Self {
            base,
            path: PathBuf::from(source),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_map(&self) -> ConfigMap {
        ConfigMap {
            name: None,
            path: &self.path,
            table: &self.base,
        }
    }
}

impl<'c> ConfigMap<'c> {
    fn get_full_path<'a>(&'a self) -> Option<&'a str> {
        self.name.as_ref().map(|it| it.as_ref())
    }

    fn key_path<'a>(&self, key: &'a str) -> Cow<'a, str> {
        match self.get_full_path() {
            None => Cow::Borrowed(key),
            Some(v) => Cow::Owned(format!("{}.{}", v, key)),
        }
    }

    /// Helper to create a crate::Error for an invalid key
    pub fn invalid_key(&self, key: &str, expected: &str) -> crate::Error {
        let path = self.key_path(key);
        crate::Error::InvalidConfig(
            self.path.to_string_lossy().into_owned(),
            format!(
                "invalid value for key: {} (expected type: {})",
                path, expected
            ),
        )
    }

    fn get(&self, key: &str) -> Option<&'c Value> {
        self.table.get(key)
    }

    pub fn maybe_get_str(&self, key: &str) -> Result<Option<&'c str>> {
        match self.get(key) {
            Some(v) => match v.as_str() {
                Some(v) => Ok(Some(v)),
                None => Err(Error::InvalidType),
            },
            None => Ok(None),
        }
    }

    pub fn maybe_get_str_typecheck(&self, key: &str) -> crate::Result<Option<&'c str>> {
        self.maybe_get_str(key)
            .map_err(|_| self.invalid_key(key, "string"))
    }

    /// Gets an array of strings, any non string entry is an [Error::InvalidType]
    pub fn maybe_get_str_list(&self, key: &str) -> Result<Option<Vec<String>>> {
        let arr = match self.get(key) {
            Some(v) => v.as_array().ok_or(Error::InvalidType)?,
            None => return Ok(None),
        };
        let mut items = Vec::with_capacity(arr.len());
        for it in arr {
            items.push(String::from(it.as_str().ok_or(Error::InvalidType)?));
        }
        Ok(Some(items))
    }

    pub fn maybe_get_str_list_typecheck(&self, key: &str) -> crate::Result<Option<Vec<String>>> {
        self.maybe_get_str_list(key)
            .map_err(|_| self.invalid_key(key, "string array"))
    }

    pub fn maybe_get_map(&'c self, key: &'c str) -> Result<Option<ConfigMap<'c>>> {
        match self.get(key) {
            Some(v) => match v.as_table() {
                Some(table) => {
                    let name = match &self.get_full_path() {
                        Some(parents) => Cow::Owned(format!("{parents}.{key}")),
                        None => Cow::Borrowed(key),
                    };
                    Ok(Some(Self {
                        name: Some(name),
                        path: self.path,
                        table,
                    }))
                }
                None => Err(Error::InvalidType),
            },
            None => Ok(None),
        }
    }

    pub fn maybe_get_map_typecheck(&'c self, key: &'c str) -> crate::Result<Option<ConfigMap<'c>>> {
        self.maybe_get_map(key)
            .map_err(|_| self.invalid_key(key, "table"))
    }
}

/// Where the document tree lives and which package marks resolved paths.
///
/// Read from the `[storage]` table, with `EMUFS_ROOT` and `EMUFS_PACKAGE`
/// overriding the file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageConfig {
    pub root: Option<PathBuf>,
    pub package: String,
}

impl StorageConfig {
    pub(crate) const CONFIG_KEY: &'static str = "storage";

    pub fn from_context(ctx: &dyn Context) -> crate::Result<Self> {
        let mut root = ctx.maybe_get_env("EMUFS_ROOT").map(PathBuf::from);
        let mut package = ctx.maybe_get_env("EMUFS_PACKAGE");

        if root.is_none() || package.is_none() {
            if let Some(cfg) = ctx.get_config()? {
                let base = cfg.get_map();
                if let Some(storage) = base.maybe_get_map_typecheck(Self::CONFIG_KEY)? {
                    if root.is_none() {
                        root = storage
                            .maybe_get_str_typecheck("root")?
                            .map(|it| config_relative(cfg.path(), it));
                    }
                    if package.is_none() {
                        package = storage
                            .maybe_get_str_typecheck("package")?
                            .map(String::from);
                    }
                }
            }
        }

        let package = match package {
            Some(v) if !v.is_empty() => v,
            _ => return Err(crate::Error::MissingEnv("EMUFS_PACKAGE".into())),
        };

        Ok(Self { root, package })
    }
}

/// Explicit ABI lists from the `[abi]` table
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AbiConfig {
    pub supported: Option<Vec<String>>,
    pub supported_64: Option<Vec<String>>,
}

impl AbiConfig {
    pub(crate) const CONFIG_KEY: &'static str = "abi";

    pub fn from_context(ctx: &dyn Context) -> crate::Result<Self> {
        let cfg = match ctx.get_config()? {
            Some(v) => v,
            None => return Ok(Self::default()),
        };
        let base = cfg.get_map();
        let abi = match base.maybe_get_map_typecheck(Self::CONFIG_KEY)? {
            Some(v) => v,
            None => return Ok(Self::default()),
        };
        Ok(Self {
            supported: abi.maybe_get_str_list_typecheck("supported")?,
            supported_64: abi.maybe_get_str_list_typecheck("supported-64")?,
        })
    }
}

/// Relative paths in the config are relative to the config file itself
fn config_relative(config_file: &Path, value: &str) -> PathBuf {
    let path = PathBuf::from(value);
    if path.is_absolute() {
        return path;
    }
    match config_file.parent() {
        Some(parent) => parent.join(path),
        None => path,
    }
}
