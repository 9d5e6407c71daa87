use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::sync::Mutex;

use blanket::blanket;
use directories::BaseDirs;
use once_cell::sync::OnceCell;

use crate::config::Config;
use crate::Error;

/// Search `$EMUFS_PATH` when it is set, the regular `$PATH` otherwise
fn locate_bin(bin: &str) -> Option<String> {
    let found = match env::var("EMUFS_PATH") {
        Ok(search) => {
            let cwd = env::current_dir().ok()?;
            which::which_in(bin, Some(search), cwd).ok()?
        }
        Err(_) => which::which(bin).ok()?,
    };
    Some(found.to_string_lossy().into_owned())
}

/// Everything emufs needs from its surroundings: env vars, helper binaries
/// and the config file.
///
/// Only [Context::get_config] has to be implemented, the rest read from the
/// real process environment unless overridden.
#[blanket(derive(Ref, Box))]
pub trait Context: Send + Sync {
    fn maybe_get_env(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }

    fn get_env(&self, key: &str) -> crate::Result<String> {
        self.maybe_get_env(key)
            .ok_or_else(|| Error::MissingEnv(key.into()))
    }

    /// Full path to `bin`, if it can be found
    fn maybe_get_bin(&self, bin: &str) -> Option<String> {
        locate_bin(bin)
    }

    fn get_user_config_dir(&self) -> crate::Result<PathBuf> {
        let dirs = BaseDirs::new().ok_or(Error::NoBaseDirs)?;
        Ok(dirs.config_dir().join("emufs"))
    }

    /// `$EMUFS_CONFIG` if set, otherwise `emufs.toml` in the user config dir
    fn get_config_file(&self) -> crate::Result<PathBuf> {
        match self.maybe_get_env("EMUFS_CONFIG") {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(self.get_user_config_dir()?.join("emufs.toml")),
        }
    }

    /// The parsed config file, `None` when there isn't one
    fn get_config<'a>(&'a self) -> crate::Result<Option<&'a Config>>;
}

#[derive(Default)]
pub struct DefaultContext {
    bins: Mutex<HashMap<String, String>>,
    config: OnceCell<Option<Config>>,
}

impl DefaultContext {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Context for DefaultContext {
    fn get_config<'a>(&'a self) -> crate::Result<Option<&'a Config>> {
        let loaded = self.config.get_or_try_init(|| {
            let path = self.get_config_file()?;
            if !path.exists() {
                log::debug!("no config file at {}", path.display());
                return Ok::<_, Error>(None);
            }
            log::debug!("loading config from {}", path.display());
            Config::parse(&path).map(Some)
        })?;
        Ok(loaded.as_ref())
    }

    fn maybe_get_bin(&self, bin: &str) -> Option<String> {
        let mut bins = match self.bins.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(path) = bins.get(bin) {
            return Some(path.clone());
        }
        let path = locate_bin(bin)?;
        bins.insert(bin.into(), path.clone());
        Some(path)
    }
}
