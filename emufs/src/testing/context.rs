use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::Context as AnyhowContext;
use mockall::mock;
use rand::Rng;
use rstest::fixture;

use crate::config::Config;
use crate::utils::ensure_dir_exists;
use crate::Context;

#[fixture]
pub fn tmp_context() -> TestContext {
    TestContext::default()
}

#[fixture]
pub fn mock_context() -> MockContext {
    MockContext::new()
}

#[fixture]
#[once]
pub fn global_tmp_context() -> TestContext {
    TestContext::default()
}

/// A [Context] rooted in a throwaway directory.
///
/// Env vars and binaries come only from what the test sets, never from the
/// real environment. The directory is removed on drop.
pub struct TestContext {
    base_dir: PathBuf,
    env: HashMap<String, String>,
    bins: HashMap<String, String>,
    config: Option<Config>,
}

pub enum TreeEntry<'a> {
    Dir,
    EmptyFile,
    TxtFile(&'a str),
    BinFile(&'a [u8]),
}

fn random_name() -> String {
    format!("{:016x}", rand::thread_rng().gen::<u64>())
}

impl TestContext {
    pub fn set_env<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) -> &mut Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn set_bin<K: Into<String>, V: Into<String>>(&mut self, name: K, path: V) -> &mut Self {
        self.bins.insert(name.into(), path.into());
        self
    }

    /// Write `content` where [Context::get_config_file] points and load it
    pub fn set_config(&mut self, content: &str) -> &mut Self {
        let path = self.get_config_file().expect("config file path");
        if let Some(parent) = path.parent() {
            ensure_dir_exists(parent).expect("creating config dir");
        }
        fs::write(&path, content).expect("writing test config");
        self.config = Some(Config::parse(&path).expect("invalid test config"));
        self
    }

    /// Lay out files and directories relative to the base directory, creating
    /// parents as needed.
    pub fn create_tree(&self, tree: &[(&str, TreeEntry)]) -> anyhow::Result<()> {
        for (relative, entry) in tree {
            let path = self.base_dir.join(relative);
            if let Some(parent) = path.parent() {
                ensure_dir_exists(parent)
                    .with_context(|| format!("creating parents of {relative}"))?;
            }
            match entry {
                TreeEntry::Dir => {
                    fs::create_dir(&path).with_context(|| format!("creating dir {relative}"))?
                }
                TreeEntry::EmptyFile => {
                    OpenOptions::new()
                        .write(true)
                        .create_new(true)
                        .open(&path)
                        .with_context(|| format!("creating {relative}"))?;
                }
                TreeEntry::TxtFile(text) => {
                    fs::write(&path, text).with_context(|| format!("writing {relative}"))?
                }
                TreeEntry::BinFile(bytes) => {
                    fs::write(&path, bytes).with_context(|| format!("writing {relative}"))?
                }
            }
        }
        Ok(())
    }

    pub fn to_abs<P: AsRef<Path> + ?Sized>(&self, path: &P) -> PathBuf {
        self.base_dir.join(path)
    }

    /// A path under the base directory that doesn't exist yet
    pub fn get_temp_dir(&self) -> PathBuf {
        self.base_dir.join(random_name())
    }

    pub fn new_tmp_file(&self, content: &str) -> anyhow::Result<PathBuf> {
        let path = self.get_temp_dir();
        fs::write(&path, content)
            .with_context(|| format!("writing temp file {}", path.display()))?;
        Ok(path)
    }
}

impl Default for TestContext {
    fn default() -> Self {
        let base_dir = std::env::temp_dir().join(format!("emufs_test_{}", random_name()));
        if base_dir.exists() {
            fs::remove_dir_all(&base_dir).expect("clearing stale test dir");
        }
        ensure_dir_exists(&base_dir).expect("creating test dir");
        Self {
            base_dir,
            env: HashMap::new(),
            bins: HashMap::new(),
            config: None,
        }
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        if self.base_dir.exists() {
            let _ = fs::remove_dir_all(&self.base_dir);
        }
    }
}

impl Context for TestContext {
    fn maybe_get_env(&self, key: &str) -> Option<String> {
        self.env.get(key).cloned()
    }

    fn maybe_get_bin(&self, bin: &str) -> Option<String> {
        self.bins.get(bin).cloned()
    }

    fn get_user_config_dir(&self) -> crate::Result<PathBuf> {
        Ok(self.base_dir.join("config"))
    }

    fn get_config<'a>(&'a self) -> crate::Result<Option<&'a Config>> {
        Ok(self.config.as_ref())
    }
}

mock! {
    pub Context {}

    impl crate::Context for Context {
        fn maybe_get_env(&self, key: &str) -> Option<String>;
        fn maybe_get_bin(&self, bin: &str) -> Option<String>;
        fn get_user_config_dir(&self) -> crate::Result<PathBuf>;
        fn get_config<'a>(&'a self) -> crate::Result<Option<&'a Config>>;
    }
}
