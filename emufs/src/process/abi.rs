use once_cell::sync::OnceCell;

use crate::command::{run_cmd, CmdOutput};
use crate::config::AbiConfig;
use crate::Context;

const ABILIST_PROP: &str = "ro.product.cpu.abilist";
const ABILIST64_PROP: &str = "ro.product.cpu.abilist64";

/// CPU ABIs the device can run, with the derived capability flags computed
/// once on first use.
pub struct AbiSupport {
    supported: Vec<String>,
    supported_64: Vec<String>,
    bit64: OnceCell<bool>,
    x86: OnceCell<bool>,
}

impl AbiSupport {
    pub fn new(supported: Vec<String>, supported_64: Vec<String>) -> Self {
        Self {
            supported,
            supported_64,
            bit64: OnceCell::new(),
            x86: OnceCell::new(),
        }
    }

    /// Find the ABI lists, in order of preference, from the `EMUFS_ABILIST` and
    /// `EMUFS_ABILIST64` env vars, the `[abi]` config table, `getprop`, and
    /// finally the architecture we were built for.
    pub fn from_context(ctx: &dyn Context, cfg: &AbiConfig) -> Self {
        let supported = ctx
            .maybe_get_env("EMUFS_ABILIST")
            .map(|it| parse_abilist(&it))
            .or_else(|| cfg.supported.clone())
            .or_else(|| getprop_abilist(ctx, ABILIST_PROP));

        let supported_64 = ctx
            .maybe_get_env("EMUFS_ABILIST64")
            .map(|it| parse_abilist(&it))
            .or_else(|| cfg.supported_64.clone())
            .or_else(|| getprop_abilist(ctx, ABILIST64_PROP));

        match (supported, supported_64) {
            (Some(all), Some(only_64)) => Self::new(all, only_64),
            (Some(all), None) => {
                let only_64 = all.iter().filter(|it| is_64_bit_abi(it)).cloned().collect();
                Self::new(all, only_64)
            }
            (None, only_64) => {
                log::warn!("no ABI list found, falling back to the build target");
                let (all, target_64) = target_abis();
                Self::new(all, only_64.unwrap_or(target_64))
            }
        }
    }

    pub fn supported(&self) -> &[String] {
        &self.supported
    }

    pub fn supported_64(&self) -> &[String] {
        &self.supported_64
    }

    pub fn supports_64_bit(&self) -> bool {
        *self.bit64.get_or_init(|| !self.supported_64.is_empty())
    }

    pub fn supports_x86(&self) -> bool {
        *self
            .x86
            .get_or_init(|| self.supported.iter().any(|it| it == "x86" || it == "x86_64"))
    }
}

fn parse_abilist(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|it| !it.is_empty())
        .map(String::from)
        .collect()
}

fn is_64_bit_abi(abi: &str) -> bool {
    matches!(abi, "arm64-v8a" | "x86_64" | "riscv64")
}

fn getprop_abilist(ctx: &dyn Context, prop: &str) -> Option<Vec<String>> {
    let bin = ctx.maybe_get_bin("getprop")?;
    let output = run_cmd(&bin, &[prop])
        .map_err(crate::Error::from)
        .and_then(CmdOutput::err_on_status);
    match output {
        // Unset properties print an empty line and still exit 0
        Ok(v) => Some(parse_abilist(&v.stdout_utf8_lossy())).filter(|it| !it.is_empty()),
        Err(e) => {
            log::warn!("getprop {} failed: {}", prop, e);
            None
        }
    }
}

/// Android ABI names for the target we were compiled for
fn target_abis() -> (Vec<String>, Vec<String>) {
    let (all, only_64): (&[&str], &[&str]) = match std::env::consts::ARCH {
        "aarch64" => (&["arm64-v8a", "armeabi-v7a"], &["arm64-v8a"]),
        "arm" => (&["armeabi-v7a"], &[]),
        "x86_64" => (&["x86_64", "x86"], &["x86_64"]),
        "x86" => (&["x86"], &[]),
        "riscv64" => (&["riscv64"], &["riscv64"]),
        _ => (&[], &[]),
    };
    (
        all.iter().map(|it| String::from(*it)).collect(),
        only_64.iter().map(|it| String::from(*it)).collect(),
    )
}
