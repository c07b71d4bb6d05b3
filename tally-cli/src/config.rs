use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use tally_core::{BankProfile, ProfileConfig};
use tally_finance::ExportFormat;
use tally_ingest::{builtin_config, BUILTIN};

/// `$TALLY_HOME`, else `~/.tally`.
pub fn tally_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("TALLY_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".tally"))
}

pub fn ensure_tally_home() -> Result<PathBuf> {
    let dir = tally_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extra directory searched for `<name>.toml` profiles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profiles_dir: Option<PathBuf>,
    pub defaults: Defaults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    pub format: ExportFormat,
    /// Reconciliation tolerance in currency units.
    pub tolerance: f64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            profile: None,
            format: ExportFormat::Csv,
            tolerance: 0.01,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(tally_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(cfg: &Config) -> Result<PathBuf> {
    let p = ensure_tally_home()?.join("config.toml");
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(p)
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    let written = save_config(&Config::default())?;
    println!("Wrote {}", written.display());
    Ok(())
}

pub fn load_profile_file(path: &Path) -> Result<ProfileConfig> {
    let s = fs::read_to_string(path).with_context(|| format!("read profile {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse profile {}", path.display()))
}

/// Resolve a profile argument: built-in name, TOML path, then
/// `<profiles_dir>/<name>.toml`.
pub fn resolve_profile(arg: Option<&str>, cfg: &Config) -> Result<BankProfile> {
    let Some(name) = arg.or(cfg.defaults.profile.as_deref()) else {
        bail!("no profile given (pass --profile or set defaults.profile in config.toml)");
    };

    let profile_cfg = if BUILTIN.iter().any(|(n, _)| *n == name) {
        builtin_config(name)?
    } else if Path::new(name).is_file() {
        load_profile_file(Path::new(name))?
    } else if let Some(path) = cfg
        .profiles_dir
        .as_ref()
        .map(|dir| dir.join(format!("{name}.toml")))
        .filter(|p| p.is_file())
    {
        load_profile_file(&path)?
    } else {
        bail!("unknown profile '{name}' (not built in, not a file, not in profiles_dir)");
    };

    BankProfile::from_config(&profile_cfg).with_context(|| format!("compile profile '{name}'"))
}
