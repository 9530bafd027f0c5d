use anyhow::{Context, Result};
use clap::ValueEnum;
use mtconv_ingest::ParseOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::{ensure_mtconv_home, mtconv_home};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub parse: ParseOptions,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSection {
    pub format: OutputFormat,
    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            format: OutputFormat::Json,
            pretty: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Csv,
}

pub fn config_path() -> Result<PathBuf> {
    Ok(mtconv_home()?.join("config.toml"))
}

/// Load config from `path`, or the default location when `None`.
/// A missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let p = match path {
        Some(p) => p.to_path_buf(),
        None => config_path()?,
    };
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn parse_config(s: &str) -> Result<Config> {
    Ok(toml::from_str(s)?)
}

pub fn render_config(cfg: &Config) -> Result<String> {
    toml::to_string_pretty(cfg).context("serialize config")
}

pub fn init_config() -> Result<()> {
    let p = ensure_mtconv_home()?.join("config.toml");
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    fs::write(&p, render_config(&Config::default())?)
        .with_context(|| format!("write {}", p.display()))?;
    println!("Wrote {}", p.display());
    Ok(())
}
