use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$MTCONV_HOME`, falling back to `~/.mtconv`.
pub fn mtconv_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("MTCONV_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".mtconv"))
}

pub fn ensure_mtconv_home() -> Result<PathBuf> {
    let dir = mtconv_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
