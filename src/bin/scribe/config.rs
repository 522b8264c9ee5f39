use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use scribe::config::{locate_base_dir, read_config, Config, CFG_FILE_NAME};

/// `~/...` is taken from the user's home directory.
pub(crate) fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => PathBuf::from(path),
        },
        None => PathBuf::from(path),
    }
}

fn get_config_path(cfg_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = cfg_path {
        let path = expand_home(path);
        if path.is_dir() {
            return Ok(path.join(CFG_FILE_NAME));
        }
        return Ok(path);
    }

    let cur_dir = env::current_dir().context("Could not read the current directory")?;
    match locate_base_dir(&cur_dir) {
        Some(base_dir) => Ok(base_dir.join(CFG_FILE_NAME)),
        None => bail!("Could not find {} in {} or any parent directory. Use --config", CFG_FILE_NAME, cur_dir.display()),
    }
}

pub(crate) fn open_config(cfg_path: Option<&str>, output: Option<&str>) -> Result<Config> {
    let config_path = get_config_path(cfg_path)?;
    let mut config = read_config(&config_path)?;

    if let Some(output) = output {
        config.set_publish_dir(&expand_home(output));
    }
    Ok(config)
}

pub(crate) fn display_path<'a>(config: &Config, path: &'a Path) -> std::path::Display<'a> {
    path.strip_prefix(&config.base_dir).unwrap_or(path).display()
}
