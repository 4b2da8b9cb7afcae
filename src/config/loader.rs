//! Config file loading.

use super::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAMES: &[&str] = &["zotfiles.toml", ".zotfiles.toml"];

/// Load the config file, if any.
///
/// An explicitly provided path must parse; an auto-discovered file that
/// fails to parse is only warned about and the defaults are used, so a
/// stray config file never blocks an export.
pub fn load_config(search_dir: &Path, config_path: Option<&Path>) -> Result<Config> {
    let provided = config_path.is_some();

    let discovered = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(search_dir),
    };
    let Some(config_file) = discovered else {
        return Ok(Config::default());
    };

    let content = fs::read_to_string(&config_file)
        .with_context(|| format!("Failed reading config file: {}", config_file.display()))?;

    match toml::from_str::<Config>(&content) {
        Ok(config) => Ok(config),
        Err(err) => {
            if provided {
                Err(anyhow::Error::new(err)
                    .context(format!("Failed to parse config file: {}", config_file.display())))
            } else {
                tracing::warn!(
                    "Failed to parse auto-discovered config {}: {}",
                    config_file.display(),
                    err
                );
                Ok(Config::default())
            }
        }
    }
}

fn discover_config(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES.iter().map(|name| dir.join(name)).find(|path| path.is_file())
}
