//! Optional persistent configuration (`lzn.toml`).
//!
//! The file carries the same ignore lists as the CLI flags:
//!
//! ```toml
//! ignore = ["constant-variable", "13"]
//! ignore-category = ["unsure"]
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LznConfig {
    #[serde(default)]
    pub ignore: Vec<String>,

    #[serde(default, rename = "ignore-category")]
    pub ignore_category: Vec<String>,
}

pub const DEFAULT_CONFIG_FILE_NAME: &str = "lzn.toml";

/// Walk from `start_dir` upwards looking for a config file.
#[must_use]
pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut cur = Some(start_dir);
    while let Some(dir) = cur {
        let candidate = dir.join(DEFAULT_CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        cur = dir.parent();
    }
    None
}

pub fn load_config_file(path: &Path) -> Result<LznConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::config(path, format!("failed to read: {e}")))?;
    let cfg: LznConfig = toml::from_str(&raw)?;
    Ok(cfg)
}

/// Load an explicit config file, or discover one near the model.
pub fn load_config(
    explicit_path: Option<&Path>,
    start_dir: &Path,
) -> Result<Option<(PathBuf, LznConfig)>> {
    if let Some(path) = explicit_path {
        let cfg = load_config_file(path)?;
        return Ok(Some((path.to_path_buf(), cfg)));
    }
    let Some(path) = find_config_file(start_dir) else {
        return Ok(None);
    };
    let cfg = load_config_file(&path)?;
    Ok(Some((path, cfg)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ignore_lists() {
        let cfg: LznConfig =
            toml::from_str("ignore = [\"13\", \"constant-variable\"]\n\"ignore-category\" = [\"unsure\"]\n")
                .unwrap();
        assert_eq!(cfg.ignore, vec!["13", "constant-variable"]);
        assert_eq!(cfg.ignore_category, vec!["unsure"]);
    }

    #[test]
    fn discovers_config_in_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE_NAME), "ignore = []\n").unwrap();
        let found = find_config_file(&nested).expect("config should be found");
        assert_eq!(found, dir.path().join(DEFAULT_CONFIG_FILE_NAME));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = toml::from_str::<LznConfig>("nope = 1\n");
        assert!(err.is_err());
    }
}
