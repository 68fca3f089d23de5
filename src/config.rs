use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const APP_DIR_NAME: &str = "modledger";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_game_dir")]
    pub game_dir: PathBuf,
    #[serde(default = "default_registry_file")]
    pub registry_file: PathBuf,
    #[serde(default = "default_gui_order_file")]
    pub gui_order_file: PathBuf,
    #[serde(default = "default_enabled_order_file")]
    pub enabled_order_file: PathBuf,
    #[serde(default = "default_ignore_file")]
    pub ignore_file: PathBuf,
    #[serde(default = "default_signature_file")]
    pub signature_file: PathBuf,
    #[serde(default = "default_true")]
    pub backup: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            game_dir: default_game_dir(),
            registry_file: default_registry_file(),
            gui_order_file: default_gui_order_file(),
            enabled_order_file: default_enabled_order_file(),
            ignore_file: default_ignore_file(),
            signature_file: default_signature_file(),
            backup: true,
        }
    }
}

impl Config {
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        match user_config_path() {
            Ok(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("parse config {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("create config dir")?;
        }
        let raw = serde_json::to_string_pretty(self).context("serialize config")?;
        fs::write(path, raw).context("write config")?;
        Ok(())
    }

    pub fn document_paths(&self) -> DocumentPaths {
        DocumentPaths {
            registry: self.game_dir.join(&self.registry_file),
            gui_order: self.game_dir.join(&self.gui_order_file),
            enabled_order: self.game_dir.join(&self.enabled_order_file),
            ignore_list: self.game_dir.join(&self.ignore_file),
            signature: self.game_dir.join(&self.signature_file),
            backup: self.backup,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPaths {
    pub registry: PathBuf,
    pub gui_order: PathBuf,
    pub enabled_order: PathBuf,
    pub ignore_list: PathBuf,
    pub signature: PathBuf,
    pub backup: bool,
}

impl DocumentPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Config {
            game_dir: dir.to_path_buf(),
            ..Config::default()
        }
        .document_paths()
    }
}

pub fn user_config_path() -> Result<PathBuf> {
    let base = BaseDirs::new().context("resolve home dir")?;
    Ok(base.data_local_dir().join(APP_DIR_NAME).join("config.json"))
}

fn default_game_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_registry_file() -> PathBuf {
    PathBuf::from("mods_registry.json")
}

fn default_gui_order_file() -> PathBuf {
    PathBuf::from("game_data.json")
}

fn default_enabled_order_file() -> PathBuf {
    PathBuf::from("dlc_load.json")
}

fn default_ignore_file() -> PathBuf {
    PathBuf::from("ignored_mods.json")
}

fn default_signature_file() -> PathBuf {
    PathBuf::from("dlc_signature")
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_launcher_names() {
        let config: Config = serde_json::from_str(r#"{ "game_dir": "/games/stellar" }"#).unwrap();
        let paths = config.document_paths();
        assert_eq!(paths.registry, PathBuf::from("/games/stellar/mods_registry.json"));
        assert_eq!(paths.gui_order, PathBuf::from("/games/stellar/game_data.json"));
        assert_eq!(paths.enabled_order, PathBuf::from("/games/stellar/dlc_load.json"));
        assert_eq!(paths.ignore_list, PathBuf::from("/games/stellar/ignored_mods.json"));
        assert_eq!(paths.signature, PathBuf::from("/games/stellar/dlc_signature"));
        assert!(paths.backup);
    }

    #[test]
    fn save_then_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            enabled_order_file: PathBuf::from("load.json"),
            backup: false,
            ..Config::default()
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(Some(path.as_path())).unwrap(), config);
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(dir.path().join("absent.json").as_path())).unwrap_err();
        assert!(err.to_string().starts_with("read config"));
    }
}
