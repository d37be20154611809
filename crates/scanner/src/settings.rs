//! Where the game install and the block catalog live.

use std::env;
use std::path::{Path, PathBuf};

use xray_engine::XrayError;

use crate::locator::RegionLocator;

/// Name of the launcher's data directory.
pub const GAME_DIR_NAME: &str = ".NationsGlory";
/// Catalog resource used when none is given.
pub const DEFAULT_CATALOG_PATH: &str = "config/ids.json";
/// Forge client log, relative to the game root.
const FORGE_LOG: [&str; 3] = ["versions", "stable", "ForgeModLoader-client-0.log"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// `None` when neither given nor derivable from the environment. Only
    /// commands that look inside the game install need it.
    pub game_root: Option<PathBuf>,
    pub catalog_path: PathBuf,
}

impl Settings {
    /// Fill in defaults for anything not given explicitly.
    pub fn resolve(game_root: Option<PathBuf>, catalog_path: Option<PathBuf>) -> Self {
        Self {
            game_root: game_root.or_else(default_game_root),
            catalog_path: catalog_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_PATH)),
        }
    }

    pub fn game_root(&self) -> Result<&Path, XrayError> {
        self.game_root
            .as_deref()
            .ok_or_else(|| XrayError::Configuration {
                source_name: "game root".to_string(),
                reason: "no --game-root given and the user data directory is unknown".to_string(),
            })
    }

    pub fn locator(&self) -> Result<RegionLocator, XrayError> {
        Ok(RegionLocator::new(self.game_root()?))
    }

    pub fn forge_log_path(&self) -> Result<PathBuf, XrayError> {
        Ok(forge_log_path(self.game_root()?))
    }
}

/// `%APPDATA%\.NationsGlory` on Windows, `$HOME/.config/.NationsGlory` elsewhere.
pub fn default_game_root() -> Option<PathBuf> {
    if cfg!(windows) {
        env::var_os("APPDATA").map(|appdata| PathBuf::from(appdata).join(GAME_DIR_NAME))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config").join(GAME_DIR_NAME))
    }
}

pub fn forge_log_path(game_root: &Path) -> PathBuf {
    FORGE_LOG.iter().fold(game_root.to_path_buf(), |p, part| p.join(part))
}
