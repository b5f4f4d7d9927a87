//! Persisted user settings.
//!
//! Loaded once at startup; parse failures fall back to defaults rather than
//! blocking the switcher, and a missing file is written out with defaults so
//! the user has something to edit.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Steam install folder; `config/loginusers.vdf` lives under it.
    pub steam_path: PathBuf,
    /// Launch Steam directly (elevated context) instead of via explorer.
    pub admin: bool,
    /// Start Steam again after switching accounts.
    pub autostart: bool,
    /// Tray entries show the login name instead of the persona name.
    pub tray_account_name: bool,
    pub vac_cache_expiry_hours: u64,
    pub image_expiry_days: u64,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            steam_path: default_steam_path(),
            admin: false,
            autostart: true,
            tray_account_name: false,
            vac_cache_expiry_hours: 24,
            image_expiry_days: 7,
        }
    }
}

#[cfg(windows)]
fn default_steam_path() -> PathBuf {
    PathBuf::from(r"C:\Program Files (x86)\Steam")
}

#[cfg(not(windows))]
fn default_steam_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("Steam"))
        .unwrap_or_else(|| PathBuf::from("Steam"))
}

impl Settings {
    pub fn login_users_vdf(&self) -> PathBuf {
        self.steam_path.join("config").join("loginusers.vdf")
    }

    #[cfg(windows)]
    pub fn steam_exe(&self) -> PathBuf {
        self.steam_path.join("steam.exe")
    }

    #[cfg(not(windows))]
    pub fn steam_exe(&self) -> PathBuf {
        PathBuf::from("steam")
    }

    /// Load settings, writing defaults on first run and falling back to
    /// defaults (with a warning) if the file is unreadable.
    pub fn load_or_init(path: &Path) -> Settings {
        if !path.exists() {
            let settings = Settings::default();
            if let Err(e) = settings.save(path) {
                log::warn!("could not write default settings: {e}");
            }
            return settings;
        }
        match std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|text| serde_json::from_str(&text).map_err(|e| e.to_string()))
        {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("settings load failed, using defaults: {e}");
                Settings::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
