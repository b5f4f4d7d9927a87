//! Locations of everything steamshift writes, rooted in the platform
//! config dir.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub settings_file: PathBuf,
    pub vac_cache_file: PathBuf,
    pub forgotten_file: PathBuf,
    pub tray_file: PathBuf,
    pub images_dir: PathBuf,
    pub backups_dir: PathBuf,
    pub logs_dir: PathBuf,
    /// Stand-in for the registry pointer on non-Windows hosts.
    pub autologin_file: PathBuf,
}

impl AppPaths {
    /// Paths under the user's config dir (e.g. `~/.config/steamshift`).
    pub fn from_system() -> Option<AppPaths> {
        Some(AppPaths::under(&dirs::config_dir()?.join("steamshift")))
    }

    pub fn under(root: &Path) -> AppPaths {
        AppPaths {
            root: root.to_path_buf(),
            settings_file: root.join("settings.json"),
            vac_cache_file: root.join("vac_cache.json"),
            forgotten_file: root.join("forgotten.json"),
            tray_file: root.join("tray_users.json"),
            images_dir: root.join("img").join("profiles"),
            backups_dir: root.join("backups"),
            logs_dir: root.join("logs"),
            autologin_file: root.join("autologin.json"),
        }
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(&self.images_dir)?;
        Ok(())
    }
}
