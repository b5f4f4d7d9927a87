pub mod autologin;
pub mod client;
pub mod error;
pub mod forgotten;
pub mod login_users;
pub mod logger;
pub mod paths;
pub mod settings;
pub mod steam_id;
pub mod switcher;
pub mod tray;
pub mod vac_cache;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

pub use error::{Error, Result};
use paths::AppPaths;
use settings::Settings;

/// Everything the components need, built once at startup and passed down
/// explicitly (no process-wide singletons).
pub struct AppContext {
    pub settings: Settings,
    pub paths: AppPaths,
    // One writer at a time against the credential store.
    store_lock: Mutex<()>,
}

impl AppContext {
    /// Context rooted in the user's config dir, loading (or initializing)
    /// the settings file there.
    pub fn from_system() -> Option<AppContext> {
        let paths = AppPaths::from_system()?;
        let settings = Settings::load_or_init(&paths.settings_file);
        Some(AppContext { settings, paths, store_lock: Mutex::new(()) })
    }

    pub fn with_settings(settings: Settings, config_root: &Path) -> AppContext {
        AppContext {
            settings,
            paths: AppPaths::under(config_root),
            store_lock: Mutex::new(()),
        }
    }

    /// Serializes switch/forget/restore against this context's store.
    pub fn lock_store(&self) -> MutexGuard<'_, ()> {
        self.store_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn vac_cache_expiry(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.settings.vac_cache_expiry_hours * 3600)
    }

    pub fn image_expiry(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.settings.image_expiry_days * 24 * 3600)
    }
}
