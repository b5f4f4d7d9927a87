//! Shared account list consumed by the companion tray process.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrayUser {
    /// Platform tag, e.g. `Steam`.
    pub platform: String,
    /// Launch argument the tray passes back to switch, e.g. `+s:<id64>`.
    pub arg: String,
    /// Name shown in the tray menu.
    pub name: String,
}

pub fn read(path: &Path) -> Result<Vec<TrayUser>> {
    if !path.exists() {
        return Ok(vec![]);
    }
    let text = std::fs::read_to_string(path)?;
    if text.trim().is_empty() {
        return Ok(vec![]);
    }
    Ok(serde_json::from_str(&text)?)
}

pub fn save(path: &Path, users: &[TrayUser]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string(users)?)?;
    Ok(())
}

/// Add or update the entry keyed by platform + launch argument.
pub fn add_user(path: &Path, user: TrayUser) -> Result<()> {
    let mut users = read(path)?;
    match users
        .iter_mut()
        .find(|u| u.platform == user.platform && u.arg == user.arg)
    {
        Some(existing) => *existing = user,
        None => users.push(user),
    }
    save(path, &users)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(arg: &str, name: &str) -> TrayUser {
        TrayUser { platform: "Steam".into(), arg: arg.into(), name: name.into() }
    }

    #[test]
    fn add_user_appends_new_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tray_users.json");
        add_user(&path, entry("+s:1", "alpha")).unwrap();
        add_user(&path, entry("+s:2", "beta")).unwrap();
        assert_eq!(read(&path).unwrap().len(), 2);
    }

    #[test]
    fn add_user_updates_existing_entry_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tray_users.json");
        add_user(&path, entry("+s:1", "alpha")).unwrap();
        add_user(&path, entry("+s:1", "Alpha Prime")).unwrap();
        let users = read(&path).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name, "Alpha Prime");
    }
}
