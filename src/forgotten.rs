//! Archive of removed ("forgotten") accounts, kept so they can be restored
//! with their exact prior record.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::login_users::SteamUser;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForgottenUser {
    #[serde(rename = "SteamId")]
    pub steam_id: u64,
    #[serde(rename = "SteamUser")]
    pub user: SteamUser,
}

/// Read the archive; a missing file is just an empty archive.
pub fn read(path: &Path) -> Result<Vec<ForgottenUser>> {
    if !path.exists() {
        return Ok(vec![]);
    }
    let text = std::fs::read_to_string(path)?;
    if text.trim().is_empty() {
        return Ok(vec![]);
    }
    Ok(serde_json::from_str(&text)?)
}

fn write(path: &Path, users: &[ForgottenUser]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string(users)?)?;
    Ok(())
}

/// Append `user` unless its id is already archived. Returns whether the
/// archive changed.
pub fn archive(path: &Path, user: &SteamUser) -> Result<bool> {
    let mut users = read(path)?;
    if users.iter().any(|f| f.steam_id == user.steam_id) {
        return Ok(false);
    }
    users.push(ForgottenUser { steam_id: user.steam_id, user: user.clone() });
    write(path, &users)?;
    Ok(true)
}

/// Remove and return the archived records for `ids`, skipping any id in
/// `already_live` (those stay archived and untouched).
pub fn take(path: &Path, ids: &[u64], already_live: &[u64]) -> Result<Vec<SteamUser>> {
    let mut users = read(path)?;
    let mut taken = vec![];
    users.retain(|f| {
        if ids.contains(&f.steam_id) && !already_live.contains(&f.steam_id) {
            taken.push(f.user.clone());
            false
        } else {
            true
        }
    });
    if !taken.is_empty() {
        write(path, &users)?;
    }
    Ok(taken)
}

/// Delete the whole archive.
pub fn clear(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: u64, name: &str) -> SteamUser {
        SteamUser {
            steam_id: id,
            account_name: name.to_string(),
            persona_name: name.to_uppercase(),
            timestamp: 1600000000,
            wants_offline_mode: false,
            most_recent: false,
            extra: vec![],
        }
    }

    #[test]
    fn archive_then_take_round_trips_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forgotten.json");
        let original = user(76561198064588130, "alpha");
        assert!(archive(&path, &original).unwrap());
        let taken = take(&path, &[76561198064588130], &[]).unwrap();
        assert_eq!(taken, vec![original]);
        assert!(read(&path).unwrap().is_empty());
    }

    #[test]
    fn archiving_twice_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forgotten.json");
        assert!(archive(&path, &user(1, "a")).unwrap());
        assert!(!archive(&path, &user(1, "a")).unwrap());
        assert_eq!(read(&path).unwrap().len(), 1);
    }

    #[test]
    fn live_ids_stay_archived() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forgotten.json");
        archive(&path, &user(1, "a")).unwrap();
        archive(&path, &user(2, "b")).unwrap();
        let taken = take(&path, &[1, 2], &[1]).unwrap();
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].steam_id, 2);
        // 1 is still restorable later.
        assert_eq!(read(&path).unwrap().len(), 1);
        assert_eq!(read(&path).unwrap()[0].steam_id, 1);
    }

    #[test]
    fn missing_archive_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read(&dir.path().join("forgotten.json")).unwrap().is_empty());
    }
}
