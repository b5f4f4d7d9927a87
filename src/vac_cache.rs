//! On-disk cache of VAC / limited-account flags, refreshed from the public
//! Steam community profile XML.
//!
//! The cache file is a JSON list and expires as a whole: once older than the
//! configured window it is deleted and every requested account is re-fetched.
//! Avatar images are cached next to it with their own expiry. A failed fetch
//! for one account never blocks the others; that account just degrades to
//! `false/false` flags and the placeholder image.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::{stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Shown when no avatar could be downloaded for an account.
pub const PLACEHOLDER_IMAGE: &str = "img/QuestionMark.jpg";

/// How many profile documents are in flight at once.
const FETCH_POOL: usize = 8;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacStatus {
    #[serde(rename = "SteamID")]
    pub steam_id: u64,
    #[serde(rename = "Vac")]
    pub vac: bool,
    #[serde(rename = "Ltd")]
    pub ltd: bool,
}

impl VacStatus {
    fn unknown(steam_id: u64) -> VacStatus {
        VacStatus { steam_id, vac: false, ltd: false }
    }
}

/// The fields we consume from `https://steamcommunity.com/profiles/<id>?xml=1`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileXml {
    vac_banned: Option<String>,
    is_limited_account: Option<String>,
    avatar_full: Option<String>,
    privacy_message: Option<String>,
}

// ---------- cache file ----------

/// Delete `path` if it is older than `max_age`. Returns whether it was
/// removed (a missing file counts as already gone).
pub fn delete_outdated_file(path: &Path, max_age: Duration) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return true;
    };
    let expired = meta
        .modified()
        .ok()
        .and_then(|m| m.elapsed().ok())
        .map(|age| age >= max_age)
        .unwrap_or(false);
    if expired {
        let _ = std::fs::remove_file(path);
    }
    expired
}

/// Load the cache file, treating a stale or unreadable file as empty.
pub fn load_cache(path: &Path, expiry: Duration) -> HashMap<u64, VacStatus> {
    if delete_outdated_file(path, expiry) || !path.exists() {
        return HashMap::new();
    }
    match read_cache(path) {
        Ok(list) => list.into_iter().map(|vs| (vs.steam_id, vs)).collect(),
        Err(e) => {
            log::warn!("discarding status cache: {e}");
            let _ = std::fs::remove_file(path);
            HashMap::new()
        }
    }
}

fn read_cache(path: &Path) -> Result<Vec<VacStatus>> {
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| Error::CacheCorrupt(e.to_string()))
}

/// Persist the full merged set, via the same temp-then-rename discipline the
/// credential store uses.
pub fn save_cache(path: &Path, statuses: &HashMap<u64, VacStatus>) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut list: Vec<&VacStatus> = statuses.values().collect();
    list.sort_by_key(|vs| vs.steam_id);
    let temp = path.with_extension("json_temp");
    std::fs::write(&temp, serde_json::to_string(&list)?)?;
    std::fs::rename(&temp, path)?;
    Ok(())
}

pub fn delete_cache_file(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(())
}

// ---------- images ----------

pub fn image_path(images_dir: &Path, steam_id: u64) -> PathBuf {
    images_dir.join(format!("{steam_id}.jpg"))
}

/// Path to the cached avatar, or the placeholder if none was downloaded.
pub fn image_ref(images_dir: &Path, steam_id: u64) -> String {
    let path = image_path(images_dir, steam_id);
    if path.exists() {
        path.to_string_lossy().into_owned()
    } else {
        PLACEHOLDER_IMAGE.to_string()
    }
}

/// Empty the avatar directory so images are re-downloaded on next refresh.
pub fn clear_images(images_dir: &Path) -> Result<usize> {
    let mut removed = 0;
    if !images_dir.exists() {
        return Ok(0);
    }
    for entry in std::fs::read_dir(images_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            std::fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

// ---------- remote refresh ----------

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

async fn fetch_profile(
    client: &reqwest::Client,
    steam_id: u64,
) -> Result<(VacStatus, Option<String>)> {
    let url = format!("https://steamcommunity.com/profiles/{steam_id}?xml=1");
    let text = client
        .get(&url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| Error::RemoteFetchFailed { id: steam_id, reason: e.to_string() })?
        .text()
        .await
        .map_err(|e| Error::RemoteFetchFailed { id: steam_id, reason: e.to_string() })?;

    let profile: ProfileXml = quick_xml::de::from_str(&text)
        .map_err(|e| Error::RemoteFetchFailed { id: steam_id, reason: e.to_string() })?;

    // Accounts without a community profile expose nothing useful.
    if profile.privacy_message.is_some() {
        return Ok((VacStatus::unknown(steam_id), None));
    }
    let status = VacStatus {
        steam_id,
        vac: profile.vac_banned.as_deref() == Some("1"),
        ltd: profile.is_limited_account.as_deref() == Some("1"),
    };
    Ok((status, profile.avatar_full))
}

async fn download_image(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> std::result::Result<(), String> {
    let bytes = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| e.to_string())?
        .bytes()
        .await
        .map_err(|e| e.to_string())?;
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    std::fs::write(dest, &bytes).map_err(|e| e.to_string())?;
    Ok(())
}

/// Get status flags for `ids`, fetching whatever a valid cache file doesn't
/// already cover and persisting the merged set back.
pub async fn refresh(
    cache_file: &Path,
    images_dir: &Path,
    cache_expiry: Duration,
    image_expiry: Duration,
    ids: &[u64],
) -> Result<HashMap<u64, VacStatus>> {
    let client = http_client();
    let mut statuses = load_cache(cache_file, cache_expiry);

    let needs_fetch: Vec<u64> = ids
        .iter()
        .copied()
        .filter(|id| {
            !statuses.contains_key(id) || {
                let img = image_path(images_dir, *id);
                delete_outdated_file(&img, image_expiry) || !img.exists()
            }
        })
        .collect();

    let results: Vec<(u64, Result<(VacStatus, Option<String>)>)> =
        stream::iter(needs_fetch.into_iter().map(|id| {
            let client = &client;
            async move { (id, fetch_profile(client, id).await) }
        }))
        .buffer_unordered(FETCH_POOL)
        .collect()
        .await;

    for (id, result) in results {
        match result {
            Ok((status, avatar_url)) => {
                statuses.insert(id, status);
                if let Some(url) = avatar_url {
                    let dest = image_path(images_dir, id);
                    if !dest.exists() {
                        if let Err(e) = download_image(&client, &url, &dest).await {
                            log::warn!("avatar download failed for {id}: {e}");
                        }
                    }
                }
            }
            Err(e) => {
                log::warn!("{e}");
                // Keep whatever we had cached; otherwise record "no information".
                statuses.entry(id).or_insert_with(|| VacStatus::unknown(id));
            }
        }
    }

    save_cache(cache_file, &statuses)?;
    Ok(statuses)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HashMap<u64, VacStatus> {
        let mut map = HashMap::new();
        map.insert(
            76561198064588130,
            VacStatus { steam_id: 76561198064588130, vac: true, ltd: false },
        );
        map.insert(
            76561197960265729,
            VacStatus { steam_id: 76561197960265729, vac: false, ltd: true },
        );
        map
    }

    #[test]
    fn cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vac_cache.json");
        save_cache(&path, &sample()).unwrap();
        let loaded = load_cache(&path, Duration::from_secs(3600));
        assert_eq!(loaded, sample());
    }

    #[test]
    fn stale_cache_is_deleted_and_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vac_cache.json");
        save_cache(&path, &sample()).unwrap();
        // Zero expiry: anything on disk is already too old.
        let loaded = load_cache(&path, Duration::ZERO);
        assert!(loaded.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_cache_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vac_cache.json");
        std::fs::write(&path, "[{broken").unwrap();
        let loaded = load_cache(&path, Duration::from_secs(3600));
        assert!(loaded.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn cache_file_uses_original_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vac_cache.json");
        let mut map = HashMap::new();
        map.insert(1u64, VacStatus { steam_id: 1, vac: true, ltd: true });
        save_cache(&path, &map).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"SteamID\":1"));
        assert!(text.contains("\"Vac\":true"));
        assert!(text.contains("\"Ltd\":true"));
    }

    #[test]
    fn profile_xml_extracts_flags_and_avatar() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
            <profile>
                <steamID64>76561198064588130</steamID64>
                <vacBanned>1</vacBanned>
                <isLimitedAccount>0</isLimitedAccount>
                <avatarFull>https://avatars.example/full.jpg</avatarFull>
            </profile>"#;
        let profile: ProfileXml = quick_xml::de::from_str(xml).unwrap();
        assert_eq!(profile.vac_banned.as_deref(), Some("1"));
        assert_eq!(profile.is_limited_account.as_deref(), Some("0"));
        assert_eq!(profile.avatar_full.as_deref(), Some("https://avatars.example/full.jpg"));
        assert!(profile.privacy_message.is_none());
    }

    #[test]
    fn private_profile_yields_no_information() {
        let xml = r#"<profile>
                <privacyMessage>This profile is private.</privacyMessage>
            </profile>"#;
        let profile: ProfileXml = quick_xml::de::from_str(xml).unwrap();
        assert!(profile.privacy_message.is_some());
    }

    #[test]
    fn missing_avatar_falls_back_to_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(image_ref(dir.path(), 42), PLACEHOLDER_IMAGE);
        std::fs::write(image_path(dir.path(), 42), b"jpg").unwrap();
        assert_ne!(image_ref(dir.path(), 42), PLACEHOLDER_IMAGE);
    }

    #[test]
    fn clear_images_removes_cached_avatars() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(image_path(dir.path(), 1), b"a").unwrap();
        std::fs::write(image_path(dir.path(), 2), b"b").unwrap();
        assert_eq!(clear_images(dir.path()).unwrap(), 2);
        assert_eq!(image_ref(dir.path(), 1), PLACEHOLDER_IMAGE);
    }
}
