//! Orchestrates "make account X current": stop Steam, rewrite the
//! credential store, point the registry at the new login, sync the tray
//! list, start Steam again.
//!
//! There is no rollback across steps. The store is the source of truth; the
//! registry pointer and tray list are rewritten from it on every switch, so
//! a failed native-state update is repaired by the next successful one.

use crate::client;
use crate::error::{Error, Result};
use crate::forgotten;
use crate::login_users::{self, SteamUser};
use crate::tray::{self, TrayUser};
use crate::{autologin, AppContext};

// Valid SteamID64 range for individual accounts.
// https://stackoverflow.com/questions/33933705
const STEAM_ID_MIN: u64 = 0x0110_0001_0000_0001;
const STEAM_ID_MAX: u64 = 0x0110_0001_FFFF_FFFF;

/// Whether `steam_id` is a well-formed SteamID64: exactly 17 digits,
/// strictly inside the documented account range.
pub fn verify_steam_id(steam_id: &str) -> bool {
    if steam_id.len() != 17 || !steam_id.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    match steam_id.parse::<u64>() {
        Ok(v) => v > STEAM_ID_MIN && v < STEAM_ID_MAX,
        Err(_) => false,
    }
}

/// Restart Steam logged into `steam_id`. Validation happens before any
/// mutation; everything after it is applied in order with no rollback.
pub fn switch_to(ctx: &AppContext, steam_id: &str) -> Result<()> {
    if !verify_steam_id(steam_id) {
        return Err(Error::UnrecognizedIdentifier(steam_id.to_string()));
    }
    let id: u64 = steam_id.parse().map_err(|_| Error::UnrecognizedIdentifier(steam_id.to_string()))?;

    let _guard = ctx.lock_store();

    client::close_steam();
    let user = update_login_users(ctx, id)?;
    log::info!("switched to {} ({})", user.account_name, id);

    if ctx.settings.autostart {
        client::start_steam(&ctx.settings.steam_exe(), ctx.settings.admin)?;
    }
    Ok(())
}

/// Rewrite the store so `steam_id` is the most recent account, then bring
/// the registry pointer and the tray list in line with it.
///
/// Store-and-native-state core of [`switch_to`], which stops/starts the
/// client around it. Callers must hold the store lock.
fn update_login_users(ctx: &AppContext, steam_id: u64) -> Result<SteamUser> {
    let vdf = ctx.settings.login_users_vdf();
    let mut users = login_users::load(&vdf)?;

    // Abort before mutating anything.
    if !users.iter().any(|u| u.steam_id == steam_id) {
        return Err(Error::AccountNotFound(steam_id));
    }

    for user in users.iter_mut() {
        user.most_recent = user.steam_id == steam_id;
    }
    login_users::save(&vdf, &users)?;

    let user = users
        .iter()
        .find(|u| u.steam_id == steam_id)
        .cloned()
        .ok_or(Error::AccountNotFound(steam_id))?;

    autologin::set_auto_login(&ctx.paths.autologin_file, &user.account_name)?;

    let name = if ctx.settings.tray_account_name {
        user.account_name.clone()
    } else {
        user.persona_name.clone()
    };
    tray::add_user(
        &ctx.paths.tray_file,
        TrayUser { platform: "Steam".to_string(), arg: format!("+s:{steam_id}"), name },
    )?;

    Ok(user)
}

/// Remove an account from the store, archiving it for later restore.
pub fn forget(ctx: &AppContext, steam_id: u64) -> Result<()> {
    let _guard = ctx.lock_store();

    let vdf = ctx.settings.login_users_vdf();
    let mut users = login_users::load(&vdf)?;
    let Some(user) = users.iter().find(|u| u.steam_id == steam_id).cloned() else {
        return Err(Error::AccountNotFound(steam_id));
    };

    forgotten::archive(&ctx.paths.forgotten_file, &user)?;
    users.retain(|u| u.steam_id != steam_id);
    login_users::save(&vdf, &users)?;
    log::info!("forgot account {} ({steam_id})", user.account_name);
    Ok(())
}

/// Reinstate archived accounts into the store. Returns how many records
/// were actually restored (requested ids already live are skipped, and
/// stay in the archive).
pub fn restore(ctx: &AppContext, steam_ids: &[u64]) -> Result<usize> {
    let _guard = ctx.lock_store();

    let vdf = ctx.settings.login_users_vdf();
    let mut users = login_users::load(&vdf)?;
    let live: Vec<u64> = users.iter().map(|u| u.steam_id).collect();

    let restored = forgotten::take(&ctx.paths.forgotten_file, steam_ids, &live)?;
    if restored.is_empty() {
        return Ok(0);
    }
    let count = restored.len();
    users.extend(restored);
    login_users::save(&vdf, &users)?;
    log::info!("restored {count} account(s)");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::AppContext;

    fn user(id: u64, name: &str, most_recent: bool) -> SteamUser {
        SteamUser {
            steam_id: id,
            account_name: name.to_string(),
            persona_name: format!("{name} persona"),
            timestamp: 1600000000,
            wants_offline_mode: false,
            most_recent,
            extra: vec![("RememberPassword".into(), "1".into())],
        }
    }

    fn test_ctx(dir: &std::path::Path) -> AppContext {
        let mut settings = Settings::default();
        settings.steam_path = dir.join("Steam");
        settings.autostart = false;
        let ctx = AppContext::with_settings(settings, &dir.join("config"));
        std::fs::create_dir_all(ctx.settings.login_users_vdf().parent().unwrap()).unwrap();
        ctx
    }

    const A: u64 = 76561198064588130;
    const B: u64 = 76561197960265729;

    fn seed_store(ctx: &AppContext) {
        login_users::save(
            &ctx.settings.login_users_vdf(),
            &[user(A, "alpha", true), user(B, "beta", false)],
        )
        .unwrap();
    }

    #[test]
    fn verify_accepts_only_in_range_17_digit_ids() {
        assert!(verify_steam_id("76561198064588130"));
        assert!(!verify_steam_id("7656119806458813"));
        assert!(!verify_steam_id("76561198064588130000"));
        assert!(!verify_steam_id("76561197960265728")); // range minimum itself
        assert!(!verify_steam_id("9999999999999999a"));
    }

    #[test]
    fn switch_marks_exactly_one_most_recent() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(dir.path());
        seed_store(&ctx);

        update_login_users(&ctx, B).unwrap();

        let users = login_users::load(&ctx.settings.login_users_vdf()).unwrap();
        let recent: Vec<u64> =
            users.iter().filter(|u| u.most_recent).map(|u| u.steam_id).collect();
        assert_eq!(recent, vec![B]);
    }

    #[test]
    fn switch_updates_pointer_and_tray_list() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(dir.path());
        seed_store(&ctx);

        update_login_users(&ctx, B).unwrap();

        #[cfg(not(windows))]
        {
            let pointer = std::fs::read_to_string(&ctx.paths.autologin_file).unwrap();
            assert!(pointer.contains("beta"));
        }
        let tray_users = tray::read(&ctx.paths.tray_file).unwrap();
        assert_eq!(tray_users.len(), 1);
        assert_eq!(tray_users[0].arg, format!("+s:{B}"));
        assert_eq!(tray_users[0].name, "beta persona");
    }

    #[test]
    fn unknown_id_leaves_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(dir.path());
        seed_store(&ctx);
        let before = std::fs::read(ctx.settings.login_users_vdf()).unwrap();

        let err = update_login_users(&ctx, 76561198000000001).unwrap_err();
        assert!(matches!(err, Error::AccountNotFound(_)));

        let after = std::fs::read(ctx.settings.login_users_vdf()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn invalid_id_aborts_before_any_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(dir.path());
        seed_store(&ctx);
        let err = switch_to(&ctx, "not-an-id").unwrap_err();
        assert!(matches!(err, Error::UnrecognizedIdentifier(_)));
    }

    #[test]
    fn forget_then_restore_reproduces_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(dir.path());
        seed_store(&ctx);
        let original = login_users::load(&ctx.settings.login_users_vdf())
            .unwrap()
            .into_iter()
            .find(|u| u.steam_id == B)
            .unwrap();

        forget(&ctx, B).unwrap();
        assert_eq!(login_users::load(&ctx.settings.login_users_vdf()).unwrap().len(), 1);

        assert_eq!(restore(&ctx, &[B]).unwrap(), 1);
        let back = login_users::load(&ctx.settings.login_users_vdf())
            .unwrap()
            .into_iter()
            .find(|u| u.steam_id == B)
            .unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn forget_unknown_id_is_account_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(dir.path());
        seed_store(&ctx);
        assert!(matches!(forget(&ctx, 1).unwrap_err(), Error::AccountNotFound(1)));
    }

    #[test]
    fn restore_of_live_id_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(dir.path());
        seed_store(&ctx);
        forget(&ctx, B).unwrap();
        restore(&ctx, &[B]).unwrap();
        // B is live again; a second restore request finds nothing to do.
        assert_eq!(restore(&ctx, &[B]).unwrap(), 0);
        assert_eq!(login_users::load(&ctx.settings.login_users_vdf()).unwrap().len(), 2);
    }
}
