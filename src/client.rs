//! Starting and stopping the Steam client process.

use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};

/// Force-terminate all Steam processes. Best-effort: a non-zero exit from
/// the process manager is logged, not fatal, since Steam may simply not be
/// running.
pub fn close_steam() {
    #[cfg(windows)]
    let result = Command::new("cmd.exe")
        .args(["/C", "TASKKILL", "/F", "/T", "/IM", "steam*"])
        .output();
    #[cfg(not(windows))]
    let result = Command::new("pkill").args(["-f", "steam"]).output();

    match result {
        Ok(out) if !out.status.success() => {
            log::info!("steam was not running (process manager exit {:?})", out.status.code());
        }
        Ok(_) => log::info!("steam processes terminated"),
        Err(e) => log::warn!("could not run process manager: {e}"),
    }
}

/// Launch the Steam client. With `admin` the executable is spawned directly
/// (inheriting our elevation on Windows); otherwise it goes through
/// `explorer.exe` so the client runs un-elevated.
pub fn start_steam(steam_exe: &Path, admin: bool) -> Result<()> {
    log::info!("starting steam: {}", steam_exe.to_string_lossy());

    #[cfg(windows)]
    {
        let mut cmd = if admin {
            Command::new(steam_exe)
        } else {
            let mut c = Command::new("explorer.exe");
            c.arg(steam_exe);
            c
        };
        cmd.spawn().map_err(|e| Error::Launch(e.to_string()))?;
    }

    #[cfg(not(windows))]
    {
        let _ = admin;
        Command::new(steam_exe)
            .spawn()
            .map_err(|e| Error::Launch(e.to_string()))?;
    }

    Ok(())
}
