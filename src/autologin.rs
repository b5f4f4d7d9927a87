//! The OS-level "last used account" pointer Steam reads at startup.
//!
//! On Windows this is `HKCU\Software\Valve\Steam` (`AutoLoginUser` plus
//! `RememberPassword`). Elsewhere there is no registry, so the same two
//! values go into a small JSON file for inspection and tests.

use std::path::Path;

use crate::error::Result;

#[cfg(windows)]
pub fn set_auto_login(_pointer_file: &Path, account_name: &str) -> Result<()> {
    use winreg::enums::HKEY_CURRENT_USER;
    use winreg::RegKey;

    let (key, _) = RegKey::predef(HKEY_CURRENT_USER).create_subkey(r"Software\Valve\Steam")?;
    key.set_value("AutoLoginUser", &account_name)?;
    key.set_value("RememberPassword", &1u32)?;
    Ok(())
}

#[cfg(not(windows))]
pub fn set_auto_login(pointer_file: &Path, account_name: &str) -> Result<()> {
    let value = serde_json::json!({
        "AutoLoginUser": account_name,
        "RememberPassword": 1,
    });
    if let Some(parent) = pointer_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(pointer_file, serde_json::to_string_pretty(&value)?)?;
    Ok(())
}

#[cfg(all(test, not(windows)))]
mod tests {
    use super::*;

    #[test]
    fn pointer_file_holds_the_login_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("autologin.json");
        set_auto_login(&path, "alpha").unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["AutoLoginUser"], "alpha");
        assert_eq!(value["RememberPassword"], 1);
    }

    #[test]
    fn pointer_is_overwritten_on_each_switch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("autologin.json");
        set_auto_login(&path, "alpha").unwrap();
        set_auto_login(&path, "beta").unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("beta"));
        assert!(!text.contains("alpha"));
    }
}
