//! Reader/writer for Steam's `loginusers.vdf` credential store.
//!
//! The file is a VDF document: a `"users"` root object keyed by 17-digit
//! SteamID64 strings, one object of quoted key/value pairs per account.
//! Unknown keys are carried through a load/save cycle untouched.

use std::path::Path;

use crate::error::{Error, Result};

/// One locally known account from `loginusers.vdf`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SteamUser {
    pub steam_id: u64,
    pub account_name: String,
    pub persona_name: String,
    /// Seconds since epoch, UTC.
    pub timestamp: u64,
    pub wants_offline_mode: bool,
    pub most_recent: bool,
    /// Keys we don't interpret (e.g. `RememberPassword`), in file order.
    #[serde(default)]
    pub extra: Vec<(String, String)>,
}

// ---------- VDF primitives ----------

#[derive(Debug, Clone)]
enum Vdf {
    Str(String),
    Obj(Vec<(String, Vdf)>),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Str(String),
    Open,
    Close,
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut out = vec![];
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' => out.push(Token::Open),
            '}' => out.push(Token::Close),
            '"' => {
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some('\\') => match chars.next() {
                            Some('n') => s.push('\n'),
                            Some('t') => s.push('\t'),
                            Some(other) => s.push(other),
                            None => {
                                return Err(Error::StoreFormat("unterminated escape".into()))
                            }
                        },
                        Some('"') => break,
                        Some(other) => s.push(other),
                        None => return Err(Error::StoreFormat("unterminated string".into())),
                    }
                }
                out.push(Token::Str(s));
            }
            c if c.is_whitespace() => {}
            other => {
                return Err(Error::StoreFormat(format!("unexpected character {other:?}")));
            }
        }
    }
    Ok(out)
}

fn parse_pairs(tokens: &[Token], pos: &mut usize) -> Result<Vec<(String, Vdf)>> {
    let mut pairs = vec![];
    while *pos < tokens.len() {
        match &tokens[*pos] {
            Token::Close => {
                *pos += 1;
                return Ok(pairs);
            }
            Token::Str(key) => {
                let key = key.clone();
                *pos += 1;
                match tokens.get(*pos) {
                    Some(Token::Str(v)) => {
                        pairs.push((key, Vdf::Str(v.clone())));
                        *pos += 1;
                    }
                    Some(Token::Open) => {
                        *pos += 1;
                        pairs.push((key, Vdf::Obj(parse_pairs(tokens, pos)?)));
                    }
                    _ => return Err(Error::StoreFormat(format!("no value for key {key:?}"))),
                }
            }
            Token::Open => return Err(Error::StoreFormat("object without a key".into())),
        }
    }
    Ok(pairs)
}

fn escape(s: &str) -> String {
    s.replace('\\', r"\\").replace('"', r#"\""#)
}

fn write_pairs(out: &mut String, pairs: &[(String, Vdf)], depth: usize) {
    let indent = "\t".repeat(depth);
    for (key, value) in pairs {
        match value {
            Vdf::Str(v) => {
                out.push_str(&format!("{indent}\"{}\"\t\t\"{}\"\n", escape(key), escape(v)));
            }
            Vdf::Obj(inner) => {
                out.push_str(&format!("{indent}\"{}\"\n{indent}{{\n", escape(key)));
                write_pairs(out, inner, depth + 1);
                out.push_str(&format!("{indent}}}\n"));
            }
        }
    }
}

// ---------- Account mapping ----------

fn flag(v: &str) -> bool {
    v == "1"
}

fn user_from_pairs(steam_id: u64, pairs: &[(String, Vdf)]) -> Option<SteamUser> {
    let mut user = SteamUser {
        steam_id,
        account_name: String::new(),
        persona_name: String::new(),
        timestamp: 0,
        wants_offline_mode: false,
        most_recent: false,
        extra: vec![],
    };
    for (key, value) in pairs {
        let Vdf::Str(v) = value else { continue };
        match key.as_str() {
            "AccountName" => user.account_name = v.clone(),
            "PersonaName" => user.persona_name = v.clone(),
            "Timestamp" => user.timestamp = v.parse().unwrap_or(0),
            "WantsOfflineMode" => user.wants_offline_mode = flag(v),
            // Steam has written both spellings over the years.
            "mostrecent" | "MostRecent" => user.most_recent = flag(v),
            _ => user.extra.push((key.clone(), v.clone())),
        }
    }
    // Partially written entries are tolerated, not surfaced.
    if user.account_name.is_empty() || user.persona_name.is_empty() {
        return None;
    }
    Some(user)
}

fn user_to_pairs(user: &SteamUser) -> Vec<(String, Vdf)> {
    let b = |v: bool| Vdf::Str(if v { "1" } else { "0" }.to_string());
    let mut pairs = vec![
        ("AccountName".to_string(), Vdf::Str(user.account_name.clone())),
        ("PersonaName".to_string(), Vdf::Str(user.persona_name.clone())),
    ];
    for (k, v) in &user.extra {
        pairs.push((k.clone(), Vdf::Str(v.clone())));
    }
    pairs.push(("mostrecent".to_string(), b(user.most_recent)));
    pairs.push(("Timestamp".to_string(), Vdf::Str(user.timestamp.to_string())));
    pairs.push(("WantsOfflineMode".to_string(), b(user.wants_offline_mode)));
    pairs
}

// ---------- Public API ----------

/// Parse `loginusers.vdf` text into account records.
pub fn parse(text: &str) -> Result<Vec<SteamUser>> {
    let tokens = tokenize(text)?;
    let mut pos = 0;
    let root = parse_pairs(&tokens, &mut pos)?;
    let users = root
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("users"))
        .and_then(|(_, v)| match v {
            Vdf::Obj(pairs) => Some(pairs),
            Vdf::Str(_) => None,
        })
        .ok_or_else(|| Error::StoreFormat("no \"users\" object".into()))?;

    let mut out = vec![];
    for (id, value) in users {
        let Vdf::Obj(pairs) = value else { continue };
        let Ok(steam_id) = id.parse::<u64>() else {
            log::warn!("skipping loginusers entry with non-numeric key {id:?}");
            continue;
        };
        if let Some(user) = user_from_pairs(steam_id, pairs) {
            out.push(user);
        }
    }
    Ok(out)
}

/// Serialize account records back into VDF text.
pub fn serialize(users: &[SteamUser]) -> String {
    let accounts: Vec<(String, Vdf)> = users
        .iter()
        .map(|u| (u.steam_id.to_string(), Vdf::Obj(user_to_pairs(u))))
        .collect();
    let root = vec![("users".to_string(), Vdf::Obj(accounts))];
    let mut out = String::new();
    write_pairs(&mut out, &root, 0);
    out
}

/// Load the credential store. A missing file is fatal for the operation;
/// the caller decides whether to terminate the process.
pub fn load(path: &Path) -> Result<Vec<SteamUser>> {
    if !path.exists() {
        return Err(Error::StoreUnavailable(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    parse(&text)
}

/// Save the store: write a temp sibling, rotate the previous file to
/// `<path>_last`, then rename the temp over the real path. Readers see
/// either the fully-old or fully-new file, never a partial write.
pub fn save(path: &Path, users: &[SteamUser]) -> Result<()> {
    let text = serialize(users);

    let temp = sibling(path, "_temp");
    let last = sibling(path, "_last");
    std::fs::write(&temp, text)?;
    if path.exists() {
        let _ = std::fs::remove_file(&last);
        std::fs::rename(path, &last)?;
    }
    std::fs::rename(&temp, path)?;
    Ok(())
}

/// Copy the store into `backup_dir` under a timestamped name.
pub fn backup(path: &Path, backup_dir: &Path) -> Result<std::path::PathBuf> {
    std::fs::create_dir_all(backup_dir)?;
    let stamp = chrono::Local::now().format("%d-%m-%Y_%H-%M-%S");
    let dest = backup_dir.join(format!("loginusers-{stamp}.vdf"));
    std::fs::copy(path, &dest)?;
    Ok(dest)
}

fn sibling(path: &Path, suffix: &str) -> std::path::PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    std::path::PathBuf::from(name)
}
