use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Input did not match any known SteamID representation.
    #[error("input SteamID was not recognised: {0}")]
    UnrecognizedIdentifier(String),

    /// The credential store is missing at its configured location. Fatal:
    /// the caller decides whether to terminate (the CLI exits with code 2).
    #[error("loginusers.vdf not found at {}", .0.display())]
    StoreUnavailable(PathBuf),

    /// The requested account is not present in the credential store.
    /// Returned before any mutation has taken place.
    #[error("account {0} not found in loginusers.vdf")]
    AccountNotFound(u64),

    /// Remote profile lookup failed for a single account. Degrades that
    /// account to default flags; never aborts a batch.
    #[error("profile fetch failed for {id}: {reason}")]
    RemoteFetchFailed { id: u64, reason: String },

    /// The on-disk status cache could not be parsed. Triggers a full
    /// discard and rebuild; not surfaced to the user.
    #[error("status cache unreadable: {0}")]
    CacheCorrupt(String),

    #[error("malformed loginusers.vdf: {0}")]
    StoreFormat(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("failed to launch Steam: {0}")]
    Launch(String),
}

impl Error {
    /// Process exit code the CLI uses for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::StoreUnavailable(_) => 2,
            _ => 1,
        }
    }
}
