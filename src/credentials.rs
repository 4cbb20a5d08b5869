//! Stored account credentials: a single JSON object on disk.

use std::{io, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub account_hash: String,
}

/// Loads stored credentials. A missing, unreadable, or malformed file all
/// degrade to `None` ("must register"), never an error.
pub async fn load(path: &Path) -> Option<Credentials> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "user credentials not found");
            return None;
        }
        Err(error) => {
            warn!(?error, path = %path.display(), "can't read user credentials");
            return None;
        }
    };

    match serde_json::from_str::<Credentials>(&raw) {
        Ok(credentials) if !credentials.account_hash.is_empty() => Some(credentials),
        Ok(_) => {
            warn!(path = %path.display(), "stored credentials have no account hash");
            None
        }
        Err(error) => {
            warn!(?error, path = %path.display(), "can't parse user credentials");
            None
        }
    }
}

/// Overwrites the credentials file with pretty-printed JSON. Write
/// failures are fatal and propagate.
pub async fn save(credentials: &Credentials, path: &Path) -> Result<()> {
    let mut pretty = serde_json::to_string_pretty(credentials)?;
    pretty.push('\n');
    tokio::fs::write(path, pretty)
        .await
        .with_context(|| format!("failed to write credentials to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("credentials.json");
        assert_eq!(load(&path).await, None);
        // Idempotent: a second load without a save sees the same thing.
        assert_eq!(load(&path).await, None);
    }

    #[tokio::test]
    async fn malformed_json_loads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("credentials.json");
        tokio::fs::write(&path, "not json at all").await.expect("write");
        assert_eq!(load(&path).await, None);
    }

    #[tokio::test]
    async fn object_without_hash_loads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("credentials.json");
        tokio::fs::write(&path, r#"{"nickname": "alice"}"#)
            .await
            .expect("write");
        assert_eq!(load(&path).await, None);

        tokio::fs::write(&path, r#"{"account_hash": ""}"#)
            .await
            .expect("write");
        assert_eq!(load(&path).await, None);
    }

    #[tokio::test]
    async fn save_then_load_round_trips_pretty_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("credentials.json");
        let credentials = Credentials {
            account_hash: "abc123".into(),
        };

        save(&credentials, &path).await.expect("save");

        let raw = tokio::fs::read_to_string(&path).await.expect("read");
        assert!(raw.contains("\"account_hash\": \"abc123\""));

        let loaded = load(&path).await;
        assert_eq!(loaded, Some(credentials.clone()));
        // Idempotent without an intervening save.
        assert_eq!(load(&path).await, Some(credentials));
    }
}
