#[cfg(test)]
#[path = "sessions_test.rs"]
mod tests;

use std::path;

use anyhow::Result;
use chrono::Local;
use chrono::SecondsFormat;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Message;
use crate::domain::models::StoredSession;

/// The transcript store. Every named session file holds a JSON array of
/// timestamped snapshots; saving appends, loading never writes.
pub struct Sessions {
    pub session_dir: path::PathBuf,
}

impl Default for Sessions {
    fn default() -> Sessions {
        return Sessions::new(path::PathBuf::from(Config::get(ConfigKey::SessionDir)));
    }
}

impl Sessions {
    pub fn new(session_dir: path::PathBuf) -> Sessions {
        return Sessions { session_dir };
    }

    fn file_path(&self, filename: &str) -> path::PathBuf {
        return self.session_dir.join(filename);
    }

    /// Appends a snapshot of the transcript to the named session file,
    /// creating the directory and the array as needed. An existing file that
    /// does not parse as a session array is discarded wholesale and replaced
    /// by a fresh array holding only this snapshot.
    pub async fn save(&self, messages: &[Message], filename: &str) -> Result<path::PathBuf> {
        let file_path = self.file_path(filename);

        let mut sessions = match fs::read_to_string(&file_path).await {
            Ok(payload) => {
                serde_json::from_str::<Vec<StoredSession>>(&payload).unwrap_or_default()
            }
            Err(_) => vec![],
        };

        sessions.push(StoredSession {
            timestamp: Local::now().to_rfc3339_opts(SecondsFormat::Micros, false),
            messages: messages.to_vec(),
        });

        if !self.session_dir.exists() {
            fs::create_dir_all(&self.session_dir).await?;
        }

        let payload = serde_json::to_string_pretty(&sessions)?;
        let mut file = fs::File::create(&file_path).await?;
        file.write_all(payload.as_bytes()).await?;

        return Ok(file_path);
    }

    /// Parses an externally supplied blob as a session array. Read-only: the
    /// managed directory is never touched, and a malformed blob is an error
    /// for the caller to surface, not silently emptied.
    pub fn load_bytes(bytes: &[u8]) -> Result<Vec<StoredSession>> {
        let payload = std::str::from_utf8(bytes)?;
        let sessions = serde_json::from_str::<Vec<StoredSession>>(payload)?;

        return Ok(sessions);
    }

    pub async fn load_file(file_path: &str) -> Result<Vec<StoredSession>> {
        let bytes = fs::read(file_path).await?;
        return Sessions::load_bytes(&bytes);
    }
}
