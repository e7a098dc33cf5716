//! JSON-lines file-per-room implementation of the HistoryStore trait.
//!
//! Each live room owns one append-only file `<dir>/<room_id>.json` holding
//! one serialized `ChatMessage` per line. The file is deleted in full when
//! the room is retired.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::domain::{ChatMessage, HistoryError, HistoryStore, RoomId};

/// Append-only JSON-lines history log, one file per room.
pub struct JsonlHistoryStore {
    dir: PathBuf,
}

impl JsonlHistoryStore {
    /// Create a store rooted at `dir`. The directory is created lazily on
    /// first append.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn room_path(&self, room_id: RoomId) -> PathBuf {
        self.dir.join(format!("{}.json", room_id))
    }
}

#[async_trait]
impl HistoryStore for JsonlHistoryStore {
    async fn append(&self, room_id: RoomId, message: &ChatMessage) -> Result<(), HistoryError> {
        fs::create_dir_all(&self.dir).await?;

        let mut line = serde_json::to_string(message)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.room_path(room_id))
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn read_all(&self, room_id: RoomId) -> Result<Vec<ChatMessage>, HistoryError> {
        let content = match fs::read_to_string(self.room_path(room_id)).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        // Unparsable lines are skipped rather than failing the whole read.
        Ok(content
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }

    async fn delete(&self, room_id: RoomId) -> Result<(), HistoryError> {
        match fs::remove_file(self.room_path(room_id)).await {
            Ok(()) => {
                tracing::info!("History for room {} deleted", room_id);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
