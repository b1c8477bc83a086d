//! services/api/src/stores/history.rs
//!
//! The mood journal: an append-only, newest-first log whose only mutable field
//! is the note.

use std::sync::Arc;

use qalbu_core::domain::{MoodLog, MoodType};
use qalbu_core::ports::KeyValueStore;
use tracing::{info, warn};
use uuid::Uuid;

use super::{load_collection, save_collection, scoped_key, Entry, StorageError};
use crate::records::MoodLogRecord;

pub const HISTORY_STORAGE_KEY: &str = "qalbu_mood_history";

#[derive(Clone)]
pub struct MoodHistoryStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl MoodHistoryStore {
    pub fn for_owner(kv: Arc<dyn KeyValueStore>, owner: &str) -> Self {
        Self {
            kv,
            key: scoped_key(HISTORY_STORAGE_KEY, owner),
        }
    }

    /// Creates a log for the mood and puts it at the front of the history.
    pub async fn record(&self, mood: MoodType) -> Result<MoodLog, StorageError> {
        let log = MoodLog::new(mood);
        let mut entries = self.load().await?;
        entries.insert(0, Entry::Known(MoodLogRecord::from(&log)));
        save_collection(self.kv.as_ref(), &self.key, &entries).await?;
        info!(log_id = %log.id, mood = %mood, "Recorded mood log.");
        Ok(log)
    }

    /// Sets the note of an existing log. Returns `None`, writing nothing, when
    /// no readable log has that id (for example after the history was cleared).
    /// A blank note clears the existing one.
    pub async fn attach_note(&self, id: Uuid, note: &str) -> Result<Option<MoodLog>, StorageError> {
        let mut entries = self.load().await?;
        let id_str = id.to_string();
        let Some(record) = entries
            .iter_mut()
            .filter_map(Entry::known_mut)
            .find(|r| r.id == id_str)
        else {
            warn!(log_id = %id, "Tried to attach a note to an unknown mood log.");
            return Ok(None);
        };
        let Some(mut updated) = record.to_domain() else {
            warn!(log_id = %id, mood = %record.mood, "Mood log is unreadable; note not saved.");
            return Ok(None);
        };

        let note = note.trim();
        updated.note = (!note.is_empty()).then(|| note.to_string());
        record.note = updated.note.clone();
        save_collection(self.kv.as_ref(), &self.key, &entries).await?;
        Ok(Some(updated))
    }

    /// The full history, newest first.
    pub async fn all(&self) -> Result<Vec<MoodLog>, StorageError> {
        let entries = self.load().await?;
        Ok(entries
            .iter()
            .filter_map(Entry::known)
            .filter_map(MoodLogRecord::to_domain)
            .collect())
    }

    pub async fn clear(&self) -> Result<(), StorageError> {
        self.kv.remove(&self.key).await?;
        info!(key = %self.key, "Cleared mood history.");
        Ok(())
    }

    async fn load(&self) -> Result<Vec<Entry<MoodLogRecord>>, StorageError> {
        load_collection(self.kv.as_ref(), &self.key).await
    }
}
