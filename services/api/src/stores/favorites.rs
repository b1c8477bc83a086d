//! services/api/src/stores/favorites.rs
//!
//! Favorites form a set keyed by the content-derived id, kept newest first.

use std::sync::Arc;

use qalbu_core::domain::FavoriteItem;
use qalbu_core::ports::KeyValueStore;
use tracing::info;

use super::{load_collection, save_collection, scoped_key, Entry, StorageError};
use crate::records::FavoriteRecord;

pub const FAVORITES_STORAGE_KEY: &str = "qalbu_favorites";

#[derive(Clone)]
pub struct FavoritesStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl FavoritesStore {
    pub fn for_owner(kv: Arc<dyn KeyValueStore>, owner: &str) -> Self {
        Self {
            kv,
            key: scoped_key(FAVORITES_STORAGE_KEY, owner),
        }
    }

    /// Idempotent insert. Returns `true` when the item was new.
    pub async fn save(&self, item: &FavoriteItem) -> Result<bool, StorageError> {
        let mut entries = self.load().await?;
        if entries.iter().filter_map(Entry::known).any(|r| r.id == item.id) {
            return Ok(false);
        }
        entries.insert(0, Entry::Known(FavoriteRecord::from(item)));
        save_collection(self.kv.as_ref(), &self.key, &entries).await?;
        info!(favorite_id = %item.id, kind = item.kind().as_str(), "Saved favorite.");
        Ok(true)
    }

    pub async fn remove(&self, id: &str) -> Result<(), StorageError> {
        let mut entries = self.load().await?;
        entries.retain(|e| e.known().map_or(true, |r| r.id != id));
        save_collection(self.kv.as_ref(), &self.key, &entries).await
    }

    pub async fn contains(&self, id: &str) -> Result<bool, StorageError> {
        Ok(self
            .load()
            .await?
            .iter()
            .filter_map(Entry::known)
            .any(|r| r.id == id))
    }

    pub async fn get(&self, id: &str) -> Result<Option<FavoriteItem>, StorageError> {
        Ok(self
            .load()
            .await?
            .iter()
            .filter_map(Entry::known)
            .find(|r| r.id == id)
            .and_then(FavoriteRecord::to_domain))
    }

    /// All favorites, newest first.
    pub async fn all(&self) -> Result<Vec<FavoriteItem>, StorageError> {
        let entries = self.load().await?;
        Ok(entries
            .iter()
            .filter_map(Entry::known)
            .filter_map(FavoriteRecord::to_domain)
            .collect())
    }

    async fn load(&self) -> Result<Vec<Entry<FavoriteRecord>>, StorageError> {
        load_collection(self.kv.as_ref(), &self.key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryKvStore;
    use qalbu_core::domain::{FavoriteContent, HadithContent, QuranContent};

    fn ayah(surah: u32, ayah: u32) -> FavoriteItem {
        FavoriteItem::new(
            FavoriteContent::Quran(QuranContent {
                surah_name: "Al-Baqarah".into(),
                surah_number: surah,
                ayah_number: ayah,
                arabic_text: "...".into(),
                translation: "...".into(),
                reflection: None,
            }),
            "Sedih",
        )
    }

    fn store() -> FavoritesStore {
        FavoritesStore::for_owner(Arc::new(InMemoryKvStore::new()), "tester")
    }

    #[tokio::test]
    async fn unreadable_entries_survive_a_save() {
        let kv = Arc::new(InMemoryKvStore::new());
        let favorites = FavoritesStore::for_owner(kv.clone(), "tester");
        let key = scoped_key(FAVORITES_STORAGE_KEY, "tester");
        let kept = ayah(13, 28);
        let stored = serde_json::json!([
            FavoriteRecord::from(&kept),
            { "id": "legacy-1", "type": "doa" }
        ]);
        kv.set(&key, &stored.to_string()).await.unwrap();

        assert_eq!(favorites.all().await.unwrap().len(), 1);
        assert!(favorites.save(&ayah(2, 286)).await.unwrap());
        favorites.remove("legacy-1").await.unwrap();

        let ids: Vec<_> = favorites.all().await.unwrap().into_iter().map(|f| f.id).collect();
        assert_eq!(ids, vec!["quran-2-286".to_string(), kept.id]);
        let raw = kv.get(&key).await.unwrap().unwrap();
        assert!(raw.contains("legacy-1"));
    }

    #[tokio::test]
    async fn saving_twice_keeps_one_entry() {
        let favorites = store();
        assert!(favorites.save(&ayah(2, 286)).await.unwrap());
        assert!(!favorites.save(&ayah(2, 286)).await.unwrap());
        assert_eq!(favorites.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn save_contains_remove_round_trip() {
        let favorites = store();
        let item = ayah(2, 286);
        favorites.save(&item).await.unwrap();
        assert!(favorites.contains("quran-2-286").await.unwrap());

        favorites.remove(&item.id).await.unwrap();
        assert!(!favorites.contains(&item.id).await.unwrap());
    }

    #[tokio::test]
    async fn newest_favorite_comes_first() {
        let favorites = store();
        favorites.save(&ayah(94, 5)).await.unwrap();
        let hadith = FavoriteItem::new(
            FavoriteContent::Hadith(HadithContent {
                source: "HR. Bukhari".into(),
                text: "Innamal a'malu bin niyyat".into(),
                reflection: None,
            }),
            "Bingung",
        );
        favorites.save(&hadith).await.unwrap();

        let all = favorites.all().await.unwrap();
        assert_eq!(all[0].id, hadith.id);
        assert_eq!(all[1].id, "quran-94-5");
        assert_eq!(favorites.get(&hadith.id).await.unwrap().unwrap().mood_context, "Bingung");
    }

    #[tokio::test]
    async fn removing_unknown_id_is_harmless() {
        let favorites = store();
        favorites.save(&ayah(1, 1)).await.unwrap();
        favorites.remove("quran-9-9").await.unwrap();
        assert_eq!(favorites.all().await.unwrap().len(), 1);
    }
}
