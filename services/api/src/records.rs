//! services/api/src/records.rs
//!
//! The camelCase JSON shapes shared by the provider adapter, the persistence
//! stores and the HTTP layer, with conversions to and from the core domain.

use chrono::{DateTime, Utc};
use qalbu_core::domain::{
    FavoriteContent, FavoriteItem, HadithContent, HealingContent, InvalidContent, MoodLog,
    MoodType, QuranContent,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Generated Content Records
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuranRecord {
    pub surah_name: String,
    pub surah_number: u32,
    pub ayah_number: u32,
    pub arabic_text: String,
    pub translation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflection: Option<String>,
}

impl QuranRecord {
    pub fn to_domain(self) -> QuranContent {
        QuranContent {
            surah_name: self.surah_name,
            surah_number: self.surah_number,
            ayah_number: self.ayah_number,
            arabic_text: self.arabic_text,
            translation: self.translation,
            reflection: self.reflection.filter(|r| !r.trim().is_empty()),
        }
    }
}

impl From<&QuranContent> for QuranRecord {
    fn from(q: &QuranContent) -> Self {
        Self {
            surah_name: q.surah_name.clone(),
            surah_number: q.surah_number,
            ayah_number: q.ayah_number,
            arabic_text: q.arabic_text.clone(),
            translation: q.translation.clone(),
            reflection: q.reflection.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HadithRecord {
    pub source: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflection: Option<String>,
}

impl HadithRecord {
    pub fn to_domain(self) -> HadithContent {
        HadithContent {
            source: self.source,
            text: self.text,
            reflection: self.reflection.filter(|r| !r.trim().is_empty()),
        }
    }
}

impl From<&HadithContent> for HadithRecord {
    fn from(h: &HadithContent) -> Self {
        Self {
            source: h.source.clone(),
            text: h.text.clone(),
            reflection: h.reflection.clone(),
        }
    }
}

/// The document the provider is asked to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealingContentRecord {
    pub mood: String,
    pub summary: String,
    pub quran: QuranRecord,
    pub hadith: HadithRecord,
    pub wisdom: String,
    pub practical_steps: Vec<String>,
    pub reflection_questions: Vec<String>,
}

impl HealingContentRecord {
    /// Converts to the domain type, rejecting anything that breaks its invariants.
    pub fn into_domain(self) -> Result<HealingContent, InvalidContent> {
        let content = HealingContent {
            mood: self.mood,
            summary: self.summary,
            quran: self.quran.to_domain(),
            hadith: self.hadith.to_domain(),
            wisdom: self.wisdom,
            practical_steps: self.practical_steps,
            reflection_questions: self.reflection_questions,
        };
        content.validate()?;
        Ok(content)
    }
}

impl From<&HealingContent> for HealingContentRecord {
    fn from(c: &HealingContent) -> Self {
        Self {
            mood: c.mood.clone(),
            summary: c.summary.clone(),
            quran: QuranRecord::from(&c.quran),
            hadith: HadithRecord::from(&c.hadith),
            wisdom: c.wisdom.clone(),
            practical_steps: c.practical_steps.clone(),
            reflection_questions: c.reflection_questions.clone(),
        }
    }
}

//=========================================================================================
// Persisted Store Records
//=========================================================================================

/// One entry of the persisted mood history array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodLogRecord {
    pub id: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub mood: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl MoodLogRecord {
    /// `None` when the entry does not describe a valid log.
    pub fn to_domain(&self) -> Option<MoodLog> {
        Some(MoodLog {
            id: Uuid::parse_str(&self.id).ok()?,
            created_at: DateTime::<Utc>::from_timestamp_millis(self.timestamp)?,
            mood: self.mood.parse::<MoodType>().ok()?,
            note: self.note.clone(),
        })
    }
}

impl From<&MoodLog> for MoodLogRecord {
    fn from(log: &MoodLog) -> Self {
        Self {
            id: log.id.to_string(),
            timestamp: log.created_at.timestamp_millis(),
            mood: log.mood.label().to_string(),
            note: log.note.clone(),
        }
    }
}

/// The `type` / `content` pair of a persisted favorite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum FavoriteBody {
    Quran(QuranRecord),
    Hadith(HadithRecord),
}

/// One entry of the persisted favorites array, also the HTTP view of a favorite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRecord {
    pub id: String,
    #[serde(flatten)]
    pub body: FavoriteBody,
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub mood_context: String,
}

impl FavoriteRecord {
    pub fn to_domain(&self) -> Option<FavoriteItem> {
        let content = match self.body.clone() {
            FavoriteBody::Quran(q) => FavoriteContent::Quran(q.to_domain()),
            FavoriteBody::Hadith(h) => FavoriteContent::Hadith(h.to_domain()),
        };
        Some(FavoriteItem {
            id: self.id.clone(),
            content,
            saved_at: DateTime::<Utc>::from_timestamp_millis(self.timestamp)?,
            mood_context: self.mood_context.clone(),
        })
    }
}

impl From<&FavoriteItem> for FavoriteRecord {
    fn from(item: &FavoriteItem) -> Self {
        let body = match &item.content {
            FavoriteContent::Quran(q) => FavoriteBody::Quran(QuranRecord::from(q)),
            FavoriteContent::Hadith(h) => FavoriteBody::Hadith(HadithRecord::from(h)),
        };
        Self {
            id: item.id.clone(),
            body,
            timestamp: item.saved_at.timestamp_millis(),
            mood_context: item.mood_context.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn favorite_record_uses_flat_type_and_content_fields() {
        let record = FavoriteRecord {
            id: "quran-2-286".into(),
            body: FavoriteBody::Quran(QuranRecord {
                surah_name: "Al-Baqarah".into(),
                surah_number: 2,
                ayah_number: 286,
                arabic_text: "...".into(),
                translation: "...".into(),
                reflection: None,
            }),
            timestamp: 1_700_000_000_000,
            mood_context: "Sedih".into(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "quran");
        assert_eq!(value["content"]["surahNumber"], 2);
        assert_eq!(value["moodContext"], "Sedih");
        assert!(value["content"].get("reflection").is_none());
    }

    #[test]
    fn hadith_favorite_parses_from_stored_json() {
        let value = json!({
            "id": "hadith-97",
            "type": "hadith",
            "content": { "source": "HR. Muslim", "text": "a" },
            "timestamp": 1_700_000_000_000i64,
            "moodContext": "Cemas"
        });
        let record: FavoriteRecord = serde_json::from_value(value).unwrap();
        let item = record.to_domain().unwrap();
        assert_eq!(item.id, "hadith-97");
        assert!(matches!(item.content, FavoriteContent::Hadith(ref h) if h.source == "HR. Muslim"));
    }

    #[test]
    fn mood_log_record_keeps_label_and_millis() {
        let log = MoodLog::new(MoodType::Sad);
        let record = MoodLogRecord::from(&log);
        assert_eq!(record.mood, "Sedih");
        assert_eq!(record.timestamp, log.created_at.timestamp_millis());

        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("note").is_none());
    }

    #[test]
    fn mood_log_record_with_unknown_mood_is_rejected() {
        let record = MoodLogRecord {
            id: Uuid::new_v4().to_string(),
            timestamp: 0,
            mood: "Euphoric".into(),
            note: None,
        };
        assert!(record.to_domain().is_none());
    }

    #[test]
    fn healing_record_with_too_few_steps_is_invalid() {
        let value = json!({
            "mood": "Sedih",
            "summary": "s",
            "quran": {
                "surahName": "Ad-Duha", "surahNumber": 93, "ayahNumber": 3,
                "arabicText": "ما ودعك ربك وما قلى", "translation": "t"
            },
            "hadith": { "source": "HR. Tirmidzi", "text": "h" },
            "wisdom": "w",
            "practicalSteps": ["one", "two"],
            "reflectionQuestions": ["q1", "q2"]
        });
        let record: HealingContentRecord = serde_json::from_value(value).unwrap();
        assert!(matches!(
            record.into_domain(),
            Err(InvalidContent::TooFew { field: "practicalSteps", .. })
        ));
    }
}
