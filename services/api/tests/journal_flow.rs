//! End-to-end flow over the in-memory store: select moods, annotate the
//! journal, pin favorites, and read the statistics back.

use std::sync::Arc;

use api_lib::adapters::InMemoryKvStore;
use api_lib::orchestrator::{MoodOrchestrator, PipelineState};
use api_lib::records::FavoriteRecord;
use async_trait::async_trait;
use chrono::Utc;
use qalbu_core::domain::{
    FavoriteContent, FavoriteItem, HadithContent, HealingContent, MoodType, QuranContent,
};
use qalbu_core::ports::{ContentGenerationService, PortResult};
use qalbu_core::stats::MoodStats;

struct ScriptedContent;

#[async_trait]
impl ContentGenerationService for ScriptedContent {
    async fn generate_healing_content(&self, mood: MoodType) -> PortResult<HealingContent> {
        Ok(HealingContent {
            mood: mood.label().to_string(),
            summary: "Hati yang tenang ada dalam mengingat Allah.".into(),
            quran: QuranContent {
                surah_name: "Ar-Ra'd".into(),
                surah_number: 13,
                ayah_number: 28,
                arabic_text: "أَلَا بِذِكْرِ اللَّهِ تَطْمَئِنُّ الْقُلُوبُ".into(),
                translation: "Ingatlah, hanya dengan mengingat Allah hati menjadi tenteram.".into(),
                reflection: Some("Dzikir adalah jangkar hati.".into()),
            },
            hadith: HadithContent {
                source: "HR. Bukhari dan Muslim".into(),
                text: "Allah berfirman: Aku sesuai persangkaan hamba-Ku kepada-Ku.".into(),
                reflection: None,
            },
            wisdom: "Berprasangka baiklah kepada Allah.".into(),
            practical_steps: vec![
                "Baca dzikir pagi".into(),
                "Tarik napas panjang".into(),
                "Hubungi sahabat".into(),
            ],
            reflection_questions: vec![
                "Apa yang membuatmu gelisah?".into(),
                "Apa yang masih bisa kamu syukuri?".into(),
            ],
        })
    }
}

fn orchestrator() -> MoodOrchestrator {
    MoodOrchestrator::new(Arc::new(ScriptedContent), Arc::new(InMemoryKvStore::new()))
}

#[tokio::test]
async fn selections_feed_history_and_stats() {
    let orch = orchestrator();
    for mood in [MoodType::Anxious, MoodType::Sad, MoodType::Anxious] {
        let outcome = orch.select_mood("hamba", mood).await.unwrap();
        assert!(matches!(outcome.session.state, PipelineState::Succeeded { .. }));
    }

    let history = orch.history("hamba").all().await.unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].mood, MoodType::Anxious);
    assert_eq!(history[1].mood, MoodType::Sad);

    let noted = orch
        .history("hamba")
        .attach_note(history[1].id, "Rindu rumah")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(noted.note.as_deref(), Some("Rindu rumah"));

    let stats = MoodStats::from_logs(&orch.history("hamba").all().await.unwrap(), Utc::now());
    assert_eq!(stats.total, 3);
    assert_eq!(stats.dominant, Some(MoodType::Anxious));
    assert_eq!(stats.recent.total, 3);
    assert_eq!(stats.recent.max_count, 2);
    assert_eq!(stats.recent.counts.len(), MoodType::ALL.len());
}

#[tokio::test]
async fn generated_content_can_be_pinned_once() {
    let orch = orchestrator();
    let outcome = orch.select_mood("hamba", MoodType::Restless).await.unwrap();
    let PipelineState::Succeeded { content, .. } = outcome.session.state else {
        panic!("expected generated content");
    };

    let favorites = orch.favorites("hamba");
    let verse = FavoriteItem::new(FavoriteContent::Quran(content.quran.clone()), content.mood.clone());
    let hadith = FavoriteItem::new(FavoriteContent::Hadith(content.hadith.clone()), content.mood.clone());

    assert!(favorites.save(&verse).await.unwrap());
    assert!(favorites.save(&hadith).await.unwrap());
    assert!(!favorites.save(&verse).await.unwrap());

    let all = favorites.all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].id, "quran-13-28");
    assert!(all[0].id.starts_with("hadith-"));

    let stored = serde_json::to_value(FavoriteRecord::from(&all[1])).unwrap();
    assert_eq!(stored["type"], "quran");
    assert_eq!(stored["moodContext"], "Gelisah");
}

#[tokio::test]
async fn clearing_history_keeps_favorites() {
    let orch = orchestrator();
    orch.select_mood("hamba", MoodType::Grateful).await.unwrap();
    let outcome = orch.refresh("hamba").await.unwrap();
    let PipelineState::Succeeded { content, .. } = outcome.session.state else {
        panic!("expected generated content");
    };
    orch.favorites("hamba")
        .save(&FavoriteItem::new(FavoriteContent::Quran(content.quran.clone()), "Bersyukur"))
        .await
        .unwrap();

    orch.history("hamba").clear().await.unwrap();
    assert!(orch.history("hamba").all().await.unwrap().is_empty());
    assert_eq!(orch.favorites("hamba").all().await.unwrap().len(), 1);
}
