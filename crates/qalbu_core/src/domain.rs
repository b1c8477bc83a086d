//! crates/qalbu_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Moods
//=========================================================================================

/// The closed set of emotional states a user can pick from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MoodType {
    Happy,
    Grateful,
    Optimistic,
    Confused,
    Anxious,
    Restless,
    Galau,
    Tired,
    Angry,
    Disappointed,
    Lonely,
    Sad,
}

/// Returned when a string does not name any known mood.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown mood: '{0}'")]
pub struct UnknownMood(pub String);

impl MoodType {
    /// Every mood, in the order the selector presents them.
    pub const ALL: [MoodType; 12] = [
        MoodType::Happy,
        MoodType::Grateful,
        MoodType::Optimistic,
        MoodType::Confused,
        MoodType::Anxious,
        MoodType::Restless,
        MoodType::Galau,
        MoodType::Tired,
        MoodType::Angry,
        MoodType::Disappointed,
        MoodType::Lonely,
        MoodType::Sad,
    ];

    /// The display label. This is also the value persisted in mood logs.
    pub fn label(self) -> &'static str {
        match self {
            MoodType::Happy => "Bahagia",
            MoodType::Grateful => "Bersyukur",
            MoodType::Optimistic => "Optimis",
            MoodType::Confused => "Bingung",
            MoodType::Anxious => "Cemas",
            MoodType::Restless => "Gelisah",
            MoodType::Galau => "Galau",
            MoodType::Tired => "Capek",
            MoodType::Angry => "Marah",
            MoodType::Disappointed => "Kecewa",
            MoodType::Lonely => "Kesepian",
            MoodType::Sad => "Sedih",
        }
    }

    /// A stable ASCII key, handy in URLs.
    pub fn key(self) -> &'static str {
        match self {
            MoodType::Happy => "happy",
            MoodType::Grateful => "grateful",
            MoodType::Optimistic => "optimistic",
            MoodType::Confused => "confused",
            MoodType::Anxious => "anxious",
            MoodType::Restless => "restless",
            MoodType::Galau => "galau",
            MoodType::Tired => "tired",
            MoodType::Angry => "angry",
            MoodType::Disappointed => "disappointed",
            MoodType::Lonely => "lonely",
            MoodType::Sad => "sad",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            MoodType::Happy => "Bersukacita",
            MoodType::Grateful => "Berterima kasih",
            MoodType::Optimistic => "Penuh Harapan",
            MoodType::Confused => "Mencari Petunjuk",
            MoodType::Anxious => "Gelisah",
            MoodType::Restless => "Hati Tidak Tenang",
            MoodType::Galau => "Hati Bimbang",
            MoodType::Tired => "Lelah Lahir Batin",
            MoodType::Angry => "Emosi memuncak",
            MoodType::Disappointed => "Kecewa",
            MoodType::Lonely => "Sendiri",
            MoodType::Sad => "Berduka",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            MoodType::Happy => "✨",
            MoodType::Grateful => "🤲",
            MoodType::Optimistic => "🚀",
            MoodType::Confused => "🤔",
            MoodType::Anxious => "😰",
            MoodType::Restless => "🌪️",
            MoodType::Galau => "🥀",
            MoodType::Tired => "😮‍💨",
            MoodType::Angry => "😤",
            MoodType::Disappointed => "😞",
            MoodType::Lonely => "🍂",
            MoodType::Sad => "😢",
        }
    }

    /// Short messages shown while content for this mood is being generated.
    pub fn loading_messages(self) -> &'static [&'static str] {
        match self {
            MoodType::Happy => &[
                "Mensyukuri setiap detik kebahagiaan...",
                "Kebahagiaan adalah titipan, mari jaga dengan syukur...",
                "Menyiapkan ayat untuk hati yang berbunga...",
            ],
            MoodType::Grateful => &[
                "Jika kamu bersyukur, niscaya Allah tambahkan nikmat-Nya...",
                "Menghitung nikmat yang tak terhitung...",
                "Syukur adalah kunci pembuka pintu rezeki...",
            ],
            MoodType::Optimistic => &[
                "Berbaik sangka kepada Allah...",
                "Harapan adalah cahaya di ujung jalan...",
                "Allah sesuai prasangka hamba-Nya...",
            ],
            MoodType::Confused => &[
                "Memohon petunjuk jalan yang lurus...",
                "Istikharah adalah kompas hati...",
                "Menjernihkan pikiran dengan kalam-Nya...",
            ],
            MoodType::Anxious => &[
                "Hanya dengan mengingat Allah hati menjadi tenang...",
                "Menarik napas panjang, menyerahkan segala urusan...",
                "Cukuplah Allah sebagai penolong kita...",
            ],
            MoodType::Restless => &[
                "Menenangkan ombak di dalam dada...",
                "Mencari ketenangan dalam sujud...",
                "Dzikir adalah penawar kegelisahan...",
            ],
            MoodType::Galau => &[
                "Mungkin ini cara Allah memintamu mendekat...",
                "Hati yang bimbang akan tenang dengan dzikir...",
                "Menata kembali kepingan rasa...",
            ],
            MoodType::Tired => &[
                "Istirahatkan jiwamu sejenak pada-Nya...",
                "Lelahmu akan menjadi lillah...",
                "Rebahkan lelahmu di atas sajadah...",
            ],
            MoodType::Angry => &[
                "Meredam api dengan air wudhu...",
                "Orang kuat adalah yang mampu menahan amarahnya...",
                "Ganti amarahmu dengan istighfar...",
            ],
            MoodType::Disappointed => &[
                "Mengobati hati yang sedang patah...",
                "Manusia berencana, Allah sebaik-baik perencana...",
                "Allah mengganti yang hilang dengan yang lebih baik...",
            ],
            MoodType::Lonely => &[
                "Allah lebih dekat dari urat lehermu...",
                "Engkau tidak pernah benar-benar sendirian...",
                "Allah adalah sebaik-baik teman curhat...",
            ],
            MoodType::Sad => &[
                "Setiap air mata didengar oleh-Nya...",
                "Setelah kesulitan pasti ada kemudahan...",
                "La Tahzan, Innallaha Ma'ana...",
            ],
        }
    }
}

impl fmt::Display for MoodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MoodType {
    type Err = UnknownMood;

    /// Accepts either the display label ("Sedih") or the key ("sad"), ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        MoodType::ALL
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(needle) || m.key().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownMood(s.to_string()))
    }
}

//=========================================================================================
// Generated Content
//=========================================================================================

/// A single Quran verse with its translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuranContent {
    pub surah_name: String,
    pub surah_number: u32,
    pub ayah_number: u32,
    pub arabic_text: String,
    pub translation: String,
    pub reflection: Option<String>,
}

impl QuranContent {
    /// Stable identity used for favoriting; a pure function of surah and ayah.
    pub fn favorite_id(&self) -> String {
        quran_favorite_id(self.surah_number, self.ayah_number)
    }
}

pub fn quran_favorite_id(surah_number: u32, ayah_number: u32) -> String {
    format!("quran-{}-{}", surah_number, ayah_number)
}

/// A hadith with its source citation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HadithContent {
    pub source: String,
    pub text: String,
    pub reflection: Option<String>,
}

impl HadithContent {
    /// Stable identity used for favoriting, hashed from the body text.
    pub fn favorite_id(&self) -> String {
        hadith_favorite_id(&self.text)
    }
}

/// Rolling 32-bit hash (`h * 31 + unit`) over the UTF-16 code units of the text.
/// Not cryptographic; collisions are possible.
pub fn hadith_favorite_id(text: &str) -> String {
    let hash = text.encode_utf16().fold(0i32, |hash, unit| {
        (hash << 5).wrapping_sub(hash).wrapping_add(i32::from(unit))
    });
    format!("hadith-{}", i64::from(hash).abs())
}

/// The full devotional package generated for one mood request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealingContent {
    pub mood: String,
    pub summary: String,
    pub quran: QuranContent,
    pub hadith: HadithContent,
    pub wisdom: String,
    pub practical_steps: Vec<String>,
    pub reflection_questions: Vec<String>,
}

pub const MIN_PRACTICAL_STEPS: usize = 3;
pub const MIN_REFLECTION_QUESTIONS: usize = 2;
pub const SURAH_COUNT: u32 = 114;

/// Reasons a generated package is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidContent {
    #[error("required field '{0}' is empty")]
    EmptyField(&'static str),
    #[error("surah number {0} is outside 1..=114")]
    SurahOutOfRange(u32),
    #[error("ayah number must be at least 1")]
    AyahOutOfRange,
    #[error("expected at least {min} {field}, got {actual}")]
    TooFew {
        field: &'static str,
        min: usize,
        actual: usize,
    },
}

impl HealingContent {
    /// Checks every structural invariant of a generated package.
    pub fn validate(&self) -> Result<(), InvalidContent> {
        let required = [
            ("mood", &self.mood),
            ("summary", &self.summary),
            ("wisdom", &self.wisdom),
            ("quran.surahName", &self.quran.surah_name),
            ("quran.arabicText", &self.quran.arabic_text),
            ("quran.translation", &self.quran.translation),
            ("hadith.source", &self.hadith.source),
            ("hadith.text", &self.hadith.text),
        ];
        if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(InvalidContent::EmptyField(*name));
        }

        if !(1..=SURAH_COUNT).contains(&self.quran.surah_number) {
            return Err(InvalidContent::SurahOutOfRange(self.quran.surah_number));
        }
        if self.quran.ayah_number == 0 {
            return Err(InvalidContent::AyahOutOfRange);
        }

        check_list("practicalSteps", &self.practical_steps, MIN_PRACTICAL_STEPS)?;
        check_list(
            "reflectionQuestions",
            &self.reflection_questions,
            MIN_REFLECTION_QUESTIONS,
        )?;
        Ok(())
    }
}

fn check_list(field: &'static str, items: &[String], min: usize) -> Result<(), InvalidContent> {
    if items.len() < min {
        return Err(InvalidContent::TooFew {
            field,
            min,
            actual: items.len(),
        });
    }
    if items.iter().any(|item| item.trim().is_empty()) {
        return Err(InvalidContent::EmptyField(field));
    }
    Ok(())
}

/// A rendered speech payload: base64-encoded 16-bit little-endian PCM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechAudio {
    pub pcm_base64: String,
    pub sample_rate: u32,
    pub channels: u16,
}

pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

//=========================================================================================
// Journaling and Favorites
//=========================================================================================

/// A timestamped record of a mood selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodLog {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub mood: MoodType,
    pub note: Option<String>,
}

impl MoodLog {
    pub fn new(mood: MoodType) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            mood,
            note: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteKind {
    Quran,
    Hadith,
}

impl FavoriteKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FavoriteKind::Quran => "quran",
            FavoriteKind::Hadith => "hadith",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoriteContent {
    Quran(QuranContent),
    Hadith(HadithContent),
}

/// A user-pinned verse or hadith.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteItem {
    pub id: String,
    pub content: FavoriteContent,
    pub saved_at: DateTime<Utc>,
    pub mood_context: String,
}

impl FavoriteItem {
    /// Builds a favorite whose id is derived from the content.
    pub fn new(content: FavoriteContent, mood_context: impl Into<String>) -> Self {
        let id = match &content {
            FavoriteContent::Quran(q) => q.favorite_id(),
            FavoriteContent::Hadith(h) => h.favorite_id(),
        };
        Self {
            id,
            content,
            saved_at: Utc::now(),
            mood_context: mood_context.into(),
        }
    }

    pub fn kind(&self) -> FavoriteKind {
        match self.content {
            FavoriteContent::Quran(_) => FavoriteKind::Quran,
            FavoriteContent::Hadith(_) => FavoriteKind::Hadith,
        }
    }
}

//=========================================================================================
// Accounts
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStatus {
    Pending,
    Approved,
    Blocked,
}

impl UserStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UserStatus::Pending => "pending",
            UserStatus::Approved => "approved",
            UserStatus::Blocked => "blocked",
        }
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(UserStatus::Pending),
            "approved" => Ok(UserStatus::Approved),
            "blocked" => Ok(UserStatus::Blocked),
            other => Err(format!("unknown user status '{}'", other)),
        }
    }
}

/// A user's profile document, owned by the account service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub uid: Uuid,
    pub email: String,
    pub display_name: String,
    pub photo_url: String,
    pub status: UserStatus,
    pub requested_at: DateTime<Utc>,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_content() -> HealingContent {
        HealingContent {
            mood: "Sedih".into(),
            summary: "Allah dekat dengan hati yang patah.".into(),
            quran: QuranContent {
                surah_name: "Al-Baqarah".into(),
                surah_number: 2,
                ayah_number: 286,
                arabic_text: "لَا يُكَلِّفُ اللَّهُ نَفْسًا إِلَّا وُسْعَهَا".into(),
                translation: "Allah tidak membebani seseorang melainkan sesuai kesanggupannya.".into(),
                reflection: None,
            },
            hadith: HadithContent {
                source: "HR. Bukhari".into(),
                text: "Tidaklah seorang muslim tertimpa kelelahan...".into(),
                reflection: Some("Setiap lelah bernilai.".into()),
            },
            wisdom: "Kesedihan bukan tanda lemahnya iman.".into(),
            practical_steps: vec!["Wudhu".into(), "Shalat dua rakaat".into(), "Dzikir".into()],
            reflection_questions: vec!["Apa yang kamu syukuri?".into(), "Siapa yang bisa kamu hubungi?".into()],
        }
    }

    #[test]
    fn mood_parses_from_label_or_key() {
        assert_eq!("Sedih".parse::<MoodType>(), Ok(MoodType::Sad));
        assert_eq!("sad".parse::<MoodType>(), Ok(MoodType::Sad));
        assert_eq!("  BAHAGIA ".parse::<MoodType>(), Ok(MoodType::Happy));
        assert!("ecstatic".parse::<MoodType>().is_err());
    }

    #[test]
    fn every_mood_round_trips_through_its_label() {
        for mood in MoodType::ALL {
            assert_eq!(mood.label().parse::<MoodType>(), Ok(mood));
            assert!(!mood.loading_messages().is_empty());
        }
    }

    #[test]
    fn quran_identity_depends_only_on_surah_and_ayah() {
        assert_eq!(quran_favorite_id(2, 286), "quran-2-286");
        assert_eq!(quran_favorite_id(2, 286), quran_favorite_id(2, 286));
        assert_ne!(quran_favorite_id(2, 286), quran_favorite_id(28, 6));
        assert_eq!(sample_content().quran.favorite_id(), "quran-2-286");
    }

    #[test]
    fn hadith_identity_matches_rolling_hash() {
        assert_eq!(hadith_favorite_id(""), "hadith-0");
        assert_eq!(hadith_favorite_id("a"), "hadith-97");
        assert_eq!(hadith_favorite_id("ab"), "hadith-3105");
        let text = "Sesungguhnya amal itu tergantung niatnya";
        assert_eq!(hadith_favorite_id(text), hadith_favorite_id(text));
    }

    #[test]
    fn hadith_identity_wraps_and_stays_non_negative() {
        let long = "x".repeat(500);
        let id = hadith_favorite_id(&long);
        let digits = id.strip_prefix("hadith-").unwrap();
        assert!(digits.parse::<u64>().is_ok());
    }

    #[test]
    fn valid_content_passes_validation() {
        assert_eq!(sample_content().validate(), Ok(()));
    }

    #[test]
    fn validation_rejects_out_of_range_surah() {
        let mut content = sample_content();
        content.quran.surah_number = 115;
        assert_eq!(content.validate(), Err(InvalidContent::SurahOutOfRange(115)));
        content.quran.surah_number = 0;
        assert_eq!(content.validate(), Err(InvalidContent::SurahOutOfRange(0)));
    }

    #[test]
    fn validation_rejects_short_lists() {
        let mut content = sample_content();
        content.practical_steps.pop();
        assert!(matches!(
            content.validate(),
            Err(InvalidContent::TooFew { field: "practicalSteps", min: 3, actual: 2 })
        ));

        let mut content = sample_content();
        content.reflection_questions = vec!["Satu?".into()];
        assert!(matches!(
            content.validate(),
            Err(InvalidContent::TooFew { field: "reflectionQuestions", .. })
        ));
    }

    #[test]
    fn validation_rejects_blank_fields() {
        let mut content = sample_content();
        content.summary = "   ".into();
        assert_eq!(content.validate(), Err(InvalidContent::EmptyField("summary")));
    }

    #[test]
    fn favorite_item_derives_id_from_content() {
        let content = sample_content();
        let quran = FavoriteItem::new(FavoriteContent::Quran(content.quran.clone()), "Sedih");
        let hadith = FavoriteItem::new(FavoriteContent::Hadith(content.hadith.clone()), "Sedih");
        assert_eq!(quran.id, "quran-2-286");
        assert_eq!(quran.kind(), FavoriteKind::Quran);
        assert_eq!(hadith.id, content.hadith.favorite_id());
        assert_eq!(hadith.kind().as_str(), "hadith");
    }
}
