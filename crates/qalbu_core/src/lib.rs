pub mod domain;
pub mod ports;
pub mod prompt;
pub mod stats;

pub use domain::{
    FavoriteContent, FavoriteItem, FavoriteKind, HadithContent, HealingContent, InvalidContent,
    MoodLog, MoodType, QuranContent, SpeechAudio, UnknownMood, UserCredentials, UserProfile,
    UserStatus,
};
pub use ports::{
    AccountService, ContentGenerationService, KeyValueStore, PortError, PortResult,
    SpeechGenerationService,
};
pub use prompt::{build_content_prompt, ContentPrompt, RandomizationToken};
pub use stats::{MoodStats, RecentMoodWindow};
