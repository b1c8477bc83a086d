//! crates/qalbu_core/src/prompt.rs
//!
//! Builds the provider-neutral instruction for a content request. The adapter pairs
//! it with a JSON schema describing the same structure.

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::domain::{MoodType, MIN_PRACTICAL_STEPS, MIN_REFLECTION_QUESTIONS};

/// Upper bound (exclusive) for the numeric seed.
pub const SEED_LIMIT: u32 = 999_999;
pub const NONCE_LEN: usize = 8;

/// Injected into every request so repeated calls for one mood do not collapse
/// to the same answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomizationToken {
    pub seed: u32,
    pub nonce: String,
}

impl RandomizationToken {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let seed = rng.gen_range(0..SEED_LIMIT);
        let nonce = (&mut rng)
            .sample_iter(&Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();
        Self { seed, nonce }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPrompt {
    pub system_instruction: String,
    pub user_message: String,
    pub seed: u32,
}

const SYSTEM_TEMPLATE: &str = r#"Anda adalah seorang Ahli Tafsir Al-Quran dan Psikolog Spiritual Islami.
TUGAS: Berikan SATU set refleksi (Ayat, Hadist, Hikmah, Amalan) yang sangat mendalam untuk mood "{mood}".

ATURAN VARIASI:
- Jelajahi surah-surah yang relevan namun jarang dikutip (bukan hanya Al-Baqarah).
- Berikan respon dalam Bahasa Indonesia yang sangat menenangkan dan puitis.

FORMAT JAWABAN:
Jawab HANYA dengan satu dokumen JSON yang valid, tanpa teks lain, dengan field wajib:
- "mood": string
- "summary": string, satu kalimat ringkas
- "quran": objek { "surahName": string, "surahNumber": integer 1-114, "ayahNumber": integer >= 1, "arabicText": string, "translation": string, "reflection": string (opsional) }
- "hadith": objek { "source": string, "text": string, "reflection": string (opsional) }
- "wisdom": string
- "practicalSteps": array string, minimal {min_steps} item
- "reflectionQuestions": array string, minimal {min_questions} item"#;

const USER_TEMPLATE: &str =
    "Berikan refleksi spiritual untuk seseorang yang sedang merasa {mood}. (variasi #{seed}-{nonce})";

/// Builds the instruction pair for one content request.
pub fn build_content_prompt(mood: MoodType, token: &RandomizationToken) -> ContentPrompt {
    let system_instruction = SYSTEM_TEMPLATE
        .replace("{mood}", mood.label())
        .replace("{min_steps}", &MIN_PRACTICAL_STEPS.to_string())
        .replace("{min_questions}", &MIN_REFLECTION_QUESTIONS.to_string());

    let user_message = USER_TEMPLATE
        .replace("{mood}", mood.label())
        .replace("{seed}", &token.seed.to_string())
        .replace("{nonce}", &token.nonce);

    ContentPrompt {
        system_instruction,
        user_message,
        seed: token.seed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_mood_and_embeds_token() {
        let token = RandomizationToken {
            seed: 4242,
            nonce: "abcd1234".into(),
        };
        let prompt = build_content_prompt(MoodType::Sad, &token);

        assert!(prompt.system_instruction.contains("\"Sedih\""));
        assert!(prompt.user_message.contains("Sedih"));
        assert!(prompt.user_message.contains("4242-abcd1234"));
        assert_eq!(prompt.seed, 4242);
    }

    #[test]
    fn prompt_states_structural_contract() {
        let token = RandomizationToken::generate();
        let prompt = build_content_prompt(MoodType::Anxious, &token);
        for field in [
            "\"mood\"",
            "\"summary\"",
            "\"surahNumber\"",
            "\"ayahNumber\"",
            "\"hadith\"",
            "\"wisdom\"",
            "\"practicalSteps\"",
            "\"reflectionQuestions\"",
        ] {
            assert!(prompt.system_instruction.contains(field), "missing {}", field);
        }
        assert!(prompt.system_instruction.contains("minimal 3 item"));
        assert!(prompt.system_instruction.contains("minimal 2 item"));
        assert!(!prompt.system_instruction.contains("{mood}"));
        assert!(!prompt.system_instruction.contains("{min_steps}"));
    }

    #[test]
    fn tokens_stay_in_range_and_vary() {
        let tokens: Vec<_> = (0..16).map(|_| RandomizationToken::generate()).collect();
        for token in &tokens {
            assert!(token.seed < SEED_LIMIT);
            assert_eq!(token.nonce.len(), NONCE_LEN);
            assert!(token.nonce.chars().all(|c| c.is_ascii_alphanumeric()));
        }
        let first = &tokens[0].nonce;
        assert!(tokens.iter().any(|t| &t.nonce != first));
    }
}
