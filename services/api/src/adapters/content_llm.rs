//! services/api/src/adapters/content_llm.rs
//!
//! This module contains the adapter for the content-generating LLM.
//! It implements the `ContentGenerationService` port from the `core` crate.

use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use qalbu_core::{
    domain::{HealingContent, MoodType},
    ports::{ContentGenerationService, PortError, PortResult},
    prompt::{build_content_prompt, ContentPrompt, RandomizationToken},
};
use regex::Regex;
use serde_json::{json, Value};
use std::sync::LazyLock;
use tracing::{info, warn};

use super::{map_provider_error, ChatCompletionEnvelope};
use crate::records::HealingContentRecord;

const MISSING_KEY_MESSAGE: &str =
    "No API key is configured for the content provider. Set PROVIDER_API_KEY and restart the service.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ContentGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiContentAdapter {
    client: Option<Client<OpenAIConfig>>,
    model: String,
    temperature: f32,
}

impl OpenAiContentAdapter {
    /// Creates a new `OpenAiContentAdapter`. A `None` client means no credential
    /// is configured; every request then fails with a configuration error.
    pub fn new(client: Option<Client<OpenAIConfig>>, model: String, temperature: f32) -> Self {
        Self {
            client,
            model,
            temperature,
        }
    }

    fn build_request(&self, prompt: &ContentPrompt) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": prompt.system_instruction },
                { "role": "user", "content": prompt.user_message },
            ],
            "temperature": self.temperature,
            "seed": prompt.seed,
            "n": 1,
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "healing_content",
                    "strict": false,
                    "schema": healing_content_schema(),
                }
            }
        })
    }
}

/// The structural contract for a generated package.
pub fn healing_content_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "mood": { "type": "string" },
            "summary": { "type": "string" },
            "quran": {
                "type": "object",
                "properties": {
                    "surahName": { "type": "string" },
                    "surahNumber": { "type": "integer", "minimum": 1, "maximum": 114 },
                    "ayahNumber": { "type": "integer", "minimum": 1 },
                    "arabicText": { "type": "string" },
                    "translation": { "type": "string" },
                    "reflection": { "type": "string" }
                },
                "required": ["surahName", "surahNumber", "ayahNumber", "arabicText", "translation"]
            },
            "hadith": {
                "type": "object",
                "properties": {
                    "source": { "type": "string" },
                    "text": { "type": "string" },
                    "reflection": { "type": "string" }
                },
                "required": ["source", "text"]
            },
            "wisdom": { "type": "string" },
            "practicalSteps": { "type": "array", "items": { "type": "string" }, "minItems": 3 },
            "reflectionQuestions": { "type": "array", "items": { "type": "string" }, "minItems": 2 }
        },
        "required": [
            "mood", "summary", "quran", "hadith", "wisdom", "practicalSteps", "reflectionQuestions"
        ]
    })
}

static CODE_FENCE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*```(?:json|JSON)?\s*(.*?)\s*```\s*$"));

/// Parses and validates the raw message body returned by the provider.
pub fn parse_healing_content(raw: &str) -> PortResult<HealingContent> {
    let body = strip_code_fence(raw)?;
    if body.is_empty() {
        return Err(PortError::ContentGeneration(
            "The provider returned an empty response.".to_string(),
        ));
    }

    let record: HealingContentRecord = serde_json::from_str(&body).map_err(|e| {
        PortError::ContentGeneration(format!("The provider response is not valid content JSON: {}", e))
    })?;

    record.into_domain().map_err(|e| {
        PortError::ContentGeneration(format!("The provider response is incomplete: {}", e))
    })
}

/// Removes a surrounding Markdown code fence, which some models add despite the schema.
fn strip_code_fence(raw: &str) -> PortResult<String> {
    let fence = CODE_FENCE
        .as_ref()
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
    let stripped = match fence.captures(raw).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => raw,
    };
    Ok(stripped.trim().to_string())
}

//=========================================================================================
// `ContentGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ContentGenerationService for OpenAiContentAdapter {
    /// Generates a fresh package for the mood. Nothing is cached; every call is a
    /// new generation with a new randomization token.
    async fn generate_healing_content(&self, mood: MoodType) -> PortResult<HealingContent> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| PortError::Configuration(MISSING_KEY_MESSAGE.to_string()))?;

        let token = RandomizationToken::generate();
        let prompt = build_content_prompt(mood, &token);
        let request = self.build_request(&prompt);
        info!(mood = %mood, seed = token.seed, nonce = %token.nonce, "Requesting healing content.");

        let response: ChatCompletionEnvelope = client
            .chat()
            .create_byot(request)
            .await
            .map_err(|e| map_provider_error(e, PortError::ContentGeneration))?;

        let content = response
            .into_first_message()
            .and_then(|message| message.content)
            .ok_or_else(|| {
                PortError::ContentGeneration(
                    "The provider returned no text. Check the API quota or model status."
                        .to_string(),
                )
            })?;

        parse_healing_content(&content).inspect_err(|e| {
            warn!(mood = %mood, error = %e, "Discarding unusable provider response.");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_json() -> Value {
        json!({
            "mood": "Sedih",
            "summary": "Kesedihanmu dilihat oleh-Nya.",
            "quran": {
                "surahName": "Ad-Duha",
                "surahNumber": 93,
                "ayahNumber": 3,
                "arabicText": "مَا وَدَّعَكَ رَبُّكَ وَمَا قَلَىٰ",
                "translation": "Tuhanmu tidak meninggalkanmu dan tidak membencimu.",
                "reflection": "Allah tidak pernah pergi."
            },
            "hadith": { "source": "HR. Bukhari", "text": "Tidaklah seorang muslim ditimpa kesedihan..." },
            "wisdom": "Air mata adalah doa yang tak terucap.",
            "practicalSteps": ["Ambil wudhu", "Shalat dua rakaat", "Tulis tiga hal yang kamu syukuri"],
            "reflectionQuestions": ["Apa yang sedang kamu tangisi?", "Kepada siapa kamu bisa bercerita?"]
        })
    }

    #[test]
    fn parses_valid_response() {
        let content = parse_healing_content(&valid_json().to_string()).unwrap();
        assert_eq!(content.mood, "Sedih");
        assert_eq!(content.quran.surah_number, 93);
        assert!(content.practical_steps.len() >= 3);
        assert!(content.reflection_questions.len() >= 2);
        assert!(content.hadith.reflection.is_none());
    }

    #[test]
    fn parses_response_wrapped_in_code_fence() {
        let fenced = format!("```json\n{}\n```", valid_json());
        assert!(parse_healing_content(&fenced).is_ok());
    }

    #[test]
    fn empty_response_is_a_content_error() {
        assert!(matches!(
            parse_healing_content("   "),
            Err(PortError::ContentGeneration(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_content_error() {
        assert!(matches!(
            parse_healing_content("{\"mood\": \"Sedih\""),
            Err(PortError::ContentGeneration(_))
        ));
    }

    #[test]
    fn missing_required_field_is_a_content_error() {
        let mut value = valid_json();
        value.as_object_mut().unwrap().remove("hadith");
        assert!(matches!(
            parse_healing_content(&value.to_string()),
            Err(PortError::ContentGeneration(_))
        ));
    }

    #[test]
    fn out_of_range_surah_is_a_content_error() {
        let mut value = valid_json();
        value["quran"]["surahNumber"] = json!(200);
        assert!(matches!(
            parse_healing_content(&value.to_string()),
            Err(PortError::ContentGeneration(msg)) if msg.contains("surah")
        ));
    }

    #[test]
    fn request_carries_schema_seed_and_model() {
        let adapter = OpenAiContentAdapter::new(None, "gpt-4o-mini".into(), 0.9);
        let token = RandomizationToken {
            seed: 77,
            nonce: "n0nce123".into(),
        };
        let request = adapter.build_request(&build_content_prompt(MoodType::Sad, &token));

        assert_eq!(request["model"], "gpt-4o-mini");
        assert_eq!(request["seed"], 77);
        assert_eq!(request["response_format"]["type"], "json_schema");
        let required = request["response_format"]["json_schema"]["schema"]["required"]
            .as_array()
            .unwrap();
        assert_eq!(required.len(), 7);
        assert!(request["messages"][1]["content"]
            .as_str()
            .unwrap()
            .contains("77-n0nce123"));
    }

    #[test]
    fn schema_requires_minimum_list_lengths() {
        let schema = healing_content_schema();
        assert_eq!(schema["properties"]["practicalSteps"]["minItems"], 3);
        assert_eq!(schema["properties"]["reflectionQuestions"]["minItems"], 2);
    }

    #[tokio::test]
    async fn missing_credential_is_a_configuration_error() {
        let adapter = OpenAiContentAdapter::new(None, "gpt-4o-mini".into(), 0.9);
        let err = adapter
            .generate_healing_content(MoodType::Sad)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Configuration(ref msg) if msg.contains("PROVIDER_API_KEY")));
        assert!(!err.is_retryable());
    }
}
