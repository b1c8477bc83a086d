//! services/api/src/adapters/speech.rs
//!
//! This module contains the adapter for spoken renditions of generated content.
//! It implements the `SpeechGenerationService` port from the `core` crate.

use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use hound::{WavSpec, WavWriter};
use qalbu_core::{
    domain::{SpeechAudio, SPEECH_SAMPLE_RATE},
    ports::{PortError, PortResult, SpeechGenerationService},
};
use serde_json::{json, Value};
use tracing::info;

use super::{map_provider_error, ChatCompletionEnvelope};

const READING_INSTRUCTION: &str =
    "Bacakan teks berikut dengan tenang dan penuh hikmah, tanpa menambah atau mengubah kata.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `SpeechGenerationService` port with an
/// audio-capable chat model returning 16-bit PCM.
#[derive(Clone)]
pub struct OpenAiSpeechAdapter {
    client: Option<Client<OpenAIConfig>>,
    model: String,
    voice: String,
}

impl OpenAiSpeechAdapter {
    /// Creates a new `OpenAiSpeechAdapter`.
    pub fn new(client: Option<Client<OpenAIConfig>>, model: String, voice: String) -> Self {
        Self {
            client,
            model,
            voice,
        }
    }

    fn build_request(&self, text: &str) -> Value {
        json!({
            "model": self.model,
            "modalities": ["text", "audio"],
            "audio": { "voice": self.voice, "format": "pcm16" },
            "messages": [
                { "role": "system", "content": READING_INSTRUCTION },
                { "role": "user", "content": text },
            ]
        })
    }
}

/// Decodes the base64 payload into raw little-endian PCM bytes.
pub fn decode_pcm(audio: &SpeechAudio) -> PortResult<Vec<u8>> {
    STANDARD
        .decode(audio.pcm_base64.as_bytes())
        .map_err(|e| PortError::SpeechGeneration(format!("Audio payload is not valid base64: {}", e)))
}

/// Wraps 16-bit little-endian PCM in a WAV container.
pub fn pcm16_to_wav(pcm_data: &[u8], sample_rate: u32, channels: u16) -> Result<Vec<u8>, hound::Error> {
    let mut cursor = std::io::Cursor::new(Vec::new());

    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::new(&mut cursor, spec)?;

    // Convert byte array to i16 samples
    for chunk in pcm_data.chunks_exact(2) {
        let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
        writer.write_sample(sample)?;
    }

    writer.finalize()?;
    Ok(cursor.into_inner())
}

//=========================================================================================
// `SpeechGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl SpeechGenerationService for OpenAiSpeechAdapter {
    async fn generate_speech(&self, text: &str) -> PortResult<SpeechAudio> {
        if text.trim().is_empty() {
            return Err(PortError::InvalidInput(
                "Text to read aloud must not be empty.".to_string(),
            ));
        }
        let client = self.client.as_ref().ok_or_else(|| {
            PortError::Configuration(
                "Speech is unavailable without an API key. Set PROVIDER_API_KEY and restart the service."
                    .to_string(),
            )
        })?;

        info!(chars = text.chars().count(), voice = %self.voice, "Requesting speech.");
        let response: ChatCompletionEnvelope = client
            .chat()
            .create_byot(self.build_request(text))
            .await
            .map_err(|e| map_provider_error(e, PortError::SpeechGeneration))?;

        let pcm_base64 = response
            .into_first_message()
            .and_then(|message| message.audio)
            .map(|audio| audio.data)
            .filter(|data| !data.trim().is_empty())
            .ok_or_else(|| {
                PortError::SpeechGeneration("The provider returned no audio data.".to_string())
            })?;

        let audio = SpeechAudio {
            pcm_base64,
            sample_rate: SPEECH_SAMPLE_RATE,
            channels: 1,
        };
        // Reject payloads the caller could never play.
        decode_pcm(&audio)?;
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blank_text_is_rejected_before_credentials() {
        let adapter = OpenAiSpeechAdapter::new(None, "gpt-4o-audio-preview".into(), "alloy".into());
        assert!(matches!(
            adapter.generate_speech("  ").await,
            Err(PortError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn missing_credential_is_a_configuration_error() {
        let adapter = OpenAiSpeechAdapter::new(None, "gpt-4o-audio-preview".into(), "alloy".into());
        assert!(matches!(
            adapter.generate_speech("Bismillah").await,
            Err(PortError::Configuration(_))
        ));
    }

    #[test]
    fn request_asks_for_pcm16_audio() {
        let adapter = OpenAiSpeechAdapter::new(None, "gpt-4o-audio-preview".into(), "sage".into());
        let request = adapter.build_request("Hasbunallah");
        assert_eq!(request["audio"]["format"], "pcm16");
        assert_eq!(request["audio"]["voice"], "sage");
        assert_eq!(request["messages"][1]["content"], "Hasbunallah");
    }

    #[test]
    fn decode_rejects_invalid_base64() {
        let audio = SpeechAudio {
            pcm_base64: "***".into(),
            sample_rate: SPEECH_SAMPLE_RATE,
            channels: 1,
        };
        assert!(matches!(decode_pcm(&audio), Err(PortError::SpeechGeneration(_))));
    }

    #[test]
    fn wav_header_describes_24khz_mono() {
        let samples: Vec<u8> = [0i16, 1000, -1000, i16::MAX]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        let audio = SpeechAudio {
            pcm_base64: STANDARD.encode(&samples),
            sample_rate: SPEECH_SAMPLE_RATE,
            channels: 1,
        };
        let pcm = decode_pcm(&audio).unwrap();
        let wav = pcm16_to_wav(&pcm, audio.sample_rate, audio.channels).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        let reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().sample_rate, 24_000);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len(), 4);
    }
}
