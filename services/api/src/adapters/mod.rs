pub mod content_llm;
pub mod db;
pub mod memory;
pub mod speech;

pub use content_llm::OpenAiContentAdapter;
pub use db::DbAdapter;
pub use memory::InMemoryKvStore;
pub use speech::OpenAiSpeechAdapter;

use async_openai::{config::OpenAIConfig, error::OpenAIError, Client};
use qalbu_core::ports::PortError;
use serde::Deserialize;

/// Builds the provider client, or `None` when no API key is configured.
pub fn provider_client(api_key: Option<&str>, api_base: &str) -> Option<Client<OpenAIConfig>> {
    api_key.map(|key| {
        Client::with_config(
            OpenAIConfig::new()
                .with_api_key(key)
                .with_api_base(api_base),
        )
    })
}

/// Maps a client error onto the port taxonomy. `malformed` builds the error used
/// when the provider answered with a body that could not be decoded.
pub(crate) fn map_provider_error(e: OpenAIError, malformed: fn(String) -> PortError) -> PortError {
    match e {
        OpenAIError::ApiError(api) => {
            let lowered = api.message.to_lowercase();
            if api.code.as_deref() == Some("invalid_api_key")
                || lowered.contains("api key not valid")
                || lowered.contains("incorrect api key")
                || lowered.contains("invalid api key")
            {
                PortError::Configuration(
                    "The provider rejected the configured API key. Check PROVIDER_API_KEY."
                        .to_string(),
                )
            } else {
                PortError::Provider(api.message)
            }
        }
        err @ OpenAIError::JSONDeserialize(..) => malformed(err.to_string()),
        other => PortError::Provider(other.to_string()),
    }
}

//=========================================================================================
// Chat Completion Response Envelope
//=========================================================================================
// Only the fields both adapters read. Requests are sent through the client's
// bring-your-own-types methods, so the provider may add fields freely.

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChatCompletionEnvelope {
    #[serde(default)]
    pub choices: Vec<ChoiceEnvelope>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChoiceEnvelope {
    #[serde(default)]
    pub message: MessageEnvelope,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MessageEnvelope {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub audio: Option<AudioEnvelope>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AudioEnvelope {
    #[serde(default)]
    pub data: String,
}

impl ChatCompletionEnvelope {
    pub fn into_first_message(self) -> Option<MessageEnvelope> {
        self.choices.into_iter().next().map(|choice| choice.message)
    }
}
