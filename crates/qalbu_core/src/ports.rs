//! crates/qalbu_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{HealingContent, MoodType, SpeechAudio, UserCredentials, UserProfile};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error type shared by every port.
///
/// The variants follow what a user can do about the failure: configuration errors
/// need a new credential, generation and provider errors can be retried.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// A credential is missing or was rejected by the provider.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The provider answered, but the content was empty, malformed or invalid.
    #[error("Content generation failed: {0}")]
    ContentGeneration(String),
    #[error("Speech generation failed: {0}")]
    SpeechGeneration(String),
    /// The request never produced a usable answer (network, HTTP status, quota).
    #[error("Provider error: {0}")]
    Provider(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    /// Whether pressing "try again" can help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PortError::ContentGeneration(_)
                | PortError::SpeechGeneration(_)
                | PortError::Provider(_)
                | PortError::Storage(_)
                | PortError::Unexpected(_)
        )
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait ContentGenerationService: Send + Sync {
    /// Generates a fresh, validated devotional package for the mood.
    async fn generate_healing_content(&self, mood: MoodType) -> PortResult<HealingContent>;
}

#[async_trait]
pub trait SpeechGenerationService: Send + Sync {
    /// Renders text to base64 PCM audio.
    async fn generate_speech(&self, text: &str) -> PortResult<SpeechAudio>;
}

/// A durable string-to-string location, the backing medium of the stores.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> PortResult<()>;

    async fn remove(&self, key: &str) -> PortResult<()>;
}

#[async_trait]
pub trait AccountService: Send + Sync {
    /// Registers a new account. New profiles start out `pending`.
    async fn create_account(
        &self,
        email: &str,
        hashed_password: &str,
        display_name: &str,
    ) -> PortResult<UserProfile>;

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_profile(&self, user_id: Uuid) -> PortResult<UserProfile>;

    // --- Auth Sessions ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_not_retryable() {
        assert!(!PortError::Configuration("no key".into()).is_retryable());
        assert!(!PortError::InvalidInput("empty".into()).is_retryable());
        assert!(PortError::ContentGeneration("bad json".into()).is_retryable());
        assert!(PortError::Provider("timeout".into()).is_retryable());
    }
}
