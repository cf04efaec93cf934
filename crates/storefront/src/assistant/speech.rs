//! `OpenAI` audio client: speech-to-text and text-to-speech.

use axum::body::Bytes;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::SpeechConfig;

use super::error::{AssistantError, error_from_response};

const OPENAI_TRANSCRIPTIONS_URL: &str = "https://api.openai.com/v1/audio/transcriptions";
const OPENAI_SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";
const TRANSCRIPTION_MODEL: &str = "whisper-1";
const SPEECH_MODEL: &str = "tts-1";

/// Longest text the speech endpoint accepts, in characters.
pub const MAX_SPEECH_CHARS: usize = 4096;

/// Client for the `OpenAI` audio endpoints.
#[derive(Clone)]
pub struct SpeechClient {
    client: reqwest::Client,
    voice: String,
}

impl SpeechClient {
    /// Create a new speech client.
    ///
    /// # Errors
    ///
    /// Returns `AssistantError::Setup` if the API key isn't a valid header
    /// value or the HTTP client can't be built.
    pub fn new(config: &SpeechConfig) -> Result<Self, AssistantError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.api_key.expose_secret()))
                .map_err(|_| AssistantError::Setup("invalid OpenAI API key".to_string()))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| AssistantError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            voice: config.voice.clone(),
        })
    }

    /// Transcribe a recorded clip.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns an invalid response.
    #[instrument(skip(self, audio), fields(audio_len = audio.len()))]
    pub async fn transcribe(
        &self,
        audio: Vec<u8>,
        file_name: String,
        content_type: &str,
    ) -> Result<String, AssistantError> {
        let part = Part::bytes(audio)
            .file_name(file_name)
            .mime_str(content_type)
            .map_err(|_| AssistantError::InvalidInput(format!("unsupported audio type {content_type}")))?;
        let form = Form::new()
            .text("model", TRANSCRIPTION_MODEL)
            .part("file", part);

        let response = self
            .client
            .post(OPENAI_TRANSCRIPTIONS_URL)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let transcription: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::Parse(format!("Failed to parse transcription: {e}")))?;

        Ok(transcription.text)
    }

    /// Synthesize speech as MP3.
    ///
    /// # Errors
    ///
    /// Returns `AssistantError::InvalidInput` for empty or overlong text, or
    /// an error if the API request fails.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn speak(&self, text: &str) -> Result<Bytes, AssistantError> {
        let text = validate_speech_text(text)?;
        let request = SpeechRequest {
            model: SPEECH_MODEL,
            input: text,
            voice: &self.voice,
            response_format: "mp3",
        };

        let response = self
            .client
            .post(OPENAI_SPEECH_URL)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(response.bytes().await?)
    }
}

/// Trimmed text, if it can be spoken.
///
/// # Errors
///
/// Returns `AssistantError::InvalidInput` for empty or overlong text.
pub fn validate_speech_text(text: &str) -> Result<&str, AssistantError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AssistantError::InvalidInput("text is required".to_string()));
    }
    if text.chars().count() > MAX_SPEECH_CHARS {
        return Err(AssistantError::InvalidInput(format!(
            "text must be at most {MAX_SPEECH_CHARS} characters"
        )));
    }
    Ok(text)
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speech_text_limits() {
        assert_eq!(validate_speech_text("  namaste  ").expect("valid"), "namaste");
        assert!(validate_speech_text("   ").is_err());
        assert!(validate_speech_text(&"a".repeat(MAX_SPEECH_CHARS)).is_ok());
        assert!(validate_speech_text(&"a".repeat(MAX_SPEECH_CHARS + 1)).is_err());
    }

    #[test]
    fn test_transcription_response_parsing() {
        let response: TranscriptionResponse =
            serde_json::from_str(r#"{"text": "show me gold bangles"}"#).expect("deserialize");
        assert_eq!(response.text, "show me gold bangles");
    }
}
