//! Shopping assistant backed by Claude and `OpenAI` audio.
//!
//! The chat widget sends the whole conversation on every turn; nothing is
//! stored server side. Requests are checked here before any provider call
//! so a malformed conversation never costs tokens.

mod claude;
mod error;
mod speech;
mod types;

use std::fmt::Write as _;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;

use kanak_core::Price;

use crate::models::catalog::MarketRate;

pub use claude::ClaudeClient;
pub use error::AssistantError;
pub use speech::{MAX_SPEECH_CHARS, SpeechClient, validate_speech_text};
pub use types::{
    ChatResponse, ContentBlock, ImageSource, Message, MessageContent, Role, StopReason,
};

/// Most turns a single chat request may carry.
pub const MAX_MESSAGES: usize = 40;
/// Longest single chat message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4000;
/// Largest image accepted for styling advice.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
/// Largest audio clip accepted for transcription.
pub const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

const IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

const PERSONA: &str = "You are the shopping assistant for Kanak Jewels, an Indian jewelry \
store selling gold, silver and platinum pieces online and at its counter. Answer warmly and \
briefly. Help customers find pieces, explain purity (24K, 22K, 18K, 14K, 999 and 925 silver, \
950 platinum), making charges, the old-jewelry exchange program and the Gullak savings plan. \
Quote prices in rupees. Never promise a final price for exchanges; an appraiser confirms the \
value after inspection. If you don't know something about an order, ask the customer to \
check their account page or contact the store.";

const STYLE_PROMPT: &str = "Look at this photo and suggest jewelry from a typical Indian \
jewelry store that would suit the outfit, neckline and colours you see. Recommend metal, \
purity and kinds of pieces (necklace, earrings, bangles, rings) with a short reason for each. \
Keep it under 200 words.";

/// A turn as sent by the chat widget.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

/// System prompt with today's rate board appended.
#[must_use]
pub fn system_prompt(rates: &[MarketRate]) -> String {
    let mut prompt = PERSONA.to_string();
    if rates.is_empty() {
        prompt.push_str("\n\nToday's metal rates are not available; don't quote any.");
        return prompt;
    }

    prompt.push_str("\n\nToday's rates per gram:");
    for rate in rates {
        let _ = write!(
            prompt,
            "\n- {} {}: {} (effective {})",
            rate.metal,
            purity_label(rate.purity),
            Price::inr(rate.rate_per_gram).display(),
            rate.effective_date
        );
    }
    prompt
}

fn purity_label(purity: kanak_core::Purity) -> &'static str {
    use kanak_core::Purity;
    match purity {
        Purity::K24 => "24K",
        Purity::K22 => "22K",
        Purity::K18 => "18K",
        Purity::K14 => "14K",
        Purity::Silver999 => "999",
        Purity::Silver925 => "925",
        Purity::Pt950 => "950",
    }
}

/// Check a conversation and convert it for the Messages API.
///
/// # Errors
///
/// Returns `AssistantError::InvalidInput` if the conversation is empty, too
/// long, doesn't end with the customer, or contains an empty or oversized turn.
pub fn conversation(turns: Vec<ChatTurn>) -> Result<Vec<Message>, AssistantError> {
    if turns.is_empty() {
        return Err(invalid("messages are required"));
    }
    if turns.len() > MAX_MESSAGES {
        return Err(invalid(format!("at most {MAX_MESSAGES} messages are allowed")));
    }
    if turns.last().map(|t| t.role) != Some(Role::User) {
        return Err(invalid("the last message must come from the user"));
    }

    turns
        .into_iter()
        .map(|turn| {
            let content = turn.content.trim();
            if content.is_empty() {
                return Err(invalid("messages must not be empty"));
            }
            if content.chars().count() > MAX_MESSAGE_CHARS {
                return Err(invalid(format!(
                    "messages must be at most {MAX_MESSAGE_CHARS} characters"
                )));
            }
            Ok(Message {
                role: turn.role,
                content: MessageContent::Text(content.to_string()),
            })
        })
        .collect()
}

/// Build the styling request for an uploaded photo.
///
/// # Errors
///
/// Returns `AssistantError::InvalidInput` for an empty, oversized or
/// unsupported image.
pub fn style_request(
    image: &[u8],
    media_type: &str,
    occasion: Option<&str>,
) -> Result<Message, AssistantError> {
    if image.is_empty() {
        return Err(invalid("image is required"));
    }
    if image.len() > MAX_IMAGE_BYTES {
        return Err(invalid("image must be at most 5 MB"));
    }
    if !IMAGE_TYPES.contains(&media_type) {
        return Err(invalid(format!("unsupported image type {media_type}")));
    }

    let mut prompt = STYLE_PROMPT.to_string();
    if let Some(occasion) = occasion.map(str::trim).filter(|o| !o.is_empty()) {
        let _ = write!(prompt, " The occasion is: {occasion}.");
    }

    Ok(Message {
        role: Role::User,
        content: MessageContent::Blocks(vec![
            ContentBlock::Image {
                source: ImageSource::base64(media_type, STANDARD.encode(image)),
            },
            ContentBlock::Text { text: prompt },
        ]),
    })
}

/// Check an uploaded audio clip before transcription.
///
/// # Errors
///
/// Returns `AssistantError::InvalidInput` for an empty or oversized clip.
pub fn check_audio(audio: &[u8]) -> Result<(), AssistantError> {
    if audio.is_empty() {
        return Err(invalid("audio is required"));
    }
    if audio.len() > MAX_AUDIO_BYTES {
        return Err(invalid("audio must be at most 25 MB"));
    }
    Ok(())
}

fn invalid(msg: impl Into<String>) -> AssistantError {
    AssistantError::InvalidInput(msg.into())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    use kanak_core::{MetalType, Purity};

    use super::*;

    fn turn(role: Role, content: &str) -> ChatTurn {
        ChatTurn {
            role,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_system_prompt_lists_rates() {
        let rates = vec![MarketRate {
            id: 1.into(),
            metal: MetalType::Gold,
            purity: Purity::K22,
            rate_per_gram: Decimal::new(665_000, 2),
            effective_date: NaiveDate::from_ymd_opt(2026, 3, 9).expect("valid date"),
            created_at: Utc::now(),
        }];

        let prompt = system_prompt(&rates);
        assert!(prompt.starts_with("You are the shopping assistant for Kanak Jewels"));
        assert!(prompt.contains("- gold 22K: ₹6,650.00 (effective 2026-03-09)"));
    }

    #[test]
    fn test_system_prompt_without_rates() {
        assert!(system_prompt(&[]).contains("not available"));
    }

    #[test]
    fn test_conversation_validation() {
        let messages = conversation(vec![
            turn(Role::User, "hi"),
            turn(Role::Assistant, "Namaste!"),
            turn(Role::User, "  show me bangles "),
        ])
        .expect("valid conversation");
        assert_eq!(messages.len(), 3);
        assert!(matches!(
            messages.last().map(|m| &m.content),
            Some(MessageContent::Text(t)) if t == "show me bangles"
        ));

        assert!(conversation(vec![]).is_err());
        assert!(conversation(vec![turn(Role::Assistant, "hello")]).is_err());
        assert!(conversation(vec![turn(Role::User, "   ")]).is_err());
        assert!(conversation(vec![turn(Role::User, &"x".repeat(MAX_MESSAGE_CHARS + 1))]).is_err());

        let too_many = (0..=MAX_MESSAGES).map(|_| turn(Role::User, "hi")).collect();
        assert!(conversation(too_many).is_err());
    }

    #[test]
    fn test_style_request() {
        let message = style_request(b"fake-jpeg", "image/jpeg", Some(" wedding ")).expect("valid");
        let MessageContent::Blocks(blocks) = message.content else {
            panic!("expected content blocks");
        };
        assert_eq!(blocks.len(), 2);
        assert!(matches!(
            blocks.first(),
            Some(ContentBlock::Image { source }) if source.data == STANDARD.encode(b"fake-jpeg")
        ));
        assert!(matches!(
            blocks.get(1),
            Some(ContentBlock::Text { text }) if text.ends_with("The occasion is: wedding.")
        ));

        assert!(style_request(b"", "image/jpeg", None).is_err());
        assert!(style_request(b"gif89a", "image/bmp", None).is_err());
    }

    #[test]
    fn test_check_audio() {
        assert!(check_audio(b"RIFF").is_ok());
        assert!(check_audio(b"").is_err());
    }
}
