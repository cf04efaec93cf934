//! AI shopping assistant widgets.
//!
//! Every call goes straight to the provider; there are no retries. An
//! unconfigured provider answers 503, a failing one 502.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::header,
    response::IntoResponse,
    routing::post,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::assistant::{
    self, ChatTurn, MAX_AUDIO_BYTES, StopReason, conversation, style_request, system_prompt,
};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Room for the largest audio clip plus multipart framing.
const BODY_LIMIT: usize = MAX_AUDIO_BYTES + 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/message", post(message))
        .route("/style", post(style))
        .route("/transcribe", post(transcribe))
        .route("/speak", post(speak))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub messages: Vec<ChatTurn>,
}

#[derive(Debug, Serialize)]
pub struct Reply {
    pub reply: String,
    pub stop_reason: Option<StopReason>,
}

#[derive(Debug, Deserialize)]
pub struct SpeakRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct Transcript {
    pub text: String,
}

/// An uploaded file from a multipart form.
struct Upload {
    bytes: Vec<u8>,
    file_name: String,
    content_type: String,
}

/// One chat turn. The whole conversation comes from the widget.
///
/// POST /api/chatbot/message
#[instrument(skip(state, req), fields(turns = req.messages.len()))]
async fn message(
    State(state): State<AppState>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<Reply>> {
    let claude = state.claude()?;
    let messages = conversation(req.messages)?;
    let rates = state
        .rates()
        .current(state.pool(), state.rules().today())
        .await?;

    let response = claude.chat(messages, Some(system_prompt(&rates))).await?;
    Ok(Json(Reply {
        reply: response.text(),
        stop_reason: response.stop_reason,
    }))
}

/// Styling advice for an outfit photo.
///
/// POST /api/chatbot/style (multipart: `image`, optional `occasion`)
#[instrument(skip(state, multipart))]
async fn style(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<Reply>> {
    let claude = state.claude()?;

    let mut image = None;
    let mut occasion = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        match field.name() {
            Some("image") => image = Some(read_upload(field).await?),
            Some("occasion") => occasion = Some(field.text().await.map_err(bad_multipart)?),
            _ => {}
        }
    }
    let image = image.ok_or_else(|| AppError::BadRequest("image is required".to_string()))?;

    let request = style_request(&image.bytes, &image.content_type, occasion.as_deref())?;
    let rates = state
        .rates()
        .current(state.pool(), state.rules().today())
        .await?;
    let response = claude.chat(vec![request], Some(system_prompt(&rates))).await?;
    Ok(Json(Reply {
        reply: response.text(),
        stop_reason: response.stop_reason,
    }))
}

/// POST /api/chatbot/transcribe (multipart: `audio`)
#[instrument(skip(state, multipart))]
async fn transcribe(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Transcript>> {
    let speech = state.speech()?;

    let mut audio = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        if field.name() == Some("audio") {
            audio = Some(read_upload(field).await?);
        }
    }
    let audio = audio.ok_or_else(|| AppError::BadRequest("audio is required".to_string()))?;
    assistant::check_audio(&audio.bytes)?;

    let text = speech
        .transcribe(audio.bytes, audio.file_name, &audio.content_type)
        .await?;
    Ok(Json(Transcript { text }))
}

/// Read a reply aloud.
///
/// POST /api/chatbot/speak
#[instrument(skip(state, req))]
async fn speak(
    State(state): State<AppState>,
    Json(req): Json<SpeakRequest>,
) -> Result<impl IntoResponse> {
    let speech = state.speech()?;
    let audio = speech.speak(&req.text).await?;
    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio))
}

async fn read_upload(field: axum::extract::multipart::Field<'_>) -> Result<Upload> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = field.bytes().await.map_err(bad_multipart)?.to_vec();
    Ok(Upload {
        bytes,
        file_name,
        content_type,
    })
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(format!("invalid upload: {}", err.body_text()))
}
