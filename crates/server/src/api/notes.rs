//! Note endpoints: create, and read-once.

use std::time::Duration;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use snote_core::{NoteRequest, decode_key_hash};

use super::AppState;
use super::schemas::{
    CreateNoteRequest, CreatedNoteResponse, ErrorResponse, GetNoteParams, NoteResponse,
};
use crate::error::ServerError;

/// `POST /v1/notes` -- store a new note.
#[utoipa::path(
    post,
    path = "/v1/notes",
    tag = "Notes",
    summary = "Create a note",
    description = "Stores client-encrypted content until it is read once or expires. Provide either `expiresIn`, or both `expiresAt` and `expiresAtTimeZone`.",
    request_body(content = CreateNoteRequest, description = "Note content and expiration policy"),
    responses(
        (status = 201, description = "Note created", body = CreatedNoteResponse),
        (status = 400, description = "Malformed JSON, base64 or base58", body = ErrorResponse),
        (status = 413, description = "Request body too large", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    )
)]
pub async fn create_note(
    State(state): State<AppState>,
    payload: Result<Json<CreateNoteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedNoteResponse>), ServerError> {
    let Json(req) = payload.map_err(|rejection| match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ServerError::PayloadTooLarge(rejection.body_text()),
        _ => ServerError::BadRequest(rejection.body_text()),
    })?;

    let content = BASE64
        .decode(req.content.as_bytes())
        .map_err(|e| ServerError::BadRequest(format!("content is not valid base64: {e}")))?;
    let key_hash = decode_key_hash(&req.key_hash)
        .map_err(|e| ServerError::BadRequest(format!("keyHash is not valid base58: {e}")))?;

    let mut request = NoteRequest::new(content, key_hash);
    request.expires_in = req.expires_in.map(Duration::from_secs);
    request.expires_at = req.expires_at;
    request.expires_at_time_zone = req.expires_at_time_zone;

    let note = state.notes.create_note(request).await?;
    Ok((StatusCode::CREATED, Json(CreatedNoteResponse::from(&note))))
}

/// `GET /v1/notes/{id}` -- read a note and destroy it.
#[utoipa::path(
    get,
    path = "/v1/notes/{id}",
    tag = "Notes",
    summary = "Read a note once",
    description = "Returns the note and deletes it. Missing, expired, already-read notes and wrong key hashes all produce the same 404.",
    params(
        ("id" = String, Path, description = "Public note identifier", example = "1111-1111-12"),
        GetNoteParams,
    ),
    responses(
        (status = 200, description = "The note; it no longer exists on the server", body = NoteResponse),
        (status = 404, description = "Note does not exist", body = ErrorResponse),
        (status = 422, description = "Malformed id or key hash", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    )
)]
pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<GetNoteParams>,
) -> Result<Json<NoteResponse>, ServerError> {
    let note = state.notes.get_note(&id, &params.key_hash).await?;
    Ok(Json(NoteResponse::from(note)))
}
