use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::domain::{TimeMs, TradingNote};
use crate::error::AppError;

use super::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDto {
    pub id: String,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<&TradingNote> for NoteDto {
    fn from(note: &TradingNote) -> Self {
        NoteDto {
            id: note.id.to_string(),
            title: note.title.clone(),
            body: note.body.clone(),
            tags: note.tags.clone(),
            created_at: note.created_at.as_i64(),
            updated_at: note.updated_at.as_i64(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn validate_note(req: &NoteRequest) -> Result<(String, String, Vec<String>), AppError> {
    let title = req.title.trim().to_string();
    if title.is_empty() || title.len() > 128 {
        return Err(AppError::BadRequest(
            "title must be 1-128 characters".to_string(),
        ));
    }

    let body = req.body.trim().to_string();
    if body.is_empty() || body.len() > 10_000 {
        return Err(AppError::BadRequest(
            "body must be 1-10000 characters".to_string(),
        ));
    }

    let tags: Vec<String> = req
        .tags
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    if tags.iter().any(|t| t.contains(',')) {
        return Err(AppError::BadRequest("tags must not contain commas".to_string()));
    }

    Ok((title, body, tags))
}

pub async fn create_note(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<NoteRequest>,
) -> Result<Json<NoteDto>, AppError> {
    let (title, body, tags) = validate_note(&req)?;

    let now = TimeMs::now();
    let note = TradingNote {
        id: Uuid::new_v4(),
        user_id: auth.user_id,
        title,
        body,
        tags,
        created_at: now,
        updated_at: now,
    };

    state.repo.insert_note(&note).await?;
    Ok(Json(NoteDto::from(&note)))
}

#[derive(Debug, Serialize)]
pub struct NotesResponse {
    pub notes: Vec<NoteDto>,
}

pub async fn list_notes(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<NotesResponse>, AppError> {
    let notes = state.repo.list_notes(&auth.user_id).await?;
    Ok(Json(NotesResponse {
        notes: notes.iter().map(NoteDto::from).collect(),
    }))
}

pub async fn update_note(
    auth: AuthUser,
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<NoteRequest>,
) -> Result<Json<NoteDto>, AppError> {
    let note_id =
        Uuid::parse_str(&id).map_err(|_| AppError::BadRequest("Invalid note id".to_string()))?;
    let (title, body, tags) = validate_note(&req)?;

    let mut note = state
        .repo
        .get_note(&auth.user_id, &note_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Note not found".to_string()))?;

    note.title = title;
    note.body = body;
    note.tags = tags;
    note.updated_at = TimeMs::now();

    if !state.repo.update_note(&note).await? {
        return Err(AppError::NotFound("Note not found".to_string()));
    }
    Ok(Json(NoteDto::from(&note)))
}

pub async fn delete_note(
    auth: AuthUser,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let note_id =
        Uuid::parse_str(&id).map_err(|_| AppError::BadRequest("Invalid note id".to_string()))?;

    if !state.repo.delete_note(&auth.user_id, &note_id).await? {
        return Err(AppError::NotFound("Note not found".to_string()));
    }
    Ok(Json(serde_json::json!({"deleted": true})))
}
