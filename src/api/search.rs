use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::search::{SearchDoc, SearchHit};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub hits: Vec<SearchHit>,
}

/// Search the caller's notes and watchlist text.
pub async fn search(
    auth: AuthUser,
    Query(params): Query<SearchQuery>,
    State(state): State<AppState>,
) -> Result<Json<SearchResponse>, AppError> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(AppError::BadRequest("q must not be empty".to_string()));
    }

    let notes = state.repo.list_notes(&auth.user_id).await?;
    let watchlist = state.repo.list_watchlist(&auth.user_id).await?;

    let mut docs = Vec::with_capacity(notes.len() + watchlist.len());
    for note in &notes {
        docs.push(SearchDoc {
            id: note.id.to_string(),
            kind: "note".to_string(),
            text: format!("{} {} {}", note.title, note.body, note.tags.join(" ")),
        });
    }
    for item in &watchlist {
        docs.push(SearchDoc {
            id: item.id.to_string(),
            kind: "watchlist".to_string(),
            text: match &item.note {
                Some(note) => format!("{} {}", item.symbol, note),
                None => item.symbol.as_str().to_string(),
            },
        });
    }

    let hits = state.search.search(query, &docs).await;
    Ok(Json(SearchResponse { hits }))
}
