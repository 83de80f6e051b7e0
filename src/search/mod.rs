//! Text search over watchlist and note content.
//!
//! When a semantic-search service is configured its ranking is used; any
//! failure degrades to a case-insensitive substring scan with the same
//! response shape, so callers never see the difference.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A searchable document assembled from a user's rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchDoc {
    pub id: String,
    /// "note" or "watchlist".
    pub kind: String,
    pub text: String,
}

/// A scored match.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub id: String,
    pub kind: String,
    pub text: String,
    pub score: f64,
}

#[derive(Debug, Serialize)]
struct RankRequest<'a> {
    query: &'a str,
    documents: Vec<RankDoc<'a>>,
}

#[derive(Debug, Serialize)]
struct RankDoc<'a> {
    id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct RankResponse {
    matches: Vec<RankMatch>,
}

#[derive(Debug, Deserialize)]
struct RankMatch {
    id: String,
    score: f64,
}

/// Search facade over the optional external ranking service.
#[derive(Debug, Clone)]
pub struct SearchService {
    client: reqwest::Client,
    api_url: Option<String>,
}

impl SearchService {
    pub fn new(client: reqwest::Client, api_url: Option<String>) -> Self {
        Self { client, api_url }
    }

    /// Rank `docs` against `query`, best first.
    pub async fn search(&self, query: &str, docs: &[SearchDoc]) -> Vec<SearchHit> {
        if let Some(url) = &self.api_url {
            match self.rank_remote(url, query, docs).await {
                Ok(hits) => return hits,
                Err(e) => {
                    warn!(error = %e, "semantic search unavailable, using substring fallback");
                }
            }
        }

        substring_search(query, docs)
    }

    async fn rank_remote(
        &self,
        url: &str,
        query: &str,
        docs: &[SearchDoc],
    ) -> Result<Vec<SearchHit>, reqwest::Error> {
        let request = RankRequest {
            query,
            documents: docs
                .iter()
                .map(|d| RankDoc {
                    id: &d.id,
                    text: &d.text,
                })
                .collect(),
        };

        let response: RankResponse = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut hits: Vec<SearchHit> = response
            .matches
            .into_iter()
            .filter_map(|m| {
                docs.iter().find(|d| d.id == m.id).map(|d| SearchHit {
                    id: d.id.clone(),
                    kind: d.kind.clone(),
                    text: d.text.clone(),
                    score: m.score,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(hits)
    }
}

/// Case-insensitive substring scan, document order preserved.
fn substring_search(query: &str, docs: &[SearchDoc]) -> Vec<SearchHit> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    docs.iter()
        .filter(|d| d.text.to_lowercase().contains(&needle))
        .map(|d| SearchHit {
            id: d.id.clone(),
            kind: d.kind.clone(),
            text: d.text.clone(),
            score: 1.0,
        })
        .collect()
}
