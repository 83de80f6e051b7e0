use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::domain::{NewsArticle, TimeMs};
use crate::error::AppError;

use super::{clamp_limit, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDto {
    pub event_key: String,
    pub source: String,
    pub url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub sentiment: f64,
    pub label: String,
    pub published_at: i64,
}

impl From<&NewsArticle> for ArticleDto {
    fn from(article: &NewsArticle) -> Self {
        ArticleDto {
            event_key: article.event_key.clone(),
            source: article.source.clone(),
            url: article.url.clone(),
            title: article.title.clone(),
            summary: article.summary.clone(),
            sentiment: article.sentiment,
            label: article.label().as_str().to_string(),
            published_at: article.published_at.as_i64(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitArticleRequest {
    pub source: String,
    pub url: String,
    pub title: String,
    pub summary: Option<String>,
    pub sentiment: f64,
    pub published_at: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SubmitArticleResponse {
    pub article: ArticleDto,
    pub inserted: bool,
}

pub async fn submit_article(
    _auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SubmitArticleRequest>,
) -> Result<Json<SubmitArticleResponse>, AppError> {
    let source = req.source.trim().to_string();
    let url = req.url.trim().to_string();
    let title = req.title.trim().to_string();

    if source.is_empty() || url.is_empty() || title.is_empty() {
        return Err(AppError::BadRequest(
            "source, url, and title are required".to_string(),
        ));
    }
    if !(-1.0..=1.0).contains(&req.sentiment) {
        return Err(AppError::BadRequest(
            "sentiment must be within [-1, 1]".to_string(),
        ));
    }

    let article = NewsArticle::new(
        source,
        url,
        title,
        req.summary.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
        req.sentiment,
        req.published_at.map(TimeMs::new).unwrap_or_else(TimeMs::now),
    );

    let inserted = state.repo.insert_news(&article).await?;

    Ok(Json(SubmitArticleResponse {
        article: ArticleDto::from(&article),
        inserted,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ListNewsQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct NewsResponse {
    pub articles: Vec<ArticleDto>,
}

pub async fn list_news(
    _auth: AuthUser,
    Query(params): Query<ListNewsQuery>,
    State(state): State<AppState>,
) -> Result<Json<NewsResponse>, AppError> {
    let limit = clamp_limit(params.limit, 50, 200);
    let articles = state.repo.list_news(limit as i64).await?;

    Ok(Json(NewsResponse {
        articles: articles.iter().map(ArticleDto::from).collect(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentQuery {
    /// Window in hours; defaults to 24.
    pub window_hours: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentResponse {
    pub article_count: i64,
    pub average_score: f64,
    pub positive: i64,
    pub neutral: i64,
    pub negative: i64,
    pub dominant: String,
    pub window_hours: i64,
}

pub async fn sentiment(
    _auth: AuthUser,
    Query(params): Query<SentimentQuery>,
    State(state): State<AppState>,
) -> Result<Json<SentimentResponse>, AppError> {
    let window_hours = params.window_hours.unwrap_or(24);
    if !(1..=24 * 30).contains(&window_hours) {
        return Err(AppError::BadRequest(
            "windowHours must be within [1, 720]".to_string(),
        ));
    }

    let since = TimeMs::new(TimeMs::now().as_i64() - window_hours * 3_600_000);
    let summary = state.repo.sentiment_summary(since).await?;

    Ok(Json(SentimentResponse {
        article_count: summary.article_count,
        average_score: summary.average_score,
        positive: summary.positive,
        neutral: summary.neutral,
        negative: summary.negative,
        dominant: summary.dominant().as_str().to_string(),
        window_hours,
    }))
}
