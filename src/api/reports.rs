use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::domain::{AnalysisReport, Decimal, Interval, TimeMs};
use crate::engine::{decide, render_report, SignalSnapshot};
use crate::error::AppError;

use super::agents::load_owned_agent;
use super::{clamp_limit, parse_symbol, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDto {
    pub id: String,
    pub agent_id: String,
    pub symbol: String,
    pub recommendation: String,
    pub confidence: f64,
    pub body: String,
    pub price: String,
    pub created_at: i64,
}

impl From<&AnalysisReport> for ReportDto {
    fn from(report: &AnalysisReport) -> Self {
        ReportDto {
            id: report.id.to_string(),
            agent_id: report.agent_id.to_string(),
            symbol: report.symbol.as_str().to_string(),
            recommendation: report.recommendation.as_str().to_string(),
            confidence: report.confidence,
            body: report.body.clone(),
            price: report.price.to_canonical_string(),
            created_at: report.created_at.as_i64(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateReportRequest {
    pub symbol: Option<String>,
}

/// Evaluate the agent against fresh price history and persist the snapshot.
pub async fn generate_report(
    auth: AuthUser,
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<GenerateReportRequest>,
) -> Result<Json<ReportDto>, AppError> {
    let agent_id = Uuid::parse_str(&id)
        .map_err(|_| AppError::BadRequest("Invalid agent id".to_string()))?;
    let agent = load_owned_agent(&state, &auth.user_id, &agent_id).await?;

    let symbol = parse_symbol(req.symbol.as_deref())?;
    let candles = state
        .price_source
        .fetch_klines(&symbol, Interval::OneHour, 100)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch price history: {}", e)))?;

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let snapshot = SignalSnapshot::from_closes(&closes);
    let decision = decide(&agent.thresholds, &snapshot);
    let body = render_report(agent.personality, &symbol, &snapshot, &decision);

    let price = Decimal::from_f64(snapshot.price)
        .ok_or_else(|| AppError::Internal("Invalid close price".to_string()))?;

    let report = AnalysisReport {
        id: Uuid::new_v4(),
        agent_id: agent.id,
        symbol,
        recommendation: decision.recommendation,
        confidence: decision.confidence,
        body,
        price,
        created_at: TimeMs::now(),
    };

    state.repo.insert_report(&report).await?;

    tracing::info!(
        agent = %agent.name,
        recommendation = %report.recommendation,
        "generated analysis report"
    );

    Ok(Json(ReportDto::from(&report)))
}

#[derive(Debug, Deserialize)]
pub struct ListReportsQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ReportsResponse {
    pub reports: Vec<ReportDto>,
}

pub async fn list_reports(
    auth: AuthUser,
    Path(id): Path<String>,
    Query(params): Query<ListReportsQuery>,
    State(state): State<AppState>,
) -> Result<Json<ReportsResponse>, AppError> {
    let agent_id = Uuid::parse_str(&id)
        .map_err(|_| AppError::BadRequest("Invalid agent id".to_string()))?;
    load_owned_agent(&state, &auth.user_id, &agent_id).await?;

    let limit = clamp_limit(params.limit, 20, 200);
    let reports = state.repo.list_reports(&agent_id, limit as i64).await?;

    Ok(Json(ReportsResponse {
        reports: reports.iter().map(ReportDto::from).collect(),
    }))
}

pub async fn get_report(
    auth: AuthUser,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ReportDto>, AppError> {
    let report_id = Uuid::parse_str(&id)
        .map_err(|_| AppError::BadRequest("Invalid report id".to_string()))?;

    let report = state
        .repo
        .get_report(&report_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Report not found".to_string()))?;

    // Ownership check goes through the agent.
    load_owned_agent(&state, &auth.user_id, &report.agent_id).await?;

    Ok(Json(ReportDto::from(&report)))
}
