use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::domain::{Agent, Personality, Thresholds, TimeMs};
use crate::error::AppError;

use super::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDto {
    pub id: String,
    pub name: String,
    pub personality: String,
    pub thresholds: Thresholds,
    pub created_at: i64,
}

impl From<&Agent> for AgentDto {
    fn from(agent: &Agent) -> Self {
        AgentDto {
            id: agent.id.to_string(),
            name: agent.name.clone(),
            personality: agent.personality.as_str().to_string(),
            thresholds: agent.thresholds,
            created_at: agent.created_at.as_i64(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentRequest {
    pub name: String,
    pub personality: String,
    /// Optional overrides; personality defaults apply when absent.
    pub thresholds: Option<Thresholds>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAgentRequest {
    pub name: Option<String>,
    pub personality: Option<String>,
    pub thresholds: Option<Thresholds>,
}

fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim().to_string();
    if name.is_empty() || name.len() > 64 {
        return Err(AppError::BadRequest(
            "name must be 1-64 characters".to_string(),
        ));
    }
    Ok(name)
}

fn validate_thresholds(t: &Thresholds) -> Result<(), AppError> {
    if !(0.0..=100.0).contains(&t.rsi_oversold)
        || !(0.0..=100.0).contains(&t.rsi_overbought)
        || t.rsi_oversold >= t.rsi_overbought
    {
        return Err(AppError::BadRequest(
            "RSI thresholds must satisfy 0 <= oversold < overbought <= 100".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&t.min_confidence) {
        return Err(AppError::BadRequest(
            "minConfidence must be within [0, 1]".to_string(),
        ));
    }
    Ok(())
}

pub async fn create_agent(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateAgentRequest>,
) -> Result<Json<AgentDto>, AppError> {
    let name = validate_name(&req.name)?;
    let personality = Personality::from_str(&req.personality).map_err(|_| {
        AppError::BadRequest(
            "personality must be conservative, balanced, or aggressive".to_string(),
        )
    })?;

    let thresholds = req.thresholds.unwrap_or_else(|| personality.default_thresholds());
    validate_thresholds(&thresholds)?;

    let agent = Agent {
        id: Uuid::new_v4(),
        owner_id: auth.user_id,
        name,
        personality,
        thresholds,
        created_at: TimeMs::now(),
    };

    state.repo.insert_agent(&agent).await?;
    Ok(Json(AgentDto::from(&agent)))
}

#[derive(Debug, Serialize)]
pub struct AgentsResponse {
    pub agents: Vec<AgentDto>,
}

pub async fn list_agents(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AgentsResponse>, AppError> {
    let agents = state.repo.list_agents(&auth.user_id).await?;
    Ok(Json(AgentsResponse {
        agents: agents.iter().map(AgentDto::from).collect(),
    }))
}

/// Fetch an agent, verifying ownership.
pub(crate) async fn load_owned_agent(
    state: &AppState,
    owner_id: &Uuid,
    agent_id: &Uuid,
) -> Result<Agent, AppError> {
    let agent = state
        .repo
        .get_agent(agent_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Agent not found".to_string()))?;

    if agent.owner_id != *owner_id {
        // Hide other users' agents entirely.
        return Err(AppError::NotFound("Agent not found".to_string()));
    }
    Ok(agent)
}

fn parse_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::BadRequest("Invalid agent id".to_string()))
}

pub async fn get_agent(
    auth: AuthUser,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<AgentDto>, AppError> {
    let agent_id = parse_id(&id)?;
    let agent = load_owned_agent(&state, &auth.user_id, &agent_id).await?;
    Ok(Json(AgentDto::from(&agent)))
}

pub async fn update_agent(
    auth: AuthUser,
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<UpdateAgentRequest>,
) -> Result<Json<AgentDto>, AppError> {
    let agent_id = parse_id(&id)?;
    let mut agent = load_owned_agent(&state, &auth.user_id, &agent_id).await?;

    if let Some(name) = req.name {
        agent.name = validate_name(&name)?;
    }
    if let Some(personality) = req.personality {
        agent.personality = Personality::from_str(&personality).map_err(|_| {
            AppError::BadRequest(
                "personality must be conservative, balanced, or aggressive".to_string(),
            )
        })?;
    }
    if let Some(thresholds) = req.thresholds {
        validate_thresholds(&thresholds)?;
        agent.thresholds = thresholds;
    }

    if !state.repo.update_agent(&agent).await? {
        return Err(AppError::NotFound("Agent not found".to_string()));
    }
    Ok(Json(AgentDto::from(&agent)))
}

pub async fn delete_agent(
    auth: AuthUser,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let agent_id = parse_id(&id)?;
    load_owned_agent(&state, &auth.user_id, &agent_id).await?;

    state.repo.delete_agent(&agent_id).await?;
    Ok(Json(serde_json::json!({"deleted": true})))
}
