use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::domain::{ChatMessage, ChatRole, Interval, Symbol, TimeMs};
use crate::engine::{decide, parse_intent, render_reply, ChatContext, Intent, NewsDigest, SignalSnapshot};
use crate::error::AppError;

use super::agents::load_owned_agent;
use super::{clamp_limit, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub agent_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: String,
    pub role: String,
    pub content: String,
    pub created_at: i64,
}

impl From<&ChatMessage> for MessageDto {
    fn from(msg: &ChatMessage) -> Self {
        MessageDto {
            id: msg.id.to_string(),
            role: msg.role.as_str().to_string(),
            content: msg.content.clone(),
            created_at: msg.created_at.as_i64(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub message: MessageDto,
    pub reply: MessageDto,
}

/// Persist the user's message, compute the agent's canned reply, persist and
/// return both.
pub async fn send_message(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, AppError> {
    let agent_id = Uuid::parse_str(&req.agent_id)
        .map_err(|_| AppError::BadRequest("Invalid agent id".to_string()))?;
    let agent = load_owned_agent(&state, &auth.user_id, &agent_id).await?;

    let text = req.message.trim().to_string();
    if text.is_empty() {
        return Err(AppError::BadRequest("message must not be empty".to_string()));
    }
    if text.len() > 2000 {
        return Err(AppError::BadRequest(
            "message must be at most 2000 characters".to_string(),
        ));
    }

    let intent = parse_intent(&text);
    let ctx = build_context(&state, &auth, &agent.thresholds, intent).await;
    let reply_text = render_reply(agent.personality, intent, &ctx);

    let now = TimeMs::now();
    let user_msg = ChatMessage {
        id: Uuid::new_v4(),
        user_id: auth.user_id,
        agent_id,
        role: ChatRole::User,
        content: text,
        created_at: now,
    };
    let reply_msg = ChatMessage {
        id: Uuid::new_v4(),
        user_id: auth.user_id,
        agent_id,
        role: ChatRole::Agent,
        content: reply_text,
        created_at: now,
    };

    state.repo.insert_chat_message(&user_msg).await?;
    state.repo.insert_chat_message(&reply_msg).await?;

    Ok(Json(SendMessageResponse {
        message: MessageDto::from(&user_msg),
        reply: MessageDto::from(&reply_msg),
    }))
}

/// Gather only the data the chosen intent needs; failures leave fields unset
/// and the templates degrade on their own.
async fn build_context(
    state: &AppState,
    auth: &AuthUser,
    thresholds: &crate::domain::Thresholds,
    intent: Intent,
) -> ChatContext {
    let mut ctx = ChatContext::default();
    let symbol = Symbol::btcusdt();

    match intent {
        Intent::Price => {
            ctx.price = state.resolve_price(&symbol).await.ok();
        }
        Intent::Portfolio => {
            if let Ok(Some(portfolio)) = state.repo.get_portfolio(&auth.user_id).await {
                ctx.cash = Some(portfolio.cash);
                ctx.btc_qty = Some(portfolio.btc_qty);
                if let Ok(price) = state.resolve_price(&symbol).await {
                    ctx.portfolio_value = Some(portfolio.value_at(price));
                }
            }
        }
        Intent::Indicators | Intent::Advice => {
            if let Ok(candles) = state
                .price_source
                .fetch_klines(&symbol, Interval::OneHour, 100)
                .await
            {
                let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
                let snapshot = SignalSnapshot::from_closes(&closes);
                ctx.rsi = snapshot.rsi;
                ctx.macd_histogram = snapshot.macd_histogram;
                if snapshot.available() > 0 {
                    ctx.decision = Some(decide(thresholds, &snapshot));
                }
            }
        }
        Intent::News => {
            let day_ago = TimeMs::new(TimeMs::now().as_i64() - 86_400_000);
            if let Ok(summary) = state.repo.sentiment_summary(day_ago).await {
                ctx.news = Some(NewsDigest {
                    label: summary.dominant().as_str().to_string(),
                    average: summary.average_score,
                    count: summary.article_count,
                });
            }
        }
        Intent::Greeting | Intent::Help | Intent::Unknown => {}
    }

    ctx
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub agent_id: String,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub messages: Vec<MessageDto>,
}

pub async fn history(
    auth: AuthUser,
    Query(params): Query<HistoryQuery>,
    State(state): State<AppState>,
) -> Result<Json<HistoryResponse>, AppError> {
    let agent_id = Uuid::parse_str(&params.agent_id)
        .map_err(|_| AppError::BadRequest("Invalid agent id".to_string()))?;
    load_owned_agent(&state, &auth.user_id, &agent_id).await?;

    let limit = clamp_limit(params.limit, 100, 500);
    let messages = state
        .repo
        .chat_history(&auth.user_id, &agent_id, limit as i64)
        .await?;

    Ok(Json(HistoryResponse {
        messages: messages.iter().map(MessageDto::from).collect(),
    }))
}
