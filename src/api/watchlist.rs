use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::domain::{Decimal, TimeMs, WatchlistItem};
use crate::error::AppError;

use super::{parse_symbol, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistItemDto {
    pub id: String,
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_above: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_below: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: i64,
}

impl From<&WatchlistItem> for WatchlistItemDto {
    fn from(item: &WatchlistItem) -> Self {
        WatchlistItemDto {
            id: item.id.to_string(),
            symbol: item.symbol.as_str().to_string(),
            alert_above: item.alert_above.map(|d| d.to_canonical_string()),
            alert_below: item.alert_below.map(|d| d.to_canonical_string()),
            note: item.note.clone(),
            created_at: item.created_at.as_i64(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub symbol: String,
    pub alert_above: Option<String>,
    pub alert_below: Option<String>,
    pub note: Option<String>,
}

fn parse_alert(raw: Option<&str>, field: &str) -> Result<Option<Decimal>, AppError> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Decimal::from_str_canonical(s)
                .ok()
                .filter(|d| d.is_positive())
                .ok_or_else(|| {
                    AppError::BadRequest(format!("{} must be a positive decimal", field))
                })
        })
        .transpose()
}

pub async fn add_item(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<WatchlistItemDto>, AppError> {
    let symbol = parse_symbol(Some(&req.symbol))?;
    let alert_above = parse_alert(req.alert_above.as_deref(), "alertAbove")?;
    let alert_below = parse_alert(req.alert_below.as_deref(), "alertBelow")?;

    if let (Some(above), Some(below)) = (alert_above, alert_below) {
        if below >= above {
            return Err(AppError::BadRequest(
                "alertBelow must be less than alertAbove".to_string(),
            ));
        }
    }

    let item = WatchlistItem {
        id: Uuid::new_v4(),
        user_id: auth.user_id,
        symbol,
        alert_above,
        alert_below,
        note: req.note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        created_at: TimeMs::now(),
    };

    if !state.repo.insert_watchlist_item(&item).await? {
        return Err(AppError::BadRequest(format!(
            "{} is already on your watchlist",
            item.symbol
        )));
    }

    Ok(Json(WatchlistItemDto::from(&item)))
}

#[derive(Debug, Serialize)]
pub struct WatchlistResponse {
    pub items: Vec<WatchlistItemDto>,
}

pub async fn list_items(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<WatchlistResponse>, AppError> {
    let items = state.repo.list_watchlist(&auth.user_id).await?;
    Ok(Json(WatchlistResponse {
        items: items.iter().map(WatchlistItemDto::from).collect(),
    }))
}

pub async fn remove_item(
    auth: AuthUser,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let item_id = Uuid::parse_str(&id)
        .map_err(|_| AppError::BadRequest("Invalid watchlist item id".to_string()))?;

    if !state.repo.delete_watchlist_item(&auth.user_id, &item_id).await? {
        return Err(AppError::NotFound("Watchlist item not found".to_string()));
    }
    Ok(Json(serde_json::json!({"deleted": true})))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDto {
    pub item: WatchlistItemDto,
    pub price: String,
}

#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    pub alerts: Vec<AlertDto>,
}

/// Check every watched symbol against its latest price and report the items
/// whose alert bounds are crossed. Symbols with no known price are skipped.
pub async fn check_alerts(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AlertsResponse>, AppError> {
    let items = state.repo.list_watchlist(&auth.user_id).await?;
    let mut alerts = Vec::new();

    for item in &items {
        if item.alert_above.is_none() && item.alert_below.is_none() {
            continue;
        }

        let price = match state.resolve_price(&item.symbol).await {
            Ok(price) => price,
            Err(_) => {
                tracing::debug!(symbol = %item.symbol, "no price for alert check");
                continue;
            }
        };

        if item.alert_triggered(price) {
            alerts.push(AlertDto {
                item: WatchlistItemDto::from(item),
                price: price.to_canonical_string(),
            });
        }
    }

    Ok(Json(AlertsResponse { alerts }))
}
