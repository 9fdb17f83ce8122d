//! Plan endpoints: size a leveraged entry or a deleverage for one user.

use crate::api::AppState;
use crate::domain::{Address, BaseUnits};
use crate::error::AppError;
use crate::orchestration::{ClosePlan, CloseRequest, OpenPlan, OpenRequest};
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPlanBody {
    pub user: String,
    pub collateral: String,
    pub borrow: String,
    pub principal: BaseUnits,
    pub leverage_bps: u32,
    pub slippage_bps: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosePlanBody {
    pub user: String,
    pub collateral: String,
    pub borrow: String,
    pub repay_amount: BaseUnits,
    pub collateral_held: BaseUnits,
    pub slippage_bps: Option<u32>,
}

/// A plan stamped with a quote id and the time it was sized.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse<T> {
    pub quote_id: Uuid,
    pub quoted_at_ms: i64,
    #[serde(flatten)]
    pub plan: T,
}

impl<T> QuoteResponse<T> {
    fn stamp(plan: T) -> Self {
        Self {
            quote_id: Uuid::new_v4(),
            quoted_at_ms: chrono::Utc::now().timestamp_millis(),
            plan,
        }
    }
}

pub async fn plan_open(
    State(state): State<AppState>,
    Json(body): Json<OpenPlanBody>,
) -> Result<Json<QuoteResponse<OpenPlan>>, AppError> {
    let user = parse_user(&body.user)?;
    let plan = state
        .planner
        .plan_open(OpenRequest {
            user,
            collateral: body.collateral,
            borrow: body.borrow,
            principal: body.principal,
            leverage_bps: body.leverage_bps,
            slippage_bps: body.slippage_bps,
        })
        .await?;
    Ok(Json(QuoteResponse::stamp(plan)))
}

pub async fn plan_close(
    State(state): State<AppState>,
    Json(body): Json<ClosePlanBody>,
) -> Result<Json<QuoteResponse<ClosePlan>>, AppError> {
    let user = parse_user(&body.user)?;
    let plan = state
        .planner
        .plan_close(CloseRequest {
            user,
            collateral: body.collateral,
            borrow: body.borrow,
            repay_amount: body.repay_amount,
            collateral_held: body.collateral_held,
            slippage_bps: body.slippage_bps,
        })
        .await?;
    Ok(Json(QuoteResponse::stamp(plan)))
}

fn parse_user(user: &str) -> Result<Address, AppError> {
    let hex = user.strip_prefix("0x").unwrap_or_default();
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AppError::BadRequest("Invalid user address".into()));
    }
    Ok(Address::new(user.to_string()))
}
