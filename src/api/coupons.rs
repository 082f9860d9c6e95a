use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use super::extract::JsonBody;
use super::state::AppState;
use crate::core::coupon::{self, CouponCheck};
use crate::domain::model::{Coupon, CouponPatch, UpdateOutcome};
use crate::utils::error::{AppError, Result};
use crate::utils::validation::require_text;

#[derive(Debug, Deserialize)]
pub struct ValidateBody {
    pub code: String,
}

fn check_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::validation("amount must be a positive number"));
    }
    Ok(())
}

pub async fn list_coupons(State(state): State<AppState>) -> Result<Json<Vec<Coupon>>> {
    Ok(Json(state.coupons.list_coupons().await?))
}

pub async fn create_coupon(
    State(state): State<AppState>,
    JsonBody(coupon): JsonBody<Coupon>,
) -> Result<(StatusCode, Json<Value>)> {
    require_text("code", &coupon.code)?;
    check_amount(coupon.amount)?;
    coupon::parse_expiry(&coupon.expiry_date)?;

    state.coupons.insert_coupon(&coupon).await?;
    tracing::info!("🎟️ Coupon {} created", coupon.code);
    Ok((StatusCode::CREATED, Json(json!({ "code": coupon.code }))))
}

pub async fn update_coupon(
    State(state): State<AppState>,
    Path(code): Path<String>,
    JsonBody(patch): JsonBody<CouponPatch>,
) -> Result<Json<UpdateOutcome>> {
    if patch.amount.is_none() && patch.expiry_date.is_none() && patch.description.is_none() {
        return Err(AppError::validation("no fields to update"));
    }
    if let Some(amount) = patch.amount {
        check_amount(amount)?;
    }
    if let Some(expiry) = &patch.expiry_date {
        coupon::parse_expiry(expiry)?;
    }

    Ok(Json(state.coupons.update_coupon(&code, &patch).await?))
}

pub async fn delete_coupon(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Value>> {
    let deleted = state.coupons.delete_coupon(&code).await?;
    Ok(Json(json!({ "deletedCount": deleted })))
}

pub async fn validate_coupon(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<ValidateBody>,
) -> Result<Json<CouponCheck>> {
    let check = coupon::validate_coupon(state.coupons.as_ref(), &body.code, Utc::now()).await?;
    Ok(Json(check))
}
