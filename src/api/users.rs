use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::auth::Caller;
use super::extract::JsonBody;
use super::state::AppState;
use crate::domain::model::{ProductFilter, Role, UpdateOutcome, User, UserProfile};
use crate::utils::error::{AppError, Result};
use crate::utils::validation::require_text;

#[derive(Debug, Deserialize)]
pub struct RoleBody {
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct SiteStats {
    pub products: u64,
    pub reviews: u64,
    pub users: u64,
}

pub async fn upsert_user(
    State(state): State<AppState>,
    JsonBody(profile): JsonBody<UserProfile>,
) -> Result<Json<Value>> {
    require_text("email", &profile.email)?;
    require_text("name", &profile.name)?;

    let created = state.users.upsert_user(&profile).await?;
    if created {
        tracing::info!("👤 New user {}", profile.email);
    }
    Ok(Json(json!({ "created": created })))
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>> {
    Ok(Json(state.users.list_users().await?))
}

/// Unknown users report the default role rather than an error.
pub async fn get_role(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<RoleResponse>> {
    let role = state
        .users
        .get_user(&email)
        .await?
        .map(|u| u.role)
        .unwrap_or_default();
    Ok(Json(RoleResponse { role }))
}

pub async fn set_role(
    State(state): State<AppState>,
    caller: Caller,
    Path(email): Path<String>,
    JsonBody(body): JsonBody<RoleBody>,
) -> Result<Json<UpdateOutcome>> {
    let outcome = state.users.set_role(&email, body.role).await?;
    if outcome.matched_count == 0 {
        return Err(AppError::NotFound(format!("User {}", email)));
    }
    tracing::info!("🔑 {} set role of {} to {:?}", caller.email, email, body.role);
    Ok(Json(outcome))
}

pub async fn subscribe(
    State(state): State<AppState>,
    caller: Caller,
    Path(email): Path<String>,
) -> Result<Json<UpdateOutcome>> {
    if caller.email != email {
        return Err(AppError::Forbidden(
            "users can only update their own subscription".into(),
        ));
    }
    Ok(Json(state.users.set_subscribed(&email).await?))
}

pub async fn site_stats(State(state): State<AppState>) -> Result<Json<SiteStats>> {
    let products = state
        .products
        .count_products(&ProductFilter::default())
        .await?;
    let reviews = state.reviews.count_reviews().await?;
    let users = state.users.count_users().await?;

    Ok(Json(SiteStats {
        products,
        reviews,
        users,
    }))
}
