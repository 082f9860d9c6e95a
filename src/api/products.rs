use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::auth::Caller;
use super::extract::JsonBody;
use super::state::AppState;
use crate::core::access::{ensure_capability, Capability};
use crate::core::voting::{self, UpvoteOutcome};
use crate::domain::model::{
    NewProduct, Product, ProductFilter, ProductFlag, ProductId, ProductPatch, ProductQuery,
    ProductSort, ProductStatus, UpdateOutcome,
};
use crate::utils::error::{AppError, Result};
use crate::utils::validation::require_text;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;
const TRENDING_LIMIT: i64 = 6;

#[derive(Debug, Default, Deserialize)]
pub struct AcceptedParams {
    pub search: Option<String>,
    pub page: Option<u64>,
    pub size: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: u64,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: ProductStatus,
}

async fn load(state: &AppState, raw_id: &str) -> Result<(ProductId, Product)> {
    let id = ProductId::parse(raw_id)?;
    let product = state
        .products
        .get_product(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {}", id)))?;
    Ok((id, product))
}

pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = state
        .products
        .find_products(&ProductQuery::default())
        .await?;
    Ok(Json(products))
}

pub async fn list_accepted(
    State(state): State<AppState>,
    Query(params): Query<AcceptedParams>,
) -> Result<Json<ProductPage>> {
    let size = params.size.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&size) {
        return Err(AppError::validation(format!(
            "size must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }

    let filter = ProductFilter {
        status: Some(ProductStatus::Accepted),
        tag: params.search.filter(|s| !s.trim().is_empty()),
        ..Default::default()
    };
    let page = params.page.unwrap_or(0);

    let total = state.products.count_products(&filter).await?;
    let products = state
        .products
        .find_products(&ProductQuery {
            filter,
            sort: ProductSort::Newest,
            skip: page.saturating_mul(size as u64),
            limit: Some(size),
        })
        .await?;

    Ok(Json(ProductPage { products, total }))
}

pub async fn list_featured(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let query = ProductQuery {
        filter: ProductFilter {
            featured: Some(true),
            ..Default::default()
        },
        ..Default::default()
    };
    Ok(Json(state.products.find_products(&query).await?))
}

pub async fn list_trending(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let query = ProductQuery {
        filter: ProductFilter {
            status: Some(ProductStatus::Accepted),
            ..Default::default()
        },
        sort: ProductSort::MostVoted,
        skip: 0,
        limit: Some(TRENDING_LIMIT),
    };
    Ok(Json(state.products.find_products(&query).await?))
}

pub async fn list_reported(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let query = ProductQuery {
        filter: ProductFilter {
            reported: Some(true),
            ..Default::default()
        },
        ..Default::default()
    };
    Ok(Json(state.products.find_products(&query).await?))
}

pub async fn list_mine(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Product>>> {
    let query = ProductQuery {
        filter: ProductFilter {
            owner_email: Some(caller.email.clone()),
            ..Default::default()
        },
        ..Default::default()
    };
    Ok(Json(state.products.find_products(&query).await?))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let (_, product) = load(&state, &id).await?;
    Ok(Json(product))
}

pub async fn create_product(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(body): JsonBody<NewProduct>,
) -> Result<(StatusCode, Json<Value>)> {
    require_text("name", &body.name)?;

    let product = body.into_product(&caller.email, Utc::now());
    state.products.insert_product(&product).await?;
    tracing::info!("📦 {} submitted product {} ({})", caller.email, product.name, product.id);

    Ok((StatusCode::CREATED, Json(json!({ "insertedId": product.id }))))
}

pub async fn update_product(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<ProductPatch>,
) -> Result<Json<UpdateOutcome>> {
    if patch.is_empty() {
        return Err(AppError::validation("no fields to update"));
    }
    if let Some(name) = &patch.name {
        require_text("name", name)?;
    }

    let (id, product) = load(&state, &id).await?;
    if product.owner.email != caller.email {
        return Err(AppError::Forbidden("only the owner can edit a product".into()));
    }

    Ok(Json(state.products.update_product(&id, &patch).await?))
}

pub async fn upvote_product(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<UpvoteOutcome>> {
    let id = ProductId::parse(&id)?;
    let outcome = voting::upvote(state.products.as_ref(), &id, &caller.email).await?;
    Ok(Json(outcome))
}

pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<StatusBody>,
) -> Result<Json<UpdateOutcome>> {
    if body.status == ProductStatus::Pending {
        return Err(AppError::validation("status must be accepted or rejected"));
    }
    let id = ProductId::parse(&id)?;
    let outcome = state.products.set_status(&id, body.status).await?;
    tracing::info!("Product {} marked {}", id, body.status.as_str());
    Ok(Json(outcome))
}

pub async fn feature_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UpdateOutcome>> {
    let id = ProductId::parse(&id)?;
    Ok(Json(state.products.set_flag(&id, ProductFlag::Featured).await?))
}

pub async fn report_product(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<UpdateOutcome>> {
    let id = ProductId::parse(&id)?;
    tracing::info!("🚩 {} reported product {}", caller.email, id);
    Ok(Json(state.products.set_flag(&id, ProductFlag::Reported).await?))
}

/// Owners delete their own products; anyone else needs moderation rights.
pub async fn delete_product(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let (id, product) = load(&state, &id).await?;
    if product.owner.email != caller.email {
        ensure_capability(
            state.users.as_ref(),
            &caller.email,
            Capability::ModerateProducts,
        )
        .await?;
    }

    let deleted = state.products.delete_product(&id).await?;
    tracing::info!("🗑️ Product {} deleted by {}", id, caller.email);
    Ok(Json(json!({ "deletedCount": deleted })))
}
