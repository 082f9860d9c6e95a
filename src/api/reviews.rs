use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use serde_json::{json, Value};

use super::auth::Caller;
use super::extract::JsonBody;
use super::state::AppState;
use crate::domain::model::{NewReview, ProductId, Review};
use crate::utils::error::{AppError, Result};
use crate::utils::validation::require_text;

pub async fn list_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<Vec<Review>>> {
    let product_id = ProductId::parse(&product_id)?;
    Ok(Json(state.reviews.reviews_for(&product_id).await?))
}

pub async fn create_review(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(body): JsonBody<NewReview>,
) -> Result<(StatusCode, Json<Value>)> {
    require_text("reviewerName", &body.reviewer_name)?;
    if !(1..=5).contains(&body.rating) {
        return Err(AppError::validation("rating must be between 1 and 5"));
    }

    let product_id = ProductId::parse(&body.product_id)?;
    if state.products.get_product(&product_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Product {}", product_id)));
    }

    let review = Review {
        id: ObjectId::new().to_hex(),
        product_id,
        reviewer_name: body.reviewer_name,
        reviewer_email: caller.email.clone(),
        reviewer_image: body.reviewer_image,
        rating: body.rating,
        description: body.description,
        created_at: Utc::now(),
    };
    state.reviews.insert_review(&review).await?;
    tracing::debug!("Review {} added to product {}", review.id, review.product_id);

    Ok((StatusCode::CREATED, Json(json!({ "insertedId": review.id }))))
}
