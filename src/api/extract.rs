use axum::extract::{rejection::JsonRejection, FromRequest, Request};

use crate::utils::error::AppError;

/// `axum::Json` with body rejections reported as [`AppError`], so a missing
/// field or a wrong type answers `400` with the usual `{"error": ...}` body.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}
