use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::auth::Caller;
use super::extract::JsonBody;
use super::state::AppState;
use crate::utils::error::{AppError, Result};

#[derive(Debug, Deserialize)]
pub struct IntentRequest {
    pub price: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentResponse {
    pub client_secret: String,
}

/// Converts a price in major units to the provider's integer minor units.
pub fn to_minor_units(price: f64) -> Result<i64> {
    if !price.is_finite() || price <= 0.0 {
        return Err(AppError::validation("price must be a positive number"));
    }
    let cents = (price * 100.0).round();
    if cents < 1.0 || cents > i64::MAX as f64 {
        return Err(AppError::validation("price is out of range"));
    }
    Ok(cents as i64)
}

pub async fn create_payment_intent(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(body): JsonBody<IntentRequest>,
) -> Result<Json<IntentResponse>> {
    let amount = to_minor_units(body.price)?;
    let gateway = state.payment_gateway()?;

    tracing::info!("💳 {} requested a payment of {} {}", caller.email, amount, state.currency);
    let intent = gateway.create_payment_intent(amount, &state.currency).await?;

    Ok(Json(IntentResponse {
        client_secret: intent.client_secret,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_minor_units() {
        assert_eq!(to_minor_units(19.99).unwrap(), 1999);
        assert_eq!(to_minor_units(0.1 + 0.2).unwrap(), 30);
        assert!(to_minor_units(0.0).is_err());
        assert!(to_minor_units(-5.0).is_err());
        assert!(to_minor_units(f64::NAN).is_err());
        assert!(to_minor_units(0.001).is_err());
    }
}
