use crate::domain::model::Coupon;
use crate::domain::ports::CouponStore;
use crate::utils::error::{AppError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Share of the coupon amount returned as the discounted amount.
pub const DISCOUNT_RATE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    NotFound,
    Expired,
}

impl InvalidReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidReason::NotFound => "not found",
            InvalidReason::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CouponCheck {
    Valid { discounted_amount: f64 },
    Invalid(InvalidReason),
}

impl CouponCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, CouponCheck::Valid { .. })
    }
}

impl Serialize for CouponCheck {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("CouponCheck", 2)?;
        match self {
            CouponCheck::Valid { discounted_amount } => {
                s.serialize_field("valid", &true)?;
                s.serialize_field("discountedAmount", discounted_amount)?;
            }
            CouponCheck::Invalid(reason) => {
                s.serialize_field("valid", &false)?;
                s.serialize_field("reason", reason.as_str())?;
            }
        }
        s.end()
    }
}

/// Parses a coupon expiry into the instant it stops being redeemable.
///
/// A bare calendar date means midnight UTC at the start of that day.
pub fn parse_expiry(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::validation(format!("Invalid coupon expiry date: {}", raw)))
}

/// Pure decision over an already fetched coupon. The boundary is inclusive.
pub fn evaluate(coupon: Option<&Coupon>, now: DateTime<Utc>) -> Result<CouponCheck> {
    let Some(coupon) = coupon else {
        return Ok(CouponCheck::Invalid(InvalidReason::NotFound));
    };

    let expires_at = parse_expiry(&coupon.expiry_date)?;
    if now <= expires_at {
        Ok(CouponCheck::Valid {
            discounted_amount: coupon.amount * DISCOUNT_RATE,
        })
    } else {
        Ok(CouponCheck::Invalid(InvalidReason::Expired))
    }
}

pub async fn validate_coupon(
    store: &dyn CouponStore,
    code: &str,
    now: DateTime<Utc>,
) -> Result<CouponCheck> {
    let coupon = store.find_coupon(code).await?;
    let check = evaluate(coupon.as_ref(), now)?;
    tracing::debug!("Coupon {} checked: {:?}", code, check);
    Ok(check)
}
