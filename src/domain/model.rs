use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::error::{AppError, Result};

/// Product identifier: the 24 hex digit form of an ObjectId.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new() -> Self {
        Self(ObjectId::new().to_hex())
    }

    pub fn parse(raw: &str) -> Result<Self> {
        ObjectId::parse_str(raw)
            .map(|oid| Self(oid.to_hex()))
            .map_err(|_| AppError::InvalidId(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Pending => "pending",
            ProductStatus::Accepted => "accepted",
            ProductStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub external_link: Option<String>,
    pub owner: Owner,
    /// Always equal to `voters.len()` once an upvote has been applied.
    #[serde(default)]
    pub votes: i64,
    #[serde(default)]
    pub voters: Vec<String>,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub reported: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Body of a product submission. Everything the server owns (votes, status, flags) is absent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub external_link: Option<String>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub owner_image: Option<String>,
}

impl NewProduct {
    pub fn into_product(self, owner_email: &str, now: DateTime<Utc>) -> Product {
        Product {
            id: ProductId::new(),
            name: self.name,
            image: self.image,
            description: self.description,
            tags: self.tags,
            external_link: self.external_link,
            owner: Owner {
                name: self.owner_name.unwrap_or_default(),
                email: owner_email.to_string(),
                image: self.owner_image,
            },
            votes: 0,
            voters: Vec::new(),
            status: ProductStatus::Pending,
            reported: false,
            featured: false,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub external_link: Option<String>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.image.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.external_link.is_none()
    }

    pub fn apply(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(image) = &self.image {
            product.image = Some(image.clone());
        }
        if let Some(description) = &self.description {
            product.description = description.clone();
        }
        if let Some(tags) = &self.tags {
            product.tags = tags.clone();
        }
        if let Some(link) = &self.external_link {
            product.external_link = Some(link.clone());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductFlag {
    Reported,
    Featured,
}

impl ProductFlag {
    pub fn field(&self) -> &'static str {
        match self {
            ProductFlag::Reported => "reported",
            ProductFlag::Featured => "featured",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub status: Option<ProductStatus>,
    /// 標籤關鍵字，不分大小寫的部分比對
    pub tag: Option<String>,
    pub featured: Option<bool>,
    pub reported: Option<bool>,
    pub owner_email: Option<String>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(status) = self.status {
            if product.status != status {
                return false;
            }
        }
        if let Some(featured) = self.featured {
            if product.featured != featured {
                return false;
            }
        }
        if let Some(reported) = self.reported {
            if product.reported != reported {
                return false;
            }
        }
        if let Some(email) = &self.owner_email {
            if &product.owner.email != email {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            let needle = tag.to_lowercase();
            if !product
                .tags
                .iter()
                .any(|t| t.to_lowercase().contains(&needle))
            {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    #[default]
    Newest,
    MostVoted,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductQuery {
    pub filter: ProductFilter,
    pub sort: ProductSort,
    pub skip: u64,
    pub limit: Option<i64>,
}

/// Outcome of a single-document update, mirroring the store's matched/modified counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub matched_count: u64,
    pub modified_count: u64,
}

impl UpdateOutcome {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn one() -> Self {
        Self {
            matched_count: 1,
            modified_count: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub code: String,
    pub amount: f64,
    /// Calendar date (`YYYY-MM-DD`) or RFC 3339 timestamp.
    pub expiry_date: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponPatch {
    pub amount: Option<f64>,
    pub expiry_date: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub subscribed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: String,
    pub product_id: ProductId,
    pub reviewer_name: String,
    pub reviewer_email: String,
    #[serde(default)]
    pub reviewer_image: Option<String>,
    pub rating: u8,
    #[serde(default)]
    pub description: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub product_id: String,
    pub reviewer_name: String,
    #[serde(default)]
    pub reviewer_image: Option<String>,
    pub rating: u8,
    #[serde(default)]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_product() -> Product {
        NewProduct {
            name: "Rusty Widget".into(),
            image: None,
            description: "A widget".into(),
            tags: vec!["DevTools".into(), "Rust".into()],
            external_link: None,
            owner_name: Some("Ada".into()),
            owner_image: None,
        }
        .into_product("ada@example.com", Utc::now())
    }

    #[test]
    fn test_product_id_rejects_malformed_input() {
        assert!(ProductId::parse("65f1c0ffee0000000000beef").is_ok());
        assert!(matches!(
            ProductId::parse("not-an-id"),
            Err(AppError::InvalidId(_))
        ));
    }

    #[test]
    fn test_new_product_defaults() {
        let product = sample_product();
        assert_eq!(product.status, ProductStatus::Pending);
        assert_eq!(product.votes, 0);
        assert!(product.voters.is_empty());
        assert_eq!(product.owner.email, "ada@example.com");
    }

    #[test]
    fn test_filter_matches_tag_case_insensitively() {
        let product = sample_product();
        let filter = ProductFilter {
            tag: Some("devtool".into()),
            ..Default::default()
        };
        assert!(filter.matches(&product));

        let filter = ProductFilter {
            status: Some(ProductStatus::Accepted),
            ..Default::default()
        };
        assert!(!filter.matches(&product));
    }

    #[test]
    fn test_product_json_shape() {
        let product = sample_product();
        let json = serde_json::to_value(&product).unwrap();
        assert!(json.get("_id").is_some());
        assert_eq!(json["status"], "pending");
        assert!(json["createdAt"].is_i64());
    }
}
