use crate::domain::model::{
    Coupon, CouponPatch, Product, ProductFilter, ProductFlag, ProductId, ProductPatch,
    ProductQuery, ProductStatus, Review, Role, UpdateOutcome, User, UserProfile,
};
use crate::utils::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find_products(&self, query: &ProductQuery) -> Result<Vec<Product>>;
    async fn count_products(&self, filter: &ProductFilter) -> Result<u64>;
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>>;
    async fn insert_product(&self, product: &Product) -> Result<()>;
    async fn update_product(&self, id: &ProductId, patch: &ProductPatch) -> Result<UpdateOutcome>;
    async fn set_status(&self, id: &ProductId, status: ProductStatus) -> Result<UpdateOutcome>;
    async fn set_flag(&self, id: &ProductId, flag: ProductFlag) -> Result<UpdateOutcome>;

    /// Atomic conditional update: increments `votes` and adds `voter` to `voters`
    /// only when `voter` is not yet a member. Nothing can interleave between the
    /// membership check and the write.
    async fn add_vote_if_absent(&self, id: &ProductId, voter: &str) -> Result<UpdateOutcome>;

    async fn delete_product(&self, id: &ProductId) -> Result<u64>;
}

#[async_trait]
pub trait CouponStore: Send + Sync {
    async fn find_coupon(&self, code: &str) -> Result<Option<Coupon>>;
    async fn list_coupons(&self) -> Result<Vec<Coupon>>;
    /// Fails with `Conflict` when the code already exists.
    async fn insert_coupon(&self, coupon: &Coupon) -> Result<()>;
    async fn update_coupon(&self, code: &str, patch: &CouponPatch) -> Result<UpdateOutcome>;
    async fn delete_coupon(&self, code: &str) -> Result<u64>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, email: &str) -> Result<Option<User>>;
    async fn list_users(&self) -> Result<Vec<User>>;
    /// Inserts the user with the default role, or refreshes name/image and keeps the role.
    /// Returns `true` when a new document was created.
    async fn upsert_user(&self, profile: &UserProfile) -> Result<bool>;
    async fn set_role(&self, email: &str, role: Role) -> Result<UpdateOutcome>;
    async fn set_subscribed(&self, email: &str) -> Result<UpdateOutcome>;
    async fn count_users(&self) -> Result<u64>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn reviews_for(&self, product_id: &ProductId) -> Result<Vec<Review>>;
    async fn insert_review(&self, review: &Review) -> Result<()>;
    async fn count_reviews(&self) -> Result<u64>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// `amount` is in the currency's smallest unit (cents).
    async fn create_payment_intent(&self, amount: i64, currency: &str) -> Result<PaymentIntent>;
}
