use crate::domain::model::{
    Coupon, CouponPatch, Product, ProductFilter, ProductFlag, ProductId, ProductPatch,
    ProductQuery, ProductSort, ProductStatus, Review, Role, UpdateOutcome, User, UserProfile,
};
use crate::domain::ports::{CouponStore, ProductStore, ReviewStore, UserStore};
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::results::UpdateResult;
use mongodb::{Client, Collection, Database, IndexModel};

const PRODUCTS: &str = "products";
const COUPONS: &str = "coupons";
const USERS: &str = "users";
const REVIEWS: &str = "reviews";

const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, Clone)]
pub struct MongoStore {
    products: Collection<Product>,
    coupons: Collection<Coupon>,
    users: Collection<User>,
    reviews: Collection<Review>,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri).await?;
        let db = client.database(database);

        db.run_command(doc! { "ping": 1 }).await?;
        tracing::info!("🍃 Connected to MongoDB database '{}'", database);

        let store = Self::from_database(&db);
        store.ensure_indexes().await?;
        Ok(store)
    }

    pub fn from_database(db: &Database) -> Self {
        Self {
            products: db.collection(PRODUCTS),
            coupons: db.collection(COUPONS),
            users: db.collection(USERS),
            reviews: db.collection(REVIEWS),
        }
    }

    /// Unique keys back the `Conflict` behavior of coupon inserts and user upserts.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let unique = || IndexOptions::builder().unique(true).build();

        self.coupons
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "code": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;
        self.users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;
        self.reviews
            .create_index(IndexModel::builder().keys(doc! { "productId": 1 }).build())
            .await?;

        tracing::debug!("MongoDB indexes ensured");
        Ok(())
    }
}

fn outcome(result: UpdateResult) -> UpdateOutcome {
    UpdateOutcome {
        matched_count: result.matched_count,
        modified_count: result.modified_count,
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

pub(crate) fn filter_document(filter: &ProductFilter) -> Document {
    let mut doc = Document::new();
    if let Some(status) = filter.status {
        doc.insert("status", status.as_str());
    }
    if let Some(featured) = filter.featured {
        doc.insert("featured", featured);
    }
    if let Some(reported) = filter.reported {
        doc.insert("reported", reported);
    }
    if let Some(email) = &filter.owner_email {
        doc.insert("owner.email", email.as_str());
    }
    if let Some(tag) = &filter.tag {
        // 使用者輸入要先跳脫再當成正規表達式
        doc.insert(
            "tags",
            doc! { "$regex": regex::escape(tag), "$options": "i" },
        );
    }
    doc
}

pub(crate) fn sort_document(sort: ProductSort) -> Document {
    match sort {
        ProductSort::Newest => doc! { "createdAt": -1 },
        ProductSort::MostVoted => doc! { "votes": -1, "createdAt": -1 },
    }
}

/// Filter and update of the conditional upvote, kept together so they are
/// always sent as one `update_one`.
pub(crate) fn upvote_documents(id: &ProductId, voter: &str) -> (Document, Document) {
    let filter = doc! { "_id": id.as_str(), "voters": { "$ne": voter } };
    let update = doc! {
        "$inc": { "votes": 1_i64 },
        "$addToSet": { "voters": voter },
    };
    (filter, update)
}

#[async_trait]
impl ProductStore for MongoStore {
    async fn find_products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        let mut action = self
            .products
            .find(filter_document(&query.filter))
            .sort(sort_document(query.sort))
            .skip(query.skip);
        if let Some(limit) = query.limit {
            action = action.limit(limit);
        }

        let cursor = action.await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count_products(&self, filter: &ProductFilter) -> Result<u64> {
        Ok(self
            .products
            .count_documents(filter_document(filter))
            .await?)
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>> {
        Ok(self.products.find_one(doc! { "_id": id.as_str() }).await?)
    }

    async fn insert_product(&self, product: &Product) -> Result<()> {
        self.products.insert_one(product).await.map_err(|e| {
            if is_duplicate_key(&e) {
                AppError::Conflict(format!("product {} already exists", product.id))
            } else {
                e.into()
            }
        })?;
        Ok(())
    }

    async fn update_product(&self, id: &ProductId, patch: &ProductPatch) -> Result<UpdateOutcome> {
        let mut set = Document::new();
        if let Some(name) = &patch.name {
            set.insert("name", name.as_str());
        }
        if let Some(image) = &patch.image {
            set.insert("image", image.as_str());
        }
        if let Some(description) = &patch.description {
            set.insert("description", description.as_str());
        }
        if let Some(tags) = &patch.tags {
            set.insert("tags", tags.clone());
        }
        if let Some(link) = &patch.external_link {
            set.insert("externalLink", link.as_str());
        }

        let result = self
            .products
            .update_one(doc! { "_id": id.as_str() }, doc! { "$set": set })
            .await?;
        Ok(outcome(result))
    }

    async fn set_status(&self, id: &ProductId, status: ProductStatus) -> Result<UpdateOutcome> {
        let result = self
            .products
            .update_one(
                doc! { "_id": id.as_str() },
                doc! { "$set": { "status": status.as_str() } },
            )
            .await?;
        Ok(outcome(result))
    }

    async fn set_flag(&self, id: &ProductId, flag: ProductFlag) -> Result<UpdateOutcome> {
        let mut set = Document::new();
        set.insert(flag.field(), true);

        let result = self
            .products
            .update_one(doc! { "_id": id.as_str() }, doc! { "$set": set })
            .await?;
        Ok(outcome(result))
    }

    async fn add_vote_if_absent(&self, id: &ProductId, voter: &str) -> Result<UpdateOutcome> {
        let (filter, update) = upvote_documents(id, voter);
        let result = self.products.update_one(filter, update).await?;
        Ok(outcome(result))
    }

    async fn delete_product(&self, id: &ProductId) -> Result<u64> {
        let result = self
            .products
            .delete_one(doc! { "_id": id.as_str() })
            .await?;
        Ok(result.deleted_count)
    }
}

#[async_trait]
impl CouponStore for MongoStore {
    async fn find_coupon(&self, code: &str) -> Result<Option<Coupon>> {
        Ok(self.coupons.find_one(doc! { "code": code }).await?)
    }

    async fn list_coupons(&self) -> Result<Vec<Coupon>> {
        let cursor = self.coupons.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_coupon(&self, coupon: &Coupon) -> Result<()> {
        self.coupons.insert_one(coupon).await.map_err(|e| {
            if is_duplicate_key(&e) {
                AppError::Conflict(format!("coupon {} already exists", coupon.code))
            } else {
                e.into()
            }
        })?;
        Ok(())
    }

    async fn update_coupon(&self, code: &str, patch: &CouponPatch) -> Result<UpdateOutcome> {
        let mut set = Document::new();
        if let Some(amount) = patch.amount {
            set.insert("amount", amount);
        }
        if let Some(expiry) = &patch.expiry_date {
            set.insert("expiryDate", expiry.as_str());
        }
        if let Some(description) = &patch.description {
            set.insert("description", description.as_str());
        }

        let result = self
            .coupons
            .update_one(doc! { "code": code }, doc! { "$set": set })
            .await?;
        Ok(outcome(result))
    }

    async fn delete_coupon(&self, code: &str) -> Result<u64> {
        let result = self.coupons.delete_one(doc! { "code": code }).await?;
        Ok(result.deleted_count)
    }
}

#[async_trait]
impl UserStore for MongoStore {
    async fn get_user(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users.find_one(doc! { "email": email }).await?)
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let cursor = self.users.find(doc! {}).sort(doc! { "email": 1 }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn upsert_user(&self, profile: &UserProfile) -> Result<bool> {
        let mut set = doc! { "name": profile.name.as_str() };
        if let Some(image) = &profile.image {
            set.insert("image", image.as_str());
        }

        let result = self
            .users
            .update_one(
                doc! { "email": profile.email.as_str() },
                doc! {
                    "$set": set,
                    "$setOnInsert": { "role": "user", "subscribed": false },
                },
            )
            .upsert(true)
            .await?;
        Ok(result.upserted_id.is_some())
    }

    async fn set_role(&self, email: &str, role: Role) -> Result<UpdateOutcome> {
        let role = mongodb::bson::to_bson(&role).map_err(|e| AppError::StoreError {
            message: e.to_string(),
        })?;
        let result = self
            .users
            .update_one(doc! { "email": email }, doc! { "$set": { "role": role } })
            .await?;
        Ok(outcome(result))
    }

    async fn set_subscribed(&self, email: &str) -> Result<UpdateOutcome> {
        let result = self
            .users
            .update_one(
                doc! { "email": email },
                doc! { "$set": { "subscribed": true } },
            )
            .await?;
        Ok(outcome(result))
    }

    async fn count_users(&self) -> Result<u64> {
        Ok(self.users.count_documents(doc! {}).await?)
    }
}

#[async_trait]
impl ReviewStore for MongoStore {
    async fn reviews_for(&self, product_id: &ProductId) -> Result<Vec<Review>> {
        let cursor = self
            .reviews
            .find(doc! { "productId": product_id.as_str() })
            .sort(doc! { "createdAt": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_review(&self, review: &Review) -> Result<()> {
        self.reviews.insert_one(review).await?;
        Ok(())
    }

    async fn count_reviews(&self) -> Result<u64> {
        Ok(self.reviews.count_documents(doc! {}).await?)
    }
}
