use crate::domain::model::{
    Coupon, CouponPatch, Product, ProductFilter, ProductFlag, ProductId, ProductPatch,
    ProductQuery, ProductSort, ProductStatus, Review, Role, UpdateOutcome, User, UserProfile,
};
use crate::domain::ports::{CouponStore, ProductStore, ReviewStore, UserStore};
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Process-local document store with the same update semantics as the MongoDB adapter.
///
/// Each collection sits behind its own mutex and every operation holds the lock
/// for its whole read-modify-write, which gives the conditional updates the
/// atomicity the voting path relies on.
#[derive(Debug, Default)]
pub struct MemoryStore {
    products: Mutex<Vec<Product>>,
    coupons: Mutex<Vec<Coupon>>,
    users: Mutex<HashMap<String, User>>,
    reviews: Mutex<Vec<Review>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex.lock().map_err(|e| AppError::StoreError {
        message: format!("collection lock poisoned: {}", e),
    })
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn find_products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        let products = lock(&self.products)?;
        let mut found: Vec<Product> = products
            .iter()
            .filter(|p| query.filter.matches(p))
            .cloned()
            .collect();

        match query.sort {
            ProductSort::Newest => found.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            ProductSort::MostVoted => found.sort_by(|a, b| {
                b.votes
                    .cmp(&a.votes)
                    .then_with(|| b.created_at.cmp(&a.created_at))
            }),
        }

        let limit = query
            .limit
            .and_then(|l| usize::try_from(l).ok())
            .unwrap_or(usize::MAX);

        Ok(found
            .into_iter()
            .skip(query.skip as usize)
            .take(limit)
            .collect())
    }

    async fn count_products(&self, filter: &ProductFilter) -> Result<u64> {
        let products = lock(&self.products)?;
        Ok(products.iter().filter(|p| filter.matches(p)).count() as u64)
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>> {
        let products = lock(&self.products)?;
        Ok(products.iter().find(|p| &p.id == id).cloned())
    }

    async fn insert_product(&self, product: &Product) -> Result<()> {
        let mut products = lock(&self.products)?;
        if products.iter().any(|p| p.id == product.id) {
            return Err(AppError::Conflict(format!("product {} already exists", product.id)));
        }
        products.push(product.clone());
        Ok(())
    }

    async fn update_product(&self, id: &ProductId, patch: &ProductPatch) -> Result<UpdateOutcome> {
        let mut products = lock(&self.products)?;
        let Some(product) = products.iter_mut().find(|p| &p.id == id) else {
            return Ok(UpdateOutcome::none());
        };

        let before = product.clone();
        patch.apply(product);
        Ok(UpdateOutcome {
            matched_count: 1,
            modified_count: u64::from(*product != before),
        })
    }

    async fn set_status(&self, id: &ProductId, status: ProductStatus) -> Result<UpdateOutcome> {
        let mut products = lock(&self.products)?;
        let Some(product) = products.iter_mut().find(|p| &p.id == id) else {
            return Ok(UpdateOutcome::none());
        };

        let modified = product.status != status;
        product.status = status;
        Ok(UpdateOutcome {
            matched_count: 1,
            modified_count: u64::from(modified),
        })
    }

    async fn set_flag(&self, id: &ProductId, flag: ProductFlag) -> Result<UpdateOutcome> {
        let mut products = lock(&self.products)?;
        let Some(product) = products.iter_mut().find(|p| &p.id == id) else {
            return Ok(UpdateOutcome::none());
        };

        let slot = match flag {
            ProductFlag::Reported => &mut product.reported,
            ProductFlag::Featured => &mut product.featured,
        };
        let modified = !*slot;
        *slot = true;
        Ok(UpdateOutcome {
            matched_count: 1,
            modified_count: u64::from(modified),
        })
    }

    async fn add_vote_if_absent(&self, id: &ProductId, voter: &str) -> Result<UpdateOutcome> {
        let mut products = lock(&self.products)?;
        let candidate = products
            .iter_mut()
            .find(|p| &p.id == id && !p.voters.iter().any(|v| v == voter));

        match candidate {
            Some(product) => {
                product.votes += 1;
                product.voters.push(voter.to_string());
                Ok(UpdateOutcome::one())
            }
            None => Ok(UpdateOutcome::none()),
        }
    }

    async fn delete_product(&self, id: &ProductId) -> Result<u64> {
        let mut products = lock(&self.products)?;
        let before = products.len();
        products.retain(|p| &p.id != id);
        Ok((before - products.len()) as u64)
    }
}

#[async_trait]
impl CouponStore for MemoryStore {
    async fn find_coupon(&self, code: &str) -> Result<Option<Coupon>> {
        let coupons = lock(&self.coupons)?;
        Ok(coupons.iter().find(|c| c.code == code).cloned())
    }

    async fn list_coupons(&self) -> Result<Vec<Coupon>> {
        Ok(lock(&self.coupons)?.clone())
    }

    async fn insert_coupon(&self, coupon: &Coupon) -> Result<()> {
        let mut coupons = lock(&self.coupons)?;
        if coupons.iter().any(|c| c.code == coupon.code) {
            return Err(AppError::Conflict(format!(
                "coupon {} already exists",
                coupon.code
            )));
        }
        coupons.push(coupon.clone());
        Ok(())
    }

    async fn update_coupon(&self, code: &str, patch: &CouponPatch) -> Result<UpdateOutcome> {
        let mut coupons = lock(&self.coupons)?;
        let Some(coupon) = coupons.iter_mut().find(|c| c.code == code) else {
            return Ok(UpdateOutcome::none());
        };

        let before = coupon.clone();
        if let Some(amount) = patch.amount {
            coupon.amount = amount;
        }
        if let Some(expiry) = &patch.expiry_date {
            coupon.expiry_date = expiry.clone();
        }
        if let Some(description) = &patch.description {
            coupon.description = description.clone();
        }
        Ok(UpdateOutcome {
            matched_count: 1,
            modified_count: u64::from(*coupon != before),
        })
    }

    async fn delete_coupon(&self, code: &str) -> Result<u64> {
        let mut coupons = lock(&self.coupons)?;
        let before = coupons.len();
        coupons.retain(|c| c.code != code);
        Ok((before - coupons.len()) as u64)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, email: &str) -> Result<Option<User>> {
        Ok(lock(&self.users)?.get(email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let users = lock(&self.users)?;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(all)
    }

    async fn upsert_user(&self, profile: &UserProfile) -> Result<bool> {
        let mut users = lock(&self.users)?;
        match users.get_mut(&profile.email) {
            Some(existing) => {
                existing.name = profile.name.clone();
                if let Some(image) = &profile.image {
                    existing.image = Some(image.clone());
                }
                Ok(false)
            }
            None => {
                users.insert(
                    profile.email.clone(),
                    User {
                        name: profile.name.clone(),
                        email: profile.email.clone(),
                        image: profile.image.clone(),
                        role: Role::User,
                        subscribed: false,
                    },
                );
                Ok(true)
            }
        }
    }

    async fn set_role(&self, email: &str, role: Role) -> Result<UpdateOutcome> {
        let mut users = lock(&self.users)?;
        let Some(user) = users.get_mut(email) else {
            return Ok(UpdateOutcome::none());
        };

        let modified = user.role != role;
        user.role = role;
        Ok(UpdateOutcome {
            matched_count: 1,
            modified_count: u64::from(modified),
        })
    }

    async fn set_subscribed(&self, email: &str) -> Result<UpdateOutcome> {
        let mut users = lock(&self.users)?;
        let Some(user) = users.get_mut(email) else {
            return Ok(UpdateOutcome::none());
        };

        let modified = !user.subscribed;
        user.subscribed = true;
        Ok(UpdateOutcome {
            matched_count: 1,
            modified_count: u64::from(modified),
        })
    }

    async fn count_users(&self) -> Result<u64> {
        Ok(lock(&self.users)?.len() as u64)
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn reviews_for(&self, product_id: &ProductId) -> Result<Vec<Review>> {
        let reviews = lock(&self.reviews)?;
        let mut found: Vec<Review> = reviews
            .iter()
            .filter(|r| &r.product_id == product_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn insert_review(&self, review: &Review) -> Result<()> {
        lock(&self.reviews)?.push(review.clone());
        Ok(())
    }

    async fn count_reviews(&self) -> Result<u64> {
        Ok(lock(&self.reviews)?.len() as u64)
    }
}
