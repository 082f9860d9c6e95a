pub mod access;
pub mod coupon;
pub mod voting;

pub use crate::domain::model::{Coupon, Product, ProductId, Role, UpdateOutcome, User};
pub use crate::domain::ports::{CouponStore, PaymentGateway, ProductStore, ReviewStore, UserStore};
pub use crate::utils::error::Result;
