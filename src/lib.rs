pub mod adapters;
pub mod api;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::ServeArgs;

pub use adapters::{MemoryStore, MongoStore, StripeGateway};
pub use api::{router, serve, AppState};
pub use config::{Settings, StoreKind};
pub use core::coupon::{validate_coupon, CouponCheck, InvalidReason};
pub use core::voting::{upvote, UpvoteOutcome};
pub use utils::error::{AppError, Result};
