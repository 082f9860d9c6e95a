pub mod auth;
pub mod coupons;
pub mod extract;
pub mod payments;
pub mod products;
pub mod reviews;
pub mod state;
pub mod users;

use std::time::Duration;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware::from_fn_with_state,
    routing::{get, patch, post, put},
    Router,
};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::config::Settings;
use crate::utils::error::Result;
use auth::{verify_admin, verify_moderator, verify_token};
pub use state::AppState;

async fn health() -> &'static str {
    "tech website server is running"
}

pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(health))
        .route("/jwt", post(auth::issue_token))
        .route("/products", get(products::list_products))
        .route("/products/accepted", get(products::list_accepted))
        .route("/products/featured", get(products::list_featured))
        .route("/products/trending", get(products::list_trending))
        .route("/products/{id}", get(products::get_product))
        .route("/reviews/{product_id}", get(reviews::list_reviews))
        .route("/users", put(users::upsert_user))
        .route("/coupons", get(coupons::list_coupons))
        .route("/coupons/validate", post(coupons::validate_coupon));

    let member = Router::new()
        .route("/products", post(products::create_product))
        .route("/products/mine", get(products::list_mine))
        .route(
            "/products/{id}",
            patch(products::update_product).delete(products::delete_product),
        )
        .route("/products/{id}/upvote", patch(products::upvote_product))
        .route("/products/{id}/report", patch(products::report_product))
        .route("/reviews", post(reviews::create_review))
        .route("/users/{email}/role", get(users::get_role))
        .route("/users/{email}/subscribe", patch(users::subscribe))
        .route("/create-payment-intent", post(payments::create_payment_intent))
        .route_layer(from_fn_with_state(state.clone(), verify_token));

    let moderator = Router::new()
        .route("/products/reported", get(products::list_reported))
        .route("/products/{id}/status", patch(products::set_status))
        .route("/products/{id}/feature", patch(products::feature_product))
        .route_layer(from_fn_with_state(state.clone(), verify_moderator))
        .route_layer(from_fn_with_state(state.clone(), verify_token));

    let admin = Router::new()
        .route("/users", get(users::list_users))
        .route("/users/{email}/role", patch(users::set_role))
        .route("/coupons", post(coupons::create_coupon))
        .route(
            "/coupons/{code}",
            patch(coupons::update_coupon).delete(coupons::delete_coupon),
        )
        .route("/admin/stats", get(users::site_stats))
        .route_layer(from_fn_with_state(state.clone(), verify_admin))
        .route_layer(from_fn_with_state(state.clone(), verify_token));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .merge(public)
        .merge(member)
        .merge(moderator)
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn serve(settings: Settings) -> Result<()> {
    info!("Initializing state...");
    let state = AppState::from_settings(&settings).await?;

    let app = router(state);

    let address = format!("0.0.0.0:{}", settings.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("🚀 tech website server is running on port {}", settings.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
