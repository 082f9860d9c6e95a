mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::TestApp;
use httpmock::prelude::*;
use serde_json::json;
use tech_hunt::domain::model::Role;
use tech_hunt::StripeGateway;

fn date_in(days: i64) -> String {
    (Utc::now() + Duration::days(days))
        .date_naive()
        .format("%Y-%m-%d")
        .to_string()
}

async fn create_coupon(app: &TestApp, admin: &str, code: &str, amount: f64, expiry: &str) {
    let (status, body) = app
        .send(
            Method::POST,
            "/coupons",
            Some(admin),
            Some(json!({
                "code": code,
                "amount": amount,
                "expiryDate": expiry,
                "description": "test coupon",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
}

#[tokio::test]
async fn test_validate_coupon_outcomes() {
    let app = TestApp::new();
    let admin = app.login("admin@example.com", Role::Admin).await;
    create_coupon(&app, &admin, "FRESH", 100.0, &date_in(1)).await;
    create_coupon(&app, &admin, "STALE", 100.0, &date_in(-1)).await;

    let (status, fresh) = app
        .send(
            Method::POST,
            "/coupons/validate",
            None,
            Some(json!({ "code": "FRESH" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fresh, json!({ "valid": true, "discountedAmount": 50.0 }));

    let (_, stale) = app
        .send(
            Method::POST,
            "/coupons/validate",
            None,
            Some(json!({ "code": "STALE" })),
        )
        .await;
    assert_eq!(stale, json!({ "valid": false, "reason": "expired" }));

    let (status, unknown) = app
        .send(
            Method::POST,
            "/coupons/validate",
            None,
            Some(json!({ "code": "XYZ" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unknown, json!({ "valid": false, "reason": "not found" }));
}

#[tokio::test]
async fn test_coupon_code_matches_exactly() {
    let app = TestApp::new();
    let admin = app.login("admin@example.com", Role::Admin).await;
    create_coupon(&app, &admin, " PAD ", 40.0, "2099-12-31").await;
    create_coupon(&app, &admin, "SAVE50", 40.0, "2099-12-31").await;

    let validate = |code: &'static str| {
        app.send(
            Method::POST,
            "/coupons/validate",
            None,
            Some(json!({ "code": code })),
        )
    };

    let (_, padded) = validate(" PAD ").await;
    assert_eq!(padded, json!({ "valid": true, "discountedAmount": 20.0 }));

    let (_, trailing) = validate("SAVE50 ").await;
    assert_eq!(trailing, json!({ "valid": false, "reason": "not found" }));

    let (_, lower) = validate("save50").await;
    assert_eq!(lower, json!({ "valid": false, "reason": "not found" }));
}

#[tokio::test]
async fn test_validate_rejects_malformed_body() {
    let app = TestApp::new();

    let (status, body) = app
        .send(Method::POST, "/coupons/validate", None, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("code"));

    let buyer = app.login("buyer@example.com", Role::User).await;
    let (status, body) = app
        .send(
            Method::POST,
            "/create-payment-intent",
            Some(&buyer),
            Some(json!({ "price": "abc" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_repeated_validation_is_stable() {
    let app = TestApp::new();
    let admin = app.login("admin@example.com", Role::Admin).await;
    create_coupon(&app, &admin, "STEADY", 30.0, "2099-12-31").await;

    let request = || {
        app.send(
            Method::POST,
            "/coupons/validate",
            None,
            Some(json!({ "code": "STEADY" })),
        )
    };
    let (_, first) = request().await;
    let (_, second) = request().await;
    assert_eq!(first, second);
    assert_eq!(first["discountedAmount"], 15.0);
}

#[tokio::test]
async fn test_coupon_management_is_admin_only() {
    let app = TestApp::new();
    let user = app.login("user@example.com", Role::User).await;
    let moderator = app.login("mod@example.com", Role::Moderator).await;
    let admin = app.login("admin@example.com", Role::Admin).await;
    let body = json!({ "code": "NOPE", "amount": 10.0, "expiryDate": "2099-01-01" });

    for token in [&user, &moderator] {
        let (status, _) = app
            .send(Method::POST, "/coupons", Some(token), Some(body.clone()))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    create_coupon(&app, &admin, "YES", 10.0, "2099-01-01").await;

    let (status, _) = app
        .send(Method::POST, "/coupons", Some(&admin), Some(json!({
            "code": "YES", "amount": 20.0, "expiryDate": "2099-01-01"
        })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .send(Method::POST, "/coupons", Some(&admin), Some(json!({
            "code": "BADDATE", "amount": 20.0, "expiryDate": "someday"
        })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = app
        .send(
            Method::PATCH,
            "/coupons/YES",
            Some(&admin),
            Some(json!({ "amount": 40.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["modifiedCount"], 1);

    let (_, listing) = app.send(Method::GET, "/coupons", None, None).await;
    assert_eq!(listing[0]["amount"], 40.0);

    let (status, deleted) = app
        .send(Method::DELETE, "/coupons/YES", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["deletedCount"], 1);
}

#[tokio::test]
async fn test_user_roles_and_stats() {
    let app = TestApp::new();
    let admin = app.login("admin@example.com", Role::Admin).await;

    let (status, body) = app
        .send(
            Method::PUT,
            "/users",
            None,
            Some(json!({ "name": "Newbie", "email": "new@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], true);

    let newbie = app.state.tokens.issue("new@example.com").unwrap();
    let (_, role) = app
        .send(Method::GET, "/users/new@example.com/role", Some(&newbie), None)
        .await;
    assert_eq!(role["role"], "user");

    let (status, _) = app.send(Method::GET, "/users", Some(&newbie), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            Method::PATCH,
            "/users/new@example.com/role",
            Some(&admin),
            Some(json!({ "role": "moderator" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, role) = app
        .send(Method::GET, "/users/new@example.com/role", Some(&newbie), None)
        .await;
    assert_eq!(role["role"], "moderator");

    let (status, stats) = app
        .send(Method::GET, "/admin/stats", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats, json!({ "products": 0, "reviews": 0, "users": 2 }));
}

#[tokio::test]
async fn test_subscribe_only_self() {
    let app = TestApp::new();
    let alice = app.login("alice@example.com", Role::User).await;
    app.login("bob@example.com", Role::User).await;

    let (status, _) = app
        .send(
            Method::PATCH,
            "/users/bob@example.com/subscribe",
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(
            Method::PATCH,
            "/users/alice@example.com/subscribe",
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["modifiedCount"], 1);
}

#[tokio::test]
async fn test_payment_intent_through_provider() {
    let server = MockServer::start();
    let provider = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/payment_intents")
            .x_www_form_urlencoded_tuple("amount", "2500")
            .x_www_form_urlencoded_tuple("currency", "usd");
        then.status(200).json_body(json!({
            "id": "pi_test",
            "client_secret": "pi_test_secret_xyz"
        }));
    });

    let gateway = Arc::new(StripeGateway::new(server.base_url(), "sk_test"));
    let app = TestApp::from_state_fn(|state| state.with_payments(gateway, "usd"));
    let buyer = app.login("buyer@example.com", Role::User).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/create-payment-intent",
            Some(&buyer),
            Some(json!({ "price": 25 })),
        )
        .await;

    provider.assert();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "clientSecret": "pi_test_secret_xyz" }));
}

#[tokio::test]
async fn test_payment_intent_rejects_bad_price_and_missing_provider() {
    let app = TestApp::new();
    let buyer = app.login("buyer@example.com", Role::User).await;

    let (status, _) = app
        .send(
            Method::POST,
            "/create-payment-intent",
            Some(&buyer),
            Some(json!({ "price": -3 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::POST,
            "/create-payment-intent",
            Some(&buyer),
            Some(json!({ "price": 10 })),
        )
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
