use authgate::{
    app_router,
    middleware::RateLimiter,
    repositories::SqliteUserRepository,
    services::{AuthService, UserService},
    test_utils::test_helpers,
    AppState,
};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

async fn test_app_with_limiter(limiter: RateLimiter) -> Router {
    let pool = test_helpers::create_test_db().await.unwrap();
    let token_issuer = Arc::new(test_helpers::create_test_issuer());

    let user_service = Arc::new(UserService::new(Arc::new(SqliteUserRepository::new(
        pool.clone(),
    ))));
    let auth_service = Arc::new(AuthService::new(
        user_service.clone(),
        token_issuer.clone(),
    ));

    let state = AppState {
        user_service,
        auth_service,
        token_issuer,
        pool,
    };

    app_router(state, limiter)
}

async fn test_app() -> Router {
    // Wide-open limiter so unrelated tests never trip it
    test_app_with_limiter(RateLimiter::new(10_000, Duration::from_secs(6))).await
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn register(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            json!({ "email": email, "password": password }),
        ))
        .await
        .unwrap();

    let status = response.status();
    (status, body_json(response).await)
}

#[tokio::test]
async fn register_returns_201_without_password_field() {
    let app = test_app().await;

    let (status, body) = register(&app, "test@test.com", "secret1").await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "test@test.com");
    assert_eq!(body["user"]["roles"], json!(["USER"]));
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["access_token"].as_str().unwrap().contains('.'));
}

#[tokio::test]
async fn duplicate_registration_returns_409() {
    let app = test_app().await;

    let (first, _) = register(&app, "test@test.com", "secret1").await;
    assert_eq!(first, StatusCode::CREATED);

    let (second, body) = register(&app, "test@test.com", "secret1").await;
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(body["error"], "User with this email already exists");
}

#[tokio::test]
async fn invalid_registration_returns_400() {
    let app = test_app().await;

    let (status, _) = register(&app, "no-at-sign", "secret1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = register(&app, "ok@example.com", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_maps_bad_credentials_to_401() {
    let app = test_app().await;
    register(&app, "test@test.com", "secret1").await;

    // Wrong password and unknown email produce the same status and body.
    for (email, password) in [("test@test.com", "wrong"), ("ghost@test.com", "secret1")] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/auth/login",
                json!({ "email": email, "password": password }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid credentials");
    }
}

#[tokio::test]
async fn login_round_trip_returns_token_with_matching_subject() {
    let app = test_app().await;
    let (_, registered) = register(&app, "test@test.com", "secret1").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({ "email": "test@test.com", "password": "secret1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["id"], registered["user"]["id"]);

    let issuer = test_helpers::create_test_issuer();
    let claims = issuer
        .verify(body["access_token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.sub, registered["user"]["id"].as_i64().unwrap());
    assert_eq!(claims.email, "test@test.com");
}

#[tokio::test]
async fn profile_requires_a_bearer_token() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/auth/profile")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/auth/profile")
                .header(header::AUTHORIZATION, "Bearer not-a-real-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_returns_the_authenticated_user() {
    let app = test_app().await;
    let (_, registered) = register(&app, "test@test.com", "secret1").await;
    let token = registered["access_token"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/auth/profile")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["email"], "test@test.com");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn user_directory_supports_paged_listing() {
    let app = test_app().await;

    let mut token = String::new();
    for i in 0..25 {
        let (_, body) = register(&app, &format!("user{:02}@test.com", i), "secret1").await;
        token = body["access_token"].as_str().unwrap().to_string();
    }

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/users?page=2&limit=10")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["users"].as_array().unwrap().len(), 10);
    assert_eq!(body["total"], 25);
    assert_eq!(body["page"], 2);
    assert_eq!(body["total_pages"], 3);

    // An absurd page straight from the query string still answers 200 with
    // an empty page rather than tripping on the offset arithmetic.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/users?page=9223372036854775807&limit=10")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["users"].as_array().unwrap().is_empty());
    assert_eq!(body["total"], 25);
}

#[tokio::test]
async fn update_of_missing_user_returns_404() {
    let app = test_app().await;
    let (_, registered) = register(&app, "test@test.com", "secret1").await;
    let token = registered["access_token"].as_str().unwrap();

    let mut request = json_request("PUT", "/users/99999", json!({ "email": "new@test.com" }));
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {}", token).parse().unwrap(),
    );

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
async fn delete_returns_the_removed_user() {
    let app = test_app().await;
    let (_, registered) = register(&app, "test@test.com", "secret1").await;
    let token = registered["access_token"].as_str().unwrap();
    let id = registered["user"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/users/{}", id))
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], id);

    // A second delete of the same id is a 404.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/users/{}", id))
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({ "email": "nobody@test.com", "password": "x" }),
        ))
        .await
        .unwrap();

    let header = response.headers().get("x-request-id");
    assert!(header.is_some());
    assert!(!header.unwrap().to_str().unwrap().is_empty());
}

#[tokio::test]
async fn requests_beyond_the_window_limit_get_429() {
    let app = test_app_with_limiter(RateLimiter::new(3, Duration::from_secs(60))).await;

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/auth/login",
                json!({ "email": "nobody@test.com", "password": "x" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({ "email": "nobody@test.com", "password": "x" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}
