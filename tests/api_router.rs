mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::Utc;
use http_body_util::BodyExt;
use little_lemon_api::{
    app::build_app,
    entity::{user_groups, users},
    roles::DELETE_ORDER_DENIED,
    services::auth_service::issue_token,
};
use sea_orm::{DatabaseBackend, MockDatabase};
use tower::ServiceExt;
use uuid::Uuid;

use common::{JWT_SECRET, state_with};

fn user_row(id: Uuid) -> users::Model {
    users::Model {
        id,
        username: "guest".into(),
        email: "guest@littlelemon.test".into(),
        password_hash: "unused".into(),
        is_staff: false,
        is_superuser: false,
        created_at: Utc::now().into(),
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let app = build_app(state_with(
        MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
    ));

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/api/nothing-here")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn orders_require_a_valid_token() {
    let app = build_app(state_with(
        MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
    ));

    let response = app.clone().oneshot(get("/api/orders")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/orders")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_for_deleted_user_is_rejected() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<users::Model>::new()])
        .into_connection();
    let app = build_app(state_with(db));
    let token = issue_token(Uuid::new_v4(), JWT_SECRET, 1).unwrap();

    let request = Request::builder()
        .uri("/api/cart/menu-items")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn customer_delete_order_is_denied_with_message() {
    let user_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user_row(user_id)]])
        .append_query_results([Vec::<user_groups::Model>::new()])
        .into_connection();
    let app = build_app(state_with(db));
    let token = issue_token(user_id, JWT_SECRET, 1).unwrap();

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/orders/{}", Uuid::new_v4()))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["message"], DELETE_ORDER_DENIED);
}

#[tokio::test]
async fn malformed_menu_item_id_is_json_not_found() {
    let app = build_app(state_with(
        MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
    ));

    let response = app.oneshot(get("/api/menu-items/not-a-uuid")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Not Found");
}

#[tokio::test]
async fn malformed_order_id_is_json_not_found() {
    let user_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user_row(user_id)]])
        .append_query_results([Vec::<user_groups::Model>::new()])
        .into_connection();
    let app = build_app(state_with(db));
    let token = issue_token(user_id, JWT_SECRET, 1).unwrap();

    let request = Request::builder()
        .uri("/api/orders/42")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Not Found");
}
