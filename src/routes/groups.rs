use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::groups::{GroupMemberRequest, UserList},
    error::AppResult,
    middleware::auth::Principal,
    models::User,
    response::ApiResponse,
    routes::extract::Path,
    services::group_service::{self, StaffGroup},
    state::AppState,
};

pub fn manager_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_managers).post(add_manager))
        .route("/{id}", delete(remove_manager))
}

pub fn delivery_crew_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_delivery_crew).post(add_delivery_crew))
        .route("/{id}", delete(remove_delivery_crew))
}

#[utoipa::path(
    get,
    path = "/api/groups/manager/users",
    responses(
        (status = 200, description = "Members of the manager group", body = ApiResponse<UserList>),
        (status = 401, description = "Not an admin manager"),
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
pub async fn list_managers(
    State(state): State<AppState>,
    principal: Principal,
) -> AppResult<Json<ApiResponse<UserList>>> {
    let resp = group_service::list_members(&state, &principal, StaffGroup::Manager).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/groups/manager/users",
    request_body = GroupMemberRequest,
    responses(
        (status = 201, description = "User added to the manager group", body = ApiResponse<User>),
        (status = 401, description = "Not an admin manager"),
        (status = 404, description = "Unknown username"),
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
pub async fn add_manager(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<GroupMemberRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    let resp =
        group_service::add_member(&state, &principal, StaffGroup::Manager, &payload.username)
            .await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/groups/manager/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User removed from the manager group", body = ApiResponse<User>),
        (status = 401, description = "Not an admin manager"),
        (status = 404, description = "Unknown user"),
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
pub async fn remove_manager(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = group_service::remove_member(&state, &principal, StaffGroup::Manager, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/groups/delivery-crew/users",
    responses(
        (status = 200, description = "Members of the delivery crew", body = ApiResponse<UserList>),
        (status = 401, description = "Not an admin manager"),
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
pub async fn list_delivery_crew(
    State(state): State<AppState>,
    principal: Principal,
) -> AppResult<Json<ApiResponse<UserList>>> {
    let resp = group_service::list_members(&state, &principal, StaffGroup::DeliveryCrew).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/groups/delivery-crew/users",
    request_body = GroupMemberRequest,
    responses(
        (status = 201, description = "User added to the delivery crew", body = ApiResponse<User>),
        (status = 401, description = "Not an admin manager"),
        (status = 404, description = "Unknown username"),
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
pub async fn add_delivery_crew(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<GroupMemberRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    let resp = group_service::add_member(
        &state,
        &principal,
        StaffGroup::DeliveryCrew,
        &payload.username,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/groups/delivery-crew/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User removed from the delivery crew", body = ApiResponse<User>),
        (status = 401, description = "Not an admin manager"),
        (status = 404, description = "Unknown user"),
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
pub async fn remove_delivery_crew(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp =
        group_service::remove_member(&state, &principal, StaffGroup::DeliveryCrew, id).await?;
    Ok(Json(resp))
}
