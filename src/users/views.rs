use super::models::{self as users, TokenRequest, TokenResponse, User, UserCreate, UserUpdate};
use super::services;
use crate::common::auth::{AuthenticatedUser, protect, require_token};
use crate::common::errors::{BusinessResult, json_body};
use crate::common::state::AppState;
use crate::common::validation::required;
use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    middleware::from_fn_with_state,
};
use sea_orm::{EntityTrait, QueryOrder};
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

/// Signup is open; everything else follows the configured token policy
pub fn router(state: &AppState) -> OpenApiRouter {
    let public = OpenApiRouter::new()
        .routes(routes!(create_user))
        .with_state(state.clone());

    let protected = OpenApiRouter::new()
        .routes(routes!(list_users))
        .routes(routes!(get_user, update_user, delete_user))
        .with_state(state.clone());

    public.merge(protect(protected, state, "users"))
}

/// `me` and `logout` need a caller, so they always require a token
pub fn auth_router(state: &AppState) -> OpenApiRouter {
    let public = OpenApiRouter::new()
        .routes(routes!(obtain_token))
        .with_state(state.clone());

    let authenticated = OpenApiRouter::new()
        .routes(routes!(current_user))
        .routes(routes!(logout))
        .with_state(state.clone())
        .layer(from_fn_with_state(state.clone(), require_token));

    public.merge(authenticated)
}

#[utoipa::path(
    post,
    path = "/",
    request_body = UserCreate,
    responses(
        (status = 201, description = "User registered", body = User),
        (status = 400, description = "Invalid input or duplicate username/email")
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<UserCreate>, JsonRejection>,
) -> BusinessResult<(StatusCode, Json<User>)> {
    let data = json_body(payload)?;
    let user = services::create_user(&state.db, state.config.password_hash_cost, data).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "All users", body = Vec<User>)),
    tag = "users"
)]
pub async fn list_users(State(state): State<AppState>) -> BusinessResult<Json<Vec<User>>> {
    let users = users::Entity::find()
        .order_by_asc(users::Column::Username)
        .all(&state.db)
        .await?;
    Ok(Json(users.into_iter().map(User::from).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> BusinessResult<Json<User>> {
    let user = services::find_user(&state.db, id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    put,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UserUpdate>, JsonRejection>,
) -> BusinessResult<Json<User>> {
    let data = json_body(payload)?;
    let user = services::update_user(&state.db, state.config.password_hash_cost, id, data).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> BusinessResult<StatusCode> {
    services::delete_user(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/token",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token for the supplied credentials", body = TokenResponse),
        (status = 400, description = "Missing username or password"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn obtain_token(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> BusinessResult<Json<TokenResponse>> {
    let request = json_body(payload)?;
    let username = required("username", request.username)?;
    let password = required("password", request.password)?;
    let token = services::obtain_token(&state.db, &username, &password).await?;
    Ok(Json(TokenResponse { token }))
}

#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "The authenticated user", body = User),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("token" = [])),
    tag = "auth"
)]
pub async fn current_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
) -> BusinessResult<Json<User>> {
    let user = services::find_user(&state.db, caller.id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 204, description = "Token revoked"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("token" = [])),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
) -> BusinessResult<StatusCode> {
    services::revoke_token(&state.db, &caller.token).await?;
    tracing::info!(user_id = %caller.id, "token revoked");
    Ok(StatusCode::NO_CONTENT)
}
