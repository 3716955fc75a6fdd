use super::models::{UsageFilter, UsageRecord};
use crate::common::auth::protect;
use crate::common::errors::BusinessResult;
use crate::common::state::AppState;
use crate::inventory::services;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

/// Read-only: usage rows are only created by `record_usage`
pub fn router(state: &AppState) -> OpenApiRouter {
    let read_router = OpenApiRouter::new()
        .routes(routes!(list_usage))
        .routes(routes!(get_usage))
        .with_state(state.clone());

    protect(read_router, state, "inventory usage")
}

#[utoipa::path(
    get,
    path = "/",
    params(UsageFilter),
    responses((status = 200, description = "Usage history, newest first", body = Vec<UsageRecord>)),
    tag = "inventory"
)]
pub async fn list_usage(
    State(state): State<AppState>,
    Query(filter): Query<UsageFilter>,
) -> BusinessResult<Json<Vec<UsageRecord>>> {
    Ok(Json(services::list_usage(&state.db, filter).await?))
}

#[utoipa::path(
    get,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "Inventory usage ID")),
    responses(
        (status = 200, description = "Usage record", body = UsageRecord),
        (status = 404, description = "Usage record not found")
    ),
    tag = "inventory"
)]
pub async fn get_usage(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> BusinessResult<Json<UsageRecord>> {
    Ok(Json(services::get_usage(&state.db, id).await?))
}
