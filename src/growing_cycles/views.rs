use super::models::{self, GrowingCycle, GrowingCycleCreate, GrowingCycleUpdate};
use crate::common::auth::protect;
use crate::common::errors::{BusinessResult, DbErrorExt, json_body};
use crate::common::state::AppState;
use crate::common::validation::parse_date;
use crate::greenhouses::lifecycle::{ClosedCycle, NewCycle};
use crate::greenhouses::models::Greenhouse;
use crate::greenhouses::services;
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use crudcrate::CRUDResource;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

pub fn router(state: &AppState) -> OpenApiRouter {
    // No batch delete: every removal has to go through the greenhouse release
    let reads = OpenApiRouter::new()
        .routes(routes!(models::get_one_handler))
        .routes(routes!(models::get_all_handler))
        .with_state(state.db.clone());

    let actions = OpenApiRouter::new()
        .routes(routes!(create_growing_cycle))
        .routes(routes!(update_growing_cycle))
        .routes(routes!(delete_growing_cycle))
        .routes(routes!(complete_cycle))
        .routes(routes!(terminate_cycle))
        .with_state(state.clone());

    let mutating_router = reads.merge(actions);

    protect(mutating_router, state, GrowingCycle::RESOURCE_NAME_PLURAL)
}

#[derive(ToSchema, Deserialize, Debug, Default)]
pub struct CompleteRequest {
    /// ISO date, defaults to today
    pub actual_harvest_date: Option<String>,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct TerminateRequest {
    /// One of `harvest_complete`, `crop_failure`, `disease`, `other`
    pub reason: Option<String>,
}

/// A closed cycle and the greenhouse it released
#[derive(ToSchema, Serialize)]
pub struct ClosedCycleResponse {
    pub growing_cycle: GrowingCycle,
    pub greenhouse: Greenhouse,
}

impl From<ClosedCycle> for ClosedCycleResponse {
    fn from(closed: ClosedCycle) -> Self {
        Self {
            growing_cycle: closed.cycle.into(),
            greenhouse: closed.greenhouse.into(),
        }
    }
}

/// Goes through the same open-cycle guard as planting, but leaves the
/// greenhouse status untouched
#[utoipa::path(
    post,
    path = "/",
    request_body = GrowingCycleCreate,
    responses(
        (status = 201, description = "Growing cycle created in germination", body = GrowingCycle),
        (status = 400, description = "Invalid input or the greenhouse already has an open cycle"),
        (status = 404, description = "Greenhouse not found")
    ),
    tag = "growing_cycles"
)]
pub async fn create_growing_cycle(
    State(state): State<AppState>,
    payload: Result<Json<GrowingCycleCreate>, JsonRejection>,
) -> BusinessResult<(StatusCode, Json<GrowingCycle>)> {
    let data = json_body(payload)?;
    let input = NewCycle::validate(
        data.greenhouse_id,
        Some(data.crop_name),
        Some(data.seed_type),
        Some(data.planting_date),
        Some(data.expected_harvest_date),
        data.notes,
    )?;

    let cycle = services::register_cycle(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(cycle.into())))
}

#[utoipa::path(
    put,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "Growing cycle ID")),
    request_body = GrowingCycleUpdate,
    responses(
        (status = 200, description = "Growing cycle updated", body = GrowingCycle),
        (status = 400, description = "Blank text, dates out of order or malformed body"),
        (status = 404, description = "Growing cycle not found")
    ),
    tag = "growing_cycles"
)]
pub async fn update_growing_cycle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<GrowingCycleUpdate>, JsonRejection>,
) -> BusinessResult<Json<GrowingCycle>> {
    let data = json_body(payload)?;
    GrowingCycle::update(&state.db, id, data)
        .await
        .map_err(|e| e.to_record_error("Growing cycle", id))?;
    let cycle = GrowingCycle::get_one(&state.db, id)
        .await
        .map_err(|e| e.to_record_error("Growing cycle", id))?;
    Ok(Json(cycle))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "Growing cycle ID")),
    responses(
        (status = 204, description = "Growing cycle and its harvests deleted; an active greenhouse is released"),
        (status = 404, description = "Growing cycle not found")
    ),
    tag = "growing_cycles"
)]
pub async fn delete_growing_cycle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> BusinessResult<StatusCode> {
    services::delete_cycle(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{id}/complete",
    params(("id" = Uuid, Path, description = "Growing cycle ID")),
    request_body = CompleteRequest,
    responses(
        (status = 200, description = "Cycle completed", body = ClosedCycleResponse),
        (status = 400, description = "Cycle is not in maturation or the date is invalid"),
        (status = 404, description = "Growing cycle not found")
    ),
    tag = "growing_cycles"
)]
pub async fn complete_cycle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<CompleteRequest>, JsonRejection>,
) -> BusinessResult<Json<ClosedCycleResponse>> {
    let request = json_body(payload)?;
    let actual_harvest_date = request
        .actual_harvest_date
        .map(|raw| parse_date("actual_harvest_date", &raw))
        .transpose()?;

    let closed = services::complete_cycle(&state.db, id, actual_harvest_date).await?;
    Ok(Json(closed.into()))
}

#[utoipa::path(
    post,
    path = "/{id}/terminate",
    params(("id" = Uuid, Path, description = "Growing cycle ID")),
    request_body = TerminateRequest,
    responses(
        (status = 200, description = "Cycle terminated", body = ClosedCycleResponse),
        (status = 400, description = "Cycle already ended or reason invalid"),
        (status = 404, description = "Growing cycle not found")
    ),
    tag = "growing_cycles"
)]
pub async fn terminate_cycle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<TerminateRequest>, JsonRejection>,
) -> BusinessResult<Json<ClosedCycleResponse>> {
    let request = json_body(payload)?;
    let closed = services::terminate_cycle(&state.db, id, request.reason.as_deref()).await?;
    Ok(Json(closed.into()))
}
