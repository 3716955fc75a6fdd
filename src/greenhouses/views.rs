use super::lifecycle::{GreenhouseState, NewCycle};
use super::models::{
    self, ActiveModel, Greenhouse, GreenhouseCreate, GreenhouseUpdate, with_current_cycle,
};
use super::services;
use crate::common::auth::protect;
use crate::common::errors::{BusinessResult, DbErrorExt, json_body};
use crate::common::state::AppState;
use crate::common::validation::parse_date;
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use crudcrate::CRUDResource;
use sea_orm::ActiveModelTrait;
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

pub fn router(state: &AppState) -> OpenApiRouter {
    let reads = OpenApiRouter::new()
        .routes(routes!(models::get_one_handler))
        .routes(routes!(models::get_all_handler))
        .routes(routes!(models::delete_one_handler))
        .routes(routes!(models::delete_many_handler))
        .with_state(state.db.clone());

    let actions = OpenApiRouter::new()
        .routes(routes!(create_greenhouse))
        .routes(routes!(update_greenhouse))
        .routes(routes!(start_planting))
        .routes(routes!(update_status))
        .routes(routes!(update_stage))
        .with_state(state.clone());

    let mutating_router = reads.merge(actions);

    protect(mutating_router, state, Greenhouse::RESOURCE_NAME_PLURAL)
}

#[derive(ToSchema, Deserialize, Debug, Default)]
pub struct PlantingRequest {
    pub crop_name: Option<String>,
    pub seed_type: Option<String>,
    /// ISO date, `YYYY-MM-DD`
    pub planting_date: Option<String>,
    /// ISO date, `YYYY-MM-DD`
    pub expected_harvest_date: Option<String>,
    pub notes: Option<String>,
}

impl PlantingRequest {
    pub fn validate(self, greenhouse_id: Uuid) -> BusinessResult<NewCycle> {
        let planting_date = self
            .planting_date
            .map(|raw| parse_date("planting_date", &raw))
            .transpose()?;
        let expected_harvest_date = self
            .expected_harvest_date
            .map(|raw| parse_date("expected_harvest_date", &raw))
            .transpose()?;

        NewCycle::validate(
            greenhouse_id,
            self.crop_name,
            self.seed_type,
            planting_date,
            expected_harvest_date,
            self.notes,
        )
    }
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct StatusRequest {
    /// One of `inactive`, `active`, `maintenance`
    pub status: Option<String>,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct StageRequest {
    /// Integer between 1 and 5
    #[serde(default)]
    pub stage: Value,
}

fn greenhouse_response(state: GreenhouseState) -> BusinessResult<Json<Greenhouse>> {
    Ok(Json(with_current_cycle(
        state.greenhouse,
        state.current_cycle,
    )?))
}

#[utoipa::path(
    post,
    path = "/",
    request_body = GreenhouseCreate,
    responses(
        (status = 201, description = "Greenhouse created, always inactive", body = Greenhouse),
        (status = 400, description = "Blank name, negative size or malformed body")
    ),
    tag = "greenhouses"
)]
pub async fn create_greenhouse(
    State(state): State<AppState>,
    payload: Result<Json<GreenhouseCreate>, JsonRejection>,
) -> BusinessResult<(StatusCode, Json<Greenhouse>)> {
    let greenhouse: ActiveModel = json_body(payload)?.into();
    let model = greenhouse
        .insert(&state.db)
        .await
        .map_err(|e| e.to_business_error("greenhouse"))?;
    tracing::info!(greenhouse_id = %model.id, name = %model.name, "greenhouse created");
    Ok((StatusCode::CREATED, Json(model.into())))
}

#[utoipa::path(
    put,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "Greenhouse ID")),
    request_body = GreenhouseUpdate,
    responses(
        (status = 200, description = "Greenhouse updated", body = Greenhouse),
        (status = 400, description = "Blank name, negative size or malformed body"),
        (status = 404, description = "Greenhouse not found")
    ),
    tag = "greenhouses"
)]
pub async fn update_greenhouse(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<GreenhouseUpdate>, JsonRejection>,
) -> BusinessResult<Json<Greenhouse>> {
    let data = json_body(payload)?;
    Greenhouse::update(&state.db, id, data)
        .await
        .map_err(|e| e.to_record_error("Greenhouse", id))?;
    // Re-read so the open cycle stays embedded
    let greenhouse = Greenhouse::get_one(&state.db, id)
        .await
        .map_err(|e| e.to_record_error("Greenhouse", id))?;
    Ok(Json(greenhouse))
}

#[utoipa::path(
    post,
    path = "/{id}/start_planting",
    params(("id" = Uuid, Path, description = "Greenhouse ID")),
    request_body = PlantingRequest,
    responses(
        (status = 200, description = "Planting started, greenhouse is now active", body = Greenhouse),
        (status = 400, description = "Invalid input, greenhouse not inactive, or an open cycle exists"),
        (status = 404, description = "Greenhouse not found")
    ),
    tag = "greenhouses"
)]
pub async fn start_planting(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<PlantingRequest>, JsonRejection>,
) -> BusinessResult<Json<Greenhouse>> {
    let input = json_body(payload)?.validate(id)?;
    greenhouse_response(services::start_planting(&state.db, input).await?)
}

#[utoipa::path(
    patch,
    path = "/{id}/update_status",
    params(("id" = Uuid, Path, description = "Greenhouse ID")),
    request_body = StatusRequest,
    responses(
        (status = 200, description = "Status updated", body = Greenhouse),
        (status = 400, description = "Invalid status or activation without an open cycle"),
        (status = 404, description = "Greenhouse not found")
    ),
    tag = "greenhouses"
)]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> BusinessResult<Json<Greenhouse>> {
    let request = json_body(payload)?;
    greenhouse_response(services::update_status(&state.db, id, request.status.as_deref()).await?)
}

#[utoipa::path(
    patch,
    path = "/{id}/update_stage",
    params(("id" = Uuid, Path, description = "Greenhouse ID")),
    request_body = StageRequest,
    responses(
        (status = 200, description = "Stage updated", body = Greenhouse),
        (status = 400, description = "Greenhouse not active, no open cycle, or stage outside 1..=5"),
        (status = 404, description = "Greenhouse not found")
    ),
    tag = "greenhouses"
)]
pub async fn update_stage(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<StageRequest>, JsonRejection>,
) -> BusinessResult<Json<Greenhouse>> {
    let request = json_body(payload)?;
    greenhouse_response(services::update_stage(&state.db, id, &request.stage).await?)
}
