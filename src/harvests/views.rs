use super::models::{self, ActiveModel, WeeklyHarvest, WeeklyHarvestCreate, WeeklyHarvestUpdate};
use crate::common::auth::protect;
use crate::common::errors::{BusinessResult, DbErrorExt, json_body};
use crate::common::state::AppState;
use crate::growing_cycles::models as growing_cycles;
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use crudcrate::CRUDResource;
use sea_orm::{ActiveModelTrait, EntityTrait};
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

pub fn router(state: &AppState) -> OpenApiRouter {
    let reads = OpenApiRouter::new()
        .routes(routes!(models::get_one_handler))
        .routes(routes!(models::get_all_handler))
        .routes(routes!(models::delete_one_handler))
        .routes(routes!(models::delete_many_handler))
        .with_state(state.db.clone());

    let writes = OpenApiRouter::new()
        .routes(routes!(create_harvest))
        .routes(routes!(update_harvest))
        .with_state(state.clone());

    protect(
        reads.merge(writes),
        state,
        WeeklyHarvest::RESOURCE_NAME_PLURAL,
    )
}

#[utoipa::path(
    post,
    path = "/",
    request_body = WeeklyHarvestCreate,
    responses(
        (status = 201, description = "Harvest recorded", body = WeeklyHarvest),
        (status = 400, description = "Week below 1, negative weight or unknown quality"),
        (status = 404, description = "Growing cycle not found")
    ),
    tag = "weekly_harvests"
)]
pub async fn create_harvest(
    State(state): State<AppState>,
    payload: Result<Json<WeeklyHarvestCreate>, JsonRejection>,
) -> BusinessResult<(StatusCode, Json<WeeklyHarvest>)> {
    let data = json_body(payload)?;
    let cycle_id = data.growing_cycle_id;
    if growing_cycles::Entity::find_by_id(cycle_id)
        .one(&state.db)
        .await?
        .is_none()
    {
        return Err(crate::not_found!("Growing cycle", cycle_id));
    }

    let harvest: ActiveModel = data.into();
    let model = harvest
        .insert(&state.db)
        .await
        .map_err(|e| e.to_business_error("weekly_harvest"))?;
    Ok((StatusCode::CREATED, Json(model.into())))
}

#[utoipa::path(
    put,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "Weekly harvest ID")),
    request_body = WeeklyHarvestUpdate,
    responses(
        (status = 200, description = "Harvest updated", body = WeeklyHarvest),
        (status = 400, description = "Week below 1, negative weight or unknown quality"),
        (status = 404, description = "Weekly harvest not found")
    ),
    tag = "weekly_harvests"
)]
pub async fn update_harvest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<WeeklyHarvestUpdate>, JsonRejection>,
) -> BusinessResult<Json<WeeklyHarvest>> {
    let data = json_body(payload)?;
    let harvest = WeeklyHarvest::update(&state.db, id, data)
        .await
        .map_err(|e| e.to_record_error("Weekly harvest", id))?;
    Ok(Json(harvest))
}
