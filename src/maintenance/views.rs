use super::models::{
    self, ActiveModel, MaintenanceActivity, MaintenanceActivityCreate, MaintenanceActivityUpdate,
};
use crate::common::auth::protect;
use crate::common::errors::{BusinessResult, DbErrorExt, json_body};
use crate::common::state::AppState;
use crate::greenhouses::models as greenhouses;
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
        .routes(routes!(create_maintenance_activity))
        .routes(routes!(update_maintenance_activity))
        .with_state(state.clone());

    protect(
        reads.merge(writes),
        state,
        MaintenanceActivity::RESOURCE_NAME_PLURAL,
    )
}

/// Logging maintenance never changes the greenhouse status
#[utoipa::path(
    post,
    path = "/",
    request_body = MaintenanceActivityCreate,
    responses(
        (status = 201, description = "Maintenance activity created as pending", body = MaintenanceActivity),
        (status = 400, description = "Unknown activity type, schedule or malformed body"),
        (status = 404, description = "Greenhouse not found")
    ),
    tag = "maintenance_activities"
)]
pub async fn create_maintenance_activity(
    State(state): State<AppState>,
    payload: Result<Json<MaintenanceActivityCreate>, JsonRejection>,
) -> BusinessResult<(StatusCode, Json<MaintenanceActivity>)> {
    let data = json_body(payload)?;
    let greenhouse_id = data.greenhouse_id;
    if greenhouses::Entity::find_by_id(greenhouse_id)
        .one(&state.db)
        .await?
        .is_none()
    {
        return Err(crate::not_found!("Greenhouse", greenhouse_id));
    }

    let activity: ActiveModel = data.into();
    let model = activity
        .insert(&state.db)
        .await
        .map_err(|e| e.to_business_error("maintenance_activity"))?;
    Ok((StatusCode::CREATED, Json(model.into())))
}

#[utoipa::path(
    put,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "Maintenance activity ID")),
    request_body = MaintenanceActivityUpdate,
    responses(
        (status = 200, description = "Maintenance activity updated", body = MaintenanceActivity),
        (status = 400, description = "Unknown vocabulary or malformed body"),
        (status = 404, description = "Maintenance activity not found")
    ),
    tag = "maintenance_activities"
)]
pub async fn update_maintenance_activity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<MaintenanceActivityUpdate>, JsonRejection>,
) -> BusinessResult<Json<MaintenanceActivity>> {
    let data = json_body(payload)?;
    let activity = MaintenanceActivity::update(&state.db, id, data)
        .await
        .map_err(|e| e.to_record_error("Maintenance activity", id))?;
    Ok(Json(activity))
}
