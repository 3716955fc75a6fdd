use super::consumption::NewUsage;
use super::models::{self, ActiveModel, InventoryItem, InventoryItemCreate, InventoryItemUpdate};
use super::services;
use super::usage::models::UsageRecord;
use crate::common::auth::protect;
use crate::common::errors::{BusinessResult, DbErrorExt, json_body};
use crate::common::state::AppState;
use crate::common::validation::{positive_decimal, required};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use crudcrate::CRUDResource;
use rust_decimal::Decimal;
use sea_orm::ActiveModelTrait;
use serde::Deserialize;
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
        .routes(routes!(create_inventory_item))
        .routes(routes!(update_inventory_item))
        .routes(routes!(record_usage))
        .with_state(state.clone());

    let mutating_router = reads.merge(actions);

    protect(mutating_router, state, InventoryItem::RESOURCE_NAME_PLURAL)
}

#[derive(ToSchema, Deserialize, Debug, Default)]
pub struct RecordUsageRequest {
    pub greenhouse_id: Option<Uuid>,
    /// Must be greater than zero and no more than the stock on hand
    pub quantity_used: Option<Decimal>,
    pub purpose_note: Option<String>,
}

impl RecordUsageRequest {
    pub fn validate(self, inventory_item_id: Uuid) -> BusinessResult<NewUsage> {
        Ok(NewUsage {
            inventory_item_id,
            greenhouse_id: required("greenhouse_id", self.greenhouse_id)?,
            quantity: positive_decimal("quantity_used", self.quantity_used)?,
            purpose_note: self.purpose_note,
        })
    }
}

#[utoipa::path(
    post,
    path = "/",
    request_body = InventoryItemCreate,
    responses(
        (status = 201, description = "Inventory item created", body = InventoryItem),
        (status = 400, description = "Blank name, negative quantity or unknown unit")
    ),
    tag = "inventory"
)]
pub async fn create_inventory_item(
    State(state): State<AppState>,
    payload: Result<Json<InventoryItemCreate>, JsonRejection>,
) -> BusinessResult<(StatusCode, Json<InventoryItem>)> {
    let item: ActiveModel = json_body(payload)?.into();
    let model = item
        .insert(&state.db)
        .await
        .map_err(|e| e.to_business_error("inventory_item"))?;
    Ok((StatusCode::CREATED, Json(model.into())))
}

#[utoipa::path(
    put,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "Inventory item ID")),
    request_body = InventoryItemUpdate,
    responses(
        (status = 200, description = "Inventory item updated", body = InventoryItem),
        (status = 400, description = "Blank name, negative quantity or unknown unit"),
        (status = 404, description = "Inventory item not found")
    ),
    tag = "inventory"
)]
pub async fn update_inventory_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<InventoryItemUpdate>, JsonRejection>,
) -> BusinessResult<Json<InventoryItem>> {
    let data = json_body(payload)?;
    let item = InventoryItem::update(&state.db, id, data)
        .await
        .map_err(|e| e.to_record_error("Inventory item", id))?;
    Ok(Json(item))
}

#[utoipa::path(
    post,
    path = "/{id}/record_usage",
    params(("id" = Uuid, Path, description = "Inventory item ID")),
    request_body = RecordUsageRequest,
    responses(
        (status = 201, description = "Usage recorded and stock decremented", body = UsageRecord),
        (status = 400, description = "Invalid input, inactive greenhouse, or not enough stock"),
        (status = 404, description = "Inventory item or greenhouse not found")
    ),
    tag = "inventory"
)]
pub async fn record_usage(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<RecordUsageRequest>, JsonRejection>,
) -> BusinessResult<(StatusCode, Json<UsageRecord>)> {
    let input = json_body(payload)?.validate(id)?;
    let recorded = services::record_usage(&state.db, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(UsageRecord::new(
            recorded.usage,
            recorded.item,
            Some(recorded.greenhouse),
        )),
    ))
}
