use super::models::HealthCheck;
use crate::common::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use sea_orm::DatabaseConnection;
use utoipa_axum::{router::OpenApiRouter, routes};

pub fn router(state: &AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(healthz))
        .with_state(state.db.clone())
}

#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = OK, description = "Database reachable", body = HealthCheck),
        (status = INTERNAL_SERVER_ERROR, description = "Database unreachable", body = HealthCheck)
    )
)]
pub async fn healthz(State(db): State<DatabaseConnection>) -> (StatusCode, Json<HealthCheck>) {
    if db.ping().await.is_err() {
        tracing::warn!("health check failed: database ping error");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(HealthCheck {
                status: "error".to_string(),
            }),
        );
    }

    (
        StatusCode::OK,
        Json(HealthCheck {
            status: "ok".to_string(),
        }),
    )
}
