use crate::common::state::AppState;
use crate::config::Config;
use crate::{greenhouses, growing_cycles, harvests, inventory, maintenance, users};
use axum::Router;
use sea_orm::DatabaseConnection;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable};

pub fn build_router(db: &DatabaseConnection, config: &Config) -> Router {
    #[derive(OpenApi)]
    #[openapi(
        modifiers(&SecurityAddon),
        security(
            ("token" = [])
        )
    )]
    struct ApiDoc;

    struct SecurityAddon;

    impl utoipa::Modify for SecurityAddon {
        fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
            let components = openapi.components.get_or_insert_with(Default::default);
            components.add_security_scheme(
                "token",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::with_description(
                            "Authorization",
                            "Token <key> as issued by POST /api/auth/token",
                        ),
                    ),
                ),
            );
        }
    }

    let app_state: AppState = AppState::new(db.clone(), config.clone());

    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(crate::common::views::router(&app_state)) // Root routes
        .nest("/api/users", users::views::router(&app_state))
        .nest("/api/auth", users::views::auth_router(&app_state))
        .nest("/api/greenhouses", greenhouses::views::router(&app_state))
        .nest(
            "/api/growing_cycles",
            growing_cycles::views::router(&app_state),
        )
        .nest("/api/harvests", harvests::views::router(&app_state))
        .nest("/api/maintenance", maintenance::views::router(&app_state))
        .nest("/api/inventory", inventory::views::router(&app_state))
        .nest(
            "/api/inventory-usage",
            inventory::usage::views::router(&app_state),
        )
        .split_for_parts();

    router.merge(Scalar::with_url("/api/docs", api))
}
