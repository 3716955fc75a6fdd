use super::errors::BusinessError;
use super::state::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::{Next, from_fn_with_state},
    response::Response,
};
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

/// The caller resolved from an `Authorization: Token <key>` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub username: String,
    pub token: String,
}

/// Accepts both the `Token` scheme and `Bearer`
pub fn extract_token(value: &str) -> Option<&str> {
    let (scheme, key) = value.trim().split_once(' ')?;
    let key = key.trim();
    let known_scheme = scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer");
    (known_scheme && !key.is_empty()).then_some(key)
}

pub async fn require_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, BusinessError> {
    let key = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(extract_token)
        .map(str::to_string)
        .ok_or_else(|| BusinessError::Unauthorized {
            message: "Authentication credentials were not provided".to_string(),
        })?;

    let user = crate::users::services::authenticate_token(&state.db, &key).await?;

    request.extensions_mut().insert(AuthenticatedUser {
        id: user.id,
        username: user.username,
        token: key,
    });

    Ok(next.run(request).await)
}

/// Applies the token policy to a resource router when authentication is on
pub fn protect(router: OpenApiRouter, state: &AppState, resource: &str) -> OpenApiRouter {
    if state.config.require_auth {
        router.layer(from_fn_with_state(state.clone(), require_token))
    } else {
        if !state.config.tests_running {
            tracing::warn!("Routes of {resource} router are not protected");
        }
        router
    }
}
