use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde_json::json;
use std::fmt;
use uuid::Uuid;

/// Errors surfaced to API callers. Every variant is per-request and
/// recoverable by sending a corrected request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusinessError {
    /// Malformed, missing or out-of-range field (400 Bad Request)
    InvalidInput { field: String, message: String },
    /// Operation not legal for the entity's current state (400 Bad Request)
    InvalidState { message: String },
    /// Duplicate resource or overlapping open growing cycle (400 Bad Request)
    Conflict { message: String },
    /// Referenced entity is absent (404 Not Found)
    NotFound { resource: String, id: String },
    /// Requested consumption exceeds the stock on hand (400 Bad Request)
    InsufficientStock { message: String },
    /// Missing or unknown credentials (401 Unauthorized)
    Unauthorized { message: String },
    /// Database or hashing failure (500 Internal Server Error)
    Internal { message: String },
}

impl BusinessError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BusinessError::InvalidInput { .. }
            | BusinessError::InvalidState { .. }
            | BusinessError::Conflict { .. }
            | BusinessError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
            BusinessError::NotFound { .. } => StatusCode::NOT_FOUND,
            BusinessError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            BusinessError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            BusinessError::InvalidInput { .. } => "INVALID_INPUT",
            BusinessError::InvalidState { .. } => "INVALID_STATE",
            BusinessError::Conflict { .. } => "CONFLICT",
            BusinessError::NotFound { .. } => "NOT_FOUND",
            BusinessError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            BusinessError::Unauthorized { .. } => "UNAUTHORIZED",
            BusinessError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for BusinessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusinessError::InvalidInput { message, .. }
            | BusinessError::InvalidState { message }
            | BusinessError::Conflict { message }
            | BusinessError::InsufficientStock { message }
            | BusinessError::Unauthorized { message } => f.write_str(message),
            BusinessError::NotFound { resource, id } => {
                write!(f, "{resource} with id '{id}' not found")
            }
            BusinessError::Internal { message } => write!(f, "Internal error: {message}"),
        }
    }
}

impl std::error::Error for BusinessError {}

impl IntoResponse for BusinessError {
    fn into_response(self) -> Response {
        if let BusinessError::Internal { message } = &self {
            tracing::error!(%message, "request failed with an internal error");
        }

        let mut body = json!({
            "error": self.to_string(),
            "code": self.code(),
        });
        if let BusinessError::InvalidInput { field, .. } = &self {
            body["field"] = json!(field);
        }

        (self.status_code(), Json(body)).into_response()
    }
}

impl From<DbErr> for BusinessError {
    fn from(err: DbErr) -> Self {
        ErrorMapper::map_db_error(err, "record")
    }
}

/// Maps database errors onto the business taxonomy
pub struct ErrorMapper;

impl ErrorMapper {
    pub fn map_db_error(err: DbErr, context: &str) -> BusinessError {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(message)) => {
                return Self::map_constraint_message(
                    format!("UNIQUE constraint: {message}"),
                    context,
                );
            }
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                return BusinessError::InvalidInput {
                    field: "reference".to_string(),
                    message: "Referenced record does not exist".to_string(),
                };
            }
            _ => {}
        }

        match err {
            DbErr::RecordNotFound(msg) => BusinessError::NotFound {
                resource: Self::extract_resource_from_context(context),
                id: Self::extract_id_from_message(&msg),
            },
            DbErr::Custom(msg) => {
                if let Some(rest) = msg.strip_prefix("Validation failed:") {
                    let field = Self::extract_field_from_validation(rest);
                    BusinessError::InvalidInput {
                        field,
                        message: rest.trim().to_string(),
                    }
                } else if let Some(rest) = msg.strip_prefix("Conflict:") {
                    BusinessError::Conflict {
                        message: rest.trim().to_string(),
                    }
                } else {
                    BusinessError::Internal { message: msg }
                }
            }
            DbErr::Exec(exec_err) => Self::map_constraint_message(exec_err.to_string(), context),
            DbErr::Query(query_err) => {
                Self::map_constraint_message(query_err.to_string(), context)
            }
            _ => BusinessError::Internal {
                message: err.to_string(),
            },
        }
    }

    fn map_constraint_message(message: String, context: &str) -> BusinessError {
        if message.contains("UNIQUE constraint") || message.contains("duplicate key") {
            if message.contains("one_open_per_greenhouse") || message.contains("greenhouse_id") {
                return BusinessError::Conflict {
                    message: "Greenhouse already has an active growing cycle".to_string(),
                };
            }
            let resource = Self::extract_resource_from_context(context);
            let field = Self::extract_field_from_constraint(&message);
            return BusinessError::Conflict {
                message: format!("{resource} with this {field} already exists"),
            };
        }
        BusinessError::Internal { message }
    }

    fn extract_resource_from_context(context: &str) -> String {
        context.replace('_', " ")
    }

    /// Picks the id out of messages like "Greenhouse with id 'abc' not found"
    fn extract_id_from_message(msg: &str) -> String {
        if let Some(start_pos) = msg.find(" id '") {
            let after_id = &msg[start_pos + 5..];
            if let Some(end_pos) = after_id.find('\'') {
                return after_id[..end_pos].to_string();
            }
        }

        msg.split_whitespace()
            .find_map(|word| {
                let cleaned = word.trim_matches('\'').trim_matches('"');
                (cleaned.len() == 36 && cleaned.matches('-').count() == 4)
                    .then(|| cleaned.to_string())
            })
            .unwrap_or_else(|| "unknown".to_string())
    }

    fn extract_field_from_validation(msg: &str) -> String {
        msg.split_whitespace()
            .next()
            .unwrap_or("unknown")
            .to_string()
    }

    fn extract_field_from_constraint(msg: &str) -> String {
        ["username", "email", "phone_number", "name"]
            .into_iter()
            .find(|field| msg.contains(field))
            .unwrap_or("field")
            .to_string()
    }
}

#[macro_export]
macro_rules! invalid_input {
    ($field:expr, $message:expr) => {
        $crate::common::errors::BusinessError::InvalidInput {
            field: $field.to_string(),
            message: $message.to_string(),
        }
    };
}

#[macro_export]
macro_rules! invalid_state {
    ($message:expr) => {
        $crate::common::errors::BusinessError::InvalidState {
            message: $message.to_string(),
        }
    };
}

#[macro_export]
macro_rules! not_found {
    ($resource:expr, $id:expr) => {
        $crate::common::errors::BusinessError::NotFound {
            resource: $resource.to_string(),
            id: $id.to_string(),
        }
    };
}

#[macro_export]
macro_rules! conflict {
    ($message:expr) => {
        $crate::common::errors::BusinessError::Conflict {
            message: $message.to_string(),
        }
    };
}

/// Extension trait to add business error conversion to `DbErr`
pub trait DbErrorExt {
    fn to_business_error(self, context: &str) -> BusinessError;
    /// Same mapping, but a missing row is reported against `resource` and `id`
    fn to_record_error(self, resource: &str, id: Uuid) -> BusinessError;
}

impl DbErrorExt for DbErr {
    fn to_business_error(self, context: &str) -> BusinessError {
        ErrorMapper::map_db_error(self, context)
    }

    fn to_record_error(self, resource: &str, id: Uuid) -> BusinessError {
        match self {
            DbErr::RecordNotFound(_) => BusinessError::NotFound {
                resource: resource.to_string(),
                id: id.to_string(),
            },
            other => ErrorMapper::map_db_error(other, &resource.to_lowercase()),
        }
    }
}

/// Turns an axum JSON rejection into an `InvalidInput` error so malformed
/// bodies share the same error shape as validation failures.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> BusinessResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| BusinessError::InvalidInput {
            field: "body".to_string(),
            message: rejection.body_text(),
        })
}

pub type BusinessResult<T> = Result<T, BusinessError>;
