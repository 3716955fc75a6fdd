/// Shared request builders for the HTTP test suites.
///
/// Helpers that create objects return `Ok((id, body))` on success so callers
/// can chain Greenhouse → GrowingCycle → WeeklyHarvest and InventoryItem → usage.
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::str::FromStr;
use tower::ServiceExt;
use uuid::Uuid;

/// Extract response body as JSON for testing
pub async fn extract_response_body(response: axum::response::Response) -> (StatusCode, Value) {
    use axum::body::to_bytes;

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    let body: Value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| json!({"error": "Invalid JSON response"}))
    };
    (status, body)
}

pub async fn send_json_with_token(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header("authorization", format!("Token {token}"));
    }
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    extract_response_body(response).await
}

pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    send_json_with_token(app, method, uri, body, None).await
}

/// Decimals serialise as strings; accept numbers too so assertions do not
/// depend on the wire format
pub fn as_decimal(value: &Value) -> Decimal {
    match value {
        Value::String(raw) => Decimal::from_str(raw).unwrap(),
        Value::Number(number) => Decimal::from_str(&number.to_string()).unwrap(),
        other => panic!("Expected a decimal, got {other}"),
    }
}

fn created(status: StatusCode, body: Value, what: &str) -> Result<(String, Value), String> {
    if status == StatusCode::CREATED {
        let id = body["id"].as_str().unwrap().to_string();
        Ok((id, body))
    } else {
        Err(format!("Failed to create {what}: Status {status}, Body: {body}"))
    }
}

pub async fn create_test_user(
    app: &Router,
    username: &str,
    password: &str,
) -> Result<(String, Value), String> {
    let (status, body) = send_json(
        app,
        "POST",
        "/api/users",
        Some(json!({
            "username": username,
            "password": password,
            "email": format!("{username}@example.com"),
        })),
    )
    .await;
    created(status, body, "user")
}

pub async fn obtain_test_token(app: &Router, username: &str, password: &str) -> Result<String, String> {
    let (status, body) = send_json(
        app,
        "POST",
        "/api/auth/token",
        Some(json!({"username": username, "password": password})),
    )
    .await;
    if status == StatusCode::OK {
        Ok(body["token"].as_str().unwrap().to_string())
    } else {
        Err(format!("Failed to log in: Status {status}, Body: {body}"))
    }
}

/// Create a test greenhouse with default parameters
pub async fn create_test_greenhouse(app: &Router) -> Result<(String, Value), String> {
    create_test_greenhouse_with_params(
        app,
        &format!("Test Greenhouse {}", Uuid::new_v4()),
        Some("Test plot"),
        120.5,
    )
    .await
}

pub async fn create_test_greenhouse_with_params(
    app: &Router,
    name: &str,
    location: Option<&str>,
    size: f64,
) -> Result<(String, Value), String> {
    let mut data = json!({
        "name": name,
        "size": size,
    });
    if let Some(location) = location {
        data["location"] = json!(location);
    }

    let (status, body) = send_json(app, "POST", "/api/greenhouses", Some(data)).await;
    created(status, body, "greenhouse")
}

/// Starts the Tomato/Heirloom planting on a greenhouse; returns the greenhouse body
pub async fn start_test_planting(app: &Router, greenhouse_id: &str) -> Result<Value, String> {
    let (status, body) = send_json(
        app,
        "POST",
        &format!("/api/greenhouses/{greenhouse_id}/start_planting"),
        Some(json!({
            "crop_name": "Tomato",
            "seed_type": "Heirloom",
            "planting_date": "2025-01-01",
            "expected_harvest_date": "2025-03-01"
        })),
    )
    .await;

    if status == StatusCode::OK {
        Ok(body)
    } else {
        Err(format!("Failed to start planting: Status {status}, Body: {body}"))
    }
}

/// Greenhouse that is active with an open cycle; returns `(greenhouse_id, cycle_id)`
pub async fn create_planted_greenhouse(app: &Router) -> Result<(String, String), String> {
    let (greenhouse_id, _) = create_test_greenhouse(app).await?;
    let body = start_test_planting(app, &greenhouse_id).await?;
    let cycle_id = body["current_cycle"]["id"]
        .as_str()
        .ok_or_else(|| format!("No current cycle in {body}"))?
        .to_string();
    Ok((greenhouse_id, cycle_id))
}

pub async fn set_test_stage(app: &Router, greenhouse_id: &str, stage: i64) -> Result<Value, String> {
    let (status, body) = send_json(
        app,
        "PATCH",
        &format!("/api/greenhouses/{greenhouse_id}/update_stage"),
        Some(json!({"stage": stage})),
    )
    .await;

    if status == StatusCode::OK {
        Ok(body)
    } else {
        Err(format!("Failed to update stage: Status {status}, Body: {body}"))
    }
}

pub async fn create_test_inventory_item(
    app: &Router,
    name: &str,
    quantity: f64,
    unit: &str,
) -> Result<(String, Value), String> {
    let (status, body) = send_json(
        app,
        "POST",
        "/api/inventory",
        Some(json!({
            "name": name,
            "current_quantity": quantity,
            "unit": unit,
            "concentration": null
        })),
    )
    .await;
    created(status, body, "inventory item")
}
