use crate::config::test_helpers::setup_test_app;
use crate::test_helpers::{
    as_decimal, create_planted_greenhouse, create_test_greenhouse, create_test_inventory_item,
    send_json,
};
use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;

#[tokio::test]
async fn test_inventory_crud_operations() {
    let app = setup_test_app().await;

    let (item_id, body) = create_test_inventory_item(&app, "NPK 10-10-10", 25.0, "kg")
        .await
        .expect("Failed to create inventory item");
    assert_eq!(body["name"], "NPK 10-10-10");
    assert_eq!(body["unit"], "kg");
    // Decimals go over the wire as strings so no precision is lost
    assert!(body["current_quantity"].is_string(), "{body}");
    assert_eq!(as_decimal(&body["current_quantity"]), Decimal::new(25, 0));

    let (status, body) = send_json(
        &app,
        "PUT",
        &format!("/api/inventory/{item_id}"),
        Some(json!({"concentration": "10%", "current_quantity": 30})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "Failed to update item: {body}");
    assert_eq!(body["concentration"], "10%");
    assert_eq!(as_decimal(&body["current_quantity"]), Decimal::new(30, 0));

    let (status, body) = send_json(&app, "GET", "/api/inventory", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send_json(&app, "DELETE", &format!("/api/inventory/{item_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send_json(&app, "GET", &format!("/api/inventory/{item_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_negative_stock_is_rejected() {
    let app = setup_test_app().await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/inventory",
        Some(json!({"name": "Copper spray", "current_quantity": -1, "unit": "l"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "Negative quantity should be rejected: {body}");
    assert_eq!(body["code"], "INVALID_INPUT");
    assert_eq!(body["field"], "current_quantity");
    assert_eq!(body["error"], "current_quantity must not be negative");

    let (status, body) = send_json(&app, "GET", "/api/inventory", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 0);

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/inventory",
        Some(json!({"name": " ", "current_quantity": 1, "unit": "l"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "name");

    let (item_id, _) = create_test_inventory_item(&app, "Copper spray", 2.0, "l")
        .await
        .unwrap();
    let (status, body) = send_json(
        &app,
        "PUT",
        &format!("/api/inventory/{item_id}"),
        Some(json!({"current_quantity": -5})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "Negative quantity update should be rejected: {body}");
    assert_eq!(body["code"], "INVALID_INPUT");
    assert_eq!(body["field"], "current_quantity");

    let (_, body) = send_json(&app, "GET", &format!("/api/inventory/{item_id}"), None).await;
    assert_eq!(as_decimal(&body["current_quantity"]), Decimal::new(2, 0));

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/inventory",
        Some(json!({"name": "Mystery", "current_quantity": 1, "unit": "barrel"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "Unknown unit should be rejected: {body}");
    assert_eq!(body["code"], "INVALID_INPUT");
    assert_eq!(body["field"], "body");

    let missing = uuid::Uuid::new_v4();
    let (status, body) = send_json(
        &app,
        "PUT",
        &format!("/api/inventory/{missing}"),
        Some(json!({"current_quantity": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], format!("Inventory item with id '{missing}' not found"));
}

#[tokio::test]
async fn test_record_usage_decrements_stock() {
    let app = setup_test_app().await;
    let (greenhouse_id, _) = create_planted_greenhouse(&app).await.unwrap();
    let (item_id, _) = create_test_inventory_item(&app, "Neem oil", 10.0, "l")
        .await
        .unwrap();

    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/api/inventory/{item_id}/record_usage"),
        Some(json!({
            "greenhouse_id": greenhouse_id,
            "quantity_used": 2.5,
            "purpose_note": "Aphid treatment"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Failed to record usage: {body}");
    assert_eq!(as_decimal(&body["quantity_used"]), Decimal::new(25, 1));
    assert_eq!(body["purpose_note"], "Aphid treatment");
    assert_eq!(body["inventory_item"]["id"], item_id.as_str());
    assert_eq!(
        as_decimal(&body["inventory_item"]["current_quantity"]),
        Decimal::new(75, 1)
    );
    assert_eq!(body["greenhouse"]["id"], greenhouse_id.as_str());
    let usage_id = body["id"].as_str().unwrap().to_string();

    let (_, item) = send_json(&app, "GET", &format!("/api/inventory/{item_id}"), None).await;
    assert_eq!(as_decimal(&item["current_quantity"]), Decimal::new(75, 1));

    let (status, body) = send_json(&app, "GET", &format!("/api/inventory-usage/{usage_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], usage_id.as_str());
    assert_eq!(body["greenhouse"]["id"], greenhouse_id.as_str());
}

#[tokio::test]
async fn test_record_usage_rejects_overdraw() {
    let app = setup_test_app().await;
    let (greenhouse_id, _) = create_planted_greenhouse(&app).await.unwrap();
    let (item_id, _) = create_test_inventory_item(&app, "Fungicide", 5.0, "l")
        .await
        .unwrap();

    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/api/inventory/{item_id}/record_usage"),
        Some(json!({"greenhouse_id": greenhouse_id, "quantity_used": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");
    assert_eq!(body["error"], "Not enough inventory available");

    let (_, item) = send_json(&app, "GET", &format!("/api/inventory/{item_id}"), None).await;
    assert_eq!(as_decimal(&item["current_quantity"]), Decimal::new(5, 0));

    let (_, usage) = send_json(&app, "GET", "/api/inventory-usage", None).await;
    assert_eq!(usage.as_array().unwrap().len(), 0);

    // Using up exactly what is left is allowed
    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/api/inventory/{item_id}/record_usage"),
        Some(json!({"greenhouse_id": greenhouse_id, "quantity_used": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Exact drawdown failed: {body}");
    assert_eq!(
        as_decimal(&body["inventory_item"]["current_quantity"]),
        Decimal::ZERO
    );
}

#[tokio::test]
async fn test_record_usage_requires_active_greenhouse() {
    let app = setup_test_app().await;
    let (greenhouse_id, _) = create_test_greenhouse(&app).await.unwrap();
    let (item_id, _) = create_test_inventory_item(&app, "Seaweed extract", 3.0, "bottle")
        .await
        .unwrap();

    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/api/inventory/{item_id}/record_usage"),
        Some(json!({"greenhouse_id": greenhouse_id, "quantity_used": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_STATE");

    let (_, item) = send_json(&app, "GET", &format!("/api/inventory/{item_id}"), None).await;
    assert_eq!(as_decimal(&item["current_quantity"]), Decimal::new(3, 0));
}

#[tokio::test]
async fn test_record_usage_input_errors() {
    let app = setup_test_app().await;
    let (greenhouse_id, _) = create_planted_greenhouse(&app).await.unwrap();
    let (item_id, _) = create_test_inventory_item(&app, "Lime", 8.0, "kg")
        .await
        .unwrap();
    let uri = format!("/api/inventory/{item_id}/record_usage");

    let (status, body) = send_json(&app, "POST", &uri, Some(json!({"quantity_used": 1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "greenhouse_id");

    for quantity in [json!(0), json!(-2)] {
        let (status, body) = send_json(
            &app,
            "POST",
            &uri,
            Some(json!({"greenhouse_id": greenhouse_id, "quantity_used": quantity})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "quantity_used");
    }

    let (status, body) = send_json(
        &app,
        "POST",
        &uri,
        Some(json!({"greenhouse_id": uuid::Uuid::new_v4(), "quantity_used": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/api/inventory/{}/record_usage", uuid::Uuid::new_v4()),
        Some(json!({"greenhouse_id": greenhouse_id, "quantity_used": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, item) = send_json(&app, "GET", &format!("/api/inventory/{item_id}"), None).await;
    assert_eq!(as_decimal(&item["current_quantity"]), Decimal::new(8, 0));
}

#[tokio::test]
async fn test_usage_history_filters() {
    let app = setup_test_app().await;
    let (first_greenhouse, _) = create_planted_greenhouse(&app).await.unwrap();
    let (second_greenhouse, _) = create_planted_greenhouse(&app).await.unwrap();
    let (fertiliser, _) = create_test_inventory_item(&app, "Fertiliser", 100.0, "kg")
        .await
        .unwrap();
    let (pesticide, _) = create_test_inventory_item(&app, "Pesticide", 20.0, "l")
        .await
        .unwrap();

    for (item, greenhouse, quantity) in [
        (&fertiliser, &first_greenhouse, 10),
        (&fertiliser, &second_greenhouse, 5),
        (&pesticide, &first_greenhouse, 1),
    ] {
        let (status, body) = send_json(
            &app,
            "POST",
            &format!("/api/inventory/{item}/record_usage"),
            Some(json!({"greenhouse_id": greenhouse, "quantity_used": quantity})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "Failed to record usage: {body}");
    }

    let (status, body) = send_json(&app, "GET", "/api/inventory-usage", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (_, body) = send_json(
        &app,
        "GET",
        &format!("/api/inventory-usage?inventory_item={fertiliser}"),
        None,
    )
    .await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row["inventory_item"]["id"] == fertiliser.as_str()));

    let (_, body) = send_json(
        &app,
        "GET",
        &format!("/api/inventory-usage?greenhouse={first_greenhouse}&inventory_item={pesticide}"),
        None,
    )
    .await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(as_decimal(&rows[0]["quantity_used"]), Decimal::ONE);

    let (status, _) = send_json(
        &app,
        "GET",
        &format!("/api/inventory-usage/{}", uuid::Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_usage_survives_greenhouse_deletion() {
    let app = setup_test_app().await;
    let (greenhouse_id, _) = create_planted_greenhouse(&app).await.unwrap();
    let (item_id, _) = create_test_inventory_item(&app, "Potash", 4.0, "pack")
        .await
        .unwrap();

    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/api/inventory/{item_id}/record_usage"),
        Some(json!({"greenhouse_id": greenhouse_id, "quantity_used": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let usage_id = body["id"].as_str().unwrap().to_string();

    let (status, _) =
        send_json(&app, "DELETE", &format!("/api/greenhouses/{greenhouse_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send_json(&app, "GET", &format!("/api/inventory-usage/{usage_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["greenhouse"].is_null());
    assert_eq!(body["inventory_item"]["id"], item_id.as_str());
}
