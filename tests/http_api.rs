//! End-to-end test: serve the real router on an ephemeral port and drive
//! it over HTTP, one domain with a loaded artifact and the rest on the
//! placeholder path.

use std::sync::Arc;

use serde_json::{json, Value};

use riskd::config::Config;
use riskd::features::{ModelDomain, SUPPLIER_SCHEMA};
use riskd::http::router;
use riskd::model::{GbtModel, Node, Tree};
use riskd::scoring::ScoringEngine;

fn itest_supplier_model() -> GbtModel {
    GbtModel {
        version: "supplier-itest.1".to_string(),
        trained_at: Some("2024-06-14T09:30:00Z".to_string()),
        base_score: 0.0,
        features: SUPPLIER_SCHEMA.iter().map(|s| s.name.to_string()).collect(),
        trees: vec![Tree {
            nodes: vec![
                Node {
                    feature: Some(0), // onTimeDeliveryRate
                    threshold: 85.0,
                    left: 1,
                    right: 2,
                    value: 0.0,
                },
                Node { feature: None, threshold: 0.0, left: 0, right: 0, value: 2.0 },
                Node { feature: None, threshold: 0.0, left: 0, right: 0, value: -2.0 },
            ],
        }],
    }
}

fn supplier_payload() -> Value {
    json!({
        "onTimeDeliveryRate": 60.0,
        "financialScore": 40.0,
        "defectRate": 12.0,
        "disputeFrequency": 6.0,
        "geopoliticalRiskFlag": 1,
        "totalShipments": 40,
        "averageDelayDays": 9.5,
        "daysSinceLastShip": 60,
        "activeShipmentCount": 3,
        "categoryRisk": 3,
    })
}

fn shipment_payload() -> Value {
    json!({
        "etaDeviationHours": 36.0,
        "weatherLevel": 3,
        "carrierReliability": 72.5,
        "routeRisk": 2,
        "transitDays": 12.0,
        "distanceKm": 4800.0,
        "handoffCount": 3,
        "customsFlag": 1,
        "priorDelayRate": 18.0,
        "valueUsd": 250000.0,
    })
}

async fn spawn_server() -> String {
    let models_dir = std::env::temp_dir().join(format!("riskd-itest-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&models_dir);
    std::fs::create_dir_all(&models_dir).unwrap();
    std::fs::write(
        models_dir.join(ModelDomain::Supplier.artifact_file()),
        serde_json::to_string(&itest_supplier_model()).unwrap(),
    )
    .unwrap();

    let mut config = Config::default();
    config.models.dir = models_dir.display().to_string();
    let engine = Arc::new(ScoringEngine::new(Arc::new(config)));
    let app = router(engine, true);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Router with no artifacts on disk, placeholder scoring as configured.
async fn spawn_bare_server(allow_placeholder: bool) -> String {
    let mut config = Config::default();
    config.models.dir = "/nonexistent/riskd-models".to_string();
    config.scoring.allow_placeholder = allow_placeholder;
    let engine = Arc::new(ScoringEngine::new(Arc::new(config)));
    let app = router(engine, true);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_malformed_body_keeps_detail_error_shape() {
    let base = spawn_bare_server(true).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/predict/supplier", base))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["detail"].as_str().is_some(), "error body missing detail: {}", body);
}

#[tokio::test]
async fn test_model_unavailable_maps_to_503_with_detail() {
    let base = spawn_bare_server(false).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/predict/supplier", base))
        .json(&supplier_payload())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);
    let body: Value = resp.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().contains("supplier"));
}

#[tokio::test]
async fn test_api_end_to_end() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    // Health: supplier artifact loaded, others placeholder
    let health: Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["models"]["supplier"], "supplier-itest.1");
    assert_eq!(health["models"]["shipment"], "placeholder");
    assert_eq!(health["models"]["inventory"], "placeholder");

    // Supplier prediction through the loaded model: onTime 60 < 85 walks to
    // the +2.0 leaf, sigmoid(2.0)*100 ~= 88.08 -> critical
    let resp = client
        .post(format!("{}/predict/supplier", base))
        .json(&supplier_payload())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let score = body["riskScore"].as_f64().unwrap();
    assert!((score - 88.0797).abs() < 0.01, "unexpected score {}", score);
    assert_eq!(body["riskTier"], "critical");
    assert_eq!(body["modelVersion"], "supplier-itest.1");
    assert_eq!(body["shapValues"][0]["feature"], "onTimeDeliveryRate");
    assert_eq!(body["recommendations"][0], "Monitor onTimeDeliveryRate");

    // Validation failure: 400 with a detail naming the feature
    let mut bad = supplier_payload();
    bad["defectRate"] = json!(99.0);
    let resp = client
        .post(format!("{}/predict/supplier", base))
        .json(&bad)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().contains("defectRate"));

    // Shipment has no artifact: placeholder prediction
    let resp = client
        .post(format!("{}/predict/shipment", base))
        .json(&shipment_payload())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["modelVersion"], "placeholder");
    let score = body["riskScore"].as_f64().unwrap();
    assert!((0.0..100.0).contains(&score));
    assert_eq!(body["shapValues"][0]["feature"], "etaDeviationHours");

    // Stats reflect both successful predictions and the validation failure
    let stats: Value = client
        .get(format!("{}/api/stats", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["predictions_total"].as_u64().unwrap(), 2);
    assert_eq!(stats["model_served"].as_u64().unwrap(), 1);
    assert_eq!(stats["placeholder_served"].as_u64().unwrap(), 1);
    assert_eq!(stats["validation_failures"].as_u64().unwrap(), 1);

    // Journal search by domain
    let journal: Value = client
        .get(format!("{}/api/journal?domain=supplier", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let entries = journal["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["risk_tier"], "critical");

    // Models API and manual reload
    let models: Value = client
        .get(format!("{}/api/models", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(models["supplier"]["status"], "loaded");
    assert_eq!(models["supplier"]["trees"].as_u64().unwrap(), 1);

    let reload: Value = client
        .post(format!("{}/api/models/reload", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let supplier_action = reload["reloaded"]["supplier"].as_str().unwrap();
    assert!(supplier_action.contains("supplier-itest.1"));
}
