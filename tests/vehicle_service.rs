mod common;

use axum::http::StatusCode;
use std::sync::Arc;
use vehicle_api::{
    models::{VehicleInput, VehiclePatch, VehicleQuery},
    services::VehicleService,
};

use common::InMemoryVehicleRepository;

fn service() -> VehicleService {
    VehicleService::new(Arc::new(InMemoryVehicleRepository::default()))
}

fn input(plate: &str) -> VehicleInput {
    VehicleInput {
        plate: plate.to_string(),
        brand: "Volkswagen".to_string(),
        model: "Gol".to_string(),
        year: 2018,
        color: "Blue".to_string(),
        price: 45_000.0,
        description: None,
    }
}

#[tokio::test]
async fn test_update_keeps_own_plate() {
    let service = service();
    let created = service.create(input("BRA2E19")).await.unwrap();

    let mut changed = input("BRA2E19");
    changed.color = "Green".to_string();
    let updated = service.update(created.id, changed).await.unwrap();

    assert_eq!(updated.plate, "BRA2E19");
    assert_eq!(updated.color, "Green");
}

#[tokio::test]
async fn test_empty_patch_returns_current_vehicle() {
    let service = service();
    let created = service.create(input("BRA2E19")).await.unwrap();

    let patched = service.patch(created.id, VehiclePatch::default()).await.unwrap();
    assert_eq!(patched.price, created.price);
    assert_eq!(patched.updated_at, created.updated_at);
}

#[tokio::test]
async fn test_patch_rejects_invalid_fields() {
    let service = service();
    let created = service.create(input("BRA2E19")).await.unwrap();

    let patch = VehiclePatch {
        price: Some(-1.0),
        ..Default::default()
    };
    let err = service.patch(created.id, patch).await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_missing_vehicle_is_not_found() {
    let service = service();

    for err in [
        service.get(42).await.unwrap_err(),
        service.delete(42).await.unwrap_err(),
        service.patch(42, VehiclePatch::default()).await.unwrap_err(),
    ] {
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Vehicle with ID 42 not found");
    }
}

#[tokio::test]
async fn test_search_rejects_inverted_price_range() {
    let service = service();
    let query = VehicleQuery {
        min_price: Some(10.0),
        max_price: Some(5.0),
        ..Default::default()
    };

    let err = service.search(query).await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_report_counts_by_brand() {
    let service = service();
    service.create(input("AAA1111")).await.unwrap();
    service.create(input("BBB2222")).await.unwrap();
    let mut fiat = input("CCC3333");
    fiat.brand = "Fiat".to_string();
    service.create(fiat).await.unwrap();

    let report = service.report_by_brand().await.unwrap();
    let pairs: Vec<(String, i64)> = report.into_iter().map(|r| (r.brand, r.count)).collect();
    assert_eq!(
        pairs,
        vec![("Fiat".to_string(), 1), ("Volkswagen".to_string(), 2)]
    );
}
