use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use shared::Result;
use std::sync::Arc;
use tracing::info;

use crate::{
    middleware::{AdminUser, CurrentUser},
    models::{BrandCount, VehicleInput, VehiclePatch, VehicleQuery, VehicleResponse},
    state::AppState,
};

// ============================================================================
// READ ENDPOINTS (any authenticated user)
// ============================================================================

/// GET {prefix}/vehicles - Filtered, paginated listing
pub async fn list_vehicles(
    State(state): State<Arc<AppState>>,
    current_user: CurrentUser,
    Query(query): Query<VehicleQuery>,
) -> Result<Json<Vec<VehicleResponse>>> {
    info!(username = %current_user.username, "listing vehicles");
    let vehicles = state.vehicles.search(query).await?;
    Ok(Json(vehicles))
}

/// GET {prefix}/vehicles/:id
pub async fn get_vehicle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<VehicleResponse>> {
    Ok(Json(state.vehicles.get(id).await?))
}

/// GET {prefix}/vehicles/reports/by-brand
pub async fn report_by_brand(State(state): State<Arc<AppState>>) -> Result<Json<Vec<BrandCount>>> {
    Ok(Json(state.vehicles.report_by_brand().await?))
}

// ============================================================================
// WRITE ENDPOINTS (ADMIN only)
// ============================================================================

/// POST {prefix}/vehicles
pub async fn create_vehicle(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<VehicleInput>,
) -> Result<(StatusCode, Json<VehicleResponse>)> {
    info!(username = %admin.username, plate = %payload.plate, "creating vehicle");
    let vehicle = state.vehicles.create(payload).await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

/// PUT {prefix}/vehicles/:id - Full replacement
pub async fn update_vehicle(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<VehicleInput>,
) -> Result<Json<VehicleResponse>> {
    info!(username = %admin.username, vehicle_id = id, "updating vehicle");
    Ok(Json(state.vehicles.update(id, payload).await?))
}

/// PATCH {prefix}/vehicles/:id - Partial update
pub async fn patch_vehicle(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<VehiclePatch>,
) -> Result<Json<VehicleResponse>> {
    info!(username = %admin.username, vehicle_id = id, "patching vehicle");
    Ok(Json(state.vehicles.patch(id, payload).await?))
}

/// DELETE {prefix}/vehicles/:id - Soft delete
pub async fn delete_vehicle(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    info!(username = %admin.username, vehicle_id = id, "deleting vehicle");
    state.vehicles.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn create_vehicles_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_vehicles).post(create_vehicle))
        .route("/reports/by-brand", get(report_by_brand))
        .route(
            "/:id",
            get(get_vehicle)
                .put(update_vehicle)
                .patch(patch_vehicle)
                .delete(delete_vehicle),
        )
}
