use shared::{AppError, Result};
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use crate::models::{
    BrandCount, VehicleInput, VehiclePatch, VehicleQuery, VehicleResponse,
};
use crate::repositories::VehicleRepository;

/// Business rules on top of the vehicle repository.
#[derive(Clone)]
pub struct VehicleService {
    repository: Arc<dyn VehicleRepository>,
}

fn not_found(id: i64) -> AppError {
    AppError::not_found(format!("Vehicle with ID {} not found", id))
}

impl VehicleService {
    pub fn new(repository: Arc<dyn VehicleRepository>) -> Self {
        Self { repository }
    }

    pub async fn search(&self, query: VehicleQuery) -> Result<Vec<VehicleResponse>> {
        query.validate()?;
        if let (Some(min), Some(max)) = (query.min_price, query.max_price) {
            if min > max {
                return Err(AppError::bad_request(
                    "min_price must not be greater than max_price",
                ));
            }
        }

        let (filter, page) = query.into_parts();
        let vehicles = self.repository.search(&filter, &page).await?;
        info!(
            brand = ?filter.brand,
            year = ?filter.year,
            color = ?filter.color,
            min_price = ?filter.min_price,
            max_price = ?filter.max_price,
            page = page.page,
            results = vehicles.len(),
            "vehicle search"
        );
        Ok(vehicles.into_iter().map(Into::into).collect())
    }

    pub async fn get(&self, id: i64) -> Result<VehicleResponse> {
        match self.repository.get_by_id(id, false).await? {
            Some(vehicle) => Ok(vehicle.into()),
            None => {
                warn!(vehicle_id = id, "vehicle not found");
                Err(not_found(id))
            }
        }
    }

    pub async fn create(&self, input: VehicleInput) -> Result<VehicleResponse> {
        input.validate()?;
        self.ensure_plate_available(&input.plate, None).await?;

        let vehicle = self.repository.create(&input).await?;
        info!(
            vehicle_id = vehicle.id,
            brand = %vehicle.brand,
            model = %vehicle.model,
            "vehicle created"
        );
        Ok(vehicle.into())
    }

    pub async fn update(&self, id: i64, input: VehicleInput) -> Result<VehicleResponse> {
        input.validate()?;
        self.ensure_plate_available(&input.plate, Some(id)).await?;

        match self.repository.update(id, &input).await? {
            Some(vehicle) => {
                info!(vehicle_id = id, brand = %vehicle.brand, model = %vehicle.model, "vehicle updated");
                Ok(vehicle.into())
            }
            None => {
                warn!(vehicle_id = id, "vehicle to update not found");
                Err(not_found(id))
            }
        }
    }

    pub async fn patch(&self, id: i64, patch: VehiclePatch) -> Result<VehicleResponse> {
        patch.validate()?;
        if let Some(plate) = &patch.plate {
            self.ensure_plate_available(plate, Some(id)).await?;
        }

        match self.repository.patch(id, &patch).await? {
            Some(vehicle) => {
                info!(vehicle_id = id, "vehicle partially updated");
                Ok(vehicle.into())
            }
            None => {
                warn!(vehicle_id = id, "vehicle to patch not found");
                Err(not_found(id))
            }
        }
    }

    /// Soft delete.
    pub async fn delete(&self, id: i64) -> Result<()> {
        if self.repository.delete(id, true).await? {
            info!(vehicle_id = id, "vehicle removed (soft delete)");
            Ok(())
        } else {
            warn!(vehicle_id = id, "vehicle to remove not found");
            Err(not_found(id))
        }
    }

    pub async fn report_by_brand(&self) -> Result<Vec<BrandCount>> {
        let rows = self.repository.report_by_brand().await?;
        info!(brands = rows.len(), "brand report generated");
        Ok(rows)
    }

    /// A plate stays reserved by soft-deleted vehicles too.
    async fn ensure_plate_available(&self, plate: &str, owner: Option<i64>) -> Result<()> {
        match self.repository.get_by_plate(plate, true).await? {
            Some(existing) if Some(existing.id) != owner => {
                warn!(plate, existing_id = existing.id, "duplicate plate rejected");
                Err(AppError::conflict(format!(
                    "Vehicle with plate {} already exists",
                    plate
                )))
            }
            _ => Ok(()),
        }
    }
}
