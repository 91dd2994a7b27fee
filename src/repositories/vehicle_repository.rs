use async_trait::async_trait;
use chrono::Utc;
use shared::Result;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use crate::models::{
    BrandCount, PageRequest, Vehicle, VehicleFilter, VehicleInput, VehiclePatch,
};

use super::map_unique_violation;

#[async_trait]
pub trait VehicleRepository: Send + Sync {
    async fn get_by_id(&self, id: i64, include_deleted: bool) -> Result<Option<Vehicle>>;
    async fn get_by_plate(&self, plate: &str, include_deleted: bool) -> Result<Option<Vehicle>>;
    async fn search(&self, filter: &VehicleFilter, page: &PageRequest) -> Result<Vec<Vehicle>>;
    async fn create(&self, input: &VehicleInput) -> Result<Vehicle>;
    /// Replaces every editable field. `None` when the vehicle is absent or deleted.
    async fn update(&self, id: i64, input: &VehicleInput) -> Result<Option<Vehicle>>;
    /// Applies only the provided fields. `None` when the vehicle is absent or deleted.
    async fn patch(&self, id: i64, patch: &VehiclePatch) -> Result<Option<Vehicle>>;
    /// Soft delete marks the row; hard delete removes it.
    async fn delete(&self, id: i64, soft: bool) -> Result<bool>;
    async fn report_by_brand(&self) -> Result<Vec<BrandCount>>;
}

const VEHICLE_COLUMNS: &str = "id, plate, brand, model, year, color, price, description, \
                               is_deleted, created_at, updated_at, deleted_at";

fn plate_conflict(plate: &str) -> String {
    format!("Vehicle with plate {} already exists", plate)
}

#[derive(Debug, Clone)]
pub struct PgVehicleRepository {
    pool: PgPool,
}

impl PgVehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &VehicleFilter) {
    builder.push(" WHERE is_deleted = FALSE");

    if let Some(brand) = &filter.brand {
        builder.push(" AND brand = ").push_bind(brand.clone());
    }
    if let Some(year) = filter.year {
        builder.push(" AND year = ").push_bind(year);
    }
    if let Some(color) = &filter.color {
        builder.push(" AND color = ").push_bind(color.clone());
    }
    if let Some(min_price) = filter.min_price {
        builder.push(" AND price >= ").push_bind(min_price);
    }
    if let Some(max_price) = filter.max_price {
        builder.push(" AND price <= ").push_bind(max_price);
    }
}

#[async_trait]
impl VehicleRepository for PgVehicleRepository {
    async fn get_by_id(&self, id: i64, include_deleted: bool) -> Result<Option<Vehicle>> {
        let sql = format!(
            "SELECT {} FROM vehicles WHERE id = $1 AND ($2 OR is_deleted = FALSE)",
            VEHICLE_COLUMNS
        );
        let vehicle = sqlx::query_as::<_, Vehicle>(&sql)
            .bind(id)
            .bind(include_deleted)
            .fetch_optional(&self.pool)
            .await?;
        Ok(vehicle)
    }

    async fn get_by_plate(&self, plate: &str, include_deleted: bool) -> Result<Option<Vehicle>> {
        let sql = format!(
            "SELECT {} FROM vehicles WHERE plate = $1 AND ($2 OR is_deleted = FALSE)",
            VEHICLE_COLUMNS
        );
        let vehicle = sqlx::query_as::<_, Vehicle>(&sql)
            .bind(plate)
            .bind(include_deleted)
            .fetch_optional(&self.pool)
            .await?;
        Ok(vehicle)
    }

    async fn search(&self, filter: &VehicleFilter, page: &PageRequest) -> Result<Vec<Vehicle>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM vehicles",
            VEHICLE_COLUMNS
        ));
        push_filters(&mut builder, filter);

        // Column and direction come from closed enums, never from raw input.
        builder.push(format!(
            " ORDER BY {} {}, id ASC",
            page.sort_by.column(),
            page.sort_order.keyword()
        ));
        builder.push(" LIMIT ").push_bind(page.limit());
        builder.push(" OFFSET ").push_bind(page.offset());

        debug!(sql = builder.sql(), "vehicle search");

        let vehicles = builder
            .build_query_as::<Vehicle>()
            .fetch_all(&self.pool)
            .await?;
        Ok(vehicles)
    }

    async fn create(&self, input: &VehicleInput) -> Result<Vehicle> {
        let sql = format!(
            "INSERT INTO vehicles (plate, brand, model, year, color, price, description) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            VEHICLE_COLUMNS
        );
        sqlx::query_as::<_, Vehicle>(&sql)
            .bind(&input.plate)
            .bind(&input.brand)
            .bind(&input.model)
            .bind(input.year)
            .bind(&input.color)
            .bind(input.price)
            .bind(&input.description)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, plate_conflict(&input.plate)))
    }

    async fn update(&self, id: i64, input: &VehicleInput) -> Result<Option<Vehicle>> {
        let sql = format!(
            "UPDATE vehicles SET plate = $2, brand = $3, model = $4, year = $5, color = $6, \
             price = $7, description = $8, updated_at = NOW() \
             WHERE id = $1 AND is_deleted = FALSE RETURNING {}",
            VEHICLE_COLUMNS
        );
        sqlx::query_as::<_, Vehicle>(&sql)
            .bind(id)
            .bind(&input.plate)
            .bind(&input.brand)
            .bind(&input.model)
            .bind(input.year)
            .bind(&input.color)
            .bind(input.price)
            .bind(&input.description)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, plate_conflict(&input.plate)))
    }

    async fn patch(&self, id: i64, patch: &VehiclePatch) -> Result<Option<Vehicle>> {
        if patch.is_empty() {
            return self.get_by_id(id, false).await;
        }

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE vehicles SET updated_at = NOW()");
        if let Some(plate) = &patch.plate {
            builder.push(", plate = ").push_bind(plate.clone());
        }
        if let Some(brand) = &patch.brand {
            builder.push(", brand = ").push_bind(brand.clone());
        }
        if let Some(model) = &patch.model {
            builder.push(", model = ").push_bind(model.clone());
        }
        if let Some(year) = patch.year {
            builder.push(", year = ").push_bind(year);
        }
        if let Some(color) = &patch.color {
            builder.push(", color = ").push_bind(color.clone());
        }
        if let Some(price) = patch.price {
            builder.push(", price = ").push_bind(price);
        }
        // Binding `None` writes NULL, so an explicit `null` clears the column.
        if let Some(description) = &patch.description {
            builder.push(", description = ").push_bind(description.clone());
        }
        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND is_deleted = FALSE RETURNING ")
            .push(VEHICLE_COLUMNS);

        let conflict = plate_conflict(patch.plate.as_deref().unwrap_or_default());
        builder
            .build_query_as::<Vehicle>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, conflict))
    }

    async fn delete(&self, id: i64, soft: bool) -> Result<bool> {
        let result = if soft {
            sqlx::query(
                "UPDATE vehicles SET is_deleted = TRUE, deleted_at = $2, updated_at = $2 \
                 WHERE id = $1 AND is_deleted = FALSE",
            )
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
        } else {
            sqlx::query("DELETE FROM vehicles WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?
        };
        Ok(result.rows_affected() > 0)
    }

    async fn report_by_brand(&self) -> Result<Vec<BrandCount>> {
        let rows = sqlx::query_as::<_, BrandCount>(
            "SELECT brand, COUNT(id) AS count FROM vehicles \
             WHERE is_deleted = FALSE GROUP BY brand ORDER BY brand ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
