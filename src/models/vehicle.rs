use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use validator::Validate;

// ============================================================================
// VEHICLE MODEL
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: i64,
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    pub price: f64,
    pub description: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

// ============================================================================
// REQUEST MODELS
// ============================================================================

/// Body for create (POST) and full update (PUT).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VehicleInput {
    #[validate(length(min = 7, max = 10, message = "Plate must be between 7 and 10 characters"))]
    pub plate: String,

    #[validate(length(min = 1, max = 50))]
    pub brand: String,

    #[validate(length(min = 1, max = 100))]
    pub model: String,

    #[validate(range(min = 1900, max = 2100, message = "Year must be between 1900 and 2100"))]
    pub year: i32,

    #[validate(length(min = 1, max = 30))]
    pub color: String,

    #[validate(range(exclusive_min = 0.0, message = "Price must be greater than zero"))]
    pub price: f64,

    #[validate(length(max = 500))]
    pub description: Option<String>,
}

/// Partial update (PATCH); only provided fields are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct VehiclePatch {
    #[validate(length(min = 7, max = 10, message = "Plate must be between 7 and 10 characters"))]
    pub plate: Option<String>,

    #[validate(length(min = 1, max = 50))]
    pub brand: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub model: Option<String>,

    #[validate(range(min = 1900, max = 2100, message = "Year must be between 1900 and 2100"))]
    pub year: Option<i32>,

    #[validate(length(min = 1, max = 30))]
    pub color: Option<String>,

    #[validate(range(exclusive_min = 0.0, message = "Price must be greater than zero"))]
    pub price: Option<f64>,

    /// `None` leaves the column alone; `Some(None)` (JSON `null`) clears it.
    #[serde(
        default,
        deserialize_with = "deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    #[validate(length(max = 500))]
    pub description: Option<Option<String>>,
}

/// Keeps an explicit `null` distinct from a missing field.
fn deserialize_nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl VehiclePatch {
    pub fn is_empty(&self) -> bool {
        self.plate.is_none()
            && self.brand.is_none()
            && self.model.is_none()
            && self.year.is_none()
            && self.color.is_none()
            && self.price.is_none()
            && self.description.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Price,
    Year,
    Brand,
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    /// Column name; the enum is the whitelist for ORDER BY.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Price => "price",
            SortField::Year => "year",
            SortField::Brand => "brand",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Query string accepted by `GET /vehicles`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VehicleQuery {
    pub brand: Option<String>,
    pub year: Option<i32>,
    pub color: Option<String>,

    #[validate(range(min = 0.0, message = "min_price must not be negative"))]
    pub min_price: Option<f64>,

    #[validate(range(min = 0.0, message = "max_price must not be negative"))]
    pub max_price: Option<f64>,

    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: u32,

    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100, message = "page_size must be between 1 and 100"))]
    pub page_size: u32,

    #[serde(default)]
    pub sort_by: SortField,

    #[serde(default)]
    pub sort_order: SortOrder,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    10
}

impl Default for VehicleQuery {
    fn default() -> Self {
        Self {
            brand: None,
            year: None,
            color: None,
            min_price: None,
            max_price: None,
            page: default_page(),
            page_size: default_page_size(),
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
        }
    }
}

/// Repository-level search criteria. Soft-deleted rows are always excluded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleFilter {
    pub brand: Option<String>,
    pub year: Option<i32>,
    pub color: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl PageRequest {
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl VehicleQuery {
    pub fn into_parts(self) -> (VehicleFilter, PageRequest) {
        (
            VehicleFilter {
                brand: non_blank(self.brand),
                year: self.year,
                color: non_blank(self.color),
                min_price: self.min_price,
                max_price: self.max_price,
            },
            PageRequest {
                page: self.page,
                page_size: self.page_size,
                sort_by: self.sort_by,
                sort_order: self.sort_order,
            },
        )
    }
}

/// Empty query values (`?brand=`) mean "no filter".
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ============================================================================
// RESPONSE MODELS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleResponse {
    pub id: i64,
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    pub price: f64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            id: vehicle.id,
            plate: vehicle.plate,
            brand: vehicle.brand,
            model: vehicle.model,
            year: vehicle.year,
            color: vehicle.color,
            price: vehicle.price,
            description: vehicle.description,
            created_at: vehicle.created_at,
            updated_at: vehicle.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct BrandCount {
    pub brand: String,
    pub count: i64,
}
