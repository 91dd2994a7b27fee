#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value;
use shared::{AppError, Config, Result};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceExt;

use vehicle_api::{
    cache::RateCache,
    create_app_router,
    models::{
        BrandCount, NewUser, PageRequest, SortField, SortOrder, User, UserRole, Vehicle,
        VehicleFilter, VehicleInput, VehiclePatch,
    },
    repositories::{UserRepository, VehicleRepository},
    services::ExchangeRateResolver,
    state::AppState,
};

pub const TEST_PASSWORD: &str = "secret123";

// ============================================================================
// IN-MEMORY REPOSITORIES
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User> {
        let mut users = self.users.write().await;
        if users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(AppError::conflict("Username or email already registered"));
        }
        let now = Utc::now();
        let created = User {
            id: users.len() as i64 + 1,
            username: user.username,
            email: user.email,
            hashed_password: user.hashed_password,
            role: user.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        users.push(created.clone());
        Ok(created)
    }
}

impl InMemoryUserRepository {
    pub async fn deactivate(&self, username: &str) {
        let mut users = self.users.write().await;
        if let Some(user) = users.iter_mut().find(|u| u.username == username) {
            user.is_active = false;
        }
    }
}

#[derive(Default)]
pub struct InMemoryVehicleRepository {
    vehicles: RwLock<Vec<Vehicle>>,
}

fn matches(vehicle: &Vehicle, filter: &VehicleFilter) -> bool {
    !vehicle.is_deleted
        && filter.brand.as_ref().map_or(true, |b| &vehicle.brand == b)
        && filter.year.map_or(true, |y| vehicle.year == y)
        && filter.color.as_ref().map_or(true, |c| &vehicle.color == c)
        && filter.min_price.map_or(true, |p| vehicle.price >= p)
        && filter.max_price.map_or(true, |p| vehicle.price <= p)
}

/// Mirrors the column updates the Postgres `patch` query performs.
fn apply_patch(vehicle: &mut Vehicle, patch: &VehiclePatch) {
    if let Some(plate) = &patch.plate {
        vehicle.plate = plate.clone();
    }
    if let Some(brand) = &patch.brand {
        vehicle.brand = brand.clone();
    }
    if let Some(model) = &patch.model {
        vehicle.model = model.clone();
    }
    if let Some(year) = patch.year {
        vehicle.year = year;
    }
    if let Some(color) = &patch.color {
        vehicle.color = color.clone();
    }
    if let Some(price) = patch.price {
        vehicle.price = price;
    }
    if let Some(description) = &patch.description {
        vehicle.description = description.clone();
    }
}

#[async_trait]
impl VehicleRepository for InMemoryVehicleRepository {
    async fn get_by_id(&self, id: i64, include_deleted: bool) -> Result<Option<Vehicle>> {
        let vehicles = self.vehicles.read().await;
        Ok(vehicles
            .iter()
            .find(|v| v.id == id && (include_deleted || !v.is_deleted))
            .cloned())
    }

    async fn get_by_plate(&self, plate: &str, include_deleted: bool) -> Result<Option<Vehicle>> {
        let vehicles = self.vehicles.read().await;
        Ok(vehicles
            .iter()
            .find(|v| v.plate == plate && (include_deleted || !v.is_deleted))
            .cloned())
    }

    async fn search(&self, filter: &VehicleFilter, page: &PageRequest) -> Result<Vec<Vehicle>> {
        let vehicles = self.vehicles.read().await;
        let mut found: Vec<Vehicle> = vehicles.iter().filter(|v| matches(v, filter)).cloned().collect();

        found.sort_by(|a, b| {
            let ordering = match page.sort_by {
                SortField::Price => a.price.total_cmp(&b.price),
                SortField::Year => a.year.cmp(&b.year),
                SortField::Brand => a.brand.cmp(&b.brand),
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            };
            let ordering = match page.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            };
            ordering.then(a.id.cmp(&b.id))
        });

        Ok(found
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect())
    }

    async fn create(&self, input: &VehicleInput) -> Result<Vehicle> {
        let mut vehicles = self.vehicles.write().await;
        if vehicles.iter().any(|v| v.plate == input.plate) {
            return Err(AppError::conflict(format!(
                "Vehicle with plate {} already exists",
                input.plate
            )));
        }
        let now = Utc::now();
        let vehicle = Vehicle {
            id: vehicles.len() as i64 + 1,
            plate: input.plate.clone(),
            brand: input.brand.clone(),
            model: input.model.clone(),
            year: input.year,
            color: input.color.clone(),
            price: input.price,
            description: input.description.clone(),
            is_deleted: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        vehicles.push(vehicle.clone());
        Ok(vehicle)
    }

    async fn update(&self, id: i64, input: &VehicleInput) -> Result<Option<Vehicle>> {
        let mut vehicles = self.vehicles.write().await;
        let Some(vehicle) = vehicles.iter_mut().find(|v| v.id == id && !v.is_deleted) else {
            return Ok(None);
        };
        vehicle.plate = input.plate.clone();
        vehicle.brand = input.brand.clone();
        vehicle.model = input.model.clone();
        vehicle.year = input.year;
        vehicle.color = input.color.clone();
        vehicle.price = input.price;
        vehicle.description = input.description.clone();
        vehicle.updated_at = Utc::now();
        Ok(Some(vehicle.clone()))
    }

    async fn patch(&self, id: i64, patch: &VehiclePatch) -> Result<Option<Vehicle>> {
        let mut vehicles = self.vehicles.write().await;
        let Some(vehicle) = vehicles.iter_mut().find(|v| v.id == id && !v.is_deleted) else {
            return Ok(None);
        };
        if !patch.is_empty() {
            apply_patch(vehicle, patch);
            vehicle.updated_at = Utc::now();
        }
        Ok(Some(vehicle.clone()))
    }

    async fn delete(&self, id: i64, soft: bool) -> Result<bool> {
        let mut vehicles = self.vehicles.write().await;
        if !soft {
            let before = vehicles.len();
            vehicles.retain(|v| v.id != id);
            return Ok(vehicles.len() < before);
        }
        match vehicles.iter_mut().find(|v| v.id == id && !v.is_deleted) {
            Some(vehicle) => {
                let now = Utc::now();
                vehicle.is_deleted = true;
                vehicle.deleted_at = Some(now);
                vehicle.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn report_by_brand(&self) -> Result<Vec<BrandCount>> {
        let vehicles = self.vehicles.read().await;
        let mut report: Vec<BrandCount> = Vec::new();
        for vehicle in vehicles.iter().filter(|v| !v.is_deleted) {
            match report.iter_mut().find(|r| r.brand == vehicle.brand) {
                Some(row) => row.count += 1,
                None => report.push(BrandCount {
                    brand: vehicle.brand.clone(),
                    count: 1,
                }),
            }
        }
        report.sort_by(|a, b| a.brand.cmp(&b.brand));
        Ok(report)
    }
}

// ============================================================================
// APPLICATION HARNESS
// ============================================================================

pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "JWT_SECRET" => Some("test-secret-key".to_string()),
        "BCRYPT_COST" => Some("4".to_string()),
        "EXCHANGE_RATE_FIXED" => Some("5.25".to_string()),
        _ => None,
    })
    .unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub users: Arc<InMemoryUserRepository>,
    pub vehicles: Arc<InMemoryVehicleRepository>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let users = Arc::new(InMemoryUserRepository::default());
        let vehicles = Arc::new(InMemoryVehicleRepository::default());
        let exchange = ExchangeRateResolver::from_config(
            &config.exchange,
            RateCache::in_memory(config.exchange.cache_ttl_seconds),
        )
        .unwrap();

        let state = Arc::new(AppState::from_parts(
            config,
            users.clone(),
            vehicles.clone(),
            exchange,
            None,
        ));

        Self {
            router: create_app_router(state.clone()),
            state,
            users,
            vehicles,
        }
    }

    /// Creates a user with [`TEST_PASSWORD`] and returns a bearer token for it.
    pub async fn user_token(&self, username: &str, role: UserRole) -> String {
        let hashed_password = self.state.auth.tokens().hash_password(TEST_PASSWORD).unwrap();
        self.users
            .create(NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                hashed_password,
                role,
            })
            .await
            .unwrap();

        self.state
            .auth
            .tokens()
            .issue_access_token(username, role.as_str())
            .unwrap()
            .access_token
    }

    pub async fn admin_token(&self) -> String {
        self.user_token("admin", UserRole::Admin).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(request(Method::GET, uri, token, None)).await
    }

    pub async fn json(&self, method: Method, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(request(method, uri, token, Some(body))).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(request(Method::DELETE, uri, token, None)).await
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn vehicle_json(plate: &str, brand: &str, year: i32, color: &str, price: f64) -> Value {
    serde_json::json!({
        "plate": plate,
        "brand": brand,
        "model": "Model X",
        "year": year,
        "color": color,
        "price": price,
        "description": "Test vehicle",
    })
}
