pub mod user;
pub mod vehicle;

pub use user::{LoginRequest, NewUser, RegisterRequest, User, UserResponse, UserRole};
pub use vehicle::{
    BrandCount, PageRequest, SortField, SortOrder, Vehicle, VehicleFilter, VehicleInput,
    VehiclePatch, VehicleQuery, VehicleResponse,
};
