pub mod auth;
pub mod request_logging;

pub use auth::{require_auth, AdminUser, CurrentUser};
pub use request_logging::{request_logging_middleware, PROCESS_TIME_HEADER, REQUEST_ID_HEADER};
