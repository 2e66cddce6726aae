//! Atelier Server — HTTP surface for studio sign-in and brand
//! administration.

pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use routes::router;
pub use state::AppState;
