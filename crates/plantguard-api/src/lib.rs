//! PlantGuard API crate - axum HTTP server, route handlers, and the detect
//! and chat pipelines.

pub mod error;
pub mod handlers;
pub mod pipeline;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
