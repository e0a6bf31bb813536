pub mod config;
pub mod error;
pub mod types;

pub use config::PlantGuardConfig;
pub use error::{PlantGuardError, Result};
pub use types::*;
