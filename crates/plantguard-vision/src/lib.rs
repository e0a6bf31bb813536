//! PlantGuard vision crate: upload validation, disease classification and
//! the confidence gate.
//!
//! The classifier is a trait with an ONNX Runtime backend for production and
//! a mock for tests; validation and gating are pure.

pub mod classifier;
pub mod error;
pub mod gate;
pub mod validator;

pub use classifier::{DiseaseClassifier, DynDiseaseClassifier, MockClassifier, OnnxClassifier};
pub use error::{ValidationError, VisionError};
pub use gate::ConfidenceGate;
pub use validator::{ImageValidator, ValidatedImage};
