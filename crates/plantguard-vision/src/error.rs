//! Error types for image validation and classification.

use plantguard_core::error::PlantGuardError;

/// An upload the pipeline refuses to classify.
///
/// Display strings are user-facing; the API returns them verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("No image provided")]
    MissingImage,
    #[error("No image selected")]
    NoFileSelected,
    #[error("Invalid file type. Please upload an image file ({allowed})")]
    UnsupportedType { extension: String, allowed: String },
    #[error("Invalid or corrupted image file. Please upload a clear photo of plant leaves.")]
    Corrupted,
    #[error("Image is too small. Please upload a clear, high-quality photo of your plant.")]
    TooSmall { width: u32, height: u32 },
}

/// Errors from the vision stage of the detect pipeline.
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("This doesn't appear to be a plant image. Please upload a clear photo of plant leaves for disease detection.")]
    LowConfidence { confidence: f32, threshold: f32 },
    #[error("classifier error: {0}")]
    Classifier(String),
}

impl VisionError {
    /// Follow-up hint shown alongside the error, if any.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            VisionError::LowConfidence { .. } => {
                Some("Make sure your photo shows plant leaves clearly with good lighting.")
            }
            _ => None,
        }
    }
}

impl From<VisionError> for PlantGuardError {
    fn from(err: VisionError) -> Self {
        PlantGuardError::Model(err.to_string())
    }
}
