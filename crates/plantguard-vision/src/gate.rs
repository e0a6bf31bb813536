use plantguard_core::config::DEFAULT_MIN_CONFIDENCE;
use plantguard_core::Classification;

use crate::error::VisionError;

/// Rejects classifications too uncertain to be a plant photo.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceGate {
    threshold: f32,
}

impl ConfidenceGate {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Pass `classification` through, or fail with `LowConfidence`.
    ///
    /// A confidence equal to the threshold passes; NaN never does.
    pub fn check(&self, classification: Classification) -> Result<Classification, VisionError> {
        if classification.confidence.is_nan() || classification.confidence < self.threshold {
            tracing::info!(
                label = %classification.label,
                confidence = classification.confidence,
                threshold = self.threshold,
                "Classification below confidence threshold"
            );
            return Err(VisionError::LowConfidence {
                confidence: classification.confidence,
                threshold: self.threshold,
            });
        }
        Ok(classification)
    }
}

impl Default for ConfidenceGate {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CONFIDENCE)
    }
}
