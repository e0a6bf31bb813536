//! Upload validation: extension allow-list, decodability, minimum size.

use std::path::Path;

use image::RgbImage;
use plantguard_core::config::ImageConfig;

use crate::error::ValidationError;

/// A decoded upload, normalized to 3-channel RGB.
#[derive(Debug, Clone)]
pub struct ValidatedImage {
    pub image: RgbImage,
}

impl ValidatedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Checks that an upload is an image worth classifying. Pure: no I/O.
#[derive(Debug, Clone)]
pub struct ImageValidator {
    min_dimension: u32,
    allowed_extensions: Vec<String>,
}

impl ImageValidator {
    pub fn new(config: &ImageConfig) -> Self {
        Self {
            min_dimension: config.min_dimension,
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Validate `bytes` uploaded under `filename`.
    ///
    /// Order: extension, decode, then dimensions.
    pub fn validate(&self, filename: &str, bytes: &[u8]) -> Result<ValidatedImage, ValidationError> {
        if filename.is_empty() {
            return Err(ValidationError::NoFileSelected);
        }

        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::UnsupportedType {
                extension,
                allowed: self.allowed_list(),
            });
        }

        let decoded = image::load_from_memory(bytes).map_err(|e| {
            tracing::debug!(error = %e, filename, "Upload failed to decode");
            ValidationError::Corrupted
        })?;

        let image = decoded.to_rgb8();
        let (width, height) = image.dimensions();
        if width < self.min_dimension || height < self.min_dimension {
            return Err(ValidationError::TooSmall { width, height });
        }

        Ok(ValidatedImage { image })
    }

    fn allowed_list(&self) -> String {
        self.allowed_extensions
            .iter()
            .map(|e| format!(".{}", e))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for ImageValidator {
    fn default() -> Self {
        Self::new(&ImageConfig::default())
    }
}
