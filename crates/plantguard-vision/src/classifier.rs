//! Disease classifier trait and implementations.
//!
//! - `OnnxClassifier` runs an image-classification ONNX export (ResNet-50
//!   fine-tuned on plant leaves) via ort. This is the production backend.
//! - `MockClassifier` returns a fixed label for testing.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use image::imageops::FilterType;
use image::RgbImage;
use ort::session::Session;
use ort::value::TensorRef;
use plantguard_core::Classification;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::VisionError;

/// ImageNet channel statistics the model was trained with.
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Maps a decoded RGB image to its most likely label.
pub trait DiseaseClassifier: Send + Sync {
    /// Classify one image. Confidence is a percentage in 0..=100.
    fn classify(
        &self,
        image: &RgbImage,
    ) -> impl std::future::Future<Output = Result<Classification, VisionError>> + Send;

    /// Short backend name, reported by the health endpoint.
    fn name(&self) -> &str;
}

/// Object-safe version of [`DiseaseClassifier`] for dynamic dispatch.
///
/// Every `DiseaseClassifier` implements this through the blanket impl below,
/// so `Arc<dyn DynDiseaseClassifier>` can live in shared state.
pub trait DynDiseaseClassifier: Send + Sync {
    fn classify_boxed<'a>(
        &'a self,
        image: &'a RgbImage,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Classification, VisionError>> + Send + 'a>,
    >;

    fn name(&self) -> &str;
}

impl<T: DiseaseClassifier> DynDiseaseClassifier for T {
    fn classify_boxed<'a>(
        &'a self,
        image: &'a RgbImage,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Classification, VisionError>> + Send + 'a>,
    > {
        Box::pin(self.classify(image))
    }

    fn name(&self) -> &str {
        DiseaseClassifier::name(self)
    }
}

// ---------------------------------------------------------------------------
// OnnxClassifier
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ModelConfig {
    id2label: HashMap<String, String>,
}

/// ONNX Runtime-backed classifier.
///
/// Expects a model directory containing:
/// - `model.onnx`: takes `[1, 3, N, N]` float pixels, returns `[1, classes]` logits
/// - `config.json`: a HuggingFace config with an `id2label` map
pub struct OnnxClassifier {
    session: Arc<Mutex<Session>>,
    labels: Arc<Vec<String>>,
    input_size: u32,
}

impl std::fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("classes", &self.labels.len())
            .field("input_size", &self.input_size)
            .finish()
    }
}

impl OnnxClassifier {
    /// Load the model and its label table from `model_dir`.
    pub fn from_directory(model_dir: &Path, input_size: u32) -> Result<Self, VisionError> {
        let model_path = model_dir.join("model.onnx");
        let config_path = model_dir.join("config.json");

        if !model_path.exists() {
            return Err(VisionError::Classifier(format!(
                "ONNX model not found at {}",
                model_path.display()
            )));
        }
        if !config_path.exists() {
            return Err(VisionError::Classifier(format!(
                "Model config not found at {}",
                config_path.display()
            )));
        }

        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| VisionError::Classifier(format!("Read model config: {}", e)))?;
        let labels = parse_labels(&raw)?;

        let session = Session::builder()
            .map_err(|e| VisionError::Classifier(format!("ONNX session builder: {}", e)))?
            .with_intra_threads(1)
            .map_err(|e| VisionError::Classifier(format!("ONNX set threads: {}", e)))?
            .commit_from_file(&model_path)
            .map_err(|e| VisionError::Classifier(format!("ONNX load model: {}", e)))?;

        info!(
            model = %model_path.display(),
            classes = labels.len(),
            input_size,
            "Loaded ONNX disease classifier"
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            labels: Arc::new(labels),
            input_size,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    fn classify_sync(
        session: &Mutex<Session>,
        labels: &[String],
        input_size: u32,
        image: &RgbImage,
    ) -> Result<Classification, VisionError> {
        let pixels = preprocess(image, input_size);
        let size = input_size as usize;
        let array = ndarray::Array4::from_shape_vec((1, 3, size, size), pixels)
            .map_err(|e| VisionError::Classifier(format!("pixel_values array: {}", e)))?;
        let input = TensorRef::from_array_view(&array)
            .map_err(|e| VisionError::Classifier(format!("TensorRef pixel_values: {}", e)))?;

        let mut session = session
            .lock()
            .map_err(|e| VisionError::Classifier(format!("Session lock poisoned: {}", e)))?;
        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| VisionError::Classifier(format!("ONNX inference failed: {}", e)))?;

        let (_, logits) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| VisionError::Classifier(format!("Extract logits: {}", e)))?;

        if logits.len() != labels.len() {
            return Err(VisionError::Classifier(format!(
                "Model produced {} logits for {} labels",
                logits.len(),
                labels.len()
            )));
        }

        let probabilities = softmax(logits);
        let (index, probability) = argmax(&probabilities)
            .ok_or_else(|| VisionError::Classifier("Model produced no logits".to_string()))?;

        Ok(Classification::new(labels[index].clone(), probability * 100.0))
    }
}

impl DiseaseClassifier for OnnxClassifier {
    async fn classify(&self, image: &RgbImage) -> Result<Classification, VisionError> {
        let session = Arc::clone(&self.session);
        let labels = Arc::clone(&self.labels);
        let input_size = self.input_size;
        let image = image.clone();

        let result = tokio::task::spawn_blocking(move || {
            Self::classify_sync(&session, &labels, input_size, &image)
        })
        .await
        .map_err(|e| VisionError::Classifier(format!("Classifier task panicked: {}", e)))??;

        debug!(label = %result.label, confidence = result.confidence, "Classified image");
        Ok(result)
    }

    fn name(&self) -> &str {
        "onnx"
    }
}

/// Read `id2label` from a HuggingFace `config.json` into index order.
fn parse_labels(raw: &str) -> Result<Vec<String>, VisionError> {
    let config: ModelConfig = serde_json::from_str(raw)
        .map_err(|e| VisionError::Classifier(format!("Parse model config: {}", e)))?;

    let mut indexed = Vec::with_capacity(config.id2label.len());
    for (id, label) in config.id2label {
        let index: usize = id
            .parse()
            .map_err(|_| VisionError::Classifier(format!("Non-numeric label id: {}", id)))?;
        indexed.push((index, label));
    }
    indexed.sort_by_key(|(index, _)| *index);

    for (expected, (index, _)) in indexed.iter().enumerate() {
        if *index != expected {
            return Err(VisionError::Classifier(format!(
                "Label ids are not contiguous: missing {}",
                expected
            )));
        }
    }
    if indexed.is_empty() {
        return Err(VisionError::Classifier("id2label is empty".to_string()));
    }

    Ok(indexed.into_iter().map(|(_, label)| label).collect())
}

/// Resize to `size`x`size` and lay out normalized pixels as CHW.
fn preprocess(image: &RgbImage, size: u32) -> Vec<f32> {
    let resized = image::imageops::resize(image, size, size, FilterType::Triangle);
    let plane = (size * size) as usize;
    let mut chw = vec![0.0f32; 3 * plane];

    for (i, pixel) in resized.pixels().enumerate() {
        for c in 0..3 {
            let value = pixel[c] as f32 / 255.0;
            chw[c * plane + i] = (value - MEAN[c]) / STD[c];
        }
    }
    chw
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|v| v / sum).collect()
}

fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

// ---------------------------------------------------------------------------
// MockClassifier
// ---------------------------------------------------------------------------

/// Classifier that always answers with a fixed label and confidence.
///
/// Counts calls so tests can assert the model was (or was not) consulted.
#[derive(Debug)]
pub struct MockClassifier {
    label: String,
    confidence: f32,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl MockClassifier {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// A classifier whose every call fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            label: String::new(),
            confidence: 0.0,
            failure: Some(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DiseaseClassifier for MockClassifier {
    async fn classify(&self, _image: &RgbImage) -> Result<Classification, VisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(message) => Err(VisionError::Classifier(message.clone())),
            None => Ok(Classification::new(self.label.clone(), self.confidence)),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
