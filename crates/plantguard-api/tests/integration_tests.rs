//! HTTP-level tests for the PlantGuard API.
//!
//! Every test builds its own router around mock collaborators (classifier,
//! language model, speech, weather), so no network or model file is needed.

use std::io::Cursor;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::Value;
use tower::ServiceExt;

use plantguard_api::create_router;
use plantguard_api::handlers::{ChatResponse, DetectResponse, HealthResponse, WeatherResponse};
use plantguard_api::state::AppState;
use plantguard_chat::{
    fallback_treatment, MockLanguageModel, MockSpeechSynthesizer, MockWeatherProvider,
    VoiceSynthesizer, WeatherEnricher,
};
use plantguard_core::{PlantGuardConfig, WeatherQuery, WeatherSnapshot};
use plantguard_vision::MockClassifier;

// =============================================================================
// Helpers
// =============================================================================

const BOUNDARY: &str = "plantguard-test-boundary";

const TREATMENT_JSON: &str = r#"{"cause": "Alternaria solani", "treatment": "Apply copper fungicide weekly.", "prevention": "Rotate crops."}"#;

struct Harness {
    state: AppState,
    classifier: Arc<MockClassifier>,
    llm: Arc<MockLanguageModel>,
    speech: Arc<MockSpeechSynthesizer>,
    weather: Arc<MockWeatherProvider>,
}

impl Harness {
    fn new(classifier: MockClassifier, llm: MockLanguageModel) -> Self {
        Self::with(
            PlantGuardConfig::default(),
            classifier,
            llm,
            MockWeatherProvider::failing(),
        )
    }

    fn with(
        config: PlantGuardConfig,
        classifier: MockClassifier,
        llm: MockLanguageModel,
        weather: MockWeatherProvider,
    ) -> Self {
        let classifier = Arc::new(classifier);
        let llm = Arc::new(llm);
        let speech = Arc::new(MockSpeechSynthesizer::returning(b"mp3-bytes".to_vec()));
        let weather = Arc::new(weather);

        let state = AppState::new(
            config,
            classifier.clone(),
            llm.clone(),
            WeatherEnricher::new(weather.clone(), "Karachi"),
            VoiceSynthesizer::new(speech.clone()),
        );

        Self {
            state,
            classifier,
            llm,
            speech,
            weather,
        }
    }

    fn app(&self) -> axum::Router {
        create_router(self.state.clone())
    }
}

fn snapshot() -> WeatherSnapshot {
    WeatherSnapshot {
        temp_c: 34.5,
        feels_like_c: 38.1,
        humidity_pct: 82.0,
        description: "Haze".to_string(),
        icon: "50d".to_string(),
        wind_kmh: 12.0,
        city: "Karachi".to_string(),
        country: "PK".to_string(),
        pressure: 1004.0,
        visibility_km: 3.0,
    }
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([34, 139, 34]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// Build a multipart/form-data detect request.
fn detect_request(image: Option<(&str, &[u8])>, session_id: Option<&str>) -> Request<Body> {
    let mut body = Vec::new();
    if let Some((filename, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(session_id) = session_id {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"session_id\"\r\n\r\n{session_id}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::post("/api/detect")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

/// Read full response body bytes.
async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(resp: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health() {
    let harness = Harness::new(
        MockClassifier::new("Tomato___healthy", 90.0),
        MockLanguageModel::failing(),
    );
    let resp = harness.app().oneshot(get("/health")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let health: HealthResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.active_sessions, 0);
    assert_eq!(health.classifier, "mock");
    assert!(!health.version.is_empty());
}

// =============================================================================
// Detect
// =============================================================================

#[tokio::test]
async fn test_detect_healthy_plant() {
    let harness = Harness::new(
        MockClassifier::new("Tomato___healthy", 92.3),
        MockLanguageModel::replying(TREATMENT_JSON),
    );
    let image = png(128, 96);
    let resp = harness
        .app()
        .oneshot(detect_request(Some(("leaf.png", &image)), Some("user-1")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let detect: DetectResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(detect.disease, "Tomato - healthy");
    assert_eq!(detect.disease_label, "Tomato___healthy");
    assert_eq!(detect.plant_type, "Tomato");
    assert!(detect.is_healthy);
    assert_eq!(detect.confidence, 92.3);
    assert_eq!(detect.cause, "Alternaria solani");
    assert_eq!(detect.treatment, "Apply copper fungicide weekly.");
    assert_eq!(detect.prevention, "Rotate crops.");
    assert_eq!(
        detect.message,
        "Great news! Your plant appears healthy with 92.3% confidence. Apply copper fungicide weekly."
    );
    assert_eq!(detect.audio.as_deref(), Some("bXAzLWJ5dGVz"));
    assert_eq!(detect.session_id, "user-1");

    assert_eq!(harness.speech.texts(), vec![detect.message.clone()]);
    let stored = harness.state.sessions.get("user-1").unwrap();
    assert_eq!(stored.diagnostic.display_name, "Tomato - healthy");
    assert_eq!(stored.treatment.cause, "Alternaria solani");
}

#[tokio::test]
async fn test_detect_disease_message() {
    let harness = Harness::new(
        MockClassifier::new("Potato___Late_blight", 71.456),
        MockLanguageModel::replying(TREATMENT_JSON),
    );
    let image = png(64, 64);
    let resp = harness
        .app()
        .oneshot(detect_request(Some(("leaf.JPG", &image)), None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["is_healthy"], false);
    assert_eq!(json["confidence"], 71.46);
    assert_eq!(
        json["message"],
        "Detection complete. I've identified Potato - Late blight with 71.5% confidence. Apply copper fungicide weekly."
    );
    assert_eq!(json["session_id"], "default");
    assert!(harness.state.sessions.get("default").is_some());
}

#[tokio::test]
async fn test_detect_small_image_skips_classifier() {
    let harness = Harness::new(
        MockClassifier::new("Tomato___healthy", 92.3),
        MockLanguageModel::replying(TREATMENT_JSON),
    );
    let image = png(40, 40);
    let resp = harness
        .app()
        .oneshot(detect_request(Some(("leaf.png", &image)), Some("s")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(
        json["error"],
        "Image is too small. Please upload a clear, high-quality photo of your plant."
    );
    assert_eq!(json["code"], "image_too_small");
    assert_eq!(harness.classifier.calls(), 0);
    assert!(harness.state.sessions.get("s").is_none());
}

#[tokio::test]
async fn test_detect_low_confidence_skips_treatment() {
    let harness = Harness::new(
        MockClassifier::new("Tomato___Leaf_Mold", 14.99),
        MockLanguageModel::replying(TREATMENT_JSON),
    );
    let image = png(64, 64);
    let resp = harness
        .app()
        .oneshot(detect_request(Some(("cat.png", &image)), Some("s")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(
        json["error"],
        "This doesn't appear to be a plant image. Please upload a clear photo of plant leaves for disease detection."
    );
    assert_eq!(
        json["suggestion"],
        "Make sure your photo shows plant leaves clearly with good lighting."
    );
    assert_eq!(json["code"], "low_confidence");
    assert_eq!(harness.classifier.calls(), 1);
    assert_eq!(harness.llm.call_count(), 0);
    assert!(harness.speech.texts().is_empty());
    assert!(harness.state.sessions.is_empty());
}

#[tokio::test]
async fn test_detect_confidence_at_threshold_passes() {
    let harness = Harness::new(
        MockClassifier::new("Tomato___Leaf_Mold", 15.0),
        MockLanguageModel::replying(TREATMENT_JSON),
    );
    let image = png(64, 64);
    let resp = harness
        .app()
        .oneshot(detect_request(Some(("leaf.png", &image)), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_detect_model_failure_uses_fallback_treatment() {
    let harness = Harness::new(
        MockClassifier::new("Tomato___Bacterial_spot", 80.0),
        MockLanguageModel::failing(),
    );
    let image = png(64, 64);
    let resp = harness
        .app()
        .oneshot(detect_request(Some(("leaf.png", &image)), None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let detect: DetectResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    let fallback = fallback_treatment(false);
    assert_eq!(detect.cause, fallback.cause);
    assert_eq!(detect.treatment, fallback.treatment);
    assert_eq!(detect.prevention, fallback.prevention);
}

#[tokio::test]
async fn test_detect_non_json_answer_uses_fallback_treatment() {
    let harness = Harness::new(
        MockClassifier::new("Potato___healthy", 97.0),
        MockLanguageModel::replying("Looks great, keep it up!"),
    );
    let image = png(64, 64);
    let resp = harness
        .app()
        .oneshot(detect_request(Some(("leaf.png", &image)), None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["cause"], "No disease detected");
}

#[tokio::test]
async fn test_detect_missing_image() {
    let harness = Harness::new(
        MockClassifier::new("Tomato___healthy", 90.0),
        MockLanguageModel::failing(),
    );
    let resp = harness
        .app()
        .oneshot(detect_request(None, Some("s")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "No image provided");
    assert_eq!(json["code"], "missing_image");
}

#[tokio::test]
async fn test_detect_empty_filename() {
    let harness = Harness::new(
        MockClassifier::new("Tomato___healthy", 90.0),
        MockLanguageModel::failing(),
    );
    let image = png(64, 64);
    let resp = harness
        .app()
        .oneshot(detect_request(Some(("", &image)), None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "No image selected");
}

#[tokio::test]
async fn test_detect_unsupported_type() {
    let harness = Harness::new(
        MockClassifier::new("Tomato___healthy", 90.0),
        MockLanguageModel::failing(),
    );
    let resp = harness
        .app()
        .oneshot(detect_request(Some(("notes.txt", b"hello")), None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(
        json["error"],
        "Invalid file type. Please upload an image file (.jpg, .jpeg, .png, .bmp, .webp)"
    );
    assert_eq!(json["code"], "unsupported_type");
    assert_eq!(harness.classifier.calls(), 0);
}

#[tokio::test]
async fn test_detect_corrupted_image() {
    let harness = Harness::new(
        MockClassifier::new("Tomato___healthy", 90.0),
        MockLanguageModel::failing(),
    );
    let resp = harness
        .app()
        .oneshot(detect_request(Some(("leaf.jpg", b"\xff\xd8\xff garbage")), None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["code"], "corrupted_image");
    assert_eq!(harness.classifier.calls(), 0);
}

#[tokio::test]
async fn test_detect_classifier_failure_is_internal_error() {
    let harness = Harness::new(
        MockClassifier::failing("ONNX inference failed"),
        MockLanguageModel::failing(),
    );
    let image = png(64, 64);
    let resp = harness
        .app()
        .oneshot(detect_request(Some(("leaf.png", &image)), None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "Internal server error");
    assert_eq!(json["code"], "internal_error");
}

#[tokio::test]
async fn test_detect_without_voice_returns_null_audio() {
    let classifier = Arc::new(MockClassifier::new("Tomato___healthy", 90.0));
    let state = AppState::new(
        PlantGuardConfig::default(),
        classifier,
        Arc::new(MockLanguageModel::replying(TREATMENT_JSON)),
        WeatherEnricher::disabled(),
        VoiceSynthesizer::disabled(),
    );
    let image = png(64, 64);
    let resp = create_router(state)
        .oneshot(detect_request(Some(("leaf.png", &image)), None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_json(resp).await["audio"].is_null());
}

#[tokio::test]
async fn test_second_detect_replaces_session_context() {
    let harness = Harness::new(
        MockClassifier::new("Tomato___Early_blight", 80.0),
        MockLanguageModel::new(vec![
            Ok(r#"{"cause": "first cause", "treatment": "first treatment", "prevention": "first prevention"}"#.to_string()),
            Err("model down".to_string()),
        ]),
    );
    let image = png(64, 64);

    let resp = harness
        .app()
        .oneshot(detect_request(Some(("leaf.png", &image)), Some("same")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(harness.state.sessions.get("same").unwrap().treatment.cause, "first cause");

    let resp = harness
        .app()
        .oneshot(detect_request(Some(("leaf.png", &image)), Some("same")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let stored = harness.state.sessions.get("same").unwrap();
    assert_eq!(stored.treatment, fallback_treatment(false));
    assert_eq!(harness.state.sessions.len(), 1);
}

// =============================================================================
// Chat
// =============================================================================

#[tokio::test]
async fn test_chat_unknown_session_is_context_free() {
    let harness = Harness::new(
        MockClassifier::new("Tomato___healthy", 90.0),
        MockLanguageModel::replying("Tomatoes like full sun."),
    );
    let resp = harness
        .app()
        .oneshot(post_json(
            "/api/chat",
            r#"{"message": "How much sun do tomatoes need?", "session_id": "nobody"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let chat: ChatResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(chat.response, "Tomatoes like full sun.");
    assert_eq!(chat.audio.as_deref(), Some("bXAzLWJ5dGVz"));

    let request = &harness.llm.requests()[0];
    assert_eq!(request.user, "How much sun do tomatoes need?");
    assert!(!request.system.contains("User has uploaded an image"));
    assert_eq!(harness.classifier.calls(), 0);
}

#[tokio::test]
async fn test_chat_uses_latest_detection() {
    let harness = Harness::new(
        MockClassifier::new("Potato___Late_blight", 88.0),
        MockLanguageModel::new(vec![
            Ok(TREATMENT_JSON.to_string()),
            Ok("Yes, late blight spreads quickly.".to_string()),
        ]),
    );
    let image = png(64, 64);
    let resp = harness
        .app()
        .oneshot(detect_request(Some(("leaf.png", &image)), Some("farm-7")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = harness
        .app()
        .oneshot(post_json(
            "/api/chat",
            r#"{"message": "Is it contagious?", "session_id": "farm-7"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await["response"],
        "Yes, late blight spreads quickly."
    );

    let system = &harness.llm.requests()[1].system;
    assert!(system.contains("- Detected: Potato - Late blight"));
    assert!(system.contains("- Cause: Alternaria solani"));
    assert_eq!(harness.classifier.calls(), 1);
}

#[tokio::test]
async fn test_chat_empty_message() {
    let harness = Harness::new(
        MockClassifier::new("Tomato___healthy", 90.0),
        MockLanguageModel::replying("unused"),
    );
    let resp = harness
        .app()
        .oneshot(post_json("/api/chat", r#"{"message": "   "}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "Empty message");
    assert_eq!(json["code"], "empty_message");
    assert_eq!(harness.llm.call_count(), 0);
}

#[tokio::test]
async fn test_chat_missing_message_field() {
    let harness = Harness::new(
        MockClassifier::new("Tomato___healthy", 90.0),
        MockLanguageModel::replying("unused"),
    );
    let resp = harness
        .app()
        .oneshot(post_json("/api/chat", r#"{"session_id": "x"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "Empty message");
}

#[tokio::test]
async fn test_chat_message_too_long() {
    let harness = Harness::new(
        MockClassifier::new("Tomato___healthy", 90.0),
        MockLanguageModel::replying("unused"),
    );
    let body = serde_json::json!({ "message": "a".repeat(2001) }).to_string();
    let resp = harness
        .app()
        .oneshot(post_json("/api/chat", &body))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["code"], "message_too_long");
}

#[tokio::test]
async fn test_chat_invalid_json() {
    let harness = Harness::new(
        MockClassifier::new("Tomato___healthy", 90.0),
        MockLanguageModel::replying("unused"),
    );
    let resp = harness
        .app()
        .oneshot(post_json("/api/chat", "{not json"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["code"], "bad_request");
}

#[tokio::test]
async fn test_chat_model_failure_falls_back() {
    let harness = Harness::new(
        MockClassifier::new("Tomato___healthy", 90.0),
        MockLanguageModel::failing(),
    );
    let resp = harness
        .app()
        .oneshot(post_json("/api/chat", r#"{"message": "hi there"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert!(json["response"]
        .as_str()
        .unwrap()
        .starts_with("Hello! I'm PlantGuard AI"));
}

#[tokio::test]
async fn test_chat_weather_failure_still_answers() {
    let harness = Harness::new(
        MockClassifier::new("Tomato___healthy", 90.0),
        MockLanguageModel::replying("Water deeply."),
    );
    let resp = harness
        .app()
        .oneshot(post_json("/api/chat", r#"{"message": "Should I water today?"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        harness.weather.queries(),
        vec![WeatherQuery::City("Karachi".to_string())]
    );
    assert!(!harness.llm.requests()[0].system.contains("CURRENT WEATHER DATA"));
}

#[tokio::test]
async fn test_chat_includes_weather_for_location() {
    let harness = Harness::with(
        PlantGuardConfig::default(),
        MockClassifier::new("Tomato___healthy", 90.0),
        MockLanguageModel::replying("Provide shade."),
        MockWeatherProvider::returning(snapshot()),
    );
    let resp = harness
        .app()
        .oneshot(post_json(
            "/api/chat",
            r#"{"message": "Is it too hot?", "location": "Lahore"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        harness.weather.queries(),
        vec![WeatherQuery::City("Lahore".to_string())]
    );
    let system = &harness.llm.requests()[0].system;
    assert!(system.contains("CURRENT WEATHER DATA"));
    assert!(system.contains("- Temperature: 34.5°C (Feels like 38.1°C)"));
}

// =============================================================================
// Weather
// =============================================================================

#[tokio::test]
async fn test_weather_get_with_tips() {
    let harness = Harness::with(
        PlantGuardConfig::default(),
        MockClassifier::new("Tomato___healthy", 90.0),
        MockLanguageModel::failing(),
        MockWeatherProvider::returning(snapshot()),
    );
    let resp = harness
        .app()
        .oneshot(get("/api/weather?location=Karachi"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["temperature"], 34.5);
    assert_eq!(json["humidity"], 82.0);
    assert_eq!(json["city"], "Karachi");

    let weather: WeatherResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(weather.plant_care_tips.len(), 2);
    assert!(weather.plant_care_tips[0].contains("High temperature"));
    assert!(weather.plant_care_tips[1].contains("High humidity"));
}

#[tokio::test]
async fn test_weather_get_coordinates() {
    let harness = Harness::with(
        PlantGuardConfig::default(),
        MockClassifier::new("Tomato___healthy", 90.0),
        MockLanguageModel::failing(),
        MockWeatherProvider::returning(snapshot()),
    );
    let resp = harness
        .app()
        .oneshot(get("/api/weather?lat=24.86&lon=67.01"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        harness.weather.queries(),
        vec![WeatherQuery::Coordinates { lat: 24.86, lon: 67.01 }]
    );
}

#[tokio::test]
async fn test_weather_get_default_city() {
    let harness = Harness::with(
        PlantGuardConfig::default(),
        MockClassifier::new("Tomato___healthy", 90.0),
        MockLanguageModel::failing(),
        MockWeatherProvider::returning(snapshot()),
    );
    let resp = harness.app().oneshot(get("/api/weather")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        harness.weather.queries(),
        vec![WeatherQuery::City("Karachi".to_string())]
    );
}

#[tokio::test]
async fn test_weather_unparsable_coordinates() {
    let harness = Harness::with(
        PlantGuardConfig::default(),
        MockClassifier::new("Tomato___healthy", 90.0),
        MockLanguageModel::failing(),
        MockWeatherProvider::returning(snapshot()),
    );
    let resp = harness
        .app()
        .oneshot(get("/api/weather?lat=north&lon=67"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "Unable to fetch weather data");
    assert_eq!(json["code"], "weather_unavailable");
    assert!(harness.weather.queries().is_empty());
}

#[tokio::test]
async fn test_weather_post_json() {
    let harness = Harness::with(
        PlantGuardConfig::default(),
        MockClassifier::new("Tomato___healthy", 90.0),
        MockLanguageModel::failing(),
        MockWeatherProvider::returning(snapshot()),
    );
    let resp = harness
        .app()
        .oneshot(post_json("/api/weather", r#"{"lat": 31.52, "lon": 74.35}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        harness.weather.queries(),
        vec![WeatherQuery::Coordinates { lat: 31.52, lon: 74.35 }]
    );
}

#[tokio::test]
async fn test_weather_provider_failure() {
    let harness = Harness::new(
        MockClassifier::new("Tomato___healthy", 90.0),
        MockLanguageModel::failing(),
    );
    let resp = harness
        .app()
        .oneshot(get("/api/weather?location=Nowhere"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "Unable to fetch weather data");
}

// =============================================================================
// Middleware
// =============================================================================

#[tokio::test]
async fn test_rate_limit_applies_to_api_only() {
    let mut config = PlantGuardConfig::default();
    config.server.rate_limit_per_sec = 1;
    let harness = Harness::with(
        config,
        MockClassifier::new("Tomato___healthy", 90.0),
        MockLanguageModel::failing(),
        MockWeatherProvider::returning(snapshot()),
    );
    let app = harness.app();

    // Three quick requests span at most two one-second windows.
    let mut statuses = Vec::new();
    for _ in 0..3 {
        let resp = app
            .clone()
            .oneshot(get("/api/weather?location=Karachi"))
            .await
            .unwrap();
        statuses.push(resp.status());
    }
    assert!(statuses.contains(&StatusCode::TOO_MANY_REQUESTS));

    let resp = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_upload_over_body_limit_is_rejected() {
    let mut config = PlantGuardConfig::default();
    config.server.max_upload_bytes = 1024;
    let harness = Harness::with(
        config,
        MockClassifier::new("Tomato___healthy", 90.0),
        MockLanguageModel::failing(),
        MockWeatherProvider::failing(),
    );
    let big = vec![0u8; 4096];
    let resp = harness
        .app()
        .oneshot(detect_request(Some(("leaf.png", &big)), None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let json = body_json(resp).await;
    assert_eq!(json["code"], "image_too_large");
    assert_eq!(
        json["error"],
        "Image file is too large. Please upload a smaller photo of your plant."
    );
    assert_eq!(harness.classifier.calls(), 0);
}
