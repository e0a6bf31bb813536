//! Prompt text and composition.
//!
//! Everything here is pure string building, so it is benchmarked and tested
//! without a model.

use plantguard_core::{DiagnosticResult, SessionContext, WeatherSnapshot};

/// System prompt for treatment generation.
pub const TREATMENT_SYSTEM_PROMPT: &str = "You are a plant disease expert. Always respond in valid JSON format with cause, treatment, and prevention fields.";

/// Role, capabilities and guidelines for the chat assistant.
pub const CHAT_BASE_PROMPT: &str = "You are PlantGuard AI, an expert plant disease detection assistant with deep knowledge of plant pathology, agriculture, and plant care.

Your responsibilities:
- Answer questions about plant diseases, symptoms, causes, and treatments
- Provide advice on plant care, prevention, and maintenance
- Guide users on how to use the disease detection system
- Explain agricultural best practices
- Be friendly, helpful, and concise

Key information about this system:
- You can detect diseases in tomatoes (10 conditions) and potatoes (3 conditions)
- The AI uses ResNet50 with 95%+ accuracy
- Users upload images for instant analysis (2-3 seconds)
- Voice responses are available
- The interface is chat-style for easy use

Guidelines:
- Keep responses under 150-200 words unless detailed explanation is needed
- Use simple, clear language
- Include emojis sparingly for friendliness (🌱 🍅 🥔 ✅)
- If you don't know something, say so honestly
- Always encourage users to upload images for accurate diagnosis";

/// User prompt asking for cause, treatment and prevention of a diagnosis.
pub fn treatment_prompt(diagnostic: &DiagnosticResult) -> String {
    let status = if diagnostic.is_healthy {
        "Healthy"
    } else {
        "Disease Detected"
    };

    format!(
        "You are a plant pathology expert. Provide treatment information for this plant diagnosis:

Disease: {}
Confidence: {:.1}%
Status: {}

Provide a JSON response with EXACTLY these three fields (keep each under 80-150 words):
1. \"cause\": Brief explanation of what causes this condition
2. \"treatment\": Specific treatment steps and recommendations
3. \"prevention\": How to prevent this in the future

Be concise, practical, and specific. Use simple language.",
        diagnostic.display_name, diagnostic.confidence, status
    )
}

/// Build the chat system prompt from the base text plus optional context.
pub fn compose_system_prompt(
    context: Option<&SessionContext>,
    weather: Option<&WeatherSnapshot>,
) -> String {
    let mut prompt = String::from(CHAT_BASE_PROMPT);
    if let Some(context) = context {
        prompt.push_str(&session_block(context));
    }
    if let Some(weather) = weather {
        prompt.push_str(&weather_block(weather));
    }
    prompt
}

fn session_block(context: &SessionContext) -> String {
    let diagnostic = &context.diagnostic;
    let treatment = &context.treatment;
    let confidence = (diagnostic.confidence * 100.0).round() / 100.0;

    format!(
        "\n\n🎯 IMPORTANT - User has uploaded an image:
- Detected: {}
- Confidence: {}%
- Plant Type: {}
- Status: {}
- Cause: {}
- Treatment: {}
- Prevention: {}

When user asks questions, assume they're asking about THIS specific detection result.
Answer questions about this plant, this disease, this treatment, etc.
Be specific and reference the detection results when relevant.",
        diagnostic.display_name,
        confidence,
        diagnostic.plant_type,
        diagnostic.status(),
        treatment.cause,
        treatment.treatment,
        treatment.prevention
    )
}

fn weather_block(weather: &WeatherSnapshot) -> String {
    format!(
        "\n\n🌤️ CURRENT WEATHER DATA:
- Location: {}, {}
- Temperature: {}°C (Feels like {}°C)
- Conditions: {}
- Humidity: {}%
- Wind Speed: {} km/h

Consider these weather conditions when providing plant care advice:
- High humidity may increase fungal disease risk
- Hot weather requires more frequent watering
- Strong winds can damage plants
- Cold temperatures may stress plants",
        weather.city,
        weather.country,
        weather.temp_c,
        weather.feels_like_c,
        weather.description,
        weather.humidity_pct,
        weather.wind_kmh
    )
}
