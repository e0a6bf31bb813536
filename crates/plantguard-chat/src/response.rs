//! Rule-based replies used when the language model is unavailable.

const GREETING: &str = "Hello! I'm PlantGuard AI, your intelligent plant disease detection assistant. 👋 Upload a photo of your plant's leaves, and I'll help identify any diseases!";
const HELP: &str = "I can help you detect plant diseases! 🌿 Just upload a clear photo of your plant's leaves using the 📎 Upload button, and I'll provide detailed analysis and treatment recommendations.";
const UPLOAD: &str = "To upload an image, click the 📎 Upload button below. Make sure your photo is clear, well-lit, and shows the affected leaves for best results!";
const GENERIC: &str = "I'm here to help with plant disease detection! 🌱 Upload a photo of your plant for instant AI-powered analysis, or ask me any questions about plant diseases and care.";

/// Pick a canned reply for `message`.
///
/// Checked in order: greeting words, then "help", then "upload".
pub fn fallback_response(message: &str) -> &'static str {
    let lower = message.to_lowercase();

    let is_greeting = lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == "hello" || word == "hi");

    if is_greeting {
        GREETING
    } else if lower.contains("help") {
        HELP
    } else if lower.contains("upload") {
        UPLOAD
    } else {
        GENERIC
    }
}
