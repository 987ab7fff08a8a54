use std::time::Duration;

pub mod classifier;
pub mod models;
pub mod parse;
pub mod prompt;

pub use classifier::{Classification, Classifier};
pub use models::create_model;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";
pub const PLACEHOLDER_API_KEY: &str = "your_gemini_key_here";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model_name: String,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model_name: DEFAULT_MODEL.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    pub fn is_valid(&self) -> bool {
        self.api_key
            .as_deref()
            .map(str::trim)
            .is_some_and(|key| !key.is_empty() && key != PLACEHOLDER_API_KEY)
    }
}

pub mod prelude {
    pub use super::models::{create_model, gemini::GeminiModel, static_model::StaticModel};
    pub use super::{Classification, Classifier, Config};
    pub use ins_core::{AnalysisResult, Error, InferenceModel, Result};
}
