use ins_core::{Error, InferenceModel, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::Config;

pub mod gemini;
pub mod static_model;

pub use gemini::GeminiModel;
pub use static_model::StaticModel;

/// Build the model named by `kind` (`gemini` or `static`).
pub fn create_model(kind: &str, config: &Config) -> Result<Arc<dyn InferenceModel>> {
    match kind.to_lowercase().as_str() {
        "gemini" => {
            let model = GeminiModel::new(config.clone())?;
            if model.is_configured() {
                info!("🤖 Using Gemini model {}", config.model_name);
            } else {
                warn!("⚠️ Gemini API key is missing, every analysis will report a configuration error");
            }
            Ok(Arc::new(model))
        }
        "static" => {
            info!("🤖 Using the static offline model");
            Ok(Arc::new(StaticModel::default()))
        }
        other => Err(Error::Config(format!(
            "Unknown inference model: {} (expected gemini or static)",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_model() {
        let config = Config::default();
        let gemini = create_model("gemini", &config).unwrap();
        assert_eq!(gemini.name(), "gemini-1.5-pro");
        assert!(!gemini.is_configured());

        let offline = create_model("Static", &config).unwrap();
        assert_eq!(offline.name(), "static");

        assert!(create_model("gpt", &config).is_err());
    }
}
