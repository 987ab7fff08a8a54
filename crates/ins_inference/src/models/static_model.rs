use async_trait::async_trait;
use ins_core::{InferenceModel, Result};
use std::fmt;

const OFFLINE_REPLY: &str = r#"{
  "relevant": false,
  "reason": "Offline model, no real analysis was performed",
  "category": "STRATEGY",
  "suggested_action": "Configure a real inference model",
  "confidence": 0.0,
  "summary": "Not analysed",
  "keywords": ""
}"#;

/// Answers every prompt with the same reply. Used offline and in tests.
pub struct StaticModel {
    name: String,
    reply: String,
}

impl fmt::Debug for StaticModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticModel").field("name", &self.name).finish()
    }
}

impl Default for StaticModel {
    fn default() -> Self {
        Self::new("static", OFFLINE_REPLY)
    }
}

impl StaticModel {
    pub fn new(name: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl InferenceModel for StaticModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        Ok(self.reply.clone())
    }
}
