use async_trait::async_trait;
use std::fmt;

use crate::Result;

/// A single-turn text generation backend.
#[async_trait]
pub trait InferenceModel: Send + Sync + fmt::Debug {
    /// Model name recorded on every insight produced with this backend.
    fn name(&self) -> &str;

    /// Whether the backend has usable credentials. Unconfigured backends are
    /// never called.
    fn is_configured(&self) -> bool {
        true
    }

    /// Send one prompt and return the raw reply text.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
