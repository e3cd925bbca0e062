use async_trait::async_trait;
use chrono_tz::Tz;

use crate::clients::openai_client;

/// Language-model seam. Everything that needs free-text understanding
/// goes through this trait so tests can swap in scripted fakes.
#[async_trait]
pub trait OracleClient: Send + Sync {
    async fn generate_prompt(
        &self,
        prompt: &str,
        prompt_type: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

pub struct OpenAIOracle {
    api_key: String,
    timezone: String,
}

impl OpenAIOracle {
    pub fn new(api_key: String, timezone: Tz) -> Self {
        Self {
            api_key,
            timezone: timezone.name().to_string(),
        }
    }
}

#[async_trait]
impl OracleClient for OpenAIOracle {
    async fn generate_prompt(
        &self,
        prompt: &str,
        prompt_type: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        openai_client::generate_oracle_prompt(prompt, prompt_type, &self.api_key, &self.timezone)
            .await
    }
}
