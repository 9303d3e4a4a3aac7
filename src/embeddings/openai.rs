//! OpenAI-compatible HTTP embedding provider.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::provider::{EmbeddingProvider, ProviderError};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Provider speaking the OpenAI `/embeddings` wire format.
///
/// Works against any OpenAI-compatible endpoint; point `base_url` at a proxy
/// or self-hosted server as needed. The API key and base URL are passed at
/// construction, not read from ambient state, so multiple providers with
/// different credentials can coexist.
#[derive(Clone, Debug)]
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiProvider {
    /// Build a provider for the given endpoint and credentials.
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            api_key: api_key.into(),
        }
    }

    /// Build a provider from `OPENAI_API_KEY` and optional `OPENAI_BASE_URL`.
    pub fn from_env() -> Result<Self, ProviderError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ProviderError::Other("OPENAI_API_KEY is not set".into()))?;
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let client = Client::builder()
            .user_agent(concat!("ragprep/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| ProviderError::Other(err.to_string()))?;
        Ok(Self::new(client, base_url, api_key))
    }

    fn classify_status(status: StatusCode, body: String) -> ProviderError {
        match status.as_u16() {
            429 => ProviderError::RateLimited(body),
            502..=504 => ProviderError::Unavailable {
                status: status.as_u16(),
                message: body,
            },
            _ => ProviderError::Other(format!("embeddings request failed ({status}): {body}")),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    async fn create_embeddings(
        &self,
        model: &str,
        inputs: &[String],
        dimensions: usize,
    ) -> Result<Vec<Vec<f32>>, ProviderError> {
        let request = EmbeddingsRequest {
            model,
            input: inputs,
            dimensions,
        };

        debug!(model, inputs = inputs.len(), "requesting embeddings");
        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ProviderError::Other("request timeout".into())
                } else {
                    ProviderError::Other(err.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, body));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::Other(format!("malformed embeddings response: {err}")))?;

        if parsed.data.len() != inputs.len() {
            return Err(ProviderError::Other(format!(
                "provider returned {} vectors for {} inputs",
                parsed.data.len(),
                inputs.len()
            )));
        }

        // The API may reorder entries; `index` restores input order.
        let mut data = parsed.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    fn name(&self) -> &str {
        "openai"
    }
}
