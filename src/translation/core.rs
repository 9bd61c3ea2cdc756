/*!
 * Core translation service implementation.
 *
 * This module defines the `Translator` seam used by the chapter pipeline and
 * the production implementation backed by the Ollama provider client.
 */

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use url::Url;

use crate::app_config::TranslationConfig;
use crate::errors::ProviderError;
use crate::providers::Provider;
use crate::providers::ollama::{GenerationRequest, Ollama};
use crate::translation::TranslationRequest;
use crate::translation::prompts;

/// A backend capable of translating one request at a time.
///
/// One call is one attempt; retry policy is layered on top by
/// [`RetryingTranslator`](crate::translation::retry::RetryingTranslator).
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate the request text, returning the raw model output.
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError>;
}

/// Translation provider implementation variants
#[derive(Debug)]
enum TranslationProviderImpl {
    /// Ollama LLM service
    Ollama {
        /// Client instance
        client: Ollama,
    },
}

/// Production translation service wrapping the configured provider.
#[derive(Debug)]
pub struct TranslationService {
    provider: TranslationProviderImpl,
}

impl TranslationService {
    /// Create a service from the translation configuration
    pub fn from_config(config: &TranslationConfig) -> Result<Self> {
        let endpoint = normalize_endpoint(&config.endpoint)?;

        Ok(Self {
            provider: TranslationProviderImpl::Ollama {
                client: Ollama::from_url(endpoint, config.timeout_secs),
            },
        })
    }

    /// Check that the backend is reachable
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        match &self.provider {
            TranslationProviderImpl::Ollama { client } => client.test_connection().await,
        }
    }
}

#[async_trait]
impl Translator for TranslationService {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError> {
        match &self.provider {
            TranslationProviderImpl::Ollama { client } => {
                let generation =
                    GenerationRequest::new(request.model.as_str(), prompts::render_user_prompt(request))
                        .system(prompts::render_system_prompt(request))
                        .temperature(request.temperature);

                let response = client.complete(generation).await?;
                Ok(Ollama::extract_text(&response))
            }
        }
    }
}

/// Normalize an endpoint string into a full URL with scheme
fn normalize_endpoint(endpoint: &str) -> Result<String> {
    if endpoint.is_empty() {
        return Err(anyhow!("Endpoint cannot be empty"));
    }

    let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Url::parse(endpoint)?
    } else {
        Url::parse(&format!("http://{}", endpoint))?
    };

    if url.host_str().is_none() {
        return Err(anyhow!("Invalid host in endpoint: {}", endpoint));
    }

    Ok(url.to_string().trim_end_matches('/').to_string())
}
