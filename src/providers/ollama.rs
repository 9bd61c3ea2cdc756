use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::Provider;

/// Ollama client for interacting with Ollama API
///
/// Performs a single attempt per call; outcomes are mapped onto
/// `ProviderError` variants so the retry layer can classify them without
/// inspecting message text.
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation (default: 0.8)
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Generated text
    #[serde(default)]
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
    /// Number of prompt tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

impl GenerationRequest {
    /// Create a new generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            stream: Some(false),
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        if let Some(options) = &mut self.options {
            options.temperature = Some(temperature);
        } else {
            self.options = Some(GenerationOptions {
                temperature: Some(temperature),
            });
        }
        self
    }
}

impl Ollama {
    /// Create a new Ollama client from a complete URL
    pub fn from_url(url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            base_url: url.into().trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                // Ollama uses HTTP/1.1
                .http1_only()
                .pool_idle_timeout(Duration::from_secs(90))
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait::async_trait]
impl Provider for Ollama {
    type Request = GenerationRequest;
    type Response = GenerationResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);

        debug!(
            "Calling Ollama | model={} prompt_len={}",
            request.model,
            request.prompt.len()
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Ollama API error ({}): {}", status, error_text);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: error_text,
            });
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        let generated: GenerationResponse = serde_json::from_str(&response_text).map_err(|e| {
            error!(
                "Failed to parse Ollama API response: {}. Raw response (first 500 chars): {}",
                e,
                response_text.chars().take(500).collect::<String>()
            );
            ProviderError::ParseError(e.to_string())
        })?;

        if generated.response.trim().is_empty() {
            return Err(ProviderError::UnusableResponse(
                "Empty response from Ollama".to_string(),
            ));
        }

        debug!(
            "Ollama response received | text_len={}",
            generated.response.len()
        );
        Ok(generated)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let url = format!("{}/api/version", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: format!("version endpoint returned {}", status),
            });
        }

        Ok(())
    }

    fn extract_text(response: &Self::Response) -> String {
        response.response.clone()
    }
}
