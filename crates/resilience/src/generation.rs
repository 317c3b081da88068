//! Text generation provider, reached through the retry executor.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::{ExternalError, Result};
use crate::executor::{ResilientExecutor, RetryOptions};

/// Request options passed through to the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model name
    pub model: String,
    /// Output token cap
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "default".to_string(),
            max_tokens: 1024,
            temperature: 0.7,
        }
    }
}

/// Provider response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    /// Generated text
    pub text: String,
    /// Prompt tokens billed
    pub input_tokens: u32,
    /// Completion tokens billed
    pub output_tokens: u32,
}

/// A text generation provider.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate text for a prompt. One attempt, no retries.
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> std::result::Result<Generation, ExternalError>;
}

/// JSON-over-HTTP provider client.
#[derive(Clone)]
pub struct HttpGenerationClient {
    /// HTTP client
    client: Client,

    /// Completion endpoint URL
    endpoint: String,

    /// Bearer token
    api_key: Option<String>,

    /// Request timeout
    timeout: Duration,
}

impl HttpGenerationClient {
    /// Create a client for `endpoint` with a 15 second request timeout.
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        let timeout = Duration::from_secs(15);
        Self {
            client: ClientBuilder::new()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            endpoint: endpoint.into(),
            api_key,
            timeout,
        }
    }

    fn map_error(&self, e: reqwest::Error) -> ExternalError {
        if e.is_timeout() {
            ExternalError::Timeout(self.timeout)
        } else if let Some(status) = e.status() {
            ExternalError::Http {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            ExternalError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> std::result::Result<Generation, ExternalError> {
        let payload = json!({
            "model": options.model,
            "prompt": prompt,
            "max_tokens": options.max_tokens,
            "temperature": options.temperature,
        });

        debug!("Requesting generation ({} chars prompt)", prompt.len());

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| self.map_error(e))?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ExternalError::Http {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Generation>()
            .await
            .map_err(|e| ExternalError::Other(format!("malformed generation response: {}", e)))
    }
}

/// Wraps a provider so every call goes through the executor.
pub struct ResilientGenerator<C: GenerationClient> {
    client: C,
    executor: ResilientExecutor,
    options: RetryOptions,
}

impl<C: GenerationClient> ResilientGenerator<C> {
    /// Create a generator keyed to the `llm` circuit.
    pub fn new(client: C, executor: ResilientExecutor) -> Self {
        Self {
            client,
            executor,
            options: RetryOptions::for_dependency("llm"),
        }
    }

    /// Set the retry options.
    pub fn with_options(mut self, options: RetryOptions) -> Self {
        self.options = options;
        self
    }

    /// Generate with retries and circuit breaking.
    pub async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<Generation> {
        self.executor
            .execute(&self.options, || self.client.generate(prompt, options))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breaker::CircuitBreaker;
    use crate::error::ResilienceError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct FlakyProvider {
        calls: AtomicU32,
        failures: u32,
        error: ExternalError,
    }

    #[async_trait]
    impl GenerationClient for FlakyProvider {
        async fn generate(
            &self,
            prompt: &str,
            _options: &GenerationOptions,
        ) -> std::result::Result<Generation, ExternalError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return Err(self.error.clone());
            }
            Ok(Generation {
                text: format!("echo: {}", prompt),
                input_tokens: 3,
                output_tokens: 5,
            })
        }
    }

    fn generator(failures: u32, error: ExternalError) -> ResilientGenerator<FlakyProvider> {
        let provider = FlakyProvider { calls: AtomicU32::new(0), failures, error };
        let executor = ResilientExecutor::new(Arc::new(CircuitBreaker::default()));
        ResilientGenerator::new(provider, executor)
            .with_options(RetryOptions::for_dependency("llm").with_base_delay(Duration::from_millis(10)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_generation_retries_transport_errors() {
        let generator = generator(2, ExternalError::Transport("dns".into()));
        let out = generator.generate("hello", &GenerationOptions::default()).await.unwrap();

        assert_eq!(out.text, "echo: hello");
        assert_eq!(generator.client.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generation_stops_on_quota_error() {
        let error = ExternalError::Http { status: 429, message: "insufficient_quota".into() };
        let generator = generator(10, error);
        let err = generator.generate("hello", &GenerationOptions::default()).await.unwrap_err();

        assert!(matches!(err, ResilienceError::Failed { attempts: 1, .. }));
        assert_eq!(generator.client.calls.load(Ordering::SeqCst), 1);
    }
}
