use crate::prelude::*;
use kofta_core::gemini::{build_request, extract_text, GenerateContentResponse};
use kofta_core::prompt::ContractRequest;
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// A generative model that turns a prompt into text.
pub trait CompletionModel: Send + Sync + 'static {
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String, Error>> + Send;
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_base: String,
    pub model: String,
    pub api_key: String,
    /// Request timeout; the HTTP client default applies when unset.
    pub timeout: Option<Duration>,
}

/// Client for the Gemini `generateContent` REST endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            http,
            endpoint: f!(
                "{}/v1beta/models/{}:generateContent",
                config.api_base.trim_end_matches('/'),
                config.model
            ),
            api_key: config.api_key.clone(),
        })
    }
}

impl CompletionModel for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, Error> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&build_request(prompt))
            .send()
            .await
            .map_err(|e| Error::Upstream(f!("Gemini request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(f!(
                "Gemini API returned status {status}: {}",
                body.trim()
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(f!("Failed to parse Gemini response: {}", e.without_url())))?;

        extract_text(&body).map_err(Error::Upstream)
    }
}

/// Draft a contract for `request` with exactly one completion call.
///
/// Returns the completion trimmed of surrounding whitespace. Any model failure
/// is logged with its full detail and replaced by a generic upstream error.
pub async fn generate<M: CompletionModel>(
    model: &M,
    request: &ContractRequest,
) -> Result<String, Error> {
    let prompt = request.prompt();
    log::debug!("Generating contract for '{}'", request.label());

    match model.complete(&prompt).await {
        Ok(text) => Ok(text.trim().to_string()),
        Err(err) => {
            log::error!("Error generating contract for '{}': {err}", request.label());
            Err(Error::Upstream("Failed to generate contract".to_string()))
        }
    }
}
