use crate::prelude::*;
use kofta_core::prompt::ContractRequest;
use serde::Deserialize;
use std::future::Future;

pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:3001";

/// Something that drafts contract text for a request.
pub trait Generator: Send + Sync {
    fn generate(
        &self,
        request: &ContractRequest,
    ) -> impl Future<Output = Result<String, Error>> + Send;
}

#[derive(Debug, Deserialize)]
struct ContractBody {
    contract: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for the prompt gateway.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Generator for GatewayClient {
    async fn generate(&self, request: &ContractRequest) -> Result<String, Error> {
        let (path, body) = match request {
            ContractRequest::Template(request) => ("generateContract", serde_json::to_value(request)),
            ContractRequest::Custom(request) => ("createCustomContract", serde_json::to_value(request)),
        };
        let body = body.map_err(|e| Error::Validation(e.to_string()))?;

        let response = self
            .http
            .post(f!("{}/{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Upstream(f!("Gateway request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| "no error message".to_string());
            return Err(Error::Upstream(f!(
                "Gateway returned status {status}: {message}"
            )));
        }

        let body: ContractBody = response
            .json()
            .await
            .map_err(|e| Error::Upstream(f!("Failed to parse gateway response: {e}")))?;

        body.contract
            .filter(|contract| !contract.is_empty())
            .ok_or_else(|| Error::Upstream("Failed to fetch contract".to_string()))
    }
}
