pub(crate) mod completion;
pub(crate) mod routes;

use crate::prelude::{eprintln, *};
use completion::{GeminiClient, GeminiConfig, DEFAULT_API_BASE, DEFAULT_MODEL};
use std::time::Duration;

#[derive(Debug, clap::Args)]
pub struct App {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3001")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// API key for the generative AI service
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Gemini model used for contract generation
    #[arg(long, env = "KOFTA_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Base URL of the Gemini API
    #[arg(long, env = "KOFTA_GEMINI_URL", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Timeout for each completion call, in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let model = GeminiClient::new(&GeminiConfig {
        api_base: app.api_base.clone(),
        model: app.model.clone(),
        api_key: app.api_key.clone(),
        timeout: app.timeout_secs.map(Duration::from_secs),
    })?;

    if global.verbose {
        eprintln!("Gemini API: {}", app.api_base);
        eprintln!("Model: {}", app.model);
    }

    let addr = f!("{}:{}", app.host, app.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("Failed to bind to {}: {}", addr, e))?;

    log::info!("Backend server is running on http://{addr}");

    axum::serve(listener, routes::router(model))
        .await
        .map_err(|e| eyre!("Server error: {e}"))?;

    Ok(())
}
