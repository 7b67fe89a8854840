use std::sync::Arc;

use anyhow::Context;

use scribeflow_infra::config::AppConfig;
use scribeflow_infra::jobs::{JobOrchestrator, OrchestratorConfig};
use scribeflow_infra::transcription::HttpTranscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    scribeflow_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let transcriber = HttpTranscriber::new(&config.asr_base_url, config.asr_timeout)
        .context("failed to build ASR client")?;

    let orchestrator = JobOrchestrator::in_memory(
        Arc::new(transcriber),
        OrchestratorConfig::default().with_retry_policy(config.retry_policy.clone()),
    );
    let app = scribeflow_api::app::build_app(orchestrator);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        asr_base_url = %config.asr_base_url,
        "listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
