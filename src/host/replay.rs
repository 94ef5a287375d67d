use anyhow::Context;
use std::path::Path;

use crate::metrics::Metrics;
use crate::models::StreamEvent;
use crate::pipeline::{ChangeCaptureProcessor, InvocationSummary};
use crate::utils::{retry_with_backoff, RetryConfig, RetryResult};

/// Run one invocation from a change-log batch stored as JSON, re-running the
/// whole invocation with backoff on any error.
pub async fn replay_file(
    processor: &ChangeCaptureProcessor,
    metrics: &Metrics,
    path: &Path,
    retry: &RetryConfig,
) -> anyhow::Result<InvocationSummary> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read change-log batch {}", path.display()))?;
    let event: StreamEvent = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse change-log batch {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        records = event.records.len(),
        max_attempts = retry.max_attempts,
        "Replaying change-log batch"
    );

    let event = &event;
    let result = retry_with_backoff(retry, move |attempt| {
        if attempt > 1 {
            metrics.record_retry();
        }
        processor.handle(event)
    })
    .await;

    match result {
        RetryResult::Success { value, .. } => Ok(value),
        RetryResult::Failed { error, attempts } => {
            Err(anyhow::Error::new(error).context(format!("Invocation failed after {attempts} attempts")))
        }
    }
}
