use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use channel_claim_cdc::host::{replay_file, start_server, HostState};
use channel_claim_cdc::messaging::{EventPublisher, HttpEventBusClient};
use channel_claim_cdc::metrics::Metrics;
use channel_claim_cdc::{AppConfig, ChangeCaptureProcessor};

const USAGE: &str = "usage: channel-claim-cdc [serve | replay <batch.json>]";

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,channel_claim_cdc=debug")),
        )
        .init();

    tracing::info!("🚀 Starting channel claim CDC");

    let config = AppConfig::load()?;

    let metrics = Arc::new(Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    let client = Arc::new(HttpEventBusClient::new(
        config.event_bus.endpoint.clone(),
        config.bus_timeout(),
    )?);
    let publisher = EventPublisher::new(client, config.publisher_settings(), metrics.clone());
    let processor = Arc::new(ChangeCaptureProcessor::new(
        config.synthesizer()?,
        publisher,
        metrics.clone(),
    ));

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] | ["serve"] => {
            let state = Arc::new(HostState { processor, metrics });
            start_server(state, config.server.port).await?;
        }
        ["replay", path] => {
            let summary = replay_file(&processor, &metrics, Path::new(path), &config.retry_config()).await?;
            tracing::info!(
                records = summary.records_processed,
                events = summary.events_published,
                "🎉 Replay complete"
            );
        }
        _ => anyhow::bail!(USAGE),
    }

    Ok(())
}
