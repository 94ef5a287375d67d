use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use std::sync::Arc;

use crate::metrics::Metrics;
use crate::models::StreamEvent;
use crate::pipeline::ChangeCaptureProcessor;

/// Largest change-log batch accepted in one invocation
const MAX_BATCH_BYTES: usize = 6 * 1024 * 1024;

pub struct HostState {
    pub processor: Arc<ChangeCaptureProcessor>,
    pub metrics: Arc<Metrics>,
}

/// Start the invocation server.
///
/// `POST /invocations` runs the pipeline for one change-log batch. Any error
/// answers 500 so the caller re-delivers the whole batch.
pub async fn start_server(state: Arc<HostState>, port: u16) -> std::io::Result<()> {
    tracing::info!("📊 Starting invocation server on http://0.0.0.0:{}", port);

    let state = web::Data::from(state);
    HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind(("0.0.0.0", port))?
        .run()
        .await
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(MAX_BATCH_BYTES))
        .route("/invocations", web::post().to(invocation_handler))
        .route("/metrics", web::get().to(metrics_handler))
        .route("/health", web::get().to(health_handler));
}

async fn invocation_handler(state: web::Data<HostState>, batch: web::Json<StreamEvent>) -> impl Responder {
    match state.processor.handle(&batch).await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": e.to_string(),
            "reason": e.reason(),
        })),
    }
}

async fn metrics_handler(state: web::Data<HostState>) -> impl Responder {
    match state.metrics.render() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn health_handler() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "channel-claim-cdc"
    }))
}
