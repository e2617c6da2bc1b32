//! Document pipeline counters.

use actix_web::{HttpResponse, Responder};
use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use crate::documents::OutputFormat;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    static ref DOCUMENTS_RENDERED: IntCounterVec = counter(
        "isg_documents_rendered_total",
        "Documents rendered successfully, by output format",
    );
    static ref JOBS_FAILED: IntCounterVec = counter(
        "isg_jobs_failed_total",
        "Render jobs that failed, by output format",
    );
}

fn counter(name: &str, help: &str) -> IntCounterVec {
    let vec = IntCounterVec::new(Opts::new(name, help), &["format"])
        .unwrap_or_else(|e| panic!("invalid metric definition {}: {}", name, e));
    if let Err(e) = REGISTRY.register(Box::new(vec.clone())) {
        log::error!("Failed to register metric {}: {}", name, e);
    }
    vec
}

pub fn record_rendered(format: OutputFormat, documents: usize) {
    DOCUMENTS_RENDERED
        .with_label_values(&[format.as_str()])
        .inc_by(documents as u64);
}

pub fn record_failed(format: OutputFormat) {
    JOBS_FAILED.with_label_values(&[format.as_str()]).inc();
}

/// Text exposition of the pipeline registry.
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[utoipa::path(
    get,
    path = "/metrics/documents",
    tag = "Metrics",
    responses(
        (status = 200, description = "Pipeline counters in Prometheus text format", body = String)
    )
)]
pub async fn documents_metrics() -> impl Responder {
    match render() {
        Ok(text) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(text),
        Err(e) => {
            log::error!("Failed to encode pipeline metrics: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_appear_in_exposition() {
        record_rendered(OutputFormat::Pdf, 3);
        record_failed(OutputFormat::Word);
        let text = render().unwrap();
        assert!(text.contains("isg_documents_rendered_total{format=\"pdf\"}"));
        assert!(text.contains("isg_jobs_failed_total{format=\"word\"}"));
    }
}
