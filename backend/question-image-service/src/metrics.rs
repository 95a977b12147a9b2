use std::time::Duration;

use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{Encoder, Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts, TextEncoder};

use crate::services::compressor::CompressionOutcome;

static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "question_image_http_requests_total",
            "Total HTTP requests handled by question-image-service",
        ),
        &["method", "path", "status"],
    )
    .expect("failed to create question_image_http_requests_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register question_image_http_requests_total");
    counter
});

static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let histogram = HistogramVec::new(
        HistogramOpts::new(
            "question_image_http_request_duration_seconds",
            "HTTP request latency for question-image-service",
        )
        .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method", "path", "status"],
    )
    .expect("failed to create question_image_http_request_duration_seconds");
    prometheus::default_registry()
        .register(Box::new(histogram.clone()))
        .expect("failed to register question_image_http_request_duration_seconds");
    histogram
});

static UPLOADS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new("question_image_uploads_total", "Question image uploads by outcome"),
        &["outcome"],
    )
    .expect("failed to create question_image_uploads_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register question_image_uploads_total");
    counter
});

static COMPRESSION_ITERATIONS: Lazy<Histogram> = Lazy::new(|| {
    let histogram = Histogram::with_opts(
        HistogramOpts::new(
            "question_image_compression_iterations",
            "Encode passes needed to bring an image under the ceiling",
        )
        .buckets(vec![1.0, 2.0, 4.0, 8.0, 12.0, 16.0, 19.0]),
    )
    .expect("failed to create question_image_compression_iterations");
    prometheus::default_registry()
        .register(Box::new(histogram.clone()))
        .expect("failed to register question_image_compression_iterations");
    histogram
});

pub fn observe_http_request(method: &str, path: &str, status: u16, elapsed: Duration) {
    let status_label = status.to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status_label])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path, &status_label])
        .observe(elapsed.as_secs_f64());
}

pub fn record_upload(outcome: &str) {
    UPLOADS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn observe_compression(outcome: &CompressionOutcome) {
    COMPRESSION_ITERATIONS.observe(outcome.iterations as f64);
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
