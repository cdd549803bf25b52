//! Prometheus metrics for invoicing-service.
//!
//! Domain counters live in the default `prometheus` registry; HTTP request
//! metrics recorded through the `metrics` facade are rendered by the
//! `metrics-exporter-prometheus` handle. `/metrics` serves both.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_counter, register_int_counter_vec,
    CounterVec, HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Committed invoices by payment status.
pub static INVOICES_CREATED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "invoicing_invoices_created_total",
        "Total number of invoices committed",
        &["payment_status"]
    )
    .expect("Failed to register invoices_created_total")
});

/// Rejected creations by error code.
pub static INVOICE_REJECTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "invoicing_invoice_rejections_total",
        "Total number of rejected invoice creations by error code",
        &["code"]
    )
    .expect("Failed to register invoice_rejections_total")
});

/// Deleted invoices.
pub static INVOICES_DELETED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "invoicing_invoices_deleted_total",
        "Total number of invoices deleted"
    )
    .expect("Failed to register invoices_deleted_total")
});

/// Store query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "invoicing_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Sum of committed invoice totals by payment method.
pub static INVOICE_AMOUNT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "invoicing_invoice_amount_total",
        "Total committed invoice amount by payment method",
        &["payment_method"]
    )
    .expect("Failed to register invoice_amount_total")
});

/// Install the HTTP metrics recorder and force the domain metrics.
///
/// Safe to call more than once; only the first call installs a recorder.
pub fn init_metrics() {
    METRICS_HANDLE.get_or_init(|| match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            // Another recorder owns the facade; render an unattached one.
            tracing::warn!(error = %e, "Prometheus recorder already installed");
            PrometheusBuilder::new().build_recorder().handle()
        }
    });

    Lazy::force(&INVOICES_CREATED_TOTAL);
    Lazy::force(&INVOICE_REJECTIONS_TOTAL);
    Lazy::force(&INVOICES_DELETED_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&INVOICE_AMOUNT_TOTAL);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_default();

    let encoder = TextEncoder::new();
    if let Ok(domain) = encoder.encode_to_string(&prometheus::gather()) {
        output.push_str(&domain);
    }
    output
}
