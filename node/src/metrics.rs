//! # Prometheus Metrics
//!
//! Exposes operational metrics for the ledger node. Scraped by Prometheus
//! at the `/metrics` HTTP endpoint on the configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

use karma_ledger::config::METRICS_NAMESPACE;

/// Holds all Prometheus metric handles for the node.
///
/// Clone-friendly (wraps `Arc` internally via prometheus handles) so it can
/// be shared across request handlers and background tasks.
#[derive(Clone)]
pub struct NodeMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Total number of ledger operations dispatched, reads included.
    pub operations_total: IntCounter,
    /// Total number of operations that returned an error.
    pub operation_failures_total: IntCounter,
    /// Total number of failed compensating writes. Any nonzero value
    /// means an account may hold a half-applied movement.
    pub rollback_failures_total: IntCounter,
    /// Total number of audit records written for value movements.
    pub transactions_recorded_total: IntCounter,
    /// Total number of user accounts created.
    pub users_created_total: IntCounter,
    /// Whether the root account exists (0 or 1).
    pub root_initialized: IntGauge,
    /// Histogram of operation latency in seconds, dispatch to reply.
    pub operation_latency_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some(METRICS_NAMESPACE.into()), None)
            .expect("failed to create prometheus registry");

        let operations_total = IntCounter::new(
            "operations_total",
            "Total number of ledger operations dispatched",
        )
        .expect("metric creation");
        registry
            .register(Box::new(operations_total.clone()))
            .expect("metric registration");

        let operation_failures_total = IntCounter::new(
            "operation_failures_total",
            "Total number of ledger operations that returned an error",
        )
        .expect("metric creation");
        registry
            .register(Box::new(operation_failures_total.clone()))
            .expect("metric registration");

        let rollback_failures_total = IntCounter::new(
            "rollback_failures_total",
            "Total number of failed compensating writes leaving a possibly inconsistent account",
        )
        .expect("metric creation");
        registry
            .register(Box::new(rollback_failures_total.clone()))
            .expect("metric registration");

        let transactions_recorded_total = IntCounter::new(
            "transactions_recorded_total",
            "Total number of audit records written for value movements",
        )
        .expect("metric creation");
        registry
            .register(Box::new(transactions_recorded_total.clone()))
            .expect("metric registration");

        let users_created_total =
            IntCounter::new("users_created_total", "Total number of user accounts created")
                .expect("metric creation");
        registry
            .register(Box::new(users_created_total.clone()))
            .expect("metric registration");

        let root_initialized = IntGauge::new(
            "root_initialized",
            "Whether the root account exists in the store (0 or 1)",
        )
        .expect("metric creation");
        registry
            .register(Box::new(root_initialized.clone()))
            .expect("metric registration");

        let operation_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "operation_latency_seconds",
                "Ledger operation latency in seconds, dispatch to reply",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
            ]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(operation_latency_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            operations_total,
            operation_failures_total,
            rollback_failures_total,
            transactions_recorded_total,
            users_created_total,
            root_initialized,
            operation_latency_seconds,
        }
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics state passed to axum handlers via extension.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
///
/// Returns HTTP 500 if encoding fails (should never happen in practice).
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
