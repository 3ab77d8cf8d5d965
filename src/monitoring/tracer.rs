/*!
 * Structured Tracing
 * Subscriber setup and per-callback spans using the tracing crate
 *
 * Features:
 * - Env-filtered output (RUST_LOG)
 * - JSON-formatted logs for structured parsing
 * - One span per guarded callback, closed when it settles
 */

use crate::core::id::GuardId;
use crate::core::limits::ENV_TRACE_JSON;
use std::time::Instant;
use tracing::{debug, info, span, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - CALLBACK_GUARD_TRACE_JSON: Enable JSON output (default: false)
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(ENV_TRACE_JSON)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
    };

    if result.is_ok() {
        info!(json = use_json, "Structured tracing initialized");
    }
}

/// Span covering the life of one guarded callback
pub struct CallbackSpan {
    span: tracing::Span,
    start: Instant,
}

impl CallbackSpan {
    pub fn new(id: GuardId, label: &str) -> Self {
        let span = span!(
            Level::DEBUG,
            "guarded_callback",
            guard_id = %id,
            label = label,
            outcome = tracing::field::Empty,
            lifetime_us = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
        }
    }

    /// Record the terminal state the callback settled in
    pub fn record_outcome(&self, outcome: &'static str) {
        self.span.record("outcome", outcome);
        let lifetime_us = u64::try_from(self.start.elapsed().as_micros()).unwrap_or(u64::MAX);
        self.span.record("lifetime_us", lifetime_us);
        let _entered = self.span.enter();
        debug!(outcome, "guarded callback settled");
    }

    /// Enter the span context
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}
