/*!
 * Structured Tracing
 * Subscriber setup and timed spans for pipeline stages
 */

use std::time::Instant;
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Enables JSON output when set to `1` or `true`
pub const TRACE_JSON_ENV: &str = "EMLOADER_TRACE_JSON";

/// Stages slower than this are logged as warnings
const SLOW_STAGE_MS: u128 = 1000;

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - EMLOADER_TRACE_JSON: Enable JSON output (default: false)
///
/// Calling it again after a subscriber is installed does nothing.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(TRACE_JSON_ENV)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
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
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
    };

    if installed.is_ok() {
        info!(json = use_json, "Structured tracing initialized");
    }
}

/// Timed span around one pipeline stage
///
/// Logs the stage duration when dropped.
pub struct StageSpan {
    span: tracing::Span,
    stage: &'static str,
    start: Instant,
}

impl StageSpan {
    pub fn new(stage: &'static str) -> Self {
        let span = span!(
            Level::DEBUG,
            "stage",
            stage = stage,
            items = tracing::field::Empty,
            error = tracing::field::Empty,
        );
        span.in_scope(|| debug!(stage, "stage started"));

        Self {
            span,
            stage,
            start: Instant::now(),
        }
    }

    /// Record how many items the stage handled
    pub fn record_items(&self, count: usize) {
        self.span.record("items", count);
    }

    pub fn record_error(&self, error: &str) {
        self.span.record("error", error);
    }
}

impl Drop for StageSpan {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let _entered = self.span.enter();

        if elapsed.as_millis() > SLOW_STAGE_MS {
            warn!(
                stage = self.stage,
                duration_ms = elapsed.as_millis() as u64,
                slow = true,
                "slow stage"
            );
        } else {
            debug!(
                stage = self.stage,
                duration_us = elapsed.as_micros() as u64,
                "stage completed"
            );
        }
    }
}

/// Span for a named pipeline stage
pub fn span_stage(stage: &'static str) -> StageSpan {
    StageSpan::new(stage)
}
