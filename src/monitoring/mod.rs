/*!
 * Monitoring
 * Structured logging setup and stage timing
 */

mod tracer;

pub use tracer::{init_tracing, span_stage, StageSpan, TRACE_JSON_ENV};
