//! Logging facilities for Horizon Mosaic.
//!
//! Horizon Mosaic uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! use tracing_subscriber::EnvFilter;
//!
//! tracing_subscriber::fmt()
//!     .with_env_filter(EnvFilter::new("horizon_mosaic::composite=debug"))
//!     .init();
//! ```
//!
//! Mutations of a composite are logged at `debug`, revalidation passes and
//! signal emission at `trace`, and detected bookkeeping corruption at `error`.

/// Span names used throughout Horizon Mosaic for tracing.
pub mod span_names {
    /// Composite cache revalidation span.
    pub const REVALIDATE: &str = "horizon_mosaic::revalidate";
    /// Notification propagation span.
    pub const PROPAGATE: &str = "horizon_mosaic::propagate";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "horizon_mosaic_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_mosaic_core::signal";
    /// Composite collection mutations and cache maintenance.
    pub const COMPOSITE: &str = "horizon_mosaic::composite";
    /// Child-to-consumer notification forwarding.
    pub const PROPAGATION: &str = "horizon_mosaic::propagation";
    /// Leaf collection mutations.
    pub const LEAF: &str = "horizon_mosaic::leaf";
    /// Performance spans.
    pub const PERF: &str = "horizon_mosaic::perf";
}

/// A guard for performance tracing spans.
///
/// Creates a tracing span on construction that is entered until the guard is
/// dropped, so time spent in the scope shows up in span-aware subscribers.
///
/// ```
/// use horizon_mosaic_core::logging::PerfSpan;
///
/// fn rebuild_index() {
///     let _span = PerfSpan::new("rebuild_index");
///     // ... work ...
/// }
/// ```
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create and enter a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::trace_span!(target: targets::PERF, "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}
