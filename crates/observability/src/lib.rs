//! Process-wide tracing setup shared by tollgate binaries.

/// Initialize tracing with JSON output.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(LogFormat::Json);
}

/// Output format for log lines.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    /// Human-readable, for interactive use.
    Pretty,
}

/// Tracing configuration (filters, layers).
pub mod tracing;
