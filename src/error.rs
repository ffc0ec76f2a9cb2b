//! Error handling for the weather visualization engine
//!
//! Nothing in here is fatal to the host: every variant maps to a degraded
//! mode (CPU fallback, skipped preset, default config) at the call site.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VisualizationError {
    #[error("GPU unavailable: {0}")]
    GpuUnavailable(String),

    #[error("GPU operation '{operation}' failed: {error}")]
    GpuOperationFailed { operation: String, error: String },

    #[error("Unknown weather preset '{0}'")]
    UnknownPreset(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error("Configuration I/O error: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid argument for {name}: {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("Visualization has been disposed")]
    Disposed,
}

/// Result alias used throughout the crate
pub type VisualizationResult<T> = Result<T, VisualizationError>;

/// Helper trait for GPU error contexts
pub trait GpuErrorContext<T> {
    fn gpu_context(self, operation: &str) -> VisualizationResult<T>;
}

impl<T> GpuErrorContext<T> for Option<T> {
    fn gpu_context(self, operation: &str) -> VisualizationResult<T> {
        self.ok_or_else(|| VisualizationError::GpuUnavailable(operation.to_string()))
    }
}

impl<T, E> GpuErrorContext<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn gpu_context(self, operation: &str) -> VisualizationResult<T> {
        self.map_err(|e| gpu_operation_error(operation, e))
    }
}

/// Create a GPU operation error
pub fn gpu_operation_error(operation: &str, error: impl std::fmt::Display) -> VisualizationError {
    VisualizationError::GpuOperationFailed {
        operation: operation.to_string(),
        error: error.to_string(),
    }
}

/// Non-fatal degradation reported to the host.
///
/// These never interrupt the caller; the orchestrator queues them for
/// `take_diagnostics()` and logs them as they happen.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Diagnostic {
    #[error("GPU particle path unavailable, using CPU for this session: {0}")]
    GpuFallback(String),

    #[error("capability probe '{0}' failed, using conservative value")]
    ProbeFailed(&'static str),

    #[error("battery reading arrived after dispose and was discarded")]
    BatteryDiscarded,

    #[error("unknown preset '{0}', weather unchanged")]
    UnknownPreset(String),

    #[error("weather input contained out-of-range or NaN fields; clamped")]
    InputClamped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_context_maps_to_unavailable() {
        let missing: Option<u32> = None;
        let err = missing.gpu_context("request_adapter").unwrap_err();
        assert!(matches!(err, VisualizationError::GpuUnavailable(ref op) if op == "request_adapter"));
    }

    #[test]
    fn test_result_context_keeps_message() {
        let failed: Result<(), &str> = Err("out of memory");
        let err = failed.gpu_context("create_texture").unwrap_err();
        assert_eq!(
            err.to_string(),
            "GPU operation 'create_texture' failed: out of memory"
        );
    }

    #[test]
    fn test_diagnostic_messages() {
        let d = Diagnostic::UnknownPreset("doesNotExist".to_string());
        assert_eq!(d.to_string(), "unknown preset 'doesNotExist', weather unchanged");
        assert!(Diagnostic::GpuFallback("no adapter".into())
            .to_string()
            .contains("no adapter"));
    }
}
