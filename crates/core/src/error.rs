use std::io;
use std::path::PathBuf;

/// Errors raised by the preprocessing stages and the pipeline around them.
#[derive(Debug, thiserror::Error)]
pub enum PointCloudError {
    /// No file or parameter was supplied. Callers treat this as a normal
    /// early exit rather than a failure.
    #[error("input missing: {0}")]
    InputMissing(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("empty point cloud: {0}")]
    EmptyInput(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, PointCloudError>;

impl PointCloudError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Whether this error is an ordinary "nothing to do" exit.
    pub fn is_input_missing(&self) -> bool {
        matches!(self, Self::InputMissing(_))
    }
}

/// Fails with [`PointCloudError::InvalidParameter`] unless `value` is finite and `> 0`.
pub fn ensure_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PointCloudError::invalid(format!(
            "{name} must be > 0 and finite, got {value}"
        )))
    }
}

/// Fails with [`PointCloudError::InvalidParameter`] unless `value` is finite.
pub fn ensure_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PointCloudError::invalid(format!(
            "{name} must be finite, got {value}"
        )))
    }
}
