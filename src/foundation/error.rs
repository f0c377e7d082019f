/// Convenience result type used across layerfx.
pub type FxResult<T> = Result<T, FxError>;

/// Top-level error taxonomy for the fallible edges of the crate.
///
/// Filter evaluation itself does not fail: empty geometry and missing scratch surfaces degrade to
/// the empty [`crate::FilterResult`]. Errors are reserved for inputs that cannot be represented
/// (bad pixel buffers, malformed graph descriptions) and explicit conversions that require an
/// invertible transform.
#[derive(thiserror::Error, Debug)]
pub enum FxError {
    /// Invalid user-provided data (dimensions, buffers, graph parameters).
    #[error("validation error: {0}")]
    Validation(String),

    /// A transform that must be inverted is singular.
    #[error("non-invertible transform: {0}")]
    NonInvertible(String),

    /// A pixel buffer or scratch surface could not be allocated.
    #[error("allocation error: {0}")]
    Allocation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FxError {
    /// Build a [`FxError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FxError::NonInvertible`] value.
    pub fn non_invertible(msg: impl Into<String>) -> Self {
        Self::NonInvertible(msg.into())
    }

    /// Build a [`FxError::Allocation`] value.
    pub fn allocation(msg: impl Into<String>) -> Self {
        Self::Allocation(msg.into())
    }

    /// Build a [`FxError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for FxError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
