/// Convenience result type used across the crate.
pub type LenticularResult<T> = Result<T, LenticularError>;

/// Top-level error taxonomy used by the authoring and export APIs.
#[derive(thiserror::Error, Debug)]
pub enum LenticularError {
    /// Rejected precondition (overlap, bad range, depth out of bounds, bad settings).
    ///
    /// Nothing has been mutated when this is returned.
    #[error("validation error: {0}")]
    Validation(String),

    /// Misuse of the edit history (nested gestures, replay against a diverged model).
    #[error("history error: {0}")]
    History(String),

    /// Failure at the rasterizer/resource boundary. Fatal for the current export run.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing a project.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LenticularError {
    /// Build a [`LenticularError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`LenticularError::History`] value.
    pub fn history(msg: impl Into<String>) -> Self {
        Self::History(msg.into())
    }

    /// Build a [`LenticularError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`LenticularError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
