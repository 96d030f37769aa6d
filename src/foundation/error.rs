/// Convenience result type used across storysheet.
pub type StorysheetResult<T> = Result<T, StorysheetError>;

/// A single source image could not be turned into pixels.
///
/// Covers network failures, unreadable files and undecodable bytes alike. The offending
/// reference is always carried so callers can point at the exact input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to load image '{reference}': {reason}")]
pub struct LoadError {
    /// Display form of the source reference (URL, path, or inline marker).
    pub reference: String,
    /// Human-readable cause.
    pub reason: String,
}

impl LoadError {
    /// Build a [`LoadError`] for `reference`.
    pub fn new(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            reason: reason.into(),
        }
    }
}

/// Top-level error taxonomy used by library APIs.
#[derive(thiserror::Error, Debug)]
pub enum StorysheetError {
    /// Invalid user-provided data (project files, collections, arguments).
    #[error("validation error: {0}")]
    Validation(String),

    /// A source image failed to load or decode.
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    /// A drawing surface could not be created or a composite could not be encoded.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The external generation service failed.
    #[error("generation error: {0}")]
    Generation(#[from] crate::generate::service::GenerationError),

    /// Invalid configuration values.
    #[error("config error: {0}")]
    Config(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StorysheetError {
    /// Build a [`StorysheetError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`StorysheetError::Encoding`] value.
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Build a [`StorysheetError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`StorysheetError::Load`] value.
    pub fn load(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Load(LoadError::new(reference, reason))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
