//! Categorized stage errors for the analysis pipeline
//!
//! Each pipeline stage owns exactly one error category. The category is
//! declared by the caller when a stage is wrapped in
//! [`crate::resilience::execute`]; it is never inferred from message text.

use thiserror::Error;

/// Boxed cause attached to a stage error, if any.
pub type ErrorSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error taxonomy for the pipeline, one variant per stage.
#[derive(Error, Debug)]
pub enum StageError {
    /// Data loading, parsing, or summary validation failure
    #[error("data error: {message}")]
    Data {
        message: String,
        #[source]
        source: Option<ErrorSource>,
    },

    /// Planning or step-decomposition failure
    #[error("planner error: {message}")]
    Planner {
        message: String,
        #[source]
        source: Option<ErrorSource>,
    },

    /// Hypothesis generation failure
    #[error("insight error: {message}")]
    Insight {
        message: String,
        #[source]
        source: Option<ErrorSource>,
    },

    /// Validation-stage failure
    #[error("evaluator error: {message}")]
    Evaluator {
        message: String,
        #[source]
        source: Option<ErrorSource>,
    },

    /// Creative-generation failure
    #[error("creative error: {message}")]
    Creative {
        message: String,
        #[source]
        source: Option<ErrorSource>,
    },
}

impl StageError {
    pub fn data(message: impl Into<String>) -> Self {
        Self::Data {
            message: message.into(),
            source: None,
        }
    }

    pub fn data_with(message: impl Into<String>, source: impl Into<ErrorSource>) -> Self {
        Self::Data {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn planner(message: impl Into<String>) -> Self {
        Self::Planner {
            message: message.into(),
            source: None,
        }
    }

    pub fn insight(message: impl Into<String>) -> Self {
        Self::Insight {
            message: message.into(),
            source: None,
        }
    }

    pub fn evaluator(message: impl Into<String>) -> Self {
        Self::Evaluator {
            message: message.into(),
            source: None,
        }
    }

    pub fn creative(message: impl Into<String>) -> Self {
        Self::Creative {
            message: message.into(),
            source: None,
        }
    }

    /// Stable lowercase tag for structured log records.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Data { .. } => "data",
            Self::Planner { .. } => "planner",
            Self::Insight { .. } => "insight",
            Self::Evaluator { .. } => "evaluator",
            Self::Creative { .. } => "creative",
        }
    }

    /// The message carried by the variant, without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Data { message, .. }
            | Self::Planner { message, .. }
            | Self::Insight { message, .. }
            | Self::Evaluator { message, .. }
            | Self::Creative { message, .. } => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_tags_are_stable() {
        assert_eq!(StageError::data("x").category(), "data");
        assert_eq!(StageError::planner("x").category(), "planner");
        assert_eq!(StageError::insight("x").category(), "insight");
        assert_eq!(StageError::evaluator("x").category(), "evaluator");
        assert_eq!(StageError::creative("x").category(), "creative");
    }

    #[test]
    fn display_includes_category_and_message() {
        let err = StageError::insight("no drop entries");
        assert_eq!(err.to_string(), "insight error: no drop entries");
    }

    #[test]
    fn source_is_preserved() {
        use std::error::Error;
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = StageError::data_with("summary file missing", io);
        assert!(err.source().is_some());
    }
}
