// ⚠️ Feed Errors
// Validation failures short-circuit before any I/O; dependency failures abort
// the whole request. Favorite lookup failures never reach this type.

use std::error::Error as StdError;
use std::time::Duration;

/// Message returned for missing or unparsable coordinates
pub const COORDINATES_REQUIRED: &str = "Latitude and longitude are required.";

#[derive(thiserror::Error, Debug)]
pub enum FeedError {
    #[error("{0}")]
    Validation(String),

    /// Provider, catalog store or record builder failure
    #[error("dependency failure: {context}")]
    Dependency {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync + 'static>,
    },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("internal error: {0}")]
    Internal(String),
}

impl FeedError {
    pub fn coordinates_required() -> Self {
        FeedError::Validation(COORDINATES_REQUIRED.to_string())
    }

    pub fn dependency(context: impl Into<String>, source: anyhow::Error) -> Self {
        FeedError::Dependency {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, FeedError::Validation(_))
    }

    pub fn is_dependency(&self) -> bool {
        matches!(self, FeedError::Dependency { .. })
    }
}

pub type Result<T> = std::result::Result<T, FeedError>;
