//! Callback types shared by states and transitions.

use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

/// Failure raised by an entry/exit callback, a guard, or an action.
///
/// The engine never inspects or suppresses these: they travel back to the
/// caller of `start`, `stop`, `restart` or `trigger_event` untouched.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CallbackError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl CallbackError {
    /// Create an error from a plain message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error, keeping it as the source.
    pub fn from_source<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: error.to_string(),
            source: Some(Box::new(error)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result returned by every callback.
pub type CallbackResult = Result<(), CallbackError>;

/// Single-argument procedure attached to a state or transition.
pub type Callback<D> = Arc<dyn Fn(&D) -> CallbackResult + Send + Sync>;

/// Run callbacks in order, stopping at the first failure.
pub(crate) fn run_all<D>(callbacks: &[Callback<D>], data: &D) -> CallbackResult {
    for callback in callbacks {
        callback(data)?;
    }
    Ok(())
}
