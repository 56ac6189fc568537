//! Guard predicates for controlling transitions.
//!
//! A guard looks at the data passed to `trigger_event` and decides whether
//! the matching transition fires. A guard that returns `false` suppresses
//! the transition entirely.

use super::callback::CallbackError;
use std::sync::Arc;

type Predicate<D> = Arc<dyn Fn(&D) -> Result<bool, CallbackError> + Send + Sync>;

/// Predicate over caller-supplied data that gates a transition.
///
/// # Example
///
/// ```rust
/// use resumable_fsm::core::Guard;
///
/// let only_even = Guard::new(|n: &u32| n % 2 == 0);
///
/// assert!(only_even.check(&4).unwrap());
/// assert!(!only_even.check(&3).unwrap());
/// ```
pub struct Guard<D> {
    predicate: Predicate<D>,
}

impl<D: 'static> Guard<D> {
    /// Create a guard from an infallible predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&D) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(move |data: &D| Ok(predicate(data))),
        }
    }

    /// Create a guard whose evaluation may itself fail.
    ///
    /// A failure propagates to the caller of `trigger_event`. The machine has
    /// already moved to the destination state, but the action and exit/entry
    /// callbacks do not run.
    ///
    /// ```rust
    /// use resumable_fsm::core::{CallbackError, Guard};
    ///
    /// let parse_ok = Guard::fallible(|raw: &String| {
    ///     raw.parse::<u8>()
    ///         .map(|n| n > 10)
    ///         .map_err(CallbackError::from_source)
    /// });
    ///
    /// assert!(parse_ok.check(&"42".to_string()).unwrap());
    /// assert!(parse_ok.check(&"x".to_string()).is_err());
    /// ```
    pub fn fallible<F>(predicate: F) -> Self
    where
        F: Fn(&D) -> Result<bool, CallbackError> + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    /// Evaluate the guard against `data`.
    pub fn check(&self, data: &D) -> Result<bool, CallbackError> {
        (self.predicate)(data)
    }
}

impl<D> Clone for Guard<D> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}
