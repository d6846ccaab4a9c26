//! # Exponential Backoff
//!
//! Progressive retry delays for failed reconciliation passes.
//!
//! Each delay doubles the previous one, starting at the configured minimum and
//! capped at the configured maximum. A successful pass resets the sequence.
//!
//! ## Usage
//!
//! ```rust
//! use wavefront_operator::controller::backoff::ExponentialBackoff;
//!
//! let mut backoff = ExponentialBackoff::new(5, 300);
//! assert_eq!(backoff.next_backoff_seconds(), 5);
//! assert_eq!(backoff.next_backoff_seconds(), 10);
//! assert_eq!(backoff.next_backoff_seconds(), 20);
//! assert_eq!(backoff.next_backoff_seconds(), 40);
//! ```

use std::time::Duration;

/// Exponential backoff calculator
///
/// # Example
///
/// ```
/// use wavefront_operator::controller::backoff::ExponentialBackoff;
///
/// let mut backoff = ExponentialBackoff::new(5, 300);
/// println!("Backoff: {}s", backoff.next_backoff_seconds());
/// ```
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    /// First delay, and the value restored on reset
    min_seconds: u64,
    /// Delay returned by the next call
    current_seconds: u64,
    /// Upper bound on any delay
    max_seconds: u64,
}

impl ExponentialBackoff {
    /// Create a backoff bounded by `min_seconds` and `max_seconds`
    ///
    /// A zero minimum is raised to one second so the sequence can grow.
    ///
    /// # Example
    ///
    /// ```
    /// use wavefront_operator::controller::backoff::ExponentialBackoff;
    ///
    /// let backoff = ExponentialBackoff::new(5, 300);
    /// ```
    #[must_use]
    pub fn new(min_seconds: u64, max_seconds: u64) -> Self {
        let min_seconds = min_seconds.max(1);
        let max_seconds = max_seconds.max(min_seconds);
        Self {
            min_seconds,
            current_seconds: min_seconds,
            max_seconds,
        }
    }

    /// Get the next backoff duration in seconds and advance the sequence
    ///
    /// # Example
    ///
    /// ```
    /// use wavefront_operator::controller::backoff::ExponentialBackoff;
    ///
    /// let mut backoff = ExponentialBackoff::new(100, 300);
    /// assert_eq!(backoff.next_backoff_seconds(), 100);
    /// assert_eq!(backoff.next_backoff_seconds(), 200);
    /// assert_eq!(backoff.next_backoff_seconds(), 300);
    /// assert_eq!(backoff.next_backoff_seconds(), 300);
    /// ```
    pub fn next_backoff_seconds(&mut self) -> u64 {
        let result = self.current_seconds;
        self.current_seconds = self
            .current_seconds
            .saturating_mul(2)
            .min(self.max_seconds);
        result
    }

    /// Get the next backoff duration as a `Duration` and advance the sequence
    ///
    /// # Example
    ///
    /// ```
    /// use wavefront_operator::controller::backoff::ExponentialBackoff;
    /// use std::time::Duration;
    ///
    /// let mut backoff = ExponentialBackoff::new(1, 60);
    /// assert_eq!(backoff.next_backoff(), Duration::from_secs(1));
    /// ```
    #[must_use]
    pub fn next_backoff(&mut self) -> Duration {
        Duration::from_secs(self.next_backoff_seconds())
    }

    /// Reset the backoff to the initial state
    pub fn reset(&mut self) {
        self.current_seconds = self.min_seconds;
    }
}
