//! Polling policy applied after a lead-form submission.
//!
//! The CRM creates contacts from form submissions asynchronously. The
//! reconciler looks the contact up once immediately and then retries with a
//! linearly increasing delay before each further lookup.

use std::time::Duration;

/// Bounded linear polling schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactPollPolicy {
    /// Lookups after the first one.
    pub max_retries: u32,
    /// Delay added per retry index.
    pub delay_step: Duration,
}

impl Default for ContactPollPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay_step: Duration::from_millis(500),
        }
    }
}

impl ContactPollPolicy {
    /// Delay to wait before the lookup with index `retry` (0 is the first).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use lead_sync::domain::ContactPollPolicy;
    ///
    /// let policy = ContactPollPolicy::default();
    /// assert_eq!(policy.delay_before(0), Duration::ZERO);
    /// assert_eq!(policy.delay_before(3), Duration::from_millis(1_500));
    /// ```
    pub fn delay_before(&self, retry: u32) -> Duration {
        self.delay_step.saturating_mul(retry)
    }

    /// Retry indices for every lookup, including the first.
    pub fn retries(&self) -> impl Iterator<Item = u32> + use<> {
        0..=self.max_retries
    }
}

#[cfg(test)]
mod tests {
    //! Coverage for the polling schedule.

    use super::*;
    use rstest::rstest;

    #[rstest]
    fn default_schedule_waits_zero_then_linear_steps() {
        let policy = ContactPollPolicy::default();
        let delays = policy
            .retries()
            .map(|retry| policy.delay_before(retry))
            .collect::<Vec<_>>();

        assert_eq!(
            delays,
            vec![
                Duration::ZERO,
                Duration::from_millis(500),
                Duration::from_millis(1_000),
                Duration::from_millis(1_500),
            ]
        );
    }

    #[rstest]
    fn zero_retries_still_performs_one_lookup() {
        let policy = ContactPollPolicy {
            max_retries: 0,
            delay_step: Duration::from_secs(1),
        };
        assert_eq!(policy.retries().count(), 1);
    }

    #[rstest]
    fn delay_saturates_instead_of_overflowing() {
        let policy = ContactPollPolicy {
            max_retries: u32::MAX,
            delay_step: Duration::MAX,
        };
        assert_eq!(policy.delay_before(2), Duration::MAX);
    }
}
