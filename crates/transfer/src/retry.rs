use std::time::Duration;

/// Fixed retry schedule for failed upload requests.
///
/// Attempt `n` (0-based) waits `delays[n]`; once the schedule is exhausted
/// the failure is final.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    /// Immediate, then 3 s, 5 s, 10 s and 20 s.
    fn default() -> Self {
        Self::from_millis(&[0, 3_000, 5_000, 10_000, 20_000])
    }
}

impl RetryPolicy {
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    pub fn from_millis(delays: &[u64]) -> Self {
        Self::new(delays.iter().copied().map(Duration::from_millis).collect())
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(Vec::new())
    }

    /// Delay before retry number `attempt` (0-based), or `None` when retries
    /// are exhausted.
    pub fn delay_for_attempt(&self, attempt: usize) -> Option<Duration> {
        self.delays.get(attempt).copied()
    }

    pub fn max_retries(&self) -> usize {
        self.delays.len()
    }
}
