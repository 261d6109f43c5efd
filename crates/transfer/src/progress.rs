//! Upload throughput from acknowledged offsets.
//!
//! The meter keeps `(instant, offset)` points for the acknowledgements seen
//! inside a time window and derives a rate from the oldest and newest.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

const DEFAULT_WINDOW: Duration = Duration::from_secs(5);
const DEFAULT_CAPACITY: usize = 64;

/// Sliding-window rate over the server-acknowledged offset.
pub struct ThroughputMeter {
    inner: Mutex<MeterInner>,
}

struct MeterInner {
    points: VecDeque<(Instant, u64)>,
    window: Duration,
    capacity: usize,
}

impl Default for ThroughputMeter {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl ThroughputMeter {
    pub fn new(window: Duration) -> Self {
        Self {
            inner: Mutex::new(MeterInner {
                points: VecDeque::new(),
                window,
                capacity: DEFAULT_CAPACITY,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MeterInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Forgets history and measures from `offset` onwards, e.g. after a
    /// resumed upload reported where the server stands.
    pub fn restart_at(&self, offset: u64) {
        let mut m = self.lock();
        m.points.clear();
        m.points.push_back((Instant::now(), offset));
    }

    /// Records that the server now holds everything below `offset`.
    ///
    /// An offset behind the newest point restarts the measurement.
    pub fn record(&self, offset: u64) {
        let now = Instant::now();
        let mut m = self.lock();
        if m.points.back().is_some_and(|&(_, last)| offset < last) {
            m.points.clear();
        }
        m.points.push_back((now, offset));

        // The baseline is the newest point at least one window old. It is
        // kept while the points after it carry no new bytes, so a stalled
        // upload reads as slow, not unknown.
        let window = m.window;
        while m.points.len() > 2
            && m.points
                .get(1)
                .is_some_and(|&(at, o)| now.duration_since(at) >= window && o < offset)
        {
            m.points.pop_front();
        }
        while m.points.len() > m.capacity {
            m.points.pop_front();
        }
    }

    /// Bytes per second across the retained points; 0 until two exist.
    pub fn bytes_per_second(&self) -> f64 {
        let m = self.lock();
        let (Some(&(t0, o0)), Some(&(t1, o1))) = (m.points.front(), m.points.back()) else {
            return 0.0;
        };
        let elapsed = t1.duration_since(t0);
        if elapsed.is_zero() {
            return 0.0;
        }
        o1.saturating_sub(o0) as f64 / elapsed.as_secs_f64()
    }

    /// Time left for `remaining` bytes at the current rate.
    pub fn eta(&self, remaining: u64) -> Option<Duration> {
        let rate = self.bytes_per_second();
        (rate > 0.0).then(|| Duration::from_secs_f64(remaining as f64 / rate))
    }
}
