//! Timing for upstream round trips.

use std::time::{Duration, Instant};

use tracing::debug;

/// RAII timer that logs how long a request took when dropped, so early
/// returns and errors are still reported.
pub struct RequestTimer<'a> {
    start: Instant,
    url: &'a str,
}

impl<'a> RequestTimer<'a> {
    pub fn new(url: &'a str) -> Self {
        Self {
            start: Instant::now(),
            url,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for RequestTimer<'_> {
    fn drop(&mut self) {
        debug!(
            event = "Upstream",
            phase = "Elapsed",
            url = self.url,
            elapsed_ms = self.elapsed().as_millis() as u64
        );
    }
}
