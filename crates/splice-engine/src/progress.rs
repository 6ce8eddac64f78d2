//! Timer-driven progress reporting
//!
//! The bar is cosmetic: it cycles on a fixed interval whether or not the
//! underlying request is making progress.

use splice_core::ProgressSink;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Guard for a running progress timer. Dropping it stops the timer and
/// closes the progress surface exactly once.
pub struct ProgressTicker {
    sink: Arc<dyn ProgressSink>,
    task: Option<JoinHandle<()>>,
}

impl ProgressTicker {
    /// Must be called from within a tokio runtime.
    pub fn start(
        sink: Arc<dyn ProgressSink>,
        title: &str,
        interval: Duration,
        step: i32,
    ) -> Self {
        sink.begin(title);
        let ticking = Arc::clone(&sink);
        let task = tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            // The first tick completes immediately.
            timer.tick().await;
            let mut percent = 0;
            loop {
                timer.tick().await;
                let (next, increment) = next_increment(percent, step);
                percent = next;
                ticking.report(increment);
            }
        });
        Self {
            sink,
            task: Some(task),
        }
    }

    /// Stop the timer now instead of at drop.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.sink.finish();
        }
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Advance a wrapping percentage, returning the new value and the delta to report.
pub(crate) fn next_increment(percent: i32, step: i32) -> (i32, i32) {
    let next = (percent + step).rem_euclid(100);
    (next, next - percent)
}
