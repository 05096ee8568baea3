//! Throttled progress reporting shared by the render threads.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use ember_core::ProgressSettings;

/// Lock-guarded work counter that reports percentages to a callback.
///
/// A report goes out when the percentage has grown by at least
/// `min_percent_delta` or `min_interval_ms` has passed since the last one,
/// whichever comes first, and always on completion.
pub struct Progress<'a> {
    total: usize,
    min_percent_delta: f32,
    min_interval: Duration,
    state: Mutex<ProgressState>,
    callback: &'a (dyn Fn(f32) + Sync),
}

struct ProgressState {
    done: usize,
    last_percent: f32,
    last_report: Instant,
}

impl<'a> Progress<'a> {
    pub fn new(total: usize, settings: &ProgressSettings, callback: &'a (dyn Fn(f32) + Sync)) -> Self {
        Self {
            total: total.max(1),
            min_percent_delta: settings.min_percent_delta,
            min_interval: Duration::from_millis(settings.min_interval_ms),
            state: Mutex::new(ProgressState {
                done: 0,
                last_percent: 0.0,
                last_report: Instant::now(),
            }),
            callback,
        }
    }

    /// Record `units` of finished work.
    pub fn advance(&self, units: usize) {
        let report = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.done = (state.done + units).min(self.total);
            let percent = 100.0 * state.done as f32 / self.total as f32;

            let finished = state.done == self.total;
            let due = percent - state.last_percent >= self.min_percent_delta
                || state.last_report.elapsed() >= self.min_interval;
            if (finished || due) && percent > state.last_percent {
                state.last_percent = percent;
                state.last_report = Instant::now();
                Some(percent)
            } else {
                None
            }
        };

        // Outside the lock, so a slow host never stalls the other rows.
        if let Some(percent) = report {
            (self.callback)(percent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(total: usize, delta: f32, interval_ms: u64, steps: usize) -> Vec<f32> {
        let reports = Mutex::new(Vec::new());
        let callback = |p: f32| reports.lock().unwrap().push(p);
        let settings = ProgressSettings {
            min_percent_delta: delta,
            min_interval_ms: interval_ms,
        };
        let progress = Progress::new(total, &settings, &callback);
        for _ in 0..steps {
            progress.advance(1);
        }
        drop(progress);
        reports.into_inner().unwrap()
    }

    #[test]
    fn test_throttles_by_percent() {
        let reports = collect(1000, 10.0, 60_000, 1000);

        assert_eq!(reports.len(), 10);
        assert_eq!(reports.last().copied(), Some(100.0));
        assert!(reports.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_zero_interval_reports_every_step() {
        let reports = collect(5, 50.0, 0, 5);
        assert_eq!(reports, vec![20.0, 40.0, 60.0, 80.0, 100.0]);
    }

    #[test]
    fn test_completion_always_reported() {
        let reports = collect(3, 90.0, 60_000, 3);
        assert_eq!(reports, vec![100.0]);
    }
}
