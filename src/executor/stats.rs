// src/executor/stats.rs
// Mutex-guarded stats struct, updated once per email at end of processing (§4.H, §5)

use std::collections::VecDeque;

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Analyzed,
    Failed,
    Timeout,
}

#[derive(Debug, Default)]
struct Inner {
    processed: u64,
    analyzed: u64,
    failed: u64,
    timeouts: u64,
    phase_tallies: [u64; 3],
    processing_time_ms_sum: u64,
    /// Sliding window of the most recent outcomes, used for the
    /// global-failure-rate back-off check (§4.H).
    recent_outcomes: VecDeque<Outcome>,
    recent_window: usize,
}

pub struct ExecutorStats {
    inner: Mutex<Inner>,
}

impl ExecutorStats {
    pub fn new(recent_window: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                recent_window,
                ..Inner::default()
            }),
        }
    }

    pub fn record(&self, outcome: Outcome, phase_used: Option<u8>, processing_time_ms: u64) {
        let mut inner = self.inner.lock();
        inner.processed += 1;
        match outcome {
            Outcome::Analyzed => inner.analyzed += 1,
            Outcome::Failed => inner.failed += 1,
            Outcome::Timeout => inner.timeouts += 1,
        }
        if let Some(phase) = phase_used {
            if (1..=3).contains(&phase) {
                inner.phase_tallies[(phase - 1) as usize] += 1;
            }
        }
        inner.processing_time_ms_sum += processing_time_ms;

        let window = inner.recent_window;
        inner.recent_outcomes.push_back(outcome);
        while inner.recent_outcomes.len() > window {
            inner.recent_outcomes.pop_front();
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let inner = self.inner.lock();
        StatsSnapshot {
            processed: inner.processed,
            analyzed: inner.analyzed,
            failed: inner.failed,
            timeouts: inner.timeouts,
            phase_tallies: inner.phase_tallies,
            average_processing_time_ms: if inner.processed > 0 {
                inner.processing_time_ms_sum as f64 / inner.processed as f64
            } else {
                0.0
            },
        }
    }

    /// Error rate over the trailing window (§4.H back-off trigger).
    pub fn recent_failure_rate(&self) -> f64 {
        let inner = self.inner.lock();
        if inner.recent_outcomes.is_empty() {
            return 0.0;
        }
        let failures = inner
            .recent_outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Failed | Outcome::Timeout))
            .count();
        failures as f64 / inner.recent_outcomes.len() as f64
    }
}

#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub processed: u64,
    pub analyzed: u64,
    pub failed: u64,
    pub timeouts: u64,
    pub phase_tallies: [u64; 3],
    pub average_processing_time_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_rate_reflects_trailing_window_only() {
        let stats = ExecutorStats::new(4);
        stats.record(Outcome::Analyzed, Some(1), 5);
        stats.record(Outcome::Failed, None, 5);
        stats.record(Outcome::Failed, None, 5);
        stats.record(Outcome::Failed, None, 5);
        stats.record(Outcome::Failed, None, 5);
        // Window size 4: the first Analyzed record should have rolled off.
        assert_eq!(stats.recent_failure_rate(), 1.0);
    }
}
