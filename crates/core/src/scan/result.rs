use clonescope_api::{MatchResult, ScanResultSink};
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct ScanState {
    results: Vec<MatchResult>,
    deep_results: Vec<MatchResult>,
    max_units: usize,
    finished_units: usize,
}

/// Consistent view of a [`ScanResult`] at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    pub results: usize,
    pub deep_results: usize,
    pub finished_units: usize,
    pub max_units: usize,
    pub aborted: bool,
}

/// Result accumulator shared by every task of a scan.
///
/// All state sits behind one re-entrant lock, so a holder may call back into
/// the accumulator without deadlocking.
#[derive(Debug)]
pub struct ScanResult {
    state: ReentrantMutex<RefCell<ScanState>>,
    cancel: CancellationToken,
}

impl Default for ScanResult {
    fn default() -> Self {
        Self::new(CancellationToken::new())
    }
}

impl ScanResult {
    /// `is_aborted` reports the state of `cancel`.
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            state: ReentrantMutex::new(RefCell::new(ScanState::default())),
            cancel,
        }
    }

    pub fn deep_results(&self) -> Vec<MatchResult> {
        self.state.lock().borrow().deep_results.clone()
    }

    /// `(finished, max)` units of the current phase.
    pub fn progress(&self) -> (usize, usize) {
        let guard = self.state.lock();
        let state = guard.borrow();
        (state.finished_units, state.max_units)
    }

    pub fn summary(&self) -> ScanSummary {
        let _guard = self.state.lock();
        let (finished_units, max_units) = self.progress();
        ScanSummary {
            results: self.results().len(),
            deep_results: self.deep_results().len(),
            finished_units,
            max_units,
            aborted: self.is_aborted(),
        }
    }
}

impl ScanResultSink for ScanResult {
    fn add_result(&self, result: MatchResult) {
        self.state.lock().borrow_mut().results.push(result);
    }

    fn add_deep_result(&self, result: MatchResult) {
        self.state.lock().borrow_mut().deep_results.push(result);
    }

    fn results(&self) -> Vec<MatchResult> {
        self.state.lock().borrow().results.clone()
    }

    fn is_aborted(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Starts a new progress phase of `count` units.
    fn set_max_unit_count(&self, count: usize) {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        state.max_units = count;
        state.finished_units = 0;
    }

    fn inc_finished_unit_count(&self, count: usize) {
        self.state.lock().borrow_mut().finished_units += count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clonescope_api::MatchWindow;
    use std::sync::Arc;

    #[test]
    fn test_accumulates_from_many_threads() {
        let result = Arc::new(ScanResult::default());
        result.set_max_unit_count(8);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let result = result.clone();
                std::thread::spawn(move || {
                    result.add_result(MatchResult::new(vec![MatchWindow {
                        base_start: i,
                        base_end: i,
                        search_start: i,
                        search_end: i,
                    }]));
                    result.inc_finished_unit_count(1);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(result.results().len(), 8);
        assert_eq!(result.progress(), (8, 8));
    }

    #[test]
    fn test_summary_and_abort() {
        let token = CancellationToken::new();
        let result = ScanResult::new(token.clone());
        result.add_result(MatchResult::default());
        result.add_deep_result(MatchResult::default());
        result.set_max_unit_count(3);
        result.inc_finished_unit_count(2);

        let summary = result.summary();
        assert_eq!(summary.results, 1);
        assert_eq!(summary.deep_results, 1);
        assert_eq!((summary.finished_units, summary.max_units), (2, 3));
        assert!(!summary.aborted);

        token.cancel();
        assert!(result.is_aborted());
    }

    #[test]
    fn test_new_phase_resets_finished_units() {
        let result = ScanResult::default();
        result.set_max_unit_count(2);
        result.inc_finished_unit_count(2);
        result.set_max_unit_count(5);
        assert_eq!(result.progress(), (0, 5));
    }
}
