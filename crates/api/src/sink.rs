use crate::models::MatchResult;

/// Shared accumulator a scan reports into.
///
/// Implementations are touched by many corpus tasks at once and must
/// serialize access internally.
pub trait ScanResultSink: Send + Sync {
    fn add_result(&self, result: MatchResult);

    fn add_deep_result(&self, result: MatchResult);

    /// Snapshot of the fast-pass results gathered so far.
    fn results(&self) -> Vec<MatchResult>;

    fn is_aborted(&self) -> bool {
        false
    }

    fn set_max_unit_count(&self, count: usize);

    fn inc_finished_unit_count(&self, count: usize);
}
