//! Window matching between two fingerprint indexes.
//!
//! Base offsets are visited in ascending order and, for each one, the search
//! offsets of the same hash bucket in ascending order. Every candidate pair is
//! confirmed by an exact key comparison before it counts.

use crate::fingerprint::{FingerprintIndex, keys_equal};
use clonescope_api::{MatchResult, MatchWindow};
use std::collections::HashSet;

fn compatible(base: &FingerprintIndex, search: &FingerprintIndex, window_size: usize) -> bool {
    if base.window_size() != window_size || search.window_size() != window_size {
        tracing::warn!(
            "Window size {} does not match indexes ({} / {})",
            window_size,
            base.window_size(),
            search.window_size()
        );
        return false;
    }
    window_size > 0
}

/// Reports whether any window of `base` also occurs in `search`.
pub fn match_fast(base: &FingerprintIndex, search: &FingerprintIndex, window_size: usize) -> bool {
    if !compatible(base, search, window_size) {
        return false;
    }
    (0..base.window_count()).any(|b| {
        search
            .bucket(base.window_hash_at(b))
            .iter()
            .any(|&s| keys_equal(base.window(b), search.window(s as usize)))
    })
}

/// Enumerates matching regions, one window per contiguous region.
///
/// For deep indexes every position of a window must also agree on its name.
/// A confirmed window is grown in both directions while keys (and names)
/// keep agreeing and the lines involved are not yet covered. Candidates whose
/// start line falls in an already reported range are skipped.
pub fn match_deep(
    base: &FingerprintIndex,
    search: &FingerprintIndex,
    window_size: usize,
) -> MatchResult {
    let mut windows = Vec::new();
    if !compatible(base, search, window_size) {
        return MatchResult::new(windows);
    }

    let names_agree = |b: usize, s: usize| match (base.names(), search.names()) {
        (Some(left), Some(right)) => left[b] == right[s],
        _ => true,
    };
    let same = |b: usize, s: usize| base.keys()[b] == search.keys()[s] && names_agree(b, s);

    let mut done_base: HashSet<u32> = HashSet::new();
    let mut done_search: HashSet<u32> = HashSet::new();

    for b in 0..base.window_count() {
        if done_base.contains(&base.lines()[b]) {
            continue;
        }
        for &s in search.bucket(base.window_hash_at(b)) {
            let s = s as usize;
            if done_search.contains(&search.lines()[s]) {
                continue;
            }
            if !keys_equal(base.window(b), search.window(s))
                || !(0..window_size).all(|k| names_agree(b + k, s + k))
            {
                continue;
            }

            let free = |b: usize, s: usize| {
                !done_base.contains(&base.lines()[b]) && !done_search.contains(&search.lines()[s])
            };

            let (mut start_b, mut start_s) = (b, s);
            while start_b > 0
                && start_s > 0
                && same(start_b - 1, start_s - 1)
                && free(start_b - 1, start_s - 1)
            {
                start_b -= 1;
                start_s -= 1;
            }
            let (mut end_b, mut end_s) = (b + window_size - 1, s + window_size - 1);
            while end_b + 1 < base.len()
                && end_s + 1 < search.len()
                && same(end_b + 1, end_s + 1)
                && free(end_b + 1, end_s + 1)
            {
                end_b += 1;
                end_s += 1;
            }

            let (base_start, base_end) = line_span(&base.lines()[start_b..=end_b]);
            let (search_start, search_end) = line_span(&search.lines()[start_s..=end_s]);
            done_base.extend(base_start..=base_end);
            done_search.extend(search_start..=search_end);
            windows.push(MatchWindow {
                base_start,
                base_end,
                search_start,
                search_end,
            });
            break;
        }
    }

    MatchResult::new(windows)
}

fn line_span(lines: &[u32]) -> (u32, u32) {
    let start = lines.iter().copied().min().unwrap_or_default();
    let end = lines.iter().copied().max().unwrap_or_default();
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Keys that never form adjacent repeats, one per line.
    fn distinct(n: u32, salt: u32) -> Vec<u32> {
        (0..n).map(|i| ((i * 7 + salt) % 1000 + 1) << 16).collect()
    }

    fn shallow(keys: Vec<u32>, first_line: u32, window: usize) -> FingerprintIndex {
        let lines = (first_line..first_line + keys.len() as u32).collect();
        FingerprintIndex::from_sequence(keys, lines, None, window)
    }

    fn deep(keys: Vec<u32>, names: Vec<&str>, window: usize) -> FingerprintIndex {
        let lines = (1..=keys.len() as u32).collect();
        let names = names.into_iter().map(String::from).collect();
        FingerprintIndex::from_sequence(keys, lines, Some(names), window)
    }

    #[test]
    fn test_fast_finds_shared_subsequence() {
        let shared = distinct(20, 3);
        let mut base_keys = distinct(30, 500);
        base_keys.extend(&shared);
        let mut search_keys = shared.clone();
        search_keys.extend(distinct(10, 900));

        let base = shallow(base_keys, 1, 8);
        let search = shallow(search_keys, 1, 8);
        assert!(match_fast(&base, &search, 8));
    }

    #[test]
    fn test_fast_rejects_disjoint_sequences() {
        let base = shallow(distinct(50, 0), 1, 8);
        let search = shallow((1..=50).map(|i| (2000 + i) << 16).collect(), 1, 8);
        assert!(!match_fast(&base, &search, 8));
    }

    #[test]
    fn test_hash_collision_needs_exact_keys() {
        // Same symbol halves, different field halves: same bucket, different keys.
        let base_keys: Vec<u32> = distinct(10, 1);
        let search_keys: Vec<u32> = base_keys.iter().map(|k| k | 1).collect();
        let base = shallow(base_keys, 1, 4);
        let search = shallow(search_keys, 1, 4);
        assert_eq!(base.window_hash_at(0), search.window_hash_at(0));
        assert!(!match_fast(&base, &search, 4));
        assert!(match_deep(&base, &search, 4).is_empty());
    }

    #[test]
    fn test_identical_sequences_collapse_into_one_window() {
        let keys = distinct(200, 11);
        let base = shallow(keys.clone(), 1, 16);
        let search = shallow(keys, 101, 16);

        let result = match_deep(&base, &search, 16);
        assert_eq!(
            result.windows,
            vec![MatchWindow {
                base_start: 1,
                base_end: 200,
                search_start: 101,
                search_end: 300,
            }]
        );
    }

    #[test]
    fn test_separate_regions_reported_separately() {
        let first = distinct(20, 1);
        let second = distinct(20, 400);
        let mut base_keys = first.clone();
        base_keys.extend(distinct(10, 700));
        base_keys.extend(&second);
        let mut search_keys = second.clone();
        search_keys.extend(distinct(10, 800));
        search_keys.extend(&first);

        let base = shallow(base_keys, 1, 8);
        let search = shallow(search_keys, 1, 8);
        let result = match_deep(&base, &search, 8);

        assert_eq!(result.windows.len(), 2);
        assert_eq!(result.windows[0].base_start, 1);
        assert_eq!(result.windows[0].base_end, 20);
        assert_eq!(result.windows[0].search_start, 31);
        assert_eq!(result.windows[1].base_start, 31);
        assert_eq!(result.windows[1].search_end, 20);
    }

    #[test]
    fn test_deep_requires_names_to_agree() {
        let keys = distinct(6, 5);
        let names = vec!["", "foo", "", "int", "", "bar"];
        let mut renamed = names.clone();
        renamed[3] = "long";

        let base = deep(keys.clone(), names.clone(), 6);
        let same = deep(keys.clone(), names, 6);
        let other = deep(keys, renamed, 6);

        assert_eq!(match_deep(&base, &same, 6).windows.len(), 1);
        assert!(match_deep(&base, &other, 6).is_empty());
        assert!(match_fast(&base, &other, 6));
    }

    #[test]
    fn test_mismatched_window_size_matches_nothing() {
        let base = shallow(distinct(20, 0), 1, 8);
        let search = shallow(distinct(20, 0), 1, 8);
        assert!(!match_fast(&base, &search, 4));
        assert!(match_deep(&base, &search, 4).is_empty());
    }
}
