//! Windowed fingerprints over pre-order key sequences.

use crate::model::{StructuralTree, TraversalMode};
use clonescope_api::StructuralKey;
use std::collections::HashMap;
use xxhash_rust::xxh3::Xxh3DefaultBuilder;

pub const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
pub const FNV_PRIME: u32 = 16_777_619;

/// Longest and shortest block the run-length collapse looks for.
const MAX_RUN_BLOCK: usize = 16;
const MIN_RUN_BLOCK: usize = 2;

const LANES: usize = 8;

/// Exact equality of two key runs, compared a lane group at a time.
pub(crate) fn keys_equal(a: &[u32], b: &[u32]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut left = a.chunks_exact(LANES);
    let mut right = b.chunks_exact(LANES);
    for (x, y) in left.by_ref().zip(right.by_ref()) {
        let diff = x.iter().zip(y).fold(0u32, |acc, (p, q)| acc | (p ^ q));
        if diff != 0 {
            return false;
        }
    }
    left.remainder() == right.remainder()
}

/// FNV-1a over the symbol half of each key.
pub fn window_hash(keys: &[u32]) -> u32 {
    keys.iter().fold(FNV_OFFSET_BASIS, |hash, &key| {
        (hash ^ ((key >> 16) & 0xFFFF)).wrapping_mul(FNV_PRIME)
    })
}

/// Immutable fingerprint of one tree.
#[derive(Debug, Clone)]
pub struct FingerprintIndex {
    keys: Vec<u32>,
    lines: Vec<u32>,
    names: Option<Vec<String>>,
    window_size: usize,
    window_hashes: Vec<u32>,
    buckets: HashMap<u32, Vec<u32>, Xxh3DefaultBuilder>,
}

impl FingerprintIndex {
    /// Flattens `tree` in pre-order, collapses repeats and indexes every window.
    ///
    /// Names are carried along only for deep trees; unnamed nodes get an
    /// empty name.
    pub fn build(tree: &StructuralTree, window_size: usize) -> Self {
        let deep = tree.mode() == TraversalMode::Deep;
        let mut keys = Vec::with_capacity(tree.len());
        let mut lines = Vec::with_capacity(tree.len());
        let mut names = deep.then(|| Vec::with_capacity(tree.len()));

        for id in tree.preorder() {
            let node = tree.node(id);
            keys.push(node.key.raw());
            lines.push(node.line);
            if let Some(names) = names.as_mut() {
                names.push(tree.name(id).unwrap_or_default().to_string());
            }
        }

        Self::from_sequence(keys, lines, names, window_size)
    }

    /// Builds an index from an already flattened sequence.
    pub fn from_sequence(
        keys: Vec<u32>,
        lines: Vec<u32>,
        names: Option<Vec<String>>,
        window_size: usize,
    ) -> Self {
        let (keys, lines, names) = collapse_runs(keys, lines, names);

        let window_count = match window_size {
            0 => 0,
            w if keys.len() >= w => keys.len() - w + 1,
            _ => 0,
        };
        let window_hashes: Vec<u32> = (0..window_count)
            .map(|offset| window_hash(&keys[offset..offset + window_size]))
            .collect();

        let mut buckets: HashMap<u32, Vec<u32>, Xxh3DefaultBuilder> = HashMap::default();
        for (offset, &hash) in window_hashes.iter().enumerate() {
            buckets.entry(hash).or_default().push(offset as u32);
        }

        Self {
            keys,
            lines,
            names,
            window_size,
            window_hashes,
            buckets,
        }
    }

    pub fn keys(&self) -> &[u32] {
        &self.keys
    }

    pub fn key(&self, offset: usize) -> StructuralKey {
        StructuralKey::from_raw(self.keys[offset])
    }

    pub fn lines(&self) -> &[u32] {
        &self.lines
    }

    pub fn names(&self) -> Option<&[String]> {
        self.names.as_deref()
    }

    pub fn is_deep(&self) -> bool {
        self.names.is_some()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn window_count(&self) -> usize {
        self.window_hashes.len()
    }

    pub fn window_hash_at(&self, offset: usize) -> u32 {
        self.window_hashes[offset]
    }

    pub fn window(&self, offset: usize) -> &[u32] {
        &self.keys[offset..offset + self.window_size]
    }

    /// Window start offsets sharing `hash`, ascending.
    pub fn bucket(&self, hash: u32) -> &[u32] {
        self.buckets.get(&hash).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

type Sequence = (Vec<u32>, Vec<u32>, Option<Vec<String>>);

/// Keeps one copy of every run of adjacent identical blocks (16 down to 2 keys).
fn collapse_runs(keys: Vec<u32>, lines: Vec<u32>, names: Option<Vec<String>>) -> Sequence {
    let len = keys.len();
    let mut out_keys = Vec::with_capacity(len);
    let mut out_lines = Vec::with_capacity(len);
    let mut out_names = names.as_ref().map(|_| Vec::with_capacity(len));

    let mut emit = |range: std::ops::Range<usize>,
                    out_keys: &mut Vec<u32>,
                    out_lines: &mut Vec<u32>| {
        out_keys.extend_from_slice(&keys[range.clone()]);
        out_lines.extend_from_slice(&lines[range.clone()]);
        if let (Some(out), Some(src)) = (out_names.as_mut(), names.as_ref()) {
            out.extend(src[range].iter().cloned());
        }
    };

    let mut idx = 0;
    while idx < len {
        let mut collapsed = false;
        for block in (MIN_RUN_BLOCK..=MAX_RUN_BLOCK).rev() {
            if idx + 2 * block > len {
                continue;
            }
            let mut next = idx;
            while next + 2 * block <= len
                && keys_equal(&keys[next..next + block], &keys[next + block..next + 2 * block])
            {
                next += block;
            }
            if next > idx {
                emit(idx..idx + block, &mut out_keys, &mut out_lines);
                idx = next + block;
                collapsed = true;
                break;
            }
        }
        if !collapsed {
            emit(idx..idx + 1, &mut out_keys, &mut out_lines);
            idx += 1;
        }
    }

    (out_keys, out_lines, out_names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(keys: &[u32], window: usize) -> FingerprintIndex {
        let lines = (1..=keys.len() as u32).collect();
        FingerprintIndex::from_sequence(keys.to_vec(), lines, None, window)
    }

    #[test]
    fn test_keys_equal_handles_tails() {
        let a: Vec<u32> = (0..19).collect();
        let mut b = a.clone();
        assert!(keys_equal(&a, &b));
        b[18] = 99;
        assert!(!keys_equal(&a, &b));
        b[18] = 18;
        b[3] = 0;
        assert!(!keys_equal(&a, &b));
        assert!(!keys_equal(&a[..4], &a[..5]));
    }

    #[test]
    fn test_window_hash_ignores_field_half() {
        let a = [0x0001_0002, 0x0003_0004];
        let b = [0x0001_FFFF, 0x0003_0000];
        assert_eq!(window_hash(&a), window_hash(&b));
        assert_ne!(window_hash(&a), window_hash(&[0x0002_0002, 0x0003_0004]));

        let manual = (FNV_OFFSET_BASIS ^ 1).wrapping_mul(FNV_PRIME);
        assert_eq!(window_hash(&[0x0001_0000]), manual);
    }

    #[test]
    fn test_collapse_keeps_one_copy_of_runs() {
        // 1 2 1 2 1 2 3 -> 1 2 3
        let idx = index(&[1, 2, 1, 2, 1, 2, 3], 1);
        assert_eq!(idx.keys(), &[1, 2, 3]);
        assert_eq!(idx.lines(), &[1, 2, 7]);

        // No adjacent repetition: untouched.
        let idx = index(&[1, 2, 3, 1, 4, 2], 1);
        assert_eq!(idx.keys(), &[1, 2, 3, 1, 4, 2]);
    }

    #[test]
    fn test_collapse_prefers_longest_block() {
        let block: Vec<u32> = (10..26).collect();
        let mut keys = block.clone();
        keys.extend(&block);
        keys.extend(&block);
        keys.push(7);

        let idx = index(&keys, 4);
        let mut expected = block.clone();
        expected.push(7);
        assert_eq!(idx.keys(), expected.as_slice());
    }

    #[test]
    fn test_windows_cover_every_full_offset() {
        let keys: Vec<u32> = (0..10).map(|i| i << 16).collect();
        let idx = index(&keys, 4);
        assert_eq!(idx.window_count(), 7);
        for offset in 0..idx.window_count() {
            let hash = idx.window_hash_at(offset);
            assert!(idx.bucket(hash).contains(&(offset as u32)));
        }

        assert_eq!(index(&keys, 10).window_count(), 1);
        assert_eq!(index(&keys, 11).window_count(), 0);
        assert_eq!(index(&keys, 0).window_count(), 0);
    }

    #[test]
    fn test_names_follow_collapse() {
        let keys = vec![5, 6, 5, 6, 9];
        let lines = vec![1, 1, 2, 2, 3];
        let names = Some(vec!["a", "b", "a", "b", "c"].into_iter().map(String::from).collect());
        let idx = FingerprintIndex::from_sequence(keys, lines, names, 2);
        assert!(idx.is_deep());
        assert_eq!(idx.keys(), &[5, 6, 9]);
        assert_eq!(idx.names().unwrap(), &["a", "b", "c"]);
    }
}
