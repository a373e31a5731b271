//! Wire format of a deduplicated forest.
//!
//! Four leading words hold the word counts of four sections, followed by the
//! sections themselves: child index list, symbol kinds, field kinds and child
//! counts. Each section is a self-describing [`CompressedBlob`]; the outer
//! container has no header of its own.

use crate::compression::{
    CompressOptions, CompressedBlob, CompressionRegistry, CompressorId, ModifierId, Payload,
};
use crate::dedup::{ChildIndexList, DedupEntry, DedupTable, DedupedForest};
use crate::error::{BlobError, Result};
use clonescope_api::StructuralKey;

const SECTION_COUNT: usize = 4;
const SECTION_NAMES: [&str; SECTION_COUNT] = ["indices", "symbols", "fields", "counts"];

/// Serializes a forest into 32-bit words.
pub fn serialize(forest: &DedupedForest, registry: &CompressionRegistry) -> Vec<u32> {
    let entries = forest.table.entries();
    let symbols: Vec<u32> = entries.iter().map(|e| e.key.symbol() as u32).collect();
    let fields: Vec<u32> = entries.iter().map(|e| e.key.field() as u32).collect();
    let counts: Vec<u32> = entries.iter().map(|e| e.child_count).collect();

    let general = CompressOptions::new()
        .modifiers([ModifierId::None])
        .compressors([CompressorId::Lzma]);
    let block_sorting = CompressOptions::new()
        .modifiers([ModifierId::None])
        .compressors([CompressorId::Bsc]);

    let sections = [
        (forest.indices.as_slice().to_vec(), &general),
        (symbols, &block_sorting),
        (fields, &block_sorting),
        (counts, &block_sorting),
    ];

    let blobs: Vec<Vec<u32>> = sections
        .into_iter()
        .zip(SECTION_NAMES)
        .map(|((words, options), name)| {
            let options = options.clone().label(name);
            registry
                .compress(Payload::from_words(words), &options)
                .to_words()
        })
        .collect();

    let mut out = Vec::with_capacity(SECTION_COUNT + blobs.iter().map(Vec::len).sum::<usize>());
    out.extend(blobs.iter().map(|blob| blob.len() as u32));
    for blob in blobs {
        out.extend(blob);
    }
    out
}

pub fn serialize_bytes(forest: &DedupedForest, registry: &CompressionRegistry) -> Vec<u8> {
    serialize(forest, registry)
        .iter()
        .flat_map(|w| w.to_le_bytes())
        .collect()
}

/// Parses and decompresses a serialized forest.
pub fn deserialize(words: &[u32], registry: &CompressionRegistry) -> Result<DedupedForest> {
    if words.len() < SECTION_COUNT {
        return Err(BlobError::Truncated {
            expected: SECTION_COUNT * 4,
            found: words.len() * 4,
        }
        .into());
    }
    let (lengths, mut body) = words.split_at(SECTION_COUNT);
    let declared: usize = lengths.iter().map(|&len| len as usize).sum();
    if declared != body.len() {
        return Err(BlobError::Malformed(format!(
            "sections declare {} words, {} present",
            declared,
            body.len()
        ))
        .into());
    }

    let mut sections = Vec::with_capacity(SECTION_COUNT);
    for &len in lengths {
        let (section, rest) = body.split_at(len as usize);
        let blob = CompressedBlob::from_words(section)?;
        sections.push(registry.decompress(&blob)?.into_words());
        body = rest;
    }

    let counts = sections.pop().unwrap_or_default();
    let fields = sections.pop().unwrap_or_default();
    let symbols = sections.pop().unwrap_or_default();
    let indices = sections.pop().unwrap_or_default();

    if symbols.len() != fields.len() || symbols.len() != counts.len() {
        return Err(BlobError::Malformed(format!(
            "table columns disagree: {} symbols, {} fields, {} counts",
            symbols.len(),
            fields.len(),
            counts.len()
        ))
        .into());
    }

    let entries = symbols
        .iter()
        .zip(&fields)
        .zip(&counts)
        .map(|((&symbol, &field), &child_count)| {
            let symbol = u16::try_from(symbol)
                .map_err(|_| BlobError::Malformed(format!("symbol kind {} overflows", symbol)))?;
            let field = u16::try_from(field)
                .map_err(|_| BlobError::Malformed(format!("field kind {} overflows", field)))?;
            Ok(DedupEntry {
                key: StructuralKey::new(symbol, field),
                child_count,
            })
        })
        .collect::<std::result::Result<Vec<_>, BlobError>>()?;

    Ok(DedupedForest {
        table: DedupTable::from_entries(entries),
        indices: ChildIndexList::from_vec(indices),
    })
}

pub fn deserialize_bytes(bytes: &[u8], registry: &CompressionRegistry) -> Result<DedupedForest> {
    if bytes.len() % 4 != 0 {
        return Err(BlobError::Malformed(format!(
            "length {} is not word aligned",
            bytes.len()
        ))
        .into());
    }
    let words: Vec<u32> = bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    deserialize(&words, registry)
}

/// Word count of each section, in wire order.
pub fn section_sizes(words: &[u32]) -> Option<[u32; SECTION_COUNT]> {
    words.get(..SECTION_COUNT)?.try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::{rebuild, reduce};
    use crate::error::CloneScopeError;
    use crate::model::{StructuralTree, TraversalMode};

    fn sample_forest() -> (Vec<StructuralTree>, DedupedForest) {
        let mut trees = Vec::new();
        for file in 0..3u16 {
            let mut tree = StructuralTree::new(StructuralKey::new(100, 0), 1, TraversalMode::Shallow);
            let root = tree.root();
            for stmt in 0..40u16 {
                let s = tree.add_child(root, StructuralKey::new(200 + stmt % 5, 3), 1, None);
                tree.add_child(s, StructuralKey::new(300 + file, 7), 1, None);
                tree.add_child(s, StructuralKey::new(301, 8), 1, None);
            }
            trees.push(tree);
        }
        let forest = reduce(&trees);
        (trees, forest)
    }

    #[test]
    fn test_serialize_roundtrip() {
        let registry = CompressionRegistry::default();
        let (trees, forest) = sample_forest();

        let words = serialize(&forest, &registry);
        let restored = deserialize(&words, &registry).unwrap();
        assert_eq!(restored, forest);

        let rebuilt = rebuild(&restored).unwrap();
        for (original, copy) in trees.iter().zip(&rebuilt) {
            assert!(original.structurally_eq(copy));
        }
    }

    #[test]
    fn test_byte_form_and_section_sizes() {
        let registry = CompressionRegistry::default();
        let (_, forest) = sample_forest();

        let bytes = serialize_bytes(&forest, &registry);
        assert_eq!(deserialize_bytes(&bytes, &registry).unwrap(), forest);

        let words = serialize(&forest, &registry);
        let sizes = section_sizes(&words).unwrap();
        let total: u32 = sizes.iter().sum();
        assert_eq!(total as usize + 4, words.len());
    }

    #[test]
    fn test_sections_use_their_own_codecs() {
        let registry = CompressionRegistry::default();
        let (_, forest) = sample_forest();
        let words = serialize(&forest, &registry);
        let sizes = section_sizes(&words).unwrap();

        let mut offset = 4;
        for (i, size) in sizes.iter().enumerate() {
            let blob = CompressedBlob::from_words(&words[offset..offset + *size as usize]).unwrap();
            let expected = if i == 0 {
                [CompressorId::Lzma]
            } else {
                [CompressorId::Bsc]
            };
            assert!(blob.header.is_terminal() || expected.contains(&blob.header.algorithm));
            offset += *size as usize;
        }
    }

    #[test]
    fn test_rejects_bad_containers() {
        let registry = CompressionRegistry::default();
        let (_, forest) = sample_forest();
        let mut words = serialize(&forest, &registry);

        assert!(matches!(
            deserialize(&words[..2], &registry),
            Err(CloneScopeError::Blob(BlobError::Truncated { .. }))
        ));

        words.push(0);
        assert!(matches!(
            deserialize(&words, &registry),
            Err(CloneScopeError::Blob(BlobError::Malformed(_)))
        ));

        assert!(deserialize_bytes(&[1, 2, 3], &registry).is_err());
    }
}
