use super::{
    BlobHeader, BscCompressor, CompressedBlob, CompressionError, Compressor, CompressorId,
    DeltaModifier, HEADER_BYTES, LzmaCompressor, Modifier, ModifierId, NoneModifier, Payload,
    ZstdCompressor,
};
use indexmap::IndexMap;

/// Which pairs a compression run may try and whether to force one step.
#[derive(Debug, Clone, Default)]
pub struct CompressOptions {
    modifiers: Option<Vec<ModifierId>>,
    compressors: Option<Vec<CompressorId>>,
    force: bool,
    label: Option<String>,
}

impl CompressOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the modifiers tried; registry order is kept.
    pub fn modifiers(mut self, ids: impl IntoIterator<Item = ModifierId>) -> Self {
        self.modifiers = Some(ids.into_iter().collect());
        self
    }

    /// Restricts the compressors tried; registry order is kept.
    pub fn compressors(mut self, ids: impl IntoIterator<Item = CompressorId>) -> Self {
        self.compressors = Some(ids.into_iter().collect());
        self
    }

    /// Adopt the best first-pass candidate even when it does not shrink.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    fn allows_modifier(&self, id: ModifierId) -> bool {
        self.modifiers.as_ref().is_none_or(|ids| ids.contains(&id))
    }

    fn allows_compressor(&self, id: CompressorId) -> bool {
        self.compressors.as_ref().is_none_or(|ids| ids.contains(&id))
    }
}

/// One adopted pass of a compression run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionStep {
    pub modifier: ModifierId,
    pub compressor: CompressorId,
    pub input_size: usize,
    pub output_size: usize,
    /// Pairs that produced exactly the same size but lost on registry order.
    pub alternatives: Vec<(ModifierId, CompressorId)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompressionReport {
    pub label: Option<String>,
    pub steps: Vec<CompressionStep>,
}

struct Candidate {
    modifier: ModifierId,
    compressor: CompressorId,
    output: Vec<u8>,
    size: usize,
}

pub struct CompressionRegistry {
    modifiers: IndexMap<ModifierId, Box<dyn Modifier>>,
    compressors: IndexMap<CompressorId, Box<dyn Compressor>>,
}

impl Default for CompressionRegistry {
    /// Identity and delta modifiers, LZMA and BWT compressors.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register_modifier(Box::new(NoneModifier));
        registry.register_modifier(Box::new(DeltaModifier));
        registry.register_compressor(Box::new(LzmaCompressor::default()));
        registry.register_compressor(Box::new(BscCompressor));
        registry
    }
}

impl CompressionRegistry {
    pub fn empty() -> Self {
        Self {
            modifiers: IndexMap::new(),
            compressors: IndexMap::new(),
        }
    }

    /// Default registry plus the codecs that are disabled out of the box.
    pub fn with_optional_codecs() -> Self {
        let mut registry = Self::default();
        registry.register_compressor(Box::new(ZstdCompressor::default()));
        registry
    }

    pub fn from_env(env: &crate::config::Environment) -> Self {
        if env.enable_optional_codecs {
            Self::with_optional_codecs()
        } else {
            Self::default()
        }
    }

    /// Registers a modifier, replacing any previous one with the same id.
    pub fn register_modifier(&mut self, modifier: Box<dyn Modifier>) {
        self.modifiers.insert(modifier.id(), modifier);
    }

    /// Registers a compressor, replacing any previous one with the same id.
    pub fn register_compressor(&mut self, compressor: Box<dyn Compressor>) {
        self.compressors.insert(compressor.id(), compressor);
    }

    pub fn modifier_ids(&self) -> impl Iterator<Item = ModifierId> + '_ {
        self.modifiers.keys().copied()
    }

    pub fn compressor_ids(&self) -> impl Iterator<Item = CompressorId> + '_ {
        self.compressors.keys().copied()
    }

    pub fn compress(&self, payload: Payload, options: &CompressOptions) -> CompressedBlob {
        self.compress_with_report(payload, options).0
    }

    /// Greedily chains (modifier, compressor) passes while they shrink the blob.
    ///
    /// Each pass compresses the complete serialized current blob. Ties are
    /// resolved by registry order and reported as alternatives.
    pub fn compress_with_report(
        &self,
        payload: Payload,
        options: &CompressOptions,
    ) -> (CompressedBlob, CompressionReport) {
        let mut current = CompressedBlob::base(payload);
        let mut report = CompressionReport {
            label: options.label.clone(),
            steps: Vec::new(),
        };
        let mut force = options.force;

        loop {
            let input = current.to_bytes();
            let mut best: Option<Candidate> = None;
            let mut alternatives = Vec::new();

            for (&modifier_id, modifier) in &self.modifiers {
                if !options.allows_modifier(modifier_id) {
                    continue;
                }
                let modified = modifier.modify(&input);

                for (&compressor_id, compressor) in &self.compressors {
                    if !options.allows_compressor(compressor_id) {
                        continue;
                    }
                    let output = match compressor.compress(&modified) {
                        Ok(output) => output,
                        Err(e) => {
                            tracing::warn!("Skipping {}/{}: {}", modifier_id, compressor_id, e);
                            continue;
                        }
                    };
                    let size = HEADER_BYTES + output.len().div_ceil(4) * 4;

                    let improves = match &best {
                        Some(b) => size < b.size,
                        None => force || size < input.len(),
                    };
                    if improves {
                        alternatives.clear();
                        best = Some(Candidate {
                            modifier: modifier_id,
                            compressor: compressor_id,
                            output,
                            size,
                        });
                    } else if best.as_ref().is_some_and(|b| b.size == size) {
                        alternatives.push((modifier_id, compressor_id));
                    }
                }
            }

            let Some(chosen) = best else {
                break;
            };
            report.steps.push(CompressionStep {
                modifier: chosen.modifier,
                compressor: chosen.compressor,
                input_size: input.len(),
                output_size: chosen.size,
                alternatives,
            });
            current = CompressedBlob {
                header: BlobHeader {
                    algorithm: chosen.compressor,
                    modifier: chosen.modifier,
                    original_size: input.len() as u32,
                },
                payload: Payload::from_bytes(&chosen.output),
            };
            force = false;
        }

        tracing::debug!(
            label = report.label.as_deref().unwrap_or("-"),
            steps = ?report.steps,
            "Compressed to {} bytes",
            current.serialized_len()
        );
        (current, report)
    }

    /// Unwinds the header chain down to the terminal blob.
    ///
    /// Fails with [`CompressionError::Stalled`] when a step names a codec
    /// that is not registered here or cannot be decoded; the error carries
    /// the blob the chain stopped at.
    pub fn decompress(&self, blob: &CompressedBlob) -> Result<Payload, CompressionError> {
        let mut current = blob.clone();
        let mut step = 0;

        while !current.header.is_terminal() {
            match self.unwrap_step(&current) {
                Ok(inner) => current = inner,
                Err(source) => {
                    return Err(CompressionError::Stalled {
                        blob: Box::new(current),
                        step,
                        source: Box::new(source),
                    });
                }
            }
            step += 1;
        }

        Ok(current.payload)
    }

    fn unwrap_step(&self, blob: &CompressedBlob) -> Result<CompressedBlob, CompressionError> {
        let header = blob.header;
        let (Some(compressor), Some(modifier)) = (
            self.compressors.get(&header.algorithm),
            self.modifiers.get(&header.modifier),
        ) else {
            return Err(CompressionError::UnregisteredCodec {
                modifier: header.modifier,
                compressor: header.algorithm,
            });
        };

        let expected = header.original_size as usize;
        let decoded = compressor.decompress(&blob.payload.to_bytes(), expected)?;
        if decoded.len() != expected {
            return Err(CompressionError::SizeMismatch {
                expected,
                found: decoded.len(),
            });
        }
        CompressedBlob::from_bytes(&modifier.unmodify(&decoded))
    }
}
