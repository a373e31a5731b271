//! Reversible multi-codec compression with provenance headers.
//!
//! A [`CompressionRegistry`] holds the available [`Modifier`]s and
//! [`Compressor`]s and greedily chains whichever pairs shrink a payload.
//! Every adopted step wraps the previous blob, header included, so the
//! chain can be unwound from the outermost header inward.

mod blob;
mod codec;
mod modifier;
mod payload;
mod pipeline;

pub use blob::{BlobHeader, CompressedBlob, HEADER_BYTES, HEADER_WORDS};
pub use codec::{BscCompressor, Compressor, LzmaCompressor, ZstdCompressor};
pub use modifier::{DeltaModifier, Modifier, NoneModifier};
pub use payload::Payload;
pub use pipeline::{CompressOptions, CompressionRegistry, CompressionReport, CompressionStep};

use std::fmt;
use thiserror::Error;

/// Compressor ids as written into blob headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum CompressorId {
    None = 0,
    VsEncoding = 2,
    SimdOptPFor = 3,
    Lzma = 4,
    Zstd = 5,
    Bsc = 6,
    Lz4 = 7,
}

impl CompressorId {
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for CompressorId {
    type Error = CompressionError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => CompressorId::None,
            2 => CompressorId::VsEncoding,
            3 => CompressorId::SimdOptPFor,
            4 => CompressorId::Lzma,
            5 => CompressorId::Zstd,
            6 => CompressorId::Bsc,
            7 => CompressorId::Lz4,
            id => {
                return Err(CompressionError::UnknownId {
                    kind: "compressor",
                    id,
                });
            }
        })
    }
}

impl fmt::Display for CompressorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompressorId::None => "none",
            CompressorId::VsEncoding => "vsencoding",
            CompressorId::SimdOptPFor => "simdoptpfor",
            CompressorId::Lzma => "lzma",
            CompressorId::Zstd => "zstd",
            CompressorId::Bsc => "bsc",
            CompressorId::Lz4 => "lz4",
        };
        f.write_str(name)
    }
}

/// Modifier ids as written into blob headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum ModifierId {
    None = 0,
    Delta = 1,
}

impl ModifierId {
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for ModifierId {
    type Error = CompressionError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ModifierId::None),
            1 => Ok(ModifierId::Delta),
            id => Err(CompressionError::UnknownId {
                kind: "modifier",
                id,
            }),
        }
    }
}

impl fmt::Display for ModifierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModifierId::None => f.write_str("none"),
            ModifierId::Delta => f.write_str("delta"),
        }
    }
}

#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("{codec} codec failed: {message}")]
    Codec {
        codec: CompressorId,
        message: String,
    },
    #[error("unknown {kind} id {id}")]
    UnknownId { kind: &'static str, id: u32 },
    #[error("no codec registered for modifier {modifier} / compressor {compressor}")]
    UnregisteredCodec {
        modifier: ModifierId,
        compressor: CompressorId,
    },
    #[error("blob truncated: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },
    #[error("decompressed size {found} does not match recorded size {expected}")]
    SizeMismatch { expected: usize, found: usize },
    /// The chain could not be unwound past `step`; `blob` is where it stopped.
    #[error("decompression stalled after {step} step(s): {source}")]
    Stalled {
        blob: Box<CompressedBlob>,
        step: usize,
        #[source]
        source: Box<CompressionError>,
    },
}

impl CompressionError {
    pub(crate) fn codec(codec: CompressorId, err: impl fmt::Display) -> Self {
        CompressionError::Codec {
            codec,
            message: err.to_string(),
        }
    }
}
