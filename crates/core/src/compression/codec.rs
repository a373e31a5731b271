use super::{CompressionError, CompressorId};
use std::io::{Read, Write};
use xz2::stream::{LzmaOptions, Stream};

/// An entropy or dictionary codec.
pub trait Compressor: Send + Sync {
    fn id(&self) -> CompressorId;

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError>;

    /// `original_size` is the exact length the output must have. Decoders
    /// stop one byte past it so a lying header cannot inflate without bound.
    fn decompress(&self, data: &[u8], original_size: usize) -> Result<Vec<u8>, CompressionError>;
}

/// LZMA-alone streams through liblzma.
#[derive(Debug)]
pub struct LzmaCompressor {
    preset: u32,
}

impl Default for LzmaCompressor {
    fn default() -> Self {
        Self { preset: 6 }
    }
}

impl LzmaCompressor {
    pub fn with_preset(preset: u32) -> Self {
        Self { preset }
    }
}

impl Compressor for LzmaCompressor {
    fn id(&self) -> CompressorId {
        CompressorId::Lzma
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        let options = LzmaOptions::new_preset(self.preset).map_err(lzma_error)?;
        let stream = Stream::new_lzma_encoder(&options).map_err(lzma_error)?;
        let mut encoder = xz2::write::XzEncoder::new_stream(Vec::new(), stream);
        encoder.write_all(data).map_err(lzma_error)?;
        encoder.finish().map_err(lzma_error)
    }

    fn decompress(&self, data: &[u8], original_size: usize) -> Result<Vec<u8>, CompressionError> {
        let stream = Stream::new_lzma_decoder(u64::MAX).map_err(lzma_error)?;
        let mut decoder =
            xz2::read::XzDecoder::new_stream(data, stream).take(read_limit(original_size));
        let mut out = Vec::with_capacity(original_size);
        decoder.read_to_end(&mut out).map_err(lzma_error)?;
        Ok(out)
    }
}

fn read_limit(original_size: usize) -> u64 {
    original_size as u64 + 1
}

fn lzma_error(err: impl std::fmt::Display) -> CompressionError {
    CompressionError::codec(CompressorId::Lzma, err)
}

/// Burrows-Wheeler block sorting, realised with bzip2.
#[derive(Debug, Default)]
pub struct BscCompressor;

impl Compressor for BscCompressor {
    fn id(&self) -> CompressorId {
        CompressorId::Bsc
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        let err = |e: std::io::Error| CompressionError::codec(CompressorId::Bsc, e);
        let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::best());
        encoder.write_all(data).map_err(err)?;
        encoder.finish().map_err(err)
    }

    fn decompress(&self, data: &[u8], original_size: usize) -> Result<Vec<u8>, CompressionError> {
        let mut out = Vec::with_capacity(original_size);
        bzip2::read::BzDecoder::new(data)
            .take(read_limit(original_size))
            .read_to_end(&mut out)
            .map_err(|e| CompressionError::codec(CompressorId::Bsc, e))?;
        Ok(out)
    }
}

/// Optional codec; not registered unless explicitly enabled.
#[derive(Debug)]
pub struct ZstdCompressor {
    level: i32,
}

impl Default for ZstdCompressor {
    fn default() -> Self {
        Self { level: 19 }
    }
}

impl Compressor for ZstdCompressor {
    fn id(&self) -> CompressorId {
        CompressorId::Zstd
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        zstd::encode_all(data, self.level).map_err(|e| CompressionError::codec(CompressorId::Zstd, e))
    }

    fn decompress(&self, data: &[u8], original_size: usize) -> Result<Vec<u8>, CompressionError> {
        let err = |e: std::io::Error| CompressionError::codec(CompressorId::Zstd, e);
        let mut out = Vec::with_capacity(original_size);
        zstd::stream::read::Decoder::new(data)
            .map_err(err)?
            .take(read_limit(original_size))
            .read_to_end(&mut out)
            .map_err(err)?;
        Ok(out)
    }
}
