use super::{CompressionError, CompressorId, ModifierId, Payload};

/// Header words: algorithm, modifier, original size, payload size.
pub const HEADER_WORDS: usize = 4;
pub const HEADER_BYTES: usize = HEADER_WORDS * 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobHeader {
    pub algorithm: CompressorId,
    pub modifier: ModifierId,
    /// Size in bytes of what this step wrapped.
    pub original_size: u32,
}

impl BlobHeader {
    pub const TERMINAL: BlobHeader = BlobHeader {
        algorithm: CompressorId::None,
        modifier: ModifierId::None,
        original_size: 0,
    };

    pub fn is_terminal(&self) -> bool {
        self.algorithm == CompressorId::None
    }
}

/// A payload plus the header describing the step that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedBlob {
    pub header: BlobHeader,
    pub payload: Payload,
}

impl CompressedBlob {
    /// Wraps a payload in a terminal header.
    pub fn base(payload: Payload) -> Self {
        Self {
            header: BlobHeader {
                original_size: payload.byte_len() as u32,
                ..BlobHeader::TERMINAL
            },
            payload,
        }
    }

    /// Size of [`Self::to_words`] in bytes.
    pub fn serialized_len(&self) -> usize {
        HEADER_BYTES + self.payload.words().len() * 4
    }

    pub fn to_words(&self) -> Vec<u32> {
        let mut words = Vec::with_capacity(HEADER_WORDS + self.payload.words().len());
        words.push(self.header.algorithm.as_u32());
        words.push(self.header.modifier.as_u32());
        words.push(self.header.original_size);
        words.push(self.payload.byte_len() as u32);
        words.extend_from_slice(self.payload.words());
        words
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_words().iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    pub fn from_words(words: &[u32]) -> Result<Self, CompressionError> {
        if words.len() < HEADER_WORDS {
            return Err(CompressionError::Truncated {
                expected: HEADER_BYTES,
                found: words.len() * 4,
            });
        }
        let header = BlobHeader {
            algorithm: CompressorId::try_from(words[0])?,
            modifier: ModifierId::try_from(words[1])?,
            original_size: words[2],
        };
        let byte_len = words[3] as usize;
        let body = &words[HEADER_WORDS..];
        if body.len() * 4 < byte_len {
            return Err(CompressionError::Truncated {
                expected: HEADER_BYTES + byte_len,
                found: words.len() * 4,
            });
        }
        Ok(Self {
            header,
            payload: Payload::from_stored(body.to_vec(), byte_len),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CompressionError> {
        let whole = bytes.len() / 4 * 4;
        let words: Vec<u32> = bytes[..whole]
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        Self::from_words(&words)
    }
}
