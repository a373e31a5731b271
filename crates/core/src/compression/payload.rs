/// A word buffer with an exact byte length.
///
/// Bytes are packed little-endian into `u32` words; the last word is
/// zero-padded when the byte length is not a multiple of four.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    words: Vec<u32>,
    byte_len: usize,
}

impl Payload {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let words = bytes
            .chunks(4)
            .map(|chunk| {
                let mut word = [0u8; 4];
                word[..chunk.len()].copy_from_slice(chunk);
                u32::from_le_bytes(word)
            })
            .collect();
        Self {
            words,
            byte_len: bytes.len(),
        }
    }

    pub fn from_words(words: Vec<u32>) -> Self {
        let byte_len = words.len() * 4;
        Self { words, byte_len }
    }

    /// Rebuilds a payload from stored words, trimming to `byte_len`.
    pub(crate) fn from_stored(mut words: Vec<u32>, byte_len: usize) -> Self {
        words.truncate(byte_len.div_ceil(4));
        Self { words, byte_len }
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    pub fn into_words(self) -> Vec<u32> {
        self.words
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    pub fn is_empty(&self) -> bool {
        self.byte_len == 0
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes: Vec<u8> = self.words.iter().flat_map(|w| w.to_le_bytes()).collect();
        bytes.truncate(self.byte_len);
        bytes
    }
}
