use serde::{Deserialize, Serialize};
use std::fmt;

/// Grammar role of a parsed node, independent of its text.
///
/// Packs the grammar symbol kind into the upper 16 bits and the field kind
/// into the lower 16 bits.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StructuralKey(u32);

impl StructuralKey {
    pub const fn new(symbol: u16, field: u16) -> Self {
        Self(((symbol as u32) << 16) | field as u32)
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn symbol(self) -> u16 {
        (self.0 >> 16) as u16
    }

    pub const fn field(self) -> u16 {
        self.0 as u16
    }
}

impl fmt::Display for StructuralKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.symbol(), self.field())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_packing() {
        let key = StructuralKey::new(0x1234, 0x0056);
        assert_eq!(key.raw(), 0x1234_0056);
        assert_eq!(key.symbol(), 0x1234);
        assert_eq!(key.field(), 0x0056);
        assert_eq!(StructuralKey::from_raw(key.raw()), key);
        assert_eq!(key.to_string(), "4660:86");
    }
}
