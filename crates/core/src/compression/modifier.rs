use super::ModifierId;

/// A reversible byte transform applied before compression.
pub trait Modifier: Send + Sync {
    fn id(&self) -> ModifierId;

    fn modify(&self, data: &[u8]) -> Vec<u8>;

    fn unmodify(&self, data: &[u8]) -> Vec<u8>;
}

#[derive(Debug, Default)]
pub struct NoneModifier;

impl Modifier for NoneModifier {
    fn id(&self) -> ModifierId {
        ModifierId::None
    }

    fn modify(&self, data: &[u8]) -> Vec<u8> {
        data.to_vec()
    }

    fn unmodify(&self, data: &[u8]) -> Vec<u8> {
        data.to_vec()
    }
}

/// Byte-wise delta coding with wrapping arithmetic.
#[derive(Debug, Default)]
pub struct DeltaModifier;

impl Modifier for DeltaModifier {
    fn id(&self) -> ModifierId {
        ModifierId::Delta
    }

    fn modify(&self, data: &[u8]) -> Vec<u8> {
        let mut prev = 0u8;
        data.iter()
            .map(|&byte| {
                let delta = byte.wrapping_sub(prev);
                prev = byte;
                delta
            })
            .collect()
    }

    fn unmodify(&self, data: &[u8]) -> Vec<u8> {
        let mut acc = 0u8;
        data.iter()
            .map(|&delta| {
                acc = acc.wrapping_add(delta);
                acc
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_encodes_differences() {
        let delta = DeltaModifier;
        assert_eq!(delta.modify(&[10, 12, 15, 15, 3]), vec![10, 2, 3, 0, 248]);
        assert_eq!(delta.unmodify(&[10, 2, 3, 0, 248]), vec![10, 12, 15, 15, 3]);
        assert!(delta.modify(&[]).is_empty());
    }

    #[test]
    fn test_delta_flattens_ramps() {
        let ramp: Vec<u8> = (0..=255).collect();
        let modified = DeltaModifier.modify(&ramp);
        assert!(modified[1..].iter().all(|&b| b == 1));
        assert_eq!(DeltaModifier.unmodify(&modified), ramp);
    }
}
