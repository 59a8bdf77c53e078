use fixedbitset::FixedBitSet;
use std::hash::{Hash, Hasher};

/// A fixed-width bitmap over input positions. Bit `i` set means input
/// position `i` has been consumed by a hypothesis. Position 0 is always the
/// leftmost input word; the n-gram candidate loader is responsible for
/// converting whatever bit order its file format uses into this convention.
#[derive(Debug, Clone)]
pub struct Coverage {
    bits: FixedBitSet,
}

impl Coverage {
    /// An all-zero coverage of the given length.
    pub fn empty(len: usize) -> Self {
        Coverage {
            bits: FixedBitSet::with_capacity(len),
        }
    }

    /// Builds a coverage of length `len` with bits set at `positions`.
    pub fn from_positions(len: usize, positions: impl IntoIterator<Item = usize>) -> Self {
        let mut bits = FixedBitSet::with_capacity(len);
        for p in positions {
            assert!(p < len, "coverage position {p} out of range for length {len}");
            bits.insert(p);
        }
        Coverage { bits }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty_coverage(&self) -> bool {
        self.bits.count_ones(..) == 0
    }

    pub fn test(&self, i: usize) -> bool {
        self.bits.contains(i)
    }

    pub fn popcount(&self) -> usize {
        self.bits.count_ones(..)
    }

    /// Bitwise AND, as a new `Coverage`.
    pub fn and(&self, other: &Coverage) -> Coverage {
        debug_assert_eq!(self.len(), other.len());
        let mut bits = self.bits.clone();
        bits.intersect_with(&other.bits);
        Coverage { bits }
    }

    /// Bitwise OR, as a new `Coverage`.
    pub fn or(&self, other: &Coverage) -> Coverage {
        debug_assert_eq!(self.len(), other.len());
        let mut bits = self.bits.clone();
        bits.union_with(&other.bits);
        Coverage { bits }
    }

    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.ones()
    }
}

impl PartialEq for Coverage {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}
impl Eq for Coverage {}

impl Hash for Coverage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for block in self.bits.as_slice() {
            block.hash(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_or_popcount() {
        let a = Coverage::from_positions(7, [0, 1, 2, 3]);
        let b = Coverage::from_positions(7, [3, 4]);
        assert_eq!(a.and(&b).popcount(), 1);
        assert_eq!(a.or(&b).popcount(), 5);
    }

    #[test]
    fn equality_and_hash_match_bits() {
        let a = Coverage::from_positions(4, [1, 2]);
        let b = Coverage::from_positions(4, [2, 1]);
        assert_eq!(a, b);
        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_bit_positions() {
        let c = Coverage::from_positions(3, [0]);
        assert!(c.test(0));
        assert!(!c.test(1));
        assert!(!c.test(2));
    }
}
