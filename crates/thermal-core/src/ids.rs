use core::fmt;
use core::num::NonZeroU32;

/// Compact, stable identifier used across the network/extraction layers.
///
/// Stored as `index + 1` so `Option<Id>` is pointer-optimized.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(NonZeroU32);

impl Id {
    /// Build an `Id` from a 0-based index.
    pub fn from_index(index: u32) -> Self {
        Self(NonZeroU32::new(index + 1).expect("index + 1 is nonzero"))
    }

    /// Recover the 0-based index.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }

    /// Recover the 0-based index as `usize`, for direct array indexing.
    pub fn idx(self) -> usize {
        self.index() as usize
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Domain-specific aliases for clarity; all share the same representation.
pub type NodeId = Id;
pub type ElementId = Id;
pub type LayerId = Id;
pub type MaterialId = Id;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_index() {
        for i in [0_u32, 1, 2, 42, 10_000] {
            assert_eq!(Id::from_index(i).index(), i);
        }
    }

    #[test]
    fn option_id_is_small() {
        assert_eq!(
            core::mem::size_of::<Id>(),
            core::mem::size_of::<Option<Id>>()
        );
    }
}
