//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and as the
//! components of a canonical link key.  The derived `Ord` is the total order
//! the channel model uses to decide which endpoint of a link departs.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// Widen to `u64` for seed hashing.
            #[inline(always)]
            pub fn as_u64(self) -> u64 {
                self.0 as u64
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// A simulated radio node.
    pub struct NodeId(u32);
}

typed_id! {
    /// An antenna sector (interface) on a node.
    pub struct SectorId(u32);
}

typed_id! {
    /// An RF channel number as configured by the simulation.
    pub struct ChannelNumber(u32);
}

impl SectorId {
    /// The sector used when callers do not name one.
    pub const PRIMARY: SectorId = SectorId(0);
}

impl Default for SectorId {
    fn default() -> Self {
        Self::PRIMARY
    }
}
