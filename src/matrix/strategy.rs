use std::fmt;
use std::str::FromStr;

use crate::error::{validation_error, MatmulError};

/// Multiplication algorithm selected by [`SquareMatrix::multiply`](crate::SquareMatrix::multiply).
///
/// | Strategy | Access pattern | Mechanism |
/// |---|---|---|
/// | `Naive` | row × column | triple loop, the correctness oracle |
/// | `Transposed` | row × row | reads the right operand's transposed copy |
/// | `TransposedVectorized` | row × row | lane-wide dot products + horizontal sum |
/// | `Tiled` | blocked | packed 32×32 tiles, scalar microkernel |
/// | `TiledVectorized` | blocked | packed tiles, 4 output rows held in vectors |
/// | `TiledPrefetch` | blocked | as above, packing issues prefetch hints (x86 and aarch64 only) |
/// | `TiledRegisterBlocked` | blocked | 48×48 tiles, 6 × 2-vector register tile |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
    Naive,
    Transposed,
    TransposedVectorized,
    Tiled,
    TiledVectorized,
    TiledPrefetch,
    #[default]
    TiledRegisterBlocked,
}

impl Strategy {
    pub const ALL: [Strategy; 7] = [
        Strategy::Naive,
        Strategy::Transposed,
        Strategy::TransposedVectorized,
        Strategy::Tiled,
        Strategy::TiledVectorized,
        Strategy::TiledPrefetch,
        Strategy::TiledRegisterBlocked,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Strategy::Naive => "NAIVE",
            Strategy::Transposed => "TRANSPOSED",
            Strategy::TransposedVectorized => "TRANSPOSED_VECTORIZED",
            Strategy::Tiled => "TILED",
            Strategy::TiledVectorized => "TILED_VECTORIZED",
            Strategy::TiledPrefetch => "TILED_PREFETCH",
            Strategy::TiledRegisterBlocked => "TILED_REGISTER_BLOCKED",
        }
    }

    /// Whether the strategy reads the right operand's transposed copy
    /// instead of its primary buffer.
    pub const fn reads_transposed(self) -> bool {
        matches!(
            self,
            Strategy::Transposed | Strategy::TransposedVectorized | Strategy::Tiled
        )
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = MatmulError;

    /// Accepts the display name in any case, with `-` or `_` separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.name() == normalized)
            .ok_or_else(|| validation_error(format!("unknown strategy '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_register_blocked() {
        assert_eq!(Strategy::default(), Strategy::TiledRegisterBlocked);
    }

    #[test]
    fn test_parse_roundtrip() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.name().parse::<Strategy>().unwrap(), strategy);
        }
        assert_eq!(
            "tiled-prefetch".parse::<Strategy>().unwrap(),
            Strategy::TiledPrefetch
        );
        assert!("blocked".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_transposed_readers() {
        let readers: Vec<_> = Strategy::ALL
            .into_iter()
            .filter(|s| s.reads_transposed())
            .collect();
        assert_eq!(
            readers,
            [Strategy::Transposed, Strategy::TransposedVectorized, Strategy::Tiled]
        );
    }
}
