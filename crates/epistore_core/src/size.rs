//! Memory size specifications.

use crate::error::{CoreError, CoreResult};
use std::str::FromStr;

/// Binary unit suffixes, longest first so `KB` wins over `B`.
const UNITS: [(&str, u64); 5] = [
    ("TB", 1 << 40),
    ("GB", 1 << 30),
    ("MB", 1 << 20),
    ("KB", 1 << 10),
    ("B", 1),
];

/// A memory size: an explicit byte count, or "let the engine decide".
///
/// Parsed once at configuration time; the rest of the engine only ever
/// sees concrete byte counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeSpec {
    /// No explicit size. What this means is up to the consumer: as a flush
    /// threshold it disables automatic flushing; as a chunk budget it
    /// delegates chunk sizing to the store.
    Auto,
    /// An exact byte count.
    Bytes(u64),
}

impl SizeSpec {
    /// Parses a size like `"512B"`, `"4KB"` or `"2GB"`.
    ///
    /// Suffixes are binary multiples of 1024 (`B`, `KB`, `MB`, `GB`, `TB`)
    /// and the magnitude must be a non-negative integer. `Auto` is never
    /// produced by parsing; it is chosen structurally.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSizeSpec`] for unknown suffixes,
    /// non-integer magnitudes, or values that overflow a `u64`.
    pub fn parse(spec: &str) -> CoreResult<Self> {
        for (suffix, multiplier) in UNITS {
            if let Some(magnitude) = spec.strip_suffix(suffix) {
                let n: u64 = magnitude
                    .parse()
                    .map_err(|_| CoreError::invalid_size_spec(spec))?;
                let bytes = n
                    .checked_mul(multiplier)
                    .ok_or_else(|| CoreError::invalid_size_spec(spec))?;
                return Ok(Self::Bytes(bytes));
            }
        }
        Err(CoreError::invalid_size_spec(spec))
    }

    /// Returns the byte count, or `None` for [`SizeSpec::Auto`].
    #[must_use]
    pub const fn as_bytes(self) -> Option<u64> {
        match self {
            Self::Auto => None,
            Self::Bytes(n) => Some(n),
        }
    }

    /// Returns whether this is [`SizeSpec::Auto`].
    #[must_use]
    pub const fn is_auto(self) -> bool {
        matches!(self, Self::Auto)
    }
}

impl From<u64> for SizeSpec {
    fn from(bytes: u64) -> Self {
        Self::Bytes(bytes)
    }
}

impl FromStr for SizeSpec {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_plain_bytes() {
        assert_eq!(SizeSpec::parse("512B").unwrap(), SizeSpec::Bytes(512));
    }

    #[test]
    fn parses_binary_multiples() {
        assert_eq!(SizeSpec::parse("4KB").unwrap(), SizeSpec::Bytes(4096));
        assert_eq!(SizeSpec::parse("1MB").unwrap(), SizeSpec::Bytes(1 << 20));
        assert_eq!(SizeSpec::parse("2GB").unwrap(), SizeSpec::Bytes(2 << 30));
        assert_eq!(SizeSpec::parse("1TB").unwrap(), SizeSpec::Bytes(1 << 40));
    }

    #[test]
    fn rejects_unknown_suffix() {
        assert!(SizeSpec::parse("4XB").is_err());
        assert!(SizeSpec::parse("4kb").is_err());
    }

    #[test]
    fn rejects_missing_magnitude() {
        assert!(SizeSpec::parse("KB").is_err());
        assert!(SizeSpec::parse("B").is_err());
    }

    #[test]
    fn rejects_non_integer_magnitude() {
        assert!(SizeSpec::parse("4.5KB").is_err());
        assert!(SizeSpec::parse("-1B").is_err());
        assert!(SizeSpec::parse("4 KB").is_err());
    }

    #[test]
    fn rejects_bare_numbers() {
        assert!(SizeSpec::parse("1024").is_err());
    }

    #[test]
    fn rejects_overflow() {
        assert!(SizeSpec::parse("99999999999TB").is_err());
    }

    #[test]
    fn from_u64() {
        assert_eq!(SizeSpec::from(64u64), SizeSpec::Bytes(64));
    }

    #[test]
    fn as_bytes_and_is_auto() {
        assert_eq!(SizeSpec::Auto.as_bytes(), None);
        assert_eq!(SizeSpec::Bytes(7).as_bytes(), Some(7));
        assert!(SizeSpec::Auto.is_auto());
        assert!(!SizeSpec::Bytes(7).is_auto());
    }

    proptest! {
        #[test]
        fn parses_every_unit(n in 0u64..1_000_000, unit in 0usize..UNITS.len()) {
            let (suffix, multiplier) = UNITS[unit];
            let parsed = SizeSpec::parse(&format!("{n}{suffix}")).unwrap();
            prop_assert_eq!(parsed, SizeSpec::Bytes(n * multiplier));
        }

        #[test]
        fn roundtrips_via_from_str(n in 0u64..1_000_000) {
            let spec: SizeSpec = format!("{n}KB").parse().unwrap();
            prop_assert_eq!(spec.as_bytes(), Some(n * 1024));
        }
    }
}
