//! Amino acid sequence normalization.
//!
//! Sequences are uppercased and selenocysteine (`U`) is read as cysteine (`C`).
//! Symbols outside the 20 canonical codes are reported but kept in place; the
//! frequency tabulation only counts canonical codes, so they drop out there.
use phf::phf_set;
use tracing::warn;

use crate::types::SENTINEL;

/// The 20 canonical amino acids, hydrophobic to hydrophilic.
///
/// This is also the fallback glyph order for codes no color scheme mentions.
pub const CANONICAL_ORDER: [char; 20] = [
    'W', 'F', 'Y', 'V', 'L', 'I', 'M', 'A', 'P', 'C', 'G', 'S', 'T', 'N', 'Q', 'D', 'E', 'R', 'K',
    'H',
];

static CANONICAL_CODES: phf::Set<char> = phf_set! {
    'W', 'F', 'Y', 'V', 'L', 'I', 'M', 'A', 'P', 'C',
    'G', 'S', 'T', 'N', 'Q', 'D', 'E', 'R', 'K', 'H',
};

const SELENOCYSTEINE: char = 'U';
const CYSTEINE: char = 'C';

/// Returns true for one of the 20 canonical amino acid codes (uppercase only).
pub fn is_canonical(code: char) -> bool {
    CANONICAL_CODES.contains(&code)
}

/// Normalizes a raw amino acid string.
///
/// # Arguments
/// * `raw` - Sequence as read from the input table
///
/// # Returns
/// * `String` - Uppercased sequence with `U` replaced by `C`. Unknown symbols are
///   logged as warnings and passed through unchanged. The padding sentinel `-`
///   is passed through silently.
pub fn validate(raw: &str) -> String {
    let normalized: String = raw
        .chars()
        .map(|c| c.to_ascii_uppercase())
        .map(|c| if c == SELENOCYSTEINE { CYSTEINE } else { c })
        .collect();

    for (position, symbol) in normalized.chars().enumerate() {
        if symbol != SENTINEL && !is_canonical(symbol) {
            warn!(
                "'{}' at position {} is not a canonical amino acid code, it will not be counted",
                symbol, position
            );
        }
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_uppercases_and_maps_selenocysteine() {
        assert_eq!(validate("acdu"), "ACDC");
        assert_eq!(validate("MKTAYIAK"), "MKTAYIAK");
    }

    #[test]
    fn test_validate_keeps_unknown_symbols() {
        assert_eq!(validate("ab*x"), "AB*X");
        assert_eq!(validate("--ak"), "--AK");
        assert_eq!(validate(""), "");
    }

    #[test]
    fn test_canonical_set_matches_order() {
        assert_eq!(CANONICAL_CODES.len(), CANONICAL_ORDER.len());
        assert!(CANONICAL_ORDER.iter().all(|c| is_canonical(*c)));
        assert!(!is_canonical('B'));
        assert!(!is_canonical('a'));
        assert!(!is_canonical(SENTINEL));
    }
}
