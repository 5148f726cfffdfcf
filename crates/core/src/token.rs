//! Verification token generation.
//!
//! A token is 128 bits of OS randomness rendered in the hyphenated UUID v4
//! text shape the portal has always printed on report cards. It is pure
//! randomness, never derived from record content, so two textually identical
//! submissions still receive distinct tokens.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// An opaque public verification token.
///
/// Assigned once at record creation, immutable thereafter, never reused.
/// Uniqueness rests on the entropy of the token space, not on a store-side
/// check-then-insert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationToken(String);

impl VerificationToken {
    /// Generate a fresh token from the OS RNG.
    ///
    /// Panics if the OS randomness source is unavailable; that failure is
    /// fatal and non-retryable.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        OsRng.fill_bytes(&mut bytes);
        // Stamp the version and variant bits so the text form is a
        // well-formed UUID v4, matching the identifiers already in the field.
        bytes[6] = (bytes[6] & 0x0f) | 0x40;
        bytes[8] = (bytes[8] & 0x3f) | 0x80;

        let mut out = String::with_capacity(36);
        for (i, byte) in bytes.iter().enumerate() {
            if matches!(i, 4 | 6 | 8 | 10) {
                out.push('-');
            }
            out.push(HEX[(byte >> 4) as usize] as char);
            out.push(HEX[(byte & 0x0f) as usize] as char);
        }
        VerificationToken(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

const HEX: &[u8; 16] = b"0123456789abcdef";

impl fmt::Display for VerificationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_token_shape() {
        let token = VerificationToken::generate();
        let s = token.as_str();
        assert_eq!(s.len(), 36);
        let parts: Vec<&str> = s.split('-').collect();
        assert_eq!(
            parts.iter().map(|p| p.len()).collect::<Vec<_>>(),
            vec![8, 4, 4, 4, 12]
        );
        assert!(s
            .chars()
            .all(|c| c == '-' || c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        // Version nibble and variant bits.
        assert_eq!(&s[14..15], "4");
        assert!(matches!(&s[19..20], "8" | "9" | "a" | "b"));
    }

    #[test]
    fn test_token_statistical_uniqueness() {
        // 10^5 draws from a 122-bit space: any duplicate means the generator
        // is broken, not unlucky.
        let mut seen = HashSet::with_capacity(100_000);
        for _ in 0..100_000 {
            assert!(seen.insert(VerificationToken::generate().into_string()));
        }
    }

    #[test]
    fn test_token_serde_transparent() {
        let token = VerificationToken::generate();
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, format!("\"{}\"", token.as_str()));
        let back: VerificationToken = serde_json::from_str(&json).unwrap();
        assert_eq!(back, token);
    }
}
