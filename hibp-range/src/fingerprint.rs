//! Password fingerprints in the corpus hashing scheme.
//!
//! The range API indexes unsalted SHA-1 digests rendered as uppercase hex, so
//! that is exactly what [`fingerprint`] produces. The first [`PREFIX_LEN`]
//! characters are the part that may be disclosed; the rest stays local.

use std::fmt;

use sha1::{Digest, Sha1};

use crate::error::InvalidFingerprintError;
use crate::{FINGERPRINT_LEN, HEX_CHARS, PREFIX_LEN, SUFFIX_LEN};

/// A 40 character uppercase hex SHA-1 digest of a password.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

/// The first 5 characters of a [`Fingerprint`], shared by many passwords.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoutingPrefix([u8; PREFIX_LEN]);

/// The last 35 characters of a [`Fingerprint`].
///
/// `Debug` is redacted so the suffix cannot end up in logs by accident.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct VerificationSuffix([u8; SUFFIX_LEN]);

/// Hashes a password into its fingerprint.
///
/// Every string has one, including the empty string.
pub fn fingerprint(password: &str) -> Fingerprint {
    let hash: [u8; 20] = Sha1::digest(password.as_bytes()).into();

    let mut hex = [0u8; FINGERPRINT_LEN];
    for (i, byte) in hash.iter().enumerate() {
        hex[i * 2] = HEX_CHARS[(byte >> 4) as usize];
        hex[i * 2 + 1] = HEX_CHARS[(byte & 0x0f) as usize];
    }

    Fingerprint(hex)
}

/// Splits a textual fingerprint into its routing prefix and verification suffix.
///
/// Lowercase hex is accepted and canonicalized to uppercase.
pub fn split(fp: &str) -> Result<(RoutingPrefix, VerificationSuffix), InvalidFingerprintError> {
    Ok(Fingerprint::from_hex(fp)?.split())
}

impl Fingerprint {
    /// Parses 40 hex characters of either case.
    pub fn from_hex(text: &str) -> Result<Self, InvalidFingerprintError> {
        canonical_hex(text).map(Self)
    }

    pub fn as_str(&self) -> &str {
        ascii_str(&self.0)
    }

    pub fn prefix(&self) -> RoutingPrefix {
        let mut prefix = [0u8; PREFIX_LEN];
        prefix.copy_from_slice(&self.0[..PREFIX_LEN]);
        RoutingPrefix(prefix)
    }

    pub fn suffix(&self) -> VerificationSuffix {
        let mut suffix = [0u8; SUFFIX_LEN];
        suffix.copy_from_slice(&self.0[PREFIX_LEN..]);
        VerificationSuffix(suffix)
    }

    pub fn split(&self) -> (RoutingPrefix, VerificationSuffix) {
        (self.prefix(), self.suffix())
    }
}

impl RoutingPrefix {
    /// Parses 5 hex characters of either case, as received on a relay path.
    pub fn from_hex(text: &str) -> Result<Self, InvalidFingerprintError> {
        canonical_hex(text).map(Self)
    }

    pub fn as_str(&self) -> &str {
        ascii_str(&self.0)
    }
}

impl VerificationSuffix {
    /// Parses 35 hex characters of either case.
    pub fn from_hex(text: &str) -> Result<Self, InvalidFingerprintError> {
        canonical_hex(text).map(Self)
    }

    pub fn as_str(&self) -> &str {
        ascii_str(&self.0)
    }

    /// Compares against a candidate suffix from a range response, ignoring case.
    #[inline]
    pub fn matches(&self, candidate: &str) -> bool {
        candidate.as_bytes().eq_ignore_ascii_case(&self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({}…)", self.prefix())
    }
}

impl fmt::Display for RoutingPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for RoutingPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RoutingPrefix({})", self.as_str())
    }
}

impl fmt::Debug for VerificationSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VerificationSuffix(<redacted>)")
    }
}

/// Validates `text` as exactly `N` hex characters and uppercases it.
fn canonical_hex<const N: usize>(text: &str) -> Result<[u8; N], InvalidFingerprintError> {
    let bytes = text.as_bytes();
    if bytes.len() != N {
        return Err(InvalidFingerprintError::Length { expected: N, actual: bytes.len() });
    }

    let mut out = [0u8; N];
    for (offset, (&b, slot)) in bytes.iter().zip(out.iter_mut()).enumerate() {
        if !b.is_ascii_hexdigit() {
            // Everything before `offset` was ASCII, so it sits on a char boundary.
            let found = text[offset..].chars().next().unwrap_or(char::REPLACEMENT_CHARACTER);
            return Err(InvalidFingerprintError::NonHex { offset, found });
        }
        *slot = b.to_ascii_uppercase();
    }

    Ok(out)
}

#[inline(always)]
fn ascii_str(bytes: &[u8]) -> &str {
    // SAFETY: every constructor fills the buffer from HEX_CHARS or from bytes
    // that passed `is_ascii_hexdigit`, so it is always ASCII.
    unsafe { std::str::from_utf8_unchecked(bytes) }
}
