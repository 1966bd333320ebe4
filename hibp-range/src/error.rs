/// A fingerprint or prefix that is not the expected number of hex characters.
///
/// [`crate::fingerprint()`] never produces one of these. Seeing it from a
/// fingerprint the engine built indicates a bug.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidFingerprintError {
    #[error("expected {expected} hex characters, got {actual} bytes")]
    Length { expected: usize, actual: usize },

    #[error("non-hex character {found:?} at offset {offset}")]
    NonHex { offset: usize, found: char },
}

/// The range query could not be completed.
///
/// Callers should report this as "could not check", never as "not breached".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("range query returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("range query failed: {message}")]
    Unreachable { message: String },
}

impl TransportError {
    /// The HTTP status the collaborator answered with, if it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Unreachable { .. } => None,
        }
    }
}

/// A line of a range response that is not `SUFFIX:COUNT`.
///
/// Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedEntryError {
    #[error("line {line}: missing ':' separator")]
    MissingSeparator { line: usize },

    #[error("line {line}: occurrence count {count:?} is not a non-negative integer")]
    InvalidCount { line: usize, count: String },
}

/// More than one range entry matched the verification suffix.
///
/// Non-fatal: the first match is reported and this rides along with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{matches} range entries matched the verification suffix")]
pub struct AmbiguousMatch {
    pub matches: usize,
}

/// Why a breach check produced no result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckError {
    #[error("invalid fingerprint: {0}")]
    InvalidFingerprint(#[from] InvalidFingerprintError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("malformed range response: {0}")]
    MalformedEntry(#[from] MalformedEntryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_status() {
        let err = TransportError::Status { status: 503, message: "Service Unavailable".into() };
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.to_string(), "range query returned HTTP 503: Service Unavailable");

        let err = TransportError::Unreachable { message: "connection refused".into() };
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_check_error_keeps_kind() {
        let err: CheckError = MalformedEntryError::MissingSeparator { line: 3 }.into();
        assert!(matches!(err, CheckError::MalformedEntry(_)));
        assert_eq!(err.to_string(), "malformed range response: line 3: missing ':' separator");

        let err: CheckError = TransportError::Unreachable { message: "timed out".into() }.into();
        assert_eq!(err.to_string(), "range query failed: timed out");
    }
}
