//! Breached password checking against the Have I Been Pwned range API.
//!
//! A password is never sent anywhere. It is hashed locally with SHA-1 and only
//! the first five hex characters of the digest (the routing prefix) are handed
//! to a [`RangeQuery`]. The collaborator answers with every known digest suffix
//! sharing that prefix, and the match against the remaining 35 characters (the
//! verification suffix) happens in-process.
//!
//! The crate is split along that pipeline:
//!
//! - [`fingerprint`] turns a password into a [`Fingerprint`] and splits it into
//!   a [`RoutingPrefix`] and a [`VerificationSuffix`].
//! - [`BreachMatcher`] runs the range query and matches the response body.
//! - [`strength`] rates a password with a small rule-counting heuristic.
//! - [`session`] is a pure reducer for input-driven checking, discarding
//!   results of checks that were superseded by newer input.
//!
//! With the `http` feature enabled, [`HttpRangeClient`] provides a
//! `reqwest`-backed range query against the public API or a relay.
//!
//! ```no_run
//! # async fn run() -> Result<(), hibp_range::CheckError> {
//! use hibp_range::{BreachMatcher, RoutingPrefix, TransportError};
//!
//! let relay = |prefix: RoutingPrefix| async move {
//!     // Forward `prefix` to the provider here.
//!     let _ = prefix;
//!     Ok::<_, TransportError>(String::new())
//! };
//!
//! let result = BreachMatcher::new(&relay).check_password("hunter2").await?;
//! println!("seen {} times", result.count);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod fingerprint;
#[cfg(feature = "http")]
pub mod http;
pub mod matcher;
pub mod session;
pub mod strength;

pub use error::{
    AmbiguousMatch, CheckError, InvalidFingerprintError, MalformedEntryError, TransportError,
};
pub use fingerprint::{Fingerprint, RoutingPrefix, VerificationSuffix, fingerprint, split};
#[cfg(feature = "http")]
pub use http::{DEFAULT_RANGE_URL, HttpRangeClient, RANGE_URL_ENV};
pub use matcher::{BreachMatcher, BreachResult, CandidateEntry, RangeQuery, entries, match_body};
pub use session::{BreachStatus, CheckToken, Event, MIN_CHECK_LENGTH, Session, reduce};
pub use strength::{Rating, Suggestion, is_denylisted, score, suggestions};

/// The length of a hex encoded SHA-1 fingerprint.
pub const FINGERPRINT_LEN: usize = 40;

/// The length of the routing prefix disclosed to the range query (5 hex characters).
pub const PREFIX_LEN: usize = 5;

/// The length of the verification suffix that never leaves the process.
pub const SUFFIX_LEN: usize = FINGERPRINT_LEN - PREFIX_LEN;

/// Hex lookup table, uppercase to match the corpus format.
pub const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";
