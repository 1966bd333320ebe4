//! Range query and local matching.
//!
//! The range response body is a list of `SUFFIX:COUNT` lines separated by CRLF,
//! for example:
//!
//! ```text
//! 1E4C9B93F3F0682250B6CF8331B7EE68FD8:3730471
//! 1E4F2B4E9D7E9D5C1C2E6D6B9B0D5B7C0A1:2
//! ```
//!
//! Parsing is strict. A single malformed line fails the whole check, because
//! skipping it could hide the line that would have matched.

use std::future::Future;

use tracing::{debug, warn};

use crate::error::{AmbiguousMatch, CheckError, MalformedEntryError, TransportError};
use crate::fingerprint::{RoutingPrefix, VerificationSuffix, fingerprint};

/// Separator between entries of a range response.
pub const LINE_SEPARATOR: &str = "\r\n";

/// Fetches every corpus entry that shares a routing prefix.
///
/// This is the only point where a check leaves the process, and the only
/// point where it may suspend. Any `Fn(RoutingPrefix) -> impl Future` closure
/// with the right output is a `RangeQuery`.
pub trait RangeQuery {
    fn range(
        &self,
        prefix: RoutingPrefix,
    ) -> impl Future<Output = Result<String, TransportError>> + Send;
}

impl<F, Fut> RangeQuery for F
where
    F: Fn(RoutingPrefix) -> Fut,
    Fut: Future<Output = Result<String, TransportError>> + Send,
{
    fn range(
        &self,
        prefix: RoutingPrefix,
    ) -> impl Future<Output = Result<String, TransportError>> + Send {
        self(prefix)
    }
}

/// One `SUFFIX:COUNT` line of a range response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateEntry<'a> {
    pub suffix: &'a str,
    pub count: u64,
}

/// Outcome of a completed breach check.
///
/// `count == 0` means the password is not in the corpus. It is never used to
/// stand in for a failed check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BreachResult {
    pub count: u64,
    pub ambiguity: Option<AmbiguousMatch>,
}

impl BreachResult {
    pub fn is_breached(&self) -> bool {
        self.count > 0
    }
}

/// Checks fingerprints against a [`RangeQuery`].
pub struct BreachMatcher<'a, Q> {
    query: &'a Q,
}

impl<'a, Q: RangeQuery> BreachMatcher<'a, Q> {
    pub fn new(query: &'a Q) -> Self {
        Self { query }
    }

    /// Queries the range for `prefix` once and looks for `suffix` in it.
    pub async fn check(
        &self,
        prefix: RoutingPrefix,
        suffix: &VerificationSuffix,
    ) -> Result<BreachResult, CheckError> {
        debug!(%prefix, "querying range");
        let body = self.query.range(prefix).await?;
        let result = match_body(&body, suffix)?;
        debug!(%prefix, breached = result.is_breached(), "range matched");
        Ok(result)
    }

    /// Fingerprints `password` and checks it.
    pub async fn check_password(&self, password: &str) -> Result<BreachResult, CheckError> {
        let (prefix, suffix) = fingerprint(password).split();
        self.check(prefix, &suffix).await
    }
}

/// Lazily parses a range response into entries.
///
/// Empty lines, including the one after a trailing separator, are skipped.
pub fn entries(
    body: &str,
) -> impl Iterator<Item = Result<CandidateEntry<'_>, MalformedEntryError>> + '_ {
    body.split(LINE_SEPARATOR)
        .enumerate()
        .filter(|(_, line)| !line.is_empty())
        .map(|(i, line)| parse_entry(i + 1, line))
}

/// Finds `suffix` in a range response body.
///
/// Every line is validated, even after a match. When several entries match,
/// the first one wins and the result carries an [`AmbiguousMatch`].
pub fn match_body(
    body: &str,
    suffix: &VerificationSuffix,
) -> Result<BreachResult, MalformedEntryError> {
    let mut count = None;
    let mut matches = 0usize;

    for entry in entries(body) {
        let entry = entry?;
        if suffix.matches(entry.suffix) {
            matches += 1;
            count.get_or_insert(entry.count);
        }
    }

    let ambiguity = (matches > 1).then_some(AmbiguousMatch { matches });
    if let Some(ambiguity) = ambiguity {
        warn!(matches = ambiguity.matches, "range response matched more than once, using first");
    }

    Ok(BreachResult { count: count.unwrap_or(0), ambiguity })
}

fn parse_entry(line: usize, text: &str) -> Result<CandidateEntry<'_>, MalformedEntryError> {
    let (suffix, count) =
        text.split_once(':').ok_or(MalformedEntryError::MissingSeparator { line })?;

    let count = parse_count(count)
        .ok_or_else(|| MalformedEntryError::InvalidCount { line, count: count.to_owned() })?;

    Ok(CandidateEntry { suffix, count })
}

/// Plain decimal digits only. `str::parse` alone would also take a leading '+'.
fn parse_count(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
