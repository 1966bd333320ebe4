//! Input-driven checking as a pure reducer.
//!
//! Each [`Event::PasswordChanged`] issues a new [`CheckToken`]. Results come
//! back tagged with the token of the check that produced them, and only a
//! result for the latest token is applied. A slow answer for an old password
//! therefore can never overwrite the answer for the current one.
//!
//! ```
//! use hibp_range::{BreachResult, BreachStatus, Event, Session};
//!
//! let session = Session::default().apply(Event::PasswordChanged("hunter22".into()));
//! let (token, _password) = session.pending_check().unwrap();
//!
//! let session = session.apply(Event::RangeQueryResolved(token, BreachResult::default()));
//! assert_eq!(session.breach(), &BreachStatus::NotFound);
//! ```

use std::fmt;

use tracing::debug;

use crate::error::{AmbiguousMatch, CheckError};
use crate::matcher::BreachResult;
use crate::strength::{Rating, Suggestion, score, suggestions};

/// Passwords shorter than this, in characters, are rated but not checked.
pub const MIN_CHECK_LENGTH: usize = 6;

/// Identifies one issued breach check. Later checks have larger tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CheckToken(u64);

impl CheckToken {
    pub fn get(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for CheckToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What is known about the current password's breach status.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BreachStatus {
    /// Nothing to check: the password is empty or too short.
    #[default]
    Idle,
    /// A check was issued and has not answered yet.
    Pending(CheckToken),
    Found {
        count: u64,
        /// Set when more than one range entry matched the suffix.
        ambiguity: Option<AmbiguousMatch>,
    },
    NotFound,
    /// The check could not complete. This is not the same as `NotFound`.
    Failed(CheckError),
}

#[derive(Debug, Clone)]
pub enum Event {
    PasswordChanged(String),
    RangeQueryResolved(CheckToken, BreachResult),
    RangeQueryFailed(CheckToken, CheckError),
}

/// Shown state for one password input.
#[derive(Clone, Default)]
pub struct Session {
    password: String,
    rating: Option<Rating>,
    breach: BreachStatus,
    latest: CheckToken,
}

impl Session {
    pub fn password(&self) -> &str {
        &self.password
    }

    /// `None` while the input is empty.
    pub fn rating(&self) -> Option<Rating> {
        self.rating
    }

    pub fn breach(&self) -> &BreachStatus {
        &self.breach
    }

    /// The most recently issued token.
    pub fn latest_token(&self) -> CheckToken {
        self.latest
    }

    /// The check the driver should start, if one is outstanding.
    pub fn pending_check(&self) -> Option<(CheckToken, &str)> {
        match self.breach {
            BreachStatus::Pending(token) => Some((token, self.password.as_str())),
            _ => None,
        }
    }

    pub fn suggestions(&self) -> impl Iterator<Item = Suggestion> + '_ {
        let shown = !self.password.is_empty();
        suggestions(&self.password).filter(move |_| shown)
    }

    pub fn apply(self, event: Event) -> Self {
        reduce(self, event)
    }

    fn accepts(&self, token: CheckToken) -> bool {
        token == self.latest && self.breach == BreachStatus::Pending(token)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("password", &"<redacted>")
            .field("rating", &self.rating)
            .field("breach", &self.breach)
            .field("latest", &self.latest)
            .finish()
    }
}

/// Applies one event to the shown state.
pub fn reduce(state: Session, event: Event) -> Session {
    match event {
        Event::PasswordChanged(password) => {
            let latest = state.latest.next();
            let rating = (!password.is_empty()).then(|| score(&password));
            let breach = if password.chars().count() >= MIN_CHECK_LENGTH {
                BreachStatus::Pending(latest)
            } else {
                BreachStatus::Idle
            };
            Session { password, rating, breach, latest }
        }
        Event::RangeQueryResolved(token, result) if state.accepts(token) => {
            let breach = if result.is_breached() {
                BreachStatus::Found { count: result.count, ambiguity: result.ambiguity }
            } else {
                BreachStatus::NotFound
            };
            Session { breach, ..state }
        }
        Event::RangeQueryFailed(token, error) if state.accepts(token) => {
            Session { breach: BreachStatus::Failed(error), ..state }
        }
        Event::RangeQueryResolved(token, _) | Event::RangeQueryFailed(token, _) => {
            debug!(%token, latest = %state.latest, "discarding superseded check result");
            state
        }
    }
}
