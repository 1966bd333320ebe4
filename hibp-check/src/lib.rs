//! Command line front end for `hibp-range`.
//!
//! `check` rates one password and looks it up. `watch` treats every line on
//! stdin as the password input changing, runs checks as they are issued and
//! only ever shows the result for the latest line.

pub mod error;
pub mod report;
pub mod watch;

pub use error::Error;
pub use report::{BreachOutcome, Report, breach_message, format_count};
pub use watch::watch;
