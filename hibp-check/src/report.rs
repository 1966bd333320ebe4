use std::fmt;

use hibp_range::{BreachResult, BreachStatus, CheckError, score, suggestions};
use serde::Serialize;

/// Result of `hibp-check check`, printable as text or JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub rating: String,
    pub suggestions: Vec<String>,
    #[serde(flatten)]
    pub breach: BreachOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "breach", rename_all = "snake_case")]
pub enum BreachOutcome {
    Found {
        count: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        ambiguous_matches: Option<usize>,
    },
    NotFound,
    Failed {
        error: String,
    },
}

impl Report {
    pub fn new(password: &str, check: Result<BreachResult, CheckError>) -> Self {
        let breach = match check {
            Ok(result) if result.is_breached() => BreachOutcome::Found {
                count: result.count,
                ambiguous_matches: result.ambiguity.map(|a| a.matches),
            },
            Ok(_) => BreachOutcome::NotFound,
            Err(err) => BreachOutcome::Failed { error: err.to_string() },
        };

        Self {
            rating: score(password).to_string(),
            suggestions: suggestions(password).map(|s| s.to_string()).collect(),
            breach,
        }
    }

    pub fn failed(&self) -> bool {
        matches!(self.breach, BreachOutcome::Failed { .. })
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Strength: {}", self.rating)?;
        for suggestion in &self.suggestions {
            writeln!(f, "  - {suggestion}")?;
        }

        match &self.breach {
            BreachOutcome::Found { count, ambiguous_matches } => {
                write!(f, "This password has appeared in {} breaches!", format_count(*count))?;
                if let Some(matches) = ambiguous_matches {
                    write!(f, "\nwarning: {matches} range entries matched, showing the first")?;
                }
                Ok(())
            }
            BreachOutcome::NotFound => f.write_str("No breaches found for this password."),
            BreachOutcome::Failed { error } => write!(f, "Error checking breach status: {error}"),
        }
    }
}

/// The breach line shown for a session status, if any.
pub fn breach_message(status: &BreachStatus) -> Option<String> {
    match status {
        BreachStatus::Idle => None,
        BreachStatus::Pending(_) => Some("Checking breach status...".to_owned()),
        BreachStatus::Found { count, ambiguity } => {
            let mut message =
                format!("This password has appeared in {} breaches!", format_count(*count));
            if let Some(ambiguity) = ambiguity {
                message.push_str(&format!(" ({} entries matched)", ambiguity.matches));
            }
            Some(message)
        }
        BreachStatus::NotFound => Some("No breaches found for this password.".to_owned()),
        BreachStatus::Failed(err) => Some(format!("Error checking breach status: {err}")),
    }
}

/// Groups digits by thousands: `3730471` becomes `3,730,471`.
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use hibp_range::{AmbiguousMatch, TransportError};

    use super::*;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(3730471), "3,730,471");
        assert_eq!(format_count(u64::MAX), "18,446,744,073,709,551,615");
    }

    #[test]
    fn test_found_report() {
        let report = Report::new("password", Ok(BreachResult { count: 3730471, ambiguity: None }));
        assert_eq!(report.rating, "Very Weak");
        assert!(!report.failed());
        assert_eq!(
            report.to_string(),
            "Strength: Very Weak\n\
             \x20 - Add uppercase letters\n\
             \x20 - Add numbers\n\
             \x20 - Add special characters\n\
             \x20 - Use at least 12 characters for a strong password\n\
             \x20 - Avoid common passwords\n\
             This password has appeared in 3,730,471 breaches!"
        );
    }

    #[test]
    fn test_failure_is_not_no_breach() {
        let err = CheckError::Transport(TransportError::Status { status: 500, message: "x".into() });
        let report = Report::new("Tr0ub4dor&3", Err(err));
        assert!(report.failed());
        assert!(!report.to_string().contains("No breaches found"));
        assert!(
            report
                .to_string()
                .ends_with("Error checking breach status: range query returned HTTP 500: x")
        );
    }

    #[test]
    fn test_json_report() {
        let report = Report::new(
            "Tr0ub4dor&3",
            Ok(BreachResult { count: 2, ambiguity: Some(AmbiguousMatch { matches: 2 }) }),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "rating": "Good",
                "suggestions": ["Use at least 12 characters for a strong password"],
                "breach": "found",
                "count": 2,
                "ambiguous_matches": 2,
            })
        );

        let report = Report::new("Tr0ub4dor&33", Ok(BreachResult::default()));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["breach"], "not_found");
        assert_eq!(json["rating"], "Strong");
    }

    #[test]
    fn test_breach_messages() {
        assert_eq!(breach_message(&BreachStatus::Idle), None);
        assert_eq!(
            breach_message(&BreachStatus::Found { count: 1234, ambiguity: None }).unwrap(),
            "This password has appeared in 1,234 breaches!"
        );
        let ambiguous =
            BreachStatus::Found { count: 2, ambiguity: Some(AmbiguousMatch { matches: 3 }) };
        assert_eq!(
            breach_message(&ambiguous).unwrap(),
            "This password has appeared in 2 breaches! (3 entries matched)"
        );
        assert_eq!(
            breach_message(&BreachStatus::NotFound).unwrap(),
            "No breaches found for this password."
        );
    }
}
