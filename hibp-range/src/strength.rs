//! Rule-counting strength heuristic.
//!
//! One point each for length, an uppercase letter, a digit and a symbol. A
//! password on the denylist is always [`Rating::VeryWeak`].
//!
//! Four points only rate [`Rating::Strong`] at [`STRONG_MIN_LENGTH`] characters
//! or more; shorter four-point passwords rate [`Rating::Good`].

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

/// Minimum length, in characters, to earn the length point.
pub const MIN_LENGTH: usize = 8;

/// Minimum length, in characters, for a four-point password to rate Strong.
pub const STRONG_MIN_LENGTH: usize = 12;

static DENYLIST: LazyLock<HashSet<String>> = LazyLock::new(|| {
    include_str!("../data/common-passwords.txt")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_lowercase)
        .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rating {
    VeryWeak,
    Weak,
    Fair,
    Good,
    Strong,
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::VeryWeak => "Very Weak",
            Self::Weak => "Weak",
            Self::Fair => "Fair",
            Self::Good => "Good",
            Self::Strong => "Strong",
        })
    }
}

/// An improvement hint for a password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Suggestion {
    TooShort,
    NoUppercase,
    NoDigit,
    NoSymbol,
    ShortOfStrong,
    Common,
}

impl Suggestion {
    /// Every suggestion, in the order they are reported.
    pub const ALL: [Suggestion; 6] = [
        Self::TooShort,
        Self::NoUppercase,
        Self::NoDigit,
        Self::NoSymbol,
        Self::ShortOfStrong,
        Self::Common,
    ];

    fn applies(self, password: &str) -> bool {
        match self {
            Self::TooShort => !long_enough(password),
            Self::NoUppercase => !has_uppercase(password),
            Self::NoDigit => !has_digit(password),
            Self::NoSymbol => !has_symbol(password),
            Self::ShortOfStrong => long_enough(password) && char_len(password) < STRONG_MIN_LENGTH,
            Self::Common => is_denylisted(password),
        }
    }
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort => write!(f, "Make password at least {MIN_LENGTH} characters"),
            Self::NoUppercase => f.write_str("Add uppercase letters"),
            Self::NoDigit => f.write_str("Add numbers"),
            Self::NoSymbol => f.write_str("Add special characters"),
            Self::ShortOfStrong => {
                write!(f, "Use at least {STRONG_MIN_LENGTH} characters for a strong password")
            }
            Self::Common => f.write_str("Avoid common passwords"),
        }
    }
}

/// Whether the password is on the common-password denylist, ignoring case.
pub fn is_denylisted(password: &str) -> bool {
    DENYLIST.contains(&password.to_lowercase())
}

/// Rates a password.
pub fn score(password: &str) -> Rating {
    if is_denylisted(password) {
        return Rating::VeryWeak;
    }

    let points = [long_enough, has_uppercase, has_digit, has_symbol]
        .iter()
        .filter(|rule| rule(password))
        .count();

    match points {
        0 => Rating::VeryWeak,
        1 => Rating::Weak,
        2 => Rating::Fair,
        3 => Rating::Good,
        _ if char_len(password) >= STRONG_MIN_LENGTH => Rating::Strong,
        _ => Rating::Good,
    }
}

/// Hints for every criterion `password` misses, evaluated lazily.
pub fn suggestions(password: &str) -> impl Iterator<Item = Suggestion> + '_ {
    Suggestion::ALL.into_iter().filter(move |s| s.applies(password))
}

fn char_len(password: &str) -> usize {
    password.chars().count()
}

fn long_enough(password: &str) -> bool {
    char_len(password) >= MIN_LENGTH
}

fn has_uppercase(password: &str) -> bool {
    password.chars().any(|c| c.is_ascii_uppercase())
}

fn has_digit(password: &str) -> bool {
    password.chars().any(|c| c.is_ascii_digit())
}

fn has_symbol(password: &str) -> bool {
    password.chars().any(|c| !c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denylist_forces_very_weak() {
        assert_eq!(score("123456"), Rating::VeryWeak);
        assert_eq!(score("PASSWORD"), Rating::VeryWeak);
        // Would be Good on points alone.
        assert_eq!(score("P@ssw0rd"), Rating::VeryWeak);
    }

    #[test]
    fn test_denylist_is_case_insensitive() {
        assert!(is_denylisted("QwErTy"));
        assert!(!is_denylisted("qwerty!"));
        assert!(!is_denylisted(""));
    }

    #[test]
    fn test_points_to_rating() {
        assert_eq!(score(""), Rating::VeryWeak);
        assert_eq!(score("abc"), Rating::VeryWeak);
        assert_eq!(score("abcdefgh"), Rating::Weak);
        assert_eq!(score("Abcdefgh"), Rating::Fair);
        assert_eq!(score("Abcdefg1"), Rating::Good);
        assert_eq!(score("abc1!"), Rating::Fair);
    }

    #[test]
    fn test_strong_needs_twelve_characters() {
        // length 11, uppercase, digit, symbol: all four points, still Good.
        assert_eq!(score("Tr0ub4dor&3"), Rating::Good);
        assert_eq!(score("Tr0ub4dor&33"), Rating::Strong);
    }

    #[test]
    fn test_non_ascii_counts_as_symbol() {
        assert!(has_symbol("pässwort"));
        assert!(!has_uppercase("ÄÖÜ"));
        assert_eq!(char_len("pässwort"), 8);
    }

    #[test]
    fn test_suggestions_in_criterion_order() {
        let hints: Vec<_> = suggestions("abc").collect();
        assert_eq!(
            hints,
            [Suggestion::TooShort, Suggestion::NoUppercase, Suggestion::NoDigit, Suggestion::NoSymbol]
        );
    }

    #[test]
    fn test_suggestions_for_common_password() {
        let hints: Vec<_> = suggestions("123456").collect();
        assert_eq!(
            hints,
            [
                Suggestion::TooShort,
                Suggestion::NoUppercase,
                Suggestion::NoSymbol,
                Suggestion::Common
            ]
        );
    }

    #[test]
    fn test_suggestions_near_strong() {
        let hints: Vec<_> = suggestions("Tr0ub4dor&3").collect();
        assert_eq!(hints, [Suggestion::ShortOfStrong]);
        assert_eq!(suggestions("correct Horse 9 battery").count(), 0);
    }

    #[test]
    fn test_suggestion_messages() {
        assert_eq!(Suggestion::TooShort.to_string(), "Make password at least 8 characters");
        assert_eq!(Suggestion::Common.to_string(), "Avoid common passwords");
        assert_eq!(Rating::VeryWeak.to_string(), "Very Weak");
    }
}
