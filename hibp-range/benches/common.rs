use hibp_range::{HEX_CHARS, SUFFIX_LEN};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ALL_CHARS: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Generates a specified number of random passwords with uniform distribution.
/// Uses a fixed seed for reproducible benchmark results.
pub fn generate_random_passwords(count: usize) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count)
        .map(|_| {
            let length = rng.gen_range(8..=64);
            (0..length)
                .map(|_| ALL_CHARS[rng.gen_range(0..ALL_CHARS.len())] as char)
                .collect()
        })
        .collect()
}

/// Builds a range response body with `lines` random entries, shaped like the
/// real API (CRLF separated, trailing separator).
pub fn generate_range_body(lines: usize) -> String {
    let mut rng = StdRng::seed_from_u64(7);
    let mut body = String::with_capacity(lines * (SUFFIX_LEN + 10));
    for _ in 0..lines {
        for _ in 0..SUFFIX_LEN {
            body.push(HEX_CHARS[rng.gen_range(0..16)] as char);
        }
        body.push(':');
        body.push_str(&rng.gen_range(1..100_000u64).to_string());
        body.push_str("\r\n");
    }
    body
}
