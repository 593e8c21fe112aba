//! Email body cleanup.
//!
//! Notification emails arrive quoted-printable encoded more often than not,
//! and the transport layer leaves soft line breaks and hex escapes behind.
//! Everything here is best-effort: undecodable bytes degrade to the Unicode
//! replacement character, never an error.

// Hex escapes seen in provider emails. The rupee sign and non-breaking
// space arrive as multi-byte sequences, so those must be replaced first.
const QP_SEQUENCES: &[(&str, &str)] = &[
    ("=E2=82=B9", "\u{20b9}"),
    ("=C2=A0", " "),
    ("=20", " "),
    ("=3D", "="),
];

// Phrases that mark a message as non-transactional (promos, verification
// codes). Matched case-insensitively against the cleaned body.
const SKIP_PHRASES: &[&str] = &[
    "recharge codes",
    "verify this email",
    "digit code",
    "verification code",
];

/// Decode raw message bytes and clean transport artifacts. Never fails.
pub fn normalize(raw: &[u8]) -> String {
    clean(&String::from_utf8_lossy(raw))
}

/// Clean an already-decoded body: reverse quoted-printable artifacts,
/// canonicalize the currency symbol, collapse whitespace.
pub fn clean(body: &str) -> String {
    let mut text = body.replace("=\r\n", "").replace("=\n", "");
    for (seq, replacement) in QP_SEQUENCES {
        text = text.replace(seq, replacement);
    }

    text = text.replace('\u{a0}', " ");
    // The rupee sign trips up terminals and logs; patterns match on "Rs."
    text = text.replace('\u{20b9}', "Rs. ");

    // Stray '=' at end of line is a leftover soft break
    let text: String = text
        .lines()
        .map(|line| line.trim_end().trim_end_matches('='))
        .collect::<Vec<_>>()
        .join("\n");

    collapse_whitespace(&text)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when the message matches a known non-transactional template and
/// extraction should be skipped entirely.
pub fn is_non_transactional(cleaned: &str) -> bool {
    let lower = cleaned.to_lowercase();
    SKIP_PHRASES.iter().any(|phrase| lower.contains(phrase))
}
