/// Word filter for post bodies
///
/// Whole whitespace-separated words are compared case-insensitively against the
/// blocklist and replaced by a mask. Punctuation attached to a word keeps it
/// from matching. Runs of whitespace collapse to a single space.

const BLOCKED_WORDS: &[&str] = &["kerfuffle", "sharbert", "fornax"];
const MASK: &str = "****";

pub fn is_blocked(word: &str) -> bool {
    let lowered = word.to_lowercase();
    BLOCKED_WORDS.iter().any(|blocked| *blocked == lowered)
}

pub fn clean_body(body: &str) -> String {
    body.split_whitespace()
        .map(|word| if is_blocked(word) { MASK } else { word })
        .collect::<Vec<_>>()
        .join(" ")
}
