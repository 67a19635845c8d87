//! # Text Normalization Rules
//!
//! The ordered substitution rules applied to a transcript before it becomes
//! a command. Pure functions over strings, no state.
//!
//! ## Rules, in order:
//! 1. Trim surrounding whitespace.
//! 2. Literal dictation: a phrase starting with "type " (any casing) is
//!    returned with the speaker's original casing intact from the prefix
//!    onward. Matched against the untouched string, so no index mapping
//!    between folded and original text is ever needed.
//! 3. Case-fold everything else.
//! 4. Collapse "gmail" spelling variants ("g mail", "g-mail", …) to the
//!    canonical token.
//! 5. Any phrase containing "open gmail", "open mail", or "open email"
//!    collapses to the canonical command "open gmail".

use regex::Regex;
use std::sync::OnceLock;

/// Spacing/hyphenation variants of "gmail", case-insensitive.
fn gmail_variants() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bg[\s\-]*mail\b").expect("gmail variant pattern is valid"))
}

/// Leading "type " prefix with a non-empty tail, case-insensitive.
fn type_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^type\s+\S").expect("type prefix pattern is valid"))
}

/// Normalize one raw transcript into command text. Returns an empty string
/// when nothing remains after trimming.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();

    // Literal dictation retains user casing, prefix included.
    if type_prefix().is_match(trimmed) {
        return trimmed.to_string();
    }

    let folded = trimmed.to_lowercase();
    let collapsed = gmail_variants().replace_all(&folded, "gmail");

    if collapsed.contains("open gmail")
        || collapsed.contains("open mail")
        || collapsed.contains("open email")
    {
        return "open gmail".to_string();
    }

    collapsed.into_owned()
}
