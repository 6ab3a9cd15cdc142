//! Upstream cleaning of raw model output.
//!
//! Models sometimes open with conversational filler ("Hi! I'd be happy to
//! help...") before the actual working. Stripping it here keeps the result
//! parser focused on step and answer extraction.

use regex::Regex;
use std::sync::LazyLock;

static FILLER_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(hi|hello|hey|dear student|i'd be happy to help)[.,!\s:-]*")
        .expect("filler prefix regex is valid")
});

/// Strip a leading greeting/filler phrase from generated text.
///
/// Only the opening phrase is removed; the body is left untouched.
pub fn strip_filler(text: &str) -> String {
    FILLER_PREFIX.replace(text.trim(), "").trim().to_string()
}
