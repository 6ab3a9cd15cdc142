//! Input/output content guardrails.
//!
//! A cheap pre-filter rejects off-domain questions before an expensive
//! generation call; a cheap post-filter rejects unsafe completions before
//! they are returned. The policy is injectable so a classifier can replace
//! the keyword lists without touching the orchestrator.

/// Content acceptance policy for the pipeline.
///
/// Both checks are pure and stateless.
pub trait ContentPolicy: Send + Sync {
    /// True iff the question is in-domain and worth answering.
    fn accepts_input(&self, text: &str) -> bool;

    /// True iff the generated answer is safe to return.
    fn accepts_output(&self, text: &str) -> bool;
}

/// Math-domain keywords; a question must contain at least one.
const ALLOWED_KEYWORDS: &[&str] = &[
    "integrate",
    "differentiate",
    "derivative",
    "equation",
    "matrix",
    "limit",
    "solve",
    "find",
    "function",
    "value",
    "graph",
    "area",
    "volume",
];

/// Unsafe-topic keywords; an answer must contain none.
const BANNED_KEYWORDS: &[&str] = &[
    "violence",
    "religion",
    "politics",
    "hack",
    "illegal",
    "suicide",
];

/// Default keyword-based policy.
///
/// Case-insensitive substring tests. Known limitation: substrings produce
/// false positives and negatives. "hacky" trips the deny-list, and a
/// legitimate question phrased without any allow-listed word is rejected.
#[derive(Debug, Clone, Default)]
pub struct KeywordPolicy;

impl KeywordPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl ContentPolicy for KeywordPolicy {
    fn accepts_input(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        ALLOWED_KEYWORDS.iter().any(|word| lowered.contains(word))
    }

    fn accepts_output(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        !BANNED_KEYWORDS.iter().any(|word| lowered.contains(word))
    }
}
