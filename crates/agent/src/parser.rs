//! Result parser: raw generator text → (steps, final answer, confidence).
//!
//! Models return free text even when instructed to number their steps, so
//! the pipeline standardizes on one deterministic, side-effect-free parser.
//! Lines are classified in order: numbered steps, a final-answer line
//! (last one wins), unnumbered lines carrying a mathematical marker, and
//! everything else is dropped silently. If no final-answer line appeared, a
//! short terminal expression at the end of the steps is promoted.

use regex::Regex;
use std::sync::LazyLock;

/// Heuristic confidence assigned to any parse without an external signal.
pub const DEFAULT_CONFIDENCE: f32 = 0.6;

/// "1. content" or "2) content"; the numeral is discarded.
static STEP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+[.)]\s*(.*)$").expect("step regex is valid"));

/// "Final Answer: content" / "answer - content", case-insensitive.
static ANSWER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:final answer|answer)\s*[:-]\s*(.*)$").expect("answer regex is valid")
});

/// A mathematical marker: an operator, a backslash-escaped identifier
/// (LaTeX-like), or the integration constant "C" as an isolated word.
static MATH_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[=^*/]|\\[A-Za-z]+|\bC\b").expect("marker regex is valid"));

/// MCQ option letter at the start of a line, e.g. "(B)" or "C." .
static OPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[\(\[]?([A-D])[\)\].:\s-]+").expect("option regex is valid")
});

/// Numeric tokens: decimals, simple fractions, integers.
static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-+]?\d*\.?\d+/?\d*").expect("number regex is valid"));

/// A standardized generation result.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedGeneration {
    /// Ordered presentation steps
    pub steps: Vec<String>,

    /// Final answer, empty when none was found
    pub final_answer: String,

    /// Fixed heuristic confidence (callers max this against an external
    /// signal such as a retrieval score)
    pub confidence: f32,
}

/// Parse raw generator text into steps, final answer, and confidence.
///
/// Empty input yields `([], "", 0.6)`. Never fails: a degenerate generation
/// comes back with empty fields.
pub fn parse(raw: &str) -> ParsedGeneration {
    let mut steps: Vec<String> = Vec::new();
    let mut final_answer = String::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = STEP_RE.captures(line) {
            // A bare numeral line ("3.") carries no step content
            let step = caps[1].trim();
            if !step.is_empty() {
                steps.push(step.to_string());
            }
        } else if let Some(caps) = ANSWER_RE.captures(line) {
            // Last final-answer line wins
            final_answer = caps[1].trim().to_string();
        } else if MATH_MARKER_RE.is_match(line) {
            // Unnumbered math line (symbolic or LaTeX-like expression)
            steps.push(line.to_string());
        }
        // anything else is conversational filler, dropped
    }

    // No explicit final answer: a short terminal expression at the end of
    // the steps is the answer, a multi-word explanatory step is not.
    if final_answer.is_empty() {
        if let Some(last) = steps.last() {
            if is_terminal_expression(last) {
                final_answer = steps.pop().unwrap_or_default();
            }
        }
    }

    ParsedGeneration {
        steps,
        final_answer,
        confidence: DEFAULT_CONFIDENCE,
    }
}

/// True for a candidate final answer: only alphanumerics, operators,
/// parentheses, periods, and underscores, with at most 8 tokens.
fn is_terminal_expression(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }

    let charset_ok = s.chars().all(|c| {
        c.is_ascii_alphanumeric() || c.is_whitespace() || "+-*/^=()._".contains(c)
    });

    charset_ok && s.split_whitespace().count() <= 8
}

/// Extract a single-line answer for evaluation purposes.
///
/// Preference order: an explicit final-answer line, an MCQ option letter,
/// the last numeric token, else the first line truncated to 200 chars.
pub fn extract_final_answer(raw: &str) -> String {
    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        return String::new();
    }

    for line in &lines {
        if let Some(caps) = ANSWER_RE.captures(line) {
            return caps[1]
                .trim()
                .trim_matches(|c| c == '.' || c == ' ')
                .to_string();
        }
    }

    for line in &lines {
        if let Some(caps) = OPTION_RE.captures(line) {
            return caps[1].to_uppercase();
        }
    }

    if let Some(last) = NUMBER_RE.find_iter(raw).last() {
        return last.as_str().trim().to_string();
    }

    lines[0].chars().take(200).collect()
}
