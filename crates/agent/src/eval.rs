//! Offline evaluation harness.
//!
//! Scores the generator against a benchmark dataset of question/answer
//! pairs. Each question is asked in eval mode (single final-answer line);
//! the prediction is matched against the expected answer by normalized
//! text, MCQ option letter, or numeric equality with tolerance.

use crate::parser::extract_final_answer;
use crate::prompts::build_eval_prompt;
use matha_core::{AgentError, AgentResult};
use matha_llm::{GenerateRequest, Generator};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Instant;

/// Tolerance for numeric answer comparison.
const NUMERIC_TOLERANCE: f64 = 1e-3;

static OPTION_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b([A-D])\b").expect("option word regex is valid"));

static NUMERIC_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-+]?\d+\.\d+|[-+]?\d+/\d+|[-+]?\d+").expect("numeric token regex is valid")
});

/// One benchmark item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalItem {
    pub question: String,
    pub answer: String,
}

/// Per-question result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalResult {
    pub question: String,
    pub expected: String,
    pub predicted: String,
    pub correct: bool,
    pub latency_ms: u64,
}

/// Aggregate report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalReport {
    pub total: usize,
    pub correct: usize,
    pub accuracy: f64,
    pub avg_latency_ms: f64,
    pub results: Vec<EvalResult>,
}

/// Collapse whitespace and lowercase for comparison.
pub fn normalize_text(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Return the first A-D option letter found, else an empty string.
pub fn extract_first_option(answer_text: &str) -> String {
    OPTION_WORD_RE
        .captures(answer_text)
        .map(|caps| caps[1].to_uppercase())
        .unwrap_or_default()
}

/// Numeric tokens found in a string (integers, decimals, fractions).
pub fn extract_numbers(s: &str) -> Vec<String> {
    NUMERIC_TOKEN_RE
        .find_iter(s)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn parse_number(token: &str) -> Option<f64> {
    if let Some((numerator, denominator)) = token.split_once('/') {
        let n: f64 = numerator.parse().ok()?;
        let d: f64 = denominator.parse().ok()?;
        if d == 0.0 {
            return None;
        }
        return Some(n / d);
    }
    token.parse().ok()
}

/// Compare numeric expressions robustly: the last numeric token on each
/// side is parsed (handling simple fractions) and compared with tolerance.
pub fn numeric_equal(a: &str, b: &str, tolerance: f64) -> bool {
    let nums_a = extract_numbers(a);
    let nums_b = extract_numbers(b);

    let (Some(last_a), Some(last_b)) = (nums_a.last(), nums_b.last()) else {
        return false;
    };

    match (parse_number(last_a), parse_number(last_b)) {
        (Some(va), Some(vb)) => (va - vb).abs() <= tolerance,
        _ => false,
    }
}

/// Decide whether a prediction matches the expected answer.
pub fn answers_match(expected: &str, predicted: &str) -> bool {
    if expected.is_empty() || predicted.is_empty() {
        return false;
    }

    if normalize_text(expected) == normalize_text(predicted) {
        return true;
    }

    let expected_option = extract_first_option(expected);
    if !expected_option.is_empty() && expected_option == extract_first_option(predicted) {
        return true;
    }

    numeric_equal(expected, predicted, NUMERIC_TOLERANCE)
}

/// Load a benchmark dataset from a JSON array file.
pub fn load_dataset(path: &Path) -> AgentResult<Vec<EvalItem>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| AgentError::Config(format!("Failed to read dataset {:?}: {}", path, e)))?;
    let items: Vec<EvalItem> = serde_json::from_str(&contents)?;
    Ok(items)
}

/// Write a report as pretty-printed JSON.
pub fn write_report(path: &Path, report: &EvalReport) -> AgentResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Run the evaluation over up to `limit` items.
pub async fn evaluate(
    generator: &dyn Generator,
    model: &str,
    items: &[EvalItem],
    limit: usize,
) -> AgentResult<EvalReport> {
    let total = limit.min(items.len());
    if total == 0 {
        return Err(AgentError::Config("No examples in dataset".to_string()));
    }

    let mut results = Vec::with_capacity(total);
    let mut correct = 0;

    for (i, item) in items.iter().take(total).enumerate() {
        tracing::info!("[{}/{}] {}", i + 1, total, item.question);

        let request = GenerateRequest::new(build_eval_prompt(&item.question), model)
            .with_max_tokens(128)
            .with_temperature(0.0);

        let start = Instant::now();
        let predicted = match generator.generate(&request).await {
            Ok(response) => extract_final_answer(&response.content),
            Err(e) => {
                tracing::warn!("Generation failed for item {}: {}", i + 1, e);
                String::new()
            }
        };
        let latency_ms = start.elapsed().as_millis() as u64;

        let is_correct = answers_match(&item.answer, &predicted);
        if is_correct {
            correct += 1;
        }

        results.push(EvalResult {
            question: item.question.clone(),
            expected: item.answer.clone(),
            predicted,
            correct: is_correct,
            latency_ms,
        });
    }

    let avg_latency_ms =
        results.iter().map(|r| r.latency_ms as f64).sum::<f64>() / results.len() as f64;

    Ok(EvalReport {
        total,
        correct,
        accuracy: correct as f64 / total as f64,
        avg_latency_ms,
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use matha_llm::{GenerateResponse, GenerateUsage};

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  X^2  +  C "), "x^2 + c");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn test_extract_first_option() {
        assert_eq!(extract_first_option("The answer is B"), "B");
        assert_eq!(extract_first_option("(c)"), "C");
        assert_eq!(extract_first_option("no option here"), "");
    }

    #[test]
    fn test_numeric_equal_integers_and_decimals() {
        assert!(numeric_equal("6", "6.0", 1e-3));
        assert!(numeric_equal("the result is 3.140", "3.1401", 1e-3));
        assert!(!numeric_equal("6", "7", 1e-3));
    }

    #[test]
    fn test_numeric_equal_fractions() {
        assert!(numeric_equal("1/2", "0.5", 1e-3));
        assert!(!numeric_equal("1/3", "0.5", 1e-3));
        assert!(!numeric_equal("1/0", "0.5", 1e-3));
    }

    #[test]
    fn test_numeric_equal_without_numbers() {
        assert!(!numeric_equal("no numbers", "6", 1e-3));
    }

    #[test]
    fn test_answers_match() {
        assert!(answers_match("x^2 + C", "X^2  + c"));
        assert!(answers_match("B", "option (b) is right"));
        assert!(answers_match("0.5", "so we get 1/2"));
        assert!(!answers_match("42", ""));
        assert!(!answers_match("A", "D"));
    }

    struct FixedGenerator(&'static str);

    #[async_trait::async_trait]
    impl Generator for FixedGenerator {
        fn provider_name(&self) -> &str {
            "fixed"
        }

        async fn generate(&self, request: &GenerateRequest) -> AgentResult<GenerateResponse> {
            Ok(GenerateResponse {
                content: self.0.to_string(),
                model: request.model.clone(),
                usage: GenerateUsage::default(),
            })
        }
    }

    #[tokio::test]
    async fn test_evaluate_scores_and_limits() {
        let items = vec![
            EvalItem {
                question: "What is 2 + 4?".to_string(),
                answer: "6".to_string(),
            },
            EvalItem {
                question: "What is 10 / 2?".to_string(),
                answer: "5".to_string(),
            },
            EvalItem {
                question: "Skipped by the limit".to_string(),
                answer: "0".to_string(),
            },
        ];

        let generator = FixedGenerator("Final Answer: 6");
        let report = evaluate(&generator, "test-model", &items, 2).await.unwrap();

        assert_eq!(report.total, 2);
        assert_eq!(report.correct, 1);
        assert_eq!(report.accuracy, 0.5);
        assert_eq!(report.results.len(), 2);
        assert!(report.results[0].correct);
        assert!(!report.results[1].correct);
    }

    #[tokio::test]
    async fn test_evaluate_empty_dataset_errors() {
        let generator = FixedGenerator("");
        let result = evaluate(&generator, "test-model", &[], 10).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_report_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eval_report.json");

        let report = EvalReport {
            total: 1,
            correct: 1,
            accuracy: 1.0,
            avg_latency_ms: 12.0,
            results: vec![],
        };

        write_report(&path, &report).unwrap();
        let loaded: EvalReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.total, 1);
        assert_eq!(loaded.accuracy, 1.0);
    }
}
