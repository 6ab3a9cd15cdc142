//! Request and response types for the answer pipeline.

use serde::{Deserialize, Serialize};

/// How much explanation the student wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplainLevel {
    /// Short, essential steps only
    Simple,

    /// Full working with reasoning per step
    #[default]
    Detailed,
}

impl ExplainLevel {
    /// Parse a level name ("simple" | "detailed"), case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "simple" => Some(Self::Simple),
            "detailed" => Some(Self::Detailed),
            _ => None,
        }
    }
}

/// An incoming question. Created per request, discarded after the response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    /// The question text
    pub question: String,

    /// Explanation-detail preference
    #[serde(default)]
    pub explain_level: ExplainLevel,

    /// Optional user identifier (used for feedback attribution only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl AskRequest {
    /// Create a request with the default detail level.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            explain_level: ExplainLevel::default(),
            user_id: None,
        }
    }

    /// Set the explanation-detail preference.
    pub fn with_level(mut self, level: ExplainLevel) -> Self {
        self.explain_level = level;
        self
    }

    /// Attach a user identifier.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// The structured answer.
///
/// `steps` and `sources` are always present: empty lists, never null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    /// Ordered presentation steps
    pub steps: Vec<String>,

    /// Final answer (may be empty when the generation was degenerate)
    pub final_answer: String,

    /// Knowledge-base record ids backing the answer; empty on the
    /// web-fallback path
    pub sources: Vec<String>,

    /// Heuristic confidence in [0, 1], not a calibrated probability
    pub confidence: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explain_level_parse() {
        assert_eq!(ExplainLevel::parse("simple"), Some(ExplainLevel::Simple));
        assert_eq!(ExplainLevel::parse("Detailed"), Some(ExplainLevel::Detailed));
        assert_eq!(ExplainLevel::parse("verbose"), None);
    }

    #[test]
    fn test_default_level_is_detailed() {
        let request = AskRequest::new("Solve x + 1 = 2");
        assert_eq!(request.explain_level, ExplainLevel::Detailed);
        assert!(request.user_id.is_none());
    }

    #[test]
    fn test_request_deserialization_defaults() {
        let request: AskRequest =
            serde_json::from_str(r#"{"question": "Integrate 2x dx"}"#).unwrap();
        assert_eq!(request.explain_level, ExplainLevel::Detailed);
    }

    #[test]
    fn test_response_serializes_empty_lists() {
        let response = AskResponse {
            steps: vec![],
            final_answer: String::new(),
            sources: vec![],
            confidence: 0.6,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert!(json["steps"].as_array().unwrap().is_empty());
        assert!(json["sources"].as_array().unwrap().is_empty());
    }
}
