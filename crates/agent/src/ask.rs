//! Answer orchestration.
//!
//! The pipeline behind `ask`: validate the question, try the knowledge
//! base, branch on the similarity threshold, build the matching prompt,
//! generate, parse, run the output guardrail, and assemble the structured
//! response. Four effective states:
//! Validating → Retrieving → (RetrievalHit | Fallback) → Responding.

use crate::guardrails::ContentPolicy;
use crate::parser;
use crate::prompts;
use crate::types::{AskRequest, AskResponse};
use matha_core::{AgentConfig, AgentError, AgentResult};
use matha_llm::{GenerateRequest, Generator};
use matha_retrieval::{RetrievalHit, Retriever, WebSearch};
use std::sync::Arc;

/// The retrieval-augmented math answering agent.
///
/// Holds no cross-request state; every `ask` issues at most one retrieval
/// call, at most one web-search call (fallback only), and exactly one
/// generation call, strictly in that order. No retries.
pub struct MathAgent {
    config: AgentConfig,
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
    web_search: Arc<dyn WebSearch>,
    policy: Box<dyn ContentPolicy>,
}

impl MathAgent {
    /// Assemble the agent from its configuration and collaborators.
    pub fn new(
        config: AgentConfig,
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn Generator>,
        web_search: Arc<dyn WebSearch>,
        policy: Box<dyn ContentPolicy>,
    ) -> Self {
        Self {
            config,
            retriever,
            generator,
            web_search,
            policy,
        }
    }

    /// Answer a question.
    ///
    /// Fails with `EmptyInput`/`OffDomain` before any external call, with
    /// `UnsafeOutput` after generation, and propagates collaborator
    /// failures. A degenerate generation is absorbed into an
    /// empty-but-well-formed response.
    pub async fn ask(&self, request: &AskRequest) -> AgentResult<AskResponse> {
        // Validating
        let question = request.question.trim();
        if question.is_empty() {
            return Err(AgentError::EmptyInput);
        }
        if !self.policy.accepts_input(question) {
            tracing::info!("Input guardrail rejected question");
            return Err(AgentError::OffDomain);
        }

        // Retrieving
        let hits = self
            .retriever
            .search(question, self.config.kb_top_k)
            .await?;

        if let Some(top) = hits.first() {
            tracing::debug!(
                "Top hit {} scored {:.3} (threshold {:.3})",
                top.id,
                top.score,
                self.config.kb_threshold
            );

            // Threshold is inclusive: a hit exactly at it takes this path
            if top.score >= self.config.kb_threshold {
                return self.answer_from_hit(request, question, top).await;
            }
        } else {
            tracing::debug!("Knowledge base returned no candidates");
        }

        self.answer_from_web(request, question).await
    }

    /// RetrievalHit state: worked-example prompt, parse, substitute missing
    /// pieces from the retrieved payload.
    async fn answer_from_hit(
        &self,
        request: &AskRequest,
        question: &str,
        top: &RetrievalHit,
    ) -> AgentResult<AskResponse> {
        let prompt = prompts::build_hit_prompt(question, &top.payload, request.explain_level);
        let generated = self.generate(&prompt).await?;
        let mut parsed = parser::parse(&generated);

        // The retrieved record backs up a degenerate parse
        if parsed.steps.is_empty() && !top.payload.steps.is_empty() {
            parsed.steps = vec![top.payload.steps.clone()];
        }
        if parsed.final_answer.is_empty() {
            parsed.final_answer = top.payload.final_answer.clone();
        }

        let confidence = round3(parsed.confidence.max(top.score));

        self.respond(parsed.steps, parsed.final_answer, vec![top.id.clone()], confidence)
    }

    /// Fallback state: web-search snippets (possibly empty) feed the
    /// prompt; sources stay empty.
    async fn answer_from_web(
        &self,
        request: &AskRequest,
        question: &str,
    ) -> AgentResult<AskResponse> {
        let context = self.web_search.search(question).await?;
        if context.is_empty() {
            tracing::info!("No web context available; solving from first principles");
        }

        let prompt = prompts::build_fallback_prompt(question, &context, request.explain_level);
        let generated = self.generate(&prompt).await?;
        let parsed = parser::parse(&generated);

        let confidence = round3(parsed.confidence);

        self.respond(parsed.steps, parsed.final_answer, Vec::new(), confidence)
    }

    /// Responding state: output guardrail, then the structured response.
    fn respond(
        &self,
        steps: Vec<String>,
        final_answer: String,
        sources: Vec<String>,
        confidence: f32,
    ) -> AgentResult<AskResponse> {
        let combined = format!("{}\n{}", steps.join("\n"), final_answer);
        if !self.policy.accepts_output(&combined) {
            tracing::warn!("Output guardrail rejected generated answer");
            return Err(AgentError::UnsafeOutput);
        }

        Ok(AskResponse {
            steps,
            final_answer,
            sources,
            confidence,
        })
    }

    /// One generation call with the configured model parameters.
    async fn generate(&self, prompt: &str) -> AgentResult<String> {
        let request = GenerateRequest::new(prompt, &self.config.gen_model)
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature);

        let response = self.generator.generate(&request).await?;
        Ok(response.content)
    }
}

/// Round a confidence to 3 decimal places.
fn round3(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guardrails::KeywordPolicy;
    use crate::types::ExplainLevel;
    use matha_llm::{GenerateResponse, GenerateUsage};
    use matha_retrieval::ProblemRecord;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticRetriever {
        hits: Vec<RetrievalHit>,
        calls: AtomicUsize,
    }

    impl StaticRetriever {
        fn new(hits: Vec<RetrievalHit>) -> Self {
            Self {
                hits,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl Retriever for StaticRetriever {
        async fn search(&self, _query: &str, _top_k: usize) -> AgentResult<Vec<RetrievalHit>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.hits.clone())
        }
    }

    struct StaticGenerator {
        text: String,
        calls: AtomicUsize,
    }

    impl StaticGenerator {
        fn new(text: &str) -> Self {
            Self {
                text: text.to_string(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl Generator for StaticGenerator {
        fn provider_name(&self) -> &str {
            "static"
        }

        async fn generate(&self, request: &GenerateRequest) -> AgentResult<GenerateResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(GenerateResponse {
                content: self.text.clone(),
                model: request.model.clone(),
                usage: GenerateUsage::default(),
            })
        }
    }

    struct StaticWebSearch {
        context: String,
        calls: AtomicUsize,
    }

    impl StaticWebSearch {
        fn new(context: &str) -> Self {
            Self {
                context: context.to_string(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl WebSearch for StaticWebSearch {
        async fn search(&self, _query: &str) -> AgentResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.context.clone())
        }
    }

    fn hit(id: &str, score: f32) -> RetrievalHit {
        RetrievalHit {
            score,
            id: id.to_string(),
            payload: ProblemRecord {
                question: "Differentiate x^3".to_string(),
                steps: "1. Apply the power rule".to_string(),
                final_answer: "3x^2".to_string(),
            },
        }
    }

    fn agent(
        retriever: Arc<StaticRetriever>,
        generator: Arc<StaticGenerator>,
        web: Arc<StaticWebSearch>,
    ) -> MathAgent {
        MathAgent::new(
            AgentConfig::default(),
            retriever,
            generator,
            web,
            Box::new(KeywordPolicy::new()),
        )
    }

    #[tokio::test]
    async fn test_retrieval_hit_path() {
        let retriever = Arc::new(StaticRetriever::new(vec![hit("42", 0.91)]));
        let generator = Arc::new(StaticGenerator::new(
            "1. Apply power rule\n2. d/dx(x^3)=3x^2\nFinal Answer: 3x^2",
        ));
        let web = Arc::new(StaticWebSearch::new(""));
        let agent = agent(retriever.clone(), generator, web.clone());

        let response = agent
            .ask(&AskRequest::new("Differentiate f(x) = x^3"))
            .await
            .unwrap();

        assert_eq!(
            response.steps,
            vec!["Apply power rule", "d/dx(x^3)=3x^2"]
        );
        assert_eq!(response.final_answer, "3x^2");
        assert_eq!(response.confidence, 0.91);
        assert_eq!(response.sources, vec!["42"]);
        // The fallback search must not run on the hit path
        assert_eq!(web.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fallback_path_with_empty_web_context() {
        let retriever = Arc::new(StaticRetriever::new(vec![]));
        let generator = Arc::new(StaticGenerator::new(
            "1. Use power rule of integration.\nFinal Answer: x^2 + C",
        ));
        let web = Arc::new(StaticWebSearch::new(""));
        let agent = agent(retriever, generator, web.clone());

        let response = agent.ask(&AskRequest::new("Integrate 2x dx")).await.unwrap();

        assert_eq!(response.steps, vec!["Use power rule of integration."]);
        assert_eq!(response.final_answer, "x^2 + C");
        assert_eq!(response.confidence, 0.6);
        assert!(response.sources.is_empty());
        assert_eq!(web.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_input_fails_before_any_external_call() {
        let retriever = Arc::new(StaticRetriever::new(vec![hit("1", 0.99)]));
        let generator = Arc::new(StaticGenerator::new("Final Answer: 1"));
        let web = Arc::new(StaticWebSearch::new(""));
        let agent = agent(retriever.clone(), generator.clone(), web.clone());

        let err = agent.ask(&AskRequest::new("   ")).await.unwrap_err();

        assert!(matches!(err, AgentError::EmptyInput));
        assert_eq!(retriever.calls.load(Ordering::SeqCst), 0);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(web.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_off_domain_rejection() {
        let retriever = Arc::new(StaticRetriever::new(vec![]));
        let generator = Arc::new(StaticGenerator::new(""));
        let web = Arc::new(StaticWebSearch::new(""));
        let agent = agent(retriever.clone(), generator, web);

        let err = agent
            .ask(&AskRequest::new("Tell me a story about dragons"))
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::OffDomain));
        assert_eq!(retriever.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_threshold_boundary_is_inclusive() {
        // Score exactly at the default 0.78 threshold takes the hit path
        let retriever = Arc::new(StaticRetriever::new(vec![hit("7", 0.78)]));
        let generator = Arc::new(StaticGenerator::new("Final Answer: 3x^2"));
        let web = Arc::new(StaticWebSearch::new(""));
        let agent = agent(retriever, generator, web.clone());

        let response = agent
            .ask(&AskRequest::new("Differentiate x^3"))
            .await
            .unwrap();

        assert_eq!(response.sources, vec!["7"]);
        assert_eq!(response.confidence, 0.78);
        assert_eq!(web.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_below_threshold_falls_back() {
        let retriever = Arc::new(StaticRetriever::new(vec![hit("7", 0.779)]));
        let generator = Arc::new(StaticGenerator::new("Final Answer: 3x^2"));
        let web = Arc::new(StaticWebSearch::new("some context"));
        let agent = agent(retriever, generator, web.clone());

        let response = agent
            .ask(&AskRequest::new("Differentiate x^3"))
            .await
            .unwrap();

        assert!(response.sources.is_empty());
        assert_eq!(response.confidence, 0.6);
        assert_eq!(web.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_hit_path_substitutes_payload_on_degenerate_parse() {
        let retriever = Arc::new(StaticRetriever::new(vec![hit("9", 0.88)]));
        // Pure filler: parser yields no steps and no final answer
        let generator = Arc::new(StaticGenerator::new(
            "Sure, happy to walk you through this problem today.",
        ));
        let web = Arc::new(StaticWebSearch::new(""));
        let agent = agent(retriever, generator, web);

        let response = agent
            .ask(&AskRequest::new("Differentiate x^3"))
            .await
            .unwrap();

        assert_eq!(response.steps, vec!["1. Apply the power rule"]);
        assert_eq!(response.final_answer, "3x^2");
        assert_eq!(response.confidence, 0.88);
    }

    #[tokio::test]
    async fn test_fallback_degenerate_parse_returns_empty_fields() {
        let retriever = Arc::new(StaticRetriever::new(vec![]));
        let generator = Arc::new(StaticGenerator::new(
            "Sure, happy to walk you through this problem today.",
        ));
        let web = Arc::new(StaticWebSearch::new(""));
        let agent = agent(retriever, generator, web);

        let response = agent.ask(&AskRequest::new("Integrate 2x dx")).await.unwrap();

        assert!(response.steps.is_empty());
        assert_eq!(response.final_answer, "");
        assert_eq!(response.confidence, 0.6);
        assert!(response.sources.is_empty());
    }

    #[tokio::test]
    async fn test_unsafe_output_rejected() {
        let retriever = Arc::new(StaticRetriever::new(vec![hit("3", 0.95)]));
        let generator = Arc::new(StaticGenerator::new(
            "1. First hack the equation into parts = 2\nFinal Answer: 2",
        ));
        let web = Arc::new(StaticWebSearch::new(""));
        let agent = agent(retriever, generator, web);

        let err = agent
            .ask(&AskRequest::new("Solve the equation"))
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::UnsafeOutput));
    }

    #[tokio::test]
    async fn test_unsafe_output_rejected_on_fallback_path() {
        let retriever = Arc::new(StaticRetriever::new(vec![]));
        let generator = Arc::new(StaticGenerator::new(
            "1. This politics example = 1\nFinal Answer: 1",
        ));
        let web = Arc::new(StaticWebSearch::new(""));
        let agent = agent(retriever, generator, web);

        let err = agent
            .ask(&AskRequest::new("Solve the equation"))
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::UnsafeOutput));
    }

    #[tokio::test]
    async fn test_retrieval_failure_propagates() {
        struct FailingRetriever;

        #[async_trait::async_trait]
        impl Retriever for FailingRetriever {
            async fn search(&self, _q: &str, _k: usize) -> AgentResult<Vec<RetrievalHit>> {
                Err(AgentError::RetrievalUnavailable("connection refused".into()))
            }
        }

        let agent = MathAgent::new(
            AgentConfig::default(),
            Arc::new(FailingRetriever),
            Arc::new(StaticGenerator::new("")),
            Arc::new(StaticWebSearch::new("")),
            Box::new(KeywordPolicy::new()),
        );

        let err = agent
            .ask(&AskRequest::new("Solve x + 1 = 2"))
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::RetrievalUnavailable(_)));
    }

    #[tokio::test]
    async fn test_explain_level_threads_into_prompt() {
        struct CapturingGenerator {
            seen: std::sync::Mutex<Vec<String>>,
        }

        #[async_trait::async_trait]
        impl Generator for CapturingGenerator {
            fn provider_name(&self) -> &str {
                "capture"
            }

            async fn generate(&self, request: &GenerateRequest) -> AgentResult<GenerateResponse> {
                self.seen.lock().unwrap().push(request.prompt.clone());
                Ok(GenerateResponse {
                    content: "Final Answer: 1".to_string(),
                    model: request.model.clone(),
                    usage: GenerateUsage::default(),
                })
            }
        }

        let generator = Arc::new(CapturingGenerator {
            seen: std::sync::Mutex::new(Vec::new()),
        });
        let agent = MathAgent::new(
            AgentConfig::default(),
            Arc::new(StaticRetriever::new(vec![])),
            generator.clone(),
            Arc::new(StaticWebSearch::new("")),
            Box::new(KeywordPolicy::new()),
        );

        agent
            .ask(&AskRequest::new("Solve x = 1").with_level(ExplainLevel::Simple))
            .await
            .unwrap();

        let prompts = generator.seen.lock().unwrap();
        assert!(prompts[0].contains("short and simple"));
    }

    #[test]
    fn test_round3() {
        assert_eq!(round3(0.9114), 0.911);
        assert_eq!(round3(0.78), 0.78);
        assert_eq!(round3(0.6006), 0.601);
    }
}
