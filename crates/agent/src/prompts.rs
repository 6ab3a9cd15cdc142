//! Prompt construction for the answer pipeline.
//!
//! Two prompt shapes: one embedding a retrieved worked example, one built
//! around web-search context (or first principles when the search came back
//! empty). Both open with the same step directive so the result parser sees
//! a predictable layout.

use crate::types::ExplainLevel;
use matha_retrieval::ProblemRecord;

/// Directive prepended to every answer prompt.
const STEP_DIRECTIVE: &str = "INSTRUCTIONS: Return numbered steps and a single 'Final Answer:' \
line. Do NOT include greetings or extra commentary. Example:\n\
1. Step one...\n2. Step two...\nFinal Answer: <expression>\n";

/// Directive for evaluation runs: one line, answer only.
pub const EVAL_DIRECTIVE: &str = "You are evaluating a math problem. Return only one line \
containing the FINAL ANSWER. Do not explain or show steps. For numeric answers, give just the \
number (e.g., 6, 1/2, 3.14). For MCQs, give the option letter (A, B, C, or D). If unsure, still \
attempt to give your best single answer.";

fn detail_instruction(level: ExplainLevel) -> &'static str {
    match level {
        ExplainLevel::Simple => "Keep the explanation short and simple.",
        ExplainLevel::Detailed => "Explain each step in detail.",
    }
}

/// Build the retrieval-hit prompt: the retrieved problem is presented as a
/// worked example for the model to adapt.
pub fn build_hit_prompt(question: &str, payload: &ProblemRecord, level: ExplainLevel) -> String {
    format!(
        "{directive}\nUse this worked example to answer: {question}\n\
         Question: {example_question}\nSteps: {example_steps}\nAnswer: {example_answer}\n\
         {detail}\nGive a step-by-step answer and a clear 'Final Answer:' line.",
        directive = STEP_DIRECTIVE,
        question = question,
        example_question = payload.question,
        example_steps = payload.steps,
        example_answer = payload.final_answer,
        detail = detail_instruction(level),
    )
}

/// Build the web-fallback prompt. With no snippets the model is told to
/// solve from first principles.
pub fn build_fallback_prompt(question: &str, context: &str, level: ExplainLevel) -> String {
    let context_block = if context.is_empty() {
        "No additional context is available; solve from first principles.".to_string()
    } else {
        format!("Context: {}", context)
    };

    format!(
        "{directive}\nStudent asked: {question}\n{context_block}\n\
         {detail}\nAnswer step-by-step with a 'Final Answer:' line.",
        directive = STEP_DIRECTIVE,
        question = question,
        context_block = context_block,
        detail = detail_instruction(level),
    )
}

/// Build the single-answer prompt used by the evaluation harness.
pub fn build_eval_prompt(question: &str) -> String {
    format!("{}\n\nQuestion: {}", EVAL_DIRECTIVE, question)
}
