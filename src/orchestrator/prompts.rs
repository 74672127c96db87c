//! Prompts for routing, fallback routing and synthesis

use crate::roles::Director;
use serde_json::Value;

/// One prior turn of the conversation
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationTurn {
    /// "user" or "assistant"
    pub role: String,
    /// Message text
    pub content: String,
}

/// Routing prompt listing every director with its remit
pub fn routing_prompt(request: &str, history: &[ConversationTurn]) -> String {
    let directors: String = Director::ALL
        .iter()
        .map(|d| format!("- {}: {}\n", d.name(), d.description()))
        .collect();
    let history = history
        .iter()
        .map(|turn| format!("{}: {}", turn.role, turn.content))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are the Master Orchestrator, an AI expert at routing user requests to the correct specialized AI Director. Your primary goal is to analyze the user's request and select the single best director to handle it from the provided list.

AVAILABLE DIRECTORS:
{directors}
USER REQUEST: \"{request}\"

CONVERSATION HISTORY:
{history}

Analyze the user's request. Your task is to select the most appropriate director to handle this request.

IMPORTANT: You MUST return a JSON object with a 'primary_director' key. The value MUST be one of the exact director names from the list above. You may optionally include 'execution_order' as a list of directors if multiple steps are needed, but 'primary_director' is mandatory."
    )
}

/// Simplified prompt used after the first routing call failed
pub fn fallback_prompt(request: &str) -> String {
    let directors = Director::ALL
        .iter()
        .map(Director::name)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "The user request is: \"{request}\". Which of the following directors is the absolute best fit to handle this request? Directors: {directors}. Respond with JSON containing only the 'primary_director' key."
    )
}

/// Synthesis prompt embedding every role result, pretty-printed
pub fn synthesis_prompt(request: &str, results: &[Value]) -> String {
    let results = results
        .iter()
        .map(|r| serde_json::to_string_pretty(r).unwrap_or_else(|_| r.to_string()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are the Master Orchestrator, a super-intelligent AI coordinating a team of specialist AIs. Your team has just executed a user's request.

USER REQUEST: \"{request}\"

EXECUTION RESULTS & ANALYSIS:
{results}

Your task is to synthesize these results into a single, clear, and friendly response for the user.
- Be conversational and direct.
- Confirm what was accomplished.
- Provide the key results or outputs directly. Don't just say 'I did it', show the result.
- If actions were taken (e.g., 'sent an email'), state it clearly.
- If relevant, suggest a next step or ask a clarifying question.
- Format your response for readability using markdown (e.g., lists, bolding)."
    )
}
