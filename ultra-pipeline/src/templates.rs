//! Pure prompt-construction helpers for Stage 2 and Stage 3. No I/O, no
//! randomness: same inputs always produce the same string.

use std::collections::BTreeMap;

const META_INSTRUCTION: &str = "You produced one of several candidate responses to the user's question. Below is the user's original prompt, then the full set of candidate responses (including your own, unlabeled). Produce an improved response that incorporates the strongest reasoning across candidates and corrects any errors. Respond with only the improved answer.";

const ULTRA_INSTRUCTION: &str = "Below is a user's question followed by multiple candidate answers produced by independent models. Synthesize a single best answer that reflects the consensus where it exists, notes substantive disagreements where they don't, and is self-contained. Respond with only the synthesized answer.";

/// `candidates` keyed by model_id so `BTreeMap` iteration order already
/// gives the sorted-by-model_id ordering both templates require.
fn build_prompt(instruction: &str, user_prompt: &str, candidates: &BTreeMap<String, String>) -> String {
    let mut prompt = String::with_capacity(instruction.len() + user_prompt.len() + 64);
    prompt.push_str(instruction);
    prompt.push_str("\n\nUser's original prompt:\n");
    prompt.push_str(user_prompt);
    prompt.push_str("\n\nCandidate responses:\n");
    for (index, text) in candidates.values().enumerate() {
        prompt.push_str(&(index + 1).to_string());
        prompt.push_str(". ");
        prompt.push_str(text);
        prompt.push('\n');
    }
    prompt
}

#[must_use]
pub fn meta_prompt(user_prompt: &str, initial_outputs: &BTreeMap<String, String>) -> String {
    build_prompt(META_INSTRUCTION, user_prompt, initial_outputs)
}

#[must_use]
pub fn ultra_prompt(user_prompt: &str, prior_outputs: &BTreeMap<String, String>) -> String {
    build_prompt(ULTRA_INSTRUCTION, user_prompt, prior_outputs)
}
