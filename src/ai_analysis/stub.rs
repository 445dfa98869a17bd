use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use super::flows::{GRAMMAR_PROMPT, PLAGIARISM_PROMPT, REVIEW_PROMPT, REVIEWERS_PROMPT};
use super::prompt::{LlmCapability, PromptConfig};

enum Canned {
    Output(Value),
    Empty,
    Fail(String),
}

/// Deterministic capability for tests: canned answers per prompt name and a
/// record of every call.
#[derive(Default)]
pub struct StubCapability {
    responses: HashMap<&'static str, Canned>,
    calls: Mutex<Vec<(&'static str, Value)>>,
}

impl StubCapability {
    /// Valid answers for every registered prompt.
    pub fn canned() -> Self {
        Self::default()
            .respond(
                PLAGIARISM_PROMPT,
                json!({
                    "similarityScore": 12.5,
                    "flaggedSections": ["We propose a novel method", "Results were significant", "Prior work shows"],
                    "sources": ["doi:10.1000/1", "doi:10.1000/2", "https://example.org/paper"],
                    "summary": "Minor overlap with prior publications."
                }),
            )
            .respond(
                GRAMMAR_PROMPT,
                json!({
                    "improvedPaperText": "Hello, world.",
                    "changes": [{
                        "original": "Hello world",
                        "suggestion": "Hello, world.",
                        "explanation": "Added comma and final period"
                    }]
                }),
            )
            .respond(
                REVIEW_PROMPT,
                json!({
                    "summary": "A concise but thin contribution.",
                    "feedback": ["1. Add an evaluation section.", "2. Cite related work."]
                }),
            )
            .respond(
                REVIEWERS_PROMPT,
                json!({ "suggestedReviewers": ["Ada Lovelace", "Alan Turing"] }),
            )
    }

    pub fn respond(mut self, prompt: &'static str, output: Value) -> Self {
        self.responses.insert(prompt, Canned::Output(output));
        self
    }

    pub fn respond_empty(mut self, prompt: &'static str) -> Self {
        self.responses.insert(prompt, Canned::Empty);
        self
    }

    pub fn fail(mut self, prompt: &'static str, message: &str) -> Self {
        self.responses.insert(prompt, Canned::Fail(message.to_string()));
        self
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, prompt: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| *name == prompt)
            .count()
    }

    pub fn last_input(&self, prompt: &str) -> Option<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(name, _)| *name == prompt)
            .map(|(_, input)| input.clone())
    }
}

#[async_trait]
impl LlmCapability for StubCapability {
    async fn invoke(
        &self,
        prompt: &PromptConfig,
        input: &Value,
    ) -> Result<Option<Value>, anyhow::Error> {
        self.calls.lock().unwrap().push((prompt.name, input.clone()));
        match self.responses.get(prompt.name) {
            Some(Canned::Output(output)) => Ok(Some(output.clone())),
            Some(Canned::Empty) => Ok(None),
            Some(Canned::Fail(message)) => Err(anyhow::anyhow!("{}", message)),
            None => Err(anyhow::anyhow!("no canned response for {}", prompt.name)),
        }
    }
}
