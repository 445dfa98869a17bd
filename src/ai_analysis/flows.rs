use serde_json::json;

use super::prompt::{PromptAnalysis, PromptConfig};
use crate::models::{
    GrammarResult, PaperTextInput, PlagiarismResult, ReviewResult, SuggestReviewersInput,
    SuggestReviewersOutput,
};

pub const PLAGIARISM_PROMPT: &str = "plagiarism_check";
pub const GRAMMAR_PROMPT: &str = "grammar_style_revision";
pub const REVIEW_PROMPT: &str = "paper_review";
pub const REVIEWERS_PROMPT: &str = "reviewer_suggestion";

const PLAGIARISM_TEMPLATE: &str = r#"
You are the originality checker of an academic conference. Assess the research paper below for plagiarism by comparing it with published academic work and web sources you know of.

Paper text:
{{paperText}}

Answer strictly in the requested JSON schema:
1. similarityScore: a number from 0 to 100 giving the share of the text that is likely copied. Be realistic and critical.
2. flaggedSections: exact quotes from the paper that are identical or very close to an existing source. When plagiarism is detected, give at least 3 quotes.
3. sources: for every flagged section, the matching source (URL or citation) at the same position in the list.
4. summary: a short explanation of the score and of the most significant overlaps.

If the paper appears original, keep the score below 5 and return empty flaggedSections and sources arrays.
"#;

const GRAMMAR_TEMPLATE: &str = r#"
You are an academic copy editor. Perform a complete grammar and style pass over the research paper below.

Return both of the following:
1. changes: every correction you make, covering spelling, punctuation, verb tense, sentence structure and subject-verb agreement, plus edits that improve clarity, concision, readability and academic tone. For each change give the original snippet, your suggested replacement and a short explanation.
2. improvedPaperText: the complete revised paper with every change applied. Never return a partial text.

Do not invent placeholder content. Every change must come directly from the text below.

Original paper text:
{{paperText}}
"#;

const REVIEW_TEMPLATE: &str = r#"
You are an experienced reviewer for an academic conference. Read the paper below carefully and provide:
1. summary: an overall assessment of the paper's quality, clarity, originality, structure and core contribution.
2. feedback: a numbered list of specific, actionable points the author can apply, covering clarity, organization, strength of argument, literature review, methodology and figures. The list must not be empty.

No placeholder text. Every point must relate to the actual content of the paper.

Paper text:
{{paperText}}
"#;

const REVIEWERS_TEMPLATE: &str = r#"
You help program chairs of the {{conferenceName}} conference assign reviewers.
Suggest qualified reviewers for the submission described below, covering a range of complementary expertise.

Paper abstract:
{{paperAbstract}}

Paper keywords:
{{paperKeywords}}
"#;

/// Prompt configurations shared by every request. Built once at startup and
/// handed to the dispatcher.
pub struct AnalysisRegistry {
    pub plagiarism: PromptAnalysis<PaperTextInput, PlagiarismResult>,
    pub grammar: PromptAnalysis<PaperTextInput, GrammarResult>,
    pub review: PromptAnalysis<PaperTextInput, ReviewResult>,
    pub reviewers: PromptAnalysis<SuggestReviewersInput, SuggestReviewersOutput>,
}

impl AnalysisRegistry {
    pub fn new() -> Self {
        Self {
            plagiarism: PromptAnalysis::new(plagiarism_prompt()),
            grammar: PromptAnalysis::new(grammar_prompt()),
            review: PromptAnalysis::new(review_prompt()),
            reviewers: PromptAnalysis::new(reviewers_prompt()),
        }
    }
}

impl Default for AnalysisRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn plagiarism_prompt() -> PromptConfig {
    PromptConfig {
        name: PLAGIARISM_PROMPT,
        template: PLAGIARISM_TEMPLATE,
        response_schema: json!({
            "type": "OBJECT",
            "properties": {
                "similarityScore": {
                    "type": "NUMBER",
                    "description": "Percentage (0-100) of the paper that appears non-original."
                },
                "flaggedSections": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                    "description": "Exact quotes similar to existing sources; empty when none."
                },
                "sources": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                    "description": "Source for each flagged section, aligned by index."
                },
                "summary": {
                    "type": "STRING",
                    "description": "Explanation of the score and main areas of concern."
                }
            },
            "required": ["similarityScore", "flaggedSections", "sources", "summary"]
        }),
    }
}

fn grammar_prompt() -> PromptConfig {
    PromptConfig {
        name: GRAMMAR_PROMPT,
        template: GRAMMAR_TEMPLATE,
        response_schema: json!({
            "type": "OBJECT",
            "properties": {
                "improvedPaperText": {
                    "type": "STRING",
                    "description": "The fully revised text with all corrections applied."
                },
                "changes": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "original": { "type": "STRING" },
                            "suggestion": { "type": "STRING" },
                            "explanation": { "type": "STRING" }
                        },
                        "required": ["original", "suggestion", "explanation"]
                    }
                }
            },
            "required": ["improvedPaperText", "changes"]
        }),
    }
}

fn review_prompt() -> PromptConfig {
    PromptConfig {
        name: REVIEW_PROMPT,
        template: REVIEW_TEMPLATE,
        response_schema: json!({
            "type": "OBJECT",
            "properties": {
                "summary": {
                    "type": "STRING",
                    "description": "Strengths, weaknesses and core contributions."
                },
                "feedback": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                    "description": "Numbered, actionable feedback points."
                }
            },
            "required": ["summary", "feedback"]
        }),
    }
}

fn reviewers_prompt() -> PromptConfig {
    PromptConfig {
        name: REVIEWERS_PROMPT,
        template: REVIEWERS_TEMPLATE,
        response_schema: json!({
            "type": "OBJECT",
            "properties": {
                "suggestedReviewers": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" }
                }
            },
            "required": ["suggestedReviewers"]
        }),
    }
}
