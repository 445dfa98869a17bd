use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Plagiarism,
    Grammar,
    Review,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 3] = [Self::Plagiarism, Self::Grammar, Self::Review];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plagiarism => "plagiarism",
            Self::Grammar => "grammar",
            Self::Review => "review",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAnalysisKind(pub String);

impl FromStr for AnalysisKind {
    type Err = UnknownAnalysisKind;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "plagiarism" => Ok(Self::Plagiarism),
            "grammar" => Ok(Self::Grammar),
            "review" => Ok(Self::Review),
            other => Err(UnknownAnalysisKind(other.to_string())),
        }
    }
}

/// One analysis call. `analysis_type` stays a raw string so that callers
/// outside the HTTP layer can still hand in an unrecognized kind.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub file_data_uri: Option<String>,
    pub analysis_type: String,
    pub paper_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperTextInput {
    pub paper_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlagiarismResult {
    pub similarity_score: f64,
    pub flagged_sections: Vec<String>,
    pub sources: Vec<String>,
    pub summary: String,
}

impl PlagiarismResult {
    /// Returns `(flagged, sources)` lengths when flagged quotes are present
    /// but not paired one-to-one with a source.
    pub fn misaligned_sources(&self) -> Option<(usize, usize)> {
        let flagged = self.flagged_sections.len();
        let sources = self.sources.len();
        (flagged > 0 && flagged != sources).then_some((flagged, sources))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarChange {
    pub original: String,
    pub suggestion: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarResult {
    pub improved_paper_text: String,
    pub changes: Vec<GrammarChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewResult {
    pub summary: String,
    pub feedback: Vec<String>,
}

/// Serialized without a tag: the HTTP response carries the raw result shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Plagiarism(PlagiarismResult),
    Grammar(GrammarResult),
    Review(ReviewResult),
}

impl AnalysisResult {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            Self::Plagiarism(_) => AnalysisKind::Plagiarism,
            Self::Grammar(_) => AnalysisKind::Grammar,
            Self::Review(_) => AnalysisKind::Review,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum AnalysisOutcome {
    Success { analysis_result: AnalysisResult },
    Failure { error: String },
}

impl AnalysisOutcome {
    #[cfg(test)]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error } => Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestReviewersInput {
    pub paper_abstract: String,
    pub paper_keywords: String,
    pub conference_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestReviewersOutput {
    pub suggested_reviewers: Vec<String>,
}
