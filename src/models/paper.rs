use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::analysis::{AnalysisKind, GrammarResult, PlagiarismResult, ReviewResult};

pub const PAPER_STATUS_UPLOADED: &str = "Uploaded";
pub const PAPER_STATUS_ANALYZING: &str = "Analyzing";
pub const PAPER_STATUS_PLAGIARISM_CHECKED: &str = "Plagiarism Checked";
pub const PAPER_STATUS_GRAMMAR_CHECKED: &str = "Grammar Checked";
pub const PAPER_STATUS_AI_REVIEWED: &str = "AI Reviewed";
pub const PAPER_STATUS_FAILED: &str = "Failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperStatus {
    #[serde(rename = "Uploaded")]
    Uploaded,
    #[serde(rename = "Analyzing")]
    Analyzing,
    #[serde(rename = "Plagiarism Checked")]
    PlagiarismChecked,
    #[serde(rename = "Grammar Checked")]
    GrammarChecked,
    #[serde(rename = "AI Reviewed")]
    AiReviewed,
    #[serde(rename = "Failed")]
    Failed,
}

impl PaperStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uploaded => PAPER_STATUS_UPLOADED,
            Self::Analyzing => PAPER_STATUS_ANALYZING,
            Self::PlagiarismChecked => PAPER_STATUS_PLAGIARISM_CHECKED,
            Self::GrammarChecked => PAPER_STATUS_GRAMMAR_CHECKED,
            Self::AiReviewed => PAPER_STATUS_AI_REVIEWED,
            Self::Failed => PAPER_STATUS_FAILED,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            PAPER_STATUS_UPLOADED => Some(Self::Uploaded),
            PAPER_STATUS_ANALYZING => Some(Self::Analyzing),
            PAPER_STATUS_PLAGIARISM_CHECKED => Some(Self::PlagiarismChecked),
            PAPER_STATUS_GRAMMAR_CHECKED => Some(Self::GrammarChecked),
            PAPER_STATUS_AI_REVIEWED => Some(Self::AiReviewed),
            PAPER_STATUS_FAILED => Some(Self::Failed),
            _ => None,
        }
    }

    /// Status a paper lands in once an analysis of `kind` has been stored.
    pub fn completed(kind: AnalysisKind) -> Self {
        match kind {
            AnalysisKind::Plagiarism => Self::PlagiarismChecked,
            AnalysisKind::Grammar => Self::GrammarChecked,
            AnalysisKind::Review => Self::AiReviewed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub file_type: String,
    pub status: PaperStatus,
    pub upload_timestamp: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plagiarism_result: Option<PlagiarismResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grammar_result: Option<GrammarResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_result: Option<ReviewResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperListResponse {
    pub papers: Vec<Paper>,
    pub total: i64,
    pub page: i32,
    pub per_page: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaper {
    pub id: Option<String>,
    pub title: String,
    pub file_type: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdatePaper {
    pub title: Option<String>,
    pub status: Option<PaperStatus>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PaperQuery {
    pub page: Option<i32>,
    pub per_page: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzePaperRequest {
    pub data_uri: Option<String>,
    pub analysis_type: AnalysisKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PaperStatusSummary {
    pub total: i64,
    pub uploaded: i64,
    pub analyzing: i64,
    pub plagiarism_checked: i64,
    pub grammar_checked: i64,
    pub ai_reviewed: i64,
    pub failed: i64,
}
