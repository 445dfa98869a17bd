pub mod extract;
pub mod flows;
pub mod gemini;
pub mod prompt;
#[cfg(test)]
pub mod stub;

use std::sync::Arc;

use base64::{
    Engine, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use thiserror::Error;

use crate::models::{
    AnalysisKind, AnalysisOutcome, AnalysisRequest, AnalysisResult, PaperTextInput,
    SuggestReviewersInput, SuggestReviewersOutput, UnknownAnalysisKind,
};

pub use extract::extract_text;
pub use flows::AnalysisRegistry;
pub use gemini::GeminiClient;
pub use prompt::LlmCapability;

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Standard alphabet; padding is optional on decode and stray low bits in the
/// last symbol are ignored.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("File data URI is missing.")]
    MissingDataUri,
    #[error("Invalid data URI format.")]
    InvalidDataUri,
    #[error(
        "Could not extract text from the provided file. The file might be empty, corrupted, or an unsupported format."
    )]
    Extraction,
    #[error("Unknown analysis type: {0}")]
    UnknownAnalysisType(String),
    #[error("{0:#}")]
    Upstream(anyhow::Error),
    #[error("{0} returned no structured output")]
    EmptyOutput(&'static str),
    #[error("{prompt} returned output that does not match its schema: {message}")]
    MalformedOutput {
        prompt: &'static str,
        message: String,
    },
}

impl From<UnknownAnalysisKind> for AnalysisError {
    fn from(unknown: UnknownAnalysisKind) -> Self {
        Self::UnknownAnalysisType(unknown.0)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct DecodedDataUri {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Splits `data:<mime>;base64,<payload>` on the first comma and decodes the
/// payload. The MIME type falls back to `application/octet-stream`.
pub fn decode_data_uri(data_uri: &str) -> Result<DecodedDataUri, AnalysisError> {
    let (header, payload) = data_uri
        .split_once(',')
        .ok_or(AnalysisError::InvalidDataUri)?;
    if header.is_empty() || payload.is_empty() {
        return Err(AnalysisError::InvalidDataUri);
    }

    let mime_type = header
        .split(';')
        .next()
        .and_then(|media| media.split(':').nth(1))
        .map(str::trim)
        .filter(|mime| !mime.is_empty())
        .unwrap_or(DEFAULT_MIME_TYPE)
        .to_string();

    // Payloads may arrive line-wrapped.
    let payload: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if payload.is_empty() {
        return Err(AnalysisError::InvalidDataUri);
    }

    let bytes = BASE64
        .decode(payload.as_bytes())
        .map_err(|_| AnalysisError::InvalidDataUri)?;

    Ok(DecodedDataUri { mime_type, bytes })
}

/// Entry point of the analysis core. Cheap to clone; holds no mutable state.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<AnalysisRegistry>,
    llm: Arc<dyn LlmCapability>,
}

impl Dispatcher {
    pub fn new(registry: Arc<AnalysisRegistry>, llm: Arc<dyn LlmCapability>) -> Self {
        Self { registry, llm }
    }

    /// Never fails: every error becomes the `Failure` outcome.
    pub async fn analyze(&self, request: &AnalysisRequest) -> AnalysisOutcome {
        match self.try_analyze(request).await {
            Ok(analysis_result) => {
                tracing::info!(
                    paper_id = request.paper_id.as_deref().unwrap_or("-"),
                    analysis_type = %request.analysis_type,
                    "Analysis completed"
                );
                AnalysisOutcome::Success { analysis_result }
            }
            Err(error) => {
                tracing::error!(
                    paper_id = request.paper_id.as_deref().unwrap_or("-"),
                    analysis_type = %request.analysis_type,
                    "Analysis failed: {}",
                    error
                );
                AnalysisOutcome::Failure {
                    error: error.to_string(),
                }
            }
        }
    }

    async fn try_analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        let data_uri = request
            .file_data_uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
            .ok_or(AnalysisError::MissingDataUri)?;

        let decoded = decode_data_uri(data_uri)?;
        tracing::debug!(
            mime_type = %decoded.mime_type,
            bytes = decoded.bytes.len(),
            "Decoded data URI"
        );

        let paper_text = match extract_text(&decoded.bytes, &decoded.mime_type).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                tracing::warn!(mime_type = %decoded.mime_type, "Extracted text is empty");
                return Err(AnalysisError::Extraction);
            }
            Err(error) => {
                tracing::warn!(mime_type = %decoded.mime_type, "Text extraction failed: {}", error);
                return Err(AnalysisError::Extraction);
            }
        };

        let kind: AnalysisKind = request.analysis_type.parse()?;
        self.run(kind, paper_text).await
    }

    /// Runs one analysis kind on already extracted text.
    pub async fn run(
        &self,
        kind: AnalysisKind,
        paper_text: String,
    ) -> Result<AnalysisResult, AnalysisError> {
        let input = PaperTextInput { paper_text };
        let llm = self.llm.as_ref();

        match kind {
            AnalysisKind::Plagiarism => {
                let result = self.registry.plagiarism.run(llm, &input).await?;
                if let Some((flagged, sources)) = result.misaligned_sources() {
                    tracing::warn!(
                        flagged,
                        sources,
                        "Plagiarism result has flagged sections without a matching source"
                    );
                }
                Ok(AnalysisResult::Plagiarism(result))
            }
            AnalysisKind::Grammar => Ok(AnalysisResult::Grammar(
                self.registry.grammar.run(llm, &input).await?,
            )),
            AnalysisKind::Review => Ok(AnalysisResult::Review(
                self.registry.review.run(llm, &input).await?,
            )),
        }
    }

    pub async fn suggest_reviewers(
        &self,
        input: &SuggestReviewersInput,
    ) -> Result<SuggestReviewersOutput, AnalysisError> {
        self.registry.reviewers.run(self.llm.as_ref(), input).await
    }
}
