use std::io::{Cursor, Read};

use quick_xml::{Reader, events::Event};
use thiserror::Error;
use tokio::task;
use zip::ZipArchive;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(
        "Unsupported file type for text extraction: {0}. Please upload a PDF, DOCX, or TXT file."
    )]
    UnsupportedMediaType(String),
    #[error("Failed to process the document: {0}")]
    ExtractionFailure(String),
}

impl ExtractError {
    fn failure(context: &str, error: impl std::fmt::Display) -> Self {
        Self::ExtractionFailure(format!("{}: {}", context, error))
    }
}

/// Converts an uploaded buffer into plain text according to its declared
/// media type. Parsing runs on the blocking pool; a parser panic surfaces
/// as an extraction failure.
pub async fn extract_text(buffer: &[u8], mime_type: &str) -> Result<String, ExtractError> {
    match mime_type {
        MIME_PDF => {
            let bytes = buffer.to_vec();
            task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
                .await
                .map_err(|error| ExtractError::failure("PDF parser aborted", error))?
                .map_err(|error| ExtractError::failure("Failed to parse PDF", error))
        }
        MIME_DOCX => {
            let bytes = buffer.to_vec();
            task::spawn_blocking(move || extract_docx_text(&bytes))
                .await
                .map_err(|error| ExtractError::failure("DOCX parser aborted", error))?
        }
        text if text.starts_with("text/") => String::from_utf8(buffer.to_vec())
            .map_err(|error| ExtractError::failure("Text file is not valid UTF-8", error)),
        other => Err(ExtractError::UnsupportedMediaType(other.to_string())),
    }
}

fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|error| ExtractError::failure("Invalid DOCX zip structure", error))?;
    let mut document_xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|error| ExtractError::failure("Missing word/document.xml in DOCX", error))?
        .read_to_string(&mut document_xml)
        .map_err(|error| ExtractError::failure("Failed to read DOCX XML", error))?;

    docx_xml_to_text(&document_xml)
}

/// Keeps the text of `w:t` runs only. Paragraphs are separated by a blank
/// line, breaks and tabs become whitespace; every other element is dropped.
fn docx_xml_to_text(document_xml: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(document_xml);

    let mut text = String::new();
    let mut in_text_run = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) if element.name().as_ref() == b"w:t" => {
                in_text_run = true;
            }
            Ok(Event::End(element)) => match element.name().as_ref() {
                b"w:t" => in_text_run = false,
                b"w:p" => text.push_str("\n\n"),
                _ => {}
            },
            Ok(Event::Empty(element)) => match element.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" | b"w:cr" => text.push('\n'),
                b"w:p" => text.push_str("\n\n"),
                _ => {}
            },
            Ok(Event::Text(event)) if in_text_run => {
                let decoded = event
                    .unescape()
                    .map_err(|error| ExtractError::failure("Failed to decode DOCX text node", error))?;
                text.push_str(&decoded);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(error) => return Err(ExtractError::failure("Failed to parse DOCX XML", error)),
        }
    }

    Ok(text.trim_end().to_string())
}
