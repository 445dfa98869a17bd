use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::models::{
    AnalysisKind, AnalysisResult, CreatePaper, Paper, PaperListResponse, PaperStatus,
    PaperStatusSummary, UpdatePaper,
};

const PAPER_SELECT: &str = r#"
    SELECT
        id,
        user_id,
        title,
        file_type,
        status,
        plagiarism_result_json,
        grammar_result_json,
        review_result_json,
        last_error,
        upload_timestamp,
        updated_at
    FROM papers
"#;

#[derive(Debug, FromRow)]
struct PaperRow {
    id: String,
    user_id: String,
    title: String,
    file_type: String,
    status: String,
    plagiarism_result_json: Option<String>,
    grammar_result_json: Option<String>,
    review_result_json: Option<String>,
    last_error: Option<String>,
    upload_timestamp: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub async fn insert_paper(
    pool: &SqlitePool,
    user_id: &str,
    input: &CreatePaper,
) -> Result<Paper, sqlx::Error> {
    let paper_id = input
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO papers (id, user_id, title, file_type, status, upload_timestamp, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&paper_id)
    .bind(user_id)
    .bind(input.title.trim())
    .bind(input.file_type.trim())
    .bind(PaperStatus::Uploaded.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    fetch_paper(pool, &paper_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn fetch_paper(pool: &SqlitePool, paper_id: &str) -> Result<Option<Paper>, sqlx::Error> {
    let sql = format!("{} WHERE id = ?", PAPER_SELECT);
    let row = sqlx::query_as::<_, PaperRow>(&sql)
        .bind(paper_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(map_paper_row))
}

pub async fn fetch_user_papers(
    pool: &SqlitePool,
    user_id: &str,
    page: i32,
    per_page: i32,
) -> Result<PaperListResponse, sqlx::Error> {
    let page = page.max(1);
    let per_page = per_page.clamp(1, 100);
    let offset = i64::from(page - 1) * i64::from(per_page);

    let sql = format!(
        "{} WHERE user_id = ? ORDER BY upload_timestamp DESC, rowid DESC LIMIT ? OFFSET ?",
        PAPER_SELECT
    );
    let rows = sqlx::query_as::<_, PaperRow>(&sql)
        .bind(user_id)
        .bind(i64::from(per_page))
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM papers WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(PaperListResponse {
        papers: rows.into_iter().map(map_paper_row).collect(),
        total,
        page,
        per_page,
    })
}

pub async fn update_paper(
    pool: &SqlitePool,
    paper_id: &str,
    update: &UpdatePaper,
) -> Result<Option<Paper>, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE papers
        SET
            title = COALESCE(?, title),
            status = COALESCE(?, status),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(update.title.as_deref().map(str::trim))
    .bind(update.status.map(PaperStatus::as_str))
    .bind(Utc::now())
    .bind(paper_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    fetch_paper(pool, paper_id).await
}

pub async fn mark_analyzing(pool: &SqlitePool, paper_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE papers SET status = ?, updated_at = ? WHERE id = ?")
        .bind(PaperStatus::Analyzing.as_str())
        .bind(Utc::now())
        .bind(paper_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Stores `result` in the column of its analysis kind and moves the paper to
/// the matching completed status.
pub async fn mark_completed(
    pool: &SqlitePool,
    paper_id: &str,
    result: &AnalysisResult,
) -> Result<(), anyhow::Error> {
    let kind = result.kind();
    let column = match kind {
        AnalysisKind::Plagiarism => "plagiarism_result_json",
        AnalysisKind::Grammar => "grammar_result_json",
        AnalysisKind::Review => "review_result_json",
    };
    let sql = format!(
        "UPDATE papers SET {} = ?, status = ?, last_error = NULL, updated_at = ? WHERE id = ?",
        column
    );

    sqlx::query(&sql)
        .bind(serde_json::to_string(result)?)
        .bind(PaperStatus::completed(kind).as_str())
        .bind(Utc::now())
        .bind(paper_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn mark_failed(
    pool: &SqlitePool,
    paper_id: &str,
    error_message: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE papers SET status = ?, last_error = ?, updated_at = ? WHERE id = ?")
        .bind(PaperStatus::Failed.as_str())
        .bind(error_message)
        .bind(Utc::now())
        .bind(paper_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn fetch_status_summary(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<PaperStatusSummary, sqlx::Error> {
    let (total, uploaded, analyzing, plagiarism_checked, grammar_checked, ai_reviewed, failed): (
        i64,
        i64,
        i64,
        i64,
        i64,
        i64,
        i64,
    ) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*) AS total,
            COALESCE(SUM(CASE WHEN status = ? THEN 1 ELSE 0 END), 0) AS uploaded,
            COALESCE(SUM(CASE WHEN status = ? THEN 1 ELSE 0 END), 0) AS analyzing,
            COALESCE(SUM(CASE WHEN status = ? THEN 1 ELSE 0 END), 0) AS plagiarism_checked,
            COALESCE(SUM(CASE WHEN status = ? THEN 1 ELSE 0 END), 0) AS grammar_checked,
            COALESCE(SUM(CASE WHEN status = ? THEN 1 ELSE 0 END), 0) AS ai_reviewed,
            COALESCE(SUM(CASE WHEN status = ? THEN 1 ELSE 0 END), 0) AS failed
        FROM papers
        WHERE user_id = ?
        "#,
    )
    .bind(PaperStatus::Uploaded.as_str())
    .bind(PaperStatus::Analyzing.as_str())
    .bind(PaperStatus::PlagiarismChecked.as_str())
    .bind(PaperStatus::GrammarChecked.as_str())
    .bind(PaperStatus::AiReviewed.as_str())
    .bind(PaperStatus::Failed.as_str())
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(PaperStatusSummary {
        total,
        uploaded,
        analyzing,
        plagiarism_checked,
        grammar_checked,
        ai_reviewed,
        failed,
    })
}

fn map_paper_row(row: PaperRow) -> Paper {
    Paper {
        id: row.id,
        user_id: row.user_id,
        title: row.title,
        file_type: row.file_type,
        status: PaperStatus::from_code(&row.status).unwrap_or(PaperStatus::Uploaded),
        upload_timestamp: row.upload_timestamp,
        updated_at: row.updated_at,
        plagiarism_result: parse_result_json(row.plagiarism_result_json),
        grammar_result: parse_result_json(row.grammar_result_json),
        review_result: parse_result_json(row.review_result_json),
        last_error: row.last_error,
    }
}

fn parse_result_json<T: DeserializeOwned>(raw: Option<String>) -> Option<T> {
    raw.and_then(|json_text| serde_json::from_str::<T>(&json_text).ok())
}
