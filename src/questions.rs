#[derive(Debug, Clone, FromRow)]
pub struct Question {
    pub id: i64,
    pub subject_id: i64,
    pub creator: Option<String>,
    pub text: String,
    pub year: Option<String>,
    pub explanation: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct QuestionOption {
    pub id: i64,
    pub question_id: i64,
    pub label: String,
    pub text: String,
    pub is_correct: bool,
}

/// Who and what an import is attributed to. Applied to every question in the batch.
#[derive(Debug, Clone, Default)]
pub struct Provenance {
    pub year: Option<String>,
    pub creator: Option<String>,
}

/// Writes one validated record as a question plus its options.
///
/// Runs against an open transaction; the caller decides whether to commit.
/// Returns the new question's row id.
pub async fn insert_question(
    conn: &mut SqliteConnection,
    subject_id: i64,
    record: &QuestionRecord,
    provenance: &Provenance,
) -> Result<i64, sqlx::Error> {
    let question_id = sqlx::query(
        r#"
        INSERT INTO questions (subject_id, creator, text, year, explanation, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(subject_id)
    .bind(&provenance.creator)
    .bind(&record.question_text)
    .bind(&provenance.year)
    .bind(&record.explanation)
    .bind(Utc::now().naive_utc())
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    for (label, text) in record.options.iter() {
        sqlx::query(
            r#"
            INSERT INTO options (question_id, label, text, is_correct)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(question_id)
        .bind(label)
        .bind(text)
        .bind(label == record.correct_answer.as_str())
        .execute(&mut *conn)
        .await?;
    }

    Ok(question_id)
}

use crate::question_bank::QuestionRecord;
use chrono::{NaiveDateTime, Utc};
use sqlx::FromRow;
use sqlx::SqliteConnection;
