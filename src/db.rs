use crate::exams::{Exam, Subject};
use crate::questions::{Question, QuestionOption};
use anyhow::Context;
use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::info;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// A question together with its options, in insertion order.
#[derive(Debug)]
pub struct QuestionView {
    pub question: Question,
    pub options: Vec<QuestionOption>,
}

/// Opens (creating if needed) the database. Does not run migrations.
pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid database url: {}", database_url))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database: {}", database_url))?;

    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> anyhow::Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("Failed to apply database migrations.")?;
    info!("Database schema is up to date");
    Ok(())
}

/// Finds an exam by title or slug, ignoring case.
pub async fn fetch_exam_by_key(pool: &SqlitePool, key: &str) -> anyhow::Result<Option<Exam>> {
    let key = key.trim();
    let exam = sqlx::query_as::<_, Exam>(
        r#"
        SELECT * FROM exams
        WHERE title = ? COLLATE NOCASE OR slug = ? COLLATE NOCASE
        ORDER BY id ASC
        LIMIT 1
        "#,
    )
    .bind(key)
    .bind(key)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to look up exam: {}", key))?;

    Ok(exam)
}

/// Finds a subject by name under the given exam, ignoring case.
pub async fn fetch_subject_by_name(
    pool: &SqlitePool,
    exam_id: i64,
    name: &str,
) -> anyhow::Result<Option<Subject>> {
    let name = name.trim();
    let subject = sqlx::query_as::<_, Subject>(
        r#"
        SELECT * FROM subjects
        WHERE exam_id = ? AND name = ? COLLATE NOCASE
        ORDER BY id ASC
        LIMIT 1
        "#,
    )
    .bind(exam_id)
    .bind(name)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to look up subject '{}' for exam_id: {}", name, exam_id))?;

    Ok(subject)
}

pub async fn fetch_all_exams(pool: &SqlitePool) -> anyhow::Result<Vec<Exam>> {
    let exams = sqlx::query_as::<_, Exam>("SELECT * FROM exams ORDER BY title ASC")
        .fetch_all(pool)
        .await
        .context("Failed to fetch exams from the database.")?;

    Ok(exams)
}

/// Subjects of one exam, the list an operator picks from once the exam is chosen.
pub async fn fetch_subjects_for_exam(
    pool: &SqlitePool,
    exam_id: i64,
) -> anyhow::Result<Vec<Subject>> {
    let subjects =
        sqlx::query_as::<_, Subject>("SELECT * FROM subjects WHERE exam_id = ? ORDER BY name ASC")
            .bind(exam_id)
            .fetch_all(pool)
            .await
            .with_context(|| format!("Failed to fetch subjects for exam_id: {}", exam_id))?;

    Ok(subjects)
}

pub async fn fetch_subject_questions(
    pool: &SqlitePool,
    subject_id: i64,
) -> anyhow::Result<Vec<QuestionView>> {
    let questions = sqlx::query_as::<_, Question>(
        "SELECT * FROM questions WHERE subject_id = ? ORDER BY id ASC",
    )
    .bind(subject_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Failed to fetch questions for subject_id: {}", subject_id))?;

    let options = sqlx::query_as::<_, QuestionOption>(
        r#"
        SELECT o.*
        FROM options o
        JOIN questions q ON q.id = o.question_id
        WHERE q.subject_id = ?
        ORDER BY o.question_id ASC, o.id ASC
        "#,
    )
    .bind(subject_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Failed to fetch options for subject_id: {}", subject_id))?;

    let mut by_question: HashMap<i64, Vec<QuestionOption>> = HashMap::new();
    for option in options {
        by_question.entry(option.question_id).or_default().push(option);
    }

    Ok(questions
        .into_iter()
        .map(|question| QuestionView {
            options: by_question.remove(&question.id).unwrap_or_default(),
            question,
        })
        .collect())
}

/// Single-connection in-memory database with the schema applied.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();
    migrate(&pool).await.unwrap();
    pool
}
