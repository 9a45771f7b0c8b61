#[derive(Debug, Clone, FromRow)]
pub struct Exam {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub time_limit_minutes: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct Subject {
    pub id: i64,
    pub exam_id: i64,
    pub name: String,
    pub description: String,
    pub created_at: NaiveDateTime,
}

/// Fields for a new exam. The slug is derived from the title when not given.
#[derive(Debug, Clone)]
pub struct NewExam {
    pub title: String,
    pub slug: Option<String>,
    pub description: String,
    pub time_limit_minutes: i64,
}

impl NewExam {
    pub fn titled(title: &str) -> Self {
        NewExam {
            title: title.trim().to_string(),
            slug: None,
            description: String::new(),
            time_limit_minutes: 120,
        }
    }

    pub async fn insert(&self, pool: &SqlitePool) -> anyhow::Result<Exam> {
        let slug = match &self.slug {
            Some(slug) => slugify(slug),
            None => slugify(&self.title),
        };
        if self.title.is_empty() || slug.is_empty() {
            anyhow::bail!("Exam title must contain at least one letter or digit.");
        }

        let id = sqlx::query(
            r#"
            INSERT INTO exams (title, slug, description, time_limit_minutes, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.title)
        .bind(&slug)
        .bind(&self.description)
        .bind(self.time_limit_minutes)
        .bind(Utc::now().naive_utc())
        .execute(pool)
        .await
        .with_context(|| format!("Failed to insert exam: {}", self.title))?
        .last_insert_rowid();

        fetch_exam(pool, id).await
    }
}

impl Exam {
    pub async fn add_subject(&self, pool: &SqlitePool, name: &str) -> anyhow::Result<Subject> {
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("Subject name cannot be empty.");
        }

        let id = sqlx::query(
            r#"
            INSERT INTO subjects (exam_id, name, description, created_at)
            VALUES (?, ?, '', ?)
            "#,
        )
        .bind(self.id)
        .bind(name)
        .bind(Utc::now().naive_utc())
        .execute(pool)
        .await
        .with_context(|| format!("Failed to add subject '{}' to exam '{}'", name, self.title))?
        .last_insert_rowid();

        let subject = sqlx::query_as::<_, Subject>("SELECT * FROM subjects WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await
            .context("Failed to read back the new subject.")?;

        Ok(subject)
    }
}

async fn fetch_exam(pool: &SqlitePool, id: i64) -> anyhow::Result<Exam> {
    sqlx::query_as::<_, Exam>("SELECT * FROM exams WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
        .with_context(|| format!("Failed to fetch exam with id: {}", id))
}

/// Lowercase ASCII words joined by single hyphens.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("JAMB"), "jamb");
        assert_eq!(slugify("  WAEC  (May/June) 2024 "), "waec-may-june-2024");
        assert_eq!(slugify("---"), "");
    }

    #[tokio::test]
    async fn exam_titles_are_unique() {
        let pool = db::test_pool().await;
        NewExam::titled("JAMB").insert(&pool).await.unwrap();
        assert!(NewExam::titled("JAMB").insert(&pool).await.is_err());
    }

    #[tokio::test]
    async fn subject_names_are_unique_per_exam() {
        let pool = db::test_pool().await;
        let jamb = NewExam::titled("JAMB").insert(&pool).await.unwrap();
        let waec = NewExam::titled("WAEC").insert(&pool).await.unwrap();

        jamb.add_subject(&pool, "Chemistry").await.unwrap();
        waec.add_subject(&pool, "Chemistry").await.unwrap();
        assert!(jamb.add_subject(&pool, "Chemistry").await.is_err());
        assert!(jamb.add_subject(&pool, "   ").await.is_err());
    }

    #[tokio::test]
    async fn names_differing_only_in_case_collide() {
        let pool = db::test_pool().await;
        let jamb = NewExam::titled("JAMB").insert(&pool).await.unwrap();
        let chemistry = jamb.add_subject(&pool, "Chemistry").await.unwrap();

        assert!(jamb.add_subject(&pool, "chemistry").await.is_err());
        assert!(NewExam::titled("jamb").insert(&pool).await.is_err());

        let found = db::fetch_subject_by_name(&pool, jamb.id, "CHEMISTRY").await.unwrap();
        assert_eq!(found.map(|s| s.id), Some(chemistry.id));
        assert_eq!(db::fetch_subjects_for_exam(&pool, jamb.id).await.unwrap().len(), 1);
    }
}

use anyhow::Context;
use chrono::{NaiveDateTime, Utc};
use sqlx::FromRow;
use sqlx::SqlitePool;
