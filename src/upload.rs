const PREVIEW_CHARS: usize = 50;

#[derive(Debug, Default, Deserialize)]
pub struct UploadRequest {
    #[serde(default)]
    pub exam_id: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    /// Either a number or a string in practice.
    #[serde(default)]
    pub year: Option<Value>,
    #[serde(default)]
    pub questions: Option<Value>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CreatedSummary {
    pub id: i64,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: usize,
    pub total: usize,
    pub created: Vec<CreatedSummary>,
    pub errors: Option<Vec<String>>,
    pub exam: String,
    pub year: Option<Value>,
}

impl UploadResponse {
    fn from_report(report: &ImportReport, exam: &Exam, year: Option<Value>) -> Self {
        let errors = report.failure_messages();
        UploadResponse {
            success: report.success_count(),
            total: report.total,
            created: report
                .created
                .iter()
                .map(|c| CreatedSummary {
                    id: c.id,
                    text: preview(&c.text),
                })
                .collect(),
            errors: (!errors.is_empty()).then_some(errors),
            exam: exam.title.clone(),
            year,
        }
    }
}

pub fn parse_request(text: &str) -> Result<UploadRequest, UploadError> {
    serde_json::from_str(text).map_err(|e| UploadError::InvalidPayload(e.to_string()))
}

/// Resolves the exam and default subject, then imports every record.
///
/// A record carrying its own `subject` is routed to that subject under the same exam.
pub async fn handle_upload(
    pool: &SqlitePool,
    request: UploadRequest,
    creator: Option<String>,
) -> Result<UploadResponse, UploadError> {
    let exam_key = non_blank(request.exam_id).ok_or(UploadError::MissingExam)?;
    let subject_name = non_blank(request.subject).ok_or(UploadError::MissingSubject)?;
    let questions = match request.questions {
        None | Some(Value::Null) => return Err(UploadError::MissingQuestions),
        Some(Value::Array(items)) if items.is_empty() => {
            return Err(UploadError::MissingQuestions);
        }
        Some(value) => value,
    };

    let exam = db::fetch_exam_by_key(pool, &exam_key)
        .await?
        .ok_or_else(|| UploadError::ExamNotFound(exam_key.clone()))?;
    let default_subject = db::fetch_subject_by_name(pool, exam.id, &subject_name)
        .await?
        .ok_or_else(|| UploadError::SubjectNotFound {
            subject: subject_name.clone(),
            exam: exam.title.clone(),
        })?;

    let records = records_from_value(questions)?;
    let provenance = Provenance {
        year: request.year.as_ref().and_then(year_text),
        creator,
    };

    info!(
        "Upload of {} record(s) for {} / {}",
        records.len(),
        exam.title,
        default_subject.name
    );

    let mut report = ImportReport {
        total: records.len(),
        ..Default::default()
    };
    let mut routes: HashMap<String, Option<i64>> = HashMap::new();

    for (idx, raw) in records.iter().enumerate() {
        let outcome = match QuestionRecord::validate(raw) {
            Ok(record) => {
                match route(pool, &exam, &default_subject, &record, &mut routes).await {
                    Ok(subject_id) => import_record(pool, subject_id, &record, &provenance)
                        .await
                        .map(|id| (id, record)),
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(e.into()),
        };
        tally(&mut report, idx + 1, outcome);
    }

    Ok(UploadResponse::from_report(&report, &exam, request.year))
}

async fn route(
    pool: &SqlitePool,
    exam: &Exam,
    default_subject: &Subject,
    record: &QuestionRecord,
    routes: &mut HashMap<String, Option<i64>>,
) -> Result<i64, RecordError> {
    let Some(name) = record.subject.as_deref() else {
        return Ok(default_subject.id);
    };
    if name.eq_ignore_ascii_case(&default_subject.name) {
        return Ok(default_subject.id);
    }

    let key = name.to_lowercase();
    let resolved = match routes.get(&key) {
        Some(cached) => *cached,
        None => {
            let found = db::fetch_subject_by_name(pool, exam.id, name)
                .await
                .map_err(|e| PersistenceError::Lookup(format!("{:#}", e)))?
                .map(|s| s.id);
            routes.insert(key, found);
            found
        }
    };

    resolved.ok_or_else(|| {
        RecordError::Persistence(PersistenceError::UnknownSubject {
            name: name.to_string(),
            exam: exam.title.clone(),
        })
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn year_text(year: &Value) -> Option<String> {
    match year {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        text.chars().take(PREVIEW_CHARS).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImportError;
    use crate::exams::NewExam;
    use serde_json::json;

    async fn setup() -> SqlitePool {
        let pool = db::test_pool().await;
        let exam = NewExam::titled("JAMB").insert(&pool).await.unwrap();
        exam.add_subject(&pool, "Chemistry").await.unwrap();
        exam.add_subject(&pool, "Physics").await.unwrap();
        pool
    }

    fn request(value: Value) -> UploadRequest {
        serde_json::from_value(value).unwrap()
    }

    fn q(text: &str, subject: Option<&str>) -> Value {
        let mut v = json!({
            "question_text": text,
            "options": {"A": "one", "B": "two"},
            "correct_answer": "A",
            "explanation": ""
        });
        if let Some(s) = subject {
            v["subject"] = json!(s);
        }
        v
    }

    #[tokio::test]
    async fn upload_reports_created_and_errors() {
        let pool = setup().await;
        let long = "x".repeat(60);
        let req = request(json!({
            "exam_id": "jamb",
            "subject": "chemistry",
            "year": 2024,
            "questions": [q(&long, None), {"question_text": "no options"}]
        }));

        let response = handle_upload(&pool, req, Some("admin".into())).await.unwrap();

        assert_eq!(response.success, 1);
        assert_eq!(response.total, 2);
        assert_eq!(response.exam, "JAMB");
        assert_eq!(response.year, Some(json!(2024)));
        assert_eq!(response.created[0].text, format!("{}...", "x".repeat(50)));
        assert_eq!(
            response.errors,
            Some(vec![
                "Question 2: options must be an object with at least 2 entries".to_string()
            ])
        );

        let stored = sqlx::query_scalar::<_, Option<String>>("SELECT year FROM questions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(stored.as_deref(), Some("2024"));
    }

    #[tokio::test]
    async fn records_route_by_their_own_subject() {
        let pool = setup().await;
        let req = request(json!({
            "exam_id": "JAMB",
            "subject": "Chemistry",
            "questions": [
                q("default", None),
                q("routed", Some("physics")),
                q("nowhere", Some("Biology")),
            ]
        }));

        let response = handle_upload(&pool, req, None).await.unwrap();
        assert_eq!(response.success, 2);
        assert_eq!(
            response.errors,
            Some(vec![
                "Question 3: subject \"Biology\" not found under exam \"JAMB\"".to_string()
            ])
        );

        let exam = db::fetch_exam_by_key(&pool, "JAMB").await.unwrap().unwrap();
        let physics = db::fetch_subject_by_name(&pool, exam.id, "Physics")
            .await
            .unwrap()
            .unwrap();
        let listing = db::fetch_subject_questions(&pool, physics.id).await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].question.text, "routed");
    }

    #[tokio::test]
    async fn request_level_errors() {
        let pool = setup().await;

        let missing_exam = handle_upload(&pool, request(json!({"subject": "Chemistry"})), None).await;
        assert!(matches!(missing_exam, Err(UploadError::MissingExam)));

        let missing_subject = handle_upload(&pool, request(json!({"exam_id": "JAMB"})), None).await;
        assert!(matches!(missing_subject, Err(UploadError::MissingSubject)));

        let empty = handle_upload(
            &pool,
            request(json!({"exam_id": "JAMB", "subject": "Chemistry", "questions": []})),
            None,
        )
        .await;
        assert!(matches!(empty, Err(UploadError::MissingQuestions)));

        let unknown_exam = handle_upload(
            &pool,
            request(json!({"exam_id": "NECO", "subject": "Chemistry", "questions": [q("a", None)]})),
            None,
        )
        .await;
        assert!(matches!(unknown_exam, Err(UploadError::ExamNotFound(_))));

        let unknown_subject = handle_upload(
            &pool,
            request(json!({"exam_id": "JAMB", "subject": "Art", "questions": [q("a", None)]})),
            None,
        )
        .await;
        assert!(matches!(unknown_subject, Err(UploadError::SubjectNotFound { .. })));
    }

    #[tokio::test]
    async fn non_array_questions_is_malformed() {
        let pool = setup().await;
        let req = request(json!({
            "exam_id": "JAMB",
            "subject": "Chemistry",
            "questions": q("single object", None)
        }));

        let result = handle_upload(&pool, req, None).await;
        assert!(matches!(
            result,
            Err(UploadError::Import(ImportError::MalformedInput(_)))
        ));
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM questions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn invalid_payload_text() {
        assert!(matches!(
            parse_request("[1, 2]"),
            Err(UploadError::InvalidPayload(_))
        ));
    }
}

use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::info;
use crate::db;
use crate::error::{PersistenceError, RecordError, UploadError};
use crate::exams::{Exam, Subject};
use crate::question_bank::{QuestionRecord, records_from_value};
use crate::question_bank_populator::{import_record, tally};
use crate::questions::Provenance;
use crate::report::ImportReport;
