// src/question_bank_populator.rs

use crate::error::RecordError;
use crate::exams::Subject;
use crate::question_bank::*;
use crate::questions::{Provenance, insert_question};
use crate::report::ImportReport;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

/// Imports a batch into one subject.
///
/// Records are handled strictly in input order. Each one is validated and then
/// written in its own transaction, so a failure only ever costs that record.
pub async fn import_batch(
    pool: &SqlitePool,
    subject: &Subject,
    records: &[RawRecord],
    provenance: &Provenance,
) -> ImportReport {
    info!(
        "Importing {} record(s) into subject '{}'",
        records.len(),
        subject.name
    );

    let mut report = ImportReport {
        total: records.len(),
        ..Default::default()
    };

    for (idx, raw) in records.iter().enumerate() {
        let index = idx + 1;
        let outcome = match QuestionRecord::validate(raw) {
            Ok(record) => import_record(pool, subject.id, &record, provenance)
                .await
                .map(|id| (id, record)),
            Err(e) => Err(e.into()),
        };
        tally(&mut report, index, outcome);
    }

    info!(
        "Import into '{}' finished: {} created, {} failed",
        subject.name,
        report.success_count(),
        report.failure_count()
    );
    report
}

/// Writes one validated record inside a scoped transaction.
///
/// Dropping the transaction on the error path rolls back the question and any
/// options already written for it.
pub async fn import_record(
    pool: &SqlitePool,
    subject_id: i64,
    record: &QuestionRecord,
    provenance: &Provenance,
) -> Result<i64, RecordError> {
    let mut tx = pool.begin().await?;
    let id = insert_question(&mut tx, subject_id, record, provenance).await?;
    tx.commit().await?;
    Ok(id)
}

/// Folds one record's result into the report.
pub(crate) fn tally(
    report: &mut ImportReport,
    index: usize,
    outcome: Result<(i64, QuestionRecord), RecordError>,
) {
    match outcome {
        Ok((id, record)) => {
            debug!("Question {}: created as #{}", index, id);
            report.record_success(index, id, &record.question_text);
        }
        Err(e) => {
            warn!("Question {}: {} ({})", index, e, e.kind());
            report.record_failure(index, e);
        }
    }
}
