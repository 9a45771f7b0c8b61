/// Failure lines shown on a partial success before the remainder is summarised.
pub const FAILURE_DISPLAY_CAP: usize = 10;

#[derive(Debug, Clone)]
pub struct CreatedQuestion {
    /// 1-based position in the submitted batch.
    pub index: usize,
    pub id: i64,
    pub text: String,
}

#[derive(Debug)]
pub struct RecordFailure {
    /// 1-based position in the submitted batch.
    pub index: usize,
    pub error: RecordError,
}

impl fmt::Display for RecordFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Question {}: {}", self.index, self.error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The batch held no records.
    Empty,
    Complete,
    Partial,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub total: usize,
    pub created: Vec<CreatedQuestion>,
    pub failures: Vec<RecordFailure>,
}

impl ImportReport {
    pub fn record_success(&mut self, index: usize, id: i64, text: &str) {
        self.created.push(CreatedQuestion {
            index,
            id,
            text: text.to_string(),
        });
    }

    pub fn record_failure(&mut self, index: usize, error: RecordError) {
        self.failures.push(RecordFailure { index, error });
    }

    pub fn success_count(&self) -> usize {
        self.created.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn failure_messages(&self) -> Vec<String> {
        self.failures.iter().map(ToString::to_string).collect()
    }

    pub fn outcome(&self) -> Outcome {
        match (self.success_count(), self.failure_count()) {
            (0, 0) => Outcome::Empty,
            (_, 0) => Outcome::Complete,
            (0, _) => Outcome::Failed,
            _ => Outcome::Partial,
        }
    }

    /// Operator-facing messages. Partial success caps the failure list;
    /// total failure shows every line.
    pub fn notices(&self, subject_name: &str) -> Vec<Notice> {
        let mut notices = Vec::new();
        let messages = self.failure_messages();

        match self.outcome() {
            Outcome::Empty => notices.push(Notice {
                level: NoticeLevel::Warning,
                message: "No questions found in the submitted data".to_string(),
            }),
            Outcome::Complete | Outcome::Partial => {
                notices.push(Notice {
                    level: NoticeLevel::Success,
                    message: format!(
                        "Successfully created {} question(s) in {}",
                        self.success_count(),
                        subject_name
                    ),
                });
                if !messages.is_empty() {
                    let mut text = messages
                        .iter()
                        .take(FAILURE_DISPLAY_CAP)
                        .cloned()
                        .collect::<Vec<_>>()
                        .join("\n");
                    if messages.len() > FAILURE_DISPLAY_CAP {
                        text.push_str(&format!(
                            "\n\n... and {} more errors",
                            messages.len() - FAILURE_DISPLAY_CAP
                        ));
                    }
                    notices.push(Notice {
                        level: NoticeLevel::Warning,
                        message: format!("{} question(s) failed:\n{}", messages.len(), text),
                    });
                }
            }
            Outcome::Failed => notices.push(Notice {
                level: NoticeLevel::Error,
                message: format!(
                    "All {} question(s) failed:\n{}",
                    messages.len(),
                    messages.join("\n")
                ),
            }),
        }

        notices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    fn report(successes: usize, failures: usize) -> ImportReport {
        let mut report = ImportReport {
            total: successes + failures,
            ..Default::default()
        };
        for i in 0..successes {
            report.record_success(i + 1, i as i64 + 100, "q");
        }
        for i in 0..failures {
            report.record_failure(
                successes + i + 1,
                ValidationError::MissingQuestionText.into(),
            );
        }
        report
    }

    #[test]
    fn outcome_follows_counts() {
        assert_eq!(report(0, 0).outcome(), Outcome::Empty);
        assert_eq!(report(3, 0).outcome(), Outcome::Complete);
        assert_eq!(report(2, 1).outcome(), Outcome::Partial);
        assert_eq!(report(0, 4).outcome(), Outcome::Failed);
    }

    #[test]
    fn failure_lines_name_the_input_position() {
        let r = report(1, 1);
        assert_eq!(r.failure_messages(), vec!["Question 2: missing question_text"]);
    }

    #[test]
    fn partial_success_caps_the_failure_list() {
        let r = report(1, 13);
        let notices = r.notices("Chemistry");
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].level, NoticeLevel::Success);
        assert_eq!(notices[0].message, "Successfully created 1 question(s) in Chemistry");

        let warning = &notices[1];
        assert_eq!(warning.level, NoticeLevel::Warning);
        assert!(warning.message.starts_with("13 question(s) failed:\n"));
        assert!(warning.message.contains("Question 11:"));
        assert!(!warning.message.contains("Question 12:"));
        assert!(warning.message.ends_with("... and 3 more errors"));
    }

    #[test]
    fn total_failure_lists_everything() {
        let r = report(0, 12);
        let notices = r.notices("Physics");
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert!(notices[0].message.contains("Question 12:"));
        assert!(!notices[0].message.contains("more errors"));
    }

    #[test]
    fn full_success_has_no_warning() {
        let notices = report(5, 0).notices("Biology");
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Success);
    }
}

use std::fmt;
use crate::error::RecordError;
