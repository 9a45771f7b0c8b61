/// Whole-batch failure. Nothing in the batch is processed.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("malformed input: {0}")]
    MalformedInput(String),
}

/// One of the four structural checks a record must pass before it is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing question_text")]
    MissingQuestionText,

    #[error("options must be an object with at least 2 entries")]
    InvalidOptions,

    #[error("correct_answer not in options")]
    CorrectAnswerNotInOptions,

    #[error("missing explanation")]
    MissingExplanation,
}

/// The storage layer refused a record that passed validation.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("{0}")]
    Storage(#[from] sqlx::Error),

    #[error("subject \"{name}\" not found under exam \"{exam}\"")]
    UnknownSubject { name: String, exam: String },

    #[error("subject lookup failed: {0}")]
    Lookup(String),
}

/// Per-record failure. Accumulated in the report, never raised past the batch.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl From<sqlx::Error> for RecordError {
    fn from(e: sqlx::Error) -> Self {
        RecordError::Persistence(PersistenceError::Storage(e))
    }
}

impl RecordError {
    pub fn kind(&self) -> &'static str {
        match self {
            RecordError::Validation(_) => "ValidationError",
            RecordError::Persistence(_) => "PersistenceError",
        }
    }
}

/// Request-level failures of the programmatic upload.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid upload payload: {0}")]
    InvalidPayload(String),

    #[error("exam_id is required")]
    MissingExam,

    #[error("subject is required")]
    MissingSubject,

    #[error("questions array is required")]
    MissingQuestions,

    #[error("Exam \"{0}\" not found. Please create the exam first.")]
    ExamNotFound(String),

    #[error("Subject \"{subject}\" not found under exam \"{exam}\". Please create the subject first.")]
    SubjectNotFound { subject: String, exam: String },

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

/// Startup failures. Each one aborts before the server is launched.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("credentials in {var} could not be decoded: {reason}")]
    Decode { var: &'static str, reason: String },

    #[error("failed to write credentials to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("migrations failed: {0:#}")]
    Migration(anyhow::Error),

    #[error("failed to launch server `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

use thiserror::Error;
