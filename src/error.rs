/// Failures surfaced while marking a sheet.
///
/// Everything except the two load failures is recoverable: the UI shows a
/// transient notice and the session state stays as it was before the call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MarkingError {
    #[error("Invalid mark for question {question_no}: {reason}")]
    InvalidMark { question_no: String, reason: String },

    #[error("Select a question before awarding marks")]
    NoQuestionSelected,

    #[error("Page {requested} is outside 1..={total}")]
    PageOutOfRange { requested: i64, total: u32 },

    #[error("Unknown question {0}")]
    UnknownQuestion(String),

    #[error("Page is still loading")]
    NotReady,

    #[error("Failed to load answer sheet: {0}")]
    DocumentLoadFailure(String),

    #[error("Failed to load question paper: {0}")]
    QuestionPaperLoadFailure(String),
}

impl MarkingError {
    /// Load failures leave the page unusable until a manual reload.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MarkingError::DocumentLoadFailure(_) | MarkingError::QuestionPaperLoadFailure(_)
        )
    }

    pub(crate) fn invalid_mark(question_no: &str, reason: impl Into<String>) -> Self {
        MarkingError::InvalidMark {
            question_no: question_no.to_string(),
            reason: reason.into(),
        }
    }
}
