use thiserror::Error;

/// Maximum length for a submitted question
pub const MAX_QUESTION_LENGTH: usize = 8_000;

#[derive(Debug, Error, PartialEq)]
pub enum QuestionIssue {
    #[error("Question cannot be empty")]
    Empty,
    #[error("Question too long ({length} characters, max {MAX_QUESTION_LENGTH})")]
    TooLong { length: usize },
}

/// Validate a question before it is sent, returning the trimmed text.
pub fn validate_question(raw: &str) -> Result<&str, QuestionIssue> {
    let question = raw.trim();
    if question.is_empty() {
        return Err(QuestionIssue::Empty);
    }
    if question.len() > MAX_QUESTION_LENGTH {
        return Err(QuestionIssue::TooLong {
            length: question.len(),
        });
    }
    Ok(question)
}
