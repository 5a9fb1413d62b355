pub mod config;
pub mod session;
pub mod text;
pub mod validation;

pub use config::AppConfig;
pub use session::{
    run_session, ChatSession, SessionCommand, SessionEvent, SessionPhase, TURN_ERROR_TEXT,
};
pub use text::{clean_for_speech, normalize_display};
pub use validation::{validate_question, QuestionIssue, MAX_QUESTION_LENGTH};
