// src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// A transition whose preconditions do not hold for the current session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectedTransition {
    #[error("No poll is active")]
    NoActivePoll,

    #[error("No student name has been registered")]
    NoStudentName,

    #[error("Student is not on the roster")]
    UnknownStudent,

    #[error("Poll question is empty")]
    EmptyQuestion,

    #[error("At least 2 non-empty options are required")]
    NotEnoughOptions,

    #[error("Poll timer is not running")]
    TimerInactive,

    #[error("Poll timer has already expired")]
    TimerExpired,

    #[error("Results are already visible")]
    ResultsAlreadyVisible,

    #[error("Results are not visible yet")]
    ResultsHidden,
}

impl RejectedTransition {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoActivePoll => "no_active_poll",
            Self::NoStudentName => "no_student_name",
            Self::UnknownStudent => "unknown_student",
            Self::EmptyQuestion => "empty_question",
            Self::NotEnoughOptions => "not_enough_options",
            Self::TimerInactive => "timer_inactive",
            Self::TimerExpired => "timer_expired",
            Self::ResultsAlreadyVisible => "results_already_visible",
            Self::ResultsHidden => "results_hidden",
        }
    }
}

/// Malformed caller input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Name must not be empty")]
    EmptyName,

    #[error("Name is longer than {max} characters")]
    NameTooLong { max: usize },

    #[error("Question must not be empty")]
    EmptyQuestion,

    #[error("Question is longer than {max} characters")]
    QuestionTooLong { max: usize },

    #[error("Option {index} is longer than {max} characters")]
    OptionTooLong { index: usize, max: usize },

    #[error("Please provide at least {min} options")]
    TooFewOptions { min: usize },

    #[error("No more than {max} options are allowed")]
    TooManyOptions { max: usize },

    #[error("Time limit must be between {min} and {max} seconds")]
    TimeLimitOutOfRange { min: u32, max: u32 },

    #[error("Option index {index} is out of range for {len} options")]
    OptionOutOfRange { index: usize, len: usize },
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyName => "empty_name",
            Self::NameTooLong { .. } => "name_too_long",
            Self::EmptyQuestion => "empty_question",
            Self::QuestionTooLong { .. } => "question_too_long",
            Self::OptionTooLong { .. } => "option_too_long",
            Self::TooFewOptions { .. } => "too_few_options",
            Self::TooManyOptions { .. } => "too_many_options",
            Self::TimeLimitOutOfRange { .. } => "time_limit_out_of_range",
            Self::OptionOutOfRange { .. } => "option_out_of_range",
        }
    }
}

/// Error returned by every session transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error(transparent)]
    Rejected(#[from] RejectedTransition),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl PollError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Rejected(r) => r.code(),
            Self::Validation(v) => v.code(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Rejected(RejectedTransition::ResultsHidden) => StatusCode::FORBIDDEN,
            Self::Rejected(_) => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for PollError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.to_string(),
            "code": self.code(),
        }));
        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, PollError>;
