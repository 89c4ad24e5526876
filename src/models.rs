// models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

pub const MAX_QUESTION_LEN: usize = 200;
pub const MAX_OPTION_LEN: usize = 100;
pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 6;
pub const MAX_NAME_LEN: usize = 50;
pub const MIN_TIME_LIMIT_SECS: u32 = 10;
pub const MAX_TIME_LIMIT_SECS: u32 = 600;
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Teacher,
    Student,
}

/// A multiple-choice question. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    /// Time-ordered unique id (UUID v7)
    pub id: Uuid,
    pub question: String,
    pub options: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub time_limit_seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub student_name: String,
    pub poll_id: Uuid,
    pub selected_option: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub name: String,
    pub has_voted: bool,
    pub joined_at: DateTime<Utc>,
}

/// Poll as submitted by the teacher, before trimming.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PollDraft {
    pub question: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub time_limit_seconds: Option<u32>,
}

impl PollDraft {
    pub fn new(question: impl Into<String>, options: &[&str], time_limit_seconds: u32) -> Self {
        Self {
            question: question.into(),
            options: options.iter().map(|o| o.to_string()).collect(),
            time_limit_seconds: Some(time_limit_seconds),
        }
    }

    pub fn trimmed_question(&self) -> &str {
        self.question.trim()
    }

    /// Trimmed options with blank entries dropped.
    pub fn trimmed_options(&self) -> Vec<String> {
        self.options
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Form-level checks: lengths, option count and time limit range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let question = self.trimmed_question();
        if question.is_empty() {
            return Err(ValidationError::EmptyQuestion);
        }
        if question.chars().count() > MAX_QUESTION_LEN {
            return Err(ValidationError::QuestionTooLong {
                max: MAX_QUESTION_LEN,
            });
        }

        let options = self.trimmed_options();
        if options.len() < MIN_OPTIONS {
            return Err(ValidationError::TooFewOptions { min: MIN_OPTIONS });
        }
        if options.len() > MAX_OPTIONS {
            return Err(ValidationError::TooManyOptions { max: MAX_OPTIONS });
        }
        if let Some(index) = options
            .iter()
            .position(|o| o.chars().count() > MAX_OPTION_LEN)
        {
            return Err(ValidationError::OptionTooLong {
                index,
                max: MAX_OPTION_LEN,
            });
        }

        if let Some(limit) = self.time_limit_seconds {
            if !(MIN_TIME_LIMIT_SECS..=MAX_TIME_LIMIT_SECS).contains(&limit) {
                return Err(ValidationError::TimeLimitOutOfRange {
                    min: MIN_TIME_LIMIT_SECS,
                    max: MAX_TIME_LIMIT_SECS,
                });
            }
        }

        Ok(())
    }
}

/// Trim a student name and check it against the roster limits.
pub fn validate_student_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong { max: MAX_NAME_LEN });
    }
    Ok(name.to_string())
}

#[derive(Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}

#[derive(Deserialize)]
pub struct JoinRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct VoteRequest {
    pub student_name: String,
    pub selected_option: usize,
}

/// Who is asking. Callers that are not the teacher only see tallies and
/// individual votes once results are visible.
#[derive(Debug, Default, Deserialize)]
pub struct ViewerQuery {
    #[serde(default)]
    pub role: Option<Role>,
}

impl ViewerQuery {
    pub fn is_teacher(&self) -> bool {
        self.role == Some(Role::Teacher)
    }
}
