// src/models/question.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    Approved,
    Rejected,
    /// Reserved. Submission never produces it.
    Pending,
}

/// A community question in the voting feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,

    pub author_id: String,

    /// Display name captured at submission time.
    pub author_name: String,

    pub text: String,

    pub vote_count: u64,

    pub created_at: DateTime<Utc>,

    /// Identity ids that already voted. Order of arrival.
    #[serde(default)]
    pub voted_by: Vec<String>,

    /// Decided once by the moderation filter.
    pub status: QuestionStatus,
}

/// DTO for submitting a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitQuestionRequest {
    #[validate(length(
        min = 1,
        max = 300,
        message = "Question must be between 1 and 300 characters"
    ))]
    pub text: String,
}

/// Query parameters for the ranked feed.
#[derive(Debug, Deserialize)]
pub struct RankedParams {
    pub limit: Option<usize>,
}
