use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        identity::Identity,
        question::{QuestionStatus, RankedParams, SubmitQuestionRequest},
    },
    services::questions::{QuestionStore, TOP_QUESTIONS},
};

/// Approved questions, most votes first. The top five unless `limit` says otherwise.
pub async fn list_ranked(
    State(questions): State<Arc<QuestionStore>>,
    Query(params): Query<RankedParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(TOP_QUESTIONS);
    Ok(Json(questions.ranked(Some(limit)).await))
}

/// Submit a question. Rejected text is still stored, and answered with 422.
pub async fn submit_question(
    State(questions): State<Arc<QuestionStore>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<SubmitQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let question = questions.submit(&payload.text, &identity).await?;
    if question.status == QuestionStatus::Rejected {
        return Err(AppError::ModerationRejected(
            "Your question contains inappropriate language".to_string(),
        ));
    }

    Ok((StatusCode::CREATED, Json(question)))
}

/// Vote once; repeats leave the count unchanged.
pub async fn vote_question(
    State(questions): State<Arc<QuestionStore>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(questions.vote(&id, &identity.id).await?))
}
