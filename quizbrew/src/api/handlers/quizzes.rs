use axum::{Json, extract::State};
use rand::prelude::RngExt;
use rand::rng;

use crate::AppState;
use crate::api::extract::Payload;
use crate::api::models::{
    questions::QuestionResponse,
    quizzes::{QuizRequest, QuizResponse},
};
use crate::db::errors::DbError;
use crate::db::handlers::{Questions, Repository, questions::QuestionFilter};
use crate::errors::{Error, Result};

// POST /quizzes - a random question from the category that hasn't been served yet
#[tracing::instrument(skip_all)]
pub async fn next_quiz_question(
    State(state): State<AppState>,
    Payload(request): Payload<QuizRequest>,
) -> Result<Json<QuizResponse>> {
    let in_category = QuestionFilter {
        category: request.quiz_category.filter(),
        ..Default::default()
    };

    let mut tx = state
        .db
        .begin()
        .await
        .map_err(|e| Error::not_found_because("quiz question", e.into()))?;
    let mut repo = Questions::new(&mut tx);

    let total = repo
        .count(&in_category)
        .await
        .map_err(|e| Error::not_found_because("quiz question", e))?;
    if total == 0 {
        return Err(Error::not_found(format!("Questions in category {}", request.quiz_category.id)));
    }

    let candidates = in_category.excluding(request.previous_questions);
    let remaining = repo
        .count(&candidates)
        .await
        .map_err(|e| Error::not_found_because("quiz question", e))?;
    if remaining == 0 {
        return Ok(Json(QuizResponse {
            success: true,
            question: None,
        }));
    }

    let pick = QuestionFilter {
        skip: rng().random_range(0..remaining),
        limit: Some(1),
        ..candidates
    };
    let question = repo
        .list(&pick)
        .await
        .map_err(|e| Error::not_found_because("quiz question", e))?
        .into_iter()
        .next()
        .ok_or_else(|| Error::not_found_because("quiz question", DbError::NotFound))?;
    tx.commit()
        .await
        .map_err(|e| Error::not_found_because("quiz question", e.into()))?;

    Ok(Json(QuizResponse {
        success: true,
        question: Some(QuestionResponse::from(question)),
    }))
}
