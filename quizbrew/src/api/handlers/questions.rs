use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use sqlx::SqliteConnection;

use crate::AppState;
use crate::api::extract::{IdPath, Payload};
use crate::api::models::{
    categories::category_map,
    pagination::Page,
    questions::{
        FilteredQuestionsResponse, QuestionCreatedResponse, QuestionDeletedResponse, QuestionListResponse, QuestionPage,
        QuestionResponse, QuestionsPostRequest,
    },
};
use crate::db::errors::DbError;
use crate::db::handlers::{Categories, Questions, Repository, questions::QuestionFilter};
use crate::errors::{Error, Result};
use crate::types::QuestionId;

/// Count every question matching `filter`, then load the requested page of them.
///
/// The window of `filter` is replaced by the page's; a page < 1 yields no questions.
pub async fn fetch_page(
    conn: &mut SqliteConnection,
    filter: QuestionFilter,
    page: &Page,
    per_page: i64,
) -> std::result::Result<QuestionPage, DbError> {
    let mut repo = Questions::new(conn);
    let total_questions = repo.count(&filter).await?;

    let questions = match page.window(per_page) {
        Some((skip, limit)) => {
            let filter = QuestionFilter {
                skip,
                limit: Some(limit),
                ..filter
            };
            repo.list(&filter).await?
        }
        None => Vec::new(),
    };

    Ok(QuestionPage {
        questions: questions.into_iter().map(QuestionResponse::from).collect(),
        total_questions,
    })
}

// GET /questions - one page of all questions, with the category mapping
#[tracing::instrument(skip_all)]
pub async fn list_questions(State(state): State<AppState>, Query(page): Query<Page>) -> Result<Json<QuestionListResponse>> {
    let mut tx = state.db.begin().await?;

    let listed = fetch_page(&mut tx, QuestionFilter::default(), &page, state.config.trivia.questions_per_page).await?;
    if listed.questions.is_empty() {
        return Err(Error::not_found(format!("Page {} of questions", page.page())));
    }

    let categories = Categories::new(&mut tx).list().await?;
    tx.commit().await?;

    Ok(Json(QuestionListResponse {
        success: true,
        questions: listed.questions,
        total_questions: listed.total_questions,
        categories: category_map(categories),
        current_category: None,
    }))
}

// DELETE /questions/{id} - delete a question, then return the requested page of what's left
#[tracing::instrument(skip_all, fields(question_id))]
pub async fn delete_question(
    State(state): State<AppState>,
    IdPath(question_id): IdPath<QuestionId>,
    Query(page): Query<Page>,
) -> Result<Json<QuestionDeletedResponse>> {
    tracing::Span::current().record("question_id", question_id);
    let operation = || format!("delete question {question_id}");

    let mut tx = state.db.begin().await.map_err(|e| Error::unprocessable_because(operation(), e.into()))?;

    let deleted = Questions::new(&mut tx)
        .delete(question_id)
        .await
        .map_err(|e| Error::unprocessable_because(operation(), e))?;
    if !deleted {
        return Err(Error::unprocessable_because(operation(), DbError::NotFound));
    }

    let listed = fetch_page(&mut tx, QuestionFilter::default(), &page, state.config.trivia.questions_per_page)
        .await
        .map_err(|e| Error::unprocessable_because(operation(), e))?;
    tx.commit().await.map_err(|e| Error::unprocessable_because(operation(), e.into()))?;

    Ok(Json(QuestionDeletedResponse {
        success: true,
        deleted: question_id,
        questions: listed.questions,
        total_questions: listed.total_questions,
    }))
}

// POST /questions - search by `searchTerm`, or create a question when no term is given
#[tracing::instrument(skip_all)]
pub async fn create_or_search_questions(
    State(state): State<AppState>,
    Query(page): Query<Page>,
    Payload(request): Payload<QuestionsPostRequest>,
) -> Result<Response> {
    let per_page = state.config.trivia.questions_per_page;

    if let Some(term) = request.search() {
        let mut conn = state
            .db
            .acquire()
            .await
            .map_err(|e| Error::unprocessable_because("search questions", e.into()))?;
        let filter = QuestionFilter::default().with_search(term);
        let listed = fetch_page(&mut conn, filter, &page, per_page)
            .await
            .map_err(|e| Error::unprocessable_because("search questions", e))?;

        return Ok(Json(FilteredQuestionsResponse {
            success: true,
            questions: listed.questions,
            total_questions: listed.total_questions,
            current_category: None,
        })
        .into_response());
    }

    let create = request
        .into_create_request()
        .ok_or_else(|| Error::unprocessable("create question: question, answer, category and difficulty are required"))?;

    let mut tx = state.db.begin().await.map_err(|e| Error::unprocessable_because("create question", e.into()))?;
    let created = Questions::new(&mut tx)
        .create(&create)
        .await
        .map_err(|e| Error::unprocessable_because("create question", e))?;

    let listed = fetch_page(&mut tx, QuestionFilter::default(), &page, per_page)
        .await
        .map_err(|e| Error::unprocessable_because("create question", e))?;
    tx.commit().await.map_err(|e| Error::unprocessable_because("create question", e.into()))?;

    tracing::info!(question_id = created.id, category = created.category, "question created");

    Ok(Json(QuestionCreatedResponse {
        success: true,
        created: created.id,
        questions: listed.questions,
        total_questions: listed.total_questions,
    })
    .into_response())
}
