use axum::{
    Json,
    extract::{Query, State},
};

use crate::AppState;
use crate::api::extract::IdPath;
use crate::api::handlers::questions::fetch_page;
use crate::api::models::{
    categories::{CategoriesResponse, category_map},
    pagination::Page,
    questions::FilteredQuestionsResponse,
};
use crate::db::handlers::{Categories, questions::QuestionFilter};
use crate::errors::{Error, Result};
use crate::types::CategoryId;

// GET /categories - every category as an `{id: type}` mapping
#[tracing::instrument(skip_all)]
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<CategoriesResponse>> {
    let mut conn = state.db.acquire().await?;
    let categories = Categories::new(&mut conn).list().await?;

    if categories.is_empty() {
        return Err(Error::not_found("Categories"));
    }

    Ok(Json(CategoriesResponse {
        success: true,
        categories: category_map(categories),
    }))
}

// GET /categories/{id}/questions - one page of a category's questions; an unknown category is
// just an empty list
#[tracing::instrument(skip_all, fields(category_id))]
pub async fn list_category_questions(
    State(state): State<AppState>,
    IdPath(category_id): IdPath<CategoryId>,
    Query(page): Query<Page>,
) -> Result<Json<FilteredQuestionsResponse>> {
    tracing::Span::current().record("category_id", category_id);

    let operation = || format!("list questions of category {category_id}");

    let mut conn = state
        .db
        .acquire()
        .await
        .map_err(|e| Error::unprocessable_because(operation(), e.into()))?;
    let filter = QuestionFilter::default().with_category(category_id);
    let listed = fetch_page(&mut conn, filter, &page, state.config.trivia.questions_per_page)
        .await
        .map_err(|e| Error::unprocessable_because(operation(), e))?;

    Ok(Json(FilteredQuestionsResponse {
        success: true,
        questions: listed.questions,
        total_questions: listed.total_questions,
        current_category: Some(category_id),
    }))
}
