use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use crate::api::models::categories::CategoryMap;
use crate::db::models::questions::{QuestionCreateDBRequest, QuestionDBResponse};
use crate::types::{CategoryId, QuestionId};

/// A trivia question as returned by every trivia endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionResponse {
    pub id: QuestionId,
    pub question: String,
    pub answer: String,
    pub category: CategoryId,
    pub difficulty: i64,
}

impl From<QuestionDBResponse> for QuestionResponse {
    fn from(db: QuestionDBResponse) -> Self {
        Self {
            id: db.id,
            question: db.question,
            answer: db.answer,
            category: db.category,
            difficulty: db.difficulty,
        }
    }
}

/// One page of questions plus the total size of the matching set
#[derive(Debug, Default)]
pub struct QuestionPage {
    pub questions: Vec<QuestionResponse>,
    pub total_questions: i64,
}

/// `GET /questions`
#[derive(Debug, Serialize)]
pub struct QuestionListResponse {
    pub success: bool,
    pub questions: Vec<QuestionResponse>,
    pub total_questions: i64,
    pub categories: CategoryMap,
    pub current_category: Option<CategoryId>,
}

/// `DELETE /questions/{id}`
#[derive(Debug, Serialize)]
pub struct QuestionDeletedResponse {
    pub success: bool,
    pub deleted: QuestionId,
    pub questions: Vec<QuestionResponse>,
    pub total_questions: i64,
}

/// `POST /questions` without a search term
#[derive(Debug, Serialize)]
pub struct QuestionCreatedResponse {
    pub success: bool,
    pub created: QuestionId,
    pub questions: Vec<QuestionResponse>,
    pub total_questions: i64,
}

/// `POST /questions` with a search term, and `GET /categories/{id}/questions`
#[derive(Debug, Serialize)]
pub struct FilteredQuestionsResponse {
    pub success: bool,
    pub questions: Vec<QuestionResponse>,
    pub total_questions: i64,
    pub current_category: Option<CategoryId>,
}

/// Body of `POST /questions`: a search when `searchTerm` is non-empty, otherwise a new question.
///
/// `category` and `difficulty` are accepted as numbers or numeric strings, since the web
/// frontend posts form values.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct QuestionsPostRequest {
    #[serde(rename = "searchTerm", default)]
    pub search_term: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub category: Option<CategoryId>,
    #[serde(default)]
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub difficulty: Option<i64>,
}

impl QuestionsPostRequest {
    /// The search term, if this request is a search
    pub fn search(&self) -> Option<&str> {
        self.search_term.as_deref().filter(|term| !term.is_empty())
    }

    /// The new question, if all fields are present
    pub fn into_create_request(self) -> Option<QuestionCreateDBRequest> {
        Some(QuestionCreateDBRequest {
            question: self.question?,
            answer: self.answer?,
            category: self.category?,
            difficulty: self.difficulty?,
        })
    }
}
