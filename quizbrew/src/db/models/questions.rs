use crate::types::{CategoryId, QuestionId};
use sqlx::FromRow;

/// Database request for creating a new question
#[derive(Debug, Clone)]
pub struct QuestionCreateDBRequest {
    pub question: String,
    pub answer: String,
    pub category: CategoryId,
    pub difficulty: i64,
}

/// Database response for a question
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct QuestionDBResponse {
    pub id: QuestionId,
    pub question: String,
    pub answer: String,
    pub category: CategoryId,
    pub difficulty: i64,
}
