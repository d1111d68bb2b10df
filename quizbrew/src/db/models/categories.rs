use crate::types::CategoryId;
use sqlx::FromRow;

/// Database response for a trivia category
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CategoryDBResponse {
    pub id: CategoryId,
    #[sqlx(rename = "type")]
    pub kind: String,
}
