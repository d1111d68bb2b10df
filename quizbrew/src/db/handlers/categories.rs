//! Database repository for trivia categories.

use crate::db::{errors::Result, models::categories::CategoryDBResponse};
use sqlx::SqliteConnection;
use tracing::instrument;

pub struct Categories<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Categories<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// All categories, ordered by ID
    #[instrument(skip(self), err)]
    pub async fn list(&mut self) -> Result<Vec<CategoryDBResponse>> {
        let categories = sqlx::query_as::<_, CategoryDBResponse>("SELECT id, type FROM categories ORDER BY id")
            .fetch_all(&mut *self.db)
            .await?;

        Ok(categories)
    }
}
