//! Database repository for trivia questions.

use crate::db::errors::Result;
use crate::db::handlers::repository::Repository;
use crate::db::models::questions::{QuestionCreateDBRequest, QuestionDBResponse};
use crate::types::{CategoryId, QuestionId};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;

const COLUMNS: &str = "id, question, answer, category, difficulty";

/// Filter for listing questions.
///
/// Every condition is optional; the window is applied after ordering by ID. A `limit` of `None`
/// returns every match from `skip` onwards.
#[derive(Debug, Clone, Default)]
pub struct QuestionFilter {
    pub skip: i64,
    pub limit: Option<i64>,
    pub category: Option<CategoryId>,
    /// Case-insensitive substring of the question text, matched literally with Unicode case folding
    pub search: Option<String>,
    pub exclude: Vec<QuestionId>,
}

impl QuestionFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit: Some(limit),
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn excluding(mut self, ids: Vec<QuestionId>) -> Self {
        self.exclude = ids;
        self
    }

    // Search is not pushed down: SQLite's lower() only folds ASCII
    fn push_conditions(&self, query: &mut QueryBuilder<'_, Sqlite>) {
        if let Some(category) = self.category {
            query.push(" AND category = ");
            query.push_bind(category);
        }

        if !self.exclude.is_empty() {
            query.push(" AND id NOT IN (");
            let mut ids = query.separated(", ");
            for id in &self.exclude {
                ids.push_bind(*id);
            }
            ids.push_unseparated(")");
        }
    }
}

pub struct Questions<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Questions<'c> {
    type CreateRequest = QuestionCreateDBRequest;
    type Response = QuestionDBResponse;
    type Id = QuestionId;
    type Filter = QuestionFilter;

    #[instrument(skip(self, request), fields(category = request.category, difficulty = request.difficulty), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let question = sqlx::query_as::<_, QuestionDBResponse>(&format!(
            "INSERT INTO questions (question, answer, category, difficulty) VALUES (?, ?, ?, ?) RETURNING {COLUMNS}"
        ))
        .bind(&request.question)
        .bind(&request.answer)
        .bind(request.category)
        .bind(request.difficulty)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(question)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let question = sqlx::query_as::<_, QuestionDBResponse>(&format!("SELECT {COLUMNS} FROM questions WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(question)
    }

    #[instrument(skip(self, filter), fields(skip = filter.skip, limit = ?filter.limit, category = ?filter.category), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        if let Some(ref term) = filter.search {
            let skip = usize::try_from(filter.skip.max(0)).unwrap_or(usize::MAX);
            let limit = filter.limit.and_then(|l| usize::try_from(l).ok()).unwrap_or(usize::MAX);
            let matches = self.search(filter, term).await?;
            return Ok(matches.into_iter().skip(skip).take(limit).collect());
        }

        let mut query = QueryBuilder::new(format!("SELECT {COLUMNS} FROM questions WHERE 1=1"));
        filter.push_conditions(&mut query);

        // SQLite only accepts OFFSET after a LIMIT; -1 means unbounded
        query.push(" ORDER BY id LIMIT ");
        query.push_bind(filter.limit.unwrap_or(-1));
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let questions = query.build_query_as::<QuestionDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(questions)
    }

    #[instrument(skip(self, filter), fields(category = ?filter.category), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        if let Some(ref term) = filter.search {
            let matches = self.search(filter, term).await?;
            return Ok(matches.len() as i64);
        }

        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM questions WHERE 1=1");
        filter.push_conditions(&mut query);

        let count: (i64,) = query.build_query_as().fetch_one(&mut *self.db).await?;
        Ok(count.0)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM questions WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

}

impl<'c> Questions<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Every question matching the filter's SQL conditions whose text contains `term`, compared
    /// with Unicode lowercasing on both sides. The filter's window is ignored.
    async fn search(&mut self, filter: &QuestionFilter, term: &str) -> Result<Vec<QuestionDBResponse>> {
        let mut query = QueryBuilder::new(format!("SELECT {COLUMNS} FROM questions WHERE 1=1"));
        filter.push_conditions(&mut query);
        query.push(" ORDER BY id");

        let needle = term.to_lowercase();
        let questions = query.build_query_as::<QuestionDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(questions
            .into_iter()
            .filter(|q| q.question.to_lowercase().contains(&needle))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::DbError;
    use sqlx::SqlitePool;

    fn create_request(question: &str, category: CategoryId) -> QuestionCreateDBRequest {
        QuestionCreateDBRequest {
            question: question.to_string(),
            answer: format!("Answer to {question}"),
            category,
            difficulty: 2,
        }
    }

    async fn seed(pool: &SqlitePool, questions: &[(&str, CategoryId)]) -> Vec<QuestionDBResponse> {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Questions::new(&mut conn);
        let mut created = Vec::new();
        for (text, category) in questions {
            created.push(repo.create(&create_request(text, *category)).await.unwrap());
        }
        created
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get_by_id(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Questions::new(&mut conn);

        let created = repo.create(&create_request("What is the boiling point of water?", 1)).await.unwrap();
        assert_eq!(created.category, 1);
        assert_eq!(created.difficulty, 2);

        let fetched = repo.get_by_id(created.id).await.unwrap().expect("question was just created");
        assert_eq!(fetched, created);
        assert!(repo.get_by_id(created.id + 100).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_with_unknown_category_is_foreign_key_violation(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Questions::new(&mut conn);

        let err = repo.create(&create_request("Orphan?", 42)).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }), "got {err:?}");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_windows_concatenate_to_full_ordered_set(pool: SqlitePool) {
        let texts: Vec<String> = (0..23).map(|i| format!("Question {i}")).collect();
        let seeded = seed(&pool, &texts.iter().map(|t| (t.as_str(), 1)).collect::<Vec<_>>()).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Questions::new(&mut conn);

        let mut collected = Vec::new();
        for page in 0..3 {
            let window = repo.list(&QuestionFilter::new(page * 10, 10)).await.unwrap();
            assert!(window.len() <= 10);
            collected.extend(window);
        }
        assert_eq!(collected, seeded);

        let beyond = repo.list(&QuestionFilter::new(30, 10)).await.unwrap();
        assert!(beyond.is_empty());
        assert_eq!(repo.count(&QuestionFilter::new(30, 10)).await.unwrap(), 23);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_search_is_case_insensitive_and_literal(pool: SqlitePool) {
        seed(
            &pool,
            &[
                ("What is the largest lake in Africa?", 3),
                ("Which LAKE is the deepest?", 3),
                ("Who discovered penicillin?", 1),
                ("What does 100% mean?", 1),
                ("Where is the ÉCOLE Polytechnique?", 3),
            ],
        )
        .await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Questions::new(&mut conn);

        let filter = QuestionFilter::default().with_search("lAkE");
        let matches = repo.list(&filter).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(repo.count(&filter).await.unwrap(), 2);

        // A bare LIKE wildcard must not match everything
        let filter = QuestionFilter::default().with_search("%");
        let matches = repo.list(&filter).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert!(matches[0].question.contains("100%"));

        // Folding is not limited to ASCII
        let filter = QuestionFilter::default().with_search("école");
        assert_eq!(repo.count(&filter).await.unwrap(), 1);

        let filter = QuestionFilter::default().with_search("zebra");
        assert!(repo.list(&filter).await.unwrap().is_empty());
        assert_eq!(repo.count(&filter).await.unwrap(), 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_category_and_exclusion_filters(pool: SqlitePool) {
        let seeded = seed(&pool, &[("Art one", 2), ("Science one", 1), ("Art two", 2), ("Art three", 2)]).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Questions::new(&mut conn);

        let art = repo.list(&QuestionFilter::default().with_category(2)).await.unwrap();
        assert_eq!(art.len(), 3);
        assert!(art.iter().all(|q| q.category == 2));

        let remaining = repo
            .list(&QuestionFilter::default().with_category(2).excluding(vec![seeded[0].id, seeded[2].id]))
            .await
            .unwrap();
        assert_eq!(remaining, vec![seeded[3].clone()]);

        // Excluded ids outside the category are irrelevant
        let all_but_science = repo.list(&QuestionFilter::default().excluding(vec![seeded[1].id])).await.unwrap();
        assert_eq!(all_but_science.len(), 3);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete(pool: SqlitePool) {
        let seeded = seed(&pool, &[("Doomed?", 4)]).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Questions::new(&mut conn);

        assert!(repo.delete(seeded[0].id).await.unwrap());
        assert!(repo.get_by_id(seeded[0].id).await.unwrap().is_none());
        assert!(!repo.delete(seeded[0].id).await.unwrap());
    }
}
