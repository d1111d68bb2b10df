//! Database repository for coffee-shop drinks.

use crate::db::errors::{DbError, Result};
use crate::db::handlers::repository::Repository;
use crate::db::models::drinks::{DrinkCreateDBRequest, DrinkDBResponse, DrinkUpdateDBRequest, Ingredient};
use crate::types::DrinkId;
use sqlx::{FromRow, SqliteConnection};
use tracing::instrument;

/// Filter for listing drinks
#[derive(Debug, Clone, Default)]
pub struct DrinkFilter {
    pub skip: i64,
    pub limit: Option<i64>,
}

// Database entity model; the recipe is still JSON text here
#[derive(Debug, Clone, FromRow)]
struct Drink {
    pub id: DrinkId,
    pub title: String,
    pub recipe: String,
}

impl TryFrom<Drink> for DrinkDBResponse {
    type Error = DbError;

    fn try_from(src: Drink) -> std::result::Result<Self, Self::Error> {
        let recipe = serde_json::from_str(&src.recipe).map_err(|e| DbError::InvalidData {
            table: "drinks",
            column: "recipe",
            message: format!("drink {}: {e}", src.id),
        })?;

        Ok(Self {
            id: src.id,
            title: src.title,
            recipe,
        })
    }
}

fn encode_recipe(recipe: &[Ingredient]) -> Result<String> {
    serde_json::to_string(recipe).map_err(|e| DbError::Other(anyhow::Error::from(e).context("encode drink recipe")))
}

pub struct Drinks<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Drinks<'c> {
    type CreateRequest = DrinkCreateDBRequest;
    type Response = DrinkDBResponse;
    type Id = DrinkId;
    type Filter = DrinkFilter;

    #[instrument(skip(self, request), fields(title = %request.title, ingredients = request.recipe.len()), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let recipe = encode_recipe(&request.recipe)?;

        let drink = sqlx::query_as::<_, Drink>("INSERT INTO drinks (title, recipe) VALUES (?, ?) RETURNING id, title, recipe")
            .bind(&request.title)
            .bind(recipe)
            .fetch_one(&mut *self.db)
            .await?;

        drink.try_into()
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let drink = sqlx::query_as::<_, Drink>("SELECT id, title, recipe FROM drinks WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        drink.map(DrinkDBResponse::try_from).transpose()
    }

    #[instrument(skip(self, filter), fields(skip = filter.skip, limit = ?filter.limit), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let drinks = sqlx::query_as::<_, Drink>("SELECT id, title, recipe FROM drinks ORDER BY id LIMIT ? OFFSET ?")
            .bind(filter.limit.unwrap_or(-1))
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;

        drinks.into_iter().map(DrinkDBResponse::try_from).collect()
    }

    #[instrument(skip(self, _filter), err)]
    async fn count(&mut self, _filter: &Self::Filter) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM drinks").fetch_one(&mut *self.db).await?;
        Ok(count.0)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM drinks WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl<'c> Drinks<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Replace the title and/or recipe of a drink; `None` fields keep their stored value
    #[instrument(skip(self, request), fields(title = ?request.title), err)]
    pub async fn update(&mut self, id: DrinkId, request: &DrinkUpdateDBRequest) -> Result<DrinkDBResponse> {
        let recipe = request.recipe.as_deref().map(encode_recipe).transpose()?;

        let drink = sqlx::query_as::<_, Drink>(
            r#"
            UPDATE drinks SET
                title = COALESCE(?, title),
                recipe = COALESCE(?, recipe)
            WHERE id = ?
            RETURNING id, title, recipe
            "#,
        )
        .bind(request.title.as_deref())
        .bind(recipe)
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        drink.try_into()
    }

    /// Remove every drink, returning how many were deleted
    #[instrument(skip(self), err)]
    pub async fn delete_all(&mut self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM drinks").execute(&mut *self.db).await?;
        Ok(result.rows_affected())
    }
}
