//! Repository implementations for database access.
//!
//! Each repository wraps a borrowed SQLx connection (or transaction), binds parameters, and
//! returns models from [`crate::db::models`]. Writes that must be atomic with a follow-up read
//! are performed on a transaction by the caller:
//!
//! ```ignore
//! use quizbrew::db::handlers::{Drinks, Repository};
//!
//! async fn example(pool: &sqlx::SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tx = pool.begin().await?;
//!     let mut repo = Drinks::new(&mut tx);
//!     let removed = repo.delete(1).await?;
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```
//!
//! - [`Categories`]: read-only category listing
//! - [`Questions`]: trivia questions, with category/search/exclusion filters
//! - [`Drinks`]: coffee-shop drinks with JSON-encoded recipes

pub mod categories;
pub mod drinks;
pub mod questions;
pub mod repository;

pub use categories::Categories;
pub use drinks::Drinks;
pub use questions::Questions;
pub use repository::Repository;
