//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx with SQLite. It follows the Repository
//! pattern to provide clean abstractions over database operations.
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - database records)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   SQLite    │
//! └─────────────┘
//! ```
//!
//! Schema changes live in `migrations/` and are applied by [`crate::migrator`] on startup.
//! Foreign keys are enforced on every connection, so a question can never reference a missing
//! category.

pub mod errors;
pub mod handlers;
pub mod models;
