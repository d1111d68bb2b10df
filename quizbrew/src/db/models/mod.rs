//! Database record models matching table schemas.
//!
//! Models are distinct from the API models in [`crate::api::models`], which decide how records are
//! rendered on the wire (for example the short and long drink forms).
//!
//! - [`categories`]: trivia categories (read-only through the API)
//! - [`questions`]: trivia questions
//! - [`drinks`]: coffee-shop drinks and their recipes

pub mod categories;
pub mod drinks;
pub mod questions;
