//! Request and response bodies of the JSON APIs.
//!
//! Every success body carries `"success": true`. Database models are converted at this boundary;
//! drink recipes are only decoded here, when a drink is rendered in its short or long form.

pub mod categories;
pub mod drinks;
pub mod pagination;
pub mod questions;
pub mod quizzes;
