//! HTTP layer: route handlers, request extractors and JSON bodies.
//!
//! - **[`handlers`]**: Axum route handlers for both services
//! - **[`models`]**: Request/response bodies
//! - **[`extract`]**: Body and path extractors that reject with the JSON error envelope
//!
//! # API Structure
//!
//! The trivia service serves `/categories`, `/questions` and `/quizzes`. The coffee-shop service
//! serves `/drinks` and `/drinks-detail`; everything except the public menu needs a bearer token
//! carrying the matching permission (see [`crate::auth`]).

pub mod extract;
pub mod handlers;
pub mod models;
