//! Common type definitions.
//!
//! Entity IDs are SQLite `INTEGER PRIMARY KEY` rowids, exposed as `i64` aliases so the intent of
//! each parameter stays visible in signatures:
//!
//! - [`CategoryId`]: trivia category identifier
//! - [`QuestionId`]: trivia question identifier
//! - [`DrinkId`]: coffee-shop drink identifier

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

// Type aliases for IDs
pub type CategoryId = i64;
pub type QuestionId = i64;
pub type DrinkId = i64;

/// Which of the two JSON APIs a process serves.
///
/// Both services share the binary, the configuration file and the database; the service decides
/// which router is mounted and which error envelope is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    #[default]
    Trivia,
    Coffee,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Trivia => write!(f, "trivia"),
            Service::Coffee => write!(f, "coffee"),
        }
    }
}
