use crate::types::DrinkId;
use serde::{Deserialize, Serialize};

/// One line of a drink recipe, as stored in the `drinks.recipe` JSON column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub color: String,
    /// Kept as a raw JSON number so integral parts are never rewritten as floats.
    pub parts: serde_json::Number,
}

/// Database request for creating a new drink
#[derive(Debug, Clone)]
pub struct DrinkCreateDBRequest {
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

/// Database request for updating a drink. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct DrinkUpdateDBRequest {
    pub title: Option<String>,
    pub recipe: Option<Vec<Ingredient>>,
}

/// Database response for a drink, with the recipe decoded
#[derive(Debug, Clone, PartialEq)]
pub struct DrinkDBResponse {
    pub id: DrinkId,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}
