use serde::{Deserialize, Serialize};
use serde_with::{OneOrMany, serde_as};

use crate::db::models::drinks::{DrinkCreateDBRequest, DrinkDBResponse, DrinkUpdateDBRequest, Ingredient};
use crate::types::DrinkId;

/// Ingredient as shown on the public menu, without its name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientShort {
    pub color: String,
    pub parts: serde_json::Number,
}

/// Drink as shown on the public menu (`GET /drinks`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrinkShort {
    pub id: DrinkId,
    pub title: String,
    pub recipe: Vec<IngredientShort>,
}

impl From<DrinkDBResponse> for DrinkShort {
    fn from(db: DrinkDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            recipe: db
                .recipe
                .into_iter()
                .map(|i| IngredientShort {
                    color: i.color,
                    parts: i.parts,
                })
                .collect(),
        }
    }
}

/// Drink with the full recipe, for baristas and managers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrinkLong {
    pub id: DrinkId,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

impl From<DrinkDBResponse> for DrinkLong {
    fn from(db: DrinkDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            recipe: db.recipe,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DrinksResponse<T> {
    pub success: bool,
    pub drinks: Vec<T>,
}

impl<T> DrinksResponse<T> {
    pub fn new(drinks: Vec<T>) -> Self {
        Self { success: true, drinks }
    }
}

#[derive(Debug, Serialize)]
pub struct DrinkDeletedResponse {
    pub success: bool,
    pub delete: DrinkId,
}

/// Body of `POST /drinks`. `recipe` may be one ingredient or a list.
#[serde_as]
#[derive(Debug, Deserialize)]
pub struct DrinkCreate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    #[serde_as(as = "Option<OneOrMany<_>>")]
    pub recipe: Option<Vec<Ingredient>>,
}

impl DrinkCreate {
    /// `None` unless both title and recipe were given
    pub fn into_db_request(self) -> Option<DrinkCreateDBRequest> {
        Some(DrinkCreateDBRequest {
            title: self.title?,
            recipe: self.recipe?,
        })
    }
}

/// Body of `PATCH /drinks/{id}`; absent fields keep their stored value
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct DrinkUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    #[serde_as(as = "Option<OneOrMany<_>>")]
    pub recipe: Option<Vec<Ingredient>>,
}

impl From<DrinkUpdate> for DrinkUpdateDBRequest {
    fn from(update: DrinkUpdate) -> Self {
        Self {
            title: update.title,
            recipe: update.recipe,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn water() -> DrinkDBResponse {
        DrinkDBResponse {
            id: 1,
            title: "water".to_string(),
            recipe: vec![Ingredient {
                name: "water".to_string(),
                color: "blue".to_string(),
                parts: 1.into(),
            }],
        }
    }

    #[test]
    fn test_short_form_hides_ingredient_names() {
        assert_eq!(
            serde_json::to_value(DrinkShort::from(water())).unwrap(),
            json!({"id": 1, "title": "water", "recipe": [{"color": "blue", "parts": 1}]})
        );
    }

    #[test]
    fn test_long_form() {
        assert_eq!(
            serde_json::to_value(DrinkLong::from(water())).unwrap(),
            json!({"id": 1, "title": "water", "recipe": [{"name": "water", "color": "blue", "parts": 1}]})
        );
    }

    #[test]
    fn test_single_ingredient_recipe_becomes_a_list() {
        let create: DrinkCreate = serde_json::from_value(json!({
            "title": "espresso",
            "recipe": {"name": "coffee", "color": "brown", "parts": 1}
        }))
        .unwrap();

        let request = create.into_db_request().unwrap();
        assert_eq!(request.recipe.len(), 1);
        assert_eq!(request.recipe[0].name, "coffee");
    }

    #[test]
    fn test_create_requires_title_and_recipe() {
        let create: DrinkCreate = serde_json::from_value(json!({"title": "espresso"})).unwrap();
        assert!(create.into_db_request().is_none());
    }

    #[test]
    fn test_fractional_parts_are_kept() {
        let update: DrinkUpdate = serde_json::from_value(json!({
            "recipe": [{"name": "milk", "color": "white", "parts": 0.5}]
        }))
        .unwrap();
        let request = DrinkUpdateDBRequest::from(update);
        assert!(request.title.is_none());
        assert_eq!(request.recipe.unwrap()[0].parts.as_f64(), Some(0.5));
    }
}
