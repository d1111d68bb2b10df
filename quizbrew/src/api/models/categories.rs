use serde::Serialize;
use std::collections::BTreeMap;

use crate::db::models::categories::CategoryDBResponse;
use crate::types::CategoryId;

/// `{id: type}` mapping, rendered with string keys in id order
pub type CategoryMap = BTreeMap<CategoryId, String>;

pub fn category_map(categories: Vec<CategoryDBResponse>) -> CategoryMap {
    categories.into_iter().map(|c| (c.id, c.kind)).collect()
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub success: bool,
    pub categories: CategoryMap,
}
