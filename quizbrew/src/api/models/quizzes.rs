use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnNull, DisplayFromStr, PickFirst, serde_as};

use crate::api::models::questions::QuestionResponse;
use crate::types::{CategoryId, QuestionId};

/// Category id that selects questions from every category
pub const ALL_CATEGORIES: CategoryId = 0;

/// Body of `POST /quizzes`
#[serde_as]
#[derive(Debug, Deserialize)]
pub struct QuizRequest {
    #[serde(default)]
    #[serde_as(as = "DefaultOnNull")]
    pub previous_questions: Vec<QuestionId>,
    pub quiz_category: QuizCategory,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct QuizCategory {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub id: CategoryId,
    /// Display name sent back by the frontend; not used for selection
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl QuizCategory {
    /// The category to draw from, `None` for all of them
    pub fn filter(&self) -> Option<CategoryId> {
        (self.id != ALL_CATEGORIES).then_some(self.id)
    }
}

/// `question` is `null` once every question in the category has been served
#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub success: bool,
    pub question: Option<QuestionResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_id_as_number_or_string() {
        let req: QuizRequest = serde_json::from_value(json!({
            "previous_questions": [1, 2],
            "quiz_category": {"id": "4", "type": "History"}
        }))
        .unwrap();
        assert_eq!(req.quiz_category.filter(), Some(4));
        assert_eq!(req.previous_questions, vec![1, 2]);

        let req: QuizRequest = serde_json::from_value(json!({"quiz_category": {"id": 0}})).unwrap();
        assert_eq!(req.quiz_category.filter(), None);
        assert!(req.previous_questions.is_empty());
    }

    #[test]
    fn test_null_previous_questions() {
        let req: QuizRequest =
            serde_json::from_value(json!({"previous_questions": null, "quiz_category": {"id": 1}})).unwrap();
        assert!(req.previous_questions.is_empty());
    }

    #[test]
    fn test_missing_category_is_rejected() {
        assert!(serde_json::from_value::<QuizRequest>(json!({"previous_questions": []})).is_err());
        assert!(serde_json::from_value::<QuizRequest>(json!({"quiz_category": {"id": "all"}})).is_err());
    }
}
