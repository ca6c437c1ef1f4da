use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Feedback {
    pub id: String,
    pub task_id: String,
    pub student_id: String,
    pub text: Option<String>,
    pub score: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FeedbackRequest {
    #[validate(length(max = 5000, message = "Feedback must be at most 5000 characters"))]
    pub text: Option<String>,
    #[validate(range(min = 0, message = "Score must not be negative"))]
    pub score: Option<i64>,
}
