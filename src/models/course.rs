use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::double_option;
use super::task::PublicTask;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub join_link: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewCourseRequest {
    #[validate(length(min = 1, max = 140, message = "Title must be 1 to 140 characters"))]
    pub title: String,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateCourseRequest {
    #[validate(length(min = 1, max = 140, message = "Title must be 1 to 140 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
}

/// What a join-link holder may see.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicCourseView {
    pub title: String,
    pub description: Option<String>,
    pub tasks: Vec<PublicTask>,
}
