use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::double_option;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub text: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub max_score: Option<i64>,
    pub is_done: bool,
    pub is_visible: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewTaskRequest {
    #[validate(length(min = 1, max = 140, message = "Title must be 1 to 140 characters"))]
    pub title: String,
    #[validate(length(max = 21000, message = "Text must be at most 21000 characters"))]
    pub text: Option<String>,
    pub due_date: Option<NaiveDate>,
    #[validate(range(min = 0, message = "Max score must not be negative"))]
    pub max_score: Option<i64>,
    #[serde(default)]
    pub is_visible: bool,
}

/// Absent fields are left unchanged; `null` clears `due_date`/`max_score`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 140, message = "Title must be 1 to 140 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 21000, message = "Text must be at most 21000 characters"))]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub max_score: Option<Option<i64>>,
    pub is_done: Option<bool>,
    pub is_visible: Option<bool>,
}

/// Task as shown to students and join-link holders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicTask {
    pub id: String,
    pub title: String,
    pub text: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub max_score: Option<i64>,
    pub is_done: bool,
}

impl From<Task> for PublicTask {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            text: task.text,
            due_date: task.due_date,
            max_score: task.max_score,
            is_done: task.is_done,
        }
    }
}
