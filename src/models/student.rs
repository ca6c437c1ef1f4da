use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::double_option;
use super::{Feedback, PublicTask, StudentSubmission};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: String,
    pub course_id: String,
    pub alias: String,
    pub name: String,
    pub email: Option<String>,
    pub last_seen: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddStudentsRequest {
    #[validate(range(min = 1, max = 500, message = "Between 1 and 500 students can be added at once"))]
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateStudentProfileRequest {
    #[validate(length(min = 1, max = 64, message = "Name must be 1 to 64 characters"))]
    pub name: Option<String>,
    #[validate(
        email(message = "Enter a valid email address"),
        length(max = 64, message = "Email must be at most 64 characters")
    )]
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub email: Option<Option<String>>,
}

/// Everything a student sees when opening their alias link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentPortal {
    pub student: Student,
    pub course_title: String,
    pub course_description: Option<String>,
    pub tasks: Vec<PublicTask>,
    pub submissions: Vec<StudentSubmission>,
    pub feedback: Vec<Feedback>,
}
