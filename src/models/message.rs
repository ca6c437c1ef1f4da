use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: String,
    pub task_id: String,
    pub text: String,
    pub student_alias: Option<String>,
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub created_at: String,
}

/// A message as students see it. Aliases are credentials, so authors are
/// shown by display name only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentMessage {
    pub id: String,
    pub task_id: String,
    pub text: String,
    pub name: Option<String>,
    pub from_instructor: bool,
    pub created_at: String,
}

impl From<Message> for StudentMessage {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            task_id: message.task_id,
            text: message.text,
            name: message.name,
            from_instructor: message.user_id.is_some(),
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewMessageRequest {
    #[validate(length(min = 1, max = 2048, message = "Message must be 1 to 2048 characters"))]
    pub text: String,
}

#[derive(Debug, Clone, Copy)]
pub enum MessageAuthor<'a> {
    Student { alias: &'a str, name: &'a str },
    Instructor { user_id: &'a str, name: &'a str },
}
