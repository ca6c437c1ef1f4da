use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Submission {
    pub id: String,
    pub task_id: String,
    pub student_id: String,
    /// Opaque blob-store name.
    pub filename: String,
    pub original_name: String,
    pub created_at: String,
}

/// Submission as shown to the student who made it; the blob name stays
/// internal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentSubmission {
    pub id: String,
    pub task_id: String,
    pub original_name: String,
    pub created_at: String,
}

impl From<Submission> for StudentSubmission {
    fn from(submission: Submission) -> Self {
        Self {
            id: submission.id,
            task_id: submission.task_id,
            original_name: submission.original_name,
            created_at: submission.created_at,
        }
    }
}

/// The `(task, student)` pair of a submission row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow)]
pub struct SubmissionKey {
    pub task_id: String,
    pub student_id: String,
}
