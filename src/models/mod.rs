pub mod course;
pub mod feedback;
pub mod message;
pub mod student;
pub mod submission;
pub mod task;
pub mod user;

pub use course::{Course, NewCourseRequest, PublicCourseView, UpdateCourseRequest};
pub use feedback::{Feedback, FeedbackRequest};
pub use message::{Message, MessageAuthor, NewMessageRequest, StudentMessage};
pub use student::{AddStudentsRequest, Student, StudentPortal, UpdateStudentProfileRequest};
pub use submission::{StudentSubmission, Submission, SubmissionKey};
pub use task::{NewTaskRequest, PublicTask, Task, UpdateTaskRequest};
pub use user::{LoginRequest, PublicProfile, RegisterRequest, UpdateProfileRequest, User};

use serde::{Deserialize, Deserializer};

/// Distinguishes an absent PATCH field (`None`) from an explicit `null`
/// (`Some(None)`), so optional columns can be cleared.
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
