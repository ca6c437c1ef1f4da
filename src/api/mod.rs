mod auth;
mod courses;
mod feedback;
mod messages;
mod portal;
mod students;
mod submissions;
mod tasks;

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post, put};
use axum::{Router, extract::State};

use crate::error::AppError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/profile", get(auth::get_profile).patch(auth::update_profile))
        .route("/users/{username}", get(auth::user_profile))
        .route("/courses", get(courses::list_courses).post(courses::create_course))
        .route(
            "/courses/{id}",
            get(courses::get_course)
                .patch(courses::update_course)
                .delete(courses::delete_course),
        )
        .route("/courses/{id}/link", post(courses::rotate_link))
        .route("/courses/{id}/overview", get(courses::overview))
        .route("/courses/{id}/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/courses/{id}/students",
            get(students::list_students).post(students::add_students),
        )
        .route("/tasks/{id}", get(tasks::get_task).patch(tasks::update_task).delete(tasks::delete_task))
        .route("/tasks/{id}/missing", get(tasks::missing))
        .route("/tasks/{id}/to-grade", get(tasks::to_grade))
        .route("/tasks/{id}/submissions", get(submissions::list_for_task))
        .route("/tasks/{id}/feedback", get(feedback::list_for_task))
        .route("/tasks/{id}/feedback/{student_id}", put(feedback::upsert))
        .route(
            "/tasks/{id}/messages",
            get(messages::list_for_task).post(messages::post_as_instructor),
        )
        .route("/students/{id}", delete(students::delete_student))
        .route(
            "/submissions/{id}",
            get(submissions::get_submission).delete(submissions::delete_submission),
        )
        .route("/submissions/{id}/file", get(submissions::download))
        .route("/feedback/{id}", delete(feedback::delete_feedback))
        .route("/messages/{id}", delete(messages::delete_message))
        .route("/join/{link}", get(portal::join))
        .route("/s/{alias}", get(portal::home))
        .route("/s/{alias}/profile", patch(portal::update_profile))
        .route("/s/{alias}/tasks/{task_id}/submissions", post(portal::upload))
        .route("/s/{alias}/submissions/{id}", delete(portal::delete_submission))
        .route("/s/{alias}/submissions/{id}/file", get(portal::download))
        .route(
            "/s/{alias}/tasks/{task_id}/messages",
            get(portal::list_messages).post(portal::post_message),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

/// Serves a stored blob under the name the student uploaded it with.
fn attachment(original_name: &str, bytes: Vec<u8>) -> Response {
    let safe: String = original_name
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect();
    (
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", safe)),
        ],
        bytes,
    )
        .into_response()
}
