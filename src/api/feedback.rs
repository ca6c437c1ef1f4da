use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::access;
use crate::auth::Instructor;
use crate::db::repository;
use crate::error::AppError;
use crate::models::{Feedback, FeedbackRequest};
use crate::state::AppState;
use crate::validation::validated;

pub async fn list_for_task(
    State(state): State<AppState>,
    instructor: Instructor,
    Path(task_id): Path<String>,
) -> Result<Json<Vec<Feedback>>, AppError> {
    let mut conn = state.db.acquire().await?;
    let task = access::task(&mut conn, &instructor.principal(), &task_id).await?;
    let feedback = repository::fetch_feedback_for_task(&mut conn, &task.id).await?;
    Ok(Json(feedback))
}

pub async fn upsert(
    State(state): State<AppState>,
    instructor: Instructor,
    Path((task_id, student_id)): Path<(String, String)>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<Feedback>, AppError> {
    let req = validated(req)?;

    let mut conn = state.db.acquire().await?;
    let task = access::task(&mut conn, &instructor.principal(), &task_id).await?;
    let student = access::owned_student(&mut conn, instructor.id(), &student_id).await?;
    if student.course_id != task.course_id {
        return Err(AppError::NotFound);
    }
    if let (Some(score), Some(max)) = (req.score, task.max_score) {
        if score > max {
            return Err(AppError::field(
                "score",
                format!("Score must not exceed the task's maximum of {max}"),
            ));
        }
    }

    let feedback = repository::upsert_feedback(
        &mut conn,
        &task.id,
        &student.id,
        req.text.as_deref(),
        req.score,
    )
    .await?;
    Ok(Json(feedback))
}

pub async fn delete_feedback(
    State(state): State<AppState>,
    instructor: Instructor,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let mut conn = state.db.acquire().await?;
    access::owned_feedback(&mut conn, instructor.id(), &id).await?;
    if repository::delete_feedback(&mut conn, &id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}
