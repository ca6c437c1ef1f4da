use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;

use super::attachment;
use crate::access;
use crate::auth::Instructor;
use crate::db::repository;
use crate::error::AppError;
use crate::models::Submission;
use crate::state::AppState;
use crate::storage;

pub async fn list_for_task(
    State(state): State<AppState>,
    instructor: Instructor,
    Path(task_id): Path<String>,
) -> Result<Json<Vec<Submission>>, AppError> {
    let mut conn = state.db.acquire().await?;
    let task = access::task(&mut conn, &instructor.principal(), &task_id).await?;
    let submissions = repository::fetch_submissions_for_task(&mut conn, &task.id).await?;
    Ok(Json(submissions))
}

pub async fn get_submission(
    State(state): State<AppState>,
    instructor: Instructor,
    Path(id): Path<String>,
) -> Result<Json<Submission>, AppError> {
    let mut conn = state.db.acquire().await?;
    let submission = access::submission(&mut conn, &instructor.principal(), &id).await?;
    Ok(Json(submission))
}

pub async fn download(
    State(state): State<AppState>,
    instructor: Instructor,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let submission = {
        let mut conn = state.db.acquire().await?;
        access::submission(&mut conn, &instructor.principal(), &id).await?
    };
    let bytes = state.blobs.get(&submission.filename).await?;
    Ok(attachment(&submission.original_name, bytes))
}

/// Instructors may remove submissions on closed tasks too.
pub async fn delete_submission(
    State(state): State<AppState>,
    instructor: Instructor,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let mut conn = state.db.acquire().await?;
    access::submission(&mut conn, &instructor.principal(), &id).await?;
    let blob = repository::delete_submission(&mut conn, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    drop(conn);

    storage::remove_all(state.blobs.as_ref(), &[blob]).await;
    Ok(StatusCode::NO_CONTENT)
}
