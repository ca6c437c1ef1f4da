use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::info;

use crate::access;
use crate::auth::Instructor;
use crate::db::repository;
use crate::error::AppError;
use crate::models::{NewTaskRequest, Student, SubmissionKey, Task, UpdateTaskRequest};
use crate::services::aggregator;
use crate::state::AppState;
use crate::storage;
use crate::validation::validated;

pub async fn list_tasks(
    State(state): State<AppState>,
    instructor: Instructor,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<Task>>, AppError> {
    let mut conn = state.db.acquire().await?;
    let tasks = access::tasks(&mut conn, &instructor.principal(), &course_id).await?;
    Ok(Json(tasks))
}

pub async fn create_task(
    State(state): State<AppState>,
    instructor: Instructor,
    Path(course_id): Path<String>,
    Json(req): Json<NewTaskRequest>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let req = validated(req)?;
    let mut conn = state.db.acquire().await?;
    let course = access::course(&mut conn, &instructor.principal(), &course_id).await?;
    let task = repository::insert_task(&mut conn, &course.id, req).await?;
    info!(task_id = %task.id, course_id = %course.id, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<AppState>,
    instructor: Instructor,
    Path(id): Path<String>,
) -> Result<Json<Task>, AppError> {
    let mut conn = state.db.acquire().await?;
    let task = access::task(&mut conn, &instructor.principal(), &id).await?;
    Ok(Json(task))
}

pub async fn update_task(
    State(state): State<AppState>,
    instructor: Instructor,
    Path(id): Path<String>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, AppError> {
    let req = validated(req)?;
    if let Some(Some(max_score)) = req.max_score {
        if max_score < 0 {
            return Err(AppError::field("max_score", "Max score must not be negative"));
        }
    }

    let mut conn = state.db.acquire().await?;
    access::task(&mut conn, &instructor.principal(), &id).await?;
    let task = repository::update_task(&mut conn, &id, req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    instructor: Instructor,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let mut tx = state.db.begin().await?;
    access::task(&mut tx, &instructor.principal(), &id).await?;
    let blobs = repository::delete_task(&mut tx, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    tx.commit().await?;

    storage::remove_all(state.blobs.as_ref(), &blobs).await;
    info!(task_id = %id, blobs = blobs.len(), "task deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn roster_and_keys(
    state: &AppState,
    instructor: &Instructor,
    task_id: &str,
) -> Result<(Task, Vec<Student>, Vec<SubmissionKey>), AppError> {
    let mut conn = state.db.acquire().await?;
    let task = access::task(&mut conn, &instructor.principal(), task_id).await?;
    let students = repository::fetch_students_for_course(&mut conn, &task.course_id).await?;
    let keys = repository::fetch_submission_keys_for_course(&mut conn, &task.course_id).await?;
    Ok((task, students, keys))
}

pub async fn missing(
    State(state): State<AppState>,
    instructor: Instructor,
    Path(id): Path<String>,
) -> Result<Json<Vec<Student>>, AppError> {
    let (task, students, keys) = roster_and_keys(&state, &instructor, &id).await?;
    let missing = aggregator::missing(&task.id, &students, &keys)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(missing))
}

pub async fn to_grade(
    State(state): State<AppState>,
    instructor: Instructor,
    Path(id): Path<String>,
) -> Result<Json<Vec<Student>>, AppError> {
    let (task, students, keys) = roster_and_keys(&state, &instructor, &id).await?;
    let to_grade = aggregator::to_grade(&task.id, &students, &keys)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(to_grade))
}
