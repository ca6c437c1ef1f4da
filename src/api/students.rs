use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::info;

use crate::access;
use crate::auth::Instructor;
use crate::db::repository;
use crate::error::AppError;
use crate::models::{AddStudentsRequest, Student};
use crate::services::RosterService;
use crate::state::AppState;
use crate::storage;
use crate::validation::validated;

pub async fn list_students(
    State(state): State<AppState>,
    instructor: Instructor,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<Student>>, AppError> {
    let mut conn = state.db.acquire().await?;
    let course = access::course(&mut conn, &instructor.principal(), &course_id).await?;
    let students = repository::fetch_students_for_course(&mut conn, &course.id).await?;
    Ok(Json(students))
}

pub async fn add_students(
    State(state): State<AppState>,
    instructor: Instructor,
    Path(course_id): Path<String>,
    Json(req): Json<AddStudentsRequest>,
) -> Result<(StatusCode, Json<Vec<Student>>), AppError> {
    let req = validated(req)?;
    {
        let mut conn = state.db.acquire().await?;
        access::course(&mut conn, &instructor.principal(), &course_id).await?;
    }

    let service = RosterService::new(state.db.clone(), state.aliases.clone());
    let students = service.add_students(&course_id, req.count as usize).await?;
    Ok((StatusCode::CREATED, Json(students)))
}

pub async fn delete_student(
    State(state): State<AppState>,
    instructor: Instructor,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let mut tx = state.db.begin().await?;
    access::owned_student(&mut tx, instructor.id(), &id).await?;
    let blobs = repository::delete_student(&mut tx, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    tx.commit().await?;

    storage::remove_all(state.blobs.as_ref(), &blobs).await;
    info!(student_id = %id, "student deleted, alias retired");
    Ok(StatusCode::NO_CONTENT)
}
