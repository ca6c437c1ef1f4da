use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Serialize;
use tracing::info;

use crate::access;
use crate::auth::Instructor;
use crate::db::repository;
use crate::error::AppError;
use crate::models::{Course, NewCourseRequest, Student, Task, UpdateCourseRequest};
use crate::services::TaskSubmissionCount;
use crate::services::aggregator;
use crate::state::AppState;
use crate::storage;
use crate::validation::validated;

#[derive(Debug, Serialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub tasks: Vec<Task>,
    pub students: Vec<Student>,
}

#[derive(Debug, Serialize)]
pub struct CourseOverview {
    pub course_id: String,
    pub total_students: usize,
    pub tasks: Vec<TaskSubmissionCount>,
}

pub async fn list_courses(
    State(state): State<AppState>,
    instructor: Instructor,
) -> Result<Json<Vec<Course>>, AppError> {
    let mut conn = state.db.acquire().await?;
    let courses = repository::fetch_courses_for_owner(&mut conn, instructor.id()).await?;
    Ok(Json(courses))
}

pub async fn create_course(
    State(state): State<AppState>,
    instructor: Instructor,
    Json(req): Json<NewCourseRequest>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let req = validated(req)?;
    let mut conn = state.db.acquire().await?;
    let course = repository::insert_course(&mut conn, instructor.id(), req).await?;
    info!(course_id = %course.id, user_id = %instructor.id(), "course created");
    Ok((StatusCode::CREATED, Json(course)))
}

pub async fn get_course(
    State(state): State<AppState>,
    instructor: Instructor,
    Path(id): Path<String>,
) -> Result<Json<CourseDetail>, AppError> {
    let mut conn = state.db.acquire().await?;
    let course = access::course(&mut conn, &instructor.principal(), &id).await?;
    let tasks = repository::fetch_tasks_for_course(&mut conn, &course.id).await?;
    let students = repository::fetch_students_for_course(&mut conn, &course.id).await?;
    Ok(Json(CourseDetail { course, tasks, students }))
}

pub async fn update_course(
    State(state): State<AppState>,
    instructor: Instructor,
    Path(id): Path<String>,
    Json(req): Json<UpdateCourseRequest>,
) -> Result<Json<Course>, AppError> {
    let req = validated(req)?;
    let mut conn = state.db.acquire().await?;
    access::course(&mut conn, &instructor.principal(), &id).await?;
    let course = repository::update_course(&mut conn, &id, req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(course))
}

pub async fn delete_course(
    State(state): State<AppState>,
    instructor: Instructor,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let mut tx = state.db.begin().await?;
    access::course(&mut tx, &instructor.principal(), &id).await?;
    let blobs = repository::delete_course(&mut tx, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    tx.commit().await?;

    storage::remove_all(state.blobs.as_ref(), &blobs).await;
    info!(course_id = %id, blobs = blobs.len(), "course deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn rotate_link(
    State(state): State<AppState>,
    instructor: Instructor,
    Path(id): Path<String>,
) -> Result<Json<Course>, AppError> {
    let mut conn = state.db.acquire().await?;
    access::course(&mut conn, &instructor.principal(), &id).await?;
    let course = repository::rotate_join_link(&mut conn, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(course))
}

pub async fn overview(
    State(state): State<AppState>,
    instructor: Instructor,
    Path(id): Path<String>,
) -> Result<Json<CourseOverview>, AppError> {
    let mut conn = state.db.acquire().await?;
    let tasks = access::tasks(&mut conn, &instructor.principal(), &id).await?;
    let students = repository::fetch_students_for_course(&mut conn, &id).await?;
    let keys = repository::fetch_submission_keys_for_course(&mut conn, &id).await?;

    Ok(Json(CourseOverview {
        course_id: id,
        total_students: students.len(),
        tasks: aggregator::submission_counts(&tasks, &students, &keys),
    }))
}
