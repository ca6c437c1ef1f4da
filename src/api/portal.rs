//! Capability-link routes: `/join/{link}` for anyone holding a course's join
//! link, `/s/{alias}/...` for a student holding their alias.

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use tracing::{info, warn};

use super::attachment;
use crate::access::{self, Principal};
use crate::db::repository;
use crate::error::AppError;
use crate::models::{
    MessageAuthor, NewMessageRequest, PublicCourseView, PublicTask, Student, StudentMessage,
    StudentPortal, StudentSubmission, UpdateStudentProfileRequest,
};
use crate::state::AppState;
use crate::storage;
use crate::validation::validated;

const FILE_FIELD: &str = "file";

pub async fn join(
    State(state): State<AppState>,
    Path(link): Path<String>,
) -> Result<Json<PublicCourseView>, AppError> {
    let mut conn = state.db.acquire().await?;
    let course = access::resolve_join_link(&mut conn, &link).await?;
    let principal = Principal::LinkHolder { course_id: course.id.clone() };
    let tasks = access::tasks(&mut conn, &principal, &course.id).await?;

    Ok(Json(PublicCourseView {
        title: course.title,
        description: course.description,
        tasks: tasks.into_iter().map(PublicTask::from).collect(),
    }))
}

pub async fn home(
    State(state): State<AppState>,
    Path(alias): Path<String>,
) -> Result<Json<StudentPortal>, AppError> {
    let mut conn = state.db.acquire().await?;
    let student = access::resolve_alias(&mut conn, &alias).await?;
    let principal = Principal::Student(student.clone());

    let course = access::course(&mut conn, &principal, &student.course_id).await?;
    let tasks = access::tasks(&mut conn, &principal, &course.id).await?;
    let submissions = repository::fetch_submissions_for_student(&mut conn, &student.id).await?;
    let feedback = repository::fetch_feedback_for_student(&mut conn, &student.id).await?;

    Ok(Json(StudentPortal {
        student,
        course_title: course.title,
        course_description: course.description,
        tasks: tasks.into_iter().map(PublicTask::from).collect(),
        submissions: submissions.into_iter().map(StudentSubmission::from).collect(),
        feedback,
    }))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Path(alias): Path<String>,
    Json(req): Json<UpdateStudentProfileRequest>,
) -> Result<Json<Student>, AppError> {
    let req = validated(req)?;
    let mut conn = state.db.acquire().await?;
    let mut student = access::resolve_alias(&mut conn, &alias).await?;

    if let Some(name) = req.name {
        if name != student.name {
            let taken = repository::fetch_names_for_course(&mut conn, &student.course_id).await?;
            if taken.contains(&name) {
                return Err(AppError::Conflict("This name is already used in the course".to_string()));
            }
        }
        student.name = name;
    }
    if let Some(email) = req.email {
        student.email = email;
    }

    repository::update_student_profile(&mut conn, &student).await?;
    Ok(Json(student))
}

/// Last path segment of a client-supplied filename.
fn display_name(raw: &str) -> Option<String> {
    raw.rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Vec<u8>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let original_name = field
            .file_name()
            .and_then(display_name)
            .ok_or_else(|| AppError::field(FILE_FIELD, "No file selected"))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        return Ok((original_name, bytes.to_vec()));
    }
    Err(AppError::field(FILE_FIELD, "No file selected"))
}

/// No connection is held while the body streams in. The blob is durable
/// before the row exists, and the row is only written while the task is
/// still open; otherwise the blob is removed again.
pub async fn upload(
    State(state): State<AppState>,
    Path((alias, task_id)): Path<(String, String)>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<StudentSubmission>), AppError> {
    let (student, task) = {
        let mut conn = state.db.acquire().await?;
        let student = access::resolve_alias(&mut conn, &alias).await?;
        let task = access::task(&mut conn, &Principal::Student(student.clone()), &task_id).await?;
        access::ensure_open(&task)?;
        (student, task)
    };

    let (original_name, bytes) = read_file_field(&mut multipart).await?;
    let blob = storage::blob_name(&original_name);
    state.blobs.put(&blob, &bytes).await?;

    let inserted = match state.db.acquire().await {
        Ok(mut conn) => {
            repository::insert_submission(&mut conn, &task.id, &student.id, &blob, &original_name).await
        }
        Err(e) => Err(e),
    };

    match inserted {
        Ok(Some(submission)) => {
            info!(
                submission_id = %submission.id,
                task_id = %task.id,
                student_id = %student.id,
                size = bytes.len(),
                "submission stored"
            );
            Ok((StatusCode::CREATED, Json(submission.into())))
        }
        Ok(None) => {
            warn!(blob = %blob, task_id = %task.id, "task closed during upload, removing blob");
            storage::remove_all(state.blobs.as_ref(), &[blob]).await;
            Err(AppError::TaskClosed)
        }
        Err(e) => {
            warn!(blob = %blob, "submission row not written, removing blob");
            storage::remove_all(state.blobs.as_ref(), &[blob]).await;
            Err(e.into())
        }
    }
}

pub async fn download(
    State(state): State<AppState>,
    Path((alias, id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let submission = {
        let mut conn = state.db.acquire().await?;
        let student = access::resolve_alias(&mut conn, &alias).await?;
        access::submission(&mut conn, &Principal::Student(student), &id).await?
    };
    let bytes = state.blobs.get(&submission.filename).await?;
    Ok(attachment(&submission.original_name, bytes))
}

pub async fn delete_submission(
    State(state): State<AppState>,
    Path((alias, id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let mut conn = state.db.acquire().await?;
    let student = access::resolve_alias(&mut conn, &alias).await?;
    let submission = access::submission(&mut conn, &Principal::Student(student), &id).await?;
    let task = repository::find_task_by_id(&mut conn, &submission.task_id)
        .await?
        .ok_or(AppError::NotFound)?;
    access::ensure_open(&task)?;

    let blob = repository::delete_submission(&mut conn, &submission.id)
        .await?
        .ok_or(AppError::NotFound)?;
    drop(conn);

    storage::remove_all(state.blobs.as_ref(), &[blob]).await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_messages(
    State(state): State<AppState>,
    Path((alias, task_id)): Path<(String, String)>,
) -> Result<Json<Vec<StudentMessage>>, AppError> {
    let mut conn = state.db.acquire().await?;
    let student = access::resolve_alias(&mut conn, &alias).await?;
    let task = access::task(&mut conn, &Principal::Student(student), &task_id).await?;
    let messages = repository::fetch_messages_for_task(&mut conn, &task.id).await?;
    Ok(Json(messages.into_iter().map(StudentMessage::from).collect()))
}

pub async fn post_message(
    State(state): State<AppState>,
    Path((alias, task_id)): Path<(String, String)>,
    Json(req): Json<NewMessageRequest>,
) -> Result<(StatusCode, Json<StudentMessage>), AppError> {
    let req = validated(req)?;
    let mut conn = state.db.acquire().await?;
    let student = access::resolve_alias(&mut conn, &alias).await?;
    let task = access::task(&mut conn, &Principal::Student(student.clone()), &task_id).await?;

    let author = MessageAuthor::Student {
        alias: &student.alias,
        name: &student.name,
    };
    let message = repository::insert_message(&mut conn, &task.id, &req.text, author).await?;
    Ok((StatusCode::CREATED, Json(message.into())))
}
