//! Who may see what.
//!
//! Every check takes the principal and a connection explicitly. A row that
//! exists but is out of reach is reported exactly like a missing one.

use sqlx::SqliteConnection;

use crate::db::repository;
use crate::error::AppError;
use crate::models::{Course, Feedback, Message, Student, Submission, Task};

#[derive(Debug, Clone)]
pub enum Principal {
    /// Authenticated instructor; full access to the courses they own.
    Owner { user_id: String },
    /// Holder of a student alias.
    Student(Student),
    /// Holder of a course join link; read-only.
    LinkHolder { course_id: String },
}

impl Principal {
    fn course_id(&self) -> Option<&str> {
        match self {
            Principal::Owner { .. } => None,
            Principal::Student(student) => Some(&student.course_id),
            Principal::LinkHolder { course_id } => Some(course_id),
        }
    }
}

pub async fn course(conn: &mut SqliteConnection, principal: &Principal, id: &str) -> Result<Course, AppError> {
    let found = match principal {
        Principal::Owner { user_id } => repository::find_owned_course(conn, id, user_id).await?,
        other if other.course_id() == Some(id) => repository::find_course_by_id(conn, id).await?,
        _ => None,
    };
    found.ok_or(AppError::NotFound)
}

/// Owners see every task; capability holders only visible ones.
pub async fn tasks(conn: &mut SqliteConnection, principal: &Principal, course_id: &str) -> Result<Vec<Task>, AppError> {
    let course = course(conn, principal, course_id).await?;
    let tasks = match principal {
        Principal::Owner { .. } => repository::fetch_tasks_for_course(conn, &course.id).await?,
        _ => repository::fetch_visible_tasks(conn, &course.id).await?,
    };
    Ok(tasks)
}

pub async fn task(conn: &mut SqliteConnection, principal: &Principal, id: &str) -> Result<Task, AppError> {
    let found = match principal {
        Principal::Owner { user_id } => repository::find_owned_task(conn, id, user_id).await?,
        other => repository::find_task_by_id(conn, id)
            .await?
            .filter(|t| t.is_visible && other.course_id() == Some(t.course_id.as_str())),
    };
    found.ok_or(AppError::NotFound)
}

/// Students reach only their own submissions; join-link holders none.
pub async fn submission(conn: &mut SqliteConnection, principal: &Principal, id: &str) -> Result<Submission, AppError> {
    let found = match principal {
        Principal::Owner { user_id } => repository::find_owned_submission(conn, id, user_id).await?,
        Principal::Student(student) => repository::find_submission_by_id(conn, id)
            .await?
            .filter(|s| s.student_id == student.id),
        Principal::LinkHolder { .. } => None,
    };
    found.ok_or(AppError::NotFound)
}

pub fn ensure_open(task: &Task) -> Result<(), AppError> {
    if task.is_done {
        Err(AppError::TaskClosed)
    } else {
        Ok(())
    }
}

/// Resolves an alias to its student and records the visit.
pub async fn resolve_alias(conn: &mut SqliteConnection, alias: &str) -> Result<Student, AppError> {
    let student = repository::find_student_by_alias(conn, alias)
        .await?
        .ok_or(AppError::NotFound)?;
    repository::touch_student(conn, &student.id).await?;
    Ok(student)
}

pub async fn resolve_join_link(conn: &mut SqliteConnection, link: &str) -> Result<Course, AppError> {
    repository::find_course_by_link(conn, link)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn owned_student(conn: &mut SqliteConnection, user_id: &str, id: &str) -> Result<Student, AppError> {
    repository::find_owned_student(conn, id, user_id)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn owned_feedback(conn: &mut SqliteConnection, user_id: &str, id: &str) -> Result<Feedback, AppError> {
    repository::find_owned_feedback(conn, id, user_id)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn owned_message(conn: &mut SqliteConnection, user_id: &str, id: &str) -> Result<Message, AppError> {
    repository::find_owned_message(conn, id, user_id)
        .await?
        .ok_or(AppError::NotFound)
}
