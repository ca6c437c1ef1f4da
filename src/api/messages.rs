use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::access;
use crate::auth::Instructor;
use crate::db::repository;
use crate::error::AppError;
use crate::models::{Message, MessageAuthor, NewMessageRequest};
use crate::state::AppState;
use crate::validation::validated;

pub async fn list_for_task(
    State(state): State<AppState>,
    instructor: Instructor,
    Path(task_id): Path<String>,
) -> Result<Json<Vec<Message>>, AppError> {
    let mut conn = state.db.acquire().await?;
    let task = access::task(&mut conn, &instructor.principal(), &task_id).await?;
    let messages = repository::fetch_messages_for_task(&mut conn, &task.id).await?;
    Ok(Json(messages))
}

pub async fn post_as_instructor(
    State(state): State<AppState>,
    instructor: Instructor,
    Path(task_id): Path<String>,
    Json(req): Json<NewMessageRequest>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let req = validated(req)?;
    let mut conn = state.db.acquire().await?;
    let task = access::task(&mut conn, &instructor.principal(), &task_id).await?;
    let author = MessageAuthor::Instructor {
        user_id: &instructor.user.id,
        name: &instructor.user.username,
    };
    let message = repository::insert_message(&mut conn, &task.id, &req.text, author).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn delete_message(
    State(state): State<AppState>,
    instructor: Instructor,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let mut conn = state.db.acquire().await?;
    access::owned_message(&mut conn, instructor.id(), &id).await?;
    if repository::delete_message(&mut conn, &id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}
