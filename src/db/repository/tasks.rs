use sqlx::SqliteConnection;

use super::{new_id, now};
use crate::models::{NewTaskRequest, Task, UpdateTaskRequest};

pub async fn fetch_tasks_for_course(
    conn: &mut SqliteConnection,
    course_id: &str,
) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        r#"
        SELECT id, course_id, title, text, due_date, max_score, is_done, is_visible, created_at
        FROM tasks
        WHERE course_id = ?
        ORDER BY created_at, rowid
        "#,
    )
    .bind(course_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn fetch_visible_tasks(
    conn: &mut SqliteConnection,
    course_id: &str,
) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        r#"
        SELECT id, course_id, title, text, due_date, max_score, is_done, is_visible, created_at
        FROM tasks
        WHERE course_id = ? AND is_visible = 1
        ORDER BY created_at, rowid
        "#,
    )
    .bind(course_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn find_task_by_id(conn: &mut SqliteConnection, id: &str) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        "SELECT id, course_id, title, text, due_date, max_score, is_done, is_visible, created_at FROM tasks WHERE id = ?"
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn find_owned_task(
    conn: &mut SqliteConnection,
    id: &str,
    user_id: &str,
) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        r#"
        SELECT t.id, t.course_id, t.title, t.text, t.due_date, t.max_score,
               t.is_done, t.is_visible, t.created_at
        FROM tasks t
        JOIN courses c ON c.id = t.course_id
        WHERE t.id = ? AND c.user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn insert_task(
    conn: &mut SqliteConnection,
    course_id: &str,
    req: NewTaskRequest,
) -> Result<Task, sqlx::Error> {
    let id = new_id();
    let now = now();

    sqlx::query(
        r#"
        INSERT INTO tasks
            (id, course_id, title, text, due_date, max_score,
            is_done, is_visible, created_at)
        VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(course_id)
    .bind(&req.title)
    .bind(&req.text)
    .bind(req.due_date)
    .bind(req.max_score)
    .bind(req.is_visible)
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    Ok(Task {
        id,
        course_id: course_id.to_string(),
        title: req.title,
        text: req.text,
        due_date: req.due_date,
        max_score: req.max_score,
        is_done: false,
        is_visible: req.is_visible,
        created_at: now,
    })
}

pub async fn update_task(
    conn: &mut SqliteConnection,
    id: &str,
    req: UpdateTaskRequest,
) -> Result<Option<Task>, sqlx::Error> {
    let mut current = match find_task_by_id(conn, id).await? {
        Some(t) => t,
        None => return Ok(None),
    };

    if let Some(title) = req.title {
        current.title = title;
    }
    if let Some(text) = req.text {
        current.text = Some(text);
    }
    if let Some(due_date) = req.due_date {
        current.due_date = due_date;
    }
    if let Some(max_score) = req.max_score {
        current.max_score = max_score;
    }
    if let Some(is_done) = req.is_done {
        current.is_done = is_done;
    }
    if let Some(is_visible) = req.is_visible {
        current.is_visible = is_visible;
    }

    sqlx::query(
        r#"
        UPDATE tasks
        SET title = ?,
            text = ?,
            due_date = ?,
            max_score = ?,
            is_done = ?,
            is_visible = ?
        WHERE id = ?
        "#,
    )
    .bind(&current.title)
    .bind(&current.text)
    .bind(current.due_date)
    .bind(current.max_score)
    .bind(current.is_done)
    .bind(current.is_visible)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(Some(current))
}

/// Deletes a task with its submissions, feedback and messages. Returns the
/// blob names of the removed submissions. Run inside a transaction.
pub async fn delete_task(conn: &mut SqliteConnection, id: &str) -> Result<Option<Vec<String>>, sqlx::Error> {
    if find_task_by_id(conn, id).await?.is_none() {
        return Ok(None);
    }

    let blobs: Vec<String> = sqlx::query_scalar("SELECT filename FROM submissions WHERE task_id = ?")
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

    for table in ["submissions", "feedback", "messages"] {
        sqlx::query(&format!("DELETE FROM {table} WHERE task_id = ?"))
            .bind(id)
            .execute(&mut *conn)
            .await?;
    }

    sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(Some(blobs))
}
