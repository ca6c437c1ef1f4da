use sqlx::SqliteConnection;

use super::{new_id, now};
use crate::models::{Submission, SubmissionKey};

pub async fn fetch_submissions_for_task(
    conn: &mut SqliteConnection,
    task_id: &str,
) -> Result<Vec<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(
        r#"
        SELECT id, task_id, student_id, filename, original_name, created_at
        FROM submissions
        WHERE task_id = ?
        ORDER BY created_at, rowid
        "#,
    )
    .bind(task_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn fetch_submissions_for_student(
    conn: &mut SqliteConnection,
    student_id: &str,
) -> Result<Vec<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(
        r#"
        SELECT id, task_id, student_id, filename, original_name, created_at
        FROM submissions
        WHERE student_id = ?
        ORDER BY created_at, rowid
        "#,
    )
    .bind(student_id)
    .fetch_all(&mut *conn)
    .await
}

/// `(task, student)` pairs of every submission to the course's tasks.
pub async fn fetch_submission_keys_for_course(
    conn: &mut SqliteConnection,
    course_id: &str,
) -> Result<Vec<SubmissionKey>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionKey>(
        r#"
        SELECT s.task_id, s.student_id
        FROM submissions s
        JOIN tasks t ON t.id = s.task_id
        WHERE t.course_id = ?
        "#,
    )
    .bind(course_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn find_submission_by_id(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(
        "SELECT id, task_id, student_id, filename, original_name, created_at FROM submissions WHERE id = ?"
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn find_owned_submission(
    conn: &mut SqliteConnection,
    id: &str,
    user_id: &str,
) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(
        r#"
        SELECT s.id, s.task_id, s.student_id, s.filename, s.original_name, s.created_at
        FROM submissions s
        JOIN tasks t ON t.id = s.task_id
        JOIN courses c ON c.id = t.course_id
        WHERE s.id = ? AND c.user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await
}

/// Inserts only while the task is still open; `None` means the task was
/// closed (or deleted) before the row could be written.
pub async fn insert_submission(
    conn: &mut SqliteConnection,
    task_id: &str,
    student_id: &str,
    filename: &str,
    original_name: &str,
) -> Result<Option<Submission>, sqlx::Error> {
    let id = new_id();
    let now = now();

    let inserted = sqlx::query(
        r#"
        INSERT INTO submissions
            (id, task_id, student_id, filename, original_name, created_at)
        SELECT ?, id, ?, ?, ?, ?
        FROM tasks
        WHERE id = ? AND is_done = 0
        "#,
    )
    .bind(&id)
    .bind(student_id)
    .bind(filename)
    .bind(original_name)
    .bind(&now)
    .bind(task_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if inserted == 0 {
        return Ok(None);
    }

    Ok(Some(Submission {
        id,
        task_id: task_id.to_string(),
        student_id: student_id.to_string(),
        filename: filename.to_string(),
        original_name: original_name.to_string(),
        created_at: now,
    }))
}

/// Returns the blob name of the removed row.
pub async fn delete_submission(conn: &mut SqliteConnection, id: &str) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("DELETE FROM submissions WHERE id = ? RETURNING filename")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}
