use sqlx::SqliteConnection;

use super::{new_id, now};
use crate::models::Feedback;

pub async fn fetch_feedback_for_task(
    conn: &mut SqliteConnection,
    task_id: &str,
) -> Result<Vec<Feedback>, sqlx::Error> {
    sqlx::query_as::<_, Feedback>(
        r#"
        SELECT id, task_id, student_id, text, score, created_at
        FROM feedback
        WHERE task_id = ?
        ORDER BY created_at, rowid
        "#,
    )
    .bind(task_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn fetch_feedback_for_student(
    conn: &mut SqliteConnection,
    student_id: &str,
) -> Result<Vec<Feedback>, sqlx::Error> {
    sqlx::query_as::<_, Feedback>(
        r#"
        SELECT id, task_id, student_id, text, score, created_at
        FROM feedback
        WHERE student_id = ?
        ORDER BY created_at, rowid
        "#,
    )
    .bind(student_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn find_owned_feedback(
    conn: &mut SqliteConnection,
    id: &str,
    user_id: &str,
) -> Result<Option<Feedback>, sqlx::Error> {
    sqlx::query_as::<_, Feedback>(
        r#"
        SELECT f.id, f.task_id, f.student_id, f.text, f.score, f.created_at
        FROM feedback f
        JOIN tasks t ON t.id = f.task_id
        JOIN courses c ON c.id = t.course_id
        WHERE f.id = ? AND c.user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await
}

/// One feedback row per `(task, student)`: updates the newest existing row
/// or inserts a new one.
pub async fn upsert_feedback(
    conn: &mut SqliteConnection,
    task_id: &str,
    student_id: &str,
    text: Option<&str>,
    score: Option<i64>,
) -> Result<Feedback, sqlx::Error> {
    let existing = sqlx::query_as::<_, Feedback>(
        r#"
        SELECT id, task_id, student_id, text, score, created_at
        FROM feedback
        WHERE task_id = ? AND student_id = ?
        ORDER BY created_at DESC, rowid DESC
        LIMIT 1
        "#,
    )
    .bind(task_id)
    .bind(student_id)
    .fetch_optional(&mut *conn)
    .await?;

    let now = now();
    match existing {
        Some(mut feedback) => {
            sqlx::query("UPDATE feedback SET text = ?, score = ?, created_at = ? WHERE id = ?")
                .bind(text)
                .bind(score)
                .bind(&now)
                .bind(&feedback.id)
                .execute(&mut *conn)
                .await?;
            feedback.text = text.map(str::to_string);
            feedback.score = score;
            feedback.created_at = now;
            Ok(feedback)
        }
        None => {
            let id = new_id();
            sqlx::query(
                r#"
                INSERT INTO feedback (id, task_id, student_id, text, score, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&id)
            .bind(task_id)
            .bind(student_id)
            .bind(text)
            .bind(score)
            .bind(&now)
            .execute(&mut *conn)
            .await?;

            Ok(Feedback {
                id,
                task_id: task_id.to_string(),
                student_id: student_id.to_string(),
                text: text.map(str::to_string),
                score,
                created_at: now,
            })
        }
    }
}

pub async fn delete_feedback(conn: &mut SqliteConnection, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM feedback WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    Ok(result > 0)
}
