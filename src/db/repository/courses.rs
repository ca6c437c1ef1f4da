use sqlx::SqliteConnection;
use uuid::Uuid;

use super::{new_id, now};
use crate::error::is_unique_violation;
use crate::models::{Course, NewCourseRequest, UpdateCourseRequest};

const JOIN_LINK_ATTEMPTS: usize = 3;

fn new_join_link() -> String {
    Uuid::new_v4().simple().to_string()
}

pub async fn fetch_courses_for_owner(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        r#"
        SELECT id, user_id, title, description, join_link, created_at
        FROM courses
        WHERE user_id = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn find_course_by_id(conn: &mut SqliteConnection, id: &str) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        "SELECT id, user_id, title, description, join_link, created_at FROM courses WHERE id = ?"
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn find_owned_course(
    conn: &mut SqliteConnection,
    id: &str,
    user_id: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        "SELECT id, user_id, title, description, join_link, created_at FROM courses WHERE id = ? AND user_id = ?"
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn find_course_by_link(
    conn: &mut SqliteConnection,
    join_link: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        "SELECT id, user_id, title, description, join_link, created_at FROM courses WHERE join_link = ?"
    )
    .bind(join_link)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn insert_course(
    conn: &mut SqliteConnection,
    user_id: &str,
    req: NewCourseRequest,
) -> Result<Course, sqlx::Error> {
    let id = new_id();
    let now = now();

    let mut attempt = 0;
    let join_link = loop {
        let join_link = new_join_link();
        let result = sqlx::query(
            r#"
            INSERT INTO courses
                (id, user_id, title, description, join_link, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(&join_link)
        .bind(&now)
        .execute(&mut *conn)
        .await;

        match result {
            Ok(_) => break join_link,
            Err(e) if is_unique_violation(&e) && attempt + 1 < JOIN_LINK_ATTEMPTS => attempt += 1,
            Err(e) => return Err(e),
        }
    };

    Ok(Course {
        id,
        user_id: user_id.to_string(),
        title: req.title,
        description: req.description,
        join_link,
        created_at: now,
    })
}

pub async fn update_course(
    conn: &mut SqliteConnection,
    id: &str,
    req: UpdateCourseRequest,
) -> Result<Option<Course>, sqlx::Error> {
    let mut current = match find_course_by_id(conn, id).await? {
        Some(c) => c,
        None => return Ok(None),
    };

    if let Some(title) = req.title {
        current.title = title;
    }
    if let Some(description) = req.description {
        current.description = description;
    }

    sqlx::query("UPDATE courses SET title = ?, description = ? WHERE id = ?")
        .bind(&current.title)
        .bind(&current.description)
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(Some(current))
}

/// Issues a fresh join link; the old one stops working immediately.
pub async fn rotate_join_link(conn: &mut SqliteConnection, id: &str) -> Result<Option<Course>, sqlx::Error> {
    let mut attempt = 0;
    loop {
        let join_link = new_join_link();
        let result = sqlx::query("UPDATE courses SET join_link = ? WHERE id = ?")
            .bind(&join_link)
            .bind(id)
            .execute(&mut *conn)
            .await;

        match result {
            Ok(r) if r.rows_affected() == 0 => return Ok(None),
            Ok(_) => return find_course_by_id(conn, id).await,
            Err(e) if is_unique_violation(&e) && attempt + 1 < JOIN_LINK_ATTEMPTS => attempt += 1,
            Err(e) => return Err(e),
        }
    }
}

/// Deletes a course with its tasks, students and everything hanging off
/// them. Returns the blob names of the removed submissions, or `None` when
/// the course does not exist. Run inside a transaction.
pub async fn delete_course(conn: &mut SqliteConnection, id: &str) -> Result<Option<Vec<String>>, sqlx::Error> {
    if find_course_by_id(conn, id).await?.is_none() {
        return Ok(None);
    }

    let blobs: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT filename FROM submissions
        WHERE task_id IN (SELECT id FROM tasks WHERE course_id = ?1)
           OR student_id IN (SELECT id FROM students WHERE course_id = ?1)
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        DELETE FROM submissions
        WHERE task_id IN (SELECT id FROM tasks WHERE course_id = ?1)
           OR student_id IN (SELECT id FROM students WHERE course_id = ?1)
        "#,
    )
    .bind(id)
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        DELETE FROM feedback
        WHERE task_id IN (SELECT id FROM tasks WHERE course_id = ?1)
           OR student_id IN (SELECT id FROM students WHERE course_id = ?1)
        "#,
    )
    .bind(id)
    .execute(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM messages WHERE task_id IN (SELECT id FROM tasks WHERE course_id = ?)")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM tasks WHERE course_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        "INSERT OR IGNORE INTO retired_aliases (alias, retired_at) SELECT alias, ? FROM students WHERE course_id = ?"
    )
    .bind(now())
    .bind(id)
    .execute(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM students WHERE course_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(Some(blobs))
}
