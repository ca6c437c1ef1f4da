use std::collections::HashSet;

use sqlx::SqliteConnection;

use super::{new_id, now};
use crate::models::Student;

pub async fn fetch_students_for_course(
    conn: &mut SqliteConnection,
    course_id: &str,
) -> Result<Vec<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(
        r#"
        SELECT id, course_id, alias, name, email, last_seen, created_at
        FROM students
        WHERE course_id = ?
        ORDER BY created_at, rowid
        "#,
    )
    .bind(course_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn find_student_by_alias(
    conn: &mut SqliteConnection,
    alias: &str,
) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(
        "SELECT id, course_id, alias, name, email, last_seen, created_at FROM students WHERE alias = ?"
    )
    .bind(alias)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn find_owned_student(
    conn: &mut SqliteConnection,
    id: &str,
    user_id: &str,
) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(
        r#"
        SELECT s.id, s.course_id, s.alias, s.name, s.email, s.last_seen, s.created_at
        FROM students s
        JOIN courses c ON c.id = s.course_id
        WHERE s.id = ? AND c.user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await
}

/// Every alias ever handed out: live students plus retired ones.
pub async fn fetch_all_aliases(conn: &mut SqliteConnection) -> Result<HashSet<String>, sqlx::Error> {
    let aliases: Vec<String> = sqlx::query_scalar(
        "SELECT alias FROM students UNION SELECT alias FROM retired_aliases"
    )
    .fetch_all(&mut *conn)
    .await?;
    Ok(aliases.into_iter().collect())
}

pub async fn fetch_names_for_course(
    conn: &mut SqliteConnection,
    course_id: &str,
) -> Result<HashSet<String>, sqlx::Error> {
    let names: Vec<String> = sqlx::query_scalar("SELECT name FROM students WHERE course_id = ?")
        .bind(course_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(names.into_iter().collect())
}

pub async fn insert_student(
    conn: &mut SqliteConnection,
    course_id: &str,
    alias: &str,
    name: &str,
) -> Result<Student, sqlx::Error> {
    let id = new_id();
    let now = now();

    sqlx::query(
        r#"
        INSERT INTO students
            (id, course_id, alias, name, email, last_seen, created_at)
        VALUES (?, ?, ?, ?, NULL, NULL, ?)
        "#,
    )
    .bind(&id)
    .bind(course_id)
    .bind(alias)
    .bind(name)
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    Ok(Student {
        id,
        course_id: course_id.to_string(),
        alias: alias.to_string(),
        name: name.to_string(),
        email: None,
        last_seen: None,
        created_at: now,
    })
}

pub async fn update_student_profile(
    conn: &mut SqliteConnection,
    student: &Student,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE students SET name = ?, email = ? WHERE id = ?")
        .bind(&student.name)
        .bind(&student.email)
        .bind(&student.id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn touch_student(conn: &mut SqliteConnection, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE students SET last_seen = ? WHERE id = ?")
        .bind(now())
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Deletes a student with their submissions and feedback and retires the
/// alias so it is never issued again. Returns the removed blob names. Run
/// inside a transaction.
pub async fn delete_student(conn: &mut SqliteConnection, id: &str) -> Result<Option<Vec<String>>, sqlx::Error> {
    let alias: Option<String> = sqlx::query_scalar("SELECT alias FROM students WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    let Some(alias) = alias else {
        return Ok(None);
    };

    let blobs: Vec<String> = sqlx::query_scalar("SELECT filename FROM submissions WHERE student_id = ?")
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM submissions WHERE student_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM feedback WHERE student_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("INSERT OR IGNORE INTO retired_aliases (alias, retired_at) VALUES (?, ?)")
        .bind(&alias)
        .bind(now())
        .execute(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM students WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(Some(blobs))
}
