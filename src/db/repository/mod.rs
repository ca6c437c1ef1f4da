//! Row-level storage operations.
//!
//! Every function takes an explicit connection so callers decide the
//! transaction boundary. Cascading deletes are spelled out here; the schema
//! only declares (and enforces) the foreign keys.

mod courses;
mod feedback;
mod messages;
mod students;
mod submissions;
mod tasks;
mod users;

pub use courses::*;
pub use feedback::*;
pub use messages::*;
pub use students::*;
pub use submissions::*;
pub use tasks::*;
pub use users::*;

use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Fixed-width RFC 3339, so text order is time order.
fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
pub(crate) mod test_support {
    use sqlx::SqlitePool;

    use super::*;
    use crate::models::{Course, NewCourseRequest, NewTaskRequest, Student, Task, User};

    pub async fn setup_test_db() -> SqlitePool {
        let pool = crate::db::connect("sqlite::memory:")
            .await
            .expect("Failed to create test db");

        crate::db::migrate(&pool)
            .await
            .expect("Failed to run migrations");

        pool
    }

    pub async fn seed_user(pool: &SqlitePool, username: &str) -> User {
        let mut conn = pool.acquire().await.expect("acquire");
        insert_user(&mut conn, username, &format!("{username}@example.com"), "hash")
            .await
            .expect("Failed to insert user")
    }

    pub async fn seed_course(pool: &SqlitePool, owner: &User, title: &str) -> Course {
        let mut conn = pool.acquire().await.expect("acquire");
        let req = NewCourseRequest {
            title: title.to_string(),
            description: None,
        };
        insert_course(&mut conn, &owner.id, req)
            .await
            .expect("Failed to insert course")
    }

    pub async fn seed_task(pool: &SqlitePool, course: &Course, title: &str) -> Task {
        let mut conn = pool.acquire().await.expect("acquire");
        let req = NewTaskRequest {
            title: title.to_string(),
            text: None,
            due_date: None,
            max_score: Some(10),
            is_visible: true,
        };
        insert_task(&mut conn, &course.id, req)
            .await
            .expect("Failed to insert task")
    }

    pub async fn seed_student(pool: &SqlitePool, course: &Course, alias: &str, name: &str) -> Student {
        let mut conn = pool.acquire().await.expect("acquire");
        insert_student(&mut conn, &course.id, alias, name)
            .await
            .expect("Failed to insert student")
    }
}
