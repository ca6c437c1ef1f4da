use sqlx::SqliteConnection;

use super::{new_id, now};
use crate::models::{Message, MessageAuthor};

pub async fn fetch_messages_for_task(
    conn: &mut SqliteConnection,
    task_id: &str,
) -> Result<Vec<Message>, sqlx::Error> {
    sqlx::query_as::<_, Message>(
        r#"
        SELECT id, task_id, text, student_alias, user_id, name, created_at
        FROM messages
        WHERE task_id = ?
        ORDER BY created_at, rowid
        "#,
    )
    .bind(task_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn find_owned_message(
    conn: &mut SqliteConnection,
    id: &str,
    user_id: &str,
) -> Result<Option<Message>, sqlx::Error> {
    sqlx::query_as::<_, Message>(
        r#"
        SELECT m.id, m.task_id, m.text, m.student_alias, m.user_id, m.name, m.created_at
        FROM messages m
        JOIN tasks t ON t.id = m.task_id
        JOIN courses c ON c.id = t.course_id
        WHERE m.id = ? AND c.user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn insert_message(
    conn: &mut SqliteConnection,
    task_id: &str,
    text: &str,
    author: MessageAuthor<'_>,
) -> Result<Message, sqlx::Error> {
    let id = new_id();
    let now = now();
    let (student_alias, user_id, name) = match author {
        MessageAuthor::Student { alias, name } => (Some(alias), None, name),
        MessageAuthor::Instructor { user_id, name } => (None, Some(user_id), name),
    };

    sqlx::query(
        r#"
        INSERT INTO messages
            (id, task_id, text, student_alias, user_id, name, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(task_id)
    .bind(text)
    .bind(student_alias)
    .bind(user_id)
    .bind(name)
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    Ok(Message {
        id,
        task_id: task_id.to_string(),
        text: text.to_string(),
        student_alias: student_alias.map(str::to_string),
        user_id: user_id.map(str::to_string),
        name: Some(name.to_string()),
        created_at: now,
    })
}

pub async fn delete_message(conn: &mut SqliteConnection, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM messages WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    Ok(result > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::*;

    #[tokio::test]
    async fn test_message_authors() {
        let pool = setup_test_db().await;
        let owner = seed_user(&pool, "anna").await;
        let course = seed_course(&pool, &owner, "Math").await;
        let task = seed_task(&pool, &course, "Fractions").await;

        let mut conn = pool.acquire().await.unwrap();
        insert_message(
            &mut conn,
            &task.id,
            "Is question 3 optional?",
            MessageAuthor::Student { alias: "aaaa", name: "Participant_1" },
        )
        .await
        .unwrap();
        insert_message(
            &mut conn,
            &task.id,
            "No.",
            MessageAuthor::Instructor { user_id: &owner.id, name: &owner.username },
        )
        .await
        .unwrap();

        let messages = fetch_messages_for_task(&mut conn, &task.id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].student_alias.as_deref(), Some("aaaa"));
        assert!(messages[0].user_id.is_none());
        assert_eq!(messages[1].user_id.as_deref(), Some(owner.id.as_str()));
        assert!(messages[1].student_alias.is_none());
    }

    #[tokio::test]
    async fn test_message_requires_existing_task() {
        let pool = setup_test_db().await;
        let mut conn = pool.acquire().await.unwrap();
        let result = insert_message(
            &mut conn,
            "missing-task",
            "hello",
            MessageAuthor::Student { alias: "aaaa", name: "Participant_1" },
        )
        .await;
        assert!(result.is_err());
    }
}
