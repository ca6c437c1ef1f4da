use sqlx::SqliteConnection;

use super::{new_id, now};
use crate::models::User;

pub async fn insert_user(
    conn: &mut SqliteConnection,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    let id = new_id();
    let now = now();

    sqlx::query(
        r#"
        INSERT INTO users
            (id, username, email, password_hash, about_me, institution,
            show_email, last_seen, created_at)
        VALUES (?, ?, ?, ?, NULL, NULL, 0, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(&now)
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    Ok(User {
        id,
        username: username.to_string(),
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        about_me: None,
        institution: None,
        show_email: false,
        last_seen: now.clone(),
        created_at: now,
    })
}

pub async fn find_user_by_id(conn: &mut SqliteConnection, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, username, email, password_hash, about_me, institution, show_email, last_seen, created_at FROM users WHERE id = ?"
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn find_user_by_username(
    conn: &mut SqliteConnection,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, username, email, password_hash, about_me, institution, show_email, last_seen, created_at FROM users WHERE username = ?"
    )
    .bind(username)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn find_user_by_email(
    conn: &mut SqliteConnection,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, username, email, password_hash, about_me, institution, show_email, last_seen, created_at FROM users WHERE email = ?"
    )
    .bind(email)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn update_profile(
    conn: &mut SqliteConnection,
    user: &User,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE users
        SET username = ?,
            about_me = ?,
            institution = ?,
            show_email = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.username)
    .bind(&user.about_me)
    .bind(&user.institution)
    .bind(user.show_email)
    .bind(&user.id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn touch_user(conn: &mut SqliteConnection, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET last_seen = ? WHERE id = ?")
        .bind(now())
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
