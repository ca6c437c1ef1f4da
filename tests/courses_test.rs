mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{spawn_default_app, str_field};

#[tokio::test]
async fn test_requests_without_session_are_unauthorized() {
    let (app, _) = spawn_default_app().await;

    let res = app.get("/courses", None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app.get("/courses", Some("user_id=forged")).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let (app, _) = spawn_default_app().await;
    app.login_as("anna").await;

    let res = app
        .post("/auth/login", None, json!({ "username": "anna", "password": "nope nope" }))
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let (app, _) = spawn_default_app().await;
    app.login_as("anna").await;

    let res = app
        .post(
            "/auth/register",
            None,
            json!({
                "username": "anna",
                "email": "other@example.com",
                "password": "long enough",
                "password2": "long enough",
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_mismatched_passwords_fail_validation() {
    let (app, _) = spawn_default_app().await;
    let res = app
        .post(
            "/auth/register",
            None,
            json!({
                "username": "anna",
                "email": "anna@example.com",
                "password": "long enough",
                "password2": "different!",
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(res.json()["fields"]["password2"].is_array());
}

#[tokio::test]
async fn test_empty_course_title_is_invalid() {
    let (app, _) = spawn_default_app().await;
    let cookie = app.login_as("anna").await;

    let res = app.post("/courses", Some(&cookie), json!({ "title": "" })).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(res.json()["fields"]["title"].is_array());
    assert_eq!(app.count("courses").await, 0);
}

#[tokio::test]
async fn test_foreign_course_is_not_found_and_unchanged() {
    let (app, _) = spawn_default_app().await;
    let anna = app.login_as("anna").await;
    let bert = app.login_as("bert").await;
    let course = app.create_course(&anna, "Math").await;
    let id = str_field(&course, "id");

    let res = app.patch(&format!("/courses/{id}"), Some(&bert), json!({ "title": "Mine now" })).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.delete(&format!("/courses/{id}"), Some(&bert)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.get(&format!("/courses/{id}"), Some(&bert)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.get(&format!("/courses/{id}"), Some(&anna)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["title"], "Math");

    let res = app.get("/courses", Some(&bert)).await;
    assert_eq!(res.json().as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_foreign_task_is_not_found() {
    let (app, _) = spawn_default_app().await;
    let anna = app.login_as("anna").await;
    let bert = app.login_as("bert").await;
    let course = app.create_course(&anna, "Math").await;
    let task = app.create_task(&anna, str_field(&course, "id"), "Fractions").await;
    let task_id = str_field(&task, "id");

    let res = app.patch(&format!("/tasks/{task_id}"), Some(&bert), json!({ "is_done": true })).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    let res = app.get(&format!("/tasks/{task_id}/missing"), Some(&bert)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.get(&format!("/tasks/{task_id}"), Some(&anna)).await;
    assert_eq!(res.json()["is_done"], false);
}

#[tokio::test]
async fn test_task_update_can_clear_due_date() {
    let (app, _) = spawn_default_app().await;
    let anna = app.login_as("anna").await;
    let course = app.create_course(&anna, "Math").await;
    let task = app.create_task(&anna, str_field(&course, "id"), "Fractions").await;
    let uri = format!("/tasks/{}", str_field(&task, "id"));

    let res = app.patch(&uri, Some(&anna), json!({ "due_date": "2026-11-01" })).await;
    assert_eq!(res.json()["due_date"], "2026-11-01");

    let res = app.patch(&uri, Some(&anna), json!({ "title": "Decimals" })).await;
    assert_eq!(res.json()["due_date"], "2026-11-01");
    assert_eq!(res.json()["title"], "Decimals");

    let res = app.patch(&uri, Some(&anna), json!({ "due_date": null })).await;
    assert!(res.json()["due_date"].is_null());
}

#[tokio::test]
async fn test_delete_course_cascades() {
    let (app, blobs) = spawn_default_app().await;
    let anna = app.login_as("anna").await;
    let course = app.create_course(&anna, "Math").await;
    let course_id = str_field(&course, "id");
    let task = app.create_task(&anna, course_id, "Fractions").await;
    let task_id = str_field(&task, "id");
    let students = app.add_students(&anna, course_id, 2).await;
    let alias = str_field(&students[0], "alias");
    let student_id = str_field(&students[0], "id");

    let res = app.upload(alias, task_id, "work.txt", b"1/2 + 1/3 = 5/6").await;
    assert_eq!(res.status, StatusCode::CREATED);
    let res = app
        .put(
            &format!("/tasks/{task_id}/feedback/{student_id}"),
            Some(&anna),
            json!({ "text": "Good", "score": 9 }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let res = app
        .post(&format!("/s/{alias}/tasks/{task_id}/messages"), None, json!({ "text": "Done!" }))
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(blobs.len(), 1);

    let res = app.delete(&format!("/courses/{course_id}"), Some(&anna)).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    for table in ["courses", "tasks", "students", "submissions", "feedback", "messages"] {
        assert_eq!(app.count(table).await, 0, "{table} not emptied");
    }
    assert_eq!(app.count("retired_aliases").await, 2);
    assert!(blobs.is_empty());

    let res = app.get(&format!("/s/{alias}"), None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rotating_join_link_revokes_old_one() {
    let (app, _) = spawn_default_app().await;
    let anna = app.login_as("anna").await;
    let course = app.create_course(&anna, "Math").await;
    let old_link = str_field(&course, "join_link").to_string();

    let res = app.get(&format!("/join/{old_link}"), None).await;
    assert_eq!(res.status, StatusCode::OK);

    let res = app
        .request(
            axum::http::Method::POST,
            &format!("/courses/{}/link", str_field(&course, "id")),
            Some(&anna),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let new_link = res.json()["join_link"].as_str().unwrap().to_string();
    assert_ne!(new_link, old_link);

    assert_eq!(app.get(&format!("/join/{old_link}"), None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get(&format!("/join/{new_link}"), None).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_profiles() {
    let (app, _) = spawn_default_app().await;
    let anna = app.login_as("anna").await;
    app.login_as("bert").await;

    let res = app
        .patch("/profile", Some(&anna), json!({ "about_me": "Teaches math", "show_email": true }))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.json().get("password_hash").is_none());

    let res = app.patch("/profile", Some(&anna), json!({ "username": "bert" })).await;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = app.get("/users/anna", Some(&anna)).await;
    let profile = res.json();
    assert_eq!(profile["about_me"], "Teaches math");
    assert_eq!(profile["email"], "anna@example.com");
    assert!(str_field(&profile, "avatar_url").starts_with("https://www.gravatar.com/avatar/"));

    let res = app.get("/users/bert", Some(&anna)).await;
    assert!(res.json()["email"].is_null());

    let res = app.request(axum::http::Method::POST, "/auth/logout", Some(&anna), None).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
}
