use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum_extra::extract::PrivateCookieJar;
use tracing::info;

use crate::auth::{self, Instructor};
use crate::db::repository;
use crate::error::AppError;
use crate::models::{LoginRequest, PublicProfile, RegisterRequest, UpdateProfileRequest, User};
use crate::state::AppState;
use crate::validation::validated;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let req = validated(req)?;
    if req.password != req.password2 {
        return Err(AppError::field("password2", "Passwords must match"));
    }

    let mut conn = state.db.acquire().await?;
    if repository::find_user_by_username(&mut conn, &req.username).await?.is_some() {
        return Err(AppError::Conflict("Please use a different username".to_string()));
    }
    if repository::find_user_by_email(&mut conn, &req.email).await?.is_some() {
        return Err(AppError::Conflict("Please use a different email address".to_string()));
    }

    let hash = auth::hash_password(&req.password)?;
    let user = repository::insert_user(&mut conn, &req.username, &req.email, &hash)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Username or email already registered"))?;

    info!(user_id = %user.id, username = %user.username, "instructor registered");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(PrivateCookieJar, Json<User>), AppError> {
    let mut conn = state.db.acquire().await?;
    let user = repository::find_user_by_username(&mut conn, &req.username)
        .await?
        .filter(|u| auth::verify_password(&req.password, &u.password_hash))
        .ok_or(AppError::Unauthorized)?;
    repository::touch_user(&mut conn, &user.id).await?;

    info!(user_id = %user.id, "instructor logged in");
    Ok((jar.add(auth::login_cookie(user.id.clone())), Json(user)))
}

pub async fn logout(jar: PrivateCookieJar) -> (PrivateCookieJar, StatusCode) {
    (jar.remove(auth::logout_cookie()), StatusCode::NO_CONTENT)
}

pub async fn get_profile(instructor: Instructor) -> Json<User> {
    Json(instructor.user)
}

pub async fn update_profile(
    State(state): State<AppState>,
    instructor: Instructor,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<User>, AppError> {
    let req = validated(req)?;
    let mut user = instructor.user;
    let mut conn = state.db.acquire().await?;

    if let Some(username) = req.username {
        if username != user.username
            && repository::find_user_by_username(&mut conn, &username).await?.is_some()
        {
            return Err(AppError::Conflict("Please use a different username".to_string()));
        }
        user.username = username;
    }
    if let Some(about_me) = req.about_me {
        user.about_me = Some(about_me);
    }
    if let Some(institution) = req.institution {
        user.institution = Some(institution);
    }
    if let Some(show_email) = req.show_email {
        user.show_email = show_email;
    }

    repository::update_profile(&mut conn, &user)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Please use a different username"))?;
    Ok(Json(user))
}

pub async fn user_profile(
    State(state): State<AppState>,
    _instructor: Instructor,
    Path(username): Path<String>,
) -> Result<Json<PublicProfile>, AppError> {
    let mut conn = state.db.acquire().await?;
    let user = repository::find_user_by_username(&mut conn, &username)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(user.public_profile()))
}
