use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use tracing::{debug, warn};

use crate::access::Principal;
use crate::db::repository;
use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "user_id";

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            warn!("failed to hash password: {}", e);
            AppError::InternalServerError
        })
}

/// A malformed stored hash verifies as `false`.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Cookie key from `SESSION_SECRET`, or a random one that does not survive
/// a restart.
pub fn cookie_key(secret: Option<&str>) -> Result<Key, AppError> {
    match secret {
        Some(secret) => Key::try_from(secret.as_bytes()).map_err(|_| {
            AppError::BadRequest("SESSION_SECRET must be at least 64 bytes".to_string())
        }),
        None => {
            warn!("SESSION_SECRET not set; sessions will not survive a restart");
            Ok(Key::generate())
        }
    }
}

pub fn login_cookie(user_id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, user_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn logout_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// An authenticated instructor, resolved from the private session cookie.
#[derive(Debug, Clone)]
pub struct Instructor {
    pub user: User,
}

impl Instructor {
    pub fn id(&self) -> &str {
        &self.user.id
    }

    pub fn principal(&self) -> Principal {
        Principal::Owner { user_id: self.user.id.clone() }
    }
}

impl FromRequestParts<AppState> for Instructor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Ok(jar) = PrivateCookieJar::<Key>::from_request_parts(parts, state).await;
        let user_id = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or(AppError::Unauthorized)?;

        let mut conn = state.db.acquire().await?;
        let user = repository::find_user_by_id(&mut conn, &user_id)
            .await?
            .ok_or_else(|| {
                debug!(user_id = %user_id, "session refers to a missing user");
                AppError::Unauthorized
            })?;
        repository::touch_user(&mut conn, &user.id).await?;

        Ok(Instructor { user })
    }
}
