use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub about_me: Option<String>,
    pub institution: Option<String>,
    pub show_email: bool,
    pub last_seen: String,
    pub created_at: String,
}

impl User {
    /// Gravatar identicon keyed by the SHA-256 of the normalized email.
    pub fn avatar_url(&self, size: u32) -> String {
        let digest = Sha256::digest(self.email.trim().to_lowercase().as_bytes());
        format!("https://www.gravatar.com/avatar/{:x}?d=identicon&s={}", digest, size)
    }

    pub fn public_profile(&self) -> PublicProfile {
        PublicProfile {
            username: self.username.clone(),
            email: self.show_email.then(|| self.email.clone()),
            about_me: self.about_me.clone(),
            institution: self.institution.clone(),
            last_seen: self.last_seen.clone(),
            avatar_url: self.avatar_url(128),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicProfile {
    pub username: String,
    pub email: Option<String>,
    pub about_me: Option<String>,
    pub institution: Option<String>,
    pub last_seen: String,
    pub avatar_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 64, message = "Username must be 1 to 64 characters"))]
    pub username: String,
    #[validate(
        email(message = "Enter a valid email address"),
        length(max = 120, message = "Email must be at most 120 characters")
    )]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub password2: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 64, message = "Username must be 1 to 64 characters"))]
    pub username: Option<String>,
    #[validate(length(max = 140, message = "About me must be at most 140 characters"))]
    pub about_me: Option<String>,
    #[validate(length(max = 140, message = "Institution must be at most 140 characters"))]
    pub institution: Option<String>,
    pub show_email: Option<bool>,
}
