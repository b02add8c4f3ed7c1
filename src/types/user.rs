use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Insert payload for the users table. `password` is already hashed.
pub struct DBUserCreate {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct RSignup {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub password1: String,
    pub password2: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct RLogin {
    pub username: String,
    pub password: String,
    /// Where to send the client after login.
    pub next: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct LoginRes {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub redirect: String,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct RedirectRes {
    pub redirect: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct RPasswordChange {
    pub old_password: String,
    pub new_password1: String,
    pub new_password2: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct RPasswordReset {
    pub email: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct RPasswordResetConfirm {
    pub new_password1: String,
    pub new_password2: String,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct MessageRes {
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct UserProfileRes {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
}

impl From<entity::user::Model> for UserProfileRes {
    fn from(user: entity::user::Model) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name().to_string(),
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_staff: user.is_staff,
            date_joined: user.date_joined,
        }
    }
}

/// The user behind a validated bearer token, stored in request extensions.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub is_superuser: bool,
}
