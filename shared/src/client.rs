//! Auth DTOs
//!
//! Request/response types of the `/login`, `/logout` and `/auth/profile`
//! endpoints. The backend names the user object `admin`; both spellings
//! are accepted.

use serde::{Deserialize, Serialize};

use crate::models::User;

// =============================================================================
// Auth API DTOs
// =============================================================================

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginData {
    pub token: String,
    #[serde(alias = "admin")]
    pub user: User,
}

/// Profile response data (`GET`/`PUT /auth/profile`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileData {
    #[serde(alias = "admin")]
    pub user: User,
}

/// Sparse profile update: absent fields are left out of the request body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_confirmation: Option<String>,
}

impl ProfileUpdate {
    /// Whether nothing would be sent
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.username.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.password.is_none()
    }

    /// Set a new password; the confirmation is always sent alongside it
    pub fn with_password(mut self, password: impl Into<String>, confirmation: Option<String>) -> Self {
        self.password = Some(password.into());
        self.password_confirmation = Some(confirmation.unwrap_or_default());
        self
    }
}
