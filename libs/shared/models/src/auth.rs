use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[serde(alias = "Patient", alias = "client", alias = "user")]
    Patient,
    #[serde(alias = "Therapist")]
    Therapist,
    #[serde(alias = "Admin")]
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Patient => write!(f, "patient"),
            UserRole::Therapist => write!(f, "therapist"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

/// Identity blob persisted next to the bearer token after login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserIdentity {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    #[serde(default = "default_role")]
    pub role: UserRole,
}

fn default_role() -> UserRole {
    UserRole::Patient
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: UserIdentity,
    pub saved_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(token: impl Into<String>, user: UserIdentity) -> Self {
        Self {
            token: token.into(),
            user,
            saved_at: Some(Utc::now()),
        }
    }

    pub fn user_id(&self) -> i64 {
        self.user.id
    }

    pub fn bearer(&self) -> &str {
        &self.token
    }

    pub fn is_therapist(&self) -> bool {
        self.user.role == UserRole::Therapist
    }
}
