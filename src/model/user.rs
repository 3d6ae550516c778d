use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a user is allowed to do.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Manages users and companies and sees every job.
    Admin,
    #[default]
    User,
}

serde_plain::derive_display_from_serialize!(Role);
serde_plain::derive_fromstr_from_deserialize!(Role);

/// A tenant. Users in the same company see each other's jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A user account. The password hash never leaves the database layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub company_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// The data needed to create a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub company_id: Option<i64>,
}

/// Who is asking. Used to decide which jobs are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    /// Local administration through the CLI; sees everything.
    System,
    User {
        id: i64,
        role: Role,
        company_id: Option<i64>,
    },
}

impl From<&User> for Viewer {
    fn from(user: &User) -> Self {
        Viewer::User {
            id: user.id,
            role: user.role,
            company_id: user.company_id,
        }
    }
}

impl Viewer {
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Viewer::System => None,
            Viewer::User { id, .. } => Some(*id),
        }
    }

    /// Whether this viewer sees all jobs regardless of ownership.
    pub fn sees_everything(&self) -> bool {
        match self {
            Viewer::System => true,
            Viewer::User { role, .. } => *role == Role::Admin,
        }
    }
}
