//! Users, companies (tenants) and login sessions.

use super::Db;
use crate::auth::{hash_password, new_session_token, verify_password};
use crate::error::{not_found, tagged, validation, IntoResult};
use crate::model::{Company, NewUser, Role, User};
use crate::{ErrorType, Result};
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use std::str::FromStr;
use tracing::{debug, info};

const USER_COLUMNS: &str = "id, username, role, company_id, created_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    role: String,
    company_id: Option<i64>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = crate::Error;

    fn try_from(row: UserRow) -> Result<Self> {
        let role = Role::from_str(&row.role)
            .with_context(|| format!("Invalid role '{}' for user {}", row.role, row.id))?;
        Ok(User {
            id: row.id,
            username: row.username,
            role,
            company_id: row.company_id,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CompanyRow {
    id: i64,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<CompanyRow> for Company {
    fn from(row: CompanyRow) -> Self {
        Company {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

/// A login session.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub(crate) struct Session {
    pub(crate) token: String,
    pub(crate) user_id: i64,
    pub(crate) expires_at: DateTime<Utc>,
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

impl Db {
    /// Creates a user with a hashed password and seeds their company settings.
    pub(crate) async fn create_user(&self, new_user: &NewUser) -> Result<User> {
        let username = new_user.username.trim();
        if username.is_empty() {
            return Err(validation("Username is required"));
        }
        if new_user.password.is_empty() {
            return Err(validation("Password is required"));
        }
        if let Some(company_id) = new_user.company_id {
            self.get_company(company_id).await?;
        }

        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, role, company_id, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(username)
        .bind(hash_password(&new_user.password))
        .bind(new_user.role.to_string())
        .bind(new_user.company_id)
        .bind(Utc::now())
        .execute(self.pool())
        .await;
        let id = match result {
            Ok(r) => r.last_insert_rowid(),
            Err(e) if is_unique_violation(&e) => {
                return Err(tagged(
                    ErrorType::Conflict,
                    format!("Username '{username}' already exists"),
                ));
            }
            Err(e) => {
                return Err(e)
                    .context("Failed to create user")
                    .pub_result(ErrorType::Database)
            }
        };
        self.seed_company_settings(id).await?;
        info!("Created user '{username}' ({}) with id {id}", new_user.role);
        self.get_user(id).await
    }

    pub(crate) async fn get_user(&self, id: i64) -> Result<User> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
                .bind(id)
                .fetch_optional(self.pool())
                .await
                .context("Failed to get user")
                .pub_result(ErrorType::Database)?;
        row.ok_or_else(|| not_found(format!("User {id} not found")))?
            .try_into()
    }

    pub(crate) async fn get_user_by_username(&self, username: &str) -> Result<User> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"))
                .bind(username)
                .fetch_optional(self.pool())
                .await
                .context("Failed to get user")
                .pub_result(ErrorType::Database)?;
        row.ok_or_else(|| not_found(format!("User '{username}' not found")))?
            .try_into()
    }

    /// Returns the user when the password matches. Unknown users and wrong passwords produce the
    /// same error.
    pub(crate) async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT id, password_hash FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(self.pool())
                .await
                .context("Failed to look up user")
                .pub_result(ErrorType::Database)?;
        match row {
            Some((id, hash)) if verify_password(password, &hash) => self.get_user(id).await,
            _ => {
                debug!("Failed login for '{username}'");
                Err(tagged(
                    ErrorType::Unauthorized,
                    "Invalid username or password",
                ))
            }
        }
    }

    pub(crate) async fn list_users(&self) -> Result<Vec<User>> {
        let rows: Vec<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
                .fetch_all(self.pool())
                .await
                .context("Failed to list users")
                .pub_result(ErrorType::Database)?;
        rows.into_iter().map(User::try_from).collect()
    }

    /// Deletes a user. Their jobs remain with no owner.
    pub(crate) async fn delete_user(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await
            .context("Failed to delete user")
            .pub_result(ErrorType::Database)?;
        if result.rows_affected() == 0 {
            return Err(not_found(format!("User {id} not found")));
        }
        info!("Deleted user {id}");
        Ok(())
    }

    pub(crate) async fn set_user_role(&self, id: i64, role: Role) -> Result<User> {
        let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
            .bind(role.to_string())
            .bind(id)
            .execute(self.pool())
            .await
            .context("Failed to update user role")
            .pub_result(ErrorType::Database)?;
        if result.rows_affected() == 0 {
            return Err(not_found(format!("User {id} not found")));
        }
        self.get_user(id).await
    }

    /// Assigns the user to a company, or removes them from their company when `company_id` is
    /// `None`.
    pub(crate) async fn set_user_company(&self, id: i64, company_id: Option<i64>) -> Result<User> {
        if let Some(company_id) = company_id {
            self.get_company(company_id).await?;
        }
        let result = sqlx::query("UPDATE users SET company_id = ? WHERE id = ?")
            .bind(company_id)
            .bind(id)
            .execute(self.pool())
            .await
            .context("Failed to update user company")
            .pub_result(ErrorType::Database)?;
        if result.rows_affected() == 0 {
            return Err(not_found(format!("User {id} not found")));
        }
        self.get_user(id).await
    }

    pub(crate) async fn user_count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool())
            .await
            .context("Failed to count users")
            .pub_result(ErrorType::Database)?;
        Ok(count)
    }

    pub(crate) async fn create_company(&self, name: &str) -> Result<Company> {
        let name = name.trim();
        if name.is_empty() {
            return Err(validation("Company name is required"));
        }
        let result = sqlx::query("INSERT INTO companies (name, created_at) VALUES (?, ?)")
            .bind(name)
            .bind(Utc::now())
            .execute(self.pool())
            .await;
        let id = match result {
            Ok(r) => r.last_insert_rowid(),
            Err(e) if is_unique_violation(&e) => {
                return Err(tagged(
                    ErrorType::Conflict,
                    format!("Company '{name}' already exists"),
                ));
            }
            Err(e) => {
                return Err(e)
                    .context("Failed to create company")
                    .pub_result(ErrorType::Database)
            }
        };
        info!("Created company '{name}' with id {id}");
        self.get_company(id).await
    }

    pub(crate) async fn get_company(&self, id: i64) -> Result<Company> {
        let row: Option<CompanyRow> =
            sqlx::query_as("SELECT id, name, created_at FROM companies WHERE id = ?")
                .bind(id)
                .fetch_optional(self.pool())
                .await
                .context("Failed to get company")
                .pub_result(ErrorType::Database)?;
        row.map(Into::into)
            .ok_or_else(|| not_found(format!("Company {id} not found")))
    }

    pub(crate) async fn list_companies(&self) -> Result<Vec<Company>> {
        let rows: Vec<CompanyRow> =
            sqlx::query_as("SELECT id, name, created_at FROM companies ORDER BY name")
                .fetch_all(self.pool())
                .await
                .context("Failed to list companies")
                .pub_result(ErrorType::Database)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Deletes a company. Its users stay and are no longer part of any company.
    pub(crate) async fn delete_company(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM companies WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await
            .context("Failed to delete company")
            .pub_result(ErrorType::Database)?;
        if result.rows_affected() == 0 {
            return Err(not_found(format!("Company {id} not found")));
        }
        info!("Deleted company {id}");
        Ok(())
    }

    /// Starts a session for the user that lasts `ttl_hours`.
    pub(crate) async fn create_session(&self, user_id: i64, ttl_hours: u32) -> Result<Session> {
        let session = Session {
            token: new_session_token(),
            user_id,
            expires_at: Utc::now() + Duration::hours(i64::from(ttl_hours)),
        };
        sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(&session.token)
            .bind(session.user_id)
            .bind(session.expires_at)
            .execute(self.pool())
            .await
            .context("Failed to create session")
            .pub_result(ErrorType::Database)?;
        Ok(session)
    }

    /// Returns the user a session token belongs to, or `None` when the token is unknown or has
    /// expired. Expired sessions are removed.
    pub(crate) async fn user_for_session(&self, token: &str) -> Result<Option<User>> {
        let session: Option<Session> =
            sqlx::query_as("SELECT token, user_id, expires_at FROM sessions WHERE token = ?")
                .bind(token)
                .fetch_optional(self.pool())
                .await
                .context("Failed to look up session")
                .pub_result(ErrorType::Database)?;
        let Some(session) = session else {
            return Ok(None);
        };
        if session.expires_at <= Utc::now() {
            debug!("Session for user {} has expired", session.user_id);
            self.delete_session(token).await?;
            return Ok(None);
        }
        Ok(Some(self.get_user(session.user_id).await?))
    }

    pub(crate) async fn delete_session(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(self.pool())
            .await
            .context("Failed to delete session")
            .pub_result(ErrorType::Database)?;
        Ok(())
    }
}
