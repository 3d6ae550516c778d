use crate::args::UserAddArgs;
use crate::commands::Out;
use crate::model::{NewUser, Role, User};
use crate::{Config, Result};
use std::fmt::Write;

/// Creates a user and seeds their company settings with the defaults.
///
/// # Errors
/// - Returns a conflict error if the username is taken.
/// - Returns a not found error if the company does not exist.
pub async fn user_add(config: Config, args: UserAddArgs) -> Result<Out<User>> {
    let user = config
        .db()
        .create_user(&NewUser {
            username: args.username,
            password: args.password,
            role: args.role,
            company_id: args.company,
        })
        .await?;
    Ok(Out::new(
        format!("Created {} '{}' with id {}", user.role, user.username, user.id),
        user,
    ))
}

pub async fn user_list(config: Config) -> Result<Out<Vec<User>>> {
    let users = config.db().list_users().await?;
    let mut message = format!("{} users", users.len());
    for user in &users {
        let company = user
            .company_id
            .map(|id| format!("company {id}"))
            .unwrap_or_else(|| "no company".to_string());
        let _ = write!(
            message,
            "\n{:>4}  {:<20}  {:<5}  {company}",
            user.id, user.username, user.role
        );
    }
    Ok(Out::new(message, users))
}

/// Deletes a user. Their jobs are kept without an owner.
pub async fn user_delete(config: Config, username: &str) -> Result<Out<i64>> {
    let user = config.db().get_user_by_username(username).await?;
    config.db().delete_user(user.id).await?;
    Ok(Out::new(format!("Deleted user '{}'", user.username), user.id))
}

pub async fn user_role(config: Config, username: &str, role: Role) -> Result<Out<User>> {
    let user = config.db().get_user_by_username(username).await?;
    let user = config.db().set_user_role(user.id, role).await?;
    Ok(Out::new(
        format!("'{}' is now {}", user.username, user.role),
        user,
    ))
}

/// Moves a user into company `company_id`, or out of any company when it is `None`.
pub async fn user_company(
    config: Config,
    username: &str,
    company_id: Option<i64>,
) -> Result<Out<User>> {
    let user = config.db().get_user_by_username(username).await?;
    let user = config.db().set_user_company(user.id, company_id).await?;
    let message = match user.company_id {
        Some(id) => format!("'{}' now belongs to company {id}", user.username),
        None => format!("'{}' no longer belongs to a company", user.username),
    };
    Ok(Out::new(message, user))
}
