use crate::commands::Out;
use crate::model::Company;
use crate::{Config, Result};
use std::fmt::Write;

pub async fn company_add(config: Config, name: &str) -> Result<Out<Company>> {
    let company = config.db().create_company(name).await?;
    Ok(Out::new(
        format!("Created company '{}' with id {}", company.name, company.id),
        company,
    ))
}

pub async fn company_list(config: Config) -> Result<Out<Vec<Company>>> {
    let companies = config.db().list_companies().await?;
    let mut message = format!("{} companies", companies.len());
    for company in &companies {
        let _ = write!(message, "\n{:>4}  {}", company.id, company.name);
    }
    Ok(Out::new(message, companies))
}

/// Deletes a company. Its users remain without a company.
pub async fn company_delete(config: Config, id: i64) -> Result<Out<i64>> {
    config.db().delete_company(id).await?;
    Ok(Out::new(format!("Deleted company {id}"), id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_company_lifecycle() {
        let env = TestEnv::new().await;
        let added = company_add(env.config(), "Big Rig Recovery").await.unwrap();
        let id = added.structure().unwrap().id;
        let user = env.user_in("dave", Some(id)).await;

        let out = company_list(env.config()).await.unwrap();
        assert!(out.message().contains("Big Rig Recovery"));

        company_delete(env.config(), id).await.unwrap();
        assert_eq!(env.db().get_user(user.id).await.unwrap().company_id, None);
        assert!(company_delete(env.config(), id).await.is_err());
    }
}
