//! Per-user invoice branding.

use super::{percent_from_text, percent_to_text, Db};
use crate::error::IntoResult;
use crate::model::{validate, CompanySettings, CompanySettingsPatch};
use crate::{ErrorType, Result};
use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

#[derive(sqlx::FromRow)]
struct SettingsRow {
    company_name: String,
    company_subtitle: String,
    company_logo: String,
    address: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    default_fuel_surcharge: String,
    invoice_footer: String,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SettingsRow> for CompanySettings {
    type Error = crate::Error;

    fn try_from(row: SettingsRow) -> Result<Self> {
        Ok(CompanySettings {
            company_name: row.company_name,
            company_subtitle: row.company_subtitle,
            company_logo: row.company_logo,
            address: row.address,
            phone: row.phone,
            email: row.email,
            default_fuel_surcharge: percent_from_text(&row.default_fuel_surcharge)?,
            invoice_footer: row.invoice_footer,
            updated_at: Some(row.updated_at),
        })
    }
}

impl Db {
    /// Returns the user's settings, or the defaults when none have been stored.
    pub(crate) async fn get_company_settings(&self, user_id: i64) -> Result<CompanySettings> {
        let row: Option<SettingsRow> = sqlx::query_as(
            "SELECT company_name, company_subtitle, company_logo, address, phone, email, \
             default_fuel_surcharge, invoice_footer, updated_at \
             FROM company_settings WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await
        .context("Failed to get company settings")
        .pub_result(ErrorType::Database)?;
        match row {
            Some(row) => row.try_into(),
            None => Ok(CompanySettings::default()),
        }
    }

    /// Applies `patch` on top of the current settings and stores the result.
    pub(crate) async fn update_company_settings(
        &self,
        user_id: i64,
        patch: &CompanySettingsPatch,
    ) -> Result<CompanySettings> {
        let mut settings = self.get_company_settings(user_id).await?;
        settings.apply(patch);
        validate::company_settings(&settings)?;
        settings.updated_at = Some(Utc::now());
        self.write_settings(user_id, &settings).await?;
        info!("Updated company settings for user {user_id}");
        Ok(settings)
    }

    /// Stores the default settings for a user that has none.
    pub(crate) async fn seed_company_settings(&self, user_id: i64) -> Result<()> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM company_settings WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(self.pool())
                .await
                .context("Failed to check company settings")
                .pub_result(ErrorType::Database)?;
        if count > 0 {
            return Ok(());
        }
        let settings = CompanySettings {
            updated_at: Some(Utc::now()),
            ..CompanySettings::default()
        };
        self.write_settings(user_id, &settings).await?;
        debug!("Seeded company settings for user {user_id}");
        Ok(())
    }

    async fn write_settings(&self, user_id: i64, settings: &CompanySettings) -> Result<()> {
        sqlx::query(
            "INSERT INTO company_settings (user_id, company_name, company_subtitle, company_logo, \
             address, phone, email, default_fuel_surcharge, invoice_footer, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(user_id) DO UPDATE SET \
             company_name = excluded.company_name, \
             company_subtitle = excluded.company_subtitle, \
             company_logo = excluded.company_logo, \
             address = excluded.address, \
             phone = excluded.phone, \
             email = excluded.email, \
             default_fuel_surcharge = excluded.default_fuel_surcharge, \
             invoice_footer = excluded.invoice_footer, \
             updated_at = excluded.updated_at",
        )
        .bind(user_id)
        .bind(&settings.company_name)
        .bind(&settings.company_subtitle)
        .bind(&settings.company_logo)
        .bind(&settings.address)
        .bind(&settings.phone)
        .bind(&settings.email)
        .bind(percent_to_text(settings.default_fuel_surcharge)?)
        .bind(&settings.invoice_footer)
        .bind(settings.updated_at.unwrap_or_else(Utc::now))
        .execute(self.pool())
        .await
        .context("Failed to save company settings")
        .pub_result(ErrorType::Database)?;
        Ok(())
    }
}
