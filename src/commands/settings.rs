use crate::args::SettingsSetArgs;
use crate::commands::Out;
use crate::model::{CompanySettings, CompanySettingsPatch};
use crate::{Config, Result};
use std::fmt::Write;

fn describe(username: &str, settings: &CompanySettings) -> String {
    let mut message = format!("Company settings of '{username}':");
    let _ = write!(message, "\n  name:      {}", settings.company_name);
    let _ = write!(message, "\n  subtitle:  {}", settings.company_subtitle);
    let _ = write!(message, "\n  logo:      {}", settings.company_logo);
    for (label, value) in [
        ("address", &settings.address),
        ("phone", &settings.phone),
        ("email", &settings.email),
    ] {
        if let Some(value) = value {
            let _ = write!(message, "\n  {:<10} {value}", format!("{label}:"));
        }
    }
    let _ = write!(
        message,
        "\n  fuel surcharge: {}%",
        settings.default_fuel_surcharge
    );
    let _ = write!(
        message,
        "\n  footer:    {}",
        settings.invoice_footer.replace('\n', " / ")
    );
    message
}

/// Shows the company settings of `username`.
pub async fn settings_show(config: Config, username: &str) -> Result<Out<CompanySettings>> {
    let user = config.db().get_user_by_username(username).await?;
    let settings = config.db().get_company_settings(user.id).await?;
    Ok(Out::new(describe(&user.username, &settings), settings))
}

/// Updates the company settings of `args.user` with the fields that were given.
pub async fn settings_set(config: Config, args: SettingsSetArgs) -> Result<Out<CompanySettings>> {
    let user = config.db().get_user_by_username(&args.user).await?;
    let patch = CompanySettingsPatch {
        company_name: args.company_name,
        company_subtitle: args.company_subtitle,
        company_logo: args.company_logo,
        address: args.address,
        phone: args.phone,
        email: args.email,
        default_fuel_surcharge: args.default_fuel_surcharge,
        invoice_footer: args.invoice_footer.map(|f| f.replace("\\n", "\n")),
    };
    let settings = config
        .db()
        .update_company_settings(user.id, &patch)
        .await?;
    Ok(Out::new(describe(&user.username, &settings), settings))
}
