use crate::model::number_or_text;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_COMPANY_NAME: &str = "Professional Towing";
pub const DEFAULT_COMPANY_SUBTITLE: &str = "Heavy Duty Recovery Services";
pub const DEFAULT_COMPANY_LOGO: &str = "🚛";
pub const DEFAULT_INVOICE_FOOTER: &str = "Thank you for your business!\nPayment due within 30 days";

/// The branding printed on a user's invoices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySettings {
    pub company_name: String,
    pub company_subtitle: String,
    /// Either an emoji/text logo or the public path of an uploaded image (`/uploads/...`).
    pub company_logo: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(deserialize_with = "number_or_text::deserialize")]
    pub default_fuel_surcharge: f64,
    /// Footer text; each line is printed separately.
    pub invoice_footer: String,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for CompanySettings {
    fn default() -> Self {
        Self {
            company_name: DEFAULT_COMPANY_NAME.to_string(),
            company_subtitle: DEFAULT_COMPANY_SUBTITLE.to_string(),
            company_logo: DEFAULT_COMPANY_LOGO.to_string(),
            address: None,
            phone: None,
            email: None,
            default_fuel_surcharge: crate::model::DEFAULT_FUEL_SURCHARGE,
            invoice_footer: DEFAULT_INVOICE_FOOTER.to_string(),
            updated_at: None,
        }
    }
}

impl CompanySettings {
    /// Whether the logo is an uploaded image rather than text.
    pub fn logo_is_image(&self) -> bool {
        self.company_logo.starts_with("/uploads/")
    }

    pub fn footer_lines(&self) -> impl Iterator<Item = &str> {
        self.invoice_footer.lines()
    }

    /// Applies every field that is present in `patch`. An empty string clears an optional field.
    pub fn apply(&mut self, patch: &CompanySettingsPatch) {
        fn set(target: &mut String, value: &Option<String>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }
        fn set_opt(target: &mut Option<String>, value: &Option<String>) {
            if let Some(v) = value {
                *target = if v.trim().is_empty() {
                    None
                } else {
                    Some(v.clone())
                };
            }
        }
        set(&mut self.company_name, &patch.company_name);
        set(&mut self.company_subtitle, &patch.company_subtitle);
        set(&mut self.company_logo, &patch.company_logo);
        set_opt(&mut self.address, &patch.address);
        set_opt(&mut self.phone, &patch.phone);
        set_opt(&mut self.email, &patch.email);
        if let Some(surcharge) = patch.default_fuel_surcharge {
            self.default_fuel_surcharge = surcharge;
        }
        set(&mut self.invoice_footer, &patch.invoice_footer);
    }
}

/// A partial update of [`CompanySettings`]. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySettingsPatch {
    pub company_name: Option<String>,
    pub company_subtitle: Option<String>,
    pub company_logo: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "number_or_text::deserialize_option")]
    pub default_fuel_surcharge: Option<f64>,
    pub invoice_footer: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_patch() {
        let mut settings = CompanySettings::default();
        settings.phone = Some("555-0100".to_string());
        let patch: CompanySettingsPatch = serde_json::from_str(
            r#"{"companyName": "Big Rig Recovery", "phone": "", "defaultFuelSurcharge": "12"}"#,
        )
        .unwrap();
        settings.apply(&patch);
        assert_eq!(settings.company_name, "Big Rig Recovery");
        assert_eq!(settings.company_subtitle, DEFAULT_COMPANY_SUBTITLE);
        assert_eq!(settings.phone, None);
        assert_eq!(settings.default_fuel_surcharge, 12.0);
    }

    #[test]
    fn test_footer_lines_and_logo() {
        let mut settings = CompanySettings::default();
        assert_eq!(
            settings.footer_lines().collect::<Vec<_>>(),
            vec!["Thank you for your business!", "Payment due within 30 days"]
        );
        assert!(!settings.logo_is_image());
        settings.company_logo = "/uploads/logos/abc.png".to_string();
        assert!(settings.logo_is_image());
    }
}
