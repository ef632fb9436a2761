//! Seed settings loading from config.toml
//!
//! Provides the initial admin settings and CPM rate table used to seed the
//! database on first run. Seeding never overwrites values an admin has
//! already tuned: rows are only written when missing.

use crate::{
    core::settings,
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct SeedConfig {
    /// Platform-wide settings singleton
    pub settings: SettingsSeed,
    /// CPM rate tiers keyed by page count
    #[serde(default)]
    pub cpm_rates: Vec<CpmRateSeed>,
}

/// Seed values for the admin settings singleton
#[derive(Debug, Deserialize, Clone)]
pub struct SettingsSeed {
    /// Referral percentage paid to referrers
    pub referral_percentage: f64,
    /// Public short-link domain
    pub domain: String,
    /// Smallest accepted withdrawal
    pub min_withdrawal: f64,
    /// Largest accepted withdrawal
    pub max_withdrawal: f64,
}

/// Seed values for one CPM tier
#[derive(Debug, Deserialize, Clone)]
pub struct CpmRateSeed {
    /// Page count the tier applies to
    pub page_count: i64,
    /// Base earnings per 1000 views
    pub cpm: f64,
    /// Tier multiplier, defaults to 1.0
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

const fn default_multiplier() -> f64 {
    1.0
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            settings: SettingsSeed {
                referral_percentage: 5.0,
                domain: "localhost".to_string(),
                min_withdrawal: 10.0,
                max_withdrawal: 5000.0,
            },
            cpm_rates: vec![CpmRateSeed {
                page_count: 1,
                cpm: 160.0,
                multiplier: 1.0,
            }],
        }
    }
}

/// Loads seed configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SeedConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads seed configuration from the default location (./config.toml)
pub fn load_default_config() -> Result<SeedConfig> {
    load_config("config.toml")
}

/// Seeds settings rows that do not exist yet.
pub async fn seed_database(db: &DatabaseConnection, config: &SeedConfig) -> Result<()> {
    use crate::entities::{AdminSettings, CpmRate, cpm_rate};
    use sea_orm::{ColumnTrait, QueryFilter};

    if AdminSettings::find().one(db).await?.is_none() {
        let s = &config.settings;
        settings::update_admin_settings(
            db,
            s.referral_percentage,
            s.domain.clone(),
            s.min_withdrawal,
            s.max_withdrawal,
        )
        .await?;
    }

    for rate in &config.cpm_rates {
        let exists = CpmRate::find()
            .filter(cpm_rate::Column::PageCount.eq(rate.page_count))
            .count(db)
            .await?
            > 0;
        if !exists {
            settings::upsert_cpm_rate(db, rate.page_count, rate.cpm, rate.multiplier).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::setup_test_db;

    #[test]
    fn test_parse_seed_config() {
        let toml_str = r#"
            [settings]
            referral_percentage = 5.0
            domain = "short.example"
            min_withdrawal = 10.0
            max_withdrawal = 5000.0

            [[cpm_rates]]
            page_count = 1
            cpm = 160.0

            [[cpm_rates]]
            page_count = 5
            cpm = 200.0
            multiplier = 1.2
        "#;

        let config: SeedConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.settings.referral_percentage, 5.0);
        assert_eq!(config.settings.domain, "short.example");
        assert_eq!(config.cpm_rates.len(), 2);
        assert_eq!(config.cpm_rates[0].multiplier, 1.0); // defaulted
        assert_eq!(config.cpm_rates[1].multiplier, 1.2);
    }

    #[tokio::test]
    async fn test_seed_database_preserves_tuned_values() -> crate::errors::Result<()> {
        let db = setup_test_db().await?;
        let config = SeedConfig::default();

        seed_database(&db, &config).await?;

        // Admin retunes after the first boot
        settings::update_admin_settings(&db, 8.0, "tuned.example".to_string(), 20.0, 9000.0)
            .await?;
        settings::upsert_cpm_rate(&db, 1, 300.0, 1.0).await?;

        // A restart re-seeds; tuned values must survive
        seed_database(&db, &config).await?;

        let tuned = settings::get_admin_settings(&db).await?;
        assert_eq!(tuned.referral_percentage, 8.0);
        let rates = settings::get_cpm_rates(&db).await?;
        assert_eq!(rates[0].cpm, 300.0);
        Ok(())
    }
}
