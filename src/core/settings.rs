//! Settings provider - Admin-tunable rates injected into the core.
//!
//! Components that read tunable values (CPM quotes, referral percentage,
//! withdrawal limits) receive a [`SettingsProvider`] rather than reading a
//! process-wide singleton, so tests can pin rates and admins can retune them
//! mid-flight. [`DbSettings`] is the production implementation backed by the
//! `cpm_rates` table and the `admin_settings` singleton row.

use crate::{
    entities::{AdminSettings, CpmRate, admin_settings, cpm_rate},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// A CPM rate quote for a given page count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpmQuote {
    /// Base earnings per 1000 views
    pub cpm: f64,
    /// Tier multiplier applied to the base rate
    pub multiplier: f64,
}

impl CpmQuote {
    /// The rate actually snapshotted onto a link: `cpm * multiplier`.
    #[must_use]
    pub fn effective_cpm(&self) -> f64 {
        self.cpm * self.multiplier
    }
}

/// Read access to the admin-tunable rates the core depends on.
#[allow(async_fn_in_trait)]
pub trait SettingsProvider {
    /// Quotes the CPM tier for a link with the given page count.
    async fn cpm_for_pages(&self, page_count: i64) -> Result<CpmQuote>;

    /// Current percentage of a referred user's earnings paid to the referrer.
    async fn referral_percentage(&self) -> Result<f64>;

    /// Current `(minimum, maximum)` accepted withdrawal amounts.
    async fn withdrawal_limits(&self) -> Result<(f64, f64)>;
}

/// [`SettingsProvider`] backed by the database settings tables.
#[derive(Debug, Clone, Copy)]
pub struct DbSettings<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> DbSettings<'a> {
    /// Wraps a database connection as a settings provider.
    #[must_use]
    pub const fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }
}

impl SettingsProvider for DbSettings<'_> {
    /// Picks the tier with the largest `page_count <= requested`, falling
    /// back to the smallest configured tier when the request is below all of
    /// them.
    async fn cpm_for_pages(&self, page_count: i64) -> Result<CpmQuote> {
        let tier = CpmRate::find()
            .filter(cpm_rate::Column::PageCount.lte(page_count))
            .order_by_desc(cpm_rate::Column::PageCount)
            .one(self.db)
            .await?;

        let tier = match tier {
            Some(t) => Some(t),
            None => {
                CpmRate::find()
                    .order_by_asc(cpm_rate::Column::PageCount)
                    .one(self.db)
                    .await?
            }
        };

        tier.map_or_else(
            || {
                Err(Error::Config {
                    message: "No CPM rates configured".to_string(),
                })
            },
            |t| {
                Ok(CpmQuote {
                    cpm: t.cpm,
                    multiplier: t.multiplier,
                })
            },
        )
    }

    async fn referral_percentage(&self) -> Result<f64> {
        let settings = get_admin_settings(self.db).await?;
        Ok(settings.referral_percentage)
    }

    async fn withdrawal_limits(&self) -> Result<(f64, f64)> {
        let settings = get_admin_settings(self.db).await?;
        Ok((settings.min_withdrawal, settings.max_withdrawal))
    }
}

/// Loads the admin settings singleton row.
///
/// Fails with a configuration error if the row has not been seeded yet.
pub async fn get_admin_settings<C>(db: &C) -> Result<admin_settings::Model>
where
    C: ConnectionTrait,
{
    AdminSettings::find()
        .one(db)
        .await?
        .ok_or_else(|| Error::Config {
            message: "Admin settings have not been seeded".to_string(),
        })
}

/// Creates or replaces the admin settings singleton.
///
/// Validates that the referral percentage is a sane percentage and that the
/// withdrawal limits are positive and ordered.
pub async fn update_admin_settings(
    db: &DatabaseConnection,
    referral_percentage: f64,
    domain: String,
    min_withdrawal: f64,
    max_withdrawal: f64,
) -> Result<admin_settings::Model> {
    if !(0.0..=100.0).contains(&referral_percentage) {
        return Err(Error::Config {
            message: format!("Referral percentage out of range: {referral_percentage}"),
        });
    }
    if min_withdrawal <= 0.0 || !min_withdrawal.is_finite() {
        return Err(Error::InvalidAmount {
            amount: min_withdrawal,
        });
    }
    if max_withdrawal < min_withdrawal || !max_withdrawal.is_finite() {
        return Err(Error::InvalidAmount {
            amount: max_withdrawal,
        });
    }

    let now = chrono::Utc::now();
    let existing = AdminSettings::find().one(db).await?;

    let updated = if let Some(settings) = existing {
        let mut active: admin_settings::ActiveModel = settings.into();
        active.referral_percentage = Set(referral_percentage);
        active.domain = Set(domain);
        active.min_withdrawal = Set(min_withdrawal);
        active.max_withdrawal = Set(max_withdrawal);
        active.updated_at = Set(now);
        active.update(db).await?
    } else {
        admin_settings::ActiveModel {
            referral_percentage: Set(referral_percentage),
            domain: Set(domain),
            min_withdrawal: Set(min_withdrawal),
            max_withdrawal: Set(max_withdrawal),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?
    };

    Ok(updated)
}

/// Creates or updates the CPM tier for a page count.
pub async fn upsert_cpm_rate(
    db: &DatabaseConnection,
    page_count: i64,
    cpm: f64,
    multiplier: f64,
) -> Result<cpm_rate::Model> {
    if page_count < 1 {
        return Err(Error::Config {
            message: format!("Page count must be at least 1, got {page_count}"),
        });
    }
    if cpm < 0.0 || !cpm.is_finite() {
        return Err(Error::InvalidAmount { amount: cpm });
    }
    if multiplier <= 0.0 || !multiplier.is_finite() {
        return Err(Error::InvalidAmount { amount: multiplier });
    }

    let existing = CpmRate::find()
        .filter(cpm_rate::Column::PageCount.eq(page_count))
        .one(db)
        .await?;

    let updated = if let Some(rate) = existing {
        let mut active: cpm_rate::ActiveModel = rate.into();
        active.cpm = Set(cpm);
        active.multiplier = Set(multiplier);
        active.update(db).await?
    } else {
        cpm_rate::ActiveModel {
            page_count: Set(page_count),
            cpm: Set(cpm),
            multiplier: Set(multiplier),
            ..Default::default()
        }
        .insert(db)
        .await?
    };

    Ok(updated)
}

/// Lists all configured CPM tiers, ascending by page count.
pub async fn get_cpm_rates(db: &DatabaseConnection) -> Result<Vec<cpm_rate::Model>> {
    CpmRate::find()
        .order_by_asc(cpm_rate::Column::PageCount)
        .all(db)
        .await
        .map_err(Into::into)
}
