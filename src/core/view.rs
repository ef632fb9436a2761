//! View recorder business logic.
//!
//! Accepts a `(link, visitor fingerprint)` event, deduplicates it, and
//! accrues earnings. Dedup is pushed into the storage layer: the unique index
//! on `(link_id, fingerprint)` makes a racing second insert fail cleanly, so
//! there is no read-then-write window and the counter increment applies
//! exactly once per visitor. The fingerprint is a coarse refresh-spam
//! defense, not a cryptographic identity.

use crate::{
    core::{link::can_accrue, settings::SettingsProvider},
    entities::{Link, link, link_view},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, SqlErr, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::warn;

/// Outcome of a view-recording attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewOutcome {
    /// Whether the view was new and counted
    pub accepted: bool,
    /// Per-view earning applied to the link (`cpm / 1000`), 0 for duplicates
    pub earnings_added: f64,
}

/// Builds the coarse visitor fingerprint from IP address and user agent.
#[must_use]
pub fn fingerprint(ip: &str, user_agent: &str) -> String {
    format!("{ip}|{user_agent}")
}

/// Records a view of a link by a fingerprinted visitor.
///
/// The view insert and the clicks/earnings increment commit as one unit; a
/// duplicate `(link, fingerprint)` pair rolls everything back and returns
/// `accepted: false`. Missing links and links that can no longer accrue
/// (expired) fail with [`Error::LinkNotFound`]. After the commit the link
/// owner's referrer is paid their cut; that fan-out is best-effort and never
/// fails the view.
pub async fn record_view<S>(
    db: &DatabaseConnection,
    settings: &S,
    link_id: i64,
    visitor_fingerprint: &str,
) -> Result<ViewOutcome>
where
    S: SettingsProvider,
{
    let now = Utc::now();
    let txn = db.begin().await?;

    let link = Link::find_by_id(link_id)
        .one(&txn)
        .await?
        .ok_or(Error::LinkNotFound { id: link_id })?;

    if !can_accrue(&link, now) {
        return Err(Error::LinkNotFound { id: link_id });
    }

    let insert = link_view::ActiveModel {
        link_id: Set(link_id),
        fingerprint: Set(visitor_fingerprint.to_string()),
        viewed_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await;

    match insert {
        Ok(_) => {}
        // Duplicate visitor: the unique index rejected the insert. Dropping
        // the transaction rolls back; nothing was counted.
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return Ok(ViewOutcome {
                accepted: false,
                earnings_added: 0.0,
            });
        }
        Err(e) => return Err(e.into()),
    }

    // CPM is rupees per 1000 views; one view earns cpm / 1000
    let per_view = link.cpm / 1000.0;

    Link::update_many()
        .col_expr(
            link::Column::Clicks,
            Expr::col(link::Column::Clicks).add(1),
        )
        .col_expr(
            link::Column::Earnings,
            Expr::col(link::Column::Earnings).add(per_view),
        )
        .filter(link::Column::Id.eq(link_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    // Best-effort: the view is already durable, and the referral aggregate
    // can be rebuilt from the earnings log if this partially fails.
    if let Err(e) = crate::core::referral::fan_out(db, settings, link.user_id, per_view, link.id)
        .await
    {
        warn!(
            link_id = link.id,
            owner = link.user_id,
            error = %e,
            "referral fan-out failed after view was recorded"
        );
    }

    Ok(ViewOutcome {
        accepted: true,
        earnings_added: per_view,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::settings::DbSettings;
    use crate::entities::{LinkView, ReferralEarning};
    use crate::test_utils::{
        StaticSettings, approx_eq, create_referred_user, create_test_link, create_test_user,
        setup_test_db,
    };
    use chrono::Duration;

    #[tokio::test]
    async fn test_fingerprint_combines_ip_and_agent() {
        assert_eq!(fingerprint("10.0.0.1", "Mozilla/5.0"), "10.0.0.1|Mozilla/5.0");
    }

    #[tokio::test]
    async fn test_record_view_accrues_once() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "Asha").await?;
        let link = create_test_link(&db, user.id, "abc").await?;
        let settings = StaticSettings::default();
        let fp = fingerprint("10.0.0.1", "Mozilla/5.0");

        let outcome = record_view(&db, &settings, link.id, &fp).await?;
        assert!(outcome.accepted);
        assert!(approx_eq(outcome.earnings_added, 0.16));

        let link = Link::find_by_id(link.id).one(&db).await?.unwrap();
        assert_eq!(link.clicks, 1);
        assert!(approx_eq(link.earnings, 0.16));
        Ok(())
    }

    #[tokio::test]
    async fn test_record_view_duplicate_fingerprint_not_counted() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "Asha").await?;
        let link = create_test_link(&db, user.id, "abc").await?;
        let settings = StaticSettings::default();
        let fp = fingerprint("10.0.0.1", "Mozilla/5.0");

        record_view(&db, &settings, link.id, &fp).await?;
        let outcome = record_view(&db, &settings, link.id, &fp).await?;
        assert!(!outcome.accepted);
        assert_eq!(outcome.earnings_added, 0.0);

        let link = Link::find_by_id(link.id).one(&db).await?.unwrap();
        assert_eq!(link.clicks, 1);
        assert!(approx_eq(link.earnings, 0.16));
        assert_eq!(LinkView::find().count(&db).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_record_view_distinct_fingerprints_accumulate() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "Asha").await?;
        let link = create_test_link(&db, user.id, "abc").await?;
        let settings = StaticSettings::default();

        record_view(&db, &settings, link.id, &fingerprint("10.0.0.1", "ua")).await?;
        record_view(&db, &settings, link.id, &fingerprint("10.0.0.2", "ua")).await?;
        record_view(&db, &settings, link.id, &fingerprint("10.0.0.1", "other-ua")).await?;

        let link = Link::find_by_id(link.id).one(&db).await?.unwrap();
        assert_eq!(link.clicks, 3);
        assert!(approx_eq(link.earnings, 0.48));
        Ok(())
    }

    #[tokio::test]
    async fn test_record_view_missing_or_expired_link() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "Asha").await?;
        let settings = StaticSettings::default();

        let result = record_view(&db, &settings, 999, "fp").await;
        assert!(matches!(result.unwrap_err(), Error::LinkNotFound { id: 999 }));

        // A link past its expiry date no longer accrues even before the sweep
        let expired = crate::core::link::create_link(
            &db,
            &settings,
            user.id,
            "old".to_string(),
            "https://example.com".to_string(),
            1,
            Some(Utc::now() - Duration::hours(1)),
        )
        .await?;

        let result = record_view(&db, &settings, expired.id, "fp").await;
        assert!(matches!(result.unwrap_err(), Error::LinkNotFound { id: _ }));

        let expired = Link::find_by_id(expired.id).one(&db).await?.unwrap();
        assert_eq!(expired.clicks, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_record_view_fans_out_to_referrer() -> Result<()> {
        let db = setup_test_db().await?;
        let referrer = create_test_user(&db, "Referrer").await?;
        let referred = create_referred_user(&db, "Referred", referrer.id).await?;
        let link = create_test_link(&db, referred.id, "abc").await?;
        let settings = StaticSettings {
            referral_percentage: 5.0,
            ..StaticSettings::default()
        };

        record_view(&db, &settings, link.id, "fp").await?;

        let entries = ReferralEarning::find().all(&db).await?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].referrer_id, referrer.id);
        assert!(approx_eq(entries[0].amount, 0.008));
        Ok(())
    }

    #[tokio::test]
    async fn test_record_view_survives_fan_out_failure() -> Result<()> {
        let db = setup_test_db().await?;
        let referrer = create_test_user(&db, "Referrer").await?;
        let referred = create_referred_user(&db, "Referred", referrer.id).await?;
        let link = create_test_link(&db, referred.id, "abc").await?;

        // Admin settings were never seeded, so the fan-out's percentage
        // lookup fails; the view must still be recorded.
        let settings = DbSettings::new(&db);
        let outcome = record_view(&db, &settings, link.id, "fp").await?;
        assert!(outcome.accepted);

        let link = Link::find_by_id(link.id).one(&db).await?.unwrap();
        assert_eq!(link.clicks, 1);
        assert_eq!(ReferralEarning::find().count(&db).await?, 0);
        Ok(())
    }
}
