//! Referral fan-out business logic.
//!
//! When a referred user earns from a view, a fraction of that earning is
//! propagated to their referrer: an append-only `referral_earnings` log row
//! plus an upsert of the `referrals` running aggregate, committed together.
//! The log is the durable source of truth; the aggregate exists for cheap
//! reporting and can be rebuilt from the log whenever it drifts.

use crate::{
    core::settings::SettingsProvider,
    entities::{Referral, ReferralEarning, referral, referral_earning},
    errors::{Error, Result},
};
use sea_orm::{Set, SqlErr, TransactionTrait, prelude::*, sea_query::Expr};

/// Tolerance for comparing aggregate sums against log sums.
const DRIFT_EPSILON: f64 = 1e-9;

/// Propagates a referral cut for one accrued per-view earning.
///
/// No-op when the earning user has no referrer. Otherwise appends a log entry
/// of `accrued * pct / 100` and upserts the pair aggregate in the same
/// transaction. Callers on the view-recording path treat failures here as
/// best-effort: log and swallow, never fail the view.
pub async fn fan_out<S>(
    db: &DatabaseConnection,
    settings: &S,
    referred_user_id: i64,
    accrued: f64,
    source_link_id: i64,
) -> Result<()>
where
    S: SettingsProvider,
{
    let referred = crate::core::user::get_user_by_id(db, referred_user_id)
        .await?
        .ok_or(Error::UserNotFound {
            id: referred_user_id,
        })?;

    let Some(referrer_id) = referred.referred_by else {
        return Ok(());
    };

    let pct = settings.referral_percentage().await?;
    let referral_amount = accrued * pct / 100.0;

    let txn = db.begin().await?;

    referral_earning::ActiveModel {
        referrer_id: Set(referrer_id),
        referred_user_id: Set(referred_user_id),
        source_link_id: Set(source_link_id),
        amount: Set(referral_amount),
        base_amount: Set(accrued),
        earned_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let existing = Referral::find()
        .filter(referral::Column::ReferrerId.eq(referrer_id))
        .filter(referral::Column::ReferredUserId.eq(referred_user_id))
        .one(&txn)
        .await?;

    if let Some(pair) = existing {
        Referral::update_many()
            .col_expr(
                referral::Column::EarningsAmount,
                Expr::col(referral::Column::EarningsAmount).add(referral_amount),
            )
            .col_expr(
                referral::Column::TotalReferredEarnings,
                Expr::col(referral::Column::TotalReferredEarnings).add(accrued),
            )
            .filter(referral::Column::Id.eq(pair.id))
            .exec(&txn)
            .await?;
    } else {
        referral::ActiveModel {
            referrer_id: Set(referrer_id),
            referred_user_id: Set(referred_user_id),
            earnings_amount: Set(referral_amount),
            total_referred_earnings: Set(accrued),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    Ok(())
}

/// Ensures the zero-amount aggregate row for a referral pair exists.
///
/// Idempotent: a concurrent insert of the same pair is absorbed by the
/// unique index and treated as success. Used at registration so the
/// referred-users set is populated before any earnings flow.
pub async fn ensure_pair<C>(db: &C, referrer_id: i64, referred_user_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = Referral::find()
        .filter(referral::Column::ReferrerId.eq(referrer_id))
        .filter(referral::Column::ReferredUserId.eq(referred_user_id))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let insert = referral::ActiveModel {
        referrer_id: Set(referrer_id),
        referred_user_id: Set(referred_user_id),
        earnings_amount: Set(0.0),
        total_referred_earnings: Set(0.0),
        ..Default::default()
    }
    .insert(db)
    .await;

    match insert {
        Ok(_) => Ok(()),
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Ids of the users this referrer has referred, from the aggregate table.
pub async fn referred_users(db: &DatabaseConnection, referrer_id: i64) -> Result<Vec<i64>> {
    let rows = Referral::find()
        .filter(referral::Column::ReferrerId.eq(referrer_id))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|r| r.referred_user_id).collect())
}

/// Recomputes one pair's aggregate from the append-only log.
///
/// This is the repair path for a partial fan-out failure (log row committed,
/// aggregate upsert lost) or any other detected drift.
pub async fn rebuild_aggregate(
    db: &DatabaseConnection,
    referrer_id: i64,
    referred_user_id: i64,
) -> Result<referral::Model> {
    let entries = ReferralEarning::find()
        .filter(referral_earning::Column::ReferrerId.eq(referrer_id))
        .filter(referral_earning::Column::ReferredUserId.eq(referred_user_id))
        .all(db)
        .await?;

    let earnings_amount: f64 = entries.iter().map(|e| e.amount).sum();
    let total_referred_earnings: f64 = entries.iter().map(|e| e.base_amount).sum();

    let txn = db.begin().await?;

    let existing = Referral::find()
        .filter(referral::Column::ReferrerId.eq(referrer_id))
        .filter(referral::Column::ReferredUserId.eq(referred_user_id))
        .one(&txn)
        .await?;

    let rebuilt = if let Some(pair) = existing {
        let mut active: referral::ActiveModel = pair.into();
        active.earnings_amount = Set(earnings_amount);
        active.total_referred_earnings = Set(total_referred_earnings);
        active.update(&txn).await?
    } else {
        referral::ActiveModel {
            referrer_id: Set(referrer_id),
            referred_user_id: Set(referred_user_id),
            earnings_amount: Set(earnings_amount),
            total_referred_earnings: Set(total_referred_earnings),
            ..Default::default()
        }
        .insert(&txn)
        .await?
    };

    txn.commit().await?;
    Ok(rebuilt)
}

/// Verifies every aggregate row of a referrer against the log.
///
/// Drift is an integrity violation: the computation that detects it must
/// halt rather than hand a wrong number onward.
pub async fn verify_aggregates(db: &DatabaseConnection, referrer_id: i64) -> Result<()> {
    let pairs = Referral::find()
        .filter(referral::Column::ReferrerId.eq(referrer_id))
        .all(db)
        .await?;
    let entries = ReferralEarning::find()
        .filter(referral_earning::Column::ReferrerId.eq(referrer_id))
        .all(db)
        .await?;

    for pair in pairs {
        let (logged_cut, logged_base) = entries
            .iter()
            .filter(|e| e.referred_user_id == pair.referred_user_id)
            .fold((0.0, 0.0), |(cut, base), e| {
                (cut + e.amount, base + e.base_amount)
            });

        if (logged_cut - pair.earnings_amount).abs() > DRIFT_EPSILON
            || (logged_base - pair.total_referred_earnings).abs() > DRIFT_EPSILON
        {
            return Err(Error::Integrity {
                message: format!(
                    "Referral aggregate for pair ({referrer_id}, {}) holds ({:.6}, {:.6}) but the log sums to ({logged_cut:.6}, {logged_base:.6})",
                    pair.referred_user_id, pair.earnings_amount, pair.total_referred_earnings
                ),
            });
        }
    }

    Ok(())
}
