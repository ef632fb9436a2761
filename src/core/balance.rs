//! Balance aggregation business logic.
//!
//! Balances are never stored: every request recomputes the snapshot from the
//! links, the referral earnings log, and the withdrawal history, windowed by
//! the user's last completed withdrawal. Both earning streams are windowed by
//! individual event timestamps: link earnings by each view's `viewed_at`
//! valued at that link's immutable CPM, referral earnings by the log row's
//! `earned_at`. An old link that keeps earning after a payout is therefore
//! counted correctly. This is a pure read, safe under any number of
//! concurrent callers.

use crate::{
    core::withdrawal::{STATUS_COMPLETED, STATUS_REQUESTED},
    entities::{Link, LinkView, ReferralEarning, User, Withdrawal, link, link_view,
        referral_earning, withdrawal},
    errors::{Error, Result},
};
use sea_orm::prelude::*;
use std::collections::HashMap;

/// A user's balance at a point in time, derived entirely from stored events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceSnapshot {
    /// Lifetime earnings from the user's own links
    pub link_earnings: f64,
    /// Lifetime earnings from referral cuts
    pub referral_earnings: f64,
    /// `link_earnings + referral_earnings`; never decreases
    pub total_earnings: f64,
    /// Sum of withdrawals still in the `requested` state
    pub pending_withdrawals: f64,
    /// Sum of completed withdrawals
    pub total_withdrawn: f64,
    /// What the user can withdraw right now
    pub available_balance: f64,
}

/// Recomputes the balance snapshot for a user.
///
/// Runs against any connection so the withdrawal workflow can call it inside
/// the same transaction that admits a request. The result satisfies
/// `0 <= available_balance <= total_earnings - total_withdrawn`.
pub async fn compute_balance<C>(db: &C, user_id: i64) -> Result<BalanceSnapshot>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })?;

    let links = Link::find()
        .filter(link::Column::UserId.eq(user_id))
        .all(db)
        .await?;
    let link_earnings: f64 = links.iter().map(|l| l.earnings).sum();

    let referral_log = ReferralEarning::find()
        .filter(referral_earning::Column::ReferrerId.eq(user_id))
        .all(db)
        .await?;
    let referral_earnings: f64 = referral_log.iter().map(|e| e.amount).sum();

    let total_earnings = link_earnings + referral_earnings;

    let withdrawals = Withdrawal::find()
        .filter(withdrawal::Column::UserId.eq(user_id))
        .filter(withdrawal::Column::Status.is_in([STATUS_REQUESTED, STATUS_COMPLETED]))
        .all(db)
        .await?;

    let pending_withdrawals: f64 = withdrawals
        .iter()
        .filter(|w| w.status == STATUS_REQUESTED)
        .map(|w| w.amount)
        .sum();
    let total_withdrawn: f64 = withdrawals
        .iter()
        .filter(|w| w.status == STATUS_COMPLETED)
        .map(|w| w.amount)
        .sum();
    let last_completed = withdrawals
        .iter()
        .filter(|w| w.status == STATUS_COMPLETED)
        .map(|w| w.requested_at)
        .max();

    // Window both earning streams by event time since the last payout
    let (recent_link_earnings, recent_referral_earnings) = match last_completed {
        None => (link_earnings, referral_earnings),
        Some(cutoff) => {
            let rates: HashMap<i64, f64> = links.iter().map(|l| (l.id, l.cpm)).collect();
            let link_ids: Vec<i64> = links.iter().map(|l| l.id).collect();

            let recent_views = if link_ids.is_empty() {
                Vec::new()
            } else {
                LinkView::find()
                    .filter(link_view::Column::LinkId.is_in(link_ids))
                    .filter(link_view::Column::ViewedAt.gt(cutoff))
                    .all(db)
                    .await?
            };
            let recent_link: f64 = recent_views
                .iter()
                .filter_map(|v| rates.get(&v.link_id))
                .map(|cpm| cpm / 1000.0)
                .sum();

            let recent_referral: f64 = referral_log
                .iter()
                .filter(|e| e.earned_at > cutoff)
                .map(|e| e.amount)
                .sum();

            (recent_link, recent_referral)
        }
    };

    let available_balance = (recent_link_earnings + recent_referral_earnings
        - pending_withdrawals)
        .min(total_earnings - total_withdrawn)
        .max(0.0);

    Ok(BalanceSnapshot {
        link_earnings,
        referral_earnings,
        total_earnings,
        pending_withdrawals,
        total_withdrawn,
        available_balance,
    })
}
