//! Admin rollup business logic.
//!
//! Platform-wide dashboard figures derived on demand from the same tables the
//! balance aggregator reads. There is no separately maintained running total
//! that could drift from the per-user numbers: revenue is the sum of the link
//! counters, top users are ranked by the identical link-plus-referral
//! earnings combination the per-user snapshot uses.

use crate::{
    core::{link::STATUS_ACTIVE, withdrawal::STATUS_REQUESTED},
    entities::{Link, ReferralEarning, User, Withdrawal, link, withdrawal},
    errors::Result,
};
use sea_orm::{PaginatorTrait, prelude::*};
use std::collections::HashMap;

/// One entry in the top-earners ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct TopUser {
    /// The user's id
    pub user_id: i64,
    /// Display name
    pub name: String,
    /// Lifetime link plus referral earnings
    pub total_earnings: f64,
}

/// One entry in the top-links ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct TopLink {
    /// The link's id
    pub link_id: i64,
    /// Short code
    pub code: String,
    /// Owning user's id
    pub user_id: i64,
    /// Deduplicated view count
    pub clicks: i64,
    /// Lifetime earnings
    pub earnings: f64,
}

/// Platform-wide dashboard figures.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformSummary {
    /// Number of registered users
    pub total_users: u64,
    /// Number of links still accruing
    pub active_links: u64,
    /// Sum of withdrawal amounts awaiting admin action
    pub pending_withdrawals: f64,
    /// Lifetime earnings paid out across all links
    pub revenue: f64,
    /// Highest lifetime earners, descending
    pub top_users: Vec<TopUser>,
    /// Highest earning links, descending
    pub top_links: Vec<TopLink>,
}

/// Builds the platform summary, ranking at most `top_n` users and links.
#[allow(clippy::cast_possible_truncation)] // usize counts fit u64
pub async fn platform_summary(db: &DatabaseConnection, top_n: usize) -> Result<PlatformSummary> {
    let users = User::find().all(db).await?;
    let links = Link::find().all(db).await?;
    let referral_log = ReferralEarning::find().all(db).await?;

    let total_users = users.len() as u64;
    let active_links = links.iter().filter(|l| l.status == STATUS_ACTIVE).count() as u64;
    let revenue: f64 = links.iter().map(|l| l.earnings).sum();

    let pending_withdrawals: f64 = Withdrawal::find()
        .filter(withdrawal::Column::Status.eq(STATUS_REQUESTED))
        .all(db)
        .await?
        .iter()
        .map(|w| w.amount)
        .sum();

    // Per-user totals from the same primitives the balance snapshot uses
    let mut totals: HashMap<i64, f64> = HashMap::new();
    for l in &links {
        *totals.entry(l.user_id).or_insert(0.0) += l.earnings;
    }
    for e in &referral_log {
        *totals.entry(e.referrer_id).or_insert(0.0) += e.amount;
    }

    let names: HashMap<i64, &str> = users.iter().map(|u| (u.id, u.name.as_str())).collect();
    let mut top_users: Vec<TopUser> = totals
        .into_iter()
        .map(|(user_id, total_earnings)| TopUser {
            user_id,
            name: names.get(&user_id).copied().unwrap_or_default().to_string(),
            total_earnings,
        })
        .collect();
    top_users.sort_by(|a, b| {
        b.total_earnings
            .partial_cmp(&a.total_earnings)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    top_users.truncate(top_n);

    let mut top_links: Vec<TopLink> = links
        .iter()
        .map(|l| TopLink {
            link_id: l.id,
            code: l.code.clone(),
            user_id: l.user_id,
            clicks: l.clicks,
            earnings: l.earnings,
        })
        .collect();
    top_links.sort_by(|a, b| {
        b.earnings
            .partial_cmp(&a.earnings)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    top_links.truncate(top_n);

    Ok(PlatformSummary {
        total_users,
        active_links,
        pending_withdrawals,
        revenue,
        top_users,
        top_links,
    })
}

/// Counts withdrawals per status for the admin queue badges.
pub async fn withdrawal_counts(db: &DatabaseConnection) -> Result<HashMap<String, u64>> {
    let mut counts = HashMap::new();
    for status in [
        STATUS_REQUESTED,
        crate::core::withdrawal::STATUS_COMPLETED,
        crate::core::withdrawal::STATUS_REJECTED,
    ] {
        let n = Withdrawal::find()
            .filter(withdrawal::Column::Status.eq(status))
            .count(db)
            .await?;
        counts.insert(status.to_string(), n);
    }
    Ok(counts)
}
