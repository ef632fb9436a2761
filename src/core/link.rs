//! Link business logic - Creation, lookups, and the expiry sweep.
//!
//! A link snapshots its effective CPM at creation time; retuning the global
//! rate table never changes what an existing link earns per view, which keeps
//! historical earnings reproducible. The expiry sweep persists the derived
//! `expired` status so hot read paths can filter on a column instead of
//! comparing timestamps.

use crate::{
    core::settings::SettingsProvider,
    entities::{Link, User, link},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, SqlErr, prelude::*, sea_query::Expr};

/// Status of a link that is still accruing earnings.
pub const STATUS_ACTIVE: &str = "active";
/// Status of a link past its expiry date.
pub const STATUS_EXPIRED: &str = "expired";

/// Creates a link for a user, snapshotting the current CPM quote onto it.
///
/// The effective rate is `cpm * multiplier` for the tier matching the page
/// count. Short codes are unique platform-wide; a collision surfaces as
/// [`Error::CodeTaken`].
pub async fn create_link<S>(
    db: &DatabaseConnection,
    settings: &S,
    user_id: i64,
    code: String,
    destination: String,
    pages: i64,
    expires_at: Option<DateTime<Utc>>,
) -> Result<link::Model>
where
    S: SettingsProvider,
{
    let code = code.trim().to_string();
    if code.is_empty() {
        return Err(Error::Config {
            message: "Short code cannot be empty".to_string(),
        });
    }
    if destination.trim().is_empty() {
        return Err(Error::Config {
            message: "Destination URL cannot be empty".to_string(),
        });
    }
    if pages < 1 {
        return Err(Error::Config {
            message: format!("Page count must be at least 1, got {pages}"),
        });
    }

    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })?;

    let quote = settings.cpm_for_pages(pages).await?;

    let insert = link::ActiveModel {
        user_id: Set(user_id),
        code: Set(code.clone()),
        destination: Set(destination.trim().to_string()),
        cpm: Set(quote.effective_cpm()),
        pages: Set(pages),
        clicks: Set(0),
        earnings: Set(0.0),
        status: Set(STATUS_ACTIVE.to_string()),
        expires_at: Set(expires_at),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await;

    match insert {
        Ok(model) => Ok(model),
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            Err(Error::CodeTaken { code })
        }
        Err(e) => Err(e.into()),
    }
}

/// Finds a link by its unique short code.
pub async fn get_link_by_code(
    db: &DatabaseConnection,
    code: &str,
) -> Result<Option<link::Model>> {
    Link::find()
        .filter(link::Column::Code.eq(code))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all links owned by a user, newest first.
pub async fn get_links_for_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<link::Model>> {
    Link::find()
        .filter(link::Column::UserId.eq(user_id))
        .order_by_desc(link::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Whether the link can still accrue earnings at `now`.
///
/// Covers both the persisted status and an expiry date the sweep has not
/// caught up with yet.
#[must_use]
pub fn can_accrue(link: &link::Model, now: DateTime<Utc>) -> bool {
    link.status == STATUS_ACTIVE && link.expires_at.is_none_or(|at| at > now)
}

/// Flips `active` links past their expiry date to `expired`.
///
/// Idempotent and safe to run concurrently with reads; the binary schedules
/// it on an interval. Returns the number of links flipped.
pub async fn sweep_expired_links(db: &DatabaseConnection) -> Result<u64> {
    let result = Link::update_many()
        .col_expr(link::Column::Status, Expr::value(STATUS_EXPIRED))
        .filter(link::Column::Status.eq(STATUS_ACTIVE))
        .filter(link::Column::ExpiresAt.is_not_null())
        .filter(link::Column::ExpiresAt.lte(Utc::now()))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}
