//! Account business logic - Registration and user lookups.
//!
//! Registration is the only place `referred_by` can be set; it is immutable
//! afterwards. When a referral is attributed, the zero-amount aggregate row
//! for the pair is inserted in the same transaction so the referrer's
//! referred-users set is correct from the moment the account exists.

use crate::{
    entities::{User, user},
    errors::{Error, Result},
};
use sea_orm::{Set, TransactionTrait, prelude::*};

/// Role assigned to freshly registered accounts.
pub const ROLE_USER: &str = "user";
/// Role carried by platform administrators.
pub const ROLE_ADMIN: &str = "admin";

/// Registers a new account, optionally attributed to a referrer.
///
/// Validates that the name and email are non-empty and the email unused, and
/// that the referrer (when given) exists. The referral aggregate row for the
/// pair is created atomically with the user.
pub async fn register_user(
    db: &DatabaseConnection,
    name: String,
    email: String,
    password_hash: String,
    referred_by: Option<i64>,
) -> Result<user::Model> {
    if name.trim().is_empty() {
        return Err(Error::Config {
            message: "User name cannot be empty".to_string(),
        });
    }
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(Error::Config {
            message: "Email cannot be empty".to_string(),
        });
    }

    let txn = db.begin().await?;

    if get_user_by_email(&txn, &email).await?.is_some() {
        return Err(Error::EmailTaken { email });
    }

    if let Some(referrer_id) = referred_by {
        User::find_by_id(referrer_id)
            .one(&txn)
            .await?
            .ok_or(Error::UserNotFound { id: referrer_id })?;
    }

    let user = user::ActiveModel {
        name: Set(name.trim().to_string()),
        email: Set(email),
        password_hash: Set(password_hash),
        upi: Set(None),
        otp: Set(None),
        referred_by: Set(referred_by),
        role: Set(ROLE_USER.to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if let Some(referrer_id) = referred_by {
        crate::core::referral::ensure_pair(&txn, referrer_id, user.id).await?;
    }

    txn.commit().await?;
    Ok(user)
}

/// Finds a user by primary key.
pub async fn get_user_by_id<C>(db: &C, user_id: i64) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Finds a user by email.
pub async fn get_user_by_email<C>(db: &C, email: &str) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Stores the user's current one-time code.
///
/// The delivery channel (email/SMS) lives outside the core; this only records
/// what was sent so the withdrawal workflow can verify and consume it.
pub async fn set_user_otp(
    db: &DatabaseConnection,
    user_id: i64,
    otp: Option<String>,
) -> Result<user::Model> {
    let user = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })?;

    let mut active: user::ActiveModel = user.into();
    active.otp = Set(otp);
    active.update(db).await.map_err(Into::into)
}

/// Sets or replaces the user's registered UPI payout handle.
pub async fn set_user_upi(
    db: &DatabaseConnection,
    user_id: i64,
    upi: String,
) -> Result<user::Model> {
    if upi.trim().is_empty() {
        return Err(Error::Config {
            message: "UPI handle cannot be empty".to_string(),
        });
    }

    let user = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })?;

    let mut active: user::ActiveModel = user.into();
    active.upi = Set(Some(upi.trim().to_string()));
    active.update(db).await.map_err(Into::into)
}
