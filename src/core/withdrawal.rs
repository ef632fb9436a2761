//! Withdrawal workflow business logic.
//!
//! A request must pass OTP, UPI, and limit checks, then clear the balance
//! gate. Neither the OTP consumption nor the balance check is naturally
//! atomic with respect to other requests from the same user, so admission is
//! serialized through a per-user async lock ([`WithdrawalGate`]) and both are
//! validated inside the same transaction that inserts the row: two racing
//! requests admit at most one, whether they collide on the balance or on the
//! single-use OTP. Admin transitions are compare-and-swap on the current
//! status, so terminal states are immutable.

use crate::{
    core::{balance::compute_balance, settings::SettingsProvider},
    entities::{User, Withdrawal, user, withdrawal},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

/// Status of a withdrawal awaiting admin action; the only non-terminal state.
pub const STATUS_REQUESTED: &str = "requested";
/// Terminal status of a paid-out withdrawal.
pub const STATUS_COMPLETED: &str = "completed";
/// Terminal status of a refused withdrawal.
pub const STATUS_REJECTED: &str = "rejected";

/// Per-user admission lock registry for withdrawal requests.
///
/// One gate instance is shared by all request handlers. Locks are created
/// lazily per user id; there is no global lock, so users never serialize
/// against each other. Entries no task holds or waits on are pruned on the
/// next lookup, so the map stays bounded by the number of users with a
/// request in flight.
#[derive(Debug, Default)]
pub struct WithdrawalGate {
    locks: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
}

impl WithdrawalGate {
    /// Creates an empty gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn user_lock(&self, user_id: i64) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // A strong count of 1 means only the map holds the lock
        locks.retain(|id, lock| *id == user_id || Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(user_id).or_default())
    }
}

/// Requests a withdrawal of `amount` to the user's registered UPI handle.
///
/// The user load, the OTP and UPI comparison, and the balance recomputation
/// all run under the per-user lock, inside the transaction that inserts the
/// request: a concurrent second request sees either the admitted row (and
/// fails on the balance) or the consumed OTP (and fails with
/// [`Error::InvalidOtp`]). The OTP clear is conditional on the code that was
/// verified, so it is single-use even for callers outside the gate.
pub async fn request_withdrawal<S>(
    db: &DatabaseConnection,
    gate: &WithdrawalGate,
    settings: &S,
    user_id: i64,
    amount: f64,
    upi: &str,
    otp: &str,
) -> Result<withdrawal::Model>
where
    S: SettingsProvider,
{
    if amount <= 0.0 || !amount.is_finite() {
        return Err(Error::InvalidAmount { amount });
    }

    let (minimum, maximum) = settings.withdrawal_limits().await?;
    if amount < minimum {
        return Err(Error::BelowMinimum { amount, minimum });
    }
    if amount > maximum {
        return Err(Error::AboveMaximum { amount, maximum });
    }

    // Serialize the OTP check, the balance check, and the insert per user
    let lock = gate.user_lock(user_id);
    let _guard = lock.lock().await;

    let txn = db.begin().await?;

    let user = User::find_by_id(user_id)
        .one(&txn)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })?;

    if user.otp.as_deref() != Some(otp) {
        return Err(Error::InvalidOtp);
    }
    if user.upi.as_deref() != Some(upi) {
        return Err(Error::UpiMismatch);
    }

    let snapshot = compute_balance(&txn, user_id).await?;
    if amount > snapshot.available_balance {
        return Err(Error::InsufficientBalance {
            requested: amount,
            available: snapshot.available_balance,
        });
    }

    let request = withdrawal::ActiveModel {
        user_id: Set(user_id),
        amount: Set(amount),
        upi: Set(upi.to_string()),
        status: Set(STATUS_REQUESTED.to_string()),
        requested_at: Set(chrono::Utc::now()),
        processed_at: Set(None),
        processed_by: Set(None),
        rejection_reason: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    // OTPs are single-use: consume exactly the code that was verified
    let cleared = User::update_many()
        .col_expr(user::Column::Otp, Expr::value(None::<String>))
        .filter(user::Column::Id.eq(user_id))
        .filter(user::Column::Otp.eq(otp))
        .exec(&txn)
        .await?;
    if cleared.rows_affected == 0 {
        return Err(Error::InvalidOtp);
    }

    txn.commit().await?;
    Ok(request)
}

/// Marks a requested withdrawal as paid out.
///
/// Valid only from `requested`; the transition is a conditional update
/// filtered on the current status, so a second admin action observes zero
/// affected rows and fails with [`Error::AlreadyProcessed`].
pub async fn complete_withdrawal(
    db: &DatabaseConnection,
    withdrawal_id: i64,
    admin_id: i64,
) -> Result<withdrawal::Model> {
    transition(db, withdrawal_id, admin_id, STATUS_COMPLETED, None).await
}

/// Rejects a requested withdrawal, recording the reason.
pub async fn reject_withdrawal(
    db: &DatabaseConnection,
    withdrawal_id: i64,
    admin_id: i64,
    reason: String,
) -> Result<withdrawal::Model> {
    transition(db, withdrawal_id, admin_id, STATUS_REJECTED, Some(reason)).await
}

async fn transition(
    db: &DatabaseConnection,
    withdrawal_id: i64,
    admin_id: i64,
    to_status: &str,
    rejection_reason: Option<String>,
) -> Result<withdrawal::Model> {
    Withdrawal::find_by_id(withdrawal_id)
        .one(db)
        .await?
        .ok_or(Error::WithdrawalNotFound { id: withdrawal_id })?;

    let result = Withdrawal::update_many()
        .col_expr(withdrawal::Column::Status, Expr::value(to_status))
        .col_expr(
            withdrawal::Column::ProcessedAt,
            Expr::value(chrono::Utc::now()),
        )
        .col_expr(withdrawal::Column::ProcessedBy, Expr::value(admin_id))
        .col_expr(
            withdrawal::Column::RejectionReason,
            Expr::value(rejection_reason),
        )
        .filter(withdrawal::Column::Id.eq(withdrawal_id))
        .filter(withdrawal::Column::Status.eq(STATUS_REQUESTED))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::AlreadyProcessed { id: withdrawal_id });
    }

    Withdrawal::find_by_id(withdrawal_id)
        .one(db)
        .await?
        .ok_or(Error::WithdrawalNotFound { id: withdrawal_id })
}

/// Retrieves all withdrawals for a user, newest first.
pub async fn get_withdrawals_for_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<withdrawal::Model>> {
    Withdrawal::find()
        .filter(withdrawal::Column::UserId.eq(user_id))
        .order_by_desc(withdrawal::Column::RequestedAt)
        .all(db)
        .await
        .map_err(Into::into)
}
