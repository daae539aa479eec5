// ============================
// coachcall-backend-lib/src/admission.rs
// ============================
//! Call admission and settlement.
//!
//! Gates whether a call session may open: verifies both parties, checks
//! affordability against the receiver's fee (unless a receipt inside the
//! bypass window makes the call free), settles the wallet transaction,
//! and opens the ledger record whose id the signaling layer carries.
//!
//! The settlement is two sequential single-entity updates, not a
//! distributed transaction: the caller debit is atomic and conditional,
//! and a receiver credit that fails afterwards is never rolled back.
//! It is surfaced as a reconciliation warning on an otherwise successful
//! admission.

use chrono::{Duration, Utc};
use coachcall_common::{CallSession, CallStatus, PaymentReceipt, Role};
use metrics::counter;
use tracing::{error, info};

use crate::accounts::AccountStore;
use crate::error::AppError;
use crate::ledger::Ledger;
use crate::metrics::{
    CALL_ADMITTED, CALL_COMPLETED, CALL_MISSED, CALL_REJECTED, RECONCILIATION_FAILURE,
};

/// Outcome of a successful admission
#[derive(Debug)]
pub struct Admission {
    pub session: CallSession,
    pub caller_balance: u64,
    pub receiver_balance: u64,
    /// True when a receipt inside the bypass window covered the fee
    pub already_paid: bool,
    /// Set when the caller was debited but the receiver credit failed.
    /// The admission still stands; the mismatch needs operator attention.
    pub reconciliation: Option<String>,
}

/// Affordability report for `GET /call/check`
#[derive(Debug)]
pub struct CallCheck {
    pub can_call: bool,
    pub user_balance: u64,
    pub trainer_fee: u64,
}

/// Settle payment for a call from `caller_id` to `receiver_id` and open
/// an `ongoing` session.
pub async fn admit_call<L: Ledger>(
    accounts: &dyn AccountStore,
    ledger: &L,
    bypass_window: Duration,
    caller_id: &str,
    receiver_id: &str,
) -> Result<Admission, AppError> {
    let caller = accounts.get(caller_id).await?;
    let receiver = accounts.get(receiver_id).await?;

    if receiver.role != Role::Trainer {
        return Err(AppError::NotFound(format!(
            "{receiver_id} is not a trainer"
        )));
    }

    let fee = receiver.call_fee;
    let already_paid = paid_within_window(ledger, bypass_window, caller_id, receiver_id).await?;

    let mut reconciliation = None;
    let (caller_balance, receiver_balance) = if already_paid {
        (caller.balance, receiver.balance)
    } else {
        let Some(caller_balance) = accounts.debit_if_sufficient(caller_id, fee).await? else {
            counter!(CALL_REJECTED).increment(1);
            return Err(AppError::InsufficientBalance);
        };

        // The debit is final at this point; a failed credit is surfaced
        // for reconciliation, not rolled back.
        let receiver_balance = match accounts.credit(receiver_id, fee).await {
            Ok(balance) => balance,
            Err(e) => {
                error!(
                    caller = caller_id,
                    receiver = receiver_id,
                    fee,
                    %e,
                    "receiver credit failed after caller debit"
                );
                counter!(RECONCILIATION_FAILURE).increment(1);
                reconciliation = Some(format!("receiver credit of {fee} failed: {e}"));
                receiver.balance
            },
        };

        ledger
            .record_receipt(&PaymentReceipt {
                caller: caller_id.to_string(),
                receiver: receiver_id.to_string(),
                paid_at: Utc::now(),
            })
            .await
            .map_err(as_settlement)?;

        (caller_balance, receiver_balance)
    };

    let session = ledger
        .create_session(caller_id, receiver_id)
        .await
        .map_err(as_settlement)?;

    counter!(CALL_ADMITTED).increment(1);
    info!(
        caller = caller_id,
        receiver = receiver_id,
        session = %session.session_id,
        already_paid,
        "call admitted"
    );

    Ok(Admission {
        session,
        caller_balance,
        receiver_balance,
        already_paid,
        reconciliation,
    })
}

/// Close a session normally
pub async fn end_call<L: Ledger>(ledger: &L, session_id: &str) -> Result<CallSession, AppError> {
    let session = ledger
        .terminate_session(session_id, CallStatus::Completed)
        .await
        .map_err(as_settlement)?;
    counter!(CALL_COMPLETED).increment(1);
    Ok(session)
}

/// Close a session that was never answered
pub async fn mark_missed<L: Ledger>(ledger: &L, session_id: &str) -> Result<CallSession, AppError> {
    let session = ledger
        .terminate_session(session_id, CallStatus::Missed)
        .await
        .map_err(as_settlement)?;
    counter!(CALL_MISSED).increment(1);
    Ok(session)
}

/// Report whether `caller_id` could start a call right now, without
/// moving any money.
pub async fn check_call<L: Ledger>(
    accounts: &dyn AccountStore,
    ledger: &L,
    bypass_window: Duration,
    caller_id: &str,
    receiver_id: &str,
) -> Result<CallCheck, AppError> {
    let caller = accounts.get(caller_id).await?;
    let receiver = accounts.get(receiver_id).await?;

    if receiver.role != Role::Trainer {
        return Err(AppError::NotFound(format!(
            "{receiver_id} is not a trainer"
        )));
    }

    let already_paid = paid_within_window(ledger, bypass_window, caller_id, receiver_id).await?;

    Ok(CallCheck {
        can_call: already_paid || caller.balance >= receiver.call_fee,
        user_balance: caller.balance,
        trainer_fee: receiver.call_fee,
    })
}

async fn paid_within_window<L: Ledger>(
    ledger: &L,
    bypass_window: Duration,
    caller_id: &str,
    receiver_id: &str,
) -> Result<bool, AppError> {
    let receipt = ledger
        .latest_receipt(caller_id, receiver_id)
        .await
        .map_err(as_settlement)?;

    Ok(match receipt {
        Some(receipt) => Utc::now() - receipt.paid_at < bypass_window,
        None => false,
    })
}

/// Store failures below the admission surface become `Settlement`;
/// domain outcomes keep their own variants.
fn as_settlement(err: AppError) -> AppError {
    match err {
        AppError::NotFound(_) | AppError::AlreadyTerminated(_) => err,
        other => AppError::Settlement(other.to_string()),
    }
}
