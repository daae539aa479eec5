// ================
// common/src/models.rs
// ================
//! Domain records and REST payloads for the call admission surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marketplace role of an account
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Trainer,
}

/// Account-store record. Only `balance` is ever mutated by this core;
/// everything else is owned by the account service.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    pub role: Role,
    /// Wallet balance in minor currency units
    pub balance: u64,
    /// Per-call fee charged by a trainer; zero for plain users
    #[serde(default)]
    pub call_fee: u64,
}

/// Lifecycle state of a call session
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Ongoing,
    Completed,
    Missed,
}

/// One call attempt, persisted for the lifetime of the ledger.
///
/// `ended_at` is set iff the status is terminal; a session leaves
/// `ongoing` exactly once and never returns to it.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CallSession {
    pub session_id: String,
    pub caller: String,
    pub receiver: String,
    pub status: CallStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl CallSession {
    pub fn new(caller: impl Into<String>, receiver: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            caller: caller.into(),
            receiver: receiver.into(),
            status: CallStatus::Ongoing,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status != CallStatus::Ongoing
    }
}

/// Record that `caller` paid `receiver`'s call fee at `paid_at`.
/// Append-only; only the most recent receipt per pair is consulted for
/// the fee-bypass window.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub caller: String,
    pub receiver: String,
    pub paid_at: DateTime<Utc>,
}

/// Body of `POST /call/start`. Fields are optional so that a missing
/// field maps to the API's 400 rather than a deserialization rejection.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StartCallRequest {
    pub user_id: Option<String>,
    pub trainer_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StartCallResponse {
    pub message: String,
    pub user_wallet: u64,
    pub trainer_wallet: u64,
    pub call_id: String,
    pub already_paid: bool,
    /// Present when the caller was debited but the receiver credit
    /// failed; the call still proceeds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Body of `POST /call/end` and `POST /call/missed`
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EndCallRequest {
    pub call_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CallCheckResponse {
    pub can_call: bool,
    pub user_wallet: u64,
    pub trainer_fee: u64,
}
