// ============================
// coachcall-backend-lib/src/ledger.rs
// ============================
//! Session ledger abstraction with a flat-file implementation.
//!
//! The ledger persists call sessions and payment receipts. Sessions are
//! historical records: they are created `ongoing`, terminated exactly
//! once, and never deleted. Receipts are an append-only audit trail;
//! only the most recent receipt per pair matters for the fee-bypass
//! window.

use async_trait::async_trait;
use chrono::Utc;
use coachcall_common::{CallSession, CallStatus, PaymentReceipt};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tokio::{fs as tokio_fs, io::AsyncWriteExt};

use crate::error::AppError;

/// Trait for ledger backends
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Open a new `ongoing` session between the pair
    async fn create_session(&self, caller: &str, receiver: &str) -> Result<CallSession, AppError>;

    /// Fetch a session by id
    async fn get_session(&self, session_id: &str) -> Result<CallSession, AppError>;

    /// Move a session from `ongoing` into a terminal status, stamping
    /// `ended_at`. Terminating an already-terminated session fails with
    /// `AlreadyTerminated`.
    async fn terminate_session(
        &self,
        session_id: &str,
        status: CallStatus,
    ) -> Result<CallSession, AppError>;

    /// Calls made by `caller`, newest first
    async fn sessions_by_caller(&self, caller: &str) -> Result<Vec<CallSession>, AppError>;

    /// Calls received by `receiver`, newest first
    async fn sessions_by_receiver(&self, receiver: &str) -> Result<Vec<CallSession>, AppError>;

    /// Append a payment receipt
    async fn record_receipt(&self, receipt: &PaymentReceipt) -> Result<(), AppError>;

    /// Most recent receipt for the pair, if any
    async fn latest_receipt(
        &self,
        caller: &str,
        receiver: &str,
    ) -> Result<Option<PaymentReceipt>, AppError>;
}

/// Flat-file implementation of the Ledger trait
#[derive(Clone)]
pub struct FlatFileLedger {
    root: PathBuf,
}

impl FlatFileLedger {
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("calls"))?;
        Ok(Self { root })
    }

    fn session_path(&self, session_id: &str) -> PathBuf {
        self.root.join("calls").join(format!("{session_id}.json"))
    }

    fn receipts_path(&self) -> PathBuf {
        self.root.join("receipts.log")
    }

    async fn write_session(&self, session: &CallSession) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(session)?;
        tokio_fs::write(self.session_path(&session.session_id), json).await?;
        Ok(())
    }

    async fn read_all_sessions(&self) -> Result<Vec<CallSession>, AppError> {
        let mut sessions = Vec::new();
        let mut dir = tokio_fs::read_dir(self.root.join("calls")).await?;

        while let Some(entry) = dir.next_entry().await? {
            let content = tokio_fs::read_to_string(entry.path()).await?;
            sessions.push(serde_json::from_str(&content)?);
        }

        Ok(sessions)
    }
}

#[async_trait]
impl Ledger for FlatFileLedger {
    async fn create_session(&self, caller: &str, receiver: &str) -> Result<CallSession, AppError> {
        let session = CallSession::new(caller, receiver);
        self.write_session(&session).await?;
        Ok(session)
    }

    async fn get_session(&self, session_id: &str) -> Result<CallSession, AppError> {
        let path = self.session_path(session_id);

        if !path.exists() {
            return Err(AppError::NotFound(format!("call session {session_id}")));
        }

        let content = tokio_fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn terminate_session(
        &self,
        session_id: &str,
        status: CallStatus,
    ) -> Result<CallSession, AppError> {
        let mut session = self.get_session(session_id).await?;

        if session.is_terminal() {
            return Err(AppError::AlreadyTerminated(session_id.to_string()));
        }

        session.status = status;
        session.ended_at = Some(Utc::now());
        self.write_session(&session).await?;
        Ok(session)
    }

    async fn sessions_by_caller(&self, caller: &str) -> Result<Vec<CallSession>, AppError> {
        let mut sessions: Vec<CallSession> = self
            .read_all_sessions()
            .await?
            .into_iter()
            .filter(|s| s.caller == caller)
            .collect();

        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(sessions)
    }

    async fn sessions_by_receiver(&self, receiver: &str) -> Result<Vec<CallSession>, AppError> {
        let mut sessions: Vec<CallSession> = self
            .read_all_sessions()
            .await?
            .into_iter()
            .filter(|s| s.receiver == receiver)
            .collect();

        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(sessions)
    }

    /// Append a JSON line to `receipts.log`
    async fn record_receipt(&self, receipt: &PaymentReceipt) -> Result<(), AppError> {
        let json = serde_json::to_string(receipt)?;

        let mut file = tokio_fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.receipts_path())
            .await?;

        file.write_all(json.as_bytes()).await?;
        file.write_all(b"\n").await?;
        Ok(())
    }

    async fn latest_receipt(
        &self,
        caller: &str,
        receiver: &str,
    ) -> Result<Option<PaymentReceipt>, AppError> {
        let path = self.receipts_path();

        if !path.exists() {
            return Ok(None);
        }

        let content = tokio_fs::read_to_string(&path).await?;
        let mut latest: Option<PaymentReceipt> = None;

        for line in content.lines().filter(|line| !line.trim().is_empty()) {
            let receipt: PaymentReceipt = serde_json::from_str(line)?;
            if receipt.caller == caller
                && receipt.receiver == receiver
                && latest.as_ref().is_none_or(|r| receipt.paid_at > r.paid_at)
            {
                latest = Some(receipt);
            }
        }

        Ok(latest)
    }
}
