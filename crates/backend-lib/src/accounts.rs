// ============================
// coachcall-backend-lib/src/accounts.rs
// ============================
//! Account store abstraction with an in-memory implementation.
//!
//! The account service owns user records; this core only reads them and
//! moves balances. The one invariant the trait encodes is that the
//! balance check and the debit are a single conditional update, never a
//! read-then-write pair.

use async_trait::async_trait;
use coachcall_common::Account;
use dashmap::DashMap;
use std::path::Path;
use tokio::fs;

use crate::error::AppError;

/// Trait for account backends
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fetch an account by id
    async fn get(&self, id: &str) -> Result<Account, AppError>;

    /// Subtract `amount` from the balance where the balance covers it,
    /// as one atomic conditional update. Returns the new balance, or
    /// `None` when the balance was insufficient (nothing is written in
    /// that case).
    async fn debit_if_sufficient(&self, id: &str, amount: u64) -> Result<Option<u64>, AppError>;

    /// Add `amount` to the balance, returning the new balance
    async fn credit(&self, id: &str, amount: u64) -> Result<u64, AppError>;
}

/// Process-local account store backed by a concurrent map.
///
/// Mutable references handed out per entry are exclusive, so the
/// check-and-debit in `debit_if_sufficient` cannot interleave with
/// another writer on the same account.
#[derive(Default)]
pub struct InMemoryAccountStore {
    accounts: DashMap<String, Account>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    pub fn insert(&self, account: Account) {
        self.accounts.insert(account.id.clone(), account);
    }

    pub fn remove(&self, id: &str) {
        self.accounts.remove(id);
    }

    /// Seed the store from a JSON array of accounts on disk
    pub async fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let content = fs::read_to_string(path.as_ref()).await?;
        let accounts: Vec<Account> = serde_json::from_str(&content)?;

        let store = Self::new();
        for account in accounts {
            store.insert(account);
        }
        Ok(store)
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn get(&self, id: &str) -> Result<Account, AppError> {
        self.accounts
            .get(id)
            .map(|entry| entry.clone())
            .ok_or_else(|| AppError::NotFound(format!("account {id}")))
    }

    async fn debit_if_sufficient(&self, id: &str, amount: u64) -> Result<Option<u64>, AppError> {
        let mut account = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("account {id}")))?;

        if account.balance < amount {
            return Ok(None);
        }

        account.balance -= amount;
        Ok(Some(account.balance))
    }

    async fn credit(&self, id: &str, amount: u64) -> Result<u64, AppError> {
        let mut account = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("account {id}")))?;

        account.balance += amount;
        Ok(account.balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coachcall_common::Role;
    use std::sync::Arc;

    fn account(id: &str, role: Role, balance: u64, call_fee: u64) -> Account {
        Account {
            id: id.to_string(),
            name: id.to_string(),
            role,
            balance,
            call_fee,
        }
    }

    #[tokio::test]
    async fn test_debit_and_credit() {
        let store = InMemoryAccountStore::new();
        store.insert(account("u1", Role::User, 100, 0));
        store.insert(account("t1", Role::Trainer, 0, 100));

        assert_eq!(store.debit_if_sufficient("u1", 100).await.unwrap(), Some(0));
        assert_eq!(store.credit("t1", 100).await.unwrap(), 100);

        // Balance exhausted: conditional debit declines without writing
        assert_eq!(store.debit_if_sufficient("u1", 1).await.unwrap(), None);
        assert_eq!(store.get("u1").await.unwrap().balance, 0);
    }

    #[tokio::test]
    async fn test_unknown_account_is_not_found() {
        let store = InMemoryAccountStore::new();
        assert!(matches!(
            store.get("ghost").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            store.debit_if_sufficient("ghost", 1).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            store.credit("ghost", 1).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_debits_never_overdraw() {
        let store = Arc::new(InMemoryAccountStore::new());
        store.insert(account("u1", Role::User, 250, 0));

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..10 {
            let store = store.clone();
            tasks.spawn(async move { store.debit_if_sufficient("u1", 100).await.unwrap() });
        }

        let mut successes = 0;
        while let Some(result) = tasks.join_next().await {
            if result.unwrap().is_some() {
                successes += 1;
            }
        }

        assert_eq!(successes, 2);
        assert_eq!(store.get("u1").await.unwrap().balance, 50);
    }
}
