// ============================
// coachcall-backend-lib/src/lib.rs
// ============================
//! Core backend-lib functionality for the coachcall signaling server.
//!
//! The library owns the presence registry, the signaling broker, and the
//! call admission layer; accounts and call records live behind the
//! [`accounts::AccountStore`] and [`ledger::Ledger`] traits.

pub mod accounts;
pub mod admission;
pub mod config;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod metrics;
pub mod presence;
pub mod signaling;
pub mod validation;
pub mod ws_router;

use std::sync::Arc;

use crate::accounts::AccountStore;
use crate::config::Settings;
use crate::ledger::Ledger;
use crate::presence::PresenceRegistry;
use crate::signaling::SignalingBroker;

/// Application state shared across all handlers
pub struct AppState<L> {
    /// Account service (balances and call fees)
    pub accounts: Arc<dyn AccountStore>,
    /// Call sessions and payment receipts
    pub ledger: L,
    /// Live user-to-connection directory
    pub presence: Arc<PresenceRegistry>,
    /// Event router on top of the presence registry
    pub broker: SignalingBroker,
    /// Settings manager
    pub settings: Arc<Settings>,
}

impl<L: Ledger + Clone + 'static> AppState<L> {
    /// Create a new application state
    pub fn new(accounts: Arc<dyn AccountStore>, ledger: L, settings: Settings) -> Self {
        let presence = Arc::new(PresenceRegistry::new());
        let broker = SignalingBroker::new(presence.clone());
        Self {
            accounts,
            ledger,
            presence,
            broker,
            settings: Arc::new(settings),
        }
    }
}
