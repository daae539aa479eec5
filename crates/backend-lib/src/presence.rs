// ============================
// coachcall-backend-lib/src/presence.rs
// ============================
//! Connection presence registry.
//!
//! Single source of truth for "is this user currently reachable". The
//! registry holds a non-owning association from a user identity to the
//! outbound channel of its live connection; the transport layer owns the
//! connection itself. State is process-local: running multiple instances
//! needs sticky routing or an external presence layer.

use coachcall_common::ServerEvent;
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Transport-assigned connection identifier
pub type ConnId = Uuid;

struct PresenceEntry {
    conn_id: ConnId,
    tx: mpsc::Sender<ServerEvent>,
}

/// In-memory directory from user identity to live connection
#[derive(Default)]
pub struct PresenceRegistry {
    entries: DashMap<String, PresenceEntry>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Bind `user_id` to a connection, unconditionally overwriting any
    /// prior binding. The displaced connection stays open but is no
    /// longer reachable through the registry.
    pub fn register(&self, user_id: &str, conn_id: ConnId, tx: mpsc::Sender<ServerEvent>) {
        self.entries
            .insert(user_id.to_string(), PresenceEntry { conn_id, tx });
    }

    /// Outbound channel of the connection bound to `user_id`. Absent
    /// means "not currently reachable", not an error.
    pub fn resolve(&self, user_id: &str) -> Option<mpsc::Sender<ServerEvent>> {
        self.entries.get(user_id).map(|entry| entry.tx.clone())
    }

    /// Connection currently bound to `user_id`, if any
    pub fn connection_of(&self, user_id: &str) -> Option<ConnId> {
        self.entries.get(user_id).map(|entry| entry.conn_id)
    }

    /// Release whatever binding `conn_id` holds. Called exactly once per
    /// connection close; a no-op when the connection never registered or
    /// its user has since re-registered elsewhere.
    pub fn remove(&self, conn_id: ConnId) {
        self.entries.retain(|_, entry| entry.conn_id != conn_id);
    }

    pub fn online_count(&self) -> usize {
        self.entries.len()
    }
}
