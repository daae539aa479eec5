// ==============
// coachcall-backend-lib/src/metrics.rs

//! Central place for metric keys
pub const WS_CONNECTION: &str = "ws.connection";
pub const WS_DISCONNECTION: &str = "ws.disconnection";
pub const WS_ACTIVE: &str = "ws.active";
pub const SIGNAL_RELAYED: &str = "signal.relayed";
pub const SIGNAL_DROPPED: &str = "signal.dropped";
pub const CALL_ADMITTED: &str = "call.admitted";
pub const CALL_REJECTED: &str = "call.rejected";
pub const CALL_COMPLETED: &str = "call.completed";
pub const CALL_MISSED: &str = "call.missed";
pub const RECONCILIATION_FAILURE: &str = "call.reconciliation_failure";
