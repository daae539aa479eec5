// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! shared between the coachcall signaling server and its clients.
//! This crate defines the signaling-channel events, the REST payloads of
//! the call admission surface, and the domain records they carry.

pub mod events;
pub mod models;

pub use events::{ClientEvent, ServerEvent};
pub use models::{Account, CallCheckResponse, CallSession, CallStatus, EndCallRequest,
                 PaymentReceipt, Role, StartCallRequest, StartCallResponse};
