// ================
// common/src/events.rs
// ================
//! Signaling-channel protocol.
//!
//! Events travel as JSON text frames tagged by an `event` field. Field
//! names are camelCase on the wire. Relay is fire-and-forget: there are
//! no acknowledgements or sequence numbers, and an event whose target is
//! not registered is dropped. Clients detect "no answer" with their own
//! timeout.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Events sent from a client to the server
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Bind this connection to a user identity. Last registration wins:
    /// a user reconnecting on a new connection silently displaces the
    /// old mapping.
    #[serde(rename_all = "camelCase")]
    Register { user_id: String },
    /// Offer a call to another user, carrying the WebRTC signal blob
    #[serde(rename_all = "camelCase")]
    CallUser {
        from: String,
        to: String,
        signal_data: Value,
    },
    /// Answer a pending offer
    #[serde(rename_all = "camelCase")]
    AcceptCall { to: String, signal: Value },
    /// Relay a chat line to another user
    #[serde(rename_all = "camelCase")]
    SendMessage {
        sender: String,
        receiver: String,
        message: String,
    },
}

/// Events sent from the server to a client
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Sent once per connection, immediately after the upgrade
    #[serde(rename_all = "camelCase")]
    Me { connection_id: String },
    /// A call offer relayed from `from`
    #[serde(rename_all = "camelCase")]
    IncomingCall { from: String, signal_data: Value },
    /// The callee answered; carries the answering signal blob
    #[serde(rename_all = "camelCase")]
    CallAccepted { signal: Value },
    /// A chat line relayed from `sender`
    #[serde(rename_all = "camelCase")]
    ReceiveMessage { sender: String, message: String },
    /// Reply to a frame that could not be parsed as a [`ClientEvent`]
    #[serde(rename_all = "camelCase")]
    MalformedMessage { err_msg: String },
}
