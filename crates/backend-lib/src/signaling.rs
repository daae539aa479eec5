// ============================
// coachcall-backend-lib/src/signaling.rs
// ============================
//! Signaling broker.
//!
//! A stateless-per-event router layered on the presence registry. The
//! broker deliberately does not queue or retry undeliverable events:
//! call signaling is real-time, so a missed delivery must surface to the
//! caller as "no answer" through its own timeout rather than a server
//! retry. There are no acknowledgements; ordering between two events for
//! the same pair is "as sent" over the single relay hop.

use std::sync::Arc;

use coachcall_common::{ClientEvent, ServerEvent};
use metrics::counter;
use tokio::sync::mpsc;
use tracing::debug;

use crate::metrics::{SIGNAL_DROPPED, SIGNAL_RELAYED};
use crate::presence::{ConnId, PresenceRegistry};
use crate::validation;

#[derive(Clone)]
pub struct SignalingBroker {
    presence: Arc<PresenceRegistry>,
}

impl SignalingBroker {
    pub fn new(presence: Arc<PresenceRegistry>) -> Self {
        Self { presence }
    }

    /// Route one inbound event from connection `conn_id`, whose outbound
    /// channel is `tx`.
    pub fn handle_event(&self, conn_id: ConnId, tx: &mpsc::Sender<ServerEvent>, event: ClientEvent) {
        match event {
            ClientEvent::Register { user_id } => {
                if validation::validate_user_id(&user_id).is_err() {
                    debug!(%conn_id, "dropping registration with malformed user id");
                    return;
                }
                self.presence.register(&user_id, conn_id, tx.clone());
                debug!(%conn_id, %user_id, "registered");
            },
            ClientEvent::CallUser {
                from,
                to,
                signal_data,
            } => {
                self.forward(&to, ServerEvent::IncomingCall { from, signal_data });
            },
            ClientEvent::AcceptCall { to, signal } => {
                self.forward(&to, ServerEvent::CallAccepted { signal });
            },
            ClientEvent::SendMessage {
                sender,
                receiver,
                message,
            } => {
                if validation::validate_message(&message).is_err() {
                    debug!(%conn_id, "dropping oversized chat payload");
                    return;
                }
                self.forward(&receiver, ServerEvent::ReceiveMessage { sender, message });
            },
        }
    }

    /// Connection closed: release any identity bound to it
    pub fn disconnect(&self, conn_id: ConnId) {
        self.presence.remove(conn_id);
        debug!(%conn_id, "disconnected");
    }

    /// Fire-and-forget relay. A missing target or a saturated peer
    /// channel drops the event; the sender gets no failure signal.
    fn forward(&self, to: &str, event: ServerEvent) {
        let Some(peer) = self.presence.resolve(to) else {
            debug!(to, "dropping event for unreachable target");
            counter!(SIGNAL_DROPPED).increment(1);
            return;
        };

        if peer.try_send(event).is_err() {
            debug!(to, "dropping event for saturated connection");
            counter!(SIGNAL_DROPPED).increment(1);
            return;
        }

        counter!(SIGNAL_RELAYED).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn setup() -> (SignalingBroker, Arc<PresenceRegistry>) {
        let presence = Arc::new(PresenceRegistry::new());
        (SignalingBroker::new(presence.clone()), presence)
    }

    fn connect(
        broker: &SignalingBroker,
        user_id: &str,
    ) -> (ConnId, mpsc::Sender<ServerEvent>, mpsc::Receiver<ServerEvent>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(8);
        broker.handle_event(
            conn_id,
            &tx,
            ClientEvent::Register {
                user_id: user_id.to_string(),
            },
        );
        (conn_id, tx, rx)
    }

    #[tokio::test]
    async fn test_call_offer_is_relayed() {
        let (broker, _) = setup();
        let (_ca, tx_a, _rx_a) = connect(&broker, "A");
        let (_cb, _tx_b, mut rx_b) = connect(&broker, "B");

        broker.handle_event(
            Uuid::new_v4(),
            &tx_a,
            ClientEvent::CallUser {
                from: "A".to_string(),
                to: "B".to_string(),
                signal_data: json!({"sdp": "offer"}),
            },
        );

        match rx_b.try_recv().unwrap() {
            ServerEvent::IncomingCall { from, signal_data } => {
                assert_eq!(from, "A");
                assert_eq!(signal_data["sdp"], "offer");
            },
            other => panic!("Expected IncomingCall, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_offer_to_unregistered_target_is_dropped() {
        let (broker, _) = setup();
        let (_ca, tx_a, mut rx_a) = connect(&broker, "A");

        broker.handle_event(
            Uuid::new_v4(),
            &tx_a,
            ClientEvent::CallUser {
                from: "A".to_string(),
                to: "B".to_string(),
                signal_data: json!({}),
            },
        );

        // No delivery anywhere, no error back to the caller
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_offer_after_target_disconnect_is_dropped() {
        let (broker, _) = setup();
        let (conn_a, _tx_a, mut rx_a) = connect(&broker, "A");
        let (_cx, tx_x, _rx_x) = connect(&broker, "X");

        broker.disconnect(conn_a);

        broker.handle_event(
            Uuid::new_v4(),
            &tx_x,
            ClientEvent::CallUser {
                from: "X".to_string(),
                to: "A".to_string(),
                signal_data: json!({}),
            },
        );

        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_accept_is_relayed_back() {
        let (broker, _) = setup();
        let (_ca, _tx_a, mut rx_a) = connect(&broker, "A");
        let (_cb, tx_b, _rx_b) = connect(&broker, "B");

        broker.handle_event(
            Uuid::new_v4(),
            &tx_b,
            ClientEvent::AcceptCall {
                to: "A".to_string(),
                signal: json!({"sdp": "answer"}),
            },
        );

        match rx_a.try_recv().unwrap() {
            ServerEvent::CallAccepted { signal } => assert_eq!(signal["sdp"], "answer"),
            other => panic!("Expected CallAccepted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_chat_message_is_relayed() {
        let (broker, _) = setup();
        let (_ca, tx_a, _rx_a) = connect(&broker, "A");
        let (_cb, _tx_b, mut rx_b) = connect(&broker, "B");

        broker.handle_event(
            Uuid::new_v4(),
            &tx_a,
            ClientEvent::SendMessage {
                sender: "A".to_string(),
                receiver: "B".to_string(),
                message: "see you at 6".to_string(),
            },
        );

        match rx_b.try_recv().unwrap() {
            ServerEvent::ReceiveMessage { sender, message } => {
                assert_eq!(sender, "A");
                assert_eq!(message, "see you at 6");
            },
            other => panic!("Expected ReceiveMessage, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reconnect_rebinds_delivery() {
        let (broker, presence) = setup();
        let (conn_old, _tx_old, mut rx_old) = connect(&broker, "B");
        let (_cb2, _tx_new, mut rx_new) = connect(&broker, "B");
        let (_cx, tx_x, _rx_x) = connect(&broker, "X");

        // The stale close of the displaced connection must not unbind B
        broker.disconnect(conn_old);
        assert!(presence.resolve("B").is_some());

        broker.handle_event(
            Uuid::new_v4(),
            &tx_x,
            ClientEvent::CallUser {
                from: "X".to_string(),
                to: "B".to_string(),
                signal_data: json!({}),
            },
        );

        assert!(rx_old.try_recv().is_err());
        assert!(matches!(
            rx_new.try_recv().unwrap(),
            ServerEvent::IncomingCall { .. }
        ));
    }
}
