// ============================
// coachcall-backend-lib/src/ws_router.rs
// ============================
//! Application router and WebSocket connection handling.
use crate::handlers::calls;
use crate::ledger::Ledger;
use crate::metrics::{WS_ACTIVE, WS_CONNECTION, WS_DISCONNECTION};
use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use coachcall_common::{ClientEvent, ServerEvent};
use futures_util::{SinkExt, StreamExt};
use metrics::{counter, gauge};
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::debug;
use uuid::Uuid;

/// Create the application router: the signaling channel plus the call
/// admission surface, with permissive CORS for browser clients.
pub fn create_router<L: Ledger + Clone + 'static>(state: Arc<AppState<L>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/call/start", post(calls::start_call))
        .route("/call/end", post(calls::end_call))
        .route("/call/missed", post(calls::missed_call))
        .route("/call/check/{user_id}/{trainer_id}", get(calls::check_call))
        .route("/call/user/{user_id}", get(calls::caller_history))
        .route("/call/trainer/{trainer_id}", get(calls::receiver_history))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handler for WebSocket connections
pub async fn ws_handler<L: Ledger + Clone + 'static>(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState<L>>>,
) -> impl IntoResponse {
    counter!(WS_CONNECTION).increment(1);
    gauge!(WS_ACTIVE).increment(1.0);

    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection<L: Ledger + Clone + 'static>(socket: WebSocket, state: Arc<AppState<L>>) {
    let conn_id = Uuid::new_v4();
    let (mut sink, mut stream) = socket.split();

    // Channel for queuing server events to this client
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(state.settings.ws_buffer);

    // Task: forward queued events out over the socket
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Ok(json) = serde_json::to_string(&event) else {
                continue;
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Tell the client its transport id before anything else, so it can
    // address itself prior to registering
    let _ = tx
        .send(ServerEvent::Me {
            connection_id: conn_id.to_string(),
        })
        .await;

    // Main task: process incoming frames
    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => state.broker.handle_event(conn_id, &tx, event),
                Err(e) => {
                    debug!(%conn_id, %e, "malformed signaling frame");
                    let _ = tx
                        .send(ServerEvent::MalformedMessage {
                            err_msg: e.to_string(),
                        })
                        .await;
                },
            },
            Message::Close(_) => break,
            _ => {}, // Ignore binary/ping/pong frames
        }
    }

    // Cleanup: release the presence binding when the connection drops
    state.broker.disconnect(conn_id);

    counter!(WS_DISCONNECTION).increment(1);
    gauge!(WS_ACTIVE).decrement(1.0);

    send_task.abort();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::InMemoryAccountStore;
    use crate::config::Settings;
    use crate::ledger::FlatFileLedger;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use coachcall_common::{Account, Role};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn setup_router() -> (Router, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let ledger = FlatFileLedger::new(temp_dir.path()).unwrap();

        let accounts = InMemoryAccountStore::new();
        accounts.insert(Account {
            id: "u1".to_string(),
            name: "Asha".to_string(),
            role: Role::User,
            balance: 100,
            call_fee: 0,
        });
        accounts.insert(Account {
            id: "poor".to_string(),
            name: "Ravi".to_string(),
            role: Role::User,
            balance: 10,
            call_fee: 0,
        });
        accounts.insert(Account {
            id: "t1".to_string(),
            name: "Coach Dev".to_string(),
            role: Role::Trainer,
            balance: 0,
            call_fee: 100,
        });

        let state = Arc::new(AppState::new(Arc::new(accounts), ledger, Settings::default()));
        (create_router(state), temp_dir)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_start_call_status_codes() {
        let (app, _temp_dir) = setup_router();

        let response = app
            .clone()
            .oneshot(post_json("/call/start", r#"{"userId":"u1","trainerId":"t1"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(post_json("/call/start", r#"{"userId":"u1"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(post_json(
                "/call/start",
                r#"{"userId":"poor","trainerId":"t1"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(post_json(
                "/call/start",
                r#"{"userId":"u1","trainerId":"ghost"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_end_unknown_call_is_not_found() {
        let (app, _temp_dir) = setup_router();

        let response = app
            .oneshot(post_json("/call/end", r#"{"callId":"no-such-session"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_check_route_responds() {
        let (app, _temp_dir) = setup_router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/call/check/u1/t1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
