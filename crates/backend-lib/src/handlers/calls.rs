// ============================
// coachcall-backend-lib/src/handlers/calls.rs
// ============================
//! Call admission surface.
//!
//! Settlement happens here, over HTTP, before any signaling: the client
//! takes the returned `callId` and only then emits its `callUser` event
//! on the socket.

use axum::{
    extract::{Path, State},
    Json,
};
use coachcall_common::{
    CallCheckResponse, CallSession, EndCallRequest, StartCallRequest, StartCallResponse,
};
use std::sync::Arc;

use crate::admission;
use crate::error::AppError;
use crate::ledger::Ledger;
use crate::validation;
use crate::AppState;

/// `POST /call/start`: settle payment and open a session
pub async fn start_call<L: Ledger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Json(req): Json<StartCallRequest>,
) -> Result<Json<StartCallResponse>, AppError> {
    let user_id = validation::require_user_id(&req.user_id, "userId")?;
    let trainer_id = validation::require_user_id(&req.trainer_id, "trainerId")?;

    let admission = admission::admit_call(
        state.accounts.as_ref(),
        &state.ledger,
        state.settings.bypass_window(),
        user_id,
        trainer_id,
    )
    .await?;

    Ok(Json(StartCallResponse {
        message: "Call started successfully".to_string(),
        user_wallet: admission.caller_balance,
        trainer_wallet: admission.receiver_balance,
        call_id: admission.session.session_id,
        already_paid: admission.already_paid,
        warning: admission.reconciliation,
    }))
}

/// `POST /call/end`: close a session normally
pub async fn end_call<L: Ledger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Json(req): Json<EndCallRequest>,
) -> Result<Json<CallSession>, AppError> {
    let call_id = validation::require_field(&req.call_id, "callId")?;
    let session = admission::end_call(&state.ledger, call_id).await?;
    Ok(Json(session))
}

/// `POST /call/missed`: close a session that was never answered
pub async fn missed_call<L: Ledger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Json(req): Json<EndCallRequest>,
) -> Result<Json<CallSession>, AppError> {
    let call_id = validation::require_field(&req.call_id, "callId")?;
    let session = admission::mark_missed(&state.ledger, call_id).await?;
    Ok(Json(session))
}

/// `GET /call/check/{userId}/{trainerId}`: affordability without settlement
pub async fn check_call<L: Ledger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path((user_id, trainer_id)): Path<(String, String)>,
) -> Result<Json<CallCheckResponse>, AppError> {
    let user_id = validation::validate_user_id(&user_id)?;
    let trainer_id = validation::validate_user_id(&trainer_id)?;

    let check = admission::check_call(
        state.accounts.as_ref(),
        &state.ledger,
        state.settings.bypass_window(),
        user_id,
        trainer_id,
    )
    .await?;

    Ok(Json(CallCheckResponse {
        can_call: check.can_call,
        user_wallet: check.user_balance,
        trainer_fee: check.trainer_fee,
    }))
}

/// `GET /call/user/{userId}`: calls made, newest first
pub async fn caller_history<L: Ledger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<CallSession>>, AppError> {
    let user_id = validation::validate_user_id(&user_id)?;
    Ok(Json(state.ledger.sessions_by_caller(user_id).await?))
}

/// `GET /call/trainer/{trainerId}`: calls received, newest first
pub async fn receiver_history<L: Ledger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(trainer_id): Path<String>,
) -> Result<Json<Vec<CallSession>>, AppError> {
    let trainer_id = validation::validate_user_id(&trainer_id)?;
    Ok(Json(state.ledger.sessions_by_receiver(trainer_id).await?))
}
