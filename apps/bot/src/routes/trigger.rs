use axum::{extract::State, Json};
use serde::Serialize;

use crate::bot::{JobKind, SendResult};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub delivered: bool,
    pub kind: JobKind,
}

fn respond(kind: JobKind, result: SendResult) -> Result<Json<TriggerResponse>, AppError> {
    match result {
        SendResult::Delivered => Ok(Json(TriggerResponse {
            delivered: true,
            kind,
        })),
        SendResult::Failed => Err(AppError::Delivery(kind)),
        SendResult::Cancelled => Err(AppError::ShuttingDown),
    }
}

/// POST /api/v1/trigger/idea
/// Runs the idea pipeline now. Waits behind any run already in progress.
pub async fn handle_trigger_idea(
    State(state): State<AppState>,
) -> Result<Json<TriggerResponse>, AppError> {
    respond(JobKind::Idea, state.bot.send_inspiration().await)
}

/// POST /api/v1/trigger/meal
pub async fn handle_trigger_meal(
    State(state): State<AppState>,
) -> Result<Json<TriggerResponse>, AppError> {
    respond(JobKind::Meal, state.bot.send_dinner().await)
}
