use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use railseat_core::{Passenger, Ticket};
use serde::{Deserialize, Serialize};
use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPayload {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
}

impl From<UserPayload> for Passenger {
    fn from(user: UserPayload) -> Self {
        Passenger::new(user.first_name, user.last_name, user.email)
    }
}

impl From<Passenger> for UserPayload {
    fn from(passenger: Passenger) -> Self {
        Self {
            first_name: passenger.first_name,
            last_name: passenger.last_name,
            email: passenger.email,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PurchaseTicketRequest {
    pub user: UserPayload,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReceiptResponse {
    pub receipt_id: String,
    pub from: String,
    pub to: String,
    pub user: UserPayload,
    pub seat: String,
    pub price_paid: f64,
    pub issued_at: Option<DateTime<Utc>>,
}

impl From<Ticket> for ReceiptResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            receipt_id: ticket.receipt_id,
            from: ticket.from,
            to: ticket.to,
            user: ticket.passenger.into(),
            seat: ticket.seat,
            price_paid: ticket.price_paid,
            issued_at: ticket.issued_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ModifySeatRequest {
    pub new_seat: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/tickets", post(purchase_ticket))
        .route("/v1/tickets/{email}", get(get_receipt).delete(remove_ticket))
        .route("/v1/tickets/{email}/seat", put(modify_seat))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/tickets
async fn purchase_ticket(
    State(state): State<AppState>,
    Json(req): Json<PurchaseTicketRequest>,
) -> Result<Json<ReceiptResponse>, AppError> {
    let ticket = state
        .booking
        .purchase_ticket(req.user.into(), &req.from, &req.to)
        .map_err(|e| AppError::from(e).context("failed to purchase ticket"))?;

    Ok(Json(ticket.into()))
}

/// GET /v1/tickets/{email}
/// Receipt for the passenger's current ticket
async fn get_receipt(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<ReceiptResponse>, AppError> {
    let ticket = state
        .booking
        .get_ticket(&email)
        .map_err(|e| AppError::from(e).context("failed to get receipt"))?;

    Ok(Json(ticket.into()))
}

/// PUT /v1/tickets/{email}/seat
async fn modify_seat(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(req): Json<ModifySeatRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    state
        .booking
        .modify_seat(&email, &req.new_seat)
        .map_err(|e| AppError::from(e).context("failed to modify seat"))?;

    Ok(Json(SuccessResponse { success: true }))
}

/// DELETE /v1/tickets/{email}
async fn remove_ticket(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state
        .booking
        .remove_ticket(&email)
        .map_err(|e| AppError::from(e).context("failed to remove user"))?;

    Ok(Json(SuccessResponse { success: true }))
}
