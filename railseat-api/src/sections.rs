use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use railseat_booking::SeatAllocation;
use serde::{Deserialize, Serialize};
use crate::state::AppState;
use crate::tickets::UserPayload;

#[derive(Debug, Serialize, Deserialize)]
pub struct SeatAllocationResponse {
    pub user: UserPayload,
    pub seat: String,
}

impl From<SeatAllocation> for SeatAllocationResponse {
    fn from(allocation: SeatAllocation) -> Self {
        Self {
            user: allocation.passenger.into(),
            seat: allocation.seat,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SectionUsersResponse {
    pub users: Vec<SeatAllocationResponse>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/sections/{section}/users", get(users_by_section))
}

/// GET /v1/sections/{section}/users
/// Occupants of a section; unknown sections list nobody
async fn users_by_section(
    State(state): State<AppState>,
    Path(section): Path<String>,
) -> Json<SectionUsersResponse> {
    let users = state
        .booking
        .users_by_section(&section)
        .into_iter()
        .map(SeatAllocationResponse::from)
        .collect();

    Json(SectionUsersResponse { users })
}
