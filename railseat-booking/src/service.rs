use std::sync::Arc;

use railseat_core::{BookingResult, Passenger, Ticket, TicketRepository};
use railseat_shared::Masked;
use serde::Serialize;
use tracing::{debug, info};

/// A passenger and the seat they occupy, as listed per section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeatAllocation {
    pub passenger: Passenger,
    pub seat: String,
}

impl From<Ticket> for SeatAllocation {
    fn from(ticket: Ticket) -> Self {
        Self {
            passenger: ticket.passenger,
            seat: ticket.seat,
        }
    }
}

/// Entry point for booking operations.
///
/// Thin layer over a [`TicketRepository`]; the only reshaping it does is the
/// per-section listing.
#[derive(Clone)]
pub struct BookingService {
    tickets: Arc<dyn TicketRepository>,
}

impl BookingService {
    pub fn new(tickets: Arc<dyn TicketRepository>) -> Self {
        Self { tickets }
    }

    pub fn purchase_ticket(&self, passenger: Passenger, from: &str, to: &str) -> BookingResult<Ticket> {
        let email = Masked(passenger.email.clone());
        let ticket = self.tickets.purchase_ticket(passenger, from, to)?;
        info!(
            email = %email,
            receipt_id = %ticket.receipt_id,
            seat = %ticket.seat,
            "Ticket purchased {} -> {}", ticket.from, ticket.to
        );
        Ok(ticket)
    }

    pub fn modify_seat(&self, email: &str, new_seat: &str) -> BookingResult<()> {
        self.tickets.modify_seat(email, new_seat)?;
        info!(email = %Masked(email), seat = new_seat, "Seat modified");
        Ok(())
    }

    pub fn get_ticket(&self, email: &str) -> BookingResult<Ticket> {
        self.tickets.get_ticket(email)
    }

    pub fn remove_ticket(&self, email: &str) -> BookingResult<()> {
        self.tickets.remove_ticket(email)?;
        info!(email = %Masked(email), "Ticket removed");
        Ok(())
    }

    pub fn users_by_section(&self, section: &str) -> Vec<SeatAllocation> {
        let users: Vec<SeatAllocation> = self
            .tickets
            .get_users_by_section(section)
            .into_iter()
            .map(SeatAllocation::from)
            .collect();
        debug!(section, count = users.len(), "Listed section occupants");
        users
    }

    /// Pre-seed the allocation map with a seat that has no ticket.
    ///
    /// The seat is skipped by random allocation, but it is not blocked:
    /// `modify_seat` only checks tickets, so a passenger can still move into it.
    pub fn reserve_seat(&self, seat: &str, section: &str) {
        self.tickets.initialize_seat_allocation(seat, section);
        debug!(seat, section, "Seat reserved");
    }
}
