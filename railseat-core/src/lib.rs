pub mod models;
pub mod repository;

pub use models::{Passenger, Ticket};
pub use repository::TicketRepository;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("ticket not found for {email}")]
    NotFound { email: String },
    #[error("seat {seat} already allocated to another passenger")]
    SeatConflict { seat: String },
    #[error("no free seat found after {attempts} allocation attempts")]
    NoSeatAvailable { attempts: u32 },
}

impl BookingError {
    pub fn not_found<S: Into<String>>(email: S) -> Self {
        Self::NotFound { email: email.into() }
    }

    pub fn seat_conflict<S: Into<String>>(seat: S) -> Self {
        Self::SeatConflict { seat: seat.into() }
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
