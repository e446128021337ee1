use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A traveller. The email is the identity key; nothing else is validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Passenger {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl Passenger {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
        }
    }

    /// A passenger known only by email, as created by a seat change on an unknown booking.
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }
}

/// A purchased train ticket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub receipt_id: String,
    pub from: String,
    pub to: String,
    pub passenger: Passenger,
    pub seat: String,
    pub price_paid: f64,
    pub issued_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Minimal record holding only an email and a seat.
    pub fn seat_only(email: impl Into<String>, seat: impl Into<String>) -> Self {
        Self {
            passenger: Passenger::with_email(email),
            seat: seat.into(),
            ..Self::default()
        }
    }

    pub fn email(&self) -> &str {
        &self.passenger.email
    }
}
