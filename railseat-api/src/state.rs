use std::sync::Arc;

use railseat_booking::BookingService;
use railseat_store::{BookingRules, InMemoryTicketRepository};

#[derive(Clone)]
pub struct AppState {
    pub booking: BookingService,
}

impl AppState {
    pub fn new(booking: BookingService) -> Self {
        Self { booking }
    }

    /// Fresh in-memory repository with the configured reserved seats applied.
    pub fn from_rules(rules: &BookingRules) -> Self {
        let booking = BookingService::new(Arc::new(InMemoryTicketRepository::with_rules(rules)));
        for reserved in &rules.reserved_seats {
            booking.reserve_seat(&reserved.seat, &reserved.section);
        }
        Self::new(booking)
    }
}
