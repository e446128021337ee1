use crate::models::{Passenger, Ticket};
use crate::BookingResult;

/// Storage for tickets and the seat allocation map.
///
/// Implementations keep both structures behind one exclusive guard: any
/// operation touching tickets and allocations together must appear atomic to
/// every other caller.
pub trait TicketRepository: Send + Sync {
    /// Record `seat` as occupied in `section`, overwriting any previous section.
    fn initialize_seat_allocation(&self, seat: &str, section: &str);

    /// Insert or overwrite the ticket keyed by its passenger's email.
    fn add_ticket(&self, ticket: Ticket);

    fn get_ticket(&self, email: &str) -> BookingResult<Ticket>;

    /// Delete the ticket and free its seat in a single step.
    fn remove_ticket(&self, email: &str) -> BookingResult<()>;

    /// True only if `seat` is allocated to exactly `section`.
    fn is_seat_allocated(&self, seat: &str, section: &str) -> bool;

    /// Probe for a free seat, record it, and return its code.
    fn allocate_seat(&self) -> BookingResult<String>;

    fn purchase_ticket(&self, passenger: Passenger, from: &str, to: &str) -> BookingResult<Ticket>;

    /// Move the passenger to `new_seat`, creating a minimal ticket if none exists.
    fn modify_seat(&self, email: &str, new_seat: &str) -> BookingResult<()>;

    /// Tickets whose seat is allocated to `section`, in seat order.
    fn get_users_by_section(&self, section: &str) -> Vec<Ticket>;
}
