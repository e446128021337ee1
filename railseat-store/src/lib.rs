pub mod app_config;
pub mod allocator;
pub mod receipt;
pub mod ticket_repo;

pub use allocator::SeatAllocator;
pub use app_config::{BookingRules, Config, ReceiptIdStrategy, SeatModificationPolicy};
pub use receipt::ReceiptIssuer;
pub use ticket_repo::InMemoryTicketRepository;
