use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::Utc;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use railseat_core::{BookingError, BookingResult, Passenger, Ticket, TicketRepository};
use railseat_shared::Masked;
use tracing::debug;

use crate::allocator::{section_of, SeatAllocator};
use crate::app_config::{BookingRules, SeatModificationPolicy};
use crate::receipt::ReceiptIssuer;

/// Tickets keyed by email, plus a seat -> holders index.
#[derive(Debug, Default)]
struct TicketBook {
    tickets: HashMap<String, Ticket>,
    holders: HashMap<String, BTreeSet<String>>,
}

impl TicketBook {
    fn get(&self, email: &str) -> Option<&Ticket> {
        self.tickets.get(email)
    }

    /// Returns the ticket it replaced, if any.
    fn insert(&mut self, ticket: Ticket) -> Option<Ticket> {
        let email = ticket.email().to_string();
        let seat = ticket.seat.clone();
        let previous = self.tickets.insert(email.clone(), ticket);
        if let Some(old) = &previous {
            self.unindex(&old.seat, &email);
        }
        self.index(&seat, &email);
        previous
    }

    fn remove(&mut self, email: &str) -> Option<Ticket> {
        let ticket = self.tickets.remove(email)?;
        self.unindex(&ticket.seat, email);
        Some(ticket)
    }

    /// Changes the seat of an existing ticket and returns the seat it held.
    fn reseat(&mut self, email: &str, seat: &str) -> Option<String> {
        let ticket = self.tickets.get_mut(email)?;
        let old = std::mem::replace(&mut ticket.seat, seat.to_string());
        if old != seat {
            self.unindex(&old, email);
            self.index(seat, email);
        }
        Some(old)
    }

    fn is_held(&self, seat: &str) -> bool {
        self.holders.contains_key(seat)
    }

    fn held_by_other(&self, seat: &str, email: &str) -> bool {
        self.holders
            .get(seat)
            .is_some_and(|emails| emails.iter().any(|holder| holder != email))
    }

    fn holders_of<'a>(&'a self, seat: &str) -> impl Iterator<Item = &'a Ticket> + 'a {
        self.holders
            .get(seat)
            .into_iter()
            .flatten()
            .filter_map(move |email| self.tickets.get(email))
    }

    fn index(&mut self, seat: &str, email: &str) {
        self.holders
            .entry(seat.to_string())
            .or_default()
            .insert(email.to_string());
    }

    fn unindex(&mut self, seat: &str, email: &str) {
        if let Some(emails) = self.holders.get_mut(seat) {
            emails.remove(email);
            if emails.is_empty() {
                self.holders.remove(seat);
            }
        }
    }
}

/// Everything guarded by the repository lock.
struct Inventory {
    tickets: TicketBook,
    /// seat -> section
    allocations: BTreeMap<String, String>,
    rng: StdRng,
    receipts: ReceiptIssuer,
}

impl Inventory {
    fn is_allocated(&self, seat: &str, section: &str) -> bool {
        self.allocations.get(seat).is_some_and(|allocated| allocated == section)
    }

    fn issue_receipt(&mut self) -> String {
        self.receipts.issue(&mut self.rng)
    }

    /// Drops the allocation entry unless some ticket still sits in the seat.
    /// Returns the seat's section either way.
    fn release_seat(&mut self, seat: &str) -> Option<String> {
        if self.tickets.is_held(seat) {
            return self.allocations.get(seat).cloned();
        }
        self.allocations.remove(seat)
    }

    fn move_allocation(&mut self, old_seat: Option<&str>, new_seat: &str) {
        if old_seat == Some(new_seat) {
            return;
        }
        let old_section = old_seat.and_then(|seat| self.release_seat(seat));
        match section_of(new_seat).map(str::to_string).or(old_section) {
            Some(section) => {
                self.allocations.insert(new_seat.to_string(), section);
            }
            None => debug!(seat = new_seat, "Seat code names no section, allocation not recorded"),
        }
    }
}

/// In-memory ticket store.
///
/// A single mutex covers tickets and seat allocations together. Allocation
/// probes re-acquire it per attempt so a long search never starves other callers.
pub struct InMemoryTicketRepository {
    inner: Mutex<Inventory>,
    allocator: SeatAllocator,
    ticket_price: f64,
    seat_modification: SeatModificationPolicy,
}

impl InMemoryTicketRepository {
    pub fn new() -> Self {
        Self::with_rules(&BookingRules::default())
    }

    pub fn with_rules(rules: &BookingRules) -> Self {
        Self::build(rules, StdRng::from_entropy())
    }

    /// Deterministic seat and receipt draws, for reproducible runs.
    pub fn with_seed(rules: &BookingRules, seed: u64) -> Self {
        Self::build(rules, StdRng::seed_from_u64(seed))
    }

    fn build(rules: &BookingRules, rng: StdRng) -> Self {
        Self {
            inner: Mutex::new(Inventory {
                tickets: TicketBook::default(),
                allocations: BTreeMap::new(),
                rng,
                receipts: ReceiptIssuer::new(rules.receipt_ids),
            }),
            allocator: SeatAllocator::from_rules(rules),
            ticket_price: rules.ticket_price,
            seat_modification: rules.seat_modification,
        }
    }

    /// Probe until a free seat turns up, then record it and run `on_claim`
    /// inside the same critical section.
    fn claim_seat<T>(&self, on_claim: impl FnOnce(&mut Inventory, String) -> T) -> BookingResult<T> {
        for attempt in 1..=self.allocator.max_attempts() {
            let mut inventory = self.inner.lock();
            let Some(candidate) = self.allocator.probe(&mut inventory.rng) else {
                break;
            };
            if inventory.is_allocated(&candidate.seat, &candidate.section) {
                continue;
            }
            debug!(seat = %candidate.seat, section = %candidate.section, attempt, "Seat allocated");
            inventory
                .allocations
                .insert(candidate.seat.clone(), candidate.section);
            return Ok(on_claim(&mut *inventory, candidate.seat));
        }
        Err(BookingError::NoSeatAvailable {
            attempts: self.allocator.max_attempts(),
        })
    }
}

impl Default for InMemoryTicketRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl TicketRepository for InMemoryTicketRepository {
    fn initialize_seat_allocation(&self, seat: &str, section: &str) {
        self.inner
            .lock()
            .allocations
            .insert(seat.to_string(), section.to_string());
    }

    fn add_ticket(&self, ticket: Ticket) {
        self.inner.lock().tickets.insert(ticket);
    }

    fn get_ticket(&self, email: &str) -> BookingResult<Ticket> {
        self.inner
            .lock()
            .tickets
            .get(email)
            .cloned()
            .ok_or_else(|| BookingError::not_found(email))
    }

    fn remove_ticket(&self, email: &str) -> BookingResult<()> {
        let mut inventory = self.inner.lock();
        let ticket = inventory
            .tickets
            .remove(email)
            .ok_or_else(|| BookingError::not_found(email))?;
        inventory.allocations.remove(&ticket.seat);
        debug!(email = %Masked(email), seat = %ticket.seat, "Ticket removed, seat released");
        Ok(())
    }

    fn is_seat_allocated(&self, seat: &str, section: &str) -> bool {
        self.inner.lock().is_allocated(seat, section)
    }

    fn allocate_seat(&self) -> BookingResult<String> {
        self.claim_seat(|_, seat| seat)
    }

    fn purchase_ticket(&self, passenger: Passenger, from: &str, to: &str) -> BookingResult<Ticket> {
        let price_paid = self.ticket_price;
        self.claim_seat(|inventory, seat| {
            let ticket = Ticket {
                receipt_id: inventory.issue_receipt(),
                from: from.to_string(),
                to: to.to_string(),
                passenger,
                seat,
                price_paid,
                issued_at: Some(Utc::now()),
            };
            // A repeat purchase replaces the old booking; its seat goes back to the pool.
            if let Some(previous) = inventory.tickets.insert(ticket.clone()) {
                if previous.seat != ticket.seat {
                    inventory.release_seat(&previous.seat);
                }
            }
            debug!(
                email = %Masked(ticket.email()),
                receipt_id = %ticket.receipt_id,
                seat = %ticket.seat,
                "Ticket issued"
            );
            ticket
        })
    }

    fn modify_seat(&self, email: &str, new_seat: &str) -> BookingResult<()> {
        let mut inventory = self.inner.lock();

        if inventory.tickets.held_by_other(new_seat, email) {
            return Err(BookingError::seat_conflict(new_seat));
        }

        let previous_seat = inventory.tickets.reseat(email, new_seat);
        if previous_seat.is_none() {
            inventory.tickets.insert(Ticket::seat_only(email, new_seat));
        }

        if self.seat_modification == SeatModificationPolicy::SyncAllocations {
            inventory.move_allocation(previous_seat.as_deref(), new_seat);
        }

        debug!(
            email = %Masked(email),
            from_seat = previous_seat.as_deref().unwrap_or("-"),
            to_seat = new_seat,
            "Seat modified"
        );
        Ok(())
    }

    fn get_users_by_section(&self, section: &str) -> Vec<Ticket> {
        let guard = self.inner.lock();
        let inventory: &Inventory = &guard;
        inventory
            .allocations
            .iter()
            .filter(|(_, allocated)| allocated.as_str() == section)
            .flat_map(|(seat, _)| inventory.tickets.holders_of(seat))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn ticket(email: &str, seat: &str) -> Ticket {
        Ticket::seat_only(email, seat)
    }

    fn rules_with(policy: SeatModificationPolicy) -> BookingRules {
        BookingRules {
            seat_modification: policy,
            ..BookingRules::default()
        }
    }

    #[test]
    fn test_add_and_get_ticket() {
        let repo = InMemoryTicketRepository::new();
        repo.add_ticket(ticket("user1@example.com", "A1"));

        let found = repo.get_ticket("user1@example.com").unwrap();
        assert_eq!(found.seat, "A1");

        let missing = repo.get_ticket("user2@example.com");
        assert_eq!(missing, Err(BookingError::not_found("user2@example.com")));
    }

    #[test]
    fn test_add_overwrites_by_email() {
        let repo = InMemoryTicketRepository::new();
        repo.add_ticket(ticket("user1@example.com", "A1"));
        repo.add_ticket(ticket("user2@example.com", "B7"));
        repo.add_ticket(ticket("user1@example.com", "A9"));

        assert_eq!(repo.get_ticket("user1@example.com").unwrap().seat, "A9");
        assert_eq!(repo.get_ticket("user2@example.com").unwrap().seat, "B7");
    }

    #[test]
    fn test_remove_ticket() {
        let repo = InMemoryTicketRepository::new();
        repo.add_ticket(ticket("user1@example.com", "A1"));
        repo.initialize_seat_allocation("A1", "A");

        repo.remove_ticket("user1@example.com").unwrap();
        assert!(!repo.is_seat_allocated("A1", "A"));
        assert!(repo.get_ticket("user1@example.com").is_err());

        let err = repo.remove_ticket("user2@example.com").unwrap_err();
        assert_eq!(err.to_string(), "ticket not found for user2@example.com");
    }

    #[test]
    fn test_is_seat_allocated() {
        let repo = InMemoryTicketRepository::new();
        repo.initialize_seat_allocation("A1", "A");

        let cases = [("A1", "A", true), ("A2", "A", false), ("A1", "B", false)];
        for (seat, section, expected) in cases {
            assert_eq!(repo.is_seat_allocated(seat, section), expected, "{seat}/{section}");
        }
    }

    #[test]
    fn test_allocate_seat_yields_distinct_seats() {
        let repo = InMemoryTicketRepository::with_seed(&BookingRules::default(), 42);
        let mut seen = HashSet::new();
        for _ in 0..150 {
            let seat = repo.allocate_seat().unwrap();
            let section = section_of(&seat).unwrap().to_string();
            assert!(seen.insert((seat.clone(), section.clone())), "duplicate {seat}");
            assert!(repo.is_seat_allocated(&seat, &section));
        }
    }

    #[test]
    fn test_allocate_seat_gives_up_when_layout_is_full() {
        let rules = BookingRules {
            sections: vec!["A".into()],
            seats_per_section: 1,
            max_allocation_attempts: 25,
            ..BookingRules::default()
        };
        let repo = InMemoryTicketRepository::with_seed(&rules, 1);

        assert_eq!(repo.allocate_seat().unwrap(), "A0");
        assert_eq!(
            repo.allocate_seat(),
            Err(BookingError::NoSeatAvailable { attempts: 25 })
        );
        let purchase = repo.purchase_ticket(Passenger::with_email("late@example.com"), "X", "Y");
        assert!(matches!(purchase, Err(BookingError::NoSeatAvailable { .. })));
        assert!(repo.get_ticket("late@example.com").is_err());
    }

    #[test]
    fn test_purchase_ticket() {
        let repo = InMemoryTicketRepository::new();
        let passenger = Passenger::new("Jane", "Doe", "user1@example.com");

        let ticket = repo.purchase_ticket(passenger.clone(), "StationA", "StationB").unwrap();
        assert_eq!(ticket.passenger, passenger);
        assert_eq!(ticket.from, "StationA");
        assert_eq!(ticket.to, "StationB");
        assert_eq!(ticket.price_paid, 20.0);
        assert_eq!(ticket.receipt_id, "R1");
        assert!(ticket.issued_at.is_some());

        let section = section_of(&ticket.seat).unwrap();
        assert!(repo.is_seat_allocated(&ticket.seat, section));
        assert_eq!(repo.get_ticket("user1@example.com").unwrap(), ticket);
    }

    #[test]
    fn test_repeat_purchase_releases_previous_seat() {
        let repo = InMemoryTicketRepository::with_seed(&BookingRules::default(), 3);
        let first = repo.purchase_ticket(Passenger::with_email("u@example.com"), "A", "B").unwrap();
        let second = repo.purchase_ticket(Passenger::with_email("u@example.com"), "B", "C").unwrap();

        assert_ne!(first.seat, second.seat);
        assert!(!repo.is_seat_allocated(&first.seat, section_of(&first.seat).unwrap()));
        assert_eq!(repo.get_ticket("u@example.com").unwrap().receipt_id, second.receipt_id);
    }

    #[test]
    fn test_repeat_purchase_keeps_seat_shared_with_another_ticket() {
        let repo = InMemoryTicketRepository::with_seed(&BookingRules::default(), 5);
        repo.add_ticket(ticket("stays@example.com", "A5"));
        repo.initialize_seat_allocation("A5", "A");
        repo.add_ticket(ticket("leaves@example.com", "A5"));

        let fresh = repo
            .purchase_ticket(Passenger::with_email("leaves@example.com"), "X", "Y")
            .unwrap();
        assert_ne!(fresh.seat, "A5");
        assert!(repo.is_seat_allocated("A5", "A"));
        assert_eq!(repo.get_ticket("stays@example.com").unwrap().seat, "A5");
        assert!(repo
            .get_users_by_section("A")
            .iter()
            .any(|t| t.email() == "stays@example.com"));
    }

    #[test]
    fn test_modify_seat() {
        let repo = InMemoryTicketRepository::new();
        repo.add_ticket(ticket("user1@example.com", "A1"));
        repo.add_ticket(ticket("user2@example.com", "A2"));

        // Held by user2
        assert_eq!(
            repo.modify_seat("user1@example.com", "A2"),
            Err(BookingError::seat_conflict("A2"))
        );
        assert_eq!(repo.get_ticket("user1@example.com").unwrap().seat, "A1");

        // Unknown passenger gets a minimal ticket
        repo.modify_seat("user3@example.com", "A3").unwrap();
        let created = repo.get_ticket("user3@example.com").unwrap();
        assert_eq!(created.seat, "A3");
        assert!(created.receipt_id.is_empty());

        // Existing ticket is updated in place
        repo.modify_seat("user1@example.com", "A4").unwrap();
        assert_eq!(repo.get_ticket("user1@example.com").unwrap().seat, "A4");

        // Old seat is free for someone else now
        repo.modify_seat("user2@example.com", "A1").unwrap();
    }

    #[test]
    fn test_modify_to_own_seat_is_noop() {
        let repo = InMemoryTicketRepository::new();
        repo.add_ticket(ticket("user1@example.com", "A1"));
        repo.initialize_seat_allocation("A1", "A");

        repo.modify_seat("user1@example.com", "A1").unwrap();
        assert_eq!(repo.get_ticket("user1@example.com").unwrap().seat, "A1");
        assert!(repo.is_seat_allocated("A1", "A"));
    }

    #[test]
    fn test_modify_seat_syncs_allocations() {
        let repo = InMemoryTicketRepository::with_rules(&rules_with(SeatModificationPolicy::SyncAllocations));
        repo.add_ticket(ticket("user1@example.com", "A1"));
        repo.initialize_seat_allocation("A1", "A");

        repo.modify_seat("user1@example.com", "B5").unwrap();
        assert!(!repo.is_seat_allocated("A1", "A"));
        assert!(repo.is_seat_allocated("B5", "B"));
        assert_eq!(repo.get_users_by_section("B").len(), 1);
        assert!(repo.get_users_by_section("A").is_empty());

        // No prefix: stays in the section of the seat it came from
        repo.modify_seat("user1@example.com", "42").unwrap();
        assert!(repo.is_seat_allocated("42", "B"));
        assert!(!repo.is_seat_allocated("B5", "B"));

        // Unknown passenger: the new seat is recorded too
        repo.modify_seat("user2@example.com", "A7").unwrap();
        assert!(repo.is_seat_allocated("A7", "A"));
        assert_eq!(repo.get_users_by_section("A")[0].email(), "user2@example.com");
    }

    #[test]
    fn test_modify_seat_keeps_allocation_of_shared_seat() {
        let repo = InMemoryTicketRepository::with_rules(&rules_with(SeatModificationPolicy::SyncAllocations));
        repo.add_ticket(ticket("stays@example.com", "A5"));
        repo.initialize_seat_allocation("A5", "A");
        repo.add_ticket(ticket("moves@example.com", "A5"));

        repo.modify_seat("moves@example.com", "B9").unwrap();
        assert!(repo.is_seat_allocated("A5", "A"));
        assert!(repo.is_seat_allocated("B9", "B"));
        let listed = repo.get_users_by_section("A");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].email(), "stays@example.com");
    }

    #[test]
    fn test_modify_seat_ticket_only_leaves_allocations() {
        let repo = InMemoryTicketRepository::with_rules(&rules_with(SeatModificationPolicy::TicketOnly));
        repo.add_ticket(ticket("user1@example.com", "A1"));
        repo.initialize_seat_allocation("A1", "A");

        repo.modify_seat("user1@example.com", "B5").unwrap();
        assert_eq!(repo.get_ticket("user1@example.com").unwrap().seat, "B5");
        assert!(repo.is_seat_allocated("A1", "A"));
        assert!(!repo.is_seat_allocated("B5", "B"));
    }

    #[test]
    fn test_get_users_by_section() {
        let repo = InMemoryTicketRepository::new();
        repo.add_ticket(ticket("user1", "A1"));
        repo.add_ticket(ticket("user2", "B1"));
        repo.initialize_seat_allocation("A1", "A");
        repo.initialize_seat_allocation("B1", "B");

        for (section, expected) in [("A", 1), ("B", 1), ("C", 0)] {
            assert_eq!(repo.get_users_by_section(section).len(), expected, "section {section}");
        }
        assert_eq!(repo.get_users_by_section("A")[0].email(), "user1");
    }

    #[test]
    fn test_get_users_by_section_skips_unticketed_seats() {
        let repo = InMemoryTicketRepository::new();
        repo.initialize_seat_allocation("A0", "A");
        repo.add_ticket(ticket("user1", "A2"));
        repo.initialize_seat_allocation("A2", "A");

        let users = repo.get_users_by_section("A");
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].seat, "A2");
    }

    #[test]
    fn test_concurrent_purchases_never_share_a_seat() {
        let repo = Arc::new(InMemoryTicketRepository::new());
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let repo = Arc::clone(&repo);
                thread::spawn(move || {
                    (0..20)
                        .map(|i| {
                            let email = format!("w{worker}-p{i}@example.com");
                            repo.purchase_ticket(Passenger::with_email(email), "X", "Y").unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let tickets: Vec<Ticket> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let seats: HashSet<&str> = tickets.iter().map(|t| t.seat.as_str()).collect();
        let receipts: HashSet<&str> = tickets.iter().map(|t| t.receipt_id.as_str()).collect();

        assert_eq!(tickets.len(), 160);
        assert_eq!(seats.len(), 160);
        assert_eq!(receipts.len(), 160);
        let listed = repo.get_users_by_section("A").len() + repo.get_users_by_section("B").len();
        assert_eq!(listed, 160);
    }

    proptest! {
        #[test]
        fn prop_get_returns_last_ticket_added(
            adds in prop::collection::vec((0usize..4, "[AB][0-9]{1,2}"), 0..40)
        ) {
            let repo = InMemoryTicketRepository::new();
            let mut last_seat = HashMap::new();
            for (user, seat) in adds {
                let email = format!("user{user}@example.com");
                repo.add_ticket(ticket(&email, &seat));
                last_seat.insert(email, seat);
            }

            for user in 0..4 {
                let email = format!("user{user}@example.com");
                match last_seat.get(&email) {
                    Some(seat) => {
                        prop_assert_eq!(&repo.get_ticket(&email).unwrap().seat, seat);
                    }
                    None => {
                        prop_assert_eq!(repo.get_ticket(&email), Err(BookingError::not_found(&email)));
                    }
                }
            }
        }

        #[test]
        fn prop_allocations_are_distinct_up_to_capacity(seed in any::<u64>(), count in 0usize..=40) {
            let rules = BookingRules {
                sections: vec!["A".into(), "B".into()],
                seats_per_section: 20,
                max_allocation_attempts: 100_000,
                ..BookingRules::default()
            };
            let repo = InMemoryTicketRepository::with_seed(&rules, seed);

            let mut seen = HashSet::new();
            for _ in 0..count {
                let seat = repo.allocate_seat().unwrap();
                let section = section_of(&seat).unwrap().to_string();
                prop_assert!(repo.is_seat_allocated(&seat, &section));
                prop_assert!(seen.insert((seat, section)));
            }
            prop_assert_eq!(seen.len(), count);
        }
    }
}
