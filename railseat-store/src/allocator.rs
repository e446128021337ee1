use rand::seq::SliceRandom;
use rand::Rng;
use crate::app_config::BookingRules;

/// A randomly chosen seat that may or may not be free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatCandidate {
    pub seat: String,
    pub section: String,
}

/// Random-probe seat picker over a fixed section layout.
///
/// Each probe picks a section uniformly, then a seat number in
/// `[0, seats_per_section)`. The seat code is the section label followed by
/// the number (`"A17"`). Occupancy is checked by the caller, which owns the
/// allocation map.
#[derive(Debug, Clone)]
pub struct SeatAllocator {
    sections: Vec<String>,
    seats_per_section: u32,
    max_attempts: u32,
}

impl SeatAllocator {
    pub fn new(sections: Vec<String>, seats_per_section: u32, max_attempts: u32) -> Self {
        Self {
            sections,
            seats_per_section,
            max_attempts,
        }
    }

    pub fn from_rules(rules: &BookingRules) -> Self {
        Self::new(
            rules.sections.clone(),
            rules.seats_per_section,
            rules.max_allocation_attempts,
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Total number of distinct (seat, section) pairs the layout can produce.
    pub fn capacity(&self) -> usize {
        self.sections.len() * self.seats_per_section as usize
    }

    /// `None` when the layout has no seats at all.
    pub fn probe<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<SeatCandidate> {
        if self.seats_per_section == 0 {
            return None;
        }
        let section = self.sections.choose(rng)?;
        let number = rng.gen_range(0..self.seats_per_section);
        Some(SeatCandidate {
            seat: format!("{}{}", section, number),
            section: section.clone(),
        })
    }
}

/// Section implied by a seat code's leading letters: `"B42"` -> `"B"`.
pub fn section_of(seat: &str) -> Option<&str> {
    let end = seat
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphabetic())
        .map_or(seat.len(), |(i, _)| i);
    (end > 0).then(|| &seat[..end])
}
