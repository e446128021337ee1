use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub booking: BookingRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 5001 }
    }
}

/// How receipt identifiers are minted at purchase time.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptIdStrategy {
    /// `R0`..`R9999`, drawn at random. Collisions are possible.
    Random,
    /// `R1`, `R2`, ... from a per-repository counter.
    Sequential,
    /// `R-` followed by a v4 uuid.
    Uuid,
}

/// Whether a seat change also moves the entry in the seat allocation map.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeatModificationPolicy {
    /// Only the ticket's seat field changes; allocations are left as they were.
    TicketOnly,
    /// The old seat is released and the new one recorded.
    SyncAllocations,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ReservedSeat {
    pub seat: String,
    pub section: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingRules {
    #[serde(default = "default_sections")]
    pub sections: Vec<String>,
    #[serde(default = "default_seats_per_section")]
    pub seats_per_section: u32,
    #[serde(default = "default_max_allocation_attempts")]
    pub max_allocation_attempts: u32,
    #[serde(default = "default_ticket_price")]
    pub ticket_price: f64,
    #[serde(default = "default_receipt_ids")]
    pub receipt_ids: ReceiptIdStrategy,
    #[serde(default = "default_seat_modification")]
    pub seat_modification: SeatModificationPolicy,
    /// Seats marked occupied at startup.
    #[serde(default)]
    pub reserved_seats: Vec<ReservedSeat>,
}

fn default_sections() -> Vec<String> { vec!["A".to_string(), "B".to_string()] }
fn default_seats_per_section() -> u32 { 100 }
fn default_max_allocation_attempts() -> u32 { 10_000 }
fn default_ticket_price() -> f64 { 20.0 }
fn default_receipt_ids() -> ReceiptIdStrategy { ReceiptIdStrategy::Sequential }
fn default_seat_modification() -> SeatModificationPolicy { SeatModificationPolicy::SyncAllocations }

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            sections: default_sections(),
            seats_per_section: default_seats_per_section(),
            max_allocation_attempts: default_max_allocation_attempts(),
            ticket_price: default_ticket_price(),
            receipt_ids: default_receipt_ids(),
            seat_modification: default_seat_modification(),
            reserved_seats: Vec::new(),
        }
    }
}

impl BookingRules {
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.sections.is_empty() || self.sections.iter().any(|s| s.is_empty()) {
            return Err(config::ConfigError::Message(
                "booking.sections must list at least one non-empty section".into(),
            ));
        }
        if self.seats_per_section == 0 {
            return Err(config::ConfigError::Message("booking.seats_per_section must be positive".into()));
        }
        if self.max_allocation_attempts == 0 {
            return Err(config::ConfigError::Message("booking.max_allocation_attempts must be positive".into()));
        }
        if !self.ticket_price.is_finite() || self.ticket_price < 0.0 {
            return Err(config::ConfigError::Message("booking.ticket_price must be a non-negative amount".into()));
        }
        Ok(())
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Untracked developer overrides
            .add_source(config::File::with_name("config/local").required(false))
            // RAILSEAT__SERVER__PORT=8080, RAILSEAT__BOOKING__SECTIONS=A,B,C
            .add_source(
                config::Environment::with_prefix("RAILSEAT")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("booking.sections")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_settings(s)
    }

    pub fn from_settings(settings: config::Config) -> Result<Self, config::ConfigError> {
        let config: Self = settings.try_deserialize()?;
        config.booking.validate()?;
        Ok(config)
    }
}
