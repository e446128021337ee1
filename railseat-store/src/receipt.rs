use rand::Rng;
use uuid::Uuid;
use crate::app_config::ReceiptIdStrategy;

/// Mints receipt identifiers according to the configured strategy.
#[derive(Debug, Clone)]
pub struct ReceiptIssuer {
    strategy: ReceiptIdStrategy,
    next_sequence: u64,
}

impl ReceiptIssuer {
    pub fn new(strategy: ReceiptIdStrategy) -> Self {
        Self {
            strategy,
            next_sequence: 1,
        }
    }

    pub fn issue<R: Rng + ?Sized>(&mut self, rng: &mut R) -> String {
        match self.strategy {
            ReceiptIdStrategy::Random => format!("R{}", rng.gen_range(0..10_000)),
            ReceiptIdStrategy::Sequential => {
                let id = self.next_sequence;
                self.next_sequence += 1;
                format!("R{}", id)
            }
            ReceiptIdStrategy::Uuid => format!("R-{}", Uuid::new_v4().simple()),
        }
    }
}
