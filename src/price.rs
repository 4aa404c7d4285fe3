//! Simulated price feed: a free-running USD value with no invariants.

use crate::engine::rng::Sampler;

pub const DEFAULT_PRICE_USD: f64 = 0.08;
const PRICE_RANGE: (f64, f64) = (0.07, 0.09);

#[derive(Debug, Clone, Copy)]
pub struct PriceFeed {
    price_usd: f64,
}

impl PriceFeed {
    pub fn new() -> Self {
        Self {
            price_usd: DEFAULT_PRICE_USD,
        }
    }

    pub fn price_usd(&self) -> f64 {
        self.price_usd
    }

    /// Draw a fresh simulated price and return it.
    pub fn refresh(&mut self, sampler: &mut dyn Sampler) -> f64 {
        self.price_usd = sampler.sample(PRICE_RANGE.0, PRICE_RANGE.1);
        self.price_usd
    }

    pub fn usd_value(&self, amount: f64) -> f64 {
        amount * self.price_usd
    }
}

impl Default for PriceFeed {
    fn default() -> Self {
        Self::new()
    }
}
