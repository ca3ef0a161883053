use crate::models::PriceSample;
use rust_decimal::prelude::ToPrimitive;
use std::collections::VecDeque;

/// Default number of samples kept in the rolling window
pub const DEFAULT_WINDOW_CAPACITY: usize = 100;

/// Rolling window of price samples for a single trading session
///
/// Samples are kept in arrival order. Once the window is full the
/// oldest sample is evicted for every new one. Feed integrity is not
/// checked here: out-of-order timestamps and non-positive prices are
/// stored as delivered.
#[derive(Debug, Clone)]
pub struct PriceWindow {
    samples: VecDeque<PriceSample>,
    capacity: usize,
}

impl PriceWindow {
    /// Create a new window
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of samples to keep
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a sample, evicting the oldest ones if the window overflows
    pub fn append(&mut self, sample: PriceSample) {
        self.samples.push_back(sample);

        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Ordered copy of the current contents (oldest first)
    pub fn snapshot(&self) -> Vec<PriceSample> {
        self.samples.iter().copied().collect()
    }

    /// Price series for indicator computation (oldest first)
    pub fn prices(&self) -> Vec<f64> {
        self.samples
            .iter()
            .map(|s| s.price.to_f64().unwrap_or(f64::NAN))
            .collect()
    }

    /// Most recent sample
    pub fn latest(&self) -> Option<&PriceSample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for PriceWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}
