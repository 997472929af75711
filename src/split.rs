//! Sequential splitting
//!
//! Order-preserving splitter producing every contiguous
//! (train, calibration, test, ...) block layout of the configured sizes,
//! slid one position at a time. Shuffled splits would destroy the temporal
//! structure the weighting schemes rely on.
use crate::errors::ConformalError;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Sequential data splitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequentialSplit {
    sizes: Vec<usize>,
}

impl SequentialSplit {
    /// Create a splitter from the size of each set in a split.
    /// * `sizes` - One positive block size per set, in order.
    pub fn new(sizes: Vec<usize>) -> Result<Self, ConformalError> {
        if sizes.is_empty() || sizes.iter().any(|s| *s == 0) {
            return Err(ConformalError::InvalidParameter(
                "sizes".to_string(),
                "a non-empty sequence of positive block sizes".to_string(),
                format!("{:?}", sizes),
            ));
        }
        Ok(SequentialSplit { sizes })
    }

    /// Total number of indices one split consumes.
    pub fn total_size(&self) -> usize {
        self.sizes.iter().sum()
    }

    /// Number of splits available over a sequence of length `len`.
    pub fn n_splits(&self, len: usize) -> usize {
        (len + 1).saturating_sub(self.total_size())
    }

    /// Iterate sequentially over the possible splits of `0..len`, yielding
    /// one index range per configured set.
    pub fn split(&self, len: usize) -> impl Iterator<Item = Vec<Range<usize>>> + '_ {
        let offsets: Vec<usize> = self
            .sizes
            .iter()
            .scan(0, |acc, size| {
                let start = *acc;
                *acc += size;
                Some(start)
            })
            .collect();
        (0..self.n_splits(len)).map(move |t| {
            offsets
                .iter()
                .zip(&self.sizes)
                .map(|(offset, size)| t + offset..t + offset + size)
                .collect()
        })
    }
}
