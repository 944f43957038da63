use crate::domain::error::{AppError, Result};

/// Sizing for fixed-size sequential groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Items per group
    pub size: usize,
    /// Upper bound on the number of groups. Input beyond
    /// `size * max_groups` items is dropped before grouping.
    pub max_groups: Option<usize>,
}

impl ChunkConfig {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            max_groups: None,
        }
    }

    /// Fixed total capacity, e.g. `days x questions_per_day`
    pub fn bounded(size: usize, max_groups: usize) -> Self {
        Self {
            size,
            max_groups: Some(max_groups),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.max_groups.map(|groups| groups.saturating_mul(self.size))
    }
}

/// Partitions ordered items into contiguous groups.
///
/// Every group but the last holds exactly `size` items, the last holds
/// `1..=size`, and empty input yields no groups at all.
pub struct ChunkEngine {
    config: ChunkConfig,
}

impl ChunkEngine {
    pub fn new(config: ChunkConfig) -> Result<Self> {
        if config.size == 0 {
            return Err(AppError::ValidationError(
                "Chunk size must be greater than zero".to_string(),
            ));
        }
        if config.max_groups == Some(0) {
            return Err(AppError::ValidationError(
                "Maximum group count must be greater than zero".to_string(),
            ));
        }
        Ok(Self { config })
    }

    pub fn chunk<T: Clone>(&self, items: &[T]) -> Vec<Vec<T>> {
        let items = match self.config.capacity() {
            Some(capacity) if items.len() > capacity => {
                tracing::info!(
                    total = items.len(),
                    kept = capacity,
                    dropped = items.len() - capacity,
                    "Truncating input to group capacity"
                );
                &items[..capacity]
            }
            _ => items,
        };

        items
            .chunks(self.config.size)
            .map(|group| group.to_vec())
            .collect()
    }
}
