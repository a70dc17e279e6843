//! Component configuration.

use serde::{Deserialize, Serialize};

/// Tunables for a component's internal channels.
///
/// The coordination channels between the Reader and Coordinator tasks are
/// fixed at capacity 1 (each pairing encodes an ordering constraint); only
/// the process-facing capacities are configurable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComponentConfig {
    /// Queue depth for subscribe/unsubscribe requests.
    pub control_capacity: usize,
    /// Buffered offers per subscription. Offers are serial within one
    /// dispatch, so 1 is enough unless processes poll lazily.
    pub offer_capacity: usize,
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self {
            control_capacity: 16,
            offer_capacity: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ComponentConfig::default();
        assert_eq!(config.control_capacity, 16);
        assert_eq!(config.offer_capacity, 1);
    }
}
