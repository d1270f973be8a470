use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A watch provider from the per-kind provider catalogs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamingService {
    pub provider_id: u32,
    pub provider_name: String,
    #[serde(default)]
    pub logo_path: Option<String>,
    #[serde(default)]
    pub display_priority: Option<i32>,
    /// Ranking per region code (e.g. "TR" -> 3)
    #[serde(default)]
    pub display_priorities: HashMap<String, i32>,
}

impl StreamingService {
    /// Ranking in `region`, falling back to the global priority; unranked providers sort last
    pub fn priority_in(&self, region: &str) -> i32 {
        self.display_priorities
            .get(region)
            .copied()
            .or(self.display_priority)
            .unwrap_or(i32::MAX)
    }
}

/// Provider entry attached to a single title
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderRef {
    pub provider_id: u32,
    #[serde(default)]
    pub provider_name: String,
    #[serde(default)]
    pub logo_path: Option<String>,
    #[serde(default)]
    pub display_priority: Option<i32>,
}

/// Where a title can be watched in one region
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RegionProviders {
    #[serde(default)]
    pub link: Option<String>,
    /// Subscription services
    #[serde(default)]
    pub flatrate: Vec<ProviderRef>,
    #[serde(default)]
    pub rent: Vec<ProviderRef>,
    #[serde(default)]
    pub buy: Vec<ProviderRef>,
}

impl RegionProviders {
    pub fn is_empty(&self) -> bool {
        self.flatrate.is_empty() && self.rent.is_empty() && self.buy.is_empty()
    }
}
