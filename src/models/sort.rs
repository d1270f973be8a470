use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::MediaKind;

/// Field a listing is ordered by
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    VoteAverage,
    Popularity,
    ReleaseDate,
    VoteCount,
}

impl SortKey {
    /// Field name in the discover endpoint's sort vocabulary for `kind`
    pub fn field_for(&self, kind: MediaKind) -> &'static str {
        match (self, kind) {
            (SortKey::VoteAverage, _) => "vote_average",
            (SortKey::Popularity, _) => "popularity",
            (SortKey::VoteCount, _) => "vote_count",
            (SortKey::ReleaseDate, MediaKind::Movie) => "primary_release_date",
            (SortKey::ReleaseDate, MediaKind::Tv) => "first_air_date",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Sort key plus direction; drives both the upstream `sort_by` and the merge comparator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortConfig {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// `field.direction` expression for the discover endpoint of `kind`
    pub fn to_query(&self, kind: MediaKind) -> String {
        format!("{}.{}", self.key.field_for(kind), self.direction.as_str())
    }
}

impl Display for SortConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.key.field_for(MediaKind::Movie), self.direction.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_date_maps_per_kind() {
        let sort = SortConfig::new(SortKey::ReleaseDate, SortDirection::Asc);
        assert_eq!(sort.to_query(MediaKind::Movie), "primary_release_date.asc");
        assert_eq!(sort.to_query(MediaKind::Tv), "first_air_date.asc");
    }

    #[test]
    fn test_shared_fields_map_identically() {
        let sort = SortConfig::new(SortKey::Popularity, SortDirection::Desc);
        assert_eq!(sort.to_query(MediaKind::Movie), "popularity.desc");
        assert_eq!(sort.to_query(MediaKind::Tv), "popularity.desc");
    }

    #[test]
    fn test_default_is_rating_descending() {
        let sort = SortConfig::default();
        assert_eq!(sort.key, SortKey::VoteAverage);
        assert_eq!(sort.direction, SortDirection::Desc);
    }

    #[test]
    fn test_sort_key_serialization() {
        let key: SortKey = serde_json::from_str("\"vote_count\"").unwrap();
        assert_eq!(key, SortKey::VoteCount);
        assert_eq!(
            serde_json::to_string(&SortKey::ReleaseDate).unwrap(),
            "\"release_date\""
        );
    }
}
