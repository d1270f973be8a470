use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// Earliest year accepted in a year-range filter
pub const MIN_YEAR: i32 = 1900;

/// Current calendar year in local time
pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

/// Inclusive release-year window
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct YearRange {
    pub start_year: i32,
    pub end_year: i32,
}

impl YearRange {
    /// The widest allowed window, `[1900, current_year]`
    pub fn full(current_year: i32) -> Self {
        Self {
            start_year: MIN_YEAR,
            end_year: current_year,
        }
    }

    /// Clamps both bounds into `[1900, current_year]`; an end before the
    /// start is raised to the start.
    pub fn clamped(start_year: i32, end_year: i32, current_year: i32) -> Self {
        let start_year = start_year.clamp(MIN_YEAR, current_year);
        let end_year = end_year.min(current_year).max(start_year);
        Self {
            start_year,
            end_year,
        }
    }

    /// Contains `year` (inclusive on both ends)
    pub fn contains(&self, year: i32) -> bool {
        (self.start_year..=self.end_year).contains(&year)
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self::full(current_year())
    }
}

/// Light, dark, or follow the device setting
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
            ThemeMode::System => "system",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(ThemeMode::Light),
            "dark" => Some(ThemeMode::Dark),
            "system" => Some(ThemeMode::System),
            _ => None,
        }
    }

    /// Whether the dark palette is active given the device's own setting
    pub fn is_dark(&self, system_dark: bool) -> bool {
        match self {
            ThemeMode::Light => false,
            ThemeMode::Dark => true,
            ThemeMode::System => system_dark,
        }
    }

    /// Flips light/dark. From `System` it picks the opposite of the device setting.
    pub fn toggled(&self, system_dark: bool) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::System if system_dark => ThemeMode::Light,
            ThemeMode::System => ThemeMode::Dark,
        }
    }
}

/// The single persisted settings record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    /// Watch-provider ids the user subscribes to
    #[serde(default)]
    pub selected_service_ids: Vec<u32>,
    #[serde(default)]
    pub year_range: YearRange,
    #[serde(default)]
    pub theme_mode: ThemeMode,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self::new()
    }
}

impl UserPreferences {
    /// Creates first-run preferences
    pub fn new() -> Self {
        Self {
            selected_service_ids: Vec::new(),
            year_range: YearRange::default(),
            theme_mode: ThemeMode::System,
        }
    }

    /// Pipe-joined provider filter, or `None` when no service is selected
    pub fn providers_filter(&self) -> Option<String> {
        if self.selected_service_ids.is_empty() {
            return None;
        }

        Some(
            self.selected_service_ids
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join("|"),
        )
    }
}

/// Keeps positive ids that fit a provider id, dropping repeats
pub fn sanitize_service_ids<I>(ids: I) -> Vec<u32>
where
    I: IntoIterator<Item = i64>,
{
    let mut kept: Vec<u32> = Vec::new();
    for id in ids {
        if let Ok(id) = u32::try_from(id) {
            if id > 0 && !kept.contains(&id) {
                kept.push(id);
            }
        }
    }
    kept
}
