use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;

use crate::{
    db::KeyValueStore,
    error::{AppError, AppResult},
    models::{
        user_preferences::{current_year, sanitize_service_ids},
        ThemeMode, UserPreferences, YearRange,
    },
};

pub const PREFERENCES_KEY: &str = "userPreferences";
pub const THEME_MODE_KEY: &str = "themeMode";

/// Persists the single user-preferences record
///
/// Every update is a read-modify-write of the whole record. The write lock
/// serializes updates issued through one store.
pub struct PreferenceStore {
    store: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

impl PreferenceStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Persisted preferences, or defaults when absent or unreadable
    ///
    /// A stored year range is clamped again, so hand-edited or stale records
    /// still satisfy `1900 <= start <= end <= current year`.
    pub async fn load(&self) -> UserPreferences {
        self.load_at(current_year()).await
    }

    /// [`PreferenceStore::load`] against an explicit current year
    pub async fn load_at(&self, current_year: i32) -> UserPreferences {
        let mut prefs = self.load_raw().await;
        let stored = prefs.year_range;
        prefs.year_range = YearRange::clamped(stored.start_year, stored.end_year, current_year);

        if prefs.year_range != stored {
            tracing::warn!(
                stored_start = stored.start_year,
                stored_end = stored.end_year,
                start_year = prefs.year_range.start_year,
                end_year = prefs.year_range.end_year,
                "Stored year range out of bounds, clamped"
            );
        }
        prefs
    }

    async fn load_raw(&self) -> UserPreferences {
        let raw = match self.store.get_item(PREFERENCES_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return UserPreferences::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read preferences, using defaults");
                return UserPreferences::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Stored preferences are corrupt, using defaults");
            UserPreferences::default()
        })
    }

    /// Overwrites the whole record
    pub async fn save(&self, prefs: &UserPreferences) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        self.write(prefs).await
    }

    /// Keeps the positive numeric ids from `ids` and stores them as the selection
    pub async fn update_selected_services<I>(&self, ids: I) -> AppResult<UserPreferences>
    where
        I: IntoIterator<Item = i64>,
    {
        let selected = sanitize_service_ids(ids);
        tracing::info!(services = ?selected, "Updating selected services");

        self.update(|prefs| prefs.selected_service_ids = selected)
            .await
    }

    pub async fn update_year_range(&self, start_year: i32, end_year: i32) -> AppResult<UserPreferences> {
        self.update_year_range_at(start_year, end_year, current_year())
            .await
    }

    /// [`PreferenceStore::update_year_range`] against an explicit current year
    pub async fn update_year_range_at(
        &self,
        start_year: i32,
        end_year: i32,
        current_year: i32,
    ) -> AppResult<UserPreferences> {
        let range = YearRange::clamped(start_year, end_year, current_year);
        tracing::info!(
            requested_start = start_year,
            requested_end = end_year,
            start_year = range.start_year,
            end_year = range.end_year,
            "Updating year range"
        );

        self.update(|prefs| prefs.year_range = range).await
    }

    /// Stores the mode in the record and under its own key
    pub async fn update_theme_mode(&self, mode: ThemeMode) -> AppResult<UserPreferences> {
        let _guard = self.write_lock.lock().await;

        let mut prefs = self.load().await;
        prefs.theme_mode = mode;
        self.write(&prefs).await?;
        self.store.set_item(THEME_MODE_KEY, mode.as_str()).await?;

        tracing::info!(mode = mode.as_str(), "Theme mode updated");
        Ok(prefs)
    }

    /// The `themeMode` key when it holds a known mode, else the record's mode
    pub async fn load_theme_mode(&self) -> ThemeMode {
        match self.store.get_item(THEME_MODE_KEY).await {
            Ok(Some(raw)) => match ThemeMode::parse(raw.trim()) {
                Some(mode) => return mode,
                None => tracing::warn!(value = %raw, "Unknown stored theme mode"),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to read theme mode"),
        }

        self.load().await.theme_mode
    }

    async fn update<F>(&self, apply: F) -> AppResult<UserPreferences>
    where
        F: FnOnce(&mut UserPreferences),
    {
        let _guard = self.write_lock.lock().await;

        let mut prefs = self.load().await;
        apply(&mut prefs);
        self.write(&prefs).await?;
        Ok(prefs)
    }

    async fn write(&self, prefs: &UserPreferences) -> AppResult<()> {
        let raw = serde_json::to_string(prefs)
            .map_err(|e| AppError::Internal(format!("Failed to serialize preferences: {}", e)))?;
        self.store.set_item(PREFERENCES_KEY, &raw).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to persist preferences");
            e
        })
    }
}

/// Integer ids from a raw JSON array; strings, floats and other values are skipped
pub fn parse_service_ids(values: &[Value]) -> Vec<i64> {
    values.iter().filter_map(Value::as_i64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{FileStore, MemoryStore};
    use serde_json::json;
    use tokio_test::assert_ok;

    fn memory_store() -> (Arc<MemoryStore>, PreferenceStore) {
        let backing = Arc::new(MemoryStore::new());
        let store = PreferenceStore::new(backing.clone());
        (backing, store)
    }

    #[tokio::test]
    async fn test_load_defaults_when_absent() {
        let (_, store) = memory_store();
        assert_eq!(store.load().await, UserPreferences::default());
    }

    #[tokio::test]
    async fn test_load_defaults_when_corrupt() {
        let (backing, store) = memory_store();
        backing.set_item(PREFERENCES_KEY, "{not json").await.unwrap();

        assert_eq!(store.load().await, UserPreferences::default());
    }

    #[tokio::test]
    async fn test_load_fills_missing_fields() {
        let (backing, store) = memory_store();
        backing
            .set_item(PREFERENCES_KEY, r#"{"selectedServiceIds":[337]}"#)
            .await
            .unwrap();

        let prefs = store.load().await;
        assert_eq!(prefs.selected_service_ids, vec![337]);
        assert_eq!(prefs.theme_mode, ThemeMode::System);
        assert_eq!(prefs.year_range, YearRange::default());
    }

    #[tokio::test]
    async fn test_load_clamps_stored_year_range() {
        let (backing, store) = memory_store();
        backing
            .set_item(
                PREFERENCES_KEY,
                r#"{"yearRange":{"startYear":1800,"endYear":1700}}"#,
            )
            .await
            .unwrap();

        let prefs = store.load_at(2026).await;
        assert_eq!(
            prefs.year_range,
            YearRange {
                start_year: 1900,
                end_year: 1900
            }
        );
    }

    #[tokio::test]
    async fn test_load_raises_inverted_stored_range() {
        let (backing, store) = memory_store();
        backing
            .set_item(
                PREFERENCES_KEY,
                r#"{"yearRange":{"startYear":2015,"endYear":2001}}"#,
            )
            .await
            .unwrap();

        let prefs = store.load_at(2026).await;
        assert_eq!(
            prefs.year_range,
            YearRange {
                start_year: 2015,
                end_year: 2015
            }
        );
    }

    #[tokio::test]
    async fn test_save_overwrites_record() {
        let (backing, store) = memory_store();
        let mut prefs = UserPreferences::new();
        prefs.selected_service_ids = vec![8];
        store.save(&prefs).await.unwrap();

        let raw = backing.get_item(PREFERENCES_KEY).await.unwrap().unwrap();
        let stored: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored["selectedServiceIds"], json!([8]));
        assert_eq!(stored["themeMode"], json!("system"));
    }

    #[tokio::test]
    async fn test_update_selected_services_drops_invalid_ids() {
        let (_, store) = memory_store();
        let raw = vec![json!(8), json!(-1), json!("x"), json!(119)];

        store
            .update_selected_services(parse_service_ids(&raw))
            .await
            .unwrap();

        assert_eq!(store.load().await.selected_service_ids, vec![8, 119]);
    }

    #[tokio::test]
    async fn test_update_year_range_clamps() {
        let (_, store) = memory_store();

        let prefs = assert_ok!(store.update_year_range_at(1800, 2050, 2026).await);
        assert_eq!(
            prefs.year_range,
            YearRange {
                start_year: 1900,
                end_year: 2026
            }
        );
    }

    #[tokio::test]
    async fn test_update_year_range_raises_end_to_start() {
        let (_, store) = memory_store();

        store.update_year_range_at(2020, 2010, 2026).await.unwrap();
        assert_eq!(
            store.load().await.year_range,
            YearRange {
                start_year: 2020,
                end_year: 2020
            }
        );
    }

    #[tokio::test]
    async fn test_updates_merge_into_record() {
        let (_, store) = memory_store();

        store.update_selected_services([8, 337]).await.unwrap();
        store.update_year_range_at(1990, 2000, 2026).await.unwrap();
        store.update_theme_mode(ThemeMode::Dark).await.unwrap();

        let prefs = store.load().await;
        assert_eq!(prefs.selected_service_ids, vec![8, 337]);
        assert_eq!(prefs.year_range.start_year, 1990);
        assert_eq!(prefs.theme_mode, ThemeMode::Dark);
    }

    #[tokio::test]
    async fn test_theme_mode_has_its_own_key() {
        let (backing, store) = memory_store();
        assert_eq!(store.load_theme_mode().await, ThemeMode::System);

        store.update_theme_mode(ThemeMode::Light).await.unwrap();

        assert_eq!(
            backing.get_item(THEME_MODE_KEY).await.unwrap(),
            Some("light".to_string())
        );
        assert_eq!(store.load_theme_mode().await, ThemeMode::Light);
    }

    #[tokio::test]
    async fn test_unknown_theme_key_falls_back_to_record() {
        let (backing, store) = memory_store();
        store.update_theme_mode(ThemeMode::Dark).await.unwrap();
        backing.set_item(THEME_MODE_KEY, "sepia").await.unwrap();

        assert_eq!(store.load_theme_mode().await, ThemeMode::Dark);
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_not_lost() {
        let (_, store) = memory_store();
        let store = Arc::new(store);

        let services = {
            let store = store.clone();
            tokio::spawn(async move { store.update_selected_services([8]).await })
        };
        let years = {
            let store = store.clone();
            tokio::spawn(async move { store.update_year_range_at(2001, 2002, 2026).await })
        };
        services.await.unwrap().unwrap();
        years.await.unwrap().unwrap();

        let prefs = store.load().await;
        assert_eq!(prefs.selected_service_ids, vec![8]);
        assert_eq!(prefs.year_range.start_year, 2001);
    }

    #[tokio::test]
    async fn test_file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let store = PreferenceStore::new(Arc::new(FileStore::new(dir.path())));
        store.update_selected_services([119]).await.unwrap();

        let reopened = PreferenceStore::new(Arc::new(FileStore::new(dir.path())));
        assert_eq!(reopened.load().await.selected_service_ids, vec![119]);
    }

    #[test]
    fn test_parse_service_ids_skips_non_integers() {
        let raw = vec![json!(8), json!("119"), json!(2.5), json!(null), json!(-3)];
        assert_eq!(parse_service_ids(&raw), vec![8, -3]);
    }
}
