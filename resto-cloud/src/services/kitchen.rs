//! Kitchen status settings: lazy defaults, validated partial updates

use async_trait::async_trait;
use serde_json::Value;
use shared::error::{AppError, ErrorCode};
use shared::models::kitchen;
use shared::models::{KitchenContext, KitchenStatus, StatusSettings};

use crate::db::BoxError;
use crate::db::restaurants::Restaurant;
use crate::error::{ServiceError, ServiceResult};

/// Where a restaurant's status settings live
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store `defaults` unless settings already exist, then return what is
    /// stored. `None` when the restaurant does not exist.
    async fn ensure_status_settings(
        &self,
        restaurant_id: &str,
        defaults: &Value,
        now: i64,
    ) -> Result<Option<Value>, BoxError>;

    /// `false` when the restaurant does not exist.
    async fn save_status_settings(
        &self,
        restaurant_id: &str,
        settings: &Value,
        now: i64,
    ) -> Result<bool, BoxError>;
}

/// Settings of `restaurant`, writing the defaults back on first read.
pub async fn settings_for(
    store: &dyn SettingsStore,
    restaurant: &Restaurant,
) -> ServiceResult<StatusSettings> {
    if let Some(stored) = &restaurant.status_settings {
        return Ok(parse_stored(&restaurant.id, stored));
    }

    let defaults = serde_json::to_value(StatusSettings::defaults())?;
    let now = shared::util::now_millis();
    let stored = store
        .ensure_status_settings(&restaurant.id, &defaults, now)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::RestaurantNotFound))?;
    Ok(parse_stored(&restaurant.id, &stored))
}

/// Stored settings were validated on write; anything unreadable falls back
/// to the built-in policies.
fn parse_stored(restaurant_id: &str, stored: &Value) -> StatusSettings {
    serde_json::from_value(stored.clone()).unwrap_or_else(|e| {
        tracing::warn!(restaurant_id = %restaurant_id, "Unreadable status settings: {e}");
        StatusSettings::default()
    })
}

/// Validate `raw`, merge it over the current settings and store the result.
///
/// A rejected payload leaves storage untouched.
pub async fn update_settings(
    store: &dyn SettingsStore,
    restaurant: &Restaurant,
    raw: &Value,
) -> ServiceResult<StatusSettings> {
    let update = StatusSettings::from_update(raw)
        .map_err(|e| AppError::with_message(ErrorCode::InvalidStatusSettings, e.to_string()))?;

    let merged = settings_for(store, restaurant).await?.merged_with(&update);
    let now = shared::util::now_millis();
    let saved = store
        .save_status_settings(&restaurant.id, &serde_json::to_value(&merged)?, now)
        .await?;
    if !saved {
        return Err(AppError::new(ErrorCode::RestaurantNotFound).into());
    }
    Ok(merged)
}

pub fn current_status(restaurant: &Restaurant) -> ServiceResult<KitchenStatus> {
    KitchenStatus::from_db(&restaurant.kitchen_status).ok_or_else(|| {
        ServiceError::Db(
            format!(
                "restaurant {} has unknown kitchen status {}",
                restaurant.id, restaurant.kitchen_status
            )
            .into(),
        )
    })
}

pub async fn context_for(
    store: &dyn SettingsStore,
    restaurant: &Restaurant,
) -> ServiceResult<KitchenContext> {
    let status = current_status(restaurant)?;
    let settings = settings_for(store, restaurant).await?;
    Ok(kitchen::context(status, &settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory restaurants: id -> stored settings
    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<HashMap<String, Option<Value>>>,
        writes: Mutex<u32>,
    }

    impl MemoryStore {
        fn with(id: &str, stored: Option<Value>) -> Self {
            let store = Self::default();
            store.rows.lock().unwrap().insert(id.into(), stored);
            store
        }

        fn stored(&self, id: &str) -> Option<Value> {
            self.rows.lock().unwrap().get(id).cloned().flatten()
        }

        fn writes(&self) -> u32 {
            *self.writes.lock().unwrap()
        }
    }

    #[async_trait]
    impl SettingsStore for MemoryStore {
        async fn ensure_status_settings(
            &self,
            restaurant_id: &str,
            defaults: &Value,
            _now: i64,
        ) -> Result<Option<Value>, BoxError> {
            let mut rows = self.rows.lock().unwrap();
            let Some(slot) = rows.get_mut(restaurant_id) else {
                return Ok(None);
            };
            if slot.is_none() {
                *slot = Some(defaults.clone());
                *self.writes.lock().unwrap() += 1;
            }
            Ok(slot.clone())
        }

        async fn save_status_settings(
            &self,
            restaurant_id: &str,
            settings: &Value,
            _now: i64,
        ) -> Result<bool, BoxError> {
            let mut rows = self.rows.lock().unwrap();
            let Some(slot) = rows.get_mut(restaurant_id) else {
                return Ok(false);
            };
            *slot = Some(settings.clone());
            *self.writes.lock().unwrap() += 1;
            Ok(true)
        }
    }

    fn restaurant(id: &str, status_settings: Option<Value>) -> Restaurant {
        Restaurant {
            id: id.into(),
            name: "Chez Luigi".into(),
            phone: None,
            status: "active".into(),
            kitchen_status: "RUSH".into(),
            status_settings,
            business_hours: None,
        }
    }

    fn app_code(err: ServiceError) -> ErrorCode {
        match err {
            ServiceError::App(e) => e.code,
            ServiceError::Db(e) => panic!("unexpected infrastructure error: {e}"),
        }
    }

    #[test]
    fn test_parse_stored_settings() {
        let settings = parse_stored(
            "r-1",
            &json!({"CALM": {"fixed": 10}, "STOP": {"message": "Fermé ce soir"}}),
        );
        assert_eq!(kitchen::phrase(KitchenStatus::Calm, &settings), "10 minutes");
        assert_eq!(kitchen::phrase(KitchenStatus::Stop, &settings), "Fermé ce soir");
        assert_eq!(
            kitchen::phrase(KitchenStatus::Rush, &settings),
            "entre 45 et 60 minutes"
        );
    }

    #[test]
    fn test_unreadable_settings_fall_back_to_defaults() {
        let settings = parse_stored("r-1", &json!({"CALM": "vite"}));
        assert_eq!(settings, StatusSettings::default());
        assert_eq!(kitchen::phrase(KitchenStatus::Calm, &settings), "15 minutes");
    }

    #[test]
    fn test_defaults_round_trip_through_storage() {
        let stored = serde_json::to_value(StatusSettings::defaults()).unwrap();
        assert_eq!(parse_stored("r-1", &stored), StatusSettings::defaults());
    }

    #[tokio::test]
    async fn test_first_read_writes_defaults_back() {
        let store = MemoryStore::with("r-1", None);

        let settings = settings_for(&store, &restaurant("r-1", None)).await.unwrap();
        assert_eq!(settings, StatusSettings::defaults());
        assert_eq!(
            store.stored("r-1"),
            Some(serde_json::to_value(StatusSettings::defaults()).unwrap())
        );
        assert_eq!(store.writes(), 1);

        // the row now carries settings: later reads do not write
        let loaded = restaurant("r-1", store.stored("r-1"));
        settings_for(&store, &loaded).await.unwrap();
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn test_first_read_keeps_concurrent_write() {
        let custom = json!({"CALM": {"fixed": 5}});
        let store = MemoryStore::with("r-1", Some(custom.clone()));

        // the row was loaded before another request stored its settings
        let settings = settings_for(&store, &restaurant("r-1", None)).await.unwrap();
        assert_eq!(kitchen::phrase(KitchenStatus::Calm, &settings), "5 minutes");
        assert_eq!(store.stored("r-1"), Some(custom));
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_first_read_of_missing_restaurant() {
        let store = MemoryStore::default();
        let err = settings_for(&store, &restaurant("gone", None))
            .await
            .unwrap_err();
        assert_eq!(app_code(err), ErrorCode::RestaurantNotFound);
    }

    #[tokio::test]
    async fn test_rejected_update_leaves_storage_untouched() {
        let stored = json!({"CALM": {"fixed": 10}});
        let store = MemoryStore::with("r-1", Some(stored.clone()));
        let current = restaurant("r-1", Some(stored.clone()));

        for bad in [
            json!({"CALM": {"fixed": 12}, "RUSH": {"min": 60, "max": 45}}),
            json!({"LUNCH": {"fixed": 5}}),
            json!({"STOP": {"message": ""}}),
        ] {
            let err = update_settings(&store, &current, &bad).await.unwrap_err();
            assert_eq!(app_code(err), ErrorCode::InvalidStatusSettings);
        }
        assert_eq!(store.stored("r-1"), Some(stored));
        assert_eq!(store.writes(), 0);

        // rejected before the lazy defaults too
        let fresh = MemoryStore::with("r-2", None);
        let err = update_settings(&fresh, &restaurant("r-2", None), &json!([]))
            .await
            .unwrap_err();
        assert_eq!(app_code(err), ErrorCode::InvalidStatusSettings);
        assert_eq!(fresh.stored("r-2"), None);
    }

    #[tokio::test]
    async fn test_update_merges_over_stored_settings() {
        let stored = json!({"CALM": {"fixed": 10}, "STOP": {"message": "Fermé"}});
        let store = MemoryStore::with("r-1", Some(stored.clone()));

        let merged = update_settings(
            &store,
            &restaurant("r-1", Some(stored)),
            &json!({"RUSH": {"min": 50, "max": 70}}),
        )
        .await
        .unwrap();

        assert_eq!(kitchen::phrase(KitchenStatus::Calm, &merged), "10 minutes");
        assert_eq!(
            kitchen::phrase(KitchenStatus::Rush, &merged),
            "entre 50 et 70 minutes"
        );
        assert_eq!(kitchen::phrase(KitchenStatus::Stop, &merged), "Fermé");
        assert_eq!(
            store.stored("r-1"),
            Some(serde_json::to_value(&merged).unwrap())
        );
    }

    #[tokio::test]
    async fn test_context_uses_current_status() {
        let store = MemoryStore::with("r-1", None);
        let context = context_for(&store, &restaurant("r-1", None)).await.unwrap();
        assert_eq!(context.status, KitchenStatus::Rush);
        assert_eq!(context.wait_time_phrase, "entre 45 et 60 minutes");
        assert!(context.is_accepting_orders);
    }
}
