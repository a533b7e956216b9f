//! Central application state, mirrored to key-value storage.
//!
//! Every collection lives in memory behind one `RwLock`. A mutation takes the
//! write lock, applies the change, and writes the touched collections back
//! to [`KvStore`] before releasing it, so there is a single writer and
//! storage is updated in the same order as memory.

mod meters;
mod reminders;
mod users;

pub use meters::{CategoryInput, MeterInput, ReadingInput};
pub use reminders::{DueNotification, ReminderInput};
pub use users::{NewUser, UserUpdate};

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::{
    activity::ActivityLog,
    db::{
        kv::{keys, KvStore},
        models::{default_categories, Category, Meter, Reminder, Settings, User, UserActivity},
    },
    error::StoreResult,
};

#[derive(Debug, Default)]
struct State {
    meters: Vec<Meter>,
    categories: Vec<Category>,
    settings: Settings,
    users: Vec<User>,
    reminders: Vec<Reminder>,
    activities: ActivityLog,
}

/// The persisted entity collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Collection {
    Meters,
    Categories,
    Settings,
    Users,
    Reminders,
    Activities,
}

/// Shared handle to the application state. Clones share the same state.
#[derive(Debug, Clone)]
pub struct AppStore {
    inner: Arc<RwLock<State>>,
    kv: KvStore,
}

impl AppStore {
    /// Load every collection from `kv`.
    ///
    /// Missing or unreadable collections start empty, except categories,
    /// which start with the default set.
    pub async fn load(kv: KvStore) -> Self {
        let state = State {
            meters: kv.load(keys::METERS).await.unwrap_or_default(),
            categories: kv
                .load(keys::CATEGORIES)
                .await
                .unwrap_or_else(default_categories),
            settings: kv.load(keys::SETTINGS).await.unwrap_or_default(),
            users: kv.load(keys::USERS).await.unwrap_or_default(),
            reminders: kv.load(keys::REMINDERS).await.unwrap_or_default(),
            activities: ActivityLog::from_entries(
                kv.load(keys::ACTIVITIES).await.unwrap_or_default(),
            ),
        };

        info!(
            meters = state.meters.len(),
            users = state.users.len(),
            reminders = state.reminders.len(),
            "State loaded"
        );

        Self {
            inner: Arc::new(RwLock::new(state)),
            kv,
        }
    }

    /// A store over a fresh in-memory backend.
    pub async fn in_memory() -> Self {
        Self::load(KvStore::memory()).await
    }

    // -----------------------------------------------------------------------
    // Categories, settings, activities
    // -----------------------------------------------------------------------

    pub async fn categories(&self) -> Vec<Category> {
        self.inner.read().await.categories.clone()
    }

    pub async fn settings(&self) -> Settings {
        self.inner.read().await.settings.clone()
    }

    pub async fn update_settings(&self, settings: Settings) -> StoreResult<Settings> {
        let mut state = self.inner.write().await;
        state.settings = settings;
        self.persist(&state, &[Collection::Settings]).await?;
        Ok(state.settings.clone())
    }

    /// Activity entries, newest first, at most `limit` of them.
    pub async fn activities(&self, limit: Option<usize>) -> Vec<UserActivity> {
        let state = self.inner.read().await;
        state
            .activities
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    async fn persist(&self, state: &State, collections: &[Collection]) -> StoreResult<()> {
        for collection in collections {
            match collection {
                Collection::Meters => self.kv.save(keys::METERS, &state.meters).await?,
                Collection::Categories => self.kv.save(keys::CATEGORIES, &state.categories).await?,
                Collection::Settings => self.kv.save(keys::SETTINGS, &state.settings).await?,
                Collection::Users => self.kv.save(keys::USERS, &state.users).await?,
                Collection::Reminders => self.kv.save(keys::REMINDERS, &state.reminders).await?,
                Collection::Activities => self.kv.save(keys::ACTIVITIES, &state.activities).await?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use uuid::Uuid;

    use crate::db::models::{Role, User};

    /// A user value for acting on the store without going through bcrypt.
    pub fn actor(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            username: "tester".to_owned(),
            email: "tester@example.com".to_owned(),
            password_hash: String::new(),
            role,
            is_default: false,
            created_at: Utc::now(),
            last_login: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use sqlx::SqlitePool;

    use super::*;
    use crate::db::models::NotificationSettings;

    #[tokio::test]
    async fn fresh_store_has_default_categories_only() {
        let store = AppStore::in_memory().await;
        assert_eq!(store.categories().await.len(), 6);
        assert!(store.list_meters().await.is_empty());
        assert!(store.list_users().await.is_empty());
        assert!(store.activities(None).await.is_empty());
        assert_eq!(store.settings().await, Settings::default());
    }

    #[tokio::test]
    async fn corrupt_collections_fall_back_to_defaults() {
        let kv = KvStore::memory();
        kv.put(keys::METERS, "oops").await.unwrap();
        kv.put(keys::CATEGORIES, "[1,2,3]").await.unwrap();

        let store = AppStore::load(kv).await;
        assert!(store.list_meters().await.is_empty());
        assert_eq!(store.categories().await.len(), 6);
    }

    #[tokio::test]
    async fn settings_update_is_persisted() {
        let kv = KvStore::memory();
        let store = AppStore::load(kv.clone()).await;
        let settings = Settings {
            notifications: NotificationSettings {
                enabled: false,
                sound: true,
                desktop: false,
            },
        };
        store.update_settings(settings.clone()).await.unwrap();

        let reloaded = AppStore::load(kv).await;
        assert_eq!(reloaded.settings().await, settings);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn state_survives_reload_from_sqlite(pool: SqlitePool) {
        let store = AppStore::load(KvStore::sqlite(pool.clone())).await;
        let actor = test_support::actor(crate::db::models::Role::Admin);
        let meter = store
            .create_meter(
                &actor,
                MeterInput {
                    number: "4711".to_owned(),
                    description: "Basement".to_owned(),
                    assignment: "Flat 1".to_owned(),
                    category: "Water".to_owned(),
                },
            )
            .await
            .unwrap();

        let reloaded = AppStore::load(KvStore::sqlite(pool)).await;
        let meters = reloaded.list_meters().await;
        assert_eq!(meters.len(), 1);
        assert_eq!(meters[0].id, meter.id);
        assert_eq!(reloaded.activities(None).await.len(), 1);
    }
}
