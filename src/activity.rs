use std::collections::VecDeque;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::{ActivityAction, EntityType, User, UserActivity};

/// Maximum number of entries retained.
pub const ACTIVITY_LOG_CAPACITY: usize = 100;

/// Newest-first log of user actions, bounded to [`ACTIVITY_LOG_CAPACITY`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityLog {
    entries: VecDeque<UserActivity>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from stored entries, dropping anything beyond capacity.
    pub fn from_entries(entries: Vec<UserActivity>) -> Self {
        let mut entries = VecDeque::from(entries);
        entries.truncate(ACTIVITY_LOG_CAPACITY);
        Self { entries }
    }

    /// Record an action by `actor`, evicting the oldest entry when full.
    pub fn record(
        &mut self,
        actor: &User,
        action: ActivityAction,
        entity_type: EntityType,
        description: impl Into<String>,
        entity_id: Option<Uuid>,
    ) -> &UserActivity {
        self.push(UserActivity {
            id: Uuid::new_v4(),
            user_id: actor.id,
            username: actor.username.clone(),
            action,
            entity_type,
            entity_id,
            description: description.into(),
            timestamp: Utc::now(),
        })
    }

    pub fn push(&mut self, activity: UserActivity) -> &UserActivity {
        self.entries.push_front(activity);
        self.entries.truncate(ACTIVITY_LOG_CAPACITY);
        &self.entries[0]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &UserActivity> {
        self.entries.iter()
    }
}
