use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{AppStore, Collection};
use crate::{
    consumption::{self, MeterSummary},
    db::models::{ActivityAction, Category, EntityType, Meter, Reading, User},
    error::{StoreError, StoreResult},
};

/// Editable meter fields. All of them are required.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MeterInput {
    pub number: String,
    pub description: String,
    pub assignment: String,
    pub category: String,
}

impl MeterInput {
    fn validate(&self) -> StoreResult<()> {
        for (field, value) in [
            ("number", &self.number),
            ("description", &self.description),
            ("assignment", &self.assignment),
            ("category", &self.category),
        ] {
            if value.trim().is_empty() {
                return Err(StoreError::validation(format!("{field} is required")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReadingInput {
    pub date: DateTime<Utc>,
    pub value: f64,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CategoryInput {
    pub name: String,
    pub color: String,
    pub icon: String,
}

impl AppStore {
    pub async fn list_meters(&self) -> Vec<Meter> {
        self.inner.read().await.meters.clone()
    }

    pub async fn meter(&self, id: Uuid) -> StoreResult<Meter> {
        self.inner
            .read()
            .await
            .meters
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or(StoreError::not_found("meter"))
    }

    pub async fn meter_by_number(&self, number: &str) -> StoreResult<Meter> {
        self.inner
            .read()
            .await
            .meters
            .iter()
            .find(|m| m.number == number)
            .cloned()
            .ok_or(StoreError::not_found("meter"))
    }

    /// Meters whose category matches `category`, ignoring case.
    pub async fn meters_by_category(&self, category: &str) -> Vec<Meter> {
        let wanted = category.to_lowercase();
        self.inner
            .read()
            .await
            .meters
            .iter()
            .filter(|m| m.category.to_lowercase() == wanted)
            .cloned()
            .collect()
    }

    pub async fn meter_summary(&self) -> MeterSummary {
        consumption::summary(&self.inner.read().await.meters)
    }

    pub async fn create_meter(&self, actor: &User, input: MeterInput) -> StoreResult<Meter> {
        input.validate()?;
        let now = Utc::now();
        let meter = Meter {
            id: Uuid::new_v4(),
            number: input.number,
            description: input.description,
            assignment: input.assignment,
            category: input.category,
            created_at: now,
            created_by: actor.id,
            last_modified_by: actor.id,
            last_modified_at: now,
            readings: Vec::new(),
        };

        let mut state = self.inner.write().await;
        state.meters.push(meter.clone());
        state.activities.record(
            actor,
            ActivityAction::Create,
            EntityType::Meter,
            format!("Created meter {}", meter.number),
            Some(meter.id),
        );
        self.persist(&state, &[Collection::Meters, Collection::Activities])
            .await?;

        info!(meter_id = %meter.id, number = %meter.number, "Meter created");
        Ok(meter)
    }

    /// Replace the editable fields of a meter. Readings are left untouched.
    pub async fn update_meter(&self, actor: &User, id: Uuid, input: MeterInput) -> StoreResult<Meter> {
        input.validate()?;

        let mut state = self.inner.write().await;
        let meter = state
            .meters
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(StoreError::not_found("meter"))?;

        meter.number = input.number;
        meter.description = input.description;
        meter.assignment = input.assignment;
        meter.category = input.category;
        meter.last_modified_by = actor.id;
        meter.last_modified_at = Utc::now();
        let updated = meter.clone();

        state.activities.record(
            actor,
            ActivityAction::Update,
            EntityType::Meter,
            format!("Updated meter {}", updated.number),
            Some(id),
        );
        self.persist(&state, &[Collection::Meters, Collection::Activities])
            .await?;

        Ok(updated)
    }

    /// Append a reading to a meter.
    ///
    /// The value may not be lower than the last entered reading, since meters
    /// count up. The delta to that reading is stored as `difference`.
    pub async fn add_reading(&self, actor: &User, meter_id: Uuid, input: ReadingInput) -> StoreResult<Reading> {
        if !input.value.is_finite() {
            return Err(StoreError::validation("value must be a finite number"));
        }

        let mut state = self.inner.write().await;
        let meter = state
            .meters
            .iter_mut()
            .find(|m| m.id == meter_id)
            .ok_or(StoreError::not_found("meter"))?;

        if let Some(last) = meter.readings.last() {
            if input.value < last.value {
                return Err(StoreError::validation(format!(
                    "value {} is lower than the previous reading {}",
                    input.value, last.value
                )));
            }
        }

        let now = Utc::now();
        let reading = Reading {
            id: Uuid::new_v4(),
            date: input.date,
            value: input.value,
            remarks: input.remarks.filter(|r| !r.trim().is_empty()),
            difference: Some(consumption::calculate_difference(&meter.readings, input.value)),
            created_by: actor.id,
            created_at: now,
        };
        meter.readings.push(reading.clone());
        meter.last_modified_by = actor.id;
        meter.last_modified_at = now;
        let number = meter.number.clone();

        state.activities.record(
            actor,
            ActivityAction::Create,
            EntityType::Reading,
            format!("Added reading {} for meter {number}", reading.value),
            Some(reading.id),
        );
        self.persist(&state, &[Collection::Meters, Collection::Activities])
            .await?;

        info!(meter_id = %meter_id, value = reading.value, "Reading added");
        Ok(reading)
    }

    pub async fn delete_reading(&self, actor: &User, meter_id: Uuid, reading_id: Uuid) -> StoreResult<Reading> {
        let mut state = self.inner.write().await;
        let meter = state
            .meters
            .iter_mut()
            .find(|m| m.id == meter_id)
            .ok_or(StoreError::not_found("meter"))?;
        let index = meter
            .readings
            .iter()
            .position(|r| r.id == reading_id)
            .ok_or(StoreError::not_found("reading"))?;

        let removed = meter.readings.remove(index);
        meter.last_modified_by = actor.id;
        meter.last_modified_at = Utc::now();
        let number = meter.number.clone();

        state.activities.record(
            actor,
            ActivityAction::Delete,
            EntityType::Reading,
            format!("Deleted reading {} from meter {number}", removed.value),
            Some(reading_id),
        );
        self.persist(&state, &[Collection::Meters, Collection::Activities])
            .await?;

        Ok(removed)
    }

    pub async fn add_category(&self, input: CategoryInput) -> StoreResult<Category> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(StoreError::validation("name is required"));
        }

        let mut state = self.inner.write().await;
        if state
            .categories
            .iter()
            .any(|c| c.name.eq_ignore_ascii_case(name))
        {
            return Err(StoreError::conflict(format!("category {name:?} already exists")));
        }

        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            color: input.color,
            icon: input.icon,
        };
        state.categories.push(category.clone());
        self.persist(&state, &[Collection::Categories]).await?;

        Ok(category)
    }
}
