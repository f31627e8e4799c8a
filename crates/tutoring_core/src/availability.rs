//! crates/tutoring_core/src/availability.rs
//!
//! Publishes generated weeks into the slot repository and reads them back.

use crate::domain::{AvailabilitySlot, WeeklyAvailabilityRequest};
use crate::error::EngineResult;
use crate::ports::SlotRepository;
use crate::slots::{generate_weekly_slots, week_start_on_or_after};
use chrono::{DateTime, NaiveDate, Utc, Weekday};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub struct AvailabilityService {
    slots: Arc<dyn SlotRepository>,
    week_start: Weekday,
}

impl AvailabilityService {
    pub fn new(slots: Arc<dyn SlotRepository>, week_start: Weekday) -> Self {
        Self { slots, week_start }
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    /// The week a generation request lands in when the caller names none:
    /// the week starting on the next week-start day (today, if today is one).
    pub fn upcoming_week(&self, today: NaiveDate) -> NaiveDate {
        week_start_on_or_after(today, self.week_start)
    }

    /// Generates the week containing `week_anchor` and stores it in one batch.
    pub async fn publish_week(
        &self,
        request: &WeeklyAvailabilityRequest,
        week_anchor: NaiveDate,
    ) -> EngineResult<Vec<AvailabilitySlot>> {
        let generated = generate_weekly_slots(request, week_anchor, self.week_start)?;
        let stored = self.slots.insert_batch(&generated).await?;
        info!(
            expert_id = %request.expert_id,
            count = stored.len(),
            "Published weekly availability"
        );
        Ok(stored)
    }

    pub async fn available_for_expert(
        &self,
        expert_id: Uuid,
        from: DateTime<Utc>,
    ) -> EngineResult<Vec<AvailabilitySlot>> {
        Ok(self.slots.list_available(expert_id, from).await?)
    }

    pub async fn booked_for_expert(
        &self,
        expert_id: Uuid,
        from: DateTime<Utc>,
    ) -> EngineResult<Vec<AvailabilitySlot>> {
        Ok(self.slots.list_booked_for_expert(expert_id, from).await?)
    }

    pub async fn booked_for_student(
        &self,
        student_id: Uuid,
        from: DateTime<Utc>,
    ) -> EngineResult<Vec<AvailabilitySlot>> {
        Ok(self.slots.list_booked_for_student(student_id, from).await?)
    }
}
