//! crates/tutoring_core/src/booking.rs
//!
//! The booking coordinator: fee preview and the exactly-once booking of a slot.
//! It never writes slot state itself; the only mutation goes through
//! `SlotRepository::try_mark_booked`.

use crate::domain::{AvailabilitySlot, BookingPreview, BookingTransition};
use crate::error::{EngineError, EngineResult};
use crate::ports::{AccountRepository, PortError, SlotRepository};
use crate::pricing::PlatformFee;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct BookingCoordinator {
    slots: Arc<dyn SlotRepository>,
    accounts: Arc<dyn AccountRepository>,
    fee: PlatformFee,
}

impl BookingCoordinator {
    pub fn new(
        slots: Arc<dyn SlotRepository>,
        accounts: Arc<dyn AccountRepository>,
        fee: PlatformFee,
    ) -> Self {
        Self {
            slots,
            accounts,
            fee,
        }
    }

    pub fn platform_fee(&self) -> PlatformFee {
        self.fee
    }

    async fn load_slot(&self, slot_id: Uuid) -> EngineResult<AvailabilitySlot> {
        match self.slots.get_by_id(slot_id).await {
            Ok(slot) => Ok(slot),
            Err(PortError::NotFound(_)) => Err(EngineError::SlotNotFound(slot_id)),
            Err(e) => Err(EngineError::Persistence(e.to_string())),
        }
    }

    /// Prices an unbooked slot. Booked slots are rejected before any fee is computed.
    pub async fn preview_booking(&self, slot_id: Uuid) -> EngineResult<BookingPreview> {
        let slot = self.load_slot(slot_id).await?;
        if slot.is_booked {
            return Err(EngineError::SlotAlreadyBooked(slot_id));
        }

        let expert = match self.accounts.get_expert_profile(slot.expert_id).await {
            Ok(expert) => expert,
            Err(PortError::NotFound(_)) => return Err(EngineError::ExpertNotFound(slot.expert_id)),
            Err(e) => return Err(EngineError::Persistence(e.to_string())),
        };

        let platform_fee = self.fee.fee_for(expert.fee_per_session)?;
        let total_amount = self.fee.total_for(expert.fee_per_session)?;
        Ok(BookingPreview {
            expert_id: expert.user_id,
            expertise: expert.expertise,
            fee_per_session: expert.fee_per_session,
            slot,
            platform_fee,
            total_amount,
        })
    }

    /// Books `slot_id` for `student_id`.
    ///
    /// The read-then-check is only a fast path; the conditional write decides the race.
    pub async fn book_slot(&self, slot_id: Uuid, student_id: Uuid) -> EngineResult<AvailabilitySlot> {
        let slot = self.load_slot(slot_id).await?;
        if slot.is_booked {
            return Err(EngineError::SlotAlreadyBooked(slot_id));
        }

        match self.slots.try_mark_booked(slot_id, student_id).await? {
            BookingTransition::Booked(slot) => {
                info!(slot_id = %slot_id, student_id = %student_id, "Slot booked");
                Ok(slot)
            }
            BookingTransition::AlreadyBooked => {
                debug!(slot_id = %slot_id, "Lost booking race");
                Err(EngineError::SlotAlreadyBooked(slot_id))
            }
            BookingTransition::NotFound => Err(EngineError::SlotNotFound(slot_id)),
        }
    }
}
