//! crates/tutoring_core/src/memory.rs
//!
//! In-process implementations of the storage ports. They keep the same contracts as the
//! Postgres adapter (all-or-nothing batches, conditional booking, atomic profile updates)
//! by doing every operation under one lock, which makes them usable as test doubles.

use crate::domain::{
    AvailabilitySlot, BookingTransition, ExpertListing, ExpertProfile, NewUser, Payment,
    PaymentStatus, Role, StudentProfile, User, UserCredentials, UserUpdate,
};
use crate::ports::{
    AccountRepository, PaymentRepository, PortError, PortResult, SlotRepository,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

fn sort_by_date_then_start(slots: &mut [AvailabilitySlot]) {
    slots.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));
}

//=========================================================================================
// Slots
//=========================================================================================

#[derive(Default)]
pub struct InMemorySlotRepository {
    slots: Mutex<HashMap<Uuid, AvailabilitySlot>>,
}

impl InMemorySlotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn filtered<F>(&self, keep: F) -> Vec<AvailabilitySlot>
    where
        F: Fn(&AvailabilitySlot) -> bool,
    {
        let slots = self.slots.lock().await;
        let mut matching: Vec<AvailabilitySlot> =
            slots.values().filter(|s| keep(s)).cloned().collect();
        sort_by_date_then_start(&mut matching);
        matching
    }
}

#[async_trait]
impl SlotRepository for InMemorySlotRepository {
    async fn insert_batch(&self, batch: &[AvailabilitySlot]) -> PortResult<Vec<AvailabilitySlot>> {
        let mut slots = self.slots.lock().await;

        for (i, candidate) in batch.iter().enumerate() {
            if slots.contains_key(&candidate.id) {
                return Err(PortError::Conflict(format!("slot {} already exists", candidate.id)));
            }
            let clashes_stored = slots
                .values()
                .any(|s| s.expert_id == candidate.expert_id && s.overlaps(candidate));
            let clashes_batch = batch[..i]
                .iter()
                .any(|s| s.expert_id == candidate.expert_id && s.overlaps(candidate));
            if clashes_stored || clashes_batch {
                return Err(PortError::Conflict(format!(
                    "slot starting {} overlaps existing availability",
                    candidate.start_time
                )));
            }
        }

        for slot in batch {
            slots.insert(slot.id, slot.clone());
        }
        Ok(batch.to_vec())
    }

    async fn get_by_id(&self, slot_id: Uuid) -> PortResult<AvailabilitySlot> {
        self.slots
            .lock()
            .await
            .get(&slot_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Slot {} not found", slot_id)))
    }

    async fn list_available(
        &self,
        expert_id: Uuid,
        from: DateTime<Utc>,
    ) -> PortResult<Vec<AvailabilitySlot>> {
        Ok(self
            .filtered(|s| s.expert_id == expert_id && !s.is_booked && s.start_time >= from)
            .await)
    }

    async fn list_booked_for_expert(
        &self,
        expert_id: Uuid,
        from: DateTime<Utc>,
    ) -> PortResult<Vec<AvailabilitySlot>> {
        Ok(self
            .filtered(|s| s.expert_id == expert_id && s.is_booked && s.start_time >= from)
            .await)
    }

    async fn list_booked_for_student(
        &self,
        student_id: Uuid,
        from: DateTime<Utc>,
    ) -> PortResult<Vec<AvailabilitySlot>> {
        Ok(self
            .filtered(|s| s.student_id == Some(student_id) && s.is_booked && s.start_time >= from)
            .await)
    }

    async fn try_mark_booked(
        &self,
        slot_id: Uuid,
        student_id: Uuid,
    ) -> PortResult<BookingTransition> {
        let mut slots = self.slots.lock().await;
        let Some(slot) = slots.get_mut(&slot_id) else {
            return Ok(BookingTransition::NotFound);
        };
        if slot.is_booked {
            return Ok(BookingTransition::AlreadyBooked);
        }
        slot.is_booked = true;
        slot.student_id = Some(student_id);
        Ok(BookingTransition::Booked(slot.clone()))
    }
}

//=========================================================================================
// Accounts
//=========================================================================================

#[derive(Default)]
struct AccountState {
    users: HashMap<Uuid, UserCredentials>,
    students: HashMap<Uuid, StudentProfile>,
    experts: HashMap<Uuid, ExpertProfile>,
    revoked: HashMap<String, DateTime<Utc>>,
}

impl AccountState {
    fn apply_user_update(&mut self, user_id: Uuid, update: UserUpdate) -> PortResult<()> {
        if let Some(phone) = update.phone.as_deref() {
            let taken = self
                .users
                .values()
                .any(|c| c.user.id != user_id && c.user.phone.as_deref() == Some(phone));
            if taken {
                return Err(PortError::Conflict("phone number already in use".to_string()));
            }
        }
        let creds = self
            .users
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        if let Some(full_name) = update.full_name {
            creds.user.full_name = full_name;
        }
        if let Some(phone) = update.phone {
            creds.user.phone = Some(phone);
        }
        if let Some(picture) = update.picture {
            creds.user.picture = Some(picture);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryAccountRepository {
    state: Mutex<AccountState>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let mut state = self.state.lock().await;
        let email_taken = state
            .users
            .values()
            .any(|c| c.user.email.eq_ignore_ascii_case(&new_user.email));
        if email_taken {
            return Err(PortError::Conflict("email already registered".to_string()));
        }
        if let Some(phone) = new_user.phone.as_deref() {
            if state.users.values().any(|c| c.user.phone.as_deref() == Some(phone)) {
                return Err(PortError::Conflict("phone number already in use".to_string()));
            }
        }

        let user = User {
            id: Uuid::new_v4(),
            full_name: new_user.full_name,
            email: new_user.email,
            picture: new_user.picture,
            phone: new_user.phone,
            role: new_user.role,
            created_at: Utc::now(),
        };
        match user.role {
            Role::Student => {
                state.students.insert(
                    user.id,
                    StudentProfile {
                        user_id: user.id,
                        ..StudentProfile::default()
                    },
                );
            }
            Role::Expert => {
                state.experts.insert(user.id, ExpertProfile::empty(user.id));
            }
            Role::Admin => {}
        }
        state.users.insert(
            user.id,
            UserCredentials {
                user: user.clone(),
                hashed_password: new_user.hashed_password,
            },
        );
        Ok(user)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        self.state
            .lock()
            .await
            .users
            .get(&user_id)
            .map(|c| c.user.clone())
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.state
            .lock()
            .await
            .users
            .values()
            .find(|c| c.user.email.eq_ignore_ascii_case(email))
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn get_student_profile(&self, user_id: Uuid) -> PortResult<StudentProfile> {
        self.state
            .lock()
            .await
            .students
            .get(&user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Student {} not found", user_id)))
    }

    async fn update_student_profile(
        &self,
        user_id: Uuid,
        user_update: UserUpdate,
        profile: StudentProfile,
    ) -> PortResult<()> {
        let mut state = self.state.lock().await;
        if !state.students.contains_key(&user_id) {
            return Err(PortError::NotFound(format!("Student {} not found", user_id)));
        }
        state.apply_user_update(user_id, user_update)?;
        state.students.insert(user_id, StudentProfile { user_id, ..profile });
        Ok(())
    }

    async fn get_expert_profile(&self, user_id: Uuid) -> PortResult<ExpertProfile> {
        self.state
            .lock()
            .await
            .experts
            .get(&user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Expert {} not found", user_id)))
    }

    async fn update_expert_profile(
        &self,
        user_id: Uuid,
        user_update: UserUpdate,
        profile: ExpertProfile,
    ) -> PortResult<()> {
        let mut state = self.state.lock().await;
        if !state.experts.contains_key(&user_id) {
            return Err(PortError::NotFound(format!("Expert {} not found", user_id)));
        }
        state.apply_user_update(user_id, user_update)?;
        state.experts.insert(user_id, ExpertProfile { user_id, ..profile });
        Ok(())
    }

    async fn list_experts(&self) -> PortResult<Vec<ExpertListing>> {
        let state = self.state.lock().await;
        let mut listings: Vec<ExpertListing> = state
            .experts
            .values()
            .filter_map(|profile| {
                state.users.get(&profile.user_id).map(|c| ExpertListing {
                    user: c.user.clone(),
                    profile: profile.clone(),
                })
            })
            .collect();
        listings.sort_by(|a, b| a.user.created_at.cmp(&b.user.created_at));
        Ok(listings)
    }

    async fn revoke_token(&self, token_id: &str, expires_at: DateTime<Utc>) -> PortResult<bool> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        state.revoked.retain(|_, expiry| *expiry >= now);
        if state.revoked.contains_key(token_id) {
            return Ok(false);
        }
        state.revoked.insert(token_id.to_string(), expires_at);
        Ok(true)
    }

    async fn is_token_revoked(&self, token_id: &str) -> PortResult<bool> {
        Ok(self.state.lock().await.revoked.contains_key(token_id))
    }
}

//=========================================================================================
// Payments
//=========================================================================================

#[derive(Default)]
pub struct InMemoryPaymentRepository {
    payments: Mutex<HashMap<String, Payment>>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn create_payment(&self, payment: &Payment) -> PortResult<()> {
        let mut payments = self.payments.lock().await;
        if payments.contains_key(&payment.order_id) {
            return Err(PortError::Conflict(format!("order {} already recorded", payment.order_id)));
        }
        payments.insert(payment.order_id.clone(), payment.clone());
        Ok(())
    }

    async fn get_by_order_id(&self, order_id: &str) -> PortResult<Payment> {
        self.payments
            .lock()
            .await
            .get(order_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Order {} not found", order_id)))
    }

    async fn mark_paid(
        &self,
        order_id: &str,
        payment_id: &str,
        paid_at: DateTime<Utc>,
    ) -> PortResult<Payment> {
        let mut payments = self.payments.lock().await;
        let payment = payments
            .get_mut(order_id)
            .ok_or_else(|| PortError::NotFound(format!("Order {} not found", order_id)))?;
        if payment.status != PaymentStatus::Created {
            return Err(PortError::Conflict(format!(
                "order {} is already {}",
                order_id,
                payment.status.as_str()
            )));
        }
        payment.status = PaymentStatus::Paid;
        payment.payment_id = Some(payment_id.to_string());
        payment.paid_at = Some(paid_at);
        Ok(payment.clone())
    }

    async fn mark_failed(&self, order_id: &str) -> PortResult<()> {
        let mut payments = self.payments.lock().await;
        let payment = payments
            .get_mut(order_id)
            .ok_or_else(|| PortError::NotFound(format!("Order {} not found", order_id)))?;
        if payment.status == PaymentStatus::Created {
            payment.status = PaymentStatus::Failed;
        }
        Ok(())
    }
}
