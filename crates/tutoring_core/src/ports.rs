//! crates/tutoring_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use crate::domain::{
    AvailabilitySlot, BookingTransition, ExpertListing, ExpertProfile, GatewayOrder,
    GoogleIdentity, NewUser, Payment, StudentProfile, User, UserCredentials, UserUpdate,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Storage Ports
//=========================================================================================

#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Persists every slot or none. Fails with `Conflict` when any slot overlaps
    /// a stored slot of the same expert.
    async fn insert_batch(&self, slots: &[AvailabilitySlot]) -> PortResult<Vec<AvailabilitySlot>>;

    async fn get_by_id(&self, slot_id: Uuid) -> PortResult<AvailabilitySlot>;

    /// Unbooked slots starting at or after `from`, ordered by date then start time.
    async fn list_available(
        &self,
        expert_id: Uuid,
        from: DateTime<Utc>,
    ) -> PortResult<Vec<AvailabilitySlot>>;

    async fn list_booked_for_expert(
        &self,
        expert_id: Uuid,
        from: DateTime<Utc>,
    ) -> PortResult<Vec<AvailabilitySlot>>;

    async fn list_booked_for_student(
        &self,
        student_id: Uuid,
        from: DateTime<Utc>,
    ) -> PortResult<Vec<AvailabilitySlot>>;

    /// The single conditional write: flips `is_booked` only if it is still false.
    async fn try_mark_booked(&self, slot_id: Uuid, student_id: Uuid)
        -> PortResult<BookingTransition>;
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    // --- Users ---
    /// Creates the user and its empty role profile in one transaction.
    async fn create_user(&self, new_user: NewUser) -> PortResult<User>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    // --- Profiles ---
    async fn get_student_profile(&self, user_id: Uuid) -> PortResult<StudentProfile>;

    /// Updates the user row and the student row atomically.
    async fn update_student_profile(
        &self,
        user_id: Uuid,
        user_update: UserUpdate,
        profile: StudentProfile,
    ) -> PortResult<()>;

    async fn get_expert_profile(&self, user_id: Uuid) -> PortResult<ExpertProfile>;

    /// Updates the user row and the expert row atomically.
    async fn update_expert_profile(
        &self,
        user_id: Uuid,
        user_update: UserUpdate,
        profile: ExpertProfile,
    ) -> PortResult<()>;

    async fn list_experts(&self) -> PortResult<Vec<ExpertListing>>;

    // --- Token revocation ---
    /// Records `token_id` as revoked until `expires_at`. Returns `false` when it
    /// already was, so callers can treat the first revocation as a single use.
    async fn revoke_token(&self, token_id: &str, expires_at: DateTime<Utc>) -> PortResult<bool>;

    async fn is_token_revoked(&self, token_id: &str) -> PortResult<bool>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create_payment(&self, payment: &Payment) -> PortResult<()>;

    async fn get_by_order_id(&self, order_id: &str) -> PortResult<Payment>;

    /// Marks a `created` payment as paid. `Conflict` when it already left `created`.
    async fn mark_paid(
        &self,
        order_id: &str,
        payment_id: &str,
        paid_at: DateTime<Utc>,
    ) -> PortResult<Payment>;

    async fn mark_failed(&self, order_id: &str) -> PortResult<()>;
}

//=========================================================================================
// External Service Ports
//=========================================================================================

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The consent-screen URL the browser is redirected to.
    fn authorization_url(&self, state: &str) -> String;

    /// Verifies a Google ID token issued to this application.
    async fn verify_id_token(&self, id_token: &str) -> PortResult<GoogleIdentity>;

    /// Exchanges an authorization code and reads the user's profile.
    async fn exchange_code(&self, code: &str) -> PortResult<GoogleIdentity>;
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// The publishable key the frontend checkout needs.
    fn public_key(&self) -> String;

    /// Creates an order for `amount` minor units.
    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
        notes: &[(String, String)],
    ) -> PortResult<GatewayOrder>;

    /// Checks the signature the checkout widget returns after payment.
    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool;
}
