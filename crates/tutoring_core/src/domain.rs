//! crates/tutoring_core/src/domain.rs
//!
//! Defines the pure, core data structures for the marketplace.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Accounts
//=========================================================================================

/// The role a user signed up with. It decides which profile row belongs to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Student,
    Expert,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Expert => "expert",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "expert" => Ok(Role::Expert),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Represents a user - used throughout the app.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub picture: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

// Only used internally for signin - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    /// `None` for accounts created through Google sign-in.
    pub hashed_password: Option<String>,
}

/// Everything needed to create a user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub picture: Option<String>,
    pub phone: Option<String>,
    pub hashed_password: Option<String>,
    pub role: Role,
}

/// The user-row fields a profile update may touch.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentProfile {
    pub user_id: Uuid,
    pub bio: String,
    pub preparing_for: String,
    pub date_of_birth: Option<NaiveDate>,
    pub city: String,
    pub about_me: String,
    pub skills: Vec<String>,
    pub sessions: i32,
    pub points: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpertProfile {
    pub user_id: Uuid,
    pub bio: String,
    pub expertise: String,
    pub specializations: Vec<String>,
    pub experience_years: i32,
    pub education: String,
    pub languages: Vec<String>,
    pub profile_picture_url: String,
    /// Whole currency units charged per session.
    pub fee_per_session: i64,
    pub city: String,
    pub date_of_birth: Option<NaiveDate>,
    pub rating: f64,
    pub total_sessions: i32,
    pub verification_status: String,
    pub students_mentored: i64,
    pub is_available: bool,
}

impl ExpertProfile {
    /// A freshly registered expert: nothing filled in, pending verification.
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            bio: String::new(),
            expertise: String::new(),
            specializations: Vec::new(),
            experience_years: 0,
            education: String::new(),
            languages: Vec::new(),
            profile_picture_url: String::new(),
            fee_per_session: 0,
            city: String::new(),
            date_of_birth: None,
            rating: 0.0,
            total_sessions: 0,
            verification_status: "pending".to_string(),
            students_mentored: 0,
            is_available: true,
        }
    }
}

/// An expert profile joined with the owning user's public fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpertListing {
    pub user: User,
    pub profile: ExpertProfile,
}

//=========================================================================================
// Availability
//=========================================================================================

/// A fixed-duration, dated window during which an expert can be booked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilitySlot {
    pub id: Uuid,
    pub expert_id: Uuid,
    pub date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_booked: bool,
    pub student_id: Option<Uuid>,
}

impl AvailabilitySlot {
    /// Half-open interval overlap: `[a.start, a.end)` against `[b.start, b.end)`.
    pub fn overlaps(&self, other: &AvailabilitySlot) -> bool {
        self.start_time < other.end_time && other.start_time < self.end_time
    }
}

/// Parameters of a weekly recurrence rule. Only used to drive generation.
#[derive(Debug, Clone)]
pub struct WeeklyAvailabilityRequest {
    pub expert_id: Uuid,
    pub days: Vec<String>,
    pub daily_start: String,
    pub daily_end: String,
    pub slot_size_minutes: i64,
}

/// Outcome of the conditional "mark booked" write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingTransition {
    Booked(AvailabilitySlot),
    AlreadyBooked,
    NotFound,
}

/// What a student sees before paying for a slot.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingPreview {
    pub expert_id: Uuid,
    pub expertise: String,
    pub fee_per_session: i64,
    pub slot: AvailabilitySlot,
    pub platform_fee: i64,
    pub total_amount: i64,
}

//=========================================================================================
// Payments
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Created,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Created => "created",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(PaymentStatus::Created),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(format!("unknown payment status '{}'", other)),
        }
    }
}

/// A payment order tracked against a slot. Amounts are in minor units (paise).
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: String,
    pub payment_id: Option<String>,
    pub status: PaymentStatus,
    pub student_id: Uuid,
    pub expert_id: Uuid,
    pub slot_id: Uuid,
    pub amount: i64,
    pub platform_fee: i64,
    pub expert_share: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// The order a payment gateway hands back.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayOrder {
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
}

//=========================================================================================
// Third-party identity
//=========================================================================================

/// A verified identity returned by Google.
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleIdentity {
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub email_verified: bool,
}
