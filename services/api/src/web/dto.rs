//! services/api/src/web/dto.rs
//!
//! JSON request and response payloads. The core domain types carry no serde
//! derives, so everything that crosses the wire is mapped here.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tutoring_core::domain::{
    AvailabilitySlot, ExpertListing, ExpertProfile, StudentProfile, User, UserUpdate,
};
use tutoring_core::pricing::MAX_SESSION_FEE;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::web::tokens::TokenPair;

//=========================================================================================
// Shared
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub picture: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            picture: user.picture,
            phone: user.phone,
            role: user.role.as_str().to_string(),
            created_at: user.created_at,
        }
    }
}

//=========================================================================================
// Auth
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub confirm_password: String,
    /// `student` or `expert`.
    pub role: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct GoogleTokenRequest {
    /// The Google ID token obtained by the frontend.
    pub token: String,
    /// Role for first-time sign-ins; defaults to `student`.
    pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct GoogleLoginQuery {
    pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct GoogleCallbackQuery {
    pub code: String,
    /// Round-tripped through Google; carries the requested role.
    pub state: Option<String>,
    pub role: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: pair.expires_in,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    #[serde(flatten)]
    pub tokens: TokenResponse,
}

#[derive(Serialize, ToSchema)]
pub struct CurrentUserResponse {
    pub id: Uuid,
    pub role: String,
    pub full_name: String,
    pub email: String,
}

//=========================================================================================
// Slots and bookings
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct SlotResponse {
    pub id: Uuid,
    pub expert_id: Uuid,
    pub date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_booked: bool,
    pub student_id: Option<Uuid>,
}

impl From<AvailabilitySlot> for SlotResponse {
    fn from(slot: AvailabilitySlot) -> Self {
        Self {
            id: slot.id,
            expert_id: slot.expert_id,
            date: slot.date,
            start_time: slot.start_time,
            end_time: slot.end_time,
            is_booked: slot.is_booked,
            student_id: slot.student_id,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct SlotsResponse {
    pub slots: Vec<SlotResponse>,
}

impl From<Vec<AvailabilitySlot>> for SlotsResponse {
    fn from(slots: Vec<AvailabilitySlot>) -> Self {
        Self {
            slots: slots.into_iter().map(SlotResponse::from).collect(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct GenerateSlotsRequest {
    /// Weekday names, e.g. `["monday", "wed"]`.
    pub days: Vec<String>,
    /// `HH:MM`, UTC.
    pub start_time: String,
    /// `HH:MM`, UTC.
    pub end_time: String,
    /// Slot length in minutes.
    pub slot_size: i64,
    /// Any date inside the target week; defaults to the upcoming week.
    pub week_of: Option<NaiveDate>,
}

#[derive(Deserialize, ToSchema)]
pub struct SlotIdRequest {
    pub slot_id: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct BookSlotResponse {
    pub message: String,
    pub slot: SlotResponse,
}

#[derive(Serialize, ToSchema)]
pub struct PreviewExpert {
    pub id: Uuid,
    pub full_name: String,
    pub expertise: String,
    pub fee_per_session: i64,
}

#[derive(Serialize, ToSchema)]
pub struct PreviewResponse {
    pub expert: PreviewExpert,
    pub slot: SlotResponse,
    pub platform_fee: i64,
    pub total_amount: i64,
    pub currency: String,
}

//=========================================================================================
// Profiles
//=========================================================================================

/// Splits the user-row fields out of a profile update. Blank values are ignored,
/// except a blank name which is rejected.
fn user_update(
    full_name: Option<String>,
    phone: Option<String>,
    picture: Option<String>,
) -> ApiResult<UserUpdate> {
    let full_name = match full_name.map(|n| n.trim().to_string()) {
        Some(name) if name.is_empty() => {
            return Err(ApiError::Validation("full_name cannot be empty".to_string()))
        }
        other => other,
    };
    let non_blank = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    Ok(UserUpdate {
        full_name,
        phone: non_blank(phone),
        picture: non_blank(picture),
    })
}

#[derive(Serialize, ToSchema)]
pub struct StudentProfileResponse {
    pub user: UserResponse,
    pub bio: String,
    pub preparing_for: String,
    pub date_of_birth: Option<NaiveDate>,
    pub city: String,
    pub about_me: String,
    pub skills: Vec<String>,
    pub sessions: i32,
    pub points: i32,
}

impl StudentProfileResponse {
    pub fn new(user: User, profile: StudentProfile) -> Self {
        Self {
            user: user.into(),
            bio: profile.bio,
            preparing_for: profile.preparing_for,
            date_of_birth: profile.date_of_birth,
            city: profile.city,
            about_me: profile.about_me,
            skills: profile.skills,
            sessions: profile.sessions,
            points: profile.points,
        }
    }
}

/// Partial update; absent fields keep their stored value.
#[derive(Deserialize, ToSchema, Default)]
pub struct StudentProfileUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub picture: Option<String>,
    pub bio: Option<String>,
    pub preparing_for: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub city: Option<String>,
    pub about_me: Option<String>,
    pub skills: Option<Vec<String>>,
}

impl StudentProfileUpdate {
    /// Applies the profile fields to `profile` and returns the user-row part.
    pub fn apply(self, profile: &mut StudentProfile) -> ApiResult<UserUpdate> {
        let user = user_update(self.full_name, self.phone, self.picture)?;
        if let Some(v) = self.bio {
            profile.bio = v;
        }
        if let Some(v) = self.preparing_for {
            profile.preparing_for = v;
        }
        if self.date_of_birth.is_some() {
            profile.date_of_birth = self.date_of_birth;
        }
        if let Some(v) = self.city {
            profile.city = v;
        }
        if let Some(v) = self.about_me {
            profile.about_me = v;
        }
        if let Some(v) = self.skills {
            profile.skills = v;
        }
        Ok(user)
    }
}

#[derive(Serialize, ToSchema)]
pub struct ExpertProfileResponse {
    pub user: UserResponse,
    pub bio: String,
    pub expertise: String,
    pub specializations: Vec<String>,
    pub experience_years: i32,
    pub education: String,
    pub languages: Vec<String>,
    pub profile_picture_url: String,
    pub fee_per_session: i64,
    pub city: String,
    pub date_of_birth: Option<NaiveDate>,
    pub rating: f64,
    pub total_sessions: i32,
    pub verification_status: String,
    pub students_mentored: i64,
    pub is_available: bool,
}

impl ExpertProfileResponse {
    pub fn new(user: User, profile: ExpertProfile) -> Self {
        Self {
            user: user.into(),
            bio: profile.bio,
            expertise: profile.expertise,
            specializations: profile.specializations,
            experience_years: profile.experience_years,
            education: profile.education,
            languages: profile.languages,
            profile_picture_url: profile.profile_picture_url,
            fee_per_session: profile.fee_per_session,
            city: profile.city,
            date_of_birth: profile.date_of_birth,
            rating: profile.rating,
            total_sessions: profile.total_sessions,
            verification_status: profile.verification_status,
            students_mentored: profile.students_mentored,
            is_available: profile.is_available,
        }
    }
}

impl From<ExpertListing> for ExpertProfileResponse {
    fn from(listing: ExpertListing) -> Self {
        Self::new(listing.user, listing.profile)
    }
}

/// Partial update; absent fields keep their stored value.
#[derive(Deserialize, ToSchema, Default)]
pub struct ExpertProfileUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub picture: Option<String>,
    pub bio: Option<String>,
    pub expertise: Option<String>,
    pub specializations: Option<Vec<String>>,
    pub experience_years: Option<i32>,
    pub education: Option<String>,
    pub languages: Option<Vec<String>>,
    pub profile_picture_url: Option<String>,
    pub fee_per_session: Option<i64>,
    pub city: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub is_available: Option<bool>,
}

impl ExpertProfileUpdate {
    /// Applies the profile fields to `profile` and returns the user-row part.
    pub fn apply(self, profile: &mut ExpertProfile) -> ApiResult<UserUpdate> {
        if self.fee_per_session.is_some_and(|fee| fee < 0) {
            return Err(ApiError::Validation("fee_per_session cannot be negative".to_string()));
        }
        if self.fee_per_session.is_some_and(|fee| fee > MAX_SESSION_FEE) {
            return Err(ApiError::Validation(format!(
                "fee_per_session cannot exceed {}",
                MAX_SESSION_FEE
            )));
        }
        if self.experience_years.is_some_and(|years| years < 0) {
            return Err(ApiError::Validation("experience_years cannot be negative".to_string()));
        }
        let user = user_update(self.full_name, self.phone, self.picture)?;
        if let Some(v) = self.bio {
            profile.bio = v;
        }
        if let Some(v) = self.expertise {
            profile.expertise = v;
        }
        if let Some(v) = self.specializations {
            profile.specializations = v;
        }
        if let Some(v) = self.experience_years {
            profile.experience_years = v;
        }
        if let Some(v) = self.education {
            profile.education = v;
        }
        if let Some(v) = self.languages {
            profile.languages = v;
        }
        if let Some(v) = self.profile_picture_url {
            profile.profile_picture_url = v;
        }
        if let Some(v) = self.fee_per_session {
            profile.fee_per_session = v;
        }
        if let Some(v) = self.city {
            profile.city = v;
        }
        if self.date_of_birth.is_some() {
            profile.date_of_birth = self.date_of_birth;
        }
        if let Some(v) = self.is_available {
            profile.is_available = v;
        }
        Ok(user)
    }
}

#[derive(Serialize, ToSchema)]
pub struct ExpertsResponse {
    pub experts: Vec<ExpertProfileResponse>,
}

//=========================================================================================
// Payments
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct CreateOrderResponse {
    pub order_id: String,
    /// Minor currency units (paise).
    pub amount: i64,
    pub currency: String,
    pub razorpay_key: String,
    pub slot_id: Uuid,
}

#[derive(Deserialize, ToSchema)]
pub struct VerifyPaymentRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

#[derive(Serialize, ToSchema)]
pub struct VerifyPaymentResponse {
    pub message: String,
    pub order_id: String,
    pub payment_id: String,
    pub slot: SlotResponse,
}
