//! services/api/src/web/experts.rs
//!
//! Expert-only endpoints: profile, weekly slot generation, own slots and bookings.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use chrono::Utc;
use std::sync::Arc;
use tutoring_core::domain::WeeklyAvailabilityRequest;

use crate::error::ApiResult;
use crate::web::dto::{
    ExpertProfileResponse, ExpertProfileUpdate, GenerateSlotsRequest, SlotsResponse,
};
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;

/// GET /expert/profile
#[utoipa::path(
    get,
    path = "/expert/profile",
    operation_id = "get_expert_profile",
    responses(
        (status = 200, description = "The expert's profile", body = ExpertProfileResponse),
        (status = 403, description = "Caller is not an expert")
    ),
    security(("bearer" = [])),
    tag = "expert"
)]
pub async fn get_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ExpertProfileResponse>> {
    let user = state.accounts.get_user_by_id(auth.user_id).await?;
    let profile = state.accounts.get_expert_profile(auth.user_id).await?;
    Ok(Json(ExpertProfileResponse::new(user, profile)))
}

/// PUT /expert/profile
#[utoipa::path(
    put,
    path = "/expert/profile",
    operation_id = "update_expert_profile",
    request_body = ExpertProfileUpdate,
    responses(
        (status = 200, description = "Updated profile", body = ExpertProfileResponse),
        (status = 400, description = "Invalid field values"),
        (status = 409, description = "Phone number already in use")
    ),
    security(("bearer" = [])),
    tag = "expert"
)]
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<ExpertProfileUpdate>,
) -> ApiResult<Json<ExpertProfileResponse>> {
    let mut profile = state.accounts.get_expert_profile(auth.user_id).await?;
    let user_update = req.apply(&mut profile)?;

    state
        .accounts
        .update_expert_profile(auth.user_id, user_update, profile)
        .await?;

    let user = state.accounts.get_user_by_id(auth.user_id).await?;
    let profile = state.accounts.get_expert_profile(auth.user_id).await?;
    Ok(Json(ExpertProfileResponse::new(user, profile)))
}

/// POST /expert/generate-slots
///
/// Publishes one week of slots from a weekly recurrence rule. Without
/// `week_of` the upcoming week is used.
#[utoipa::path(
    post,
    path = "/expert/generate-slots",
    request_body = GenerateSlotsRequest,
    responses(
        (status = 201, description = "Slots created", body = SlotsResponse),
        (status = 400, description = "Invalid rule or no slot fits the window"),
        (status = 409, description = "Slots overlap existing availability")
    ),
    security(("bearer" = [])),
    tag = "expert"
)]
pub async fn generate_slots_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<GenerateSlotsRequest>,
) -> ApiResult<impl IntoResponse> {
    let week_anchor = req
        .week_of
        .unwrap_or_else(|| state.availability.upcoming_week(Utc::now().date_naive()));

    let rule = WeeklyAvailabilityRequest {
        expert_id: auth.user_id,
        days: req.days,
        daily_start: req.start_time,
        daily_end: req.end_time,
        slot_size_minutes: req.slot_size,
    };

    let slots = state.availability.publish_week(&rule, week_anchor).await?;
    Ok((StatusCode::CREATED, Json(SlotsResponse::from(slots))))
}

/// GET /expert/my-slots - Upcoming unbooked slots
#[utoipa::path(
    get,
    path = "/expert/my-slots",
    responses((status = 200, description = "Available slots", body = SlotsResponse)),
    security(("bearer" = [])),
    tag = "expert"
)]
pub async fn my_slots_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<SlotsResponse>> {
    let slots = state
        .availability
        .available_for_expert(auth.user_id, Utc::now())
        .await?;
    Ok(Json(slots.into()))
}

/// GET /expert/bookings - Upcoming booked sessions
#[utoipa::path(
    get,
    path = "/expert/bookings",
    operation_id = "list_expert_bookings",
    responses((status = 200, description = "Booked sessions", body = SlotsResponse)),
    security(("bearer" = [])),
    tag = "expert"
)]
pub async fn bookings_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<SlotsResponse>> {
    let slots = state
        .availability
        .booked_for_expert(auth.user_id, Utc::now())
        .await?;
    Ok(Json(slots.into()))
}
