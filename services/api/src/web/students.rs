//! services/api/src/web/students.rs
//!
//! Student-only endpoints: profile, browsing experts and their slots,
//! previewing and booking a slot, and listing own bookings.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::web::dto::{
    BookSlotResponse, ExpertProfileResponse, ExpertsResponse, PreviewExpert, PreviewResponse,
    SlotIdRequest, SlotsResponse, StudentProfileResponse, StudentProfileUpdate,
};
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;

/// GET /student/profile
#[utoipa::path(
    get,
    path = "/student/profile",
    operation_id = "get_student_profile",
    responses(
        (status = 200, description = "The student's profile", body = StudentProfileResponse),
        (status = 403, description = "Caller is not a student")
    ),
    security(("bearer" = [])),
    tag = "student"
)]
pub async fn get_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<StudentProfileResponse>> {
    let user = state.accounts.get_user_by_id(auth.user_id).await?;
    let profile = state.accounts.get_student_profile(auth.user_id).await?;
    Ok(Json(StudentProfileResponse::new(user, profile)))
}

/// PUT /student/profile
#[utoipa::path(
    put,
    path = "/student/profile",
    operation_id = "update_student_profile",
    request_body = StudentProfileUpdate,
    responses(
        (status = 200, description = "Updated profile", body = StudentProfileResponse),
        (status = 400, description = "Invalid field values"),
        (status = 409, description = "Phone number already in use")
    ),
    security(("bearer" = [])),
    tag = "student"
)]
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<StudentProfileUpdate>,
) -> ApiResult<Json<StudentProfileResponse>> {
    let mut profile = state.accounts.get_student_profile(auth.user_id).await?;
    let user_update = req.apply(&mut profile)?;

    state
        .accounts
        .update_student_profile(auth.user_id, user_update, profile)
        .await?;

    let user = state.accounts.get_user_by_id(auth.user_id).await?;
    let profile = state.accounts.get_student_profile(auth.user_id).await?;
    Ok(Json(StudentProfileResponse::new(user, profile)))
}

/// GET /student/experts - All experts with their profiles
#[utoipa::path(
    get,
    path = "/student/experts",
    responses((status = 200, description = "Experts", body = ExpertsResponse)),
    security(("bearer" = [])),
    tag = "student"
)]
pub async fn list_experts_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ExpertsResponse>> {
    let experts = state.accounts.list_experts().await?;
    Ok(Json(ExpertsResponse {
        experts: experts.into_iter().map(ExpertProfileResponse::from).collect(),
    }))
}

/// GET /student/expert/{id}/slots - An expert's upcoming unbooked slots
#[utoipa::path(
    get,
    path = "/student/expert/{id}/slots",
    params(("id" = Uuid, Path, description = "The expert's user id")),
    responses(
        (status = 200, description = "Available slots", body = SlotsResponse),
        (status = 404, description = "Unknown expert")
    ),
    security(("bearer" = [])),
    tag = "student"
)]
pub async fn expert_slots_handler(
    State(state): State<Arc<AppState>>,
    Path(expert_id): Path<Uuid>,
) -> ApiResult<Json<SlotsResponse>> {
    // 404 for unknown experts instead of an empty list.
    state.accounts.get_expert_profile(expert_id).await?;
    let slots = state
        .availability
        .available_for_expert(expert_id, Utc::now())
        .await?;
    Ok(Json(slots.into()))
}

/// POST /student/preview-slot - Price a slot before paying
#[utoipa::path(
    post,
    path = "/student/preview-slot",
    request_body = SlotIdRequest,
    responses(
        (status = 200, description = "Fee breakdown", body = PreviewResponse),
        (status = 404, description = "Unknown slot"),
        (status = 409, description = "Slot already booked")
    ),
    security(("bearer" = [])),
    tag = "student"
)]
pub async fn preview_slot_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SlotIdRequest>,
) -> ApiResult<Json<PreviewResponse>> {
    let preview = state.booking.preview_booking(req.slot_id).await?;
    let expert = state.accounts.get_user_by_id(preview.expert_id).await?;

    Ok(Json(PreviewResponse {
        expert: PreviewExpert {
            id: expert.id,
            full_name: expert.full_name,
            expertise: preview.expertise,
            fee_per_session: preview.fee_per_session,
        },
        slot: preview.slot.into(),
        platform_fee: preview.platform_fee,
        total_amount: preview.total_amount,
        currency: state.config.currency.clone(),
    }))
}

/// POST /student/book-slot - Book a slot directly
#[utoipa::path(
    post,
    path = "/student/book-slot",
    request_body = SlotIdRequest,
    responses(
        (status = 200, description = "Slot booked", body = BookSlotResponse),
        (status = 404, description = "Unknown slot"),
        (status = 409, description = "Slot already booked")
    ),
    security(("bearer" = [])),
    tag = "student"
)]
pub async fn book_slot_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<SlotIdRequest>,
) -> ApiResult<Json<BookSlotResponse>> {
    let slot = state.booking.book_slot(req.slot_id, auth.user_id).await?;
    Ok(Json(BookSlotResponse {
        message: "Slot booked successfully".to_string(),
        slot: slot.into(),
    }))
}

/// GET /student/bookings - The student's upcoming sessions
#[utoipa::path(
    get,
    path = "/student/bookings",
    operation_id = "list_student_bookings",
    responses((status = 200, description = "Booked sessions", body = SlotsResponse)),
    security(("bearer" = [])),
    tag = "student"
)]
pub async fn bookings_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<SlotsResponse>> {
    let slots = state
        .availability
        .booked_for_student(auth.user_id, Utc::now())
        .await?;
    Ok(Json(slots.into()))
}
