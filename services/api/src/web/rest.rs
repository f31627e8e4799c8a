//! services/api/src/web/rest.rs
//!
//! The liveness handler and the master definition for the OpenAPI specification.

use axum::Json;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::web::dto::*;
use crate::web::{auth, experts, payments, students};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::register_handler,
        auth::signin_handler,
        auth::google_token_handler,
        auth::google_redirect_handler,
        auth::google_callback_handler,
        auth::refresh_handler,
        auth::logout_handler,
        auth::current_user_handler,
        experts::get_profile_handler,
        experts::update_profile_handler,
        experts::generate_slots_handler,
        experts::my_slots_handler,
        experts::bookings_handler,
        students::get_profile_handler,
        students::update_profile_handler,
        students::list_experts_handler,
        students::expert_slots_handler,
        students::preview_slot_handler,
        students::book_slot_handler,
        students::bookings_handler,
        payments::create_order_handler,
        payments::verify_payment_handler,
    ),
    components(
        schemas(
            HealthResponse, MessageResponse, UserResponse,
            RegisterRequest, SigninRequest, GoogleTokenRequest, RefreshRequest,
            TokenResponse, AuthResponse, CurrentUserResponse,
            SlotResponse, SlotsResponse, GenerateSlotsRequest, SlotIdRequest,
            BookSlotResponse, PreviewExpert, PreviewResponse,
            StudentProfileResponse, StudentProfileUpdate,
            ExpertProfileResponse, ExpertProfileUpdate, ExpertsResponse,
            CreateOrderResponse, VerifyPaymentRequest, VerifyPaymentResponse
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Accounts and tokens."),
        (name = "expert", description = "Expert profile and availability."),
        (name = "student", description = "Browsing experts and booking slots."),
        (name = "payments", description = "Paid bookings through the payment gateway.")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /health - Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
