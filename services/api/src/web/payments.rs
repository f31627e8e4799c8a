//! services/api/src/web/payments.rs
//!
//! Paid booking flow: create a gateway order for a slot, then verify the
//! checkout signature and book the slot for the paying student.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use tutoring_core::domain::{Payment, PaymentStatus};
use tutoring_core::pricing::to_minor_units;
use tutoring_core::PortError;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::web::dto::{CreateOrderResponse, SlotIdRequest, VerifyPaymentRequest, VerifyPaymentResponse};
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;

/// POST /student/create-order
#[utoipa::path(
    post,
    path = "/student/create-order",
    request_body = SlotIdRequest,
    responses(
        (status = 201, description = "Order created", body = CreateOrderResponse),
        (status = 404, description = "Unknown slot"),
        (status = 409, description = "Slot already booked"),
        (status = 502, description = "Payment gateway failed")
    ),
    security(("bearer" = [])),
    tag = "payments"
)]
pub async fn create_order_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<SlotIdRequest>,
) -> ApiResult<impl IntoResponse> {
    // Same checks as a preview: booked or missing slots fail before any order exists.
    let preview = state.booking.preview_booking(req.slot_id).await?;

    let amount = to_minor_units(preview.total_amount)?;
    let platform_fee = to_minor_units(preview.platform_fee)?;
    let expert_share = to_minor_units(preview.fee_per_session)?;
    let currency = state.config.currency.clone();
    let receipt = format!("receipt_slot_{}", req.slot_id);
    let notes = vec![
        ("slot_id".to_string(), req.slot_id.to_string()),
        ("expert_id".to_string(), preview.expert_id.to_string()),
        ("student_id".to_string(), auth.user_id.to_string()),
    ];

    let order = state
        .gateway
        .create_order(amount, &currency, &receipt, &notes)
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;

    let payment = Payment {
        id: Uuid::new_v4(),
        order_id: order.order_id.clone(),
        payment_id: None,
        status: PaymentStatus::Created,
        student_id: auth.user_id,
        expert_id: preview.expert_id,
        slot_id: req.slot_id,
        amount: order.amount,
        platform_fee,
        expert_share,
        currency: order.currency.clone(),
        created_at: Utc::now(),
        paid_at: None,
    };
    state.payments.create_payment(&payment).await?;
    info!(order_id = %order.order_id, slot_id = %req.slot_id, "Payment order created");

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            order_id: order.order_id,
            amount: order.amount,
            currency: order.currency,
            razorpay_key: state.gateway.public_key(),
            slot_id: req.slot_id,
        }),
    ))
}

/// POST /student/verify-payment
#[utoipa::path(
    post,
    path = "/student/verify-payment",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Payment verified and slot booked", body = VerifyPaymentResponse),
        (status = 400, description = "Signature mismatch"),
        (status = 404, description = "Unknown order"),
        (status = 409, description = "Order already settled or slot already booked")
    ),
    security(("bearer" = [])),
    tag = "payments"
)]
pub async fn verify_payment_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<VerifyPaymentRequest>,
) -> ApiResult<Json<VerifyPaymentResponse>> {
    let payment = state
        .payments
        .get_by_order_id(&req.order_id)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => ApiError::NotFound("Order not found".to_string()),
            other => other.into(),
        })?;

    if payment.student_id != auth.user_id {
        return Err(ApiError::Forbidden("Order belongs to another student".to_string()));
    }

    if !state
        .gateway
        .verify_signature(&req.order_id, &req.payment_id, &req.signature)
    {
        warn!(order_id = %req.order_id, "Payment signature mismatch");
        state.payments.mark_failed(&req.order_id).await?;
        return Err(ApiError::Validation("Invalid payment signature".to_string()));
    }

    state
        .payments
        .mark_paid(&req.order_id, &req.payment_id, Utc::now())
        .await?;

    let slot = state.booking.book_slot(payment.slot_id, auth.user_id).await?;
    info!(order_id = %req.order_id, slot_id = %slot.id, "Payment verified");

    Ok(Json(VerifyPaymentResponse {
        message: "Payment verified and slot booked".to_string(),
        order_id: req.order_id,
        payment_id: req.payment_id,
        slot: slot.into(),
    }))
}
