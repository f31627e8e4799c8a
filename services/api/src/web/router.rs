//! services/api/src/web/router.rs
//!
//! Assembles the full application router: public auth routes, bearer-protected
//! role groups, CORS, request tracing and the Swagger UI.

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::web::middleware::{require_auth, require_expert, require_student};
use crate::web::rest::{health_handler, ApiDoc};
use crate::web::state::AppState;
use crate::web::{auth, experts, payments, students};

fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = match origin.parse::<HeaderValue>() {
        Ok(value) => AllowOrigin::exact(value),
        Err(_) => {
            warn!("CORS_ORIGIN '{}' is not a valid header value; allowing any origin", origin);
            AllowOrigin::any()
        }
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT])
}

pub fn build_router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/signin", post(auth::signin_handler))
        .route(
            "/auth/google/login",
            post(auth::google_token_handler).get(auth::google_redirect_handler),
        )
        .route("/auth/google/callback", get(auth::google_callback_handler))
        .route("/auth/refresh", post(auth::refresh_handler));

    // Any authenticated role
    let session_routes = Router::new()
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/user", get(auth::current_user_handler));

    let expert_routes = Router::new()
        .route(
            "/expert/profile",
            get(experts::get_profile_handler).put(experts::update_profile_handler),
        )
        .route("/expert/generate-slots", post(experts::generate_slots_handler))
        .route("/expert/my-slots", get(experts::my_slots_handler))
        .route("/expert/bookings", get(experts::bookings_handler))
        .route_layer(axum_middleware::from_fn(require_expert));

    let student_routes = Router::new()
        .route(
            "/student/profile",
            get(students::get_profile_handler).put(students::update_profile_handler),
        )
        .route("/student/experts", get(students::list_experts_handler))
        .route("/student/expert/{id}/slots", get(students::expert_slots_handler))
        .route("/student/preview-slot", post(students::preview_slot_handler))
        .route("/student/book-slot", post(students::book_slot_handler))
        .route("/student/bookings", get(students::bookings_handler))
        .route("/student/create-order", post(payments::create_order_handler))
        .route("/student/verify-payment", post(payments::verify_payment_handler))
        .route_layer(axum_middleware::from_fn(require_student));

    // Protected routes (auth required); the role layers run inside `require_auth`.
    let protected_routes = Router::new()
        .merge(session_routes)
        .merge(expert_routes)
        .merge(student_routes)
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state.clone());

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors_layer(&app_state.config.cors_origin))
        .layer(TraceLayer::new_for_http())
}
