//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::web::tokens::TokenService;
use std::sync::Arc;
use tutoring_core::ports::{
    AccountRepository, IdentityProvider, PaymentGateway, PaymentRepository, SlotRepository,
};
use tutoring_core::{AvailabilityService, BookingCoordinator};

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub accounts: Arc<dyn AccountRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub availability: AvailabilityService,
    pub booking: BookingCoordinator,
    pub identity: Arc<dyn IdentityProvider>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub tokens: TokenService,
}

impl AppState {
    /// Wires the core services on top of the given adapters.
    pub fn new(
        config: Arc<Config>,
        slots: Arc<dyn SlotRepository>,
        accounts: Arc<dyn AccountRepository>,
        payments: Arc<dyn PaymentRepository>,
        identity: Arc<dyn IdentityProvider>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let availability = AvailabilityService::new(slots.clone(), config.week_start);
        let booking = BookingCoordinator::new(slots, accounts.clone(), config.platform_fee());
        let tokens = TokenService::new(
            &config.jwt_secret,
            config.access_token_ttl_minutes,
            config.refresh_token_ttl_days,
        );
        Self {
            config,
            accounts,
            payments,
            availability,
            booking,
            identity,
            gateway,
            tokens,
        }
    }
}
