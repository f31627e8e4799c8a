pub mod availability;
pub mod booking;
pub mod domain;
pub mod error;
pub mod memory;
pub mod ports;
pub mod pricing;
pub mod slots;

pub use availability::AvailabilityService;
pub use booking::BookingCoordinator;
pub use domain::{
    AvailabilitySlot, BookingPreview, BookingTransition, ExpertListing, ExpertProfile,
    GatewayOrder, GoogleIdentity, NewUser, Payment, PaymentStatus, Role, StudentProfile, User,
    UserCredentials, UserUpdate, WeeklyAvailabilityRequest,
};
pub use error::{EngineError, EngineResult};
pub use ports::{
    AccountRepository, IdentityProvider, PaymentGateway, PaymentRepository, PortError,
    PortResult, SlotRepository,
};
pub use pricing::PlatformFee;
