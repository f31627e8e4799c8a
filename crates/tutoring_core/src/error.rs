//! crates/tutoring_core/src/error.rs
//!
//! Errors raised by the availability and booking engine.

use crate::ports::PortError;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed generation parameters. Nothing was persisted.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A well-formed request that produced no slot at all.
    #[error("No slots could be generated for the requested days and hours")]
    NoSlotsGenerated,

    /// The batch overlaps slots the expert already has. Nothing was persisted.
    #[error("Slots overlap existing availability: {0}")]
    ConstraintViolation(String),

    #[error("Slot {0} not found")]
    SlotNotFound(Uuid),

    #[error("Slot {0} is already booked")]
    SlotAlreadyBooked(Uuid),

    #[error("Expert {0} not found")]
    ExpertNotFound(Uuid),

    /// A fee whose derived amounts do not fit in an `i64`.
    #[error("Amount {0} is out of range")]
    AmountOutOfRange(i64),

    #[error("Persistence failure: {0}")]
    Persistence(String),
}

impl From<PortError> for EngineError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::Conflict(msg) => EngineError::ConstraintViolation(msg),
            other => EngineError::Persistence(other.to_string()),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
