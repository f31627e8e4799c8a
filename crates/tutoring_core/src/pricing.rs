//! crates/tutoring_core/src/pricing.rs
//!
//! Platform fee arithmetic. Amounts are whole currency units unless noted.
//! Every operation is checked; an amount that cannot be represented is an
//! `EngineError::AmountOutOfRange`, never a wrapped value.

use crate::error::{EngineError, EngineResult};

/// Highest session fee an expert may charge, in whole currency units.
pub const MAX_SESSION_FEE: i64 = 10_000_000;

/// The platform's cut, charged on top of the expert's session fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformFee {
    percent: i64,
}

impl PlatformFee {
    pub const DEFAULT_PERCENT: u32 = 10;

    pub fn new(percent: u32) -> Self {
        Self {
            percent: percent as i64,
        }
    }

    pub fn percent(&self) -> u32 {
        self.percent as u32
    }

    /// `round(percent / 100 * fee_per_session)`, halves rounded up.
    pub fn fee_for(&self, fee_per_session: i64) -> EngineResult<i64> {
        fee_per_session
            .max(0)
            .checked_mul(self.percent)
            .and_then(|scaled| scaled.checked_add(50))
            .map(|scaled| scaled / 100)
            .ok_or(EngineError::AmountOutOfRange(fee_per_session))
    }

    pub fn total_for(&self, fee_per_session: i64) -> EngineResult<i64> {
        fee_per_session
            .checked_add(self.fee_for(fee_per_session)?)
            .ok_or(EngineError::AmountOutOfRange(fee_per_session))
    }
}

impl Default for PlatformFee {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PERCENT)
    }
}

/// Converts whole currency units to the minor units payment gateways expect.
pub fn to_minor_units(amount: i64) -> EngineResult<i64> {
    amount
        .checked_mul(100)
        .ok_or(EngineError::AmountOutOfRange(amount))
}
