//! Kernel error taxonomy.
//!
//! Every failure is recoverable: the caller's stores are never touched
//! when an operation returns `Err`.

use crate::domain::{Beer, TankId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// A sales row could not be ingested. Carries the row as read.
    #[error("malformed sales row {line} [{row}]: {reason}")]
    MalformedInput {
        line: usize,
        row: String,
        reason: String,
    },

    #[error("tank transition rejected: {0}")]
    ValidationRejected(Rejection),

    #[error(
        "removing {requested} bottles of {beer} would leave a negative quantity \
         ({available} in stock)"
    )]
    NegativeQuantity {
        beer: Beer,
        requested: u64,
        available: u64,
    },

    #[error("unknown {kind} {value:?}")]
    UnknownName { kind: &'static str, value: String },

    #[error("arithmetic overflow: {0}")]
    Overflow(String),
}

/// Why a tank transition was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("volume {volume} L exceeds tank {tank} capacity of {capacity} L")]
    VolumeExceedsCapacity {
        tank: TankId,
        volume: u32,
        capacity: u32,
    },

    #[error("tank R can only be used for fermenting")]
    FermentOnly,

    #[error("tank {0} can only be used for conditioning")]
    ConditionOnly(TankId),

    #[error("tank {0} is not part of the fleet")]
    UnknownTank(TankId),

    #[error("{0}")]
    Invariant(String),
}

impl From<Rejection> for EngineError {
    fn from(r: Rejection) -> Self {
        EngineError::ValidationRejected(r)
    }
}
