//! Simulation error types
//!
//! Only programming/configuration mistakes surface as errors. Transient
//! conditions (exhausted spawn pools, unreadable leaderboard storage) degrade
//! silently with a log line instead.

use std::fmt;

use crate::sim::{EntityId, UpgradeId};

#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// `commit` was called while no upgrade selection is open.
    NoSelectionOpen,
    /// The chosen upgrade is not among the offered cards.
    ChoiceNotOffered { id: UpgradeId },
    /// An upgrade identifier string did not match any catalog entry.
    UnknownUpgrade { name: String },
    /// A collision report referenced an entity that is no longer alive.
    UnknownEntity { id: EntityId },
    /// A tuning value is outside its safe operating range.
    InvalidTuning {
        name: &'static str,
        value: f32,
        safe_range: &'static str,
    },
    /// Tuning JSON could not be parsed.
    TuningParse { message: String },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::NoSelectionOpen => write!(f, "no upgrade selection is open"),
            SimError::ChoiceNotOffered { id } => {
                write!(f, "upgrade '{}' was not offered", id.as_str())
            }
            SimError::UnknownUpgrade { name } => write!(f, "unknown upgrade '{}'", name),
            SimError::UnknownEntity { id } => write!(f, "entity {} not found", id),
            SimError::InvalidTuning {
                name,
                value,
                safe_range,
            } => write!(
                f,
                "tuning '{}' = {} is outside safe range {}",
                name, value, safe_range
            ),
            SimError::TuningParse { message } => write!(f, "tuning parse error: {}", message),
        }
    }
}

impl std::error::Error for SimError {}

/// Convenience alias: a `Result` using `SimError` as the error type.
pub type SimResult<T> = Result<T, SimError>;
