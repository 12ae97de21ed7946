//! # Effect Error Types
//!
//! All errors that can occur while loading or dispatching spell effects.

use thiserror::Error;

/// Errors that can occur in the effect engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EffectError {
    /// No variant is registered under this name.
    #[error("unknown effect variant: {0}")]
    UnknownVariant(String),

    /// A registered factory failed to build its variant.
    #[error("failed to construct effect variant {name}: {reason}")]
    Construction {
        /// Registry name that was requested.
        name: String,
        /// What the factory reported.
        reason: String,
    },

    /// A config section or shorthand string could not be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An offset expression did not parse.
    #[error("invalid expression {input:?}: {reason}")]
    Expression {
        /// The expression text.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The scheduler gateway refused a task.
    #[error("scheduler rejected task: {0}")]
    Scheduler(String),

    /// The host dropped the receiving end of the effect channel.
    #[error("effect output channel disconnected")]
    OutputClosed,
}

/// Result type for effect operations.
pub type EffectResult<T> = Result<T, EffectError>;
