//! Error types
//!
//! Nothing in the simulation is fatal. `ActionError` covers player actions that
//! are rejected without changing state; the message is what the player sees.

/// A rejected player action (purchase, power-up, reward request, ...)
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error("Invalid upgrade")]
    InvalidChoice,

    #[error("Already purchased!")]
    AlreadyPurchased,

    #[error("Not enough credits!")]
    InsufficientCredits { cost: u64, available: u64 },

    #[error("{0} is already maxed")]
    UpgradeMaxed(&'static str),

    #[error("No charges remaining!")]
    NoCharges,

    #[error("Wait for {0} to finish!")]
    EffectActive(&'static str),

    #[error("Not available right now")]
    WrongPhase,

    #[error("Ad already in progress!")]
    RewardInProgress,

    #[error("Reward available again in {}s", .remaining_ms / 1000)]
    RewardOnCooldown { remaining_ms: u64 },

    #[error("No reward request with ticket {0}")]
    UnknownTicket(u64),

    #[error("Spin the wheel first")]
    WheelNotReady,

    #[error("Already doubled!")]
    AlreadyDoubled,
}

/// Invalid or unreadable tuning data
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Tuning JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid tuning value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Cooldown store load/save failures
#[derive(thiserror::Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cooldown store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}
