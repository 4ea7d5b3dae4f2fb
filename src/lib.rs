//! Adrenaline Assault - a side-scrolling arcade shooter core
//!
//! Core modules:
//! - `sim`: Simulation and game-phase engine (entities, combat, spawning, bosses, phases)
//! - `tuning`: Data-driven game balance
//! - `session`: Frame driver that bridges the simulation and the reward collaborator
//! - `persistence`: Reward cooldown timestamps (LocalStorage on web)
//! - `platform`: Browser/native platform abstraction (clock, logging)
//!
//! Rendering, raw input capture, asset loading and the ad/verification backend
//! live outside this crate. They talk to the core through `sim::TickInput`,
//! `sim::RenderSnapshot`, `sim::GameEvent` and `session::RewardGate`.

pub mod error;
pub mod persistence;
pub mod platform;
pub mod session;
pub mod sim;
pub mod tuning;

pub use error::{ActionError, ConfigError, PersistenceError};
pub use persistence::CooldownStore;
pub use session::{RewardGate, Session};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Nominal frame duration the per-frame speeds are tuned against (60 Hz)
    pub const NOMINAL_FRAME_MS: f64 = 16.67;
    /// Smallest frame delta accepted (guards against zero/negative clocks)
    pub const MIN_FRAME_MS: f64 = 1.0;
    /// Largest frame delta accepted (tab switches, debugger stalls)
    pub const MAX_FRAME_MS: f64 = 100.0;

    /// Vertical band the player may occupy (distance from top/bottom edge)
    pub const PLAYFIELD_MARGIN: f32 = 50.0;
    /// Bosses stay this far from the top/bottom edge
    pub const BOSS_MARGIN: f32 = 30.0;
    /// Entities this far behind the camera are culled
    pub const CULL_BEHIND: f32 = 200.0;
    /// Projectiles this far above/below the playfield are culled
    pub const CULL_VERTICAL: f32 = 100.0;

    /// Player defaults
    pub const PLAYER_START_X: f32 = 120.0;
    pub const PLAYER_START_Y: f32 = 200.0;
    pub const PLAYER_WIDTH: f32 = 96.0;
    pub const PLAYER_HEIGHT: f32 = 48.0;
    pub const PLAYER_SPEED: f32 = 8.0;
    pub const PLAYER_MAX_HEALTH: f32 = 200.0;
    pub const PLAYER_FIRE_RATE_MS: f64 = 180.0;
    pub const PLAYER_BULLET_DAMAGE: u32 = 10;
    pub const PLAYER_BULLET_SPEED: f32 = 16.0;
    pub const PLAYER_ANGLED_BULLET_SPEED: f32 = 14.0;

    /// Homing missile trail length
    pub const TRAIL_LENGTH: usize = 20;
}

/// Convert a frame delta in milliseconds into nominal-frame units
#[inline]
pub fn frame_delta(delta_ms: f64) -> f32 {
    (delta_ms / consts::NOMINAL_FRAME_MS) as f32
}
