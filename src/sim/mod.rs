//! Simulation and game-phase engine
//!
//! All gameplay logic lives here:
//! - One explicit world (`GameState`) passed by reference to every component
//! - Simulation clock that only runs while nothing modal is open
//! - Seeded RNG owned by the world
//! - No rendering or platform dependencies

pub mod boss;
pub mod collision;
pub mod economy;
pub mod effects;
pub mod entities;
pub mod events;
pub mod input;
pub mod phase;
pub mod player;
pub mod registry;
pub mod reward;
pub mod schedule;
pub mod snapshot;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{CombatReport, DefeatedBoss, resolve_combat};
pub use economy::{BattleSummary, Rating, RewardWheel, SpecialPower, UpgradeId, UpgradeShop};
pub use effects::{EffectKind, PowerupKind};
pub use entities::{Boss, Bullet, Enemy, EnemyKind, EntityId, Missile, Rect};
pub use events::{EventLog, GameEvent};
pub use input::{Action, Command, InputSource, TickInput};
pub use player::Player;
pub use registry::Registry;
pub use reward::{RewardKind, RewardRequest, RewardVerdict};
pub use snapshot::RenderSnapshot;
pub use state::{GamePhase, GameState, Overlay};
pub use tick::tick;
