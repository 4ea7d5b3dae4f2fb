//! Game state and phase types
//!
//! `GameState` is the whole world: player, entity registry, timers, phase and
//! modal overlay. Every component takes it (or a part of it) by reference.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::DefeatedBoss;
use super::economy::{BattleSummary, RewardWheel, UpgradeLevels, UpgradeShop};
use super::events::EventLog;
use super::player::Player;
use super::registry::Registry;
use super::reward::RewardRequest;
use super::schedule::Schedule;
use super::spawn::SpawnDirector;
use crate::consts::*;
use crate::tuning::Tuning;

/// Top-level phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the host to finish loading assets
    Loading,
    Title,
    /// 3-2-1 before play starts
    Countdown,
    Playing,
    GameOver,
}

/// Modal layer on top of `Playing`; at most one is shown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Overlay {
    None,
    Paused,
    UpgradeShop(UpgradeShop),
    RewardWheel(RewardWheel),
    BattleSummary(BattleSummary),
}

impl Overlay {
    #[inline]
    pub fn is_open(&self) -> bool {
        !matches!(self, Overlay::None)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Overlay::None => "none",
            Overlay::Paused => "paused",
            Overlay::UpgradeShop(_) => "upgrade shop",
            Overlay::RewardWheel(_) => "reward wheel",
            Overlay::BattleSummary(_) => "battle summary",
        }
    }
}

/// Wall-clock countdown before play
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Countdown {
    pub value: u32,
    pub step_started_ms: f64,
}

/// Frame timing. `sim_ms` only advances on frames where the world simulates.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct FrameClock {
    last_wall_ms: Option<f64>,
    /// Wall-clock time of the current frame
    pub wall_ms: f64,
    /// Simulation time (cooldowns, effects, deferred events)
    pub sim_ms: f64,
    /// Clamped frame duration
    pub delta_ms: f64,
    /// Frame duration in nominal-frame units
    pub delta: f32,
}

impl FrameClock {
    /// Start a frame at wall-clock `now_ms`
    pub fn begin_frame(&mut self, now_ms: f64) {
        self.delta_ms = match self.last_wall_ms {
            Some(last) => (now_ms - last).clamp(MIN_FRAME_MS, MAX_FRAME_MS),
            None => NOMINAL_FRAME_MS,
        };
        self.delta = crate::frame_delta(self.delta_ms);
        self.last_wall_ms = Some(now_ms);
        self.wall_ms = now_ms;
    }

    /// Advance the simulation clock by this frame's delta
    pub fn advance_sim(&mut self) {
        self.sim_ms += self.delta_ms;
    }
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState {
    pub tuning: Tuning,
    /// Run seed
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: GamePhase,
    pub overlay: Overlay,
    /// Outstanding reward verification; blocks simulation while set
    pub pending_reward: Option<RewardRequest>,
    /// Reason of the last denied reward, shown until dismissed
    pub failure_message: Option<String>,
    pub countdown: Countdown,
    pub clock: FrameClock,
    /// Camera left edge in world coordinates
    pub camera_x: f32,
    /// Scroll distance within the current round
    pub round_distance: f32,
    /// 1-based round number
    pub round: u32,
    /// Simulation time the round started
    pub round_started_ms: f64,
    /// Difficulty counter
    pub bosses_defeated: u32,
    /// Boss killed in the same tick the player died; its shop or summary opens on revive
    pub unclaimed_boss: Option<DefeatedBoss>,
    pub player: Player,
    pub upgrades: UpgradeLevels,
    pub registry: Registry,
    pub schedule: Schedule,
    pub spawner: SpawnDirector,
    pub events: EventLog,
    /// Last pointer position reported by the host
    pub pointer: Option<Vec2>,
    next_ticket: u64,
}

impl GameState {
    /// Create a new session with default tuning
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        let spawner = SpawnDirector::new(tuning.boss_triggers.len());
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Loading,
            overlay: Overlay::None,
            pending_reward: None,
            failure_message: None,
            countdown: Countdown::default(),
            clock: FrameClock::default(),
            camera_x: 0.0,
            round_distance: 0.0,
            round: 1,
            round_started_ms: 0.0,
            bosses_defeated: 0,
            unclaimed_boss: None,
            player: Player::new(),
            upgrades: UpgradeLevels::default(),
            registry: Registry::new(),
            schedule: Schedule::new(),
            spawner,
            events: EventLog::default(),
            pointer: None,
            next_ticket: 1,
            tuning,
        }
    }

    /// Difficulty level shown to the player
    #[inline]
    pub fn difficulty_level(&self) -> u32 {
        1 + self.bosses_defeated
    }

    /// The single gate for advancing entities, spawns, effects and cooldowns
    pub fn should_simulate(&self) -> bool {
        self.phase == GamePhase::Playing && !self.overlay.is_open() && self.pending_reward.is_none()
    }

    /// Allocate a reward ticket
    pub(crate) fn next_ticket(&mut self) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        ticket
    }

    /// Discard the run: fresh player, registry, timers and counters.
    /// Tuning, seed stream and the event outbox survive.
    pub fn reset_session(&mut self) {
        self.overlay = Overlay::None;
        self.pending_reward = None;
        self.failure_message = None;
        self.camera_x = 0.0;
        self.round_distance = 0.0;
        self.round = 1;
        self.round_started_ms = self.clock.sim_ms;
        self.bosses_defeated = 0;
        self.unclaimed_boss = None;
        self.player = Player::new();
        self.upgrades = UpgradeLevels::default();
        self.registry.reset();
        self.schedule.clear();
        self.spawner = SpawnDirector::new(self.tuning.boss_triggers.len());
        log::debug!("Session reset");
    }
}
