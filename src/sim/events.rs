//! Outgoing simulation events
//!
//! Collected during a tick and drained by the host for flash messages, HUD
//! counters, screen shake and sounds.

use std::collections::VecDeque;

use serde::Serialize;

use super::effects::EffectKind;
use super::entities::{EnemyKind, EntityId};
use super::reward::RewardKind;
use super::state::GamePhase;
use crate::tuning::BossKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    /// Transient on-screen message
    Flash { text: String, duration_ms: u32 },
    ScoreChanged { score: u64, gained: u64 },
    EnemyKilled { kind: EnemyKind, score: u64 },
    BossSpawned { kind: BossKind, index: u32 },
    BossEnraged { boss: EntityId },
    BossDefeated { kind: BossKind, index: u32, difficulty: u32 },
    PlayerDamaged { amount: f32, health: f32 },
    PhaseChanged { phase: GamePhase },
    CameraShake { intensity: f32, duration_ms: u32 },
    RoundStarted { round: u32 },
    EffectExpired { kind: EffectKind },
    RewardResolved { kind: RewardKind, granted: bool },
}

/// Undrained events kept before the oldest are dropped
pub const MAX_PENDING_EVENTS: usize = 4096;

/// Bounded outbox; hosts drain it every frame
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventLog {
    events: VecDeque<GameEvent>,
}

impl EventLog {
    pub fn push(&mut self, event: GameEvent) {
        if self.events.len() >= MAX_PENDING_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn flash(&mut self, text: impl Into<String>, duration_ms: u32) {
        self.push(GameEvent::Flash {
            text: text.into(),
            duration_ms,
        });
    }

    /// Take every pending event
    pub fn drain(&mut self) -> Vec<GameEvent> {
        self.events.drain(..).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
