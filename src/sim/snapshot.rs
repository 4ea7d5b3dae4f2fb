//! Read-only view for the renderer
//!
//! Everything a host needs to draw a frame, flattened into plain serde
//! structs. Each entity carries a fallback colour for when its sprite is
//! missing.

use glam::Vec2;
use serde::Serialize;

use super::economy::{BattleSummary, Offer, WheelStage};
use super::effects::{EffectKind, PowerupKind};
use super::entities::{EnemyKind, MissileOwner, Rect};
use super::reward::RewardKind;
use super::state::{GamePhase, GameState, Overlay};
use crate::persistence::CooldownStore;
use crate::tuning::BossKind;

const PLAYER_COLOR: &str = "#00ffff";
const PLAYER_BULLET_COLOR: &str = "#ffff00";
const ENEMY_BULLET_COLOR: &str = "#ff4444";

#[derive(Debug, Clone, Serialize)]
pub struct EnemyView {
    pub kind: EnemyKind,
    pub rect: Rect,
    pub color: &'static str,
    /// Kamikaze pulse phase
    pub pulse: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct BossView {
    pub kind: BossKind,
    pub rect: Rect,
    pub health_fraction: f32,
    pub enraged: bool,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileView {
    pub rect: Rect,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct MissileView {
    pub rect: Rect,
    pub hostile: bool,
    pub trail: Vec<Vec2>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EffectView {
    pub kind: EffectKind,
    pub remaining_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InventoryView {
    pub kind: PowerupKind,
    pub slot: u8,
    pub charges: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShopView {
    pub offers: Vec<Offer>,
    pub costs: Vec<u64>,
    /// Reward-gated bonus still on offer
    pub bonus_available: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RewardCooldownView {
    pub kind: RewardKind,
    pub remaining_ms: f64,
}

/// One frame of drawable state
#[derive(Debug, Clone, Serialize)]
pub struct RenderSnapshot {
    pub phase: GamePhase,
    pub overlay: &'static str,
    pub camera_x: f32,
    pub player: Rect,
    pub player_color: &'static str,
    pub health: f32,
    pub max_health: f32,
    pub shield: f32,
    pub invulnerable: bool,
    pub score: u64,
    pub round: u32,
    pub difficulty: u32,
    pub countdown: Option<u32>,
    pub round_progress: f32,
    pub enemies: Vec<EnemyView>,
    pub boss: Option<BossView>,
    pub bullets: Vec<ProjectileView>,
    pub missiles: Vec<MissileView>,
    pub inventory: Vec<InventoryView>,
    pub effects: Vec<EffectView>,
    pub shop: Option<ShopView>,
    pub wheel: Option<(f32, WheelStage)>,
    pub summary: Option<BattleSummary>,
    pub failure_message: Option<String>,
    pub reward_pending: bool,
    pub reward_cooldowns: Vec<RewardCooldownView>,
}

impl RenderSnapshot {
    /// Capture the current frame. `now_ms` is wall-clock time for the
    /// persisted reward cooldowns.
    pub fn capture(state: &GameState, cooldowns: &CooldownStore, now_ms: f64) -> Self {
        let sim_ms = state.clock.sim_ms;
        let player = &state.player;

        let enemies = state
            .registry
            .enemies
            .iter()
            .map(|e| EnemyView {
                kind: e.kind,
                rect: e.rect,
                color: e.kind.template().color,
                pulse: e.pulse_time,
            })
            .collect();

        let boss = state.registry.boss.as_ref().map(|b| BossView {
            kind: b.kind,
            rect: b.rect,
            health_fraction: b.health_fraction(),
            enraged: b.enraged,
            color: b.color(),
        });

        let bullets = player
            .bullets
            .iter()
            .map(|b| ProjectileView {
                rect: b.rect,
                color: PLAYER_BULLET_COLOR,
            })
            .chain(state.registry.enemy_bullets.iter().map(|b| ProjectileView {
                rect: b.rect,
                color: ENEMY_BULLET_COLOR,
            }))
            .collect();

        let missiles = state
            .registry
            .missiles
            .iter()
            .map(|m| MissileView {
                rect: m.rect,
                hostile: m.owner == MissileOwner::Boss,
                trail: m.trail.clone(),
            })
            .collect();

        let inventory = PowerupKind::ALL
            .into_iter()
            .map(|kind| InventoryView {
                kind,
                slot: kind.slot(),
                charges: player.charges(kind),
            })
            .collect();

        let effects = player
            .effects
            .iter()
            .map(|e| EffectView {
                kind: e.kind,
                remaining_ms: (e.ends_at_ms - sim_ms).max(0.0),
            })
            .collect();

        let shop = match &state.overlay {
            Overlay::UpgradeShop(shop) => Some(ShopView {
                costs: shop.offers.iter().map(|o| o.upgrade.cost()).collect(),
                offers: shop.offers.clone(),
                bonus_available: shop.bonus().is_some(),
            }),
            _ => None,
        };
        let wheel = match &state.overlay {
            Overlay::RewardWheel(wheel) => Some((wheel.angle, wheel.stage)),
            _ => None,
        };
        let summary = match &state.overlay {
            Overlay::BattleSummary(summary) => Some(summary.clone()),
            _ => None,
        };

        let reward_cooldowns = [
            RewardKind::Revive,
            RewardKind::BonusCredits,
            RewardKind::SpecialPower,
            RewardKind::WheelDouble,
        ]
        .into_iter()
        .filter_map(|kind| {
            let context = state.reward_context(kind).ok()?;
            let key = CooldownStore::key(kind.as_str(), &context);
            Some(RewardCooldownView {
                kind,
                remaining_ms: cooldowns.remaining_ms(&key, state.reward_cooldown_ms(kind), now_ms),
            })
        })
        .collect();

        Self {
            phase: state.phase,
            overlay: state.overlay.name(),
            camera_x: state.camera_x,
            player: player.rect,
            player_color: PLAYER_COLOR,
            health: player.health,
            max_health: player.max_health,
            shield: player.shield,
            invulnerable: player.is_invulnerable(sim_ms),
            score: player.score,
            round: state.round,
            difficulty: state.difficulty_level(),
            countdown: (state.phase == GamePhase::Countdown).then_some(state.countdown.value),
            round_progress: (state.round_distance / state.tuning.round_length).clamp(0.0, 1.0),
            enemies,
            boss,
            bullets,
            missiles,
            inventory,
            effects,
            shop,
            wheel,
            summary,
            failure_message: state.failure_message.clone(),
            reward_pending: state.pending_reward.is_some(),
            reward_cooldowns,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::economy::{ShopOrigin, UpgradeShop};

    #[test]
    fn test_snapshot_of_fresh_session() {
        let state = GameState::new(1);
        let snap = RenderSnapshot::capture(&state, &CooldownStore::new(), 0.0);
        assert_eq!(snap.phase, GamePhase::Loading);
        assert_eq!(snap.overlay, "none");
        assert_eq!(snap.health, 200.0);
        assert_eq!(snap.inventory.len(), 4);
        assert!(snap.enemies.is_empty());
        assert!(snap.reward_cooldowns.is_empty());
        assert!(snap.to_json().is_ok());
    }

    #[test]
    fn test_snapshot_reports_shop_and_cooldown() {
        let mut state = GameState::new(1);
        state.phase = GamePhase::Playing;
        state.overlay = Overlay::UpgradeShop(UpgradeShop::open(
            ShopOrigin::Boss {
                kind: BossKind::Intermediate,
                index: 1,
            },
            &state.upgrades,
            &mut state.rng,
        ));
        let mut store = CooldownStore::new();
        store.record(&CooldownStore::key("bonus", "r1_b1"), 1_000.0);

        let snap = RenderSnapshot::capture(&state, &store, 2_000.0);
        let shop = snap.shop.unwrap();
        assert_eq!(shop.offers.len(), 4);
        assert_eq!(shop.costs[0], 500);
        assert!(shop.bonus_available);
        assert_eq!(snap.reward_cooldowns.len(), 1);
        assert_eq!(snap.reward_cooldowns[0].kind, RewardKind::BonusCredits);
        assert_eq!(
            snap.reward_cooldowns[0].remaining_ms,
            state.tuning.boss_reward_cooldown_ms - 1_000.0
        );
    }
}
