//! Spawn & difficulty director
//!
//! Regular enemies arrive on an interval that shrinks with the difficulty
//! counter; bosses arrive when the round's scroll distance crosses each
//! trigger. Both are suppressed while a boss is on screen.

use rand::Rng;
use serde::Serialize;

use super::entities::{BossSpec, EnemyKind, EnemySpec};
use super::events::GameEvent;
use super::schedule::Deferred;
use super::state::GameState;
use crate::tuning::Tuning;

/// Delay before the follow-up enemy of a double spawn
const FOLLOW_UP_DELAY_MS: f64 = 200.0;

/// Spawn timers and the boss triggers already used this round
#[derive(Debug, Clone, Serialize)]
pub struct SpawnDirector {
    last_spawn_ms: Option<f64>,
    triggers_fired: Vec<bool>,
}

impl SpawnDirector {
    pub fn new(trigger_count: usize) -> Self {
        Self {
            last_spawn_ms: None,
            triggers_fired: vec![false; trigger_count],
        }
    }

    /// Re-arm every boss trigger for a new round
    pub fn reset_round(&mut self, trigger_count: usize) {
        self.triggers_fired = vec![false; trigger_count];
    }

    pub fn trigger_fired(&self, index: usize) -> bool {
        self.triggers_fired.get(index).copied().unwrap_or(false)
    }
}

/// Interval between spawns: base × max(0.5, 1 − 0.1·d)
pub fn spawn_interval_ms(tuning: &Tuning, bosses_defeated: u32) -> f64 {
    let factor = (1.0 - f64::from(bosses_defeated) * 0.1).max(0.5);
    tuning.enemy_spawn_ms * factor
}

/// Share of rolls that produce a kamikaze: min(0.15, 0.02 + 0.03·d)
pub fn kamikaze_share(bosses_defeated: u32) -> f64 {
    (0.02 + f64::from(bosses_defeated) * 0.03).min(0.15)
}

/// Map a uniform roll in [0, 1) to an enemy category
pub fn pick_enemy_kind(roll: f64, bosses_defeated: u32) -> EnemyKind {
    if roll < kamikaze_share(bosses_defeated) {
        EnemyKind::Kamikaze
    } else if roll < 0.35 {
        EnemyKind::Basic
    } else if roll < 0.55 {
        EnemyKind::Interceptor
    } else if roll < 0.70 {
        EnemyKind::Elite
    } else if roll < 0.88 {
        EnemyKind::Tank
    } else {
        EnemyKind::Bomber
    }
}

/// Roll a category and a position just ahead of the camera
pub fn roll_enemy(rng: &mut impl Rng, tuning: &Tuning, camera_x: f32, bosses_defeated: u32) -> EnemySpec {
    let kind = pick_enemy_kind(rng.random::<f64>(), bosses_defeated);
    let width = kind.template().width;
    let ahead = camera_x + tuning.view_width + 60.0 + rng.random::<f32>() * 300.0;
    let x = ahead.min(tuning.level_width - width);
    let y = 60.0 + rng.random::<f32>() * (tuning.view_height - 140.0).max(0.0);
    EnemySpec {
        kind,
        x,
        y,
        bosses_defeated,
    }
}

fn spawn_one(state: &mut GameState) {
    let spec = roll_enemy(&mut state.rng, &state.tuning, state.camera_x, state.bosses_defeated);
    let id = state.registry.spawn_enemy(&spec);
    log::debug!("Spawned {} #{id} at ({:.0}, {:.0})", spec.kind.name(), spec.x, spec.y);
}

/// Spawn on the difficulty-scaled interval, possibly queueing a follow-up
pub fn update_spawning(state: &mut GameState) {
    if state.registry.boss_active() {
        return;
    }
    let now = state.clock.sim_ms;
    let interval = spawn_interval_ms(&state.tuning, state.bosses_defeated);
    if state
        .spawner
        .last_spawn_ms
        .is_some_and(|last| now - last < interval)
    {
        return;
    }
    state.spawner.last_spawn_ms = Some(now);
    spawn_one(state);

    let d = state.bosses_defeated;
    if d > 0 && state.rng.random::<f64>() < 0.3 + f64::from(d) * 0.1 {
        state.schedule.push(now + FOLLOW_UP_DELAY_MS, Deferred::FollowUpSpawn);
    }
}

/// Deferred second spawn; dropped if a boss appeared in the meantime
pub fn spawn_follow_up(state: &mut GameState) {
    if state.registry.boss_active() {
        log::trace!("Follow-up spawn dropped: boss active");
        return;
    }
    spawn_one(state);
}

/// Spawn at most one boss whose trigger distance was crossed this round
pub fn check_boss_triggers(state: &mut GameState) {
    if state.registry.boss_active() {
        return;
    }
    let crossed = state
        .tuning
        .boss_triggers
        .iter()
        .enumerate()
        .find(|(i, trigger)| !state.spawner.trigger_fired(*i) && state.round_distance >= trigger.distance)
        .map(|(i, trigger)| (i, *trigger));
    let Some((slot, trigger)) = crossed else {
        return;
    };
    if let Some(fired) = state.spawner.triggers_fired.get_mut(slot) {
        *fired = true;
    }

    state.registry.clear_enemies();
    let spec = BossSpec {
        kind: trigger.kind,
        index: trigger.index,
        x: state.camera_x + state.tuning.view_width - 200.0,
        view_height: state.tuning.view_height,
        bosses_defeated: state.bosses_defeated,
    };
    if state.registry.spawn_boss(&spec).is_some() {
        log::info!(
            "Round {}: {} boss #{} at distance {:.0}",
            state.round,
            trigger.kind.as_str(),
            trigger.index,
            state.round_distance
        );
        state.events.push(GameEvent::BossSpawned {
            kind: trigger.kind,
            index: trigger.index,
        });
        state.events.flash("WARNING: BOSS APPROACHING!", 2000);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::BossKind;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_interval_floors_at_half() {
        let tuning = Tuning::default();
        assert_eq!(spawn_interval_ms(&tuning, 0), 900.0);
        assert!((spawn_interval_ms(&tuning, 3) - 630.0).abs() < 1e-9);
        assert_eq!(spawn_interval_ms(&tuning, 9), 450.0);
    }

    #[test]
    fn test_kamikaze_share_caps() {
        assert_eq!(kamikaze_share(0), 0.02);
        assert!((kamikaze_share(2) - 0.08).abs() < 1e-12);
        assert_eq!(kamikaze_share(10), 0.15);
    }

    #[test]
    fn test_kamikaze_rare_at_zero_difficulty() {
        let mut rng = Pcg32::seed_from_u64(0xACE);
        let tuning = Tuning::default();
        let samples = 100_000;
        let kamikazes = (0..samples)
            .filter(|_| roll_enemy(&mut rng, &tuning, 0.0, 0).kind == EnemyKind::Kamikaze)
            .count();
        let share = kamikazes as f64 / samples as f64;
        // 2% expected; allow sampling noise
        assert!(share <= 0.022, "kamikaze share {share}");
        assert!(share > 0.0);
    }

    #[test]
    fn test_roll_bands() {
        assert_eq!(pick_enemy_kind(0.01, 0), EnemyKind::Kamikaze);
        assert_eq!(pick_enemy_kind(0.30, 0), EnemyKind::Basic);
        assert_eq!(pick_enemy_kind(0.30, 10), EnemyKind::Basic);
        assert_eq!(pick_enemy_kind(0.10, 10), EnemyKind::Kamikaze);
        assert_eq!(pick_enemy_kind(0.50, 0), EnemyKind::Interceptor);
        assert_eq!(pick_enemy_kind(0.60, 0), EnemyKind::Elite);
        assert_eq!(pick_enemy_kind(0.80, 0), EnemyKind::Tank);
        assert_eq!(pick_enemy_kind(0.95, 0), EnemyKind::Bomber);
    }

    #[test]
    fn test_spawn_position_ahead_of_camera() {
        let mut rng = Pcg32::seed_from_u64(9);
        let tuning = Tuning::default();
        for _ in 0..200 {
            let spec = roll_enemy(&mut rng, &tuning, 1000.0, 0);
            assert!(spec.x >= 1000.0 + tuning.view_width + 60.0);
            assert!(spec.x <= 1000.0 + tuning.view_width + 360.0);
            assert!(spec.y >= 60.0 && spec.y <= tuning.view_height - 80.0);
        }
        // Clamped at the level end
        let spec = roll_enemy(&mut rng, &tuning, tuning.level_width, 0);
        assert_eq!(spec.x, tuning.level_width - spec.kind.template().width);
    }

    #[test]
    fn test_spawns_on_interval() {
        let mut state = GameState::new(1);
        update_spawning(&mut state);
        assert_eq!(state.registry.enemies.len(), 1);
        state.clock.sim_ms = 899.0;
        update_spawning(&mut state);
        assert_eq!(state.registry.enemies.len(), 1);
        state.clock.sim_ms = 900.0;
        update_spawning(&mut state);
        assert_eq!(state.registry.enemies.len(), 2);
        // No follow-ups at difficulty 0
        assert!(state.schedule.is_empty());
    }

    #[test]
    fn test_boss_trigger_fires_once() {
        let mut state = GameState::new(1);
        update_spawning(&mut state);
        state.round_distance = 5_000.0;
        check_boss_triggers(&mut state);
        let boss = state.registry.boss.as_ref().unwrap();
        assert_eq!(boss.kind, BossKind::Intermediate);
        assert_eq!(boss.index, 0);
        assert!(state.registry.enemies.is_empty());

        state.registry.boss = None;
        check_boss_triggers(&mut state);
        assert!(state.registry.boss.is_none());

        // Spawning is suppressed while a boss is active
        state.round_distance = 10_000.0;
        check_boss_triggers(&mut state);
        assert_eq!(state.registry.boss.as_ref().unwrap().index, 1);
        state.clock.sim_ms = 10_000.0;
        update_spawning(&mut state);
        assert!(state.registry.enemies.is_empty());
    }
}
