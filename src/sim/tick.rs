//! Per-frame simulation tick
//!
//! One call per display frame. Commands, loading and countdown are handled
//! every frame; the world itself only advances while `should_simulate()`
//! holds. Order within a simulated frame:
//! scroll -> spawn -> deferred events -> movement/shooting -> combat ->
//! effects -> phase transitions.

use glam::Vec2;
use rand::Rng;

use super::boss::{BossFrame, MissileFrame, check_enrage, launch_deferred_missile, update_boss, update_missiles};
use super::collision::resolve_combat;
use super::effects::regenerate;
use super::entities::{Bullet, Enemy, Rect};
use super::events::GameEvent;
use super::input::TickInput;
use super::registry::Registry;
use super::schedule::Deferred;
use super::spawn::{check_boss_triggers, spawn_follow_up, update_spawning};
use super::state::{GameState, Overlay};
use crate::consts::*;

/// Advance the session by one frame.
///
/// Events pile up in `state.events` until the caller drains them; `Session`
/// does this for you. Undrained logs keep only the newest
/// `MAX_PENDING_EVENTS` entries.
pub fn tick(state: &mut GameState, input: &TickInput) {
    state.clock.begin_frame(input.now_ms);
    if input.pointer.is_some() {
        state.pointer = input.pointer;
    }

    state.update_loading(input.assets_ready);
    state.handle_commands(&input.commands);
    state.update_countdown();
    state.auto_pause(input.focus_lost);
    if let Overlay::RewardWheel(wheel) = &mut state.overlay {
        wheel.update(state.clock.delta, &mut state.rng);
    }

    if !state.should_simulate() {
        return;
    }
    state.clock.advance_sim();

    if scroll(state) {
        return;
    }

    update_spawning(state);
    check_boss_triggers(state);
    run_deferred(state);

    update_player(state, input);
    update_enemies(state);
    update_hostile_fire(state);

    latch_enrage(state);
    let report = resolve_combat(state);
    latch_enrage(state);

    update_effects(state);

    if let Some(defeated) = report.boss_defeated {
        if state.player.is_dead() {
            state.credit_boss_kill(defeated);
            state.unclaimed_boss = Some(defeated);
        } else {
            state.on_boss_defeated(defeated);
        }
    }
    if state.player.is_dead() {
        state.on_player_death();
    }
}

/// Scroll the camera (not while a boss is up). Returns true when the round
/// ended this frame.
fn scroll(state: &mut GameState) -> bool {
    if state.registry.boss_active() {
        return false;
    }
    let step = state.tuning.base_scroll_speed * state.clock.delta;
    let max_camera = (state.tuning.level_width - state.tuning.view_width).max(0.0);
    state.camera_x = (state.camera_x + step).min(max_camera);
    state.player.rect.x += step;
    state.round_distance += step;

    if state.round_distance >= state.tuning.round_length {
        state.advance_round();
        return true;
    }
    false
}

fn run_deferred(state: &mut GameState) {
    let now = state.clock.sim_ms;
    for event in state.schedule.drain_due(now) {
        match event {
            Deferred::EnemyShot { enemy } => {
                let Some(shooter) = state.registry.enemy(enemy).filter(|e| !e.is_dead()).cloned() else {
                    log::trace!("Dropping burst shot for missing enemy {enemy}");
                    continue;
                };
                push_enemy_bullet(&shooter, &mut state.registry);
            }
            Deferred::BossMissile { boss } => {
                launch_deferred_missile(&mut state.registry, boss, now);
            }
            Deferred::FollowUpSpawn => spawn_follow_up(state),
        }
    }
}

fn update_player(state: &mut GameState, input: &TickInput) {
    let GameState {
        player,
        registry,
        tuning,
        clock,
        camera_x,
        ..
    } = state;

    player.steer(input.movement(), input.swipe, clock.delta, *camera_x, tuning);
    player.fire(clock.sim_ms, registry);

    let delta = clock.delta;
    let level_end = tuning.level_width + CULL_BEHIND;
    let view_height = tuning.view_height;
    player.bullets.retain_mut(|b| {
        b.advance(delta);
        b.rect.x <= level_end && b.rect.y >= -CULL_VERTICAL && b.rect.y <= view_height + CULL_VERTICAL
    });
}

/// Enemy movement, behaviour, shooting and culling
fn update_enemies(state: &mut GameState) {
    let GameState {
        player,
        registry,
        schedule,
        tuning,
        clock,
        rng,
        camera_x,
        ..
    } = state;
    let now = clock.sim_ms;
    let step = clock.delta * player.modifiers().enemy_time_scale();
    let target = player.rect.pos();
    let top = tuning.band_top();
    let bottom = tuning.band_bottom();
    let cull_x = *camera_x - CULL_BEHIND;

    let mut enemies = std::mem::take(&mut registry.enemies);
    for enemy in &mut enemies {
        enemy.rect.x -= enemy.speed * step;
        enemy.apply_behavior(target, now, step);
        enemy.rect.y = enemy.rect.y.clamp(top, (bottom - enemy.rect.height).max(top));

        let Some(weapon) = enemy.weapon else {
            continue;
        };
        // First volley is staggered so a wave does not fire in unison
        let last = *enemy
            .last_shot_ms
            .get_or_insert_with(|| now - rng.random::<f64>() * weapon.cooldown_ms);
        if now - last < weapon.cooldown_ms {
            continue;
        }
        enemy.last_shot_ms = Some(now);
        push_enemy_bullet(enemy, registry);
        for i in 1..weapon.burst_count {
            schedule.push(
                now + f64::from(i) * weapon.burst_delay_ms,
                Deferred::EnemyShot { enemy: enemy.id },
            );
        }
    }
    enemies.retain(|e| e.rect.x + e.rect.width >= cull_x);
    registry.enemies = enemies;
}

fn push_enemy_bullet(enemy: &Enemy, registry: &mut Registry) {
    let Some(weapon) = enemy.weapon else {
        return;
    };
    let id = registry.next_entity_id();
    registry.enemy_bullets.push(Bullet {
        id,
        rect: Rect::new(enemy.rect.x, enemy.rect.y + enemy.rect.height / 2.0, 10.0, 5.0),
        vel: Vec2::new(weapon.bullet_speed, 0.0),
        damage: weapon.bullet_damage,
        pierce: 0,
    });
}

/// Boss AI, enemy bullets and missiles
fn update_hostile_fire(state: &mut GameState) {
    let GameState {
        player,
        registry,
        schedule,
        tuning,
        clock,
        camera_x,
        ..
    } = state;
    let scale = player.modifiers().enemy_time_scale();

    update_boss(
        registry,
        schedule,
        &BossFrame {
            now_ms: clock.sim_ms,
            delta_ms: clock.delta_ms,
            delta: clock.delta,
            target: player.rect.center(),
            view_height: tuning.view_height,
            move_cycle_ms: tuning.boss_move_cycle_ms,
        },
    );

    let step = clock.delta * scale;
    let cull_x = *camera_x - CULL_BEHIND;
    let view_height = tuning.view_height;
    registry.enemy_bullets.retain_mut(|b| {
        b.advance(step);
        b.rect.x >= cull_x && b.rect.y >= -CULL_VERTICAL && b.rect.y <= view_height + CULL_VERTICAL
    });

    update_missiles(
        registry,
        &MissileFrame {
            now_ms: clock.sim_ms,
            delta: clock.delta,
            player_center: player.rect.center(),
            enemy_time_scale: scale,
            camera_x: *camera_x,
            view_width: tuning.view_width,
            view_height: tuning.view_height,
        },
    );
}

fn latch_enrage(state: &mut GameState) {
    let threshold = state.tuning.enrage_threshold;
    let Some(boss) = state.registry.boss.as_mut() else {
        return;
    };
    if let Some(id) = check_enrage(boss, threshold) {
        state.events.push(GameEvent::BossEnraged { boss: id });
        state.events.flash("BOSS ENRAGED!", 2000);
    }
}

/// Expire timed effects and i-frames, then regenerate
fn update_effects(state: &mut GameState) {
    let now = state.clock.sim_ms;
    let player = &mut state.player;
    for kind in player.effects.expire(now) {
        log::debug!("{} expired", kind.name());
        state.events.push(GameEvent::EffectExpired { kind });
    }
    player.iframes.expire(now);
    if !player.is_dead() {
        player.health = regenerate(player.health, player.max_health, player.regen_per_sec, state.clock.delta_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::effects::{EffectKind, PowerupKind};
    use crate::sim::entities::{BossSpec, EnemyKind, EnemySpec};
    use crate::persistence::CooldownStore;
    use crate::sim::input::Command;
    use crate::sim::reward::{RewardKind, RewardVerdict};
    use crate::sim::state::GamePhase;
    use crate::tuning::{BossKind, Tuning};
    use proptest::prelude::*;

    const FRAME: f64 = 16.67;

    /// A session in live play at wall time `t`
    fn live(seed: u64) -> (GameState, f64) {
        let mut state = GameState::new(seed);
        state.phase = GamePhase::Playing;
        state.overlay = Overlay::None;
        tick(&mut state, &TickInput::at(0.0));
        (state, 0.0)
    }

    fn step(state: &mut GameState, t: &mut f64) {
        *t += FRAME;
        tick(state, &TickInput::at(*t));
    }

    #[test]
    fn test_full_startup_sequence() {
        let mut state = GameState::new(1);
        let mut input = TickInput::at(0.0);
        input.assets_ready = false;
        tick(&mut state, &input);
        assert_eq!(state.phase, GamePhase::Loading);

        tick(&mut state, &TickInput::at(10.0).with_command(Command::StartGame));
        assert_eq!(state.phase, GamePhase::Countdown);
        for t in 1..=4 {
            tick(&mut state, &TickInput::at(10.0 + 1000.0 * f64::from(t)));
        }
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(matches!(state.overlay, Overlay::RewardWheel(_)));

        // Nothing simulates while the wheel is up
        let sim_before = state.clock.sim_ms;
        tick(&mut state, &TickInput::at(5_100.0).with_command(Command::SpinWheel));
        let mut t = 5_100.0;
        while state.overlay.is_open() && t < 60_000.0 {
            t += FRAME;
            tick(&mut state, &TickInput::at(t).with_command(Command::ClaimWheel));
        }
        assert!(!state.overlay.is_open());
        assert!(state.player.inventory.values().sum::<u32>() > 0);
        // Only the frame that closed the wheel simulated
        assert!((state.clock.sim_ms - sim_before - FRAME).abs() < 1e-6);
    }

    #[test]
    fn test_pause_freezes_simulation() {
        let (mut state, mut t) = live(2);
        step(&mut state, &mut t);
        let camera = state.camera_x;
        let sim = state.clock.sim_ms;

        t += FRAME;
        tick(&mut state, &TickInput::at(t).with_command(Command::TogglePause));
        for _ in 0..30 {
            step(&mut state, &mut t);
        }
        assert_eq!(state.camera_x, camera);
        assert_eq!(state.clock.sim_ms, sim);
    }

    #[test]
    fn test_round_transition_fires_once() {
        let tuning = Tuning {
            round_length: 100.0,
            ..Tuning::default()
        };
        let mut state = GameState::with_tuning(3, tuning);
        state.phase = GamePhase::Playing;
        let mut t = 0.0;
        tick(&mut state, &TickInput::at(t));
        for _ in 0..200 {
            step(&mut state, &mut t);
            if state.round > 1 {
                break;
            }
        }
        assert_eq!(state.round, 2);
        assert!(matches!(state.overlay, Overlay::RewardWheel(_)));

        // Further frames while the wheel is up do not advance again
        state.round_distance = 1_000.0;
        for _ in 0..20 {
            step(&mut state, &mut t);
        }
        assert_eq!(state.round, 2);
        let rounds_started = state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::RoundStarted { .. }))
            .count();
        assert_eq!(rounds_started, 1);
    }

    #[test]
    fn test_enemy_shot_dropped_after_removal() {
        let (mut state, mut t) = live(4);
        let id = state.registry.spawn_enemy(&EnemySpec {
            kind: EnemyKind::Bomber,
            x: 900.0,
            y: 300.0,
            bosses_defeated: 0,
        });
        state.schedule.push(state.clock.sim_ms + 1.0, Deferred::EnemyShot { enemy: id });
        state.registry.clear_enemies();
        let bullets = state.registry.enemy_bullets.len();
        step(&mut state, &mut t);
        assert!(state.schedule.is_empty());
        assert_eq!(state.registry.enemy_bullets.len(), bullets);
    }

    #[test]
    fn test_burst_fire_is_scheduled() {
        let (mut state, mut t) = live(5);
        state.registry.clear_enemies();
        let id = state.registry.spawn_enemy(&EnemySpec {
            kind: EnemyKind::Bomber,
            x: 900.0,
            y: 300.0,
            bosses_defeated: 0,
        });
        if let Some(enemy) = state.registry.enemies.iter_mut().find(|e| e.id == id) {
            enemy.last_shot_ms = Some(-10_000.0);
        }
        step(&mut state, &mut t);
        let own = |s: &GameState| s.registry.enemy_bullets.iter().filter(|b| b.damage == 15).count();
        assert_eq!(own(&state), 1);
        for _ in 0..30 {
            step(&mut state, &mut t);
        }
        assert_eq!(own(&state), 3);
    }

    #[test]
    fn test_boss_stops_scroll_and_defeat_opens_shop() {
        let (mut state, mut t) = live(6);
        state.registry.spawn_boss(&BossSpec {
            kind: BossKind::Intermediate,
            index: 0,
            x: 900.0,
            view_height: state.tuning.view_height,
            bosses_defeated: 0,
        });
        let camera = state.camera_x;
        step(&mut state, &mut t);
        assert_eq!(state.camera_x, camera);

        if let Some(boss) = state.registry.boss.as_mut() {
            boss.health = 1;
            boss.rect.x = state.player.rect.x + state.player.rect.width + 4.0;
            boss.rect.y = state.player.rect.y - 20.0;
        }
        state.player.last_shot_ms = None;
        for _ in 0..10 {
            step(&mut state, &mut t);
            if state.registry.boss.is_none() {
                break;
            }
        }
        assert!(state.registry.boss.is_none());
        assert_eq!(state.bosses_defeated, 1);
        assert!(matches!(state.overlay, Overlay::UpgradeShop(_)));
        assert!(state.player.score >= 1000);
    }

    #[test]
    fn test_death_ends_the_game() {
        let (mut state, mut t) = live(7);
        state.player.health = 5.0;
        state.registry.spawn_enemy(&EnemySpec {
            kind: EnemyKind::Tank,
            x: state.player.rect.x,
            y: state.player.rect.y,
            bosses_defeated: 0,
        });
        step(&mut state, &mut t);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.player.health, 0.0);
        assert!(!state.should_simulate());
    }

    #[test]
    fn test_boss_kill_counts_when_player_dies_same_tick() {
        let (mut state, mut t) = live(9);
        state.registry.spawn_boss(&BossSpec {
            kind: BossKind::Final,
            index: 2,
            x: state.player.rect.x + 400.0,
            view_height: state.tuning.view_height,
            bosses_defeated: 0,
        });
        let boss_rect = match state.registry.boss.as_mut() {
            Some(boss) => {
                boss.health = 1;
                boss.rect
            }
            None => panic!("boss did not spawn"),
        };
        let id = state.registry.next_entity_id();
        state.player.bullets.push(Bullet {
            id,
            rect: Rect::new(boss_rect.x + 20.0, boss_rect.y + 20.0, 12.0, 6.0),
            vel: Vec2::ZERO,
            damage: 10,
            pierce: 0,
        });
        let id = state.registry.next_entity_id();
        state.registry.enemy_bullets.push(Bullet {
            id,
            rect: state.player.rect,
            vel: Vec2::ZERO,
            damage: 20,
            pierce: 0,
        });
        state.player.health = 5.0;

        step(&mut state, &mut t);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(state.registry.boss.is_none());
        assert_eq!(state.bosses_defeated, 1);
        assert!(state.player.score >= 1000);
        let events = state.events.drain();
        assert!(events.iter().any(|e| matches!(e, GameEvent::BossDefeated { index: 2, .. })));

        let request = state
            .request_reward(RewardKind::Revive, &CooldownStore::new(), t)
            .unwrap();
        state.complete_reward(request.ticket, RewardVerdict::Granted).unwrap();
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.unclaimed_boss.is_none());
        match &state.overlay {
            Overlay::BattleSummary(summary) => assert_eq!(summary.boss_index, 2),
            other => panic!("expected battle summary, got {}", other.name()),
        }
    }

    #[test]
    fn test_effects_expire_on_sim_clock() {
        let (mut state, mut t) = live(8);
        state.player.add_charges(PowerupKind::ShieldBubble, 1);
        t += FRAME;
        tick(
            &mut state,
            &TickInput::at(t).with_command(Command::ActivatePowerup(PowerupKind::ShieldBubble)),
        );
        assert!(state.player.effects.is_active(EffectKind::ShieldBubble));

        // Paused wall time does not count
        state.overlay = Overlay::Paused;
        t += 60_000.0;
        tick(&mut state, &TickInput::at(t));
        assert!(state.player.effects.is_active(EffectKind::ShieldBubble));

        state.overlay = Overlay::None;
        for _ in 0..100 {
            t += 100.0;
            tick(&mut state, &TickInput::at(t));
        }
        assert!(!state.player.effects.is_active(EffectKind::ShieldBubble));
        assert!(
            state
                .events
                .iter()
                .any(|e| *e == GameEvent::EffectExpired { kind: EffectKind::ShieldBubble })
        );
    }

    proptest! {
        #[test]
        fn prop_health_stays_in_bounds(
            seed in any::<u64>(),
            frames in proptest::collection::vec((1.0f64..120.0, any::<[bool; 4]>()), 1..300),
        ) {
            let (mut state, mut t) = live(seed);
            state.bosses_defeated = 5;
            for (dt, [left, right, up, down]) in frames {
                t += dt;
                let input = TickInput { left, right, up, down, ..TickInput::at(t) };
                tick(&mut state, &input);
                prop_assert!(state.player.health >= 0.0);
                prop_assert!(state.player.health <= state.player.max_health);
                if state.phase == GamePhase::GameOver {
                    break;
                }
            }
        }

        #[test]
        fn prop_enrage_is_monotonic(seed in any::<u64>(), hits in proptest::collection::vec(0i32..400, 1..40)) {
            let (mut state, mut t) = live(seed);
            state.registry.spawn_boss(&BossSpec {
                kind: BossKind::Final,
                index: 2,
                x: 900.0,
                view_height: state.tuning.view_height,
                bosses_defeated: 0,
            });
            let mut was_enraged = false;
            for hit in hits {
                if let Some(boss) = state.registry.boss.as_mut() {
                    // Damage or heal (heal never un-latches enrage)
                    boss.health = (boss.health - hit + 150).clamp(1, boss.max_health);
                }
                step(&mut state, &mut t);
                let Some(boss) = state.registry.boss.as_ref() else {
                    break;
                };
                prop_assert!(!was_enraged || boss.enraged);
                was_enraged = boss.enraged;
            }
        }

        #[test]
        fn prop_invulnerability_blocks_all_damage(seed in any::<u64>(), kinds in proptest::collection::vec(0usize..6, 1..10)) {
            let (mut state, mut t) = live(seed);
            state.player.iframes.open(state.clock.sim_ms, 1_000_000.0);
            let health = state.player.health;
            let (x, y) = (state.player.rect.x, state.player.rect.y);
            for k in kinds {
                state.registry.spawn_enemy(&EnemySpec {
                    kind: EnemyKind::ALL[k],
                    x,
                    y,
                    bosses_defeated: 3,
                });
                let id = state.registry.next_entity_id();
                state.registry.enemy_bullets.push(Bullet {
                    id,
                    rect: state.player.rect,
                    vel: Vec2::ZERO,
                    damage: 50,
                    pierce: 0,
                });
                step(&mut state, &mut t);
                prop_assert_eq!(state.player.health, health);
            }
        }
    }
}
