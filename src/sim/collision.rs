//! Combat resolver
//!
//! Runs after everything has moved. Tests each projectile category against
//! its eligible targets with strict rectangle overlap, applies damage, awards
//! score exactly once per kill and sweeps spent entities at the end of the pass.
//!
//! Target order within a pass is the registry's storage order; a non-piercing
//! projectile stops at the first target it overlaps.

use serde::Serialize;

use super::entities::{EnemyKind, MissileOwner, Rect};
use super::events::{EventLog, GameEvent};
use super::player::Player;
use super::registry::Registry;
use super::state::GameState;
use crate::tuning::{BossKind, Tuning};

/// A boss killed during this pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DefeatedBoss {
    pub kind: BossKind,
    pub index: u32,
}

/// What a combat pass changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombatReport {
    pub score_gained: u64,
    pub kills: Vec<EnemyKind>,
    pub boss_defeated: Option<DefeatedBoss>,
    /// Health the player lost
    pub damage_taken: f32,
}

/// Resolve every collision for this tick
pub fn resolve_combat(state: &mut GameState) -> CombatReport {
    let GameState {
        player,
        registry,
        events,
        tuning,
        clock,
        ..
    } = state;
    let now_ms = clock.sim_ms;
    let mut report = CombatReport::default();

    player_shots(player, registry, events, tuning, &mut report);
    hostile_contact(player, registry, events, tuning, now_ms, &mut report);
    hostile_shots(player, registry, events, tuning, now_ms, &mut report);

    registry.remove_dead_enemies();
    if report.score_gained > 0 {
        events.push(GameEvent::ScoreChanged {
            score: player.score,
            gained: report.score_gained,
        });
    }
    report
}

/// Apply one projectile to the first overlapping enemies/boss.
/// Returns true when the projectile is used up.
#[allow(clippy::too_many_arguments)]
fn strike(
    rect: &Rect,
    damage: u32,
    pierce: &mut u32,
    player: &mut Player,
    registry: &mut Registry,
    events: &mut EventLog,
    tuning: &Tuning,
    report: &mut CombatReport,
) -> bool {
    for enemy in registry.enemies.iter_mut() {
        if enemy.is_dead() || !enemy.rect.overlaps(rect) {
            continue;
        }
        let dealt = enemy.apply_damage(damage);
        player.stats.shots_hit += 1;
        player.stats.damage_dealt += u64::from(dealt);

        if enemy.is_dead() {
            let gained = player.award(enemy.score_value);
            player.stats.record_kill(enemy.kind, gained);
            report.score_gained += gained;
            report.kills.push(enemy.kind);
            events.push(GameEvent::EnemyKilled {
                kind: enemy.kind,
                score: gained,
            });
        }

        if *pierce > 0 {
            *pierce -= 1;
        } else {
            return true;
        }
    }

    if let Some(boss) = registry.boss.as_mut() {
        if !boss.is_dead() && boss.rect.overlaps(rect) {
            let dealt = boss.apply_damage(damage);
            player.stats.shots_hit += 1;
            player.stats.damage_dealt += u64::from(dealt);

            if boss.is_dead() {
                let gained = player.award(tuning.boss_score);
                player.stats.bosses_defeated += 1;
                player.stats.credits_earned += gained;
                report.score_gained += gained;
                report.boss_defeated = Some(DefeatedBoss {
                    kind: boss.kind,
                    index: boss.index,
                });
                log::info!("{} boss #{} defeated", boss.kind.as_str(), boss.index);
            }

            if *pierce > 0 {
                *pierce -= 1;
            } else {
                return true;
            }
        }
    }
    false
}

fn player_shots(
    player: &mut Player,
    registry: &mut Registry,
    events: &mut EventLog,
    tuning: &Tuning,
    report: &mut CombatReport,
) {
    let mut bullets = std::mem::take(&mut player.bullets);
    bullets.retain_mut(|bullet| {
        let spent = strike(
            &bullet.rect,
            bullet.damage,
            &mut bullet.pierce,
            player,
            registry,
            events,
            tuning,
            report,
        );
        !spent
    });
    player.bullets = bullets;

    let mut missiles = std::mem::take(&mut registry.missiles);
    missiles.retain_mut(|missile| {
        if missile.owner != MissileOwner::Player {
            return true;
        }
        let spent = strike(
            &missile.rect,
            missile.damage,
            &mut missile.pierce,
            player,
            registry,
            events,
            tuning,
            report,
        );
        !spent
    });
    registry.missiles = missiles;

    if registry.boss.as_ref().is_some_and(|b| b.is_dead()) {
        registry.boss = None;
    }
}

fn iframe_duration(tuning: &Tuning) -> Option<f64> {
    tuning.iframes_enabled.then_some(tuning.iframe_duration_ms)
}

fn record_player_hit(player: &Player, lost: f32, events: &mut EventLog, report: &mut CombatReport) {
    report.damage_taken += lost;
    events.push(GameEvent::PlayerDamaged {
        amount: lost,
        health: player.health,
    });
}

/// Body contact with enemies (consumed) and the boss (not consumed)
fn hostile_contact(
    player: &mut Player,
    registry: &mut Registry,
    events: &mut EventLog,
    tuning: &Tuning,
    now_ms: f64,
    report: &mut CombatReport,
) {
    for enemy in registry.enemies.iter_mut() {
        if enemy.is_dead() || player.is_invulnerable(now_ms) || !enemy.rect.overlaps(&player.rect) {
            continue;
        }
        let damage = enemy.explosion_damage.unwrap_or(tuning.enemy_contact_damage);
        let lost = player.take_damage(damage as f32, now_ms, iframe_duration(tuning));
        // Consumed by the contact regardless of remaining health; no score
        enemy.health = 0;
        if enemy.is_kamikaze() {
            events.flash("KAMIKAZE HIT!", 800);
            events.push(GameEvent::CameraShake {
                intensity: 15.0,
                duration_ms: 400,
            });
        }
        record_player_hit(player, lost, events, report);
    }

    if let Some(boss) = &registry.boss {
        if !player.is_invulnerable(now_ms) && boss.rect.overlaps(&player.rect) {
            let lost = player.take_damage(
                tuning.boss_contact_damage as f32,
                now_ms,
                iframe_duration(tuning),
            );
            record_player_hit(player, lost, events, report);
        }
    }
}

/// Enemy bullets and boss missiles hitting the player
fn hostile_shots(
    player: &mut Player,
    registry: &mut Registry,
    events: &mut EventLog,
    tuning: &Tuning,
    now_ms: f64,
    report: &mut CombatReport,
) {
    registry.enemy_bullets.retain(|bullet| {
        if player.is_invulnerable(now_ms) || !bullet.rect.overlaps(&player.rect) {
            return true;
        }
        let lost = player.take_damage(bullet.damage as f32, now_ms, iframe_duration(tuning));
        record_player_hit(player, lost, events, report);
        false
    });

    registry.missiles.retain(|missile| {
        if missile.owner != MissileOwner::Boss
            || player.is_invulnerable(now_ms)
            || !missile.rect.overlaps(&player.rect)
        {
            return true;
        }
        let lost = player.take_damage(missile.damage as f32, now_ms, iframe_duration(tuning));
        record_player_hit(player, lost, events, report);
        false
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entities::{BossSpec, Bullet, EnemySpec};
    use glam::Vec2;

    fn bullet_at(state: &mut GameState, x: f32, y: f32, damage: u32, pierce: u32) {
        let id = state.registry.next_entity_id();
        state.player.bullets.push(Bullet {
            id,
            rect: Rect::new(x, y, 12.0, 6.0),
            vel: Vec2::new(16.0, 0.0),
            damage,
            pierce,
        });
    }

    fn enemy_at(state: &mut GameState, kind: EnemyKind, x: f32, y: f32) {
        state.registry.spawn_enemy(&EnemySpec {
            kind,
            x,
            y,
            bosses_defeated: 0,
        });
    }

    #[test]
    fn test_two_hits_kill_basic_enemy() {
        let mut state = GameState::new(1);
        enemy_at(&mut state, EnemyKind::Basic, 600.0, 300.0);

        bullet_at(&mut state, 605.0, 305.0, 10, 0);
        let report = resolve_combat(&mut state);
        assert_eq!(state.registry.enemies[0].health, 10);
        assert_eq!(report.score_gained, 0);
        assert!(state.player.bullets.is_empty());

        bullet_at(&mut state, 605.0, 305.0, 10, 0);
        let report = resolve_combat(&mut state);
        assert!(state.registry.enemies.is_empty());
        assert_eq!(report.score_gained, 10);
        assert_eq!(state.player.score, 10);
        assert_eq!(state.player.stats.kills.get(&EnemyKind::Basic), Some(&1));
        assert_eq!(state.player.stats.shots_hit, 2);
        assert_eq!(state.player.stats.damage_dealt, 20);
    }

    #[test]
    fn test_kill_awarded_once() {
        let mut state = GameState::new(1);
        state.player.score_multiplier = 1.5;
        enemy_at(&mut state, EnemyKind::Basic, 600.0, 300.0);
        // Three overlapping bullets, first two are enough
        for _ in 0..3 {
            bullet_at(&mut state, 605.0, 305.0, 10, 0);
        }
        let report = resolve_combat(&mut state);
        assert_eq!(report.score_gained, 15);
        assert_eq!(report.kills, vec![EnemyKind::Basic]);
        // The third bullet found nothing alive and keeps flying
        assert_eq!(state.player.bullets.len(), 1);
    }

    #[test]
    fn test_pierce_passes_through() {
        let mut state = GameState::new(1);
        enemy_at(&mut state, EnemyKind::Tank, 600.0, 300.0);
        enemy_at(&mut state, EnemyKind::Tank, 610.0, 300.0);
        bullet_at(&mut state, 615.0, 305.0, 10, 1);
        resolve_combat(&mut state);
        assert!(state.registry.enemies.iter().all(|e| e.health == 70));
        assert!(state.player.bullets.is_empty(), "pierce exhausted on the second hit");
    }

    #[test]
    fn test_kamikaze_contact_consumed() {
        let mut state = GameState::new(1);
        let p = state.player.rect;
        enemy_at(&mut state, EnemyKind::Kamikaze, p.x + 10.0, p.y + 10.0);
        let report = resolve_combat(&mut state);
        assert_eq!(report.damage_taken, 35.0);
        assert_eq!(state.player.health, 165.0);
        assert!(state.registry.enemies.is_empty());
        assert_eq!(state.player.score, 0);
        assert!(state.player.is_invulnerable(state.clock.sim_ms));
    }

    #[test]
    fn test_invulnerable_player_ignores_hits() {
        let mut state = GameState::new(1);
        let p = state.player.rect;
        state.player.iframes.open(0.0, 3000.0);
        enemy_at(&mut state, EnemyKind::Basic, p.x + 10.0, p.y + 10.0);
        let id = state.registry.next_entity_id();
        state.registry.enemy_bullets.push(Bullet {
            id,
            rect: Rect::new(p.x + 5.0, p.y + 5.0, 10.0, 5.0),
            vel: Vec2::new(-6.0, 0.0),
            damage: 20,
            pierce: 0,
        });
        let report = resolve_combat(&mut state);
        assert_eq!(report.damage_taken, 0.0);
        assert_eq!(state.player.health, 200.0);
        assert_eq!(state.registry.enemies.len(), 1);
        assert_eq!(state.registry.enemy_bullets.len(), 1);
    }

    #[test]
    fn test_only_first_contact_lands_inside_window() {
        let mut state = GameState::new(1);
        let p = state.player.rect;
        enemy_at(&mut state, EnemyKind::Basic, p.x + 10.0, p.y + 10.0);
        enemy_at(&mut state, EnemyKind::Basic, p.x + 20.0, p.y + 10.0);
        let report = resolve_combat(&mut state);
        assert_eq!(report.damage_taken, 20.0);
        assert_eq!(state.registry.enemies.len(), 1);
    }

    #[test]
    fn test_boss_defeat_reported() {
        let mut state = GameState::new(1);
        state.registry.spawn_boss(&BossSpec {
            kind: BossKind::Intermediate,
            index: 1,
            x: 900.0,
            view_height: 648.0,
            bosses_defeated: 0,
        });
        state.registry.boss.as_mut().unwrap().health = 5;
        let b = state.registry.boss.as_ref().unwrap().rect;
        bullet_at(&mut state, b.x + 2.0, b.y + 2.0, 10, 0);
        bullet_at(&mut state, b.x + 2.0, b.y + 2.0, 10, 0);

        let report = resolve_combat(&mut state);
        assert_eq!(
            report.boss_defeated,
            Some(DefeatedBoss {
                kind: BossKind::Intermediate,
                index: 1
            })
        );
        assert_eq!(report.score_gained, 1000);
        assert!(state.registry.boss.is_none());
        assert_eq!(state.player.bullets.len(), 1);
    }

    #[test]
    fn test_boss_contact_not_consumed() {
        let mut state = GameState::new(1);
        state.registry.spawn_boss(&BossSpec {
            kind: BossKind::Final,
            index: 2,
            x: 100.0,
            view_height: 648.0,
            bosses_defeated: 0,
        });
        state.player.rect.y = state.registry.boss.as_ref().unwrap().rect.y;
        let report = resolve_combat(&mut state);
        assert_eq!(report.damage_taken, 15.0);
        assert!(state.registry.boss.is_some());
    }
}
