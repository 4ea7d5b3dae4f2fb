//! Boss AI and homing-missile steering
//!
//! A boss cycles through three movement patterns on a timer and dispatches
//! attacks by category. Each attack has its own cooldown on the simulation
//! clock. Salvo missiles after the first go through the schedule and are
//! dropped if the boss is gone by the time they come due.

use std::f32::consts::TAU;

use glam::Vec2;

use super::entities::{Boss, Bullet, EntityId, Missile, MissileOwner, MovePattern, Rect};
use super::registry::Registry;
use super::schedule::{Deferred, Schedule};
use crate::consts::*;
use crate::tuning::BossKind;

const SALVO_SPACING_MS: f64 = 400.0;
const BOSS_MISSILE_DAMAGE: u32 = 30;
const BOSS_MISSILE_TURN_RATE: f32 = 0.08;
const BOSS_MISSILE_HOMING_MS: f64 = 2000.0;

/// Per-frame inputs to the boss controller
#[derive(Debug, Clone, Copy)]
pub struct BossFrame {
    pub now_ms: f64,
    pub delta_ms: f64,
    pub delta: f32,
    /// Point the boss aims at (player center)
    pub target: Vec2,
    pub view_height: f32,
    pub move_cycle_ms: f64,
}

/// Move the active boss and fire whatever attacks are off cooldown
pub fn update_boss(registry: &mut Registry, schedule: &mut Schedule, frame: &BossFrame) {
    let Some(mut boss) = registry.boss.take() else {
        return;
    };

    move_boss(&mut boss, frame);

    match boss.kind {
        BossKind::Intermediate => {
            fire_cone(&mut boss, registry, frame);
            if boss.enraged {
                start_salvo(&mut boss, registry, schedule, frame.now_ms);
            }
        }
        BossKind::Final => {
            fire_cone(&mut boss, registry, frame);
            fire_spiral(&mut boss, registry, frame.now_ms);
            start_salvo(&mut boss, registry, schedule, frame.now_ms);
        }
    }

    registry.boss = Some(boss);
}

fn move_boss(boss: &mut Boss, frame: &BossFrame) {
    boss.move_timer_ms += frame.delta_ms;
    if boss.move_timer_ms > frame.move_cycle_ms {
        boss.move_timer_ms = 0.0;
        boss.move_pattern = boss.move_pattern.next();
    }

    let dy = match boss.move_pattern {
        MovePattern::Sinusoidal => (frame.now_ms / 500.0).sin() as f32 * 2.0,
        MovePattern::DriftDown => 1.5,
        MovePattern::DriftUp => -1.5,
    };
    let max_y = (frame.view_height - boss.rect.height - BOSS_MARGIN).max(BOSS_MARGIN);
    boss.rect.y = (boss.rect.y + dy * frame.delta).clamp(BOSS_MARGIN, max_y);
}

fn cooldown_ready(last: Option<f64>, cooldown_ms: f64, now_ms: f64) -> bool {
    last.is_none_or(|t| now_ms - t >= cooldown_ms)
}

/// Aimed fan of bullets; wider, faster and harder-hitting once enraged
fn fire_cone(boss: &mut Boss, registry: &mut Registry, frame: &BossFrame) {
    if !cooldown_ready(boss.last_cone_ms, boss.cone_cooldown_ms, frame.now_ms) {
        return;
    }
    boss.last_cone_ms = Some(frame.now_ms);

    let (count, spread, speed, damage) = if boss.enraged {
        (7_i32, 0.8_f32, 8.0_f32, 25)
    } else {
        (5, 0.6, 6.0, 20)
    };
    let origin = boss.rect.center();
    let aim = frame.target - origin;
    let base_angle = aim.y.atan2(aim.x);

    for i in 0..count {
        let angle = base_angle + (i - count / 2) as f32 * (spread / count as f32);
        let id = registry.next_entity_id();
        registry.enemy_bullets.push(Bullet {
            id,
            rect: Rect::new(origin.x, origin.y, 12.0, 12.0),
            vel: Vec2::from_angle(angle) * speed,
            damage,
            pierce: 0,
        });
    }
}

/// Ten bullets evenly around a rotating offset
fn fire_spiral(boss: &mut Boss, registry: &mut Registry, now_ms: f64) {
    if !cooldown_ready(boss.last_spiral_ms, boss.spiral_cooldown_ms, now_ms) {
        return;
    }
    boss.last_spiral_ms = Some(now_ms);

    const COUNT: usize = 10;
    let (speed, damage) = if boss.enraged { (7.0, 22) } else { (5.0, 18) };
    let offset = ((now_ms / 100.0) as f32).rem_euclid(TAU);
    let origin = boss.rect.center();

    for i in 0..COUNT {
        let angle = i as f32 / COUNT as f32 * TAU + offset;
        let id = registry.next_entity_id();
        registry.enemy_bullets.push(Bullet {
            id,
            rect: Rect::new(origin.x, origin.y, 10.0, 10.0),
            vel: Vec2::from_angle(angle) * speed,
            damage,
            pierce: 0,
        });
    }
}

/// Fire the first salvo missile now and queue the rest
fn start_salvo(boss: &mut Boss, registry: &mut Registry, schedule: &mut Schedule, now_ms: f64) {
    if !cooldown_ready(boss.last_missile_ms, boss.missile_cooldown_ms, now_ms) {
        return;
    }
    boss.last_missile_ms = Some(now_ms);

    let count = if boss.enraged { 3 } else { 2 };
    push_boss_missile(boss, registry, now_ms);
    for i in 1..count {
        schedule.push(
            now_ms + SALVO_SPACING_MS * f64::from(i),
            Deferred::BossMissile { boss: boss.id },
        );
    }
}

fn push_boss_missile(boss: &Boss, registry: &mut Registry, now_ms: f64) {
    let origin = boss.rect.center();
    let speed = if boss.enraged { 5.0 } else { 4.0 };
    let id = registry.next_entity_id();
    registry.missiles.push(Missile {
        id,
        owner: MissileOwner::Boss,
        rect: Rect::new(origin.x, origin.y, 16.0, 8.0),
        vel: Vec2::new(-4.0, 0.0),
        speed,
        turn_rate: BOSS_MISSILE_TURN_RATE,
        homing_until_ms: now_ms + BOSS_MISSILE_HOMING_MS,
        damage: BOSS_MISSILE_DAMAGE,
        pierce: 0,
        trail: Vec::with_capacity(TRAIL_LENGTH),
    });
}

/// Deferred salvo missile. Returns false when the boss no longer exists.
pub fn launch_deferred_missile(registry: &mut Registry, boss_id: EntityId, now_ms: f64) -> bool {
    let Some(boss) = registry.boss_by_id(boss_id).filter(|b| !b.is_dead()).cloned() else {
        log::trace!("Dropping salvo missile for missing boss {boss_id}");
        return false;
    };
    push_boss_missile(&boss, registry, now_ms);
    true
}

/// Latch enrage once health falls to the threshold. Returns the boss id on
/// the transition, `None` otherwise.
pub fn check_enrage(boss: &mut Boss, threshold: f32) -> Option<EntityId> {
    if boss.enraged || boss.is_dead() {
        return None;
    }
    if boss.health as f32 <= boss.max_health as f32 * threshold {
        boss.enraged = true;
        log::info!("Boss {} enraged at {} HP", boss.id, boss.health);
        return Some(boss.id);
    }
    None
}

/// Turn toward `target` by `turn_rate`, keeping constant speed
pub fn steer_missile(missile: &mut Missile, target: Vec2) {
    let to_target = target - missile.rect.center();
    if to_target.length_squared() <= f32::EPSILON {
        return;
    }
    let desired = to_target.normalize() * missile.speed;
    let turned = missile.vel + (desired - missile.vel) * missile.turn_rate;
    if turned.length_squared() > 0.0 {
        missile.vel = turned.normalize() * missile.speed;
    }
}

/// Parameters for the missile pass
#[derive(Debug, Clone, Copy)]
pub struct MissileFrame {
    pub now_ms: f64,
    pub delta: f32,
    pub player_center: Vec2,
    /// Movement multiplier for boss missiles (slow time)
    pub enemy_time_scale: f32,
    pub camera_x: f32,
    pub view_width: f32,
    pub view_height: f32,
}

/// Steer, move and cull every missile
pub fn update_missiles(registry: &mut Registry, frame: &MissileFrame) {
    let mut missiles = std::mem::take(&mut registry.missiles);
    for missile in &mut missiles {
        if frame.now_ms < missile.homing_until_ms {
            let target = match missile.owner {
                MissileOwner::Player => registry.nearest_hostile(missile.rect.center()),
                MissileOwner::Boss => Some(frame.player_center),
            };
            if let Some(target) = target {
                steer_missile(missile, target);
            }
        }
        let scale = match missile.owner {
            MissileOwner::Player => 1.0,
            MissileOwner::Boss => frame.enemy_time_scale,
        };
        missile.rect.translate(missile.vel * frame.delta * scale);
        missile.record_trail();
    }
    missiles.retain(|m| {
        m.rect.x >= frame.camera_x - CULL_BEHIND
            && m.rect.x <= frame.camera_x + frame.view_width + CULL_BEHIND
            && m.rect.y >= -CULL_VERTICAL
            && m.rect.y <= frame.view_height + CULL_VERTICAL
    });
    registry.missiles = missiles;
}
