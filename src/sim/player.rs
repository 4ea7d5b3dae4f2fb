//! The player craft: movement, weapon, damage intake and per-round statistics

use std::collections::BTreeMap;

use glam::Vec2;
use serde::Serialize;

use super::effects::{InvulnerabilityWindow, Modifiers, PowerupKind, TimedEffects};
use super::entities::{Bullet, EnemyKind, Missile, MissileOwner, Rect};
use super::registry::Registry;
use crate::consts::*;
use crate::tuning::Tuning;

/// Homing missile fired by the player while the power-up runs
const HOMING_FIRE_INTERVAL_MS: f64 = 400.0;
const HOMING_DAMAGE: u32 = 25;
const HOMING_SPEED: f32 = 8.0;
const HOMING_TURN_RATE: f32 = 0.15;
const HOMING_DURATION_MS: f64 = 3000.0;

/// Weapon stats modified by shop upgrades
#[derive(Debug, Clone, Serialize)]
pub struct Weapon {
    /// Minimum interval between shots
    pub fire_rate_ms: f64,
    pub bullet_damage: u32,
    /// Added to every bullet's horizontal speed
    pub bullet_speed_bonus: f32,
    /// Extra targets each projectile may pass through
    pub pierce: u32,
    pub spread: bool,
    pub double_shot: bool,
}

impl Default for Weapon {
    fn default() -> Self {
        Self {
            fire_rate_ms: PLAYER_FIRE_RATE_MS,
            bullet_damage: PLAYER_BULLET_DAMAGE,
            bullet_speed_bonus: 0.0,
            pierce: 0,
            spread: false,
            double_shot: false,
        }
    }
}

impl Weapon {
    /// Spread and double shot together fire six weaker bullets, a bit slower
    pub fn is_combo(&self) -> bool {
        self.spread && self.double_shot
    }
}

/// Per-round statistics for the battle summary
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoundStats {
    pub shots_fired: u32,
    pub shots_hit: u32,
    pub damage_dealt: u64,
    pub damage_taken: f32,
    pub enemies_killed: u32,
    pub kills: BTreeMap<EnemyKind, u32>,
    pub bosses_defeated: u32,
    pub credits_earned: u64,
}

impl RoundStats {
    /// Whole-percent accuracy (0 when nothing was fired)
    pub fn accuracy(&self) -> u32 {
        if self.shots_fired == 0 {
            return 0;
        }
        (u64::from(self.shots_hit) * 100 / u64::from(self.shots_fired)) as u32
    }

    pub fn record_kill(&mut self, kind: EnemyKind, credits: u64) {
        self.enemies_killed += 1;
        *self.kills.entry(kind).or_insert(0) += 1;
        self.credits_earned += credits;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Player {
    pub rect: Rect,
    pub speed: f32,
    pub health: f32,
    pub max_health: f32,
    /// Absorbs damage before health
    pub shield: f32,
    /// Credits double as score
    pub score: u64,
    pub score_multiplier: f64,
    /// Passive regeneration (HP per second)
    pub regen_per_sec: f32,
    pub weapon: Weapon,
    pub bullets: Vec<Bullet>,
    /// Power-up charges
    pub inventory: BTreeMap<PowerupKind, u32>,
    pub effects: TimedEffects,
    pub iframes: InvulnerabilityWindow,
    pub stats: RoundStats,
    pub(crate) last_shot_ms: Option<f64>,
    pub(crate) last_missile_ms: Option<f64>,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    pub fn new() -> Self {
        Self {
            rect: Rect::new(PLAYER_START_X, PLAYER_START_Y, PLAYER_WIDTH, PLAYER_HEIGHT),
            speed: PLAYER_SPEED,
            health: PLAYER_MAX_HEALTH,
            max_health: PLAYER_MAX_HEALTH,
            shield: 0.0,
            score: 0,
            score_multiplier: 1.0,
            regen_per_sec: 0.0,
            weapon: Weapon::default(),
            bullets: Vec::new(),
            inventory: BTreeMap::new(),
            effects: TimedEffects::new(),
            iframes: InvulnerabilityWindow::default(),
            stats: RoundStats::default(),
            last_shot_ms: None,
            last_missile_ms: None,
        }
    }

    #[inline]
    pub fn modifiers(&self) -> Modifiers {
        self.effects.modifiers()
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Invincibility effect or post-damage window
    pub fn is_invulnerable(&self, now_ms: f64) -> bool {
        self.modifiers().invincible || self.iframes.is_active(now_ms)
    }

    pub fn charges(&self, kind: PowerupKind) -> u32 {
        self.inventory.get(&kind).copied().unwrap_or(0)
    }

    pub fn add_charges(&mut self, kind: PowerupKind, count: u32) {
        *self.inventory.entry(kind).or_insert(0) += count;
    }

    /// Consume one charge; false when none are left
    pub fn take_charge(&mut self, kind: PowerupKind) -> bool {
        match self.inventory.get_mut(&kind) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).clamp(0.0, self.max_health);
    }

    pub fn heal_full(&mut self) {
        self.health = self.max_health;
    }

    /// Add score, returning the credits gained
    pub fn award(&mut self, base: u32) -> u64 {
        let gained = (f64::from(base) * self.score_multiplier).floor() as u64;
        self.score += gained;
        gained
    }

    /// Apply incoming damage unless invulnerable.
    ///
    /// The shield absorbs first, health never drops below zero, and a
    /// post-damage window opens when `iframe_ms` is given. Returns the health
    /// actually lost.
    pub fn take_damage(&mut self, amount: f32, now_ms: f64, iframe_ms: Option<f64>) -> f32 {
        if self.is_invulnerable(now_ms) || amount <= 0.0 {
            return 0.0;
        }
        let absorbed = amount.min(self.shield);
        self.shield -= absorbed;
        let rest = amount - absorbed;
        let lost = rest.min(self.health);
        self.health = (self.health - rest).max(0.0);
        self.stats.damage_taken += lost;
        if let Some(duration) = iframe_ms {
            self.iframes.open(now_ms, duration);
        }
        lost
    }

    /// Shot damage after effect multipliers (and the combo penalty)
    pub fn shot_damage(&self) -> u32 {
        let mut damage = f64::from(self.weapon.bullet_damage) * self.modifiers().damage_mult;
        if self.weapon.is_combo() {
            damage = (damage.floor() * 0.7).floor();
        }
        damage.floor() as u32
    }

    /// Interval between shots after effects (and the combo penalty)
    pub fn fire_interval_ms(&self) -> f64 {
        let interval = self.weapon.fire_rate_ms / self.modifiers().fire_rate_divisor;
        if self.weapon.is_combo() { interval * 1.2 } else { interval }
    }

    /// Apply held direction and swipe, then clamp to the visible band
    pub fn steer(&mut self, direction: Vec2, swipe: Vec2, delta: f32, camera_x: f32, tuning: &Tuning) {
        let step = (direction + swipe) * self.speed * delta;
        self.rect.translate(step);
        self.clamp_to_view(camera_x, tuning);
    }

    pub fn clamp_to_view(&mut self, camera_x: f32, tuning: &Tuning) {
        let min_x = camera_x + 4.0;
        let max_x = (camera_x + tuning.view_width - self.rect.width - 4.0).max(min_x);
        self.rect.x = self.rect.x.clamp(min_x, max_x);
        self.rect.y = self.rect.y.clamp(tuning.band_top(), tuning.band_bottom());
    }

    /// Auto-fire if the weapon is ready.
    ///
    /// Under the homing power-up a missile is launched at the nearest hostile
    /// instead of bullets, and nothing fires when no target exists.
    pub fn fire(&mut self, now_ms: f64, registry: &mut Registry) {
        if self
            .last_shot_ms
            .is_some_and(|last| now_ms - last < self.fire_interval_ms())
        {
            return;
        }

        let origin = Vec2::new(self.rect.x + self.rect.width, self.rect.y + self.rect.height / 2.0);

        if self.modifiers().homing {
            if self
                .last_missile_ms
                .is_some_and(|last| now_ms - last < HOMING_FIRE_INTERVAL_MS)
            {
                return;
            }
            let Some(target) = registry.nearest_hostile(origin) else {
                return;
            };
            self.last_shot_ms = Some(now_ms);
            self.last_missile_ms = Some(now_ms);
            let id = registry.next_entity_id();
            registry.missiles.push(Missile {
                id,
                owner: MissileOwner::Player,
                rect: Rect::new(origin.x, origin.y, 16.0, 8.0),
                vel: (target - origin).normalize_or(Vec2::X) * HOMING_SPEED,
                speed: HOMING_SPEED,
                turn_rate: HOMING_TURN_RATE,
                homing_until_ms: now_ms + HOMING_DURATION_MS,
                damage: HOMING_DAMAGE,
                pierce: self.weapon.pierce,
                trail: Vec::with_capacity(TRAIL_LENGTH),
            });
            self.stats.shots_fired += 1;
            return;
        }

        self.last_shot_ms = Some(now_ms);
        let damage = self.shot_damage();
        let straight = PLAYER_BULLET_SPEED + self.weapon.bullet_speed_bonus;
        let angled = PLAYER_ANGLED_BULLET_SPEED + self.weapon.bullet_speed_bonus;

        let rows: &[f32] = if self.weapon.double_shot { &[-8.0, 8.0] } else { &[0.0] };
        for &row in rows {
            if self.weapon.spread {
                for (vx, vy) in [(angled, -2.0), (straight, 0.0), (angled, 2.0)] {
                    self.push_bullet(registry, origin + Vec2::new(0.0, row), Vec2::new(vx, vy), damage);
                }
            } else {
                self.push_bullet(registry, origin + Vec2::new(0.0, row), Vec2::new(straight, 0.0), damage);
            }
        }
    }

    fn push_bullet(&mut self, registry: &mut Registry, pos: Vec2, vel: Vec2, damage: u32) {
        let id = registry.next_entity_id();
        self.bullets.push(Bullet {
            id,
            rect: Rect::new(pos.x, pos.y, 12.0, 6.0),
            vel,
            damage,
            pierce: self.weapon.pierce,
        });
        self.stats.shots_fired += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::effects::EffectKind;
    use crate::sim::entities::EnemySpec;

    #[test]
    fn test_damage_clamps_and_opens_window() {
        let mut player = Player::new();
        let lost = player.take_damage(250.0, 0.0, Some(3000.0));
        assert_eq!(lost, 200.0);
        assert_eq!(player.health, 0.0);
        assert_eq!(player.stats.damage_taken, 200.0);
        assert!(player.is_invulnerable(2999.0));
    }

    #[test]
    fn test_window_blocks_every_source() {
        let mut player = Player::new();
        player.take_damage(20.0, 100.0, Some(3000.0));
        assert_eq!(player.take_damage(35.0, 1000.0, Some(3000.0)), 0.0);
        assert_eq!(player.health, 180.0);
        assert_eq!(player.take_damage(10.0, 3100.0, Some(3000.0)), 10.0);
    }

    #[test]
    fn test_shield_absorbs_first() {
        let mut player = Player::new();
        player.shield = 100.0;
        assert_eq!(player.take_damage(120.0, 0.0, None), 20.0);
        assert_eq!(player.shield, 0.0);
        assert_eq!(player.health, 180.0);
    }

    #[test]
    fn test_single_shot() {
        let mut player = Player::new();
        let mut registry = Registry::new();
        player.fire(0.0, &mut registry);
        assert_eq!(player.bullets.len(), 1);
        assert_eq!(player.bullets[0].damage, 10);
        assert_eq!(player.bullets[0].vel, Vec2::new(16.0, 0.0));

        // Weapon not ready yet
        player.fire(100.0, &mut registry);
        assert_eq!(player.bullets.len(), 1);
        player.fire(180.0, &mut registry);
        assert_eq!(player.bullets.len(), 2);
        assert_eq!(player.stats.shots_fired, 2);
    }

    #[test]
    fn test_combo_fires_six_weaker_bullets() {
        let mut player = Player::new();
        player.weapon.spread = true;
        player.weapon.double_shot = true;
        let mut registry = Registry::new();
        player.fire(0.0, &mut registry);
        assert_eq!(player.bullets.len(), 6);
        assert!(player.bullets.iter().all(|b| b.damage == 7));
        assert!((player.fire_interval_ms() - 216.0).abs() < 1e-9);
    }

    #[test]
    fn test_effects_scale_damage_and_rate() {
        let mut player = Player::new();
        player.effects.activate(EffectKind::UltraDamage, 0.0, 15_000.0);
        player.effects.activate(EffectKind::RapidFire, 0.0, 25_000.0);
        assert_eq!(player.shot_damage(), 50);
        assert_eq!(player.fire_interval_ms(), 45.0);
        player.effects.expire(30_000.0);
        assert_eq!(player.shot_damage(), 10);
        assert_eq!(player.fire_interval_ms(), 180.0);
    }

    #[test]
    fn test_homing_needs_a_target() {
        let mut player = Player::new();
        player.effects.activate(EffectKind::HomingMissiles, 0.0, 15_000.0);
        let mut registry = Registry::new();
        player.fire(0.0, &mut registry);
        assert!(registry.missiles.is_empty());
        assert!(player.bullets.is_empty());

        registry.spawn_enemy(&EnemySpec {
            kind: EnemyKind::Basic,
            x: 600.0,
            y: 200.0,
            bosses_defeated: 0,
        });
        player.fire(10.0, &mut registry);
        assert_eq!(registry.missiles.len(), 1);
        assert_eq!(registry.missiles[0].owner, MissileOwner::Player);
        assert_eq!(registry.missiles[0].damage, 25);
    }

    #[test]
    fn test_steer_clamps_to_band() {
        let tuning = Tuning::default();
        let mut player = Player::new();
        player.steer(Vec2::new(-1.0, -1.0), Vec2::ZERO, 100.0, 0.0, &tuning);
        assert_eq!(player.rect.x, 4.0);
        assert_eq!(player.rect.y, tuning.band_top());
        player.steer(Vec2::new(0.0, 1.0), Vec2::ZERO, 100.0, 0.0, &tuning);
        assert_eq!(player.rect.y, tuning.band_bottom());
    }

    #[test]
    fn test_accuracy() {
        let mut stats = RoundStats::default();
        assert_eq!(stats.accuracy(), 0);
        stats.shots_fired = 3;
        stats.shots_hit = 2;
        assert_eq!(stats.accuracy(), 66);
    }
}
