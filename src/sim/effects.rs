//! Timed-effect manager
//!
//! Power-ups and special powers are tracked as (kind, end timestamp) pairs on
//! the simulation clock. Stat changes are never written into the player's
//! base stats: `Modifiers` is rebuilt from the active set on every change, so
//! expiring an effect restores the baseline and expiring it again is a no-op.

use serde::{Deserialize, Serialize};

/// Power-ups held as inventory charges (keys 1-4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PowerupKind {
    HomingMissiles,
    ShieldBubble,
    SlowTime,
    UltraDamage,
}

impl PowerupKind {
    pub const ALL: [PowerupKind; 4] = [
        PowerupKind::HomingMissiles,
        PowerupKind::ShieldBubble,
        PowerupKind::SlowTime,
        PowerupKind::UltraDamage,
    ];

    pub fn name(self) -> &'static str {
        self.effect().name()
    }

    /// The timed effect this power-up starts
    pub fn effect(self) -> EffectKind {
        match self {
            PowerupKind::HomingMissiles => EffectKind::HomingMissiles,
            PowerupKind::ShieldBubble => EffectKind::ShieldBubble,
            PowerupKind::SlowTime => EffectKind::SlowTime,
            PowerupKind::UltraDamage => EffectKind::UltraDamage,
        }
    }

    /// Hotkey slot (1-based), as shown in the HUD
    pub fn slot(self) -> u8 {
        match self {
            PowerupKind::HomingMissiles => 1,
            PowerupKind::ShieldBubble => 2,
            PowerupKind::SlowTime => 3,
            PowerupKind::UltraDamage => 4,
        }
    }
}

/// Every timed effect the player can be under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    HomingMissiles,
    ShieldBubble,
    SlowTime,
    UltraDamage,
    MegaDamage,
    Invincibility,
    RapidFire,
}

impl EffectKind {
    pub fn name(self) -> &'static str {
        match self {
            EffectKind::HomingMissiles => "Homing Missiles",
            EffectKind::ShieldBubble => "Shield Bubble",
            EffectKind::SlowTime => "Slow Time",
            EffectKind::UltraDamage => "Ultra Damage",
            EffectKind::MegaDamage => "Mega Damage",
            EffectKind::Invincibility => "Invincibility",
            EffectKind::RapidFire => "Rapid Fire",
        }
    }

    /// Duration when started from an inventory charge
    pub fn default_duration_ms(self) -> f64 {
        match self {
            EffectKind::HomingMissiles => 15_000.0,
            EffectKind::ShieldBubble => 5_000.0,
            EffectKind::SlowTime => 20_000.0,
            EffectKind::UltraDamage => 15_000.0,
            EffectKind::MegaDamage => 20_000.0,
            EffectKind::Invincibility => 10_000.0,
            EffectKind::RapidFire => 25_000.0,
        }
    }

    /// Inventory power-ups are mutually exclusive
    pub fn is_inventory(self) -> bool {
        matches!(
            self,
            EffectKind::HomingMissiles
                | EffectKind::ShieldBubble
                | EffectKind::SlowTime
                | EffectKind::UltraDamage
        )
    }
}

/// Stat modifiers derived from the active effects
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Modifiers {
    pub damage_mult: f64,
    /// Fire interval is divided by this
    pub fire_rate_divisor: f64,
    pub invincible: bool,
    /// Enemies and their projectiles move at half speed
    pub slow_time: bool,
    /// Auto-fire launches homing missiles instead of bullets
    pub homing: bool,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            damage_mult: 1.0,
            fire_rate_divisor: 1.0,
            invincible: false,
            slow_time: false,
            homing: false,
        }
    }
}

impl Modifiers {
    /// Movement multiplier for enemies and enemy projectiles
    pub fn enemy_time_scale(&self) -> f32 {
        if self.slow_time { 0.5 } else { 1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub kind: EffectKind,
    pub ends_at_ms: f64,
}

/// Active timed effects and the modifiers they produce
#[derive(Debug, Clone, Default, Serialize)]
pub struct TimedEffects {
    active: Vec<ActiveEffect>,
    modifiers: Modifiers,
}

impl TimedEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an effect, or push back its end time if it is already running
    pub fn activate(&mut self, kind: EffectKind, now_ms: f64, duration_ms: f64) {
        let ends_at_ms = now_ms + duration_ms;
        match self.active.iter_mut().find(|e| e.kind == kind) {
            Some(effect) => effect.ends_at_ms = effect.ends_at_ms.max(ends_at_ms),
            None => self.active.push(ActiveEffect { kind, ends_at_ms }),
        }
        self.recompute();
        log::debug!("{} active for {}ms", kind.name(), duration_ms);
    }

    /// Remove every effect whose end time has passed. Returns what expired.
    pub fn expire(&mut self, now_ms: f64) -> Vec<EffectKind> {
        let mut expired = Vec::new();
        self.active.retain(|e| {
            if now_ms >= e.ends_at_ms {
                expired.push(e.kind);
                false
            } else {
                true
            }
        });
        if !expired.is_empty() {
            self.recompute();
        }
        expired
    }

    fn recompute(&mut self) {
        let mut modifiers = Modifiers::default();
        for effect in &self.active {
            match effect.kind {
                EffectKind::HomingMissiles => modifiers.homing = true,
                EffectKind::ShieldBubble | EffectKind::Invincibility => modifiers.invincible = true,
                EffectKind::SlowTime => modifiers.slow_time = true,
                EffectKind::UltraDamage => modifiers.damage_mult *= 5.0,
                EffectKind::MegaDamage => modifiers.damage_mult *= 3.0,
                EffectKind::RapidFire => modifiers.fire_rate_divisor *= 4.0,
            }
        }
        self.modifiers = modifiers;
    }

    #[inline]
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn is_active(&self, kind: EffectKind) -> bool {
        self.active.iter().any(|e| e.kind == kind)
    }

    /// Milliseconds left on an effect (0 when inactive)
    pub fn remaining_ms(&self, kind: EffectKind, now_ms: f64) -> f64 {
        self.active
            .iter()
            .find(|e| e.kind == kind)
            .map_or(0.0, |e| (e.ends_at_ms - now_ms).max(0.0))
    }

    /// The running inventory power-up, if any
    pub fn active_inventory_effect(&self) -> Option<EffectKind> {
        self.active.iter().map(|e| e.kind).find(|k| k.is_inventory())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveEffect> {
        self.active.iter()
    }

    pub fn clear(&mut self) {
        self.active.clear();
        self.recompute();
    }
}

/// Post-damage grace period
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InvulnerabilityWindow {
    until_ms: Option<f64>,
}

impl InvulnerabilityWindow {
    pub fn open(&mut self, now_ms: f64, duration_ms: f64) {
        self.until_ms = Some(now_ms + duration_ms);
    }

    /// Active while `now < end`
    pub fn is_active(&self, now_ms: f64) -> bool {
        self.until_ms.is_some_and(|end| now_ms < end)
    }

    /// Drop the window once it has lapsed
    pub fn expire(&mut self, now_ms: f64) {
        if !self.is_active(now_ms) {
            self.until_ms = None;
        }
    }

    pub fn remaining_ms(&self, now_ms: f64) -> f64 {
        self.until_ms.map_or(0.0, |end| (end - now_ms).max(0.0))
    }

    pub fn clear(&mut self) {
        self.until_ms = None;
    }
}

/// Passive regeneration over `delta_ms`, clamped at `max_health`
pub fn regenerate(health: f32, max_health: f32, per_second: f32, delta_ms: f64) -> f32 {
    if per_second <= 0.0 || health >= max_health {
        return health.min(max_health);
    }
    (health + per_second * (delta_ms / 1000.0) as f32).min(max_health)
}
