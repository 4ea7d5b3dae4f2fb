//! Entity types: enemies, bosses and projectiles
//!
//! Everything collides as an axis-aligned rectangle in world coordinates
//! (x grows with the scroll direction, y grows downward).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::TRAIL_LENGTH;
use crate::tuning::BossKind;

/// Entity identifier, unique for the lifetime of a `Registry`
pub type EntityId = u32;

/// Axis-aligned bounding box (top-left corner + size)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Strict rectangle overlap (touching edges do not collide)
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    #[inline]
    pub fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }
}

/// Enemy template categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnemyKind {
    Basic,
    Tank,
    Interceptor,
    Bomber,
    Elite,
    Kamikaze,
}

/// Per-frame movement applied on top of the leftward scroll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behavior {
    /// Flies straight
    Straight,
    /// Vertical weave driven by the clock
    Weave,
    /// Vertical wave driven by horizontal position
    Undulate,
    /// Homes on the player at half speed
    Chase,
}

/// Ranged attack of a shooter enemy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyWeapon {
    /// Horizontal bullet velocity (negative = toward the player)
    pub bullet_speed: f32,
    pub bullet_damage: u32,
    /// Bullets per volley
    pub burst_count: u32,
    /// Delay between bullets of one volley
    pub burst_delay_ms: f64,
    /// Delay between volleys
    pub cooldown_ms: f64,
}

/// Unscaled stats of an enemy category
#[derive(Debug, Clone, Copy)]
pub struct EnemyTemplate {
    pub name: &'static str,
    pub width: f32,
    pub height: f32,
    /// Placeholder colour when no sprite is available
    pub color: &'static str,
    pub health: u32,
    pub speed: f32,
    pub score_value: u32,
    pub behavior: Behavior,
    pub weapon: Option<EnemyWeapon>,
    /// Contact explosion damage (kamikaze only)
    pub explosion_damage: Option<u32>,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 6] = [
        EnemyKind::Basic,
        EnemyKind::Tank,
        EnemyKind::Interceptor,
        EnemyKind::Bomber,
        EnemyKind::Elite,
        EnemyKind::Kamikaze,
    ];

    pub fn template(self) -> EnemyTemplate {
        match self {
            EnemyKind::Basic => EnemyTemplate {
                name: "Scout",
                width: 40.0,
                height: 20.0,
                color: "#ff0000",
                health: 20,
                speed: 2.0,
                score_value: 10,
                behavior: Behavior::Straight,
                weapon: None,
                explosion_damage: None,
            },
            EnemyKind::Tank => EnemyTemplate {
                name: "Destroyer",
                width: 80.0,
                height: 40.0,
                color: "#00ff00",
                health: 80,
                speed: 0.8,
                score_value: 50,
                behavior: Behavior::Straight,
                weapon: Some(EnemyWeapon {
                    bullet_speed: -6.0,
                    bullet_damage: 20,
                    burst_count: 2,
                    burst_delay_ms: 200.0,
                    cooldown_ms: 3000.0,
                }),
                explosion_damage: None,
            },
            EnemyKind::Interceptor => EnemyTemplate {
                name: "Interceptor",
                width: 50.0,
                height: 25.0,
                color: "#ff00ff",
                health: 15,
                speed: 3.5,
                score_value: 20,
                behavior: Behavior::Weave,
                weapon: Some(EnemyWeapon {
                    bullet_speed: -10.0,
                    bullet_damage: 8,
                    burst_count: 1,
                    burst_delay_ms: 0.0,
                    cooldown_ms: 1500.0,
                }),
                explosion_damage: None,
            },
            EnemyKind::Bomber => EnemyTemplate {
                name: "Bomber",
                width: 80.0,
                height: 40.0,
                color: "#0088ff",
                health: 60,
                speed: 1.2,
                score_value: 40,
                behavior: Behavior::Undulate,
                weapon: Some(EnemyWeapon {
                    bullet_speed: -7.0,
                    bullet_damage: 15,
                    burst_count: 3,
                    burst_delay_ms: 200.0,
                    cooldown_ms: 3000.0,
                }),
                explosion_damage: None,
            },
            EnemyKind::Elite => EnemyTemplate {
                name: "Elite Fighter",
                width: 64.0,
                height: 32.0,
                color: "#ffff00",
                health: 40,
                speed: 2.5,
                score_value: 30,
                behavior: Behavior::Straight,
                weapon: Some(EnemyWeapon {
                    bullet_speed: -9.0,
                    bullet_damage: 12,
                    burst_count: 2,
                    burst_delay_ms: 300.0,
                    cooldown_ms: 2500.0,
                }),
                explosion_damage: None,
            },
            EnemyKind::Kamikaze => EnemyTemplate {
                name: "Kamikaze",
                width: 40.0,
                height: 20.0,
                color: "#ff6600",
                health: 10,
                speed: 4.5,
                score_value: 25,
                behavior: Behavior::Chase,
                weapon: None,
                explosion_damage: Some(35),
            },
        }
    }

    pub fn name(self) -> &'static str {
        self.template().name
    }
}

/// Stat multipliers derived from the difficulty counter (bosses defeated)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyScaling {
    /// Health and score multiplier
    pub toughness: f64,
    pub speed: f64,
    pub damage: f64,
}

impl DifficultyScaling {
    pub fn for_difficulty(bosses_defeated: u32) -> Self {
        let d = bosses_defeated as f64;
        Self {
            toughness: 1.0 + d * 0.15,
            speed: 1.0 + d * 0.1,
            damage: 1.0 + d * 0.1,
        }
    }
}

/// Everything the registry needs to create an enemy
#[derive(Debug, Clone, Copy)]
pub struct EnemySpec {
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
    pub bosses_defeated: u32,
}

/// A live enemy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub rect: Rect,
    pub health: i32,
    pub speed: f32,
    pub score_value: u32,
    pub behavior: Behavior,
    pub weapon: Option<EnemyWeapon>,
    /// Simulation time of the last volley (None until the first shot is staggered)
    pub last_shot_ms: Option<f64>,
    /// Contact explosion damage; set only for kamikaze enemies
    pub explosion_damage: Option<u32>,
    /// Kamikaze pulse animation phase
    pub pulse_time: f32,
}

impl Enemy {
    /// Instantiate from the kind's template scaled by difficulty
    pub fn new(id: EntityId, spec: &EnemySpec) -> Self {
        let template = spec.kind.template();
        let scaling = DifficultyScaling::for_difficulty(spec.bosses_defeated);
        let scale = |value: u32, mult: f64| (value as f64 * mult).floor();
        let weapon = template.weapon.map(|w| EnemyWeapon {
            bullet_damage: scale(w.bullet_damage, scaling.damage) as u32,
            ..w
        });
        Self {
            id,
            kind: spec.kind,
            rect: Rect::new(spec.x, spec.y, template.width, template.height),
            health: scale(template.health, scaling.toughness) as i32,
            speed: (template.speed as f64 * scaling.speed) as f32,
            score_value: scale(template.score_value, scaling.toughness) as u32,
            behavior: template.behavior,
            weapon,
            last_shot_ms: None,
            explosion_damage: template
                .explosion_damage
                .map(|dmg| scale(dmg, scaling.damage) as u32),
            pulse_time: 0.0,
        }
    }

    #[inline]
    pub fn is_kamikaze(&self) -> bool {
        self.explosion_damage.is_some()
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    /// Apply damage, clamping at zero. Returns the health actually removed.
    pub fn apply_damage(&mut self, damage: u32) -> u32 {
        let dealt = (damage as i32).min(self.health).max(0);
        self.health = (self.health - damage as i32).max(0);
        dealt as u32
    }

    /// Per-kind movement on top of the leftward scroll. `step` is the frame
    /// delta already scaled by slow time; `target` is the player's position.
    pub fn apply_behavior(&mut self, target: Vec2, now_ms: f64, step: f32) {
        match self.behavior {
            Behavior::Straight => {}
            Behavior::Weave => self.rect.y += (now_ms / 200.0).sin() as f32 * 2.0 * step,
            Behavior::Undulate => self.rect.y += (self.rect.x / 100.0).sin() * 1.5 * step,
            Behavior::Chase => {
                let to_target = target - self.rect.pos();
                if to_target.length_squared() > 0.0 {
                    self.rect
                        .translate(to_target.normalize() * self.speed * 0.5 * step);
                }
                self.pulse_time += 0.1 * step;
            }
        }
    }
}

/// Boss movement patterns, cycled on a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovePattern {
    Sinusoidal,
    DriftDown,
    DriftUp,
}

impl MovePattern {
    pub fn next(self) -> Self {
        match self {
            MovePattern::Sinusoidal => MovePattern::DriftDown,
            MovePattern::DriftDown => MovePattern::DriftUp,
            MovePattern::DriftUp => MovePattern::Sinusoidal,
        }
    }
}

/// Everything the registry needs to create a boss
#[derive(Debug, Clone, Copy)]
pub struct BossSpec {
    pub kind: BossKind,
    /// Trigger index within the round
    pub index: u32,
    pub x: f32,
    pub view_height: f32,
    pub bosses_defeated: u32,
}

/// A live boss
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub id: EntityId,
    pub kind: BossKind,
    pub index: u32,
    pub rect: Rect,
    pub health: i32,
    pub max_health: i32,
    /// Latched once health drops to the enrage threshold
    pub enraged: bool,
    pub move_pattern: MovePattern,
    pub move_timer_ms: f64,
    pub last_cone_ms: Option<f64>,
    pub last_spiral_ms: Option<f64>,
    pub last_missile_ms: Option<f64>,
    pub cone_cooldown_ms: f64,
    pub spiral_cooldown_ms: f64,
    pub missile_cooldown_ms: f64,
}

impl Boss {
    pub fn new(id: EntityId, spec: &BossSpec) -> Self {
        let (width, height, base_health): (f32, f32, f64) = match spec.kind {
            BossKind::Intermediate => (140.0, 70.0, 400.0),
            BossKind::Final => (220.0, 110.0, 1200.0),
        };
        let health_mult = 1.0 + spec.bosses_defeated as f64 * 0.2;
        let health = (base_health * health_mult).floor() as i32;
        let y = (spec.view_height / 2.0 - height / 2.0).max(crate::consts::BOSS_MARGIN);
        Self {
            id,
            kind: spec.kind,
            index: spec.index,
            rect: Rect::new(spec.x, y, width, height),
            health,
            max_health: health,
            enraged: false,
            move_pattern: MovePattern::Sinusoidal,
            move_timer_ms: 0.0,
            last_cone_ms: None,
            last_spiral_ms: None,
            last_missile_ms: None,
            cone_cooldown_ms: 1500.0,
            spiral_cooldown_ms: 1500.0,
            missile_cooldown_ms: 3000.0,
        }
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0 {
            return 0.0;
        }
        self.health.max(0) as f32 / self.max_health as f32
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    /// Apply damage, clamping at zero. Returns the health actually removed.
    pub fn apply_damage(&mut self, damage: u32) -> u32 {
        let dealt = (damage as i32).min(self.health).max(0);
        self.health = (self.health - damage as i32).max(0);
        dealt as u32
    }

    pub fn color(&self) -> &'static str {
        match self.kind {
            BossKind::Intermediate => "orange",
            BossKind::Final => "purple",
        }
    }
}

/// A straight-flying bullet (player or enemy)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub id: EntityId,
    pub rect: Rect,
    /// Velocity per nominal frame
    pub vel: Vec2,
    pub damage: u32,
    /// Additional targets this bullet may pass through
    pub pierce: u32,
}

impl Bullet {
    pub fn advance(&mut self, delta: f32) {
        self.rect.translate(self.vel * delta);
    }
}

/// Who fired a homing missile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissileOwner {
    /// Seeks the nearest enemy or boss
    Player,
    /// Seeks the player
    Boss,
}

/// A homing missile with a limited target-acquisition window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Missile {
    pub id: EntityId,
    pub owner: MissileOwner,
    pub rect: Rect,
    pub vel: Vec2,
    pub speed: f32,
    pub turn_rate: f32,
    /// Simulation time after which the missile flies straight
    pub homing_until_ms: f64,
    pub damage: u32,
    pub pierce: u32,
    /// Recent positions for rendering (newest first)
    pub trail: Vec<Vec2>,
}

impl Missile {
    /// Record current position to trail
    pub fn record_trail(&mut self) {
        self.trail.insert(0, self.rect.pos());
        if self.trail.len() > TRAIL_LENGTH {
            self.trail.pop();
        }
    }
}
