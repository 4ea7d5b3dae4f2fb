//! Shop, reward wheel, special powers and the end-of-round rating
//!
//! Credits are the player's score. Everything here validates first and only
//! then mutates, so a rejected action leaves the player untouched.

use std::collections::{BTreeMap, BTreeSet};
use std::f32::consts::{FRAC_PI_2, TAU};

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use super::effects::{EffectKind, PowerupKind};
use super::player::{Player, RoundStats};
use crate::error::ActionError;
use crate::tuning::BossKind;

/// Number of random upgrades offered beside "Recover All Health"
const RANDOM_OFFERS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum UpgradeId {
    RecoverHealth,
    FireRate,
    ProjectileSpeed,
    FireSpread,
    DoubleShot,
    DoubleDamage,
    MaxHealth,
    MoveSpeed,
    Piercing,
    HealthRegen,
    BuyHoming,
    BuyShield,
}

impl UpgradeId {
    /// Upgrades drawn at random (everything except the recover offer)
    pub const POOL: [UpgradeId; 11] = [
        UpgradeId::FireRate,
        UpgradeId::ProjectileSpeed,
        UpgradeId::FireSpread,
        UpgradeId::DoubleShot,
        UpgradeId::DoubleDamage,
        UpgradeId::MaxHealth,
        UpgradeId::MoveSpeed,
        UpgradeId::Piercing,
        UpgradeId::HealthRegen,
        UpgradeId::BuyHoming,
        UpgradeId::BuyShield,
    ];

    pub fn name(self) -> &'static str {
        match self {
            UpgradeId::RecoverHealth => "Recover All Health",
            UpgradeId::FireRate => "Fire Rate Up",
            UpgradeId::ProjectileSpeed => "Projectile Speed",
            UpgradeId::FireSpread => "Fire Spread",
            UpgradeId::DoubleShot => "Double Shot",
            UpgradeId::DoubleDamage => "Double Damage",
            UpgradeId::MaxHealth => "Max Health Up",
            UpgradeId::MoveSpeed => "Move Speed Up",
            UpgradeId::Piercing => "Piercing Shots",
            UpgradeId::HealthRegen => "Health Regen",
            UpgradeId::BuyHoming => "Buy Homing Missiles",
            UpgradeId::BuyShield => "Buy Shield Bubble",
        }
    }

    pub fn cost(self) -> u64 {
        match self {
            UpgradeId::RecoverHealth => 500,
            UpgradeId::FireRate => 1500,
            UpgradeId::ProjectileSpeed => 1200,
            UpgradeId::FireSpread => 1800,
            UpgradeId::DoubleShot => 2000,
            UpgradeId::DoubleDamage => 2000,
            UpgradeId::MaxHealth => 1500,
            UpgradeId::MoveSpeed => 1000,
            UpgradeId::Piercing => 1700,
            UpgradeId::HealthRegen => 1600,
            UpgradeId::BuyHoming => 1800,
            UpgradeId::BuyShield => 2500,
        }
    }

    /// Purchase cap; `None` for the repeatable recover offer
    pub fn max_level(self) -> Option<u32> {
        match self {
            UpgradeId::RecoverHealth => None,
            UpgradeId::FireSpread | UpgradeId::DoubleShot => Some(1),
            UpgradeId::MoveSpeed | UpgradeId::BuyHoming | UpgradeId::BuyShield => Some(10),
            _ => Some(5),
        }
    }

    fn apply(self, player: &mut Player) {
        match self {
            UpgradeId::RecoverHealth => player.heal_full(),
            UpgradeId::FireRate => {
                player.weapon.fire_rate_ms = (player.weapon.fire_rate_ms * 0.8).floor().max(60.0);
            }
            UpgradeId::ProjectileSpeed => player.weapon.bullet_speed_bonus += 3.0,
            UpgradeId::FireSpread => player.weapon.spread = true,
            UpgradeId::DoubleShot => player.weapon.double_shot = true,
            UpgradeId::DoubleDamage => {
                player.weapon.bullet_damage = (f64::from(player.weapon.bullet_damage) * 1.5).floor() as u32;
            }
            UpgradeId::MaxHealth => {
                player.max_health = (player.max_health * 1.25).floor();
                player.heal_full();
            }
            UpgradeId::MoveSpeed => player.speed += 1.0,
            UpgradeId::Piercing => player.weapon.pierce += 1,
            UpgradeId::HealthRegen => player.regen_per_sec += 2.0,
            UpgradeId::BuyHoming => player.add_charges(PowerupKind::HomingMissiles, 2),
            UpgradeId::BuyShield => player.add_charges(PowerupKind::ShieldBubble, 1),
        }
    }
}

/// Purchase counts for the whole game
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpgradeLevels {
    levels: BTreeMap<UpgradeId, u32>,
}

impl UpgradeLevels {
    pub fn level(&self, id: UpgradeId) -> u32 {
        self.levels.get(&id).copied().unwrap_or(0)
    }

    pub fn is_maxed(&self, id: UpgradeId) -> bool {
        id.max_level().is_some_and(|max| self.level(id) >= max)
    }

    fn bump(&mut self, id: UpgradeId) {
        *self.levels.entry(id).or_insert(0) += 1;
    }
}

/// Why the shop is open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShopOrigin {
    /// After a boss kill; offers a reward-gated bonus
    Boss { kind: BossKind, index: u32 },
    /// After a revive
    Revive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Offer {
    pub upgrade: UpgradeId,
    pub purchased: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpgradeShop {
    pub origin: ShopOrigin,
    pub offers: Vec<Offer>,
    /// Every upgrade shown during this visit (refreshes avoid repeats)
    seen: BTreeSet<UpgradeId>,
    /// Reward-gated bonus already granted
    pub bonus_claimed: bool,
}

impl UpgradeShop {
    /// Recover health first, then up to three random non-maxed upgrades
    pub fn open(origin: ShopOrigin, levels: &UpgradeLevels, rng: &mut impl Rng) -> Self {
        let mut candidates: Vec<UpgradeId> = UpgradeId::POOL
            .into_iter()
            .filter(|id| !levels.is_maxed(*id))
            .collect();
        candidates.shuffle(rng);
        candidates.truncate(RANDOM_OFFERS);

        let mut offers = vec![Offer {
            upgrade: UpgradeId::RecoverHealth,
            purchased: false,
        }];
        offers.extend(candidates.iter().map(|&upgrade| Offer {
            upgrade,
            purchased: false,
        }));
        Self {
            origin,
            seen: candidates.into_iter().collect(),
            offers,
            bonus_claimed: false,
        }
    }

    /// Buy the offer at `index`
    pub fn purchase(
        &mut self,
        index: usize,
        player: &mut Player,
        levels: &mut UpgradeLevels,
        rng: &mut impl Rng,
    ) -> Result<UpgradeId, ActionError> {
        let offer = *self.offers.get(index).ok_or(ActionError::InvalidChoice)?;
        if offer.purchased {
            return Err(ActionError::AlreadyPurchased);
        }
        let cost = offer.upgrade.cost();
        if player.score < cost {
            return Err(ActionError::InsufficientCredits {
                cost,
                available: player.score,
            });
        }
        if levels.is_maxed(offer.upgrade) {
            return Err(ActionError::UpgradeMaxed(offer.upgrade.name()));
        }

        player.score -= cost;
        offer.upgrade.apply(player);
        levels.bump(offer.upgrade);
        self.offers[index].purchased = true;
        log::debug!("Purchased {} for {cost} credits", offer.upgrade.name());

        self.refresh(levels, rng);
        Ok(offer.upgrade)
    }

    /// Replace purchased random offers with unseen, non-maxed upgrades
    fn refresh(&mut self, levels: &UpgradeLevels, rng: &mut impl Rng) {
        for i in 1..self.offers.len() {
            if !self.offers[i].purchased {
                continue;
            }
            let candidates: Vec<UpgradeId> = UpgradeId::POOL
                .into_iter()
                .filter(|id| !self.seen.contains(id) && !levels.is_maxed(*id))
                .collect();
            if candidates.is_empty() {
                break;
            }
            let pick = candidates[rng.random_range(0..candidates.len())];
            self.seen.insert(pick);
            self.offers[i] = Offer {
                upgrade: pick,
                purchased: false,
            };
        }
    }

    /// The reward-gated bonus available in this shop, if any
    pub fn bonus(&self) -> Option<ShopBonus> {
        match self.origin {
            _ if self.bonus_claimed => None,
            ShopOrigin::Boss {
                kind: BossKind::Intermediate,
                index,
            } => Some(ShopBonus::Credits { boss_index: index }),
            ShopOrigin::Boss {
                kind: BossKind::Final,
                index,
            } => Some(ShopBonus::SpecialPower { boss_index: index }),
            ShopOrigin::Revive => None,
        }
    }

    /// Closing this shop starts the next round
    pub fn ends_round(&self) -> bool {
        matches!(
            self.origin,
            ShopOrigin::Boss {
                kind: BossKind::Final,
                ..
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShopBonus {
    Credits { boss_index: u32 },
    SpecialPower { boss_index: u32 },
}

/// One-shot powers granted by the final-boss reward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpecialPower {
    ShieldBarrier,
    TimeSlow,
    MegaDamage,
    Invincibility,
    RapidFire,
}

impl SpecialPower {
    pub const ALL: [SpecialPower; 5] = [
        SpecialPower::ShieldBarrier,
        SpecialPower::TimeSlow,
        SpecialPower::MegaDamage,
        SpecialPower::Invincibility,
        SpecialPower::RapidFire,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SpecialPower::ShieldBarrier => "Shield Barrier",
            SpecialPower::TimeSlow => "Time Slow",
            SpecialPower::MegaDamage => "Mega Damage",
            SpecialPower::Invincibility => "Invincibility",
            SpecialPower::RapidFire => "Rapid Fire",
        }
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    pub fn apply(self, player: &mut Player, now_ms: f64) {
        match self {
            SpecialPower::ShieldBarrier => player.shield += 100.0,
            SpecialPower::TimeSlow => player.effects.activate(EffectKind::SlowTime, now_ms, 30_000.0),
            SpecialPower::MegaDamage => {
                player
                    .effects
                    .activate(EffectKind::MegaDamage, now_ms, EffectKind::MegaDamage.default_duration_ms());
            }
            SpecialPower::Invincibility => {
                player.effects.activate(
                    EffectKind::Invincibility,
                    now_ms,
                    EffectKind::Invincibility.default_duration_ms(),
                );
            }
            SpecialPower::RapidFire => {
                player
                    .effects
                    .activate(EffectKind::RapidFire, now_ms, EffectKind::RapidFire.default_duration_ms());
            }
        }
    }
}

/// Spin result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WheelPrize {
    pub powerup: PowerupKind,
    pub count: u32,
    pub doubled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum WheelStage {
    Ready,
    Spinning { speed: f32 },
    Done(WheelPrize),
}

/// Power-up wheel shown at the start of each round
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RewardWheel {
    pub angle: f32,
    pub stage: WheelStage,
}

impl Default for RewardWheel {
    fn default() -> Self {
        Self::new()
    }
}

impl RewardWheel {
    const FRICTION: f32 = 0.98;
    const STOP_SPEED: f32 = 0.02;

    pub fn new() -> Self {
        Self {
            angle: 0.0,
            stage: WheelStage::Ready,
        }
    }

    pub fn spin(&mut self, rng: &mut impl Rng) -> Result<(), ActionError> {
        if self.stage != WheelStage::Ready {
            return Err(ActionError::WrongPhase);
        }
        self.stage = WheelStage::Spinning {
            speed: rng.random_range(0.5..1.0),
        };
        Ok(())
    }

    /// Advance the spin animation; picks the prize once it slows down
    pub fn update(&mut self, delta: f32, rng: &mut impl Rng) {
        let WheelStage::Spinning { speed } = self.stage else {
            return;
        };
        self.angle += speed * delta;
        let speed = speed * Self::FRICTION.powf(delta);
        if speed >= Self::STOP_SPEED {
            self.stage = WheelStage::Spinning { speed };
            return;
        }

        let slice = TAU / PowerupKind::ALL.len() as f32;
        let pointer = (self.angle.rem_euclid(TAU) + FRAC_PI_2).rem_euclid(TAU);
        let sector = ((pointer / slice) as usize) % PowerupKind::ALL.len();
        let prize = WheelPrize {
            powerup: PowerupKind::ALL[sector],
            count: rng.random_range(1..=2),
            doubled: false,
        };
        log::debug!("Wheel result: {} x{}", prize.powerup.name(), prize.count);
        self.stage = WheelStage::Done(prize);
    }

    pub fn prize(&self) -> Option<WheelPrize> {
        match self.stage {
            WheelStage::Done(prize) => Some(prize),
            _ => None,
        }
    }

    /// Double the prize once (after a granted reward)
    pub fn double(&mut self) -> Result<WheelPrize, ActionError> {
        let WheelStage::Done(mut prize) = self.stage else {
            return Err(ActionError::WheelNotReady);
        };
        if prize.doubled {
            return Err(ActionError::AlreadyDoubled);
        }
        prize.count *= 2;
        prize.doubled = true;
        self.stage = WheelStage::Done(prize);
        Ok(prize)
    }
}

/// Letter grade for a finished round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rating {
    S,
    A,
    B,
    C,
    D,
}

impl Rating {
    /// Points from accuracy (%), duration (s) and damage taken
    pub fn from_performance(accuracy: u32, duration_secs: u64, damage_taken: f32) -> Self {
        let mut points = match accuracy {
            80.. => 40,
            60..=79 => 30,
            40..=59 => 20,
            _ => 10,
        };
        points += match duration_secs {
            0..=120 => 30,
            121..=180 => 20,
            181..=240 => 10,
            _ => 0,
        };
        points += if damage_taken <= 200.0 {
            30
        } else if damage_taken <= 400.0 {
            20
        } else if damage_taken <= 600.0 {
            10
        } else {
            0
        };
        match points {
            85.. => Rating::S,
            70..=84 => Rating::A,
            50..=69 => Rating::B,
            30..=49 => Rating::C,
            _ => Rating::D,
        }
    }
}

/// End-of-round report shown after the final boss
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BattleSummary {
    pub round: u32,
    /// Final boss that closed the round
    pub boss_index: u32,
    pub duration_secs: u64,
    pub score: u64,
    pub accuracy: u32,
    pub difficulty: u32,
    pub shots_fired: u32,
    pub shots_hit: u32,
    pub damage_dealt: u64,
    pub damage_taken: f32,
    pub enemies_killed: u32,
    pub bosses_defeated: u32,
    pub credits_earned: u64,
    pub rating: Rating,
}

impl BattleSummary {
    pub fn new(
        round: u32,
        boss_index: u32,
        duration_ms: f64,
        score: u64,
        difficulty: u32,
        stats: &RoundStats,
    ) -> Self {
        let duration_secs = (duration_ms.max(0.0) / 1000.0).floor() as u64;
        let accuracy = stats.accuracy();
        Self {
            round,
            boss_index,
            duration_secs,
            score,
            accuracy,
            difficulty,
            shots_fired: stats.shots_fired,
            shots_hit: stats.shots_hit,
            damage_dealt: stats.damage_dealt,
            damage_taken: stats.damage_taken,
            enemies_killed: stats.enemies_killed,
            bosses_defeated: stats.bosses_defeated,
            credits_earned: stats.credits_earned,
            rating: Rating::from_performance(accuracy, duration_secs, stats.damage_taken),
        }
    }
}
