//! Reward-gated actions
//!
//! Revive, boss bonuses and wheel doubling are granted by an external
//! collaborator. The core checks pre-conditions, records a pending request
//! (which blocks simulation) and applies the verdict when the host reports it.
//! A denial never grants anything and leaves the phase and overlay as they were.

use serde::{Deserialize, Serialize};

use super::economy::{ShopBonus, ShopOrigin, SpecialPower, UpgradeShop};
use super::events::GameEvent;
use super::state::{GamePhase, GameState, Overlay};
use crate::error::ActionError;
use crate::persistence::CooldownStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RewardKind {
    /// Continue after game over
    Revive,
    /// Credits after an intermediate boss
    BonusCredits,
    /// Random special power after the final boss
    SpecialPower,
    /// Double the wheel prize
    WheelDouble,
}

impl RewardKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RewardKind::Revive => "revive",
            RewardKind::BonusCredits => "bonus",
            RewardKind::SpecialPower => "special",
            RewardKind::WheelDouble => "wheel",
        }
    }
}

/// An outstanding verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardRequest {
    pub ticket: u64,
    pub kind: RewardKind,
    /// Cooldown context (`revive`, `wheel`, `r{round}_b{boss}`)
    pub context: String,
}

impl RewardRequest {
    /// Key under which the collaborator records the grant
    pub fn cooldown_key(&self) -> String {
        CooldownStore::key(self.kind.as_str(), &self.context)
    }
}

/// The collaborator's answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardVerdict {
    Granted,
    Denied { reason: String },
}

impl GameState {
    /// Persisted cooldown for a reward kind
    pub fn reward_cooldown_ms(&self, kind: RewardKind) -> f64 {
        match kind {
            RewardKind::Revive => self.tuning.revive_cooldown_ms,
            RewardKind::WheelDouble => self.tuning.wheel_cooldown_ms,
            RewardKind::BonusCredits | RewardKind::SpecialPower => self.tuning.boss_reward_cooldown_ms,
        }
    }

    /// Cooldown context for `kind` in the current state, if the reward is on offer
    pub fn reward_context(&self, kind: RewardKind) -> Result<String, ActionError> {
        match kind {
            RewardKind::Revive => {
                if self.phase == GamePhase::GameOver {
                    Ok("revive".to_string())
                } else {
                    Err(ActionError::WrongPhase)
                }
            }
            RewardKind::BonusCredits | RewardKind::SpecialPower => {
                let Overlay::UpgradeShop(shop) = &self.overlay else {
                    return Err(ActionError::WrongPhase);
                };
                match (kind, shop.bonus()) {
                    (RewardKind::BonusCredits, Some(ShopBonus::Credits { boss_index }))
                    | (RewardKind::SpecialPower, Some(ShopBonus::SpecialPower { boss_index })) => {
                        Ok(format!("r{}_b{}", self.round, boss_index))
                    }
                    _ => Err(ActionError::WrongPhase),
                }
            }
            RewardKind::WheelDouble => {
                let Overlay::RewardWheel(wheel) = &self.overlay else {
                    return Err(ActionError::WrongPhase);
                };
                match wheel.prize() {
                    None => Err(ActionError::WheelNotReady),
                    Some(prize) if prize.doubled => Err(ActionError::AlreadyDoubled),
                    Some(_) => Ok("wheel".to_string()),
                }
            }
        }
    }

    /// Validate and record a reward request. `now_ms` is wall-clock time.
    pub fn request_reward(
        &mut self,
        kind: RewardKind,
        cooldowns: &CooldownStore,
        now_ms: f64,
    ) -> Result<RewardRequest, ActionError> {
        if self.pending_reward.is_some() {
            return Err(ActionError::RewardInProgress);
        }
        let context = self.reward_context(kind)?;
        let key = CooldownStore::key(kind.as_str(), &context);
        let remaining = cooldowns.remaining_ms(&key, self.reward_cooldown_ms(kind), now_ms);
        if remaining > 0.0 {
            return Err(ActionError::RewardOnCooldown {
                remaining_ms: remaining.ceil() as u64,
            });
        }

        let request = RewardRequest {
            ticket: self.next_ticket(),
            kind,
            context,
        };
        log::debug!("Reward requested: {} ({})", kind.as_str(), request.context);
        self.failure_message = None;
        self.pending_reward = Some(request.clone());
        Ok(request)
    }

    /// Apply the collaborator's verdict for `ticket`
    pub fn complete_reward(&mut self, ticket: u64, verdict: RewardVerdict) -> Result<(), ActionError> {
        let request = match self.pending_reward.take() {
            Some(request) if request.ticket == ticket => request,
            other => {
                self.pending_reward = other;
                return Err(ActionError::UnknownTicket(ticket));
            }
        };

        match verdict {
            RewardVerdict::Denied { reason } => {
                log::info!("Reward {} denied: {reason}", request.kind.as_str());
                self.events.flash(format!("Ad failed: {reason}"), 2000);
                self.failure_message = Some(reason);
                self.events.push(GameEvent::RewardResolved {
                    kind: request.kind,
                    granted: false,
                });
            }
            RewardVerdict::Granted => {
                log::info!("Reward {} granted", request.kind.as_str());
                self.grant(request.kind);
                self.events.push(GameEvent::RewardResolved {
                    kind: request.kind,
                    granted: true,
                });
            }
        }
        Ok(())
    }

    fn grant(&mut self, kind: RewardKind) {
        match kind {
            RewardKind::Revive => self.revive(),
            RewardKind::BonusCredits => {
                let Overlay::UpgradeShop(shop) = &mut self.overlay else {
                    log::warn!("Bonus credits granted with no shop open");
                    return;
                };
                shop.bonus_claimed = true;
                let credits = self.tuning.bonus_credits;
                self.player.score += credits;
                self.player.stats.credits_earned += credits;
                self.events.push(GameEvent::ScoreChanged {
                    score: self.player.score,
                    gained: credits,
                });
                self.events.flash(format!("+{credits} CREDITS!"), 2000);
            }
            RewardKind::SpecialPower => {
                let Overlay::UpgradeShop(shop) = &mut self.overlay else {
                    log::warn!("Special power granted with no shop open");
                    return;
                };
                shop.bonus_claimed = true;
                let power = SpecialPower::random(&mut self.rng);
                power.apply(&mut self.player, self.clock.sim_ms);
                self.events
                    .flash(format!("{} ACTIVATED!", power.name().to_uppercase()), 2000);
            }
            RewardKind::WheelDouble => {
                let Overlay::RewardWheel(wheel) = &mut self.overlay else {
                    log::warn!("Wheel double granted with no wheel open");
                    return;
                };
                match wheel.double() {
                    Ok(prize) => self.events.flash(
                        format!("Doubled! {} x{}", prize.powerup.name(), prize.count),
                        2000,
                    ),
                    Err(e) => log::warn!("Wheel double not applied: {e}"),
                }
            }
        }
    }

    /// Back into play with half health, an empty field and an upgrade shop
    fn revive(&mut self) {
        if self.phase != GamePhase::GameOver {
            log::warn!("Revive granted outside game over");
            return;
        }
        let half = (self.player.max_health / 2.0).floor();
        self.player.health = half.max(self.tuning.revive_min_health).min(self.player.max_health);
        self.player.bullets.clear();
        self.player.iframes.clear();
        self.registry.reset();
        self.schedule.clear();
        self.overlay = match self.unclaimed_boss.take() {
            Some(defeated) => self.boss_overlay(defeated),
            None => Overlay::UpgradeShop(UpgradeShop::open(
                ShopOrigin::Revive,
                &self.upgrades,
                &mut self.rng,
            )),
        };
        self.set_phase(GamePhase::Playing);
        self.events.flash("REVIVED!", 2000);
    }
}
