//! Phase state machine
//!
//! Player commands, the loading/countdown sequence and the transitions fired
//! by the tick (boss defeat, death, round end). Rejected commands change
//! nothing and are reported to the player as flash messages.

use super::collision::DefeatedBoss;
use super::economy::{BattleSummary, RewardWheel, ShopOrigin, UpgradeShop};
use super::events::GameEvent;
use super::input::Command;
use super::state::{Countdown, GamePhase, GameState, Overlay};
use crate::error::ActionError;
use crate::tuning::BossKind;

const FLASH_MS: u32 = 2000;

impl GameState {
    pub(crate) fn set_phase(&mut self, phase: GamePhase) {
        if self.phase == phase {
            return;
        }
        log::info!("Phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
        self.events.push(GameEvent::PhaseChanged { phase });
    }

    /// Apply a batch of commands, flashing the reason for each rejection
    pub fn handle_commands(&mut self, commands: &[Command]) {
        for &command in commands {
            if let Err(e) = self.apply_command(command) {
                log::debug!("{command:?} rejected: {e}");
                self.events.flash(e.to_string(), FLASH_MS);
            }
        }
    }

    /// Apply one player command. Errors leave the state untouched.
    pub fn apply_command(&mut self, command: Command) -> Result<(), ActionError> {
        if self.pending_reward.is_some() && command != Command::DismissMessage {
            return Err(ActionError::RewardInProgress);
        }

        match command {
            Command::StartGame => {
                if self.phase != GamePhase::Title {
                    return Err(ActionError::WrongPhase);
                }
                self.start_countdown();
            }
            Command::TogglePause => match (&self.overlay, self.phase) {
                (Overlay::None, GamePhase::Playing) => self.overlay = Overlay::Paused,
                (Overlay::Paused, GamePhase::Playing) => self.overlay = Overlay::None,
                _ => return Err(ActionError::WrongPhase),
            },
            Command::Resume => {
                if self.overlay != Overlay::Paused {
                    return Err(ActionError::WrongPhase);
                }
                self.overlay = Overlay::None;
            }
            Command::QuitToTitle => {
                if self.overlay != Overlay::Paused && self.phase != GamePhase::GameOver {
                    return Err(ActionError::WrongPhase);
                }
                self.reset_session();
                self.set_phase(GamePhase::Title);
            }
            Command::ActivatePowerup(kind) => {
                if !self.should_simulate() {
                    return Err(ActionError::WrongPhase);
                }
                if let Some(active) = self.player.effects.active_inventory_effect() {
                    return Err(ActionError::EffectActive(active.name()));
                }
                if !self.player.take_charge(kind) {
                    return Err(ActionError::NoCharges);
                }
                let effect = kind.effect();
                self.player
                    .effects
                    .activate(effect, self.clock.sim_ms, effect.default_duration_ms());
                log::debug!("{} activated", kind.name());
                self.events
                    .flash(format!("{} ACTIVATED!", kind.name().to_uppercase()), FLASH_MS);
            }
            Command::SpinWheel => {
                let Overlay::RewardWheel(wheel) = &mut self.overlay else {
                    return Err(ActionError::WrongPhase);
                };
                wheel.spin(&mut self.rng)?;
            }
            Command::ClaimWheel => {
                let Overlay::RewardWheel(wheel) = &self.overlay else {
                    return Err(ActionError::WrongPhase);
                };
                let prize = wheel.prize().ok_or(ActionError::WheelNotReady)?;
                self.player.add_charges(prize.powerup, prize.count);
                self.overlay = Overlay::None;
                self.events
                    .flash(format!("+{} {}", prize.count, prize.powerup.name()), FLASH_MS);
            }
            Command::PurchaseUpgrade(index) => {
                let GameState {
                    overlay,
                    player,
                    upgrades,
                    rng,
                    events,
                    ..
                } = self;
                let Overlay::UpgradeShop(shop) = overlay else {
                    return Err(ActionError::WrongPhase);
                };
                let bought = shop.purchase(index, player, upgrades, rng)?;
                events.flash(format!("Purchased {}!", bought.name()), FLASH_MS);
                events.push(GameEvent::ScoreChanged {
                    score: player.score,
                    gained: 0,
                });
            }
            Command::CloseShop => {
                let Overlay::UpgradeShop(shop) = &self.overlay else {
                    return Err(ActionError::WrongPhase);
                };
                let ends_round = shop.ends_round();
                self.overlay = Overlay::None;
                if ends_round {
                    self.advance_round();
                }
            }
            Command::ContinueSummary => {
                let Overlay::BattleSummary(summary) = &self.overlay else {
                    return Err(ActionError::WrongPhase);
                };
                let origin = ShopOrigin::Boss {
                    kind: BossKind::Final,
                    index: summary.boss_index,
                };
                self.overlay = Overlay::UpgradeShop(UpgradeShop::open(origin, &self.upgrades, &mut self.rng));
            }
            Command::Restart => {
                if self.phase != GamePhase::GameOver {
                    return Err(ActionError::WrongPhase);
                }
                self.reset_session();
                self.start_countdown();
            }
            Command::DismissMessage => self.failure_message = None,
        }
        Ok(())
    }

    /// Loading -> Title once the host has its assets
    pub(crate) fn update_loading(&mut self, assets_ready: bool) {
        if self.phase == GamePhase::Loading && assets_ready {
            self.set_phase(GamePhase::Title);
        }
    }

    pub(crate) fn start_countdown(&mut self) {
        self.countdown = Countdown {
            value: self.tuning.countdown_ticks,
            step_started_ms: self.clock.wall_ms,
        };
        self.set_phase(GamePhase::Countdown);
    }

    /// Step the wall-clock countdown; starts play when it reaches zero
    pub(crate) fn update_countdown(&mut self) {
        if self.phase != GamePhase::Countdown {
            return;
        }
        let step = self.tuning.countdown_step_ms;
        while self.countdown.value > 0 && self.clock.wall_ms - self.countdown.step_started_ms >= step {
            self.countdown.value -= 1;
            self.countdown.step_started_ms += step;
        }
        if self.countdown.value == 0 {
            self.begin_play();
        }
    }

    fn begin_play(&mut self) {
        self.set_phase(GamePhase::Playing);
        self.round_started_ms = self.clock.sim_ms;
        self.overlay = Overlay::RewardWheel(RewardWheel::new());
        self.events.push(GameEvent::RoundStarted { round: self.round });
    }

    /// Pause when the window loses focus mid-play
    pub(crate) fn auto_pause(&mut self, focus_lost: bool) {
        if focus_lost && self.should_simulate() {
            log::debug!("Focus lost, pausing");
            self.overlay = Overlay::Paused;
        }
    }

    pub(crate) fn on_boss_defeated(&mut self, defeated: DefeatedBoss) {
        self.credit_boss_kill(defeated);
        self.overlay = self.boss_overlay(defeated);
    }

    /// Difficulty bookkeeping for a dead boss; applies even if the player died too
    pub(crate) fn credit_boss_kill(&mut self, defeated: DefeatedBoss) {
        self.registry.clear_enemies();
        self.bosses_defeated += 1;
        let difficulty = self.difficulty_level();
        self.events.push(GameEvent::BossDefeated {
            kind: defeated.kind,
            index: defeated.index,
            difficulty,
        });
        self.events.flash(format!("Difficulty Level {difficulty}!"), FLASH_MS);
    }

    /// Shop after an intermediate boss, summary after the final one
    pub(crate) fn boss_overlay(&mut self, defeated: DefeatedBoss) -> Overlay {
        match defeated.kind {
            BossKind::Intermediate => Overlay::UpgradeShop(UpgradeShop::open(
                ShopOrigin::Boss {
                    kind: defeated.kind,
                    index: defeated.index,
                },
                &self.upgrades,
                &mut self.rng,
            )),
            BossKind::Final => Overlay::BattleSummary(BattleSummary::new(
                self.round,
                defeated.index,
                self.clock.sim_ms - self.round_started_ms,
                self.player.score,
                self.difficulty_level(),
                &self.player.stats,
            )),
        }
    }

    pub(crate) fn on_player_death(&mut self) {
        self.player.health = 0.0;
        self.overlay = Overlay::None;
        self.set_phase(GamePhase::GameOver);
        self.events.flash("GAME OVER", 3000);
    }

    /// Next round: reset distance, triggers, enemies and stats, then show the wheel
    pub(crate) fn advance_round(&mut self) {
        self.round += 1;
        self.round_distance = 0.0;
        self.round_started_ms = self.clock.sim_ms;
        self.spawner.reset_round(self.tuning.boss_triggers.len());
        self.registry.clear_enemies();
        self.player.stats = Default::default();
        self.overlay = Overlay::RewardWheel(RewardWheel::new());
        log::info!("Round {} (difficulty {})", self.round, self.difficulty_level());
        self.events.push(GameEvent::RoundStarted { round: self.round });
        self.events.flash(
            format!("ROUND {} - Difficulty Level {}!", self.round, self.difficulty_level()),
            3000,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::economy::{WheelPrize, WheelStage};
    use crate::sim::effects::{EffectKind, PowerupKind};

    fn playing() -> GameState {
        let mut state = GameState::new(11);
        state.phase = GamePhase::Playing;
        state
    }

    #[test]
    fn test_loading_then_countdown_then_wheel() {
        let mut state = GameState::new(11);
        state.update_loading(false);
        assert_eq!(state.phase, GamePhase::Loading);
        state.update_loading(true);
        assert_eq!(state.phase, GamePhase::Title);

        state.clock.begin_frame(10_000.0);
        state.apply_command(Command::StartGame).unwrap();
        assert_eq!(state.phase, GamePhase::Countdown);
        assert_eq!(state.countdown.value, 3);

        state.clock.begin_frame(11_500.0);
        state.update_countdown();
        assert_eq!(state.countdown.value, 2);
        state.clock.begin_frame(13_000.0);
        state.update_countdown();
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(matches!(state.overlay, Overlay::RewardWheel(_)));
        assert!(!state.should_simulate());
    }

    #[test]
    fn test_pause_toggle() {
        let mut state = playing();
        state.apply_command(Command::TogglePause).unwrap();
        assert_eq!(state.overlay, Overlay::Paused);
        state.apply_command(Command::TogglePause).unwrap();
        assert!(state.should_simulate());

        state.overlay = Overlay::RewardWheel(RewardWheel::new());
        assert_eq!(state.apply_command(Command::TogglePause), Err(ActionError::WrongPhase));
    }

    #[test]
    fn test_focus_loss_pauses_only_live_play() {
        let mut state = playing();
        state.auto_pause(true);
        assert_eq!(state.overlay, Overlay::Paused);

        let mut state = playing();
        state.overlay = Overlay::RewardWheel(RewardWheel::new());
        state.auto_pause(true);
        assert!(matches!(state.overlay, Overlay::RewardWheel(_)));
    }

    #[test]
    fn test_quit_resets_to_title() {
        let mut state = playing();
        state.player.score = 500;
        state.round = 3;
        state.overlay = Overlay::Paused;
        state.apply_command(Command::QuitToTitle).unwrap();
        assert_eq!(state.phase, GamePhase::Title);
        assert_eq!(state.player.score, 0);
        assert_eq!(state.round, 1);
    }

    #[test]
    fn test_one_inventory_powerup_at_a_time() {
        let mut state = playing();
        assert_eq!(
            state.apply_command(Command::ActivatePowerup(PowerupKind::SlowTime)),
            Err(ActionError::NoCharges)
        );
        state.player.add_charges(PowerupKind::SlowTime, 1);
        state.player.add_charges(PowerupKind::UltraDamage, 1);
        state.apply_command(Command::ActivatePowerup(PowerupKind::SlowTime)).unwrap();
        assert!(state.player.effects.is_active(EffectKind::SlowTime));
        assert_eq!(
            state.apply_command(Command::ActivatePowerup(PowerupKind::UltraDamage)),
            Err(ActionError::EffectActive("Slow Time"))
        );
        assert_eq!(state.player.charges(PowerupKind::UltraDamage), 1);
    }

    #[test]
    fn test_claim_wheel_adds_charges() {
        let mut state = playing();
        let mut wheel = RewardWheel::new();
        state.overlay = Overlay::RewardWheel(wheel.clone());
        assert_eq!(state.apply_command(Command::ClaimWheel), Err(ActionError::WheelNotReady));
        wheel.stage = WheelStage::Done(WheelPrize {
            powerup: PowerupKind::HomingMissiles,
            count: 4,
            doubled: true,
        });
        state.overlay = Overlay::RewardWheel(wheel);
        state.apply_command(Command::ClaimWheel).unwrap();
        assert_eq!(state.player.charges(PowerupKind::HomingMissiles), 4);
        assert!(state.should_simulate());
    }

    #[test]
    fn test_boss_defeat_opens_shop_or_summary() {
        let mut state = playing();
        state.on_boss_defeated(DefeatedBoss {
            kind: BossKind::Intermediate,
            index: 0,
        });
        assert_eq!(state.bosses_defeated, 1);
        assert!(matches!(&state.overlay, Overlay::UpgradeShop(shop) if !shop.ends_round()));
        state.apply_command(Command::CloseShop).unwrap();
        assert_eq!(state.round, 1);

        state.on_boss_defeated(DefeatedBoss {
            kind: BossKind::Final,
            index: 2,
        });
        assert!(matches!(state.overlay, Overlay::BattleSummary(_)));
        state.apply_command(Command::ContinueSummary).unwrap();
        assert!(matches!(&state.overlay, Overlay::UpgradeShop(shop) if shop.ends_round()));
        state.apply_command(Command::CloseShop).unwrap();
        assert_eq!(state.round, 2);
        assert_eq!(state.difficulty_level(), 3);
        assert!(matches!(state.overlay, Overlay::RewardWheel(_)));
    }

    #[test]
    fn test_pending_reward_blocks_commands() {
        let mut state = playing();
        state.overlay = Overlay::Paused;
        state.pending_reward = Some(crate::sim::reward::RewardRequest {
            ticket: 1,
            kind: crate::sim::reward::RewardKind::Revive,
            context: "revive".to_string(),
        });
        state.failure_message = Some("old".to_string());
        assert_eq!(state.apply_command(Command::Resume), Err(ActionError::RewardInProgress));
        state.apply_command(Command::DismissMessage).unwrap();
        assert!(state.failure_message.is_none());
    }

    #[test]
    fn test_restart_from_game_over() {
        let mut state = playing();
        state.on_player_death();
        assert_eq!(state.phase, GamePhase::GameOver);
        state.handle_commands(&[Command::TogglePause]);
        assert!(state.events.iter().any(|e| matches!(e, GameEvent::Flash { text, .. } if text == "Not available right now")));
        state.apply_command(Command::Restart).unwrap();
        assert_eq!(state.phase, GamePhase::Countdown);
        assert_eq!(state.player.health, state.player.max_health);
    }
}
