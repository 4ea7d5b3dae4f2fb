//! Adrenaline Assault entry point
//!
//! On native this runs a headless demo session driven by a simple bot and
//! logs the outcome. The web build is started from `platform::wasm_start`.
//!
//! Usage: `adrenaline-assault [tuning.json] [seed]`
//! `ADRENALINE_COOLDOWNS=path` loads and saves the reward cooldown file.

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::path::PathBuf;

    use adrenaline_assault::consts::NOMINAL_FRAME_MS;
    use adrenaline_assault::session::ScriptedGate;
    use adrenaline_assault::sim::economy::{ShopBonus, WheelStage};
    use adrenaline_assault::sim::{
        Command, GameEvent, GamePhase, GameState, Overlay, PowerupKind, RewardKind, RewardVerdict, TickInput,
    };
    use adrenaline_assault::{CooldownStore, Session, Tuning};

    /// Simulated frames before the demo gives up (about 20 minutes)
    const MAX_FRAMES: u32 = 72_000;

    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        let mut args = std::env::args().skip(1);
        let tuning = match args.next() {
            Some(path) => Tuning::from_json(&std::fs::read_to_string(path)?)?,
            None => Tuning::default(),
        };
        let seed = match args.next() {
            Some(s) => s.parse()?,
            None => 0xADDE_u64,
        };
        let cooldown_path = std::env::var_os("ADRENALINE_COOLDOWNS").map(PathBuf::from);
        let cooldowns = match &cooldown_path {
            Some(path) => CooldownStore::load_from(path)?,
            None => CooldownStore::new(),
        };

        // First ad is "closed early", the rest are watched
        let gate = ScriptedGate::new([RewardVerdict::Denied {
            reason: "closed early".to_string(),
        }]);
        let mut session = Session::new(GameState::with_tuning(seed, tuning), cooldowns, gate);
        let mut revives_left = 2;
        let mut now = 0.0;

        session.frame(&TickInput::at(now).with_command(Command::StartGame));
        for _ in 0..MAX_FRAMES {
            now += NOMINAL_FRAME_MS;
            let input = bot_input(&mut session, now, &mut revives_left);
            session.frame(&input);

            for event in session.drain_events() {
                match event {
                    GameEvent::Flash { text, .. } => log::info!("[{:>8.0}ms] {text}", now),
                    GameEvent::BossDefeated { kind, index, difficulty } => {
                        log::info!("{} boss #{index} down, difficulty {difficulty}", kind.as_str());
                    }
                    _ => {}
                }
            }

            if session.state.phase == GamePhase::GameOver && revives_left == 0 {
                break;
            }
        }

        let state = &session.state;
        log::info!(
            "Demo finished: round {}, score {}, difficulty {}, {} enemies killed this round",
            state.round,
            state.player.score,
            state.difficulty_level(),
            state.player.stats.enemies_killed
        );
        println!("{}", session.snapshot(now).to_json()?);

        if let Some(path) = cooldown_path {
            session.cooldowns.save_to(&path)?;
        }
        Ok(())
    }

    /// Reward the bot would like to ask for right now
    fn wanted_reward(state: &GameState, revives_left: u32) -> Option<RewardKind> {
        match (&state.phase, &state.overlay) {
            (GamePhase::GameOver, _) if revives_left > 0 => Some(RewardKind::Revive),
            (GamePhase::Playing, Overlay::UpgradeShop(shop)) if state.failure_message.is_none() => {
                match shop.bonus()? {
                    ShopBonus::Credits { .. } => Some(RewardKind::BonusCredits),
                    ShopBonus::SpecialPower { .. } => Some(RewardKind::SpecialPower),
                }
            }
            _ => None,
        }
    }

    /// Steer toward the nearest enemy's row and click through every menu
    fn bot_input(session: &mut Session<ScriptedGate>, now: f64, revives_left: &mut u32) -> TickInput {
        let mut input = TickInput::at(now);
        if session.state.pending_reward.is_some() {
            return input;
        }
        if let Some(kind) = wanted_reward(&session.state, *revives_left) {
            if kind == RewardKind::Revive {
                *revives_left -= 1;
            }
            if session.request_reward(kind, now).is_ok() {
                return input;
            }
        }

        let state = &session.state;
        match (&state.phase, &state.overlay) {
            (GamePhase::Playing, Overlay::RewardWheel(wheel)) => {
                input = match wheel.stage {
                    WheelStage::Ready => input.with_command(Command::SpinWheel),
                    WheelStage::Spinning { .. } => input,
                    WheelStage::Done(_) => input.with_command(Command::ClaimWheel),
                };
            }
            (GamePhase::Playing, Overlay::UpgradeShop(shop)) => {
                let affordable = shop
                    .offers
                    .iter()
                    .position(|o| !o.purchased && o.upgrade.cost() <= state.player.score);
                input = match affordable {
                    Some(index) => input.with_command(Command::PurchaseUpgrade(index)),
                    None => input
                        .with_command(Command::DismissMessage)
                        .with_command(Command::CloseShop),
                };
            }
            (GamePhase::Playing, Overlay::BattleSummary(summary)) => {
                log::info!(
                    "Round {} summary: rating {:?}, accuracy {}%, {}s",
                    summary.round,
                    summary.rating,
                    summary.accuracy,
                    summary.duration_secs
                );
                input = input.with_command(Command::ContinueSummary);
            }
            (GamePhase::Playing, Overlay::None) => {
                let me = state.player.rect.center();
                let target = state
                    .registry
                    .boss
                    .as_ref()
                    .map(|b| b.rect.center())
                    .or_else(|| state.registry.nearest_hostile(me));
                if let Some(target) = target {
                    input.up = target.y < me.y - 8.0;
                    input.down = target.y > me.y + 8.0;
                }
                let ready = PowerupKind::ALL
                    .into_iter()
                    .find(|k| state.player.charges(*k) > 0);
                if let Some(kind) = ready {
                    if state.player.effects.active_inventory_effect().is_none() {
                        input = input.with_command(Command::ActivatePowerup(kind));
                    }
                }
            }
            _ => {}
        }
        input
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    adrenaline_assault::platform::init_logging();
    log::info!("Adrenaline Assault (native) headless demo starting...");

    if let Err(e) = demo::run() {
        log::error!("Demo failed: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::wasm_start, this is just to satisfy the compiler
}
