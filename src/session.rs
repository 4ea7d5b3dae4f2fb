//! Frame driver and reward collaborator seam
//!
//! `Session` owns the world, the persisted cooldowns and the host's reward
//! gate. Each frame it ticks the simulation and then applies any verdicts the
//! gate has produced. The gate decides; the core only validates requests and
//! applies outcomes.

use std::collections::VecDeque;

use crate::error::ActionError;
use crate::persistence::CooldownStore;
use crate::sim::{GameEvent, GameState, RenderSnapshot, RewardKind, RewardRequest, RewardVerdict, TickInput, tick};

/// External reward verification (ads, anti-abuse, ...)
pub trait RewardGate {
    /// Start verifying a request; the verdict arrives later through `poll`
    fn submit(&mut self, request: &RewardRequest);
    /// Next finished verification, if any
    fn poll(&mut self) -> Option<(u64, RewardVerdict)>;
}

/// Gate that answers from a script, one verdict per request.
/// Grants once the script runs out.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGate {
    script: VecDeque<RewardVerdict>,
    submitted: VecDeque<u64>,
}

impl ScriptedGate {
    pub fn new(script: impl IntoIterator<Item = RewardVerdict>) -> Self {
        Self {
            script: script.into_iter().collect(),
            submitted: VecDeque::new(),
        }
    }
}

impl RewardGate for ScriptedGate {
    fn submit(&mut self, request: &RewardRequest) {
        self.submitted.push_back(request.ticket);
    }

    fn poll(&mut self) -> Option<(u64, RewardVerdict)> {
        let ticket = self.submitted.pop_front()?;
        let verdict = self.script.pop_front().unwrap_or(RewardVerdict::Granted);
        Some((ticket, verdict))
    }
}

pub struct Session<G: RewardGate> {
    pub state: GameState,
    pub cooldowns: CooldownStore,
    gate: G,
}

impl<G: RewardGate> Session<G> {
    pub fn new(state: GameState, cooldowns: CooldownStore, gate: G) -> Self {
        Self { state, cooldowns, gate }
    }

    /// Tick once, then apply finished reward verifications
    pub fn frame(&mut self, input: &TickInput) {
        tick(&mut self.state, input);
        self.apply_verdicts(input.now_ms);
    }

    /// Ask the gate for a reward. Rejections are flashed and returned.
    pub fn request_reward(&mut self, kind: RewardKind, now_ms: f64) -> Result<u64, ActionError> {
        match self.state.request_reward(kind, &self.cooldowns, now_ms) {
            Ok(request) => {
                self.gate.submit(&request);
                Ok(request.ticket)
            }
            Err(e) => {
                log::debug!("Reward {} rejected: {e}", kind.as_str());
                self.state.events.flash(e.to_string(), 2000);
                Err(e)
            }
        }
    }

    fn apply_verdicts(&mut self, now_ms: f64) {
        while let Some((ticket, verdict)) = self.gate.poll() {
            let key = self
                .state
                .pending_reward
                .as_ref()
                .filter(|r| r.ticket == ticket)
                .map(RewardRequest::cooldown_key);
            let granted = verdict == RewardVerdict::Granted;

            if let Err(e) = self.state.complete_reward(ticket, verdict) {
                log::warn!("Ignoring verdict: {e}");
                continue;
            }
            if let (true, Some(key)) = (granted, key) {
                self.cooldowns.record(&key, now_ms);
                self.persist_cooldowns();
            }
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn persist_cooldowns(&self) {
        if let Err(e) = self.cooldowns.save() {
            log::warn!("Failed to save reward cooldowns: {e}");
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn persist_cooldowns(&self) {}

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.events.drain()
    }

    pub fn snapshot(&self, now_ms: f64) -> RenderSnapshot {
        RenderSnapshot::capture(&self.state, &self.cooldowns, now_ms)
    }

    pub fn gate(&self) -> &G {
        &self.gate
    }

    pub fn gate_mut(&mut self) -> &mut G {
        &mut self.gate
    }
}
