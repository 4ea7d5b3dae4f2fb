//! Normalised input
//!
//! The host samples its devices through `InputSource` and hands the result to
//! the simulation as a `TickInput`. Discrete intents (menu clicks, hotkeys)
//! arrive as `Command`s.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::effects::PowerupKind;

/// Held movement actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
}

/// Device-independent input queries provided by the host
pub trait InputSource {
    fn is_action_held(&self, action: Action) -> bool;
    /// Pointer position in playfield coordinates, if a pointer is present
    fn pointer_position(&self) -> Option<Vec2>;
    /// Normalised swipe direction (zero when idle)
    fn swipe_vector(&self) -> Vec2;
}

/// Discrete player intents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    StartGame,
    TogglePause,
    Resume,
    QuitToTitle,
    ActivatePowerup(PowerupKind),
    SpinWheel,
    ClaimWheel,
    PurchaseUpgrade(usize),
    CloseShop,
    ContinueSummary,
    Restart,
    DismissMessage,
}

/// Everything the simulation reads from the host for one frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Wall-clock timestamp of this frame
    pub now_ms: f64,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub swipe: Vec2,
    pub pointer: Option<Vec2>,
    /// Host finished loading assets
    pub assets_ready: bool,
    /// Window/tab lost focus since the last frame
    pub focus_lost: bool,
    pub commands: Vec<Command>,
}

impl TickInput {
    /// Empty input at a timestamp
    pub fn at(now_ms: f64) -> Self {
        Self {
            now_ms,
            assets_ready: true,
            ..Default::default()
        }
    }

    /// Sample held actions, pointer and swipe from an input source
    pub fn sample(source: &impl InputSource, now_ms: f64) -> Self {
        Self {
            now_ms,
            left: source.is_action_held(Action::MoveLeft),
            right: source.is_action_held(Action::MoveRight),
            up: source.is_action_held(Action::MoveUp),
            down: source.is_action_held(Action::MoveDown),
            swipe: source.swipe_vector(),
            pointer: source.pointer_position(),
            assets_ready: true,
            ..Default::default()
        }
    }

    pub fn with_command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Keyboard direction, one unit per held axis
    pub fn movement(&self) -> Vec2 {
        let axis = |neg: bool, pos: bool| f32::from(u8::from(pos)) - f32::from(u8::from(neg));
        Vec2::new(axis(self.left, self.right), axis(self.up, self.down))
    }
}
