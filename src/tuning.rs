//! Data-driven game balance
//!
//! Every number the simulation needs lives here so a host can ship a JSON
//! override without rebuilding. Missing fields fall back to the defaults.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Boss category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BossKind {
    /// Mid-round boss (cone volley, homing salvo once enraged)
    Intermediate,
    /// End-of-round boss (cone, spiral and homing salvo)
    Final,
}

impl BossKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BossKind::Intermediate => "mini",
            BossKind::Final => "final",
        }
    }
}

/// A scroll-distance boss trigger
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BossTrigger {
    /// Round scroll distance at which the boss appears
    pub distance: f32,
    pub kind: BossKind,
    /// Position of the trigger within the round (keys the boss reward cooldown)
    pub index: u32,
}

/// Balance and timing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Playfield size in pixels
    pub view_width: f32,
    pub view_height: f32,
    /// Total scrollable level width
    pub level_width: f32,
    /// Camera scroll per nominal frame
    pub base_scroll_speed: f32,
    /// Scroll distance that ends a round
    pub round_length: f32,
    /// Base enemy spawn interval (shrinks with difficulty)
    pub enemy_spawn_ms: f64,
    /// Post-damage invulnerability window
    pub iframe_duration_ms: f64,
    pub iframes_enabled: bool,
    /// Countdown ticks before play starts, and their length
    pub countdown_ticks: u32,
    pub countdown_step_ms: f64,
    /// Contact damage from a non-kamikaze enemy / a boss
    pub enemy_contact_damage: u32,
    pub boss_contact_damage: u32,
    /// Base score for defeating a boss
    pub boss_score: u32,
    /// Health fraction at or below which a boss enrages
    pub enrage_threshold: f32,
    /// Boss movement pattern cycle
    pub boss_move_cycle_ms: f64,
    /// Floor applied to revive health
    pub revive_min_health: f32,
    /// Credits granted by the intermediate boss bonus reward
    pub bonus_credits: u64,
    /// Reward cooldowns (persisted)
    pub revive_cooldown_ms: f64,
    pub wheel_cooldown_ms: f64,
    pub boss_reward_cooldown_ms: f64,
    /// Ordered boss triggers for every round
    pub boss_triggers: Vec<BossTrigger>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            view_width: 1152.0,
            view_height: 648.0,
            level_width: 18000.0,
            base_scroll_speed: 1.5,
            round_length: 18000.0,
            enemy_spawn_ms: 900.0,
            iframe_duration_ms: 3000.0,
            iframes_enabled: true,
            countdown_ticks: 3,
            countdown_step_ms: 1000.0,
            enemy_contact_damage: 20,
            boss_contact_damage: 15,
            boss_score: 1000,
            enrage_threshold: 0.3,
            boss_move_cycle_ms: 3000.0,
            revive_min_health: 10.0,
            bonus_credits: 2000,
            revive_cooldown_ms: 24.0 * 60.0 * 60.0 * 1000.0,
            wheel_cooldown_ms: 24.0 * 60.0 * 60.0 * 1000.0,
            boss_reward_cooldown_ms: 24.0 * 60.0 * 60.0 * 1000.0,
            boss_triggers: vec![
                BossTrigger {
                    distance: 5000.0,
                    kind: BossKind::Intermediate,
                    index: 0,
                },
                BossTrigger {
                    distance: 10000.0,
                    kind: BossKind::Intermediate,
                    index: 1,
                },
                BossTrigger {
                    distance: 15000.0,
                    kind: BossKind::Final,
                    index: 2,
                },
            ],
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON override
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        log::info!(
            "Loaded tuning: round length {}, {} boss triggers",
            tuning.round_length,
            tuning.boss_triggers.len()
        );
        Ok(tuning)
    }

    /// Check values the simulation relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be positive, got {value}"),
                })
            }
        }

        positive("view_width", self.view_width as f64)?;
        positive("view_height", self.view_height as f64)?;
        positive("level_width", self.level_width as f64)?;
        positive("round_length", self.round_length as f64)?;
        positive("enemy_spawn_ms", self.enemy_spawn_ms)?;
        positive("countdown_step_ms", self.countdown_step_ms)?;
        positive("boss_move_cycle_ms", self.boss_move_cycle_ms)?;

        if self.view_height <= 2.0 * crate::consts::PLAYFIELD_MARGIN + crate::consts::PLAYER_HEIGHT {
            return Err(ConfigError::Invalid {
                field: "view_height",
                reason: "too small for the player band".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.enrage_threshold) {
            return Err(ConfigError::Invalid {
                field: "enrage_threshold",
                reason: format!("must be within [0, 1], got {}", self.enrage_threshold),
            });
        }

        let ascending = self
            .boss_triggers
            .windows(2)
            .all(|pair| pair[0].distance < pair[1].distance);
        if !ascending {
            return Err(ConfigError::Invalid {
                field: "boss_triggers",
                reason: "trigger distances must be strictly ascending".to_string(),
            });
        }

        Ok(())
    }

    /// Topmost y the player may occupy
    pub fn band_top(&self) -> f32 {
        crate::consts::PLAYFIELD_MARGIN
    }

    /// Bottom edge of the player band (player top-left y maximum)
    pub fn band_bottom(&self) -> f32 {
        self.view_height - crate::consts::PLAYER_HEIGHT - crate::consts::PLAYFIELD_MARGIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let tuning = Tuning::from_json(r#"{ "round_length": 9000.0 }"#).unwrap();
        assert_eq!(tuning.round_length, 9000.0);
        assert_eq!(tuning.enemy_spawn_ms, 900.0);
        assert_eq!(tuning.boss_triggers.len(), 3);
    }

    #[test]
    fn test_rejects_unsorted_triggers() {
        let json = r#"{ "boss_triggers": [
            { "distance": 800.0, "kind": "Final", "index": 0 },
            { "distance": 400.0, "kind": "Intermediate", "index": 1 }
        ] }"#;
        let err = Tuning::from_json(json).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "boss_triggers", .. }));
    }

    #[test]
    fn test_rejects_non_positive_interval() {
        let err = Tuning::from_json(r#"{ "enemy_spawn_ms": 0.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "enemy_spawn_ms", .. }));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(Tuning::from_json("{"), Err(ConfigError::Json(_))));
    }
}
