//! Entity registry
//!
//! Single source of truth for which transient entities exist. The player is
//! owned by `GameState` and never lives here.
//!
//! Iteration is exposed directly; callers mark entities dead during a pass and
//! call the `remove_*` sweepers afterwards so no index is reused mid-pass.

use glam::Vec2;
use serde::Serialize;

use super::entities::{Boss, BossSpec, Bullet, Enemy, EnemySpec, EntityId, Missile};

#[derive(Debug, Clone, Default, Serialize)]
pub struct Registry {
    pub enemies: Vec<Enemy>,
    pub enemy_bullets: Vec<Bullet>,
    /// At most one boss is active at a time
    pub boss: Option<Boss>,
    /// Homing missiles from both sides
    pub missiles: Vec<Missile>,
    next_id: EntityId,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        self.next_id = self.next_id.max(1);
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Clear every transient collection (enemies, bullets, missiles, boss)
    pub fn reset(&mut self) {
        self.enemies.clear();
        self.enemy_bullets.clear();
        self.missiles.clear();
        self.boss = None;
    }

    /// Clear regular enemies and their bullets, leaving the boss and missiles
    pub fn clear_enemies(&mut self) {
        self.enemies.clear();
        self.enemy_bullets.clear();
    }

    /// Append a fully initialised enemy
    pub fn spawn_enemy(&mut self, spec: &EnemySpec) -> EntityId {
        let id = self.next_entity_id();
        self.enemies.push(Enemy::new(id, spec));
        id
    }

    /// Install a boss unless one is already active
    pub fn spawn_boss(&mut self, spec: &BossSpec) -> Option<EntityId> {
        if self.boss.is_some() {
            log::warn!("Boss spawn ignored: a boss is already active");
            return None;
        }
        let id = self.next_entity_id();
        self.boss = Some(Boss::new(id, spec));
        Some(id)
    }

    #[inline]
    pub fn boss_active(&self) -> bool {
        self.boss.is_some()
    }

    pub fn enemy(&self, id: EntityId) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    /// The active boss, if it has the given id
    pub fn boss_by_id(&self, id: EntityId) -> Option<&Boss> {
        self.boss.as_ref().filter(|b| b.id == id)
    }

    /// Center of the enemy or boss closest to `from`
    pub fn nearest_hostile(&self, from: Vec2) -> Option<Vec2> {
        self.enemies
            .iter()
            .filter(|e| !e.is_dead())
            .map(|e| e.rect.center())
            .chain(self.boss.iter().map(|b| b.rect.center()))
            .min_by(|a, b| a.distance_squared(from).total_cmp(&b.distance_squared(from)))
    }

    /// Sweep enemies whose health reached zero
    pub fn remove_dead_enemies(&mut self) {
        self.enemies.retain(|e| !e.is_dead());
    }

    /// Total live transient entities (for logging/tests)
    pub fn len(&self) -> usize {
        self.enemies.len()
            + self.enemy_bullets.len()
            + self.missiles.len()
            + usize::from(self.boss.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entities::EnemyKind;
    use crate::tuning::BossKind;

    fn enemy_spec(kind: EnemyKind) -> EnemySpec {
        EnemySpec {
            kind,
            x: 500.0,
            y: 100.0,
            bosses_defeated: 0,
        }
    }

    fn boss_spec() -> BossSpec {
        BossSpec {
            kind: BossKind::Intermediate,
            index: 0,
            x: 900.0,
            view_height: 648.0,
            bosses_defeated: 0,
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let mut registry = Registry::new();
        let a = registry.spawn_enemy(&enemy_spec(EnemyKind::Basic));
        let b = registry.spawn_enemy(&enemy_spec(EnemyKind::Tank));
        let c = registry.spawn_boss(&boss_spec()).unwrap();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert!(registry.enemy(a).is_some());
        assert!(registry.boss_by_id(c).is_some());
    }

    #[test]
    fn test_only_one_boss() {
        let mut registry = Registry::new();
        assert!(registry.spawn_boss(&boss_spec()).is_some());
        assert!(registry.spawn_boss(&boss_spec()).is_none());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut registry = Registry::new();
        registry.spawn_enemy(&enemy_spec(EnemyKind::Basic));
        registry.spawn_boss(&boss_spec());
        assert_eq!(registry.len(), 2);
        registry.reset();
        assert!(registry.is_empty());
        // IDs keep increasing after a reset
        let id = registry.spawn_enemy(&enemy_spec(EnemyKind::Basic));
        assert_eq!(id, 3);
    }

    #[test]
    fn test_clear_enemies_keeps_boss() {
        let mut registry = Registry::new();
        registry.spawn_enemy(&enemy_spec(EnemyKind::Basic));
        registry.spawn_boss(&boss_spec());
        registry.clear_enemies();
        assert!(registry.enemies.is_empty());
        assert!(registry.boss_active());
    }

    #[test]
    fn test_nearest_hostile_includes_boss() {
        let mut registry = Registry::new();
        assert!(registry.nearest_hostile(Vec2::ZERO).is_none());
        registry.spawn_enemy(&EnemySpec {
            kind: EnemyKind::Basic,
            x: 2000.0,
            y: 100.0,
            bosses_defeated: 0,
        });
        registry.spawn_boss(&boss_spec());
        let nearest = registry.nearest_hostile(Vec2::new(800.0, 300.0)).unwrap();
        assert_eq!(nearest, registry.boss.as_ref().unwrap().rect.center());
    }

    #[test]
    fn test_remove_dead_enemies() {
        let mut registry = Registry::new();
        let a = registry.spawn_enemy(&enemy_spec(EnemyKind::Basic));
        let b = registry.spawn_enemy(&enemy_spec(EnemyKind::Basic));
        registry.enemies[0].health = 0;
        registry.remove_dead_enemies();
        assert!(registry.enemy(a).is_none());
        assert!(registry.enemy(b).is_some());
    }
}
