//! Deferred-event queue
//!
//! Staggered actions (burst fire, missile salvos, follow-up spawns) are queued
//! with a due time on the simulation clock and the identity of the entity they
//! act for. The tick drains due events and resolves each against the registry;
//! a target that no longer exists turns the event into a no-op.

use serde::Serialize;

use super::entities::EntityId;

/// What a deferred event does when it comes due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Deferred {
    /// One bullet of an enemy's burst
    EnemyShot { enemy: EntityId },
    /// One missile of a boss salvo
    BossMissile { boss: EntityId },
    /// Second enemy of a high-difficulty spawn
    FollowUpSpawn,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct ScheduledEvent {
    due_ms: f64,
    /// Insertion order, breaks ties between equal due times
    seq: u64,
    event: Deferred,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Schedule {
    queue: Vec<ScheduledEvent>,
    next_seq: u64,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, due_ms: f64, event: Deferred) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(ScheduledEvent { due_ms, seq, event });
    }

    /// Remove and return every event due at `now_ms`, oldest first
    pub fn drain_due(&mut self, now_ms: f64) -> Vec<Deferred> {
        let mut due: Vec<ScheduledEvent> = Vec::new();
        self.queue.retain(|e| {
            if e.due_ms <= now_ms {
                due.push(*e);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|e| e.event).collect()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
