use std::collections::HashMap;

use tracing::debug;

use super::matrix::Layer;
use crate::actor::ActorId;
use crate::geometry::Direction;
use crate::tiles::TileInstance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchTarget {
    Actor(ActorId),
    Tile(TileInstance),
    Boundary(Direction),
}

impl TouchTarget {
    pub fn involves(self, actor: ActorId) -> bool {
        self == Self::Actor(actor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedCollision {
    pub actor: ActorId,
    pub actor_layer: Layer,
    pub target: TouchTarget,
    pub target_layer: Layer,
    pub count: u32,
    pub first_seen: u64,
}

impl TrackedCollision {
    pub fn involves(&self, actor: ActorId) -> bool {
        self.actor == actor || self.target.involves(actor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackOutcome {
    Began,
    Overlapping { count: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UntrackOutcome {
    Exited(TrackedCollision),
    StillTouching { count: u32 },
    Untracked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct LedgerKey {
    actor: ActorId,
    target: TouchTarget,
}

impl LedgerKey {
    fn new(actor: ActorId, target: TouchTarget) -> Self {
        match target {
            TouchTarget::Actor(other) if other < actor => Self {
                actor: other,
                target: TouchTarget::Actor(actor),
            },
            _ => Self { actor, target },
        }
    }
}

#[derive(Debug, Default)]
pub struct CollisionLedger {
    records: HashMap<LedgerKey, TrackedCollision>,
    next_seq: u64,
}

/// Actor pairs are keyed lower id first so either side's signal hits one record.
fn normalize(
    actor: ActorId,
    layer: Layer,
    target: TouchTarget,
    target_layer: Layer,
) -> (ActorId, Layer, TouchTarget, Layer) {
    match target {
        TouchTarget::Actor(other) if other < actor => {
            (other, target_layer, TouchTarget::Actor(actor), layer)
        }
        _ => (actor, layer, target, target_layer),
    }
}

impl CollisionLedger {
    pub fn track(
        &mut self,
        actor: ActorId,
        layer: Layer,
        target: TouchTarget,
        target_layer: Layer,
    ) -> TrackOutcome {
        let (actor, layer, target, target_layer) = normalize(actor, layer, target, target_layer);
        let key = LedgerKey { actor, target };
        if let Some(record) = self.records.get_mut(&key) {
            record.count = record.count.saturating_add(1);
            return TrackOutcome::Overlapping {
                count: record.count,
            };
        }
        let first_seen = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        self.records.insert(
            key,
            TrackedCollision {
                actor,
                actor_layer: layer,
                target,
                target_layer,
                count: 1,
                first_seen,
            },
        );
        TrackOutcome::Began
    }

    pub fn untrack(&mut self, actor: ActorId, target: TouchTarget) -> UntrackOutcome {
        let key = LedgerKey::new(actor, target);
        let Some(record) = self.records.get_mut(&key) else {
            debug!(actor = key.actor.0, target = ?key.target, "untrack_without_record");
            return UntrackOutcome::Untracked;
        };
        record.count = record.count.saturating_sub(1);
        if record.count > 0 {
            return UntrackOutcome::StillTouching {
                count: record.count,
            };
        }
        match self.records.remove(&key) {
            Some(record) => UntrackOutcome::Exited(record),
            None => UntrackOutcome::Untracked,
        }
    }

    pub fn touching(&self) -> Vec<TrackedCollision> {
        let mut records: Vec<TrackedCollision> = self.records.values().copied().collect();
        records.sort_by_key(|record| record.first_seen);
        records
    }

    /// Drops every record involving `actor` without reporting exits.
    pub fn purge_actor(&mut self, actor: ActorId) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| !record.involves(actor));
        before - self.records.len()
    }

    pub fn count_for(&self, actor: ActorId, target: TouchTarget) -> u32 {
        self.records
            .get(&LedgerKey::new(actor, target))
            .map_or(0, |record| record.count)
    }

    pub fn records_involving(&self, actor: ActorId) -> usize {
        self.records
            .values()
            .filter(|record| record.involves(actor))
            .count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
