use std::collections::VecDeque;

use crate::geometry::Vec2;
use crate::tiles::{TileInstance, TileProperties};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileCollider {
    pub instance: Option<TileInstance>,
    pub center: Vec2,
    pub size: Vec2,
    pub trigger: bool,
    pub path_cost: Option<u32>,
    pub enabled: bool,
}

impl Default for TileCollider {
    fn default() -> Self {
        Self {
            instance: None,
            center: Vec2::ZERO,
            size: Vec2::new(1.0, 1.0),
            trigger: false,
            path_cost: None,
            enabled: false,
        }
    }
}

impl TileCollider {
    fn place(&mut self, instance: TileInstance, properties: TileProperties, room_origin: Vec2) {
        self.instance = Some(instance);
        self.center = room_origin + instance.cell.center() + properties.collider_offset;
        self.size = properties.collider_size;
        self.trigger = properties.trigger;
        self.path_cost = properties.path_cost;
        self.enabled = true;
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let half_w = self.size.x * 0.5;
        let half_h = self.size.y * 0.5;
        (point.x - self.center.x).abs() <= half_w && (point.y - self.center.y).abs() <= half_h
    }
}

#[derive(Debug, Default)]
pub struct ColliderPool {
    free: VecDeque<TileCollider>,
    created: usize,
}

impl ColliderPool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            free: VecDeque::with_capacity(capacity),
            created: 0,
        }
    }

    pub fn get(
        &mut self,
        instance: TileInstance,
        properties: TileProperties,
        room_origin: Vec2,
    ) -> TileCollider {
        let mut collider = self.free.pop_front().unwrap_or_else(|| {
            self.created = self.created.saturating_add(1);
            TileCollider::default()
        });
        collider.place(instance, properties, room_origin);
        collider
    }

    pub fn return_all(&mut self, colliders: &mut Vec<TileCollider>) {
        for mut collider in colliders.drain(..) {
            collider.reset();
            self.free.push_back(collider);
        }
    }

    pub fn idle(&self) -> usize {
        self.free.len()
    }

    pub fn created(&self) -> usize {
        self.created
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeHit {
    pub trigger: bool,
    pub instance: Option<TileInstance>,
    pub path_cost: Option<u32>,
}

pub trait ScenePhysics {
    fn probe(&self, origin: Vec2) -> Option<ProbeHit>;
}

/// Probes a room's placed tile colliders. Solid hits shadow triggers.
#[derive(Debug, Clone, Copy)]
pub struct ColliderScene<'a> {
    colliders: &'a [TileCollider],
}

impl<'a> ColliderScene<'a> {
    pub fn new(colliders: &'a [TileCollider]) -> Self {
        Self { colliders }
    }
}

impl ScenePhysics for ColliderScene<'_> {
    fn probe(&self, origin: Vec2) -> Option<ProbeHit> {
        let mut hit = None;
        for collider in self
            .colliders
            .iter()
            .filter(|collider| collider.enabled && collider.contains(origin))
        {
            let candidate = ProbeHit {
                trigger: collider.trigger,
                instance: collider.instance,
                path_cost: collider.path_cost,
            };
            if !collider.trigger {
                return Some(candidate);
            }
            hit.get_or_insert(candidate);
        }
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Cell;
    use crate::tiles::{Tile, TileId, TileTable};

    fn instance(id: TileId, x: i32, y: i32) -> TileInstance {
        TileInstance {
            tile: Tile::from(id),
            cell: Cell::new(x, y),
        }
    }

    #[test]
    fn pool_reuses_returned_colliders() {
        let table = TileTable::standard();
        let mut pool = ColliderPool::default();
        let wall = instance(TileId::DungeonWall, 0, 0);
        let mut placed = vec![
            pool.get(wall, table.properties(wall.tile), Vec2::ZERO),
            pool.get(wall, table.properties(wall.tile), Vec2::ZERO),
        ];
        assert_eq!(pool.created(), 2);

        pool.return_all(&mut placed);
        assert!(placed.is_empty());
        assert_eq!(pool.idle(), 2);

        let again = pool.get(wall, table.properties(wall.tile), Vec2::ZERO);
        assert!(again.enabled);
        assert_eq!(pool.created(), 2);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn returned_colliders_are_reset_and_disabled() {
        let table = TileTable::standard();
        let mut pool = ColliderPool::default();
        let spikes = instance(TileId::Spikes, 3, 1);
        let mut placed = vec![pool.get(spikes, table.properties(spikes.tile), Vec2::ZERO)];
        assert_eq!(placed[0].center, Vec2::new(3.5, 1.5));
        pool.return_all(&mut placed);

        let recycled = pool.free.front().copied().expect("pooled");
        assert_eq!(recycled, TileCollider::default());
        assert!(!recycled.enabled);
    }

    #[test]
    fn solid_hit_shadows_trigger() {
        let table = TileTable::standard();
        let mut pool = ColliderPool::default();
        let spikes = instance(TileId::Spikes, 1, 1);
        let wall = instance(TileId::DungeonWall, 1, 1);
        let colliders = vec![
            pool.get(spikes, table.properties(spikes.tile), Vec2::ZERO),
            pool.get(wall, table.properties(wall.tile), Vec2::ZERO),
        ];
        let scene = ColliderScene::new(&colliders);

        let hit = scene.probe(Cell::new(1, 1).center()).expect("hit");
        assert!(!hit.trigger);
        assert_eq!(hit.instance, Some(wall));
        assert!(scene.probe(Cell::new(2, 1).center()).is_none());
    }
}
