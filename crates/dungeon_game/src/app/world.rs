use room_engine::{Cell, ColliderPool, Direction, Room, WorldRequest};
use tracing::{debug, info, warn};

struct WorldRoom {
    coords: Cell,
    room: Room,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Transition {
    pub(crate) from: usize,
    pub(crate) to: usize,
    pub(crate) request: WorldRequest,
}

pub(crate) struct World {
    rooms: Vec<WorldRoom>,
    active: usize,
    pool: ColliderPool,
    transitions: u32,
}

impl World {
    pub(crate) fn new(rooms: Vec<(Cell, Room)>) -> Self {
        assert!(!rooms.is_empty(), "world needs at least one room");
        let capacity = rooms
            .iter()
            .map(|(_, room)| room.tiles().width() as usize * room.tiles().height() as usize)
            .max()
            .unwrap_or(0);
        let mut world = Self {
            rooms: rooms
                .into_iter()
                .map(|(coords, room)| WorldRoom { coords, room })
                .collect(),
            active: 0,
            pool: ColliderPool::with_capacity(capacity),
            transitions: 0,
        };
        world.rooms[0].room.activate(&mut world.pool);
        world
    }

    pub(crate) fn active_index(&self) -> usize {
        self.active
    }

    pub(crate) fn active_room(&self) -> &Room {
        &self.rooms[self.active].room
    }

    pub(crate) fn active_room_mut(&mut self) -> &mut Room {
        &mut self.rooms[self.active].room
    }

    pub(crate) fn room(&self, index: usize) -> &Room {
        &self.rooms[index].room
    }

    pub(crate) fn room_mut(&mut self, index: usize) -> &mut Room {
        &mut self.rooms[index].room
    }

    pub(crate) fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub(crate) fn transitions(&self) -> u32 {
        self.transitions
    }

    pub(crate) fn collider_pool(&self) -> &ColliderPool {
        &self.pool
    }

    /// Consumes the active room's requests. The first one that names a
    /// reachable room wins; the rest are dropped.
    pub(crate) fn apply_requests(&mut self) -> Option<Transition> {
        let requests = self.active_room_mut().take_world_requests();
        let total = requests.len();
        let (request, target) = requests
            .into_iter()
            .find_map(|request| self.target_for(request).map(|target| (request, target)))?;
        if total > 1 {
            debug!(room = %self.active_room().id(), dropped = total - 1, "world_requests_dropped");
        }

        let from = self.active;
        self.switch_to(target);
        info!(
            from = %self.rooms[from].room.id(),
            to = %self.rooms[target].room.id(),
            request = ?request,
            "room_transition"
        );
        Some(Transition {
            from,
            to: target,
            request,
        })
    }

    fn target_for(&self, request: WorldRequest) -> Option<usize> {
        match request {
            WorldRequest::LoadNeighbor(direction) => self.neighbor_of(self.active, direction),
            WorldRequest::BeginSection { room_type, .. } => {
                let count = self.rooms.len();
                let target = (1..count)
                    .map(|step| (self.active + step) % count)
                    .find(|&index| self.rooms[index].room.room_type() == room_type);
                if target.is_none() {
                    warn!(room_type = ?room_type, "section_room_missing");
                }
                target
            }
        }
    }

    fn neighbor_of(&self, index: usize, direction: Direction) -> Option<usize> {
        let coords = self.rooms[index].coords.offset(direction);
        let neighbor = self.rooms.iter().position(|entry| entry.coords == coords);
        if neighbor.is_none() {
            warn!(room = %self.rooms[index].room.id(), direction = ?direction, "neighbor_missing");
        }
        neighbor
    }

    fn switch_to(&mut self, target: usize) {
        let current = self.active;
        self.rooms[current].room.deactivate(&mut self.pool);
        self.rooms[target].room.activate(&mut self.pool);
        self.active = target;
        self.transitions = self.transitions.saturating_add(1);
    }
}
