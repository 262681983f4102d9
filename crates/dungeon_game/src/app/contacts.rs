use room_engine::{
    ActorId, Cell, Direction, Layer, Room, TileInstance, TileTable, TouchTarget,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Contact {
    actor: ActorId,
    layer: Layer,
    target: TouchTarget,
    target_layer: Layer,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ContactStats {
    pub(crate) began: usize,
    pub(crate) ended: usize,
}

#[derive(Debug, Default)]
pub(crate) struct ContactScanner {
    previous: Vec<Contact>,
}

impl ContactScanner {
    pub(crate) fn reset(&mut self) {
        self.previous.clear();
    }

    pub(crate) fn scan(&mut self, room: &mut Room, tiles: &TileTable) -> ContactStats {
        let current = current_contacts(room, tiles);
        let mut stats = ContactStats::default();

        for contact in current.iter().filter(|c| !self.previous.contains(c)) {
            room.track_touch(
                contact.actor,
                contact.layer,
                contact.target,
                contact.target_layer,
            );
            stats.began += 1;
        }
        for contact in self.previous.iter().filter(|c| !current.contains(c)) {
            // Destroyed actors had their records purged already.
            if !parties_exist(room, contact) {
                continue;
            }
            room.untrack_touch(contact.actor, contact.target);
            stats.ended += 1;
        }

        self.previous = current;
        stats
    }
}

fn parties_exist(room: &Room, contact: &Contact) -> bool {
    if room.actor(contact.actor).is_none() {
        return false;
    }
    match contact.target {
        TouchTarget::Actor(other) => room.actor(other).is_some(),
        TouchTarget::Tile(_) | TouchTarget::Boundary(_) => true,
    }
}

fn current_contacts(room: &Room, tiles: &TileTable) -> Vec<Contact> {
    let layers = room.layers();
    let width = room.tiles().width() as i32;
    let height = room.tiles().height() as i32;
    let actors = room
        .actors()
        .filter(|actor| !actor.is_dead())
        .map(|actor| (actor.id, actor.layer, actor.cell()))
        .collect::<Vec<_>>();

    let mut contacts = Vec::new();
    for (index, &(id, layer, cell)) in actors.iter().enumerate() {
        if let Some(side) = boundary_side(cell, width, height) {
            contacts.push(Contact {
                actor: id,
                layer,
                target: TouchTarget::Boundary(side),
                target_layer: layers.barrier,
            });
        } else if let Some(tile) = room.tiles().tile_at(cell) {
            let properties = tiles.properties(tile);
            if properties.has_collider {
                contacts.push(Contact {
                    actor: id,
                    layer,
                    target: TouchTarget::Tile(TileInstance { tile, cell }),
                    target_layer: layers.for_tile(properties),
                });
            }
        }

        for &(other, other_layer, other_cell) in &actors[index + 1..] {
            if other_cell == cell {
                contacts.push(Contact {
                    actor: id,
                    layer,
                    target: TouchTarget::Actor(other),
                    target_layer: other_layer,
                });
            }
        }
    }
    contacts
}

fn boundary_side(cell: Cell, width: i32, height: i32) -> Option<Direction> {
    if cell.x < 0 {
        Some(Direction::Left)
    } else if cell.x >= width {
        Some(Direction::Right)
    } else if cell.y < 0 {
        Some(Direction::Back)
    } else if cell.y >= height {
        Some(Direction::Front)
    } else {
        None
    }
}
