use std::collections::VecDeque;
use std::sync::Arc;

use room_engine::{
    ActorFlags, ActorId, ActorKind, Cell, Direction, Health, Knockback, Move, OnTouch,
    PathOutcome, PathRequestError, Room, RoomId, RoomTiles, RoomType, SharedTables, SimConfig,
    Tile, TileId, TileTable, Vec2,
};
use tracing::{debug, info};

use super::contacts::ContactScanner;
use super::world::{Transition, World};

const MIN_ROOM_WIDTH: u32 = 12;
const MIN_ROOM_HEIGHT: u32 = 9;
const PLAYER_MAX_HEALTH: i32 = 6;
const PLAYER_SPEED: f32 = 4.0;
const ENEMY_SPEED: f32 = 2.5;
const PROJECTILE_SPEED: f32 = 8.0;
const FIRE_INTERVAL_TICKS: u64 = 40;
/// Chasers re-plan after this many cells since the player keeps moving.
const CHASE_REPLAN_CELLS: usize = 3;
const PATH_RETRY_TICKS: u32 = 30;

struct RoomPlan {
    coords: Cell,
    spawn: Cell,
    goal: Cell,
    exit: Option<Direction>,
    enemies: Vec<Cell>,
}

struct RoomLayout {
    room_type: RoomType,
    tiles: RoomTiles,
    plan: RoomPlan,
}

#[derive(Debug)]
struct Walker {
    actor: ActorId,
    speed: f32,
    route: VecDeque<Cell>,
    route_limit: Option<usize>,
    pending: bool,
    cooldown: u32,
}

impl Walker {
    fn new(actor: ActorId, speed: f32, route_limit: Option<usize>) -> Self {
        Self {
            actor,
            speed,
            route: VecDeque::new(),
            route_limit,
            pending: false,
            cooldown: 0,
        }
    }

    fn reset(&mut self) {
        self.route.clear();
        self.pending = false;
        self.cooldown = 0;
    }

    /// Takes a finished query. Results that no longer start next to the
    /// walker are stale and count as a failed query.
    fn accept(&mut self, outcome: PathOutcome, current: Cell) {
        if !self.pending {
            return;
        }
        self.pending = false;
        match outcome.route {
            Some(route) if route.first().is_some_and(|first| first.is_adjacent_to(current)) => {
                self.route = route.into_iter().collect();
                if let Some(limit) = self.route_limit {
                    self.route.truncate(limit);
                }
            }
            _ => self.cooldown = PATH_RETRY_TICKS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DemoStatus {
    Running,
    PlayerDied,
}

pub(crate) struct Demo {
    world: World,
    plans: Vec<RoomPlan>,
    tiles: Arc<TileTable>,
    contacts: ContactScanner,
    player: Walker,
    enemies: Vec<Vec<Walker>>,
    ticks: u64,
}

impl Demo {
    pub(crate) fn new(config: &SimConfig, shared: SharedTables) -> Self {
        let width = config.room_width.max(MIN_ROOM_WIDTH);
        let height = config.room_height.max(MIN_ROOM_HEIGHT);
        let tiles = Arc::clone(&shared.tiles);

        let mut rooms = Vec::new();
        let mut plans = Vec::new();
        let mut enemies = Vec::new();
        for (index, layout) in demo_layouts(width, height).into_iter().enumerate() {
            let origin = Vec2::new(
                layout.plan.coords.x as f32 * width as f32,
                layout.plan.coords.y as f32 * height as f32,
            );
            let mut room = Room::new(
                RoomId(index as u32),
                layout.room_type,
                origin,
                layout.tiles,
                shared.clone(),
                config,
            );
            let walkers = layout
                .plan
                .enemies
                .iter()
                .map(|&cell| {
                    Walker::new(spawn_enemy(&mut room, cell), ENEMY_SPEED, Some(CHASE_REPLAN_CELLS))
                })
                .collect::<Vec<_>>();
            room.lock(walkers.len() as u32);
            rooms.push((layout.plan.coords, room));
            plans.push(layout.plan);
            enemies.push(walkers);
        }

        let mut world = World::new(rooms);
        let player = spawn_player(
            world.active_room_mut(),
            plans[0].spawn,
            Health::full(PLAYER_MAX_HEALTH),
        );
        info!(rooms = world.room_count(), width, height, "demo_ready");

        Self {
            world,
            plans,
            tiles,
            contacts: ContactScanner::default(),
            player: Walker::new(player, PLAYER_SPEED, None),
            enemies,
            ticks: 0,
        }
    }

    pub(crate) fn ticks(&self) -> u64 {
        self.ticks
    }

    pub(crate) fn transitions(&self) -> u32 {
        self.world.transitions()
    }

    pub(crate) fn active_room_id(&self) -> RoomId {
        self.world.active_room().id()
    }

    pub(crate) fn player_health(&self) -> Option<Health> {
        self.world
            .active_room()
            .actor(self.player.actor)
            .and_then(|actor| actor.health)
    }

    pub(crate) fn step(&mut self, dt_seconds: f32) -> Result<DemoStatus, PathRequestError> {
        self.ticks = self.ticks.saturating_add(1);
        let active = self.world.active_index();
        self.steer_player(active)?;
        self.steer_enemies(active)?;
        self.fire_if_due();

        let room = self.world.active_room_mut();
        advance_projectiles(room, dt_seconds);
        let contacts = self.contacts.scan(room, &self.tiles);
        let stats = room.tick(dt_seconds);
        if contacts.began + contacts.ended > 0 || stats.reaped > 0 {
            debug!(
                tick = self.ticks,
                began = contacts.began,
                ended = contacts.ended,
                reaped = stats.reaped,
                "demo_contacts"
            );
        }
        self.collect_paths(active);

        let Some(player) = self.world.active_room().actor(self.player.actor) else {
            info!(tick = self.ticks, room = %self.active_room_id(), "player_died");
            return Ok(DemoStatus::PlayerDied);
        };
        let health = player.health.unwrap_or(Health::full(PLAYER_MAX_HEALTH));
        if let Some(transition) = self.world.apply_requests() {
            self.enter_room(transition, health);
        }
        Ok(DemoStatus::Running)
    }

    fn steer_player(&mut self, active: usize) -> Result<(), PathRequestError> {
        let plan = &self.plans[active];
        let room = self.world.active_room_mut();
        let Some(actor) = room.actor(self.player.actor) else {
            return Ok(());
        };
        if actor.normal_move.is_some() || self.player.pending {
            return Ok(());
        }
        if actor.cell() != plan.goal {
            return follow_route(room, &mut self.player, plan.goal);
        }
        if let Some(exit) = plan.exit {
            if !room.room_lock().is_locked() {
                start_step(room, self.player.actor, exit, self.player.speed);
            }
        }
        Ok(())
    }

    fn steer_enemies(&mut self, active: usize) -> Result<(), PathRequestError> {
        let room = self.world.active_room_mut();
        let Some(target) = room.actor(self.player.actor).map(|actor| actor.cell()) else {
            return Ok(());
        };
        for walker in &mut self.enemies[active] {
            if room.is_alive(walker.actor) {
                follow_route(room, walker, target)?;
            }
        }
        Ok(())
    }

    fn fire_if_due(&mut self) {
        if self.ticks % FIRE_INTERVAL_TICKS != 0 {
            return;
        }
        let room = self.world.active_room_mut();
        let Some(player) = room.actor(self.player.actor) else {
            return;
        };
        if !room.tiles().in_bounds(player.cell()) {
            return;
        }
        let position = player.position;
        let aim = room
            .actors()
            .filter(|actor| actor.kind == ActorKind::Enemy && !actor.is_dead())
            .map(|actor| actor.position - position)
            .min_by(|a, b| a.length_squared().total_cmp(&b.length_squared()))
            .and_then(Direction::from_vec2);
        let Some(aim) = aim else {
            return;
        };
        if let Some(actor) = room.actor_mut(self.player.actor) {
            actor.facing = aim;
        }
        let bolt = OnTouch {
            damage: 1,
            knockback: Knockback::None,
            die_on_touch: true,
            add_collision_rule: false,
        };
        if let Some(id) = room.fire_projectile(self.player.actor, PROJECTILE_SPEED, bolt) {
            debug!(bolt = id.0, facing = ?aim, "bolt_fired");
        }
    }

    fn collect_paths(&mut self, active: usize) {
        let room = self.world.active_room_mut();
        for outcome in room.drain_path_results() {
            let Some(current) = room.actor(outcome.actor).map(|actor| actor.cell()) else {
                continue;
            };
            let walker = if outcome.actor == self.player.actor {
                Some(&mut self.player)
            } else {
                self.enemies[active]
                    .iter_mut()
                    .find(|walker| walker.actor == outcome.actor)
            };
            if let Some(walker) = walker {
                walker.accept(outcome, current);
            }
        }
    }

    fn enter_room(&mut self, transition: Transition, health: Health) {
        self.world
            .room_mut(transition.from)
            .destroy_actor(self.player.actor);
        let spawn = self.plans[transition.to].spawn;
        let player = spawn_player(self.world.active_room_mut(), spawn, health);
        self.player = Walker::new(player, PLAYER_SPEED, None);
        for walker in &mut self.enemies[transition.to] {
            walker.reset();
        }
        self.contacts.reset();
        info!(
            tick = self.ticks,
            from = %self.world.room(transition.from).id(),
            room = %self.active_room_id(),
            request = ?transition.request,
            health = health.current,
            pooled_colliders = self.world.collider_pool().idle(),
            "player_entered"
        );
    }
}

fn follow_route(
    room: &mut Room,
    walker: &mut Walker,
    target: Cell,
) -> Result<(), PathRequestError> {
    let Some(actor) = room.actor(walker.actor) else {
        return Ok(());
    };
    if actor.normal_move.is_some() || walker.pending {
        return Ok(());
    }
    let cell = actor.cell();

    if let Some(next) = walker.route.pop_front() {
        let direction = Direction::from_vec2(next.center() - cell.center())
            .filter(|_| cell.is_adjacent_to(next));
        match direction {
            Some(direction) => start_step(room, walker.actor, direction, walker.speed),
            None => walker.route.clear(),
        }
        return Ok(());
    }
    if walker.cooldown > 0 {
        walker.cooldown -= 1;
        return Ok(());
    }

    let grid = room.passability();
    if cell == target || !grid.is_passable(cell) || !grid.is_passable(target) {
        return Ok(());
    }
    walker.pending = room.request_path(walker.actor, target)?;
    Ok(())
}

fn start_step(room: &mut Room, id: ActorId, direction: Direction, speed: f32) {
    if let Some(actor) = room.actor_mut(id) {
        actor.facing = direction;
        actor.normal_move = Some(Move::new(actor.position, speed, 1, direction));
    }
}

fn advance_projectiles(room: &mut Room, dt_seconds: f32) {
    let bolts = room
        .actors()
        .filter(|actor| actor.kind == ActorKind::Projectile && !actor.is_dead())
        .map(|actor| actor.id)
        .collect::<Vec<_>>();
    for id in bolts {
        if let Some(actor) = room.actor_mut(id) {
            actor.position = actor.position + actor.velocity * dt_seconds;
        }
    }
}

fn spawn_player(room: &mut Room, cell: Cell, health: Health) -> ActorId {
    let id = room.spawn_actor(ActorKind::Player, cell.center(), Direction::Front);
    if let Some(actor) = room.actor_mut(id) {
        actor.speed = PLAYER_SPEED;
        actor.health = Some(health);
        actor.set_flag(ActorFlags::INVINCIBLE_FRAMES);
    }
    id
}

fn spawn_enemy(room: &mut Room, cell: Cell) -> ActorId {
    let id = room.spawn_actor(ActorKind::Enemy, cell.center(), Direction::Back);
    if let Some(actor) = room.actor_mut(id) {
        actor.speed = ENEMY_SPEED;
        actor.health = Some(Health::full(1));
        actor.locks_room = true;
        actor.on_touch = Some(OnTouch {
            damage: 1,
            knockback: Knockback::Constant { force: 2.0 },
            die_on_touch: false,
            add_collision_rule: true,
        });
    }
    id
}

fn demo_layouts(width: u32, height: u32) -> [RoomLayout; 3] {
    [
        entry_hall(width, height),
        meadow(width, height),
        crypt(width, height),
    ]
}

/// Spikes across the whole hall, a torch row and an exit gap in the right wall.
fn entry_hall(width: u32, height: u32) -> RoomLayout {
    let (w, h) = (width as i32, height as i32);
    let mid = h / 2;
    let mut tiles = RoomTiles::filled(width, height, Tile::new(TileId::DungeonFloor))
        .with_border(Tile::new(TileId::DungeonWall));
    for y in 1..h - 1 {
        tiles.set_tile(Cell::new(w / 3, y), Tile::new(TileId::Spikes));
    }
    for y in 1..mid {
        tiles.set_tile(Cell::new(2 * w / 3, y), Tile::new(TileId::Torch));
    }
    let doorway = Cell::new(w - 1, mid);
    tiles.set_tile(doorway, Tile::new(TileId::DungeonFloor));

    RoomLayout {
        room_type: RoomType::Dungeon,
        tiles,
        plan: RoomPlan {
            coords: Cell::new(0, 0),
            spawn: Cell::new(2, mid),
            goal: doorway,
            exit: Some(Direction::Right),
            enemies: vec![Cell::new(w - 2, h - 2)],
        },
    }
}

/// Open grass with a shallows pond and a door down to the crypt.
fn meadow(width: u32, height: u32) -> RoomLayout {
    let (w, h) = (width as i32, height as i32);
    let mid = h / 2;
    let mut tiles = RoomTiles::filled(width, height, Tile::new(TileId::PlainsGrass))
        .with_border(Tile::new(TileId::PlainsWall));
    for y in mid - 1..=mid + 1 {
        for x in w / 2 - 1..=w / 2 + 1 {
            tiles.set_tile(Cell::new(x, y), Tile::new(TileId::Shallows));
        }
    }
    tiles.set_tile(Cell::new(0, mid), Tile::new(TileId::PlainsGrass));
    let door = Cell::new(w - 3, mid);
    tiles.set_tile(door, Tile::new(TileId::PlainsDoor));

    RoomLayout {
        room_type: RoomType::Plains,
        tiles,
        plan: RoomPlan {
            coords: Cell::new(1, 0),
            spawn: Cell::new(1, mid),
            goal: door,
            exit: None,
            enemies: Vec::new(),
        },
    }
}

/// A spike row with one gap near the right wall, two guards and a door back up.
fn crypt(width: u32, height: u32) -> RoomLayout {
    let (w, h) = (width as i32, height as i32);
    let mid = h / 2;
    let mut tiles = RoomTiles::filled(width, height, Tile::new(TileId::DungeonFloor))
        .with_border(Tile::new(TileId::DungeonWall));
    for x in 1..w - 2 {
        tiles.set_tile(Cell::new(x, mid), Tile::new(TileId::Spikes));
    }
    let door = Cell::new(w / 2, h - 2);
    tiles.set_tile(door, Tile::new(TileId::DungeonDoor));

    RoomLayout {
        room_type: RoomType::Dungeon,
        tiles,
        plan: RoomPlan {
            coords: Cell::new(2, 0),
            spawn: Cell::new(2, 1),
            goal: door,
            exit: None,
            enemies: vec![Cell::new(2, h - 3), Cell::new(w - 3, h - 3)],
        },
    }
}
