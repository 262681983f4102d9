use std::fmt;
use std::mem;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::actor::{Actor, ActorFlags, ActorId, ActorKind, ActorStore, OnTouch};
use crate::colliders::{ColliderPool, ColliderScene, TileCollider};
use crate::collision::{
    CollisionLedger, CollisionRules, DispatchTables, Layer, StandardLayers, TouchContext,
    TouchTarget, TrackOutcome, UntrackOutcome,
};
use crate::config::SimConfig;
use crate::effects::{EffectAction, EffectKind, StatusEffectScheduler};
use crate::geometry::{Cell, Direction, Vec2};
use crate::passability::{self, PassabilityGrid};
use crate::pathfinding::{self, PathInbox, PathOutcome, PathRequestError, PathTask, PathfinderPool};
use crate::tiles::{RoomTiles, TileTable};

const PROJECTILE_SPAWN_OFFSET: Vec2 = Vec2::new(0.0, 0.3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(pub u32);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomType {
    Plains,
    Dungeon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldRequest {
    BeginSection {
        direction: Option<Direction>,
        room_type: RoomType,
    },
    LoadNeighbor(Direction),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoomLock {
    remaining: u32,
}

impl RoomLock {
    pub fn is_locked(&self) -> bool {
        self.remaining > 0
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

#[derive(Debug, Clone)]
pub struct SharedTables {
    pub dispatch: Arc<DispatchTables>,
    pub tiles: Arc<TileTable>,
    pub layers: StandardLayers,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoomTickStats {
    pub stay_dispatches: usize,
    pub effect_firings: usize,
    pub reaped: usize,
}

pub struct Room {
    id: RoomId,
    room_type: RoomType,
    origin: Vec2,
    tiles: RoomTiles,
    shared: SharedTables,
    actors: ActorStore,
    ledger: CollisionLedger,
    effects: StatusEffectScheduler,
    rules: CollisionRules,
    colliders: Vec<TileCollider>,
    grid: Option<Arc<PassabilityGrid>>,
    pathfinders: Option<PathfinderPool>,
    inbox: PathInbox,
    path_tasks: Vec<PathTask>,
    lock: RoomLock,
    requests: Vec<WorldRequest>,
    active: bool,
    activations: u32,
    max_path_expansions: usize,
    pathfinder_pool_size: usize,
}

impl fmt::Debug for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Room")
            .field("id", &self.id)
            .field("room_type", &self.room_type)
            .field("active", &self.active)
            .field("actors", &self.actors.len())
            .field("tracked", &self.ledger.len())
            .field("colliders", &self.colliders.len())
            .finish()
    }
}

impl Room {
    pub fn new(
        id: RoomId,
        room_type: RoomType,
        origin: Vec2,
        tiles: RoomTiles,
        shared: SharedTables,
        config: &SimConfig,
    ) -> Self {
        Self {
            id,
            room_type,
            origin,
            tiles,
            shared,
            actors: ActorStore::default(),
            ledger: CollisionLedger::default(),
            effects: StatusEffectScheduler::new(config.effect_settings()),
            rules: CollisionRules::default(),
            colliders: Vec::new(),
            grid: None,
            pathfinders: None,
            inbox: PathInbox::default(),
            path_tasks: Vec::new(),
            lock: RoomLock::default(),
            requests: Vec::new(),
            active: false,
            activations: 0,
            max_path_expansions: config.max_path_expansions,
            pathfinder_pool_size: config.pathfinder_pool_size,
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn room_type(&self) -> RoomType {
        self.room_type
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn tiles(&self) -> &RoomTiles {
        &self.tiles
    }

    pub fn layers(&self) -> StandardLayers {
        self.shared.layers
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn colliders(&self) -> &[TileCollider] {
        &self.colliders
    }

    pub fn activate(&mut self, pool: &mut ColliderPool) {
        assert!(!self.active, "{} activated twice", self.id);
        self.activations = self.activations.saturating_add(1);
        for instance in self.tiles.instances() {
            let properties = self.shared.tiles.properties(instance.tile);
            if properties.has_collider {
                self.colliders
                    .push(pool.get(instance, properties, self.origin));
            }
        }
        self.build_passability_grid();
        self.active = true;
        info!(
            room = %self.id,
            colliders = self.colliders.len(),
            actors = self.actors.len(),
            "room_activated"
        );
    }

    pub fn deactivate(&mut self, pool: &mut ColliderPool) {
        assert!(self.active, "{} deactivated while inactive", self.id);
        let returned = self.colliders.len();
        pool.return_all(&mut self.colliders);
        self.ledger.clear();
        self.grid = None;
        self.pathfinders = None;
        self.path_tasks.clear();
        let transient = self
            .actors
            .iter()
            .filter(|actor| actor.kind == ActorKind::Projectile)
            .map(|actor| actor.id)
            .collect::<Vec<_>>();
        for id in transient {
            self.destroy_actor(id);
        }
        self.active = false;
        info!(room = %self.id, colliders = returned, "room_deactivated");
    }

    pub fn build_passability_grid(&mut self) -> Arc<PassabilityGrid> {
        let scene = ColliderScene::new(&self.colliders);
        let grid = Arc::new(passability::build_passability_grid(
            self.tiles.width(),
            self.tiles.height(),
            self.origin,
            &scene,
        ));
        debug!(
            room = %self.id,
            cells = grid.cell_count(),
            blocked = grid.blocked_count(),
            "passability_built"
        );
        self.pathfinders = Some(PathfinderPool::new(
            self.pathfinder_label(),
            Arc::clone(&grid),
            self.pathfinder_pool_size,
            self.max_path_expansions,
        ));
        self.grid = Some(Arc::clone(&grid));
        grid
    }

    fn pathfinder_label(&self) -> String {
        format!("r{}.{}", self.id.0, self.activations)
    }

    pub fn pathfinder_pool(&self) -> Option<&PathfinderPool> {
        self.pathfinders.as_ref()
    }

    /// The grid only exists while the room is active.
    pub fn passability(&self) -> &Arc<PassabilityGrid> {
        match &self.grid {
            Some(grid) => grid,
            None => panic!("{} has no passability grid", self.id),
        }
    }

    pub fn spawn_actor(&mut self, kind: ActorKind, position: Vec2, facing: Direction) -> ActorId {
        let layer = self.shared.layers.for_kind(kind);
        self.actors.spawn(kind, layer, position, facing)
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(id)
    }

    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.iter()
    }

    pub fn is_alive(&self, id: ActorId) -> bool {
        self.actors.is_alive(id)
    }

    fn touch_context(&mut self) -> TouchContext<'_> {
        TouchContext {
            actors: &mut self.actors,
            effects: &mut self.effects,
            rules: &mut self.rules,
            requests: &mut self.requests,
            room_locked: self.lock.is_locked(),
        }
    }

    pub fn track_touch(
        &mut self,
        actor: ActorId,
        layer: Layer,
        target: TouchTarget,
        target_layer: Layer,
    ) -> TrackOutcome {
        self.ledger.track(actor, layer, target, target_layer)
    }

    /// Raw exit signal. Exit handlers run only when the last overlap ends.
    pub fn untrack_touch(&mut self, actor: ActorId, target: TouchTarget) -> UntrackOutcome {
        let outcome = self.ledger.untrack(actor, target);
        if let UntrackOutcome::Exited(record) = outcome {
            let dispatch = Arc::clone(&self.shared.dispatch);
            let mut ctx = self.touch_context();
            dispatch.dispatch_exit(
                &mut ctx,
                record.actor,
                record.actor_layer,
                record.target,
                record.target_layer,
            );
        }
        outcome
    }

    pub fn tracked_records_for(&self, actor: ActorId) -> usize {
        self.ledger.records_involving(actor)
    }

    /// One fixed step: movement, stay dispatch, effects, then reaping the dead.
    pub fn tick(&mut self, dt_seconds: f32) -> RoomTickStats {
        let mut stats = RoomTickStats::default();
        for actor in self.actors.iter_mut().filter(|actor| !actor.is_dead()) {
            actor.step_moves(dt_seconds);
        }

        let dispatch = Arc::clone(&self.shared.dispatch);
        for record in self.ledger.touching() {
            if !self.actors.is_alive(record.actor) {
                continue;
            }
            if let TouchTarget::Actor(other) = record.target {
                if !self.actors.is_alive(other) {
                    continue;
                }
            }
            let mut ctx = self.touch_context();
            if dispatch.dispatch(
                &mut ctx,
                record.actor,
                record.actor_layer,
                record.target,
                record.target_layer,
            ) {
                stats.stay_dispatches += 1;
            }
        }

        let firings = self.effects.tick(dt_seconds);
        stats.effect_firings = firings.len();
        for firing in firings {
            match firing.action {
                EffectAction::Damage(amount) => {
                    self.touch_context().damage(firing.actor, amount);
                }
                EffectAction::ClearInvincibility => {
                    if let Some(actor) = self.actors.get_mut(firing.actor) {
                        actor.unset_flag(ActorFlags::INVINCIBLE);
                    }
                }
            }
        }

        for id in self.actors.dead_ids() {
            self.destroy_actor(id);
            stats.reaped += 1;
        }

        self.path_tasks.retain(|task| !task.is_finished());
        if stats != RoomTickStats::default() {
            debug!(
                room = %self.id,
                stay = stats.stay_dispatches,
                effects = stats.effect_firings,
                reaped = stats.reaped,
                "room_tick"
            );
        }
        stats
    }

    /// A room-locking actor counts toward the unlock however it goes.
    pub fn destroy_actor(&mut self, id: ActorId) -> bool {
        self.rules.remove_all(id);
        self.effects.remove_all(id);
        let purged = self.ledger.purge_actor(id);
        let Some(actor) = self.actors.remove(id) else {
            return false;
        };
        debug!(room = %self.id, actor = id.0, purged, "actor_destroyed");
        if actor.locks_room {
            self.locker_killed();
        }
        true
    }

    pub fn add_effect(&mut self, actor: ActorId, kind: EffectKind) {
        self.effects.add(actor, kind);
    }

    pub fn remove_effect(&mut self, actor: ActorId, kind: EffectKind) {
        self.effects.flag_for_removal(actor, kind);
    }

    pub fn clear_effects(&mut self, actor: ActorId) {
        self.effects.remove_all(actor);
    }

    pub fn effects(&self) -> &StatusEffectScheduler {
        &self.effects
    }

    pub fn add_exception_rule(&mut self, a: ActorId, b: ActorId) {
        self.rules.add(a, b);
    }

    pub fn rule_exists(&self, a: ActorId, b: ActorId) -> bool {
        self.rules.exists(a, b)
    }

    pub fn clear_rules(&mut self, actor: ActorId) {
        self.rules.remove_all(actor);
    }

    pub fn on_touch_effects(&mut self, on_touch: OnTouch, instigator: ActorId, target: ActorId) {
        self.touch_context()
            .apply_on_touch(on_touch, instigator, target);
    }

    pub fn fire_projectile(
        &mut self,
        owner: ActorId,
        speed: f32,
        on_touch: OnTouch,
    ) -> Option<ActorId> {
        let (position, facing) = self
            .actors
            .get(owner)
            .filter(|actor| !actor.is_dead())
            .map(|actor| (actor.position, actor.facing))?;
        let projectile =
            self.spawn_actor(ActorKind::Projectile, position + PROJECTILE_SPAWN_OFFSET, facing);
        if let Some(actor) = self.actors.get_mut(projectile) {
            actor.velocity = facing.to_vec2().normalized() * speed;
            actor.speed = speed;
            actor.on_touch = Some(on_touch);
        }
        self.rules.add(projectile, owner);
        Some(projectile)
    }

    pub fn lock(&mut self, enemy_count: u32) {
        self.lock.remaining = enemy_count;
        if enemy_count > 0 {
            info!(room = %self.id, enemy_count, "room_locked");
        }
    }

    pub fn locker_killed(&mut self) {
        if !self.lock.is_locked() {
            return;
        }
        self.lock.remaining -= 1;
        if !self.lock.is_locked() {
            info!(room = %self.id, "room_unlocked");
        }
    }

    pub fn room_lock(&self) -> RoomLock {
        self.lock
    }

    /// Queues a route from the actor's cell to `target`. Results arrive through
    /// `drain_path_results` on a later tick. Returns `false` for unknown actors.
    pub fn request_path(&mut self, actor: ActorId, target: Cell) -> Result<bool, PathRequestError> {
        let Some(start) = self.actors.get(actor).map(Actor::cell) else {
            return Ok(false);
        };
        let Some(pool) = self.pathfinders.as_ref() else {
            panic!("{} has no passability grid", self.id);
        };
        let task = pathfinding::request_path(pool, &self.inbox, actor, start, target)?;
        self.path_tasks.push(task);
        Ok(true)
    }

    pub fn drain_path_results(&mut self) -> Vec<PathOutcome> {
        let mut outcomes = self.inbox.drain();
        outcomes.retain(|outcome| {
            let alive = self.actors.is_alive(outcome.actor);
            if !alive {
                warn!(room = %self.id, actor = outcome.actor.0, "path_result_dropped");
            }
            alive
        });
        outcomes
    }

    pub fn pending_path_tasks(&self) -> usize {
        self.path_tasks.len()
    }

    pub fn take_world_requests(&mut self) -> Vec<WorldRequest> {
        mem::take(&mut self.requests)
    }
}
