use crate::collision::Layer;
use crate::geometry::{Cell, Direction, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorKind {
    Player,
    Enemy,
    Projectile,
    Familiar,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ActorFlags(u8);

impl ActorFlags {
    pub const NONE: Self = Self(0);
    pub const DEAD: Self = Self(1);
    pub const INVINCIBLE: Self = Self(1 << 1);
    pub const INVINCIBLE_FRAMES: Self = Self(1 << 2);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}

impl Health {
    pub fn full(max: i32) -> Self {
        Self { current: max, max }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Knockback {
    None,
    Constant { force: f32 },
    Variable { force: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OnTouch {
    pub damage: i32,
    pub knockback: Knockback,
    pub die_on_touch: bool,
    pub add_collision_rule: bool,
}

impl OnTouch {
    pub fn damage(amount: i32) -> Self {
        Self {
            damage: amount,
            knockback: Knockback::None,
            die_on_touch: false,
            add_collision_rule: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Move {
    pub start: Vec2,
    pub end: Vec2,
    pub direction: Direction,
    pub speed: f32,
    pub cells_left: u32,
}

impl Move {
    pub fn new(start: Vec2, speed: f32, cells: u32, direction: Direction) -> Self {
        Self {
            start,
            end: start + direction.to_vec2(),
            direction,
            speed,
            cells_left: cells,
        }
    }

    pub fn reached_new_cell(&mut self) {
        self.cells_left = self.cells_left.saturating_sub(1);
        self.end = self.end + self.direction.to_vec2();
    }

    pub fn end_cell(&self) -> Cell {
        Cell::containing(self.end)
    }

    pub fn is_active(&self) -> bool {
        self.cells_left > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    Ignored,
    Survived { grant_invincibility: bool },
    Died,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub id: ActorId,
    pub kind: ActorKind,
    pub layer: Layer,
    pub facing: Direction,
    pub position: Vec2,
    pub velocity: Vec2,
    pub speed: f32,
    pub flags: ActorFlags,
    pub health: Option<Health>,
    pub on_touch: Option<OnTouch>,
    pub rooted: bool,
    /// Destroying this actor counts toward unlocking a locked room.
    pub locks_room: bool,
    pub forced_move: Option<Move>,
    pub normal_move: Option<Move>,
}

impl Actor {
    pub fn has_flag(&self, flag: ActorFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn set_flag(&mut self, flag: ActorFlags) {
        self.flags.insert(flag);
    }

    pub fn unset_flag(&mut self, flag: ActorFlags) {
        self.flags.remove(flag);
    }

    pub fn is_dead(&self) -> bool {
        self.has_flag(ActorFlags::DEAD)
    }

    pub fn cell(&self) -> Cell {
        Cell::containing(self.position)
    }

    pub fn facing_dir(&self) -> Vec2 {
        self.velocity.normalized()
    }

    pub fn apply_knockback(&mut self, direction: Vec2, force: f32) {
        if self.rooted {
            return;
        }
        self.velocity = direction * force;
    }

    pub fn apply_damage(&mut self, amount: i32) -> DamageOutcome {
        let Some(health) = self.health.as_mut() else {
            return DamageOutcome::Ignored;
        };
        health.current = health.current.saturating_sub(amount);
        if health.current <= 0 {
            self.flags.insert(ActorFlags::DEAD);
            return DamageOutcome::Died;
        }
        let grant_invincibility = self.flags.contains(ActorFlags::INVINCIBLE_FRAMES);
        if grant_invincibility {
            self.flags.insert(ActorFlags::INVINCIBLE);
        }
        DamageOutcome::Survived {
            grant_invincibility,
        }
    }

    pub fn step_moves(&mut self, fixed_dt_seconds: f32) {
        let position = self.position;
        let Some(active) = self
            .forced_move
            .as_mut()
            .filter(|m| m.is_active())
            .or_else(|| self.normal_move.as_mut().filter(|m| m.is_active()))
        else {
            return;
        };
        let (next, arrived) = step_toward(position, active.end, active.speed * fixed_dt_seconds);
        if arrived {
            active.reached_new_cell();
        }
        self.position = next;
        if self.forced_move.is_some_and(|m| !m.is_active()) {
            self.forced_move = None;
        }
        if self.normal_move.is_some_and(|m| !m.is_active()) {
            self.normal_move = None;
        }
    }
}

fn step_toward(current: Vec2, target: Vec2, max_step: f32) -> (Vec2, bool) {
    let delta = target - current;
    let distance = delta.length();
    if distance <= max_step || distance <= f32::EPSILON {
        return (target, true);
    }
    (current + delta * (max_step / distance), false)
}

#[derive(Debug, Default)]
pub struct ActorIdAllocator {
    next: u64,
}

impl ActorIdAllocator {
    pub fn allocate(&mut self) -> ActorId {
        let id = ActorId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Default)]
pub struct ActorStore {
    allocator: ActorIdAllocator,
    actors: Vec<Actor>,
}

impl ActorStore {
    pub fn spawn(
        &mut self,
        kind: ActorKind,
        layer: Layer,
        position: Vec2,
        facing: Direction,
    ) -> ActorId {
        let id = self.allocator.allocate();
        self.actors.push(Actor {
            id,
            kind,
            layer,
            facing,
            position,
            velocity: Vec2::ZERO,
            speed: 1.0,
            flags: ActorFlags::NONE,
            health: None,
            on_touch: None,
            rooted: false,
            locks_room: false,
            forced_move: None,
            normal_move: None,
        });
        id
    }

    pub fn remove(&mut self, id: ActorId) -> Option<Actor> {
        let index = self.actors.iter().position(|actor| actor.id == id)?;
        Some(self.actors.remove(index))
    }

    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.actors.iter().find(|actor| actor.id == id)
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|actor| actor.id == id)
    }

    pub fn is_alive(&self, id: ActorId) -> bool {
        self.get(id).is_some_and(|actor| !actor.is_dead())
    }

    pub fn has_flag(&self, id: ActorId, flag: ActorFlags) -> bool {
        self.get(id).is_some_and(|actor| actor.has_flag(flag))
    }

    pub fn dead_ids(&self) -> Vec<ActorId> {
        self.actors
            .iter()
            .filter(|actor| actor.is_dead())
            .map(|actor| actor.id)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.actors.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Actor> {
        self.actors.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn clear(&mut self) {
        self.actors.clear();
    }
}
