use tracing::info;

use super::context::TouchContext;
use super::matrix::{DispatchTablesBuilder, Layer, TouchHandlers};
use crate::actor::{ActorFlags, ActorId, ActorKind};
use crate::effects::EffectKind;
use crate::geometry::Direction;
use crate::room::{RoomType, WorldRequest};
use crate::tiles::{TileId, TileInstance, TileProperties};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardLayers {
    pub player: Layer,
    pub enemy: Layer,
    pub projectile: Layer,
    pub familiar: Layer,
    pub terrain: Layer,
    pub terrain_trigger: Layer,
    pub barrier: Layer,
}

impl StandardLayers {
    pub fn for_kind(&self, kind: ActorKind) -> Layer {
        match kind {
            ActorKind::Player => self.player,
            ActorKind::Enemy => self.enemy,
            ActorKind::Projectile => self.projectile,
            ActorKind::Familiar => self.familiar,
        }
    }

    pub fn for_tile(&self, properties: TileProperties) -> Layer {
        if properties.trigger {
            self.terrain_trigger
        } else {
            self.terrain
        }
    }
}

pub fn register_standard_responses(builder: &mut DispatchTablesBuilder, layers: StandardLayers) {
    let trigger_tiles = TouchHandlers::new().on_tile(on_trigger_tile);
    let trigger_tile_exit = TouchHandlers::new().on_tile(on_trigger_tile_exit);
    builder
        .register(layers.player, layers.terrain_trigger, trigger_tiles.clone())
        .register(layers.enemy, layers.terrain_trigger, trigger_tiles)
        .register_exit(
            layers.player,
            layers.terrain_trigger,
            trigger_tile_exit.clone(),
        )
        .register_exit(layers.enemy, layers.terrain_trigger, trigger_tile_exit);

    let actor_touch = TouchHandlers::new().on_actor(on_trigger_actor);
    builder
        .register(layers.projectile, layers.player, actor_touch.clone())
        .register(layers.projectile, layers.enemy, actor_touch.clone())
        .register(layers.player, layers.enemy, actor_touch);

    builder
        .register(
            layers.projectile,
            layers.terrain,
            TouchHandlers::new().on_tile(kill_on_tile),
        )
        .register(
            layers.projectile,
            layers.barrier,
            TouchHandlers::new().on_default(kill_on_collide),
        )
        .register(
            layers.player,
            layers.barrier,
            TouchHandlers::new().on_boundary(on_player_boundary),
        );
}

fn kill_on_collide(ctx: &mut TouchContext<'_>, actor: ActorId) {
    ctx.kill(actor);
}

fn kill_on_tile(ctx: &mut TouchContext<'_>, actor: ActorId, _tile: TileInstance) {
    ctx.kill(actor);
}

fn on_trigger_actor(ctx: &mut TouchContext<'_>, a: ActorId, b: ActorId) {
    if ctx.rule_exists(a, b) {
        return;
    }
    let on_touch_a = ctx.actors.get(a).and_then(|actor| actor.on_touch);
    let on_touch_b = ctx.actors.get(b).and_then(|actor| actor.on_touch);
    if let Some(on_touch) = on_touch_a {
        ctx.apply_on_touch(on_touch, a, b);
    }
    if let Some(on_touch) = on_touch_b {
        ctx.apply_on_touch(on_touch, b, a);
    }
}

fn on_trigger_tile(ctx: &mut TouchContext<'_>, actor: ActorId, tile: TileInstance) {
    let is_player = ctx.kind_of(actor) == Some(ActorKind::Player);
    let request = match tile.tile.id {
        TileId::Portal if is_player => WorldRequest::BeginSection {
            direction: None,
            room_type: RoomType::Plains,
        },
        TileId::PlainsDoor if is_player => WorldRequest::BeginSection {
            direction: Some(Direction::Front),
            room_type: RoomType::Dungeon,
        },
        TileId::DungeonDoor if is_player => WorldRequest::BeginSection {
            direction: Some(Direction::Back),
            room_type: RoomType::Plains,
        },
        TileId::Spikes => {
            if !ctx.has_flag(actor, ActorFlags::INVINCIBLE) {
                ctx.add_effect(actor, EffectKind::Spikes);
            }
            return;
        }
        _ => return,
    };
    info!(actor = actor.0, tile = ?tile.tile.id, request = ?request, "section_requested");
    ctx.request(request);
}

fn on_trigger_tile_exit(ctx: &mut TouchContext<'_>, actor: ActorId, tile: TileInstance) {
    if tile.tile.id == TileId::Spikes {
        ctx.flag_effect_for_removal(actor, EffectKind::Spikes);
    }
}

fn on_player_boundary(ctx: &mut TouchContext<'_>, _actor: ActorId, direction: Direction) {
    if ctx.room_locked {
        return;
    }
    ctx.request(WorldRequest::LoadNeighbor(direction));
}
