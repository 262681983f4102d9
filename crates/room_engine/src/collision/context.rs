use tracing::debug;

use super::rules::CollisionRules;
use crate::actor::{ActorFlags, ActorId, ActorKind, ActorStore, DamageOutcome, Knockback, OnTouch};
use crate::effects::{EffectKind, StatusEffectScheduler};
use crate::geometry::Vec2;
use crate::room::WorldRequest;

/// Handlers never remove actors directly. `kill` only flags the actor, and the
/// room reaps flagged actors at the end of its tick.
pub struct TouchContext<'a> {
    pub actors: &'a mut ActorStore,
    pub effects: &'a mut StatusEffectScheduler,
    pub rules: &'a mut CollisionRules,
    pub requests: &'a mut Vec<WorldRequest>,
    pub room_locked: bool,
}

impl TouchContext<'_> {
    pub fn kind_of(&self, actor: ActorId) -> Option<ActorKind> {
        self.actors.get(actor).map(|actor| actor.kind)
    }

    pub fn has_flag(&self, actor: ActorId, flag: ActorFlags) -> bool {
        self.actors.has_flag(actor, flag)
    }

    pub fn is_alive(&self, actor: ActorId) -> bool {
        self.actors.is_alive(actor)
    }

    pub fn rule_exists(&self, a: ActorId, b: ActorId) -> bool {
        self.rules.exists(a, b)
    }

    pub fn add_rule(&mut self, a: ActorId, b: ActorId) {
        self.rules.add(a, b);
    }

    pub fn add_effect(&mut self, actor: ActorId, kind: EffectKind) {
        self.effects.add(actor, kind);
    }

    pub fn flag_effect_for_removal(&mut self, actor: ActorId, kind: EffectKind) {
        self.effects.flag_for_removal(actor, kind);
    }

    pub fn request(&mut self, request: WorldRequest) {
        self.requests.push(request);
    }

    pub fn damage(&mut self, target: ActorId, amount: i32) -> DamageOutcome {
        let Some(actor) = self.actors.get_mut(target) else {
            return DamageOutcome::Ignored;
        };
        let outcome = actor.apply_damage(amount);
        match outcome {
            DamageOutcome::Survived {
                grant_invincibility: true,
            } => self.effects.add(target, EffectKind::InvincibilityFrames),
            DamageOutcome::Died => {
                debug!(actor = target.0, "actor_died");
            }
            _ => {}
        }
        outcome
    }

    pub fn kill(&mut self, actor: ActorId) {
        let Some(entry) = self.actors.get_mut(actor) else {
            return;
        };
        entry.set_flag(ActorFlags::DEAD);
        self.rules.remove_all(actor);
        self.effects.remove_all(actor);
    }

    pub fn apply_on_touch(&mut self, on_touch: OnTouch, instigator: ActorId, target: ActorId) {
        if self.has_flag(target, ActorFlags::INVINCIBLE) {
            return;
        }
        self.damage(target, on_touch.damage);

        if let Some((direction, force)) = self.knockback_for(on_touch.knockback, instigator, target)
        {
            if let Some(actor) = self.actors.get_mut(target) {
                actor.apply_knockback(direction, force);
            }
        }

        if on_touch.die_on_touch {
            self.kill(instigator);
        } else if on_touch.add_collision_rule {
            self.add_rule(instigator, target);
        }
    }

    fn knockback_for(
        &self,
        knockback: Knockback,
        instigator: ActorId,
        target: ActorId,
    ) -> Option<(Vec2, f32)> {
        let pusher = self.actors.get(instigator)?;
        match knockback {
            Knockback::None => None,
            Knockback::Constant { force } => Some((pusher.facing.to_vec2(), force)),
            Knockback::Variable { force } => {
                let other = self.actors.get(target)?;
                let direction =
                    if pusher.velocity.length_squared() > other.velocity.length_squared() {
                        pusher.facing_dir()
                    } else {
                        -other.facing_dir()
                    };
                Some((direction, force))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::actor::Health;
    use crate::collision::Layer;
    use crate::geometry::Direction;

    #[derive(Default)]
    pub(crate) struct ContextFixture {
        pub actors: ActorStore,
        pub effects: StatusEffectScheduler,
        pub rules: CollisionRules,
        pub requests: Vec<WorldRequest>,
        pub locked: bool,
    }

    impl ContextFixture {
        pub fn spawn_enemy(&mut self) -> ActorId {
            let layer = Layer::new(1).expect("layer");
            let id = self
                .actors
                .spawn(ActorKind::Enemy, layer, Vec2::ZERO, Direction::Back);
            self.actors.get_mut(id).expect("spawned").health = Some(Health::full(3));
            id
        }

        pub fn context(&mut self) -> TouchContext<'_> {
            TouchContext {
                actors: &mut self.actors,
                effects: &mut self.effects,
                rules: &mut self.rules,
                requests: &mut self.requests,
                room_locked: self.locked,
            }
        }
    }

    #[test]
    fn invincible_target_takes_nothing() {
        let mut fixture = ContextFixture::default();
        let thorn = fixture.spawn_enemy();
        let target = fixture.spawn_enemy();
        fixture
            .actors
            .get_mut(target)
            .expect("target")
            .set_flag(ActorFlags::INVINCIBLE);
        let on_touch = OnTouch {
            die_on_touch: true,
            ..OnTouch::damage(2)
        };

        fixture.context().apply_on_touch(on_touch, thorn, target);

        let target = fixture.actors.get(target).expect("target");
        assert_eq!(target.health.map(|h| h.current), Some(3));
        assert!(!fixture.actors.get(thorn).expect("thorn").is_dead());
    }

    #[test]
    fn die_on_touch_kills_instigator_instead_of_adding_rule() {
        let mut fixture = ContextFixture::default();
        let thorn = fixture.spawn_enemy();
        let target = fixture.spawn_enemy();
        let on_touch = OnTouch {
            die_on_touch: true,
            add_collision_rule: true,
            ..OnTouch::damage(1)
        };

        fixture.context().apply_on_touch(on_touch, thorn, target);

        assert!(fixture.actors.get(thorn).expect("thorn").is_dead());
        assert!(!fixture.rules.exists(thorn, target));
        assert_eq!(
            fixture.actors.get(target).and_then(|a| a.health).map(|h| h.current),
            Some(2)
        );
    }

    #[test]
    fn add_collision_rule_blocks_repeat_touch() {
        let mut fixture = ContextFixture::default();
        let a = fixture.spawn_enemy();
        let b = fixture.spawn_enemy();
        let on_touch = OnTouch {
            add_collision_rule: true,
            ..OnTouch::damage(1)
        };
        fixture.context().apply_on_touch(on_touch, a, b);
        assert!(fixture.rules.exists(b, a));
    }

    #[test]
    fn constant_knockback_uses_instigator_facing() {
        let mut fixture = ContextFixture::default();
        let pusher = fixture.spawn_enemy();
        let target = fixture.spawn_enemy();
        fixture.actors.get_mut(pusher).expect("pusher").facing = Direction::Right;
        let on_touch = OnTouch {
            knockback: Knockback::Constant { force: 2.0 },
            ..OnTouch::damage(0)
        };

        fixture.context().apply_on_touch(on_touch, pusher, target);

        let target = fixture.actors.get(target).expect("target");
        assert_eq!(target.velocity, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn variable_knockback_mirrors_faster_target() {
        let mut fixture = ContextFixture::default();
        let pusher = fixture.spawn_enemy();
        let target = fixture.spawn_enemy();
        fixture.actors.get_mut(pusher).expect("pusher").velocity = Vec2::new(0.0, 0.5);
        fixture.actors.get_mut(target).expect("target").velocity = Vec2::new(0.0, -3.0);
        let on_touch = OnTouch {
            knockback: Knockback::Variable { force: 1.0 },
            ..OnTouch::damage(0)
        };

        fixture.context().apply_on_touch(on_touch, pusher, target);

        let target = fixture.actors.get(target).expect("target");
        assert_eq!(target.velocity, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn surviving_with_invincible_frames_schedules_window() {
        let mut fixture = ContextFixture::default();
        let target = fixture.spawn_enemy();
        fixture
            .actors
            .get_mut(target)
            .expect("target")
            .set_flag(ActorFlags::INVINCIBLE_FRAMES);

        let outcome = fixture.context().damage(target, 1);

        assert_eq!(
            outcome,
            DamageOutcome::Survived {
                grant_invincibility: true
            }
        );
        assert!(fixture.effects.has(target, EffectKind::InvincibilityFrames));
        assert!(fixture.actors.has_flag(target, ActorFlags::INVINCIBLE));
    }

    #[test]
    fn kill_drops_rules_and_effects() {
        let mut fixture = ContextFixture::default();
        let a = fixture.spawn_enemy();
        let b = fixture.spawn_enemy();
        fixture.rules.add(a, b);
        fixture.effects.add(a, EffectKind::Spikes);

        fixture.context().kill(a);

        assert!(fixture.actors.has_flag(a, ActorFlags::DEAD));
        assert!(!fixture.rules.exists(a, b));
        assert!(!fixture.effects.has(a, EffectKind::Spikes));
    }
}
