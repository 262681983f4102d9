use std::collections::HashMap;

use crate::actor::ActorId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EffectKind {
    Spikes,
    InvincibilityFrames,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectSettings {
    pub spikes_interval_seconds: f32,
    pub spikes_damage: i32,
    pub invincibility_window_seconds: f32,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            spikes_interval_seconds: 0.5,
            spikes_damage: 1,
            invincibility_window_seconds: 0.1,
        }
    }
}

impl EffectSettings {
    fn initial_seconds(&self, kind: EffectKind) -> f32 {
        match kind {
            EffectKind::Spikes => 0.0,
            EffectKind::InvincibilityFrames => self.invincibility_window_seconds,
        }
    }

    fn interval_seconds(&self, kind: EffectKind) -> Option<f32> {
        match kind {
            EffectKind::Spikes => Some(self.spikes_interval_seconds),
            EffectKind::InvincibilityFrames => None,
        }
    }

    fn action(&self, kind: EffectKind) -> EffectAction {
        match kind {
            EffectKind::Spikes => EffectAction::Damage(self.spikes_damage),
            EffectKind::InvincibilityFrames => EffectAction::ClearInvincibility,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusEffect {
    pub kind: EffectKind,
    pub remaining_seconds: f32,
    pub pending_removal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectAction {
    Damage(i32),
    ClearInvincibility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectFiring {
    pub actor: ActorId,
    pub kind: EffectKind,
    pub action: EffectAction,
}

#[derive(Debug, Default)]
pub struct StatusEffectScheduler {
    settings: EffectSettings,
    effects_by_actor: HashMap<ActorId, Vec<StatusEffect>>,
}

impl StatusEffectScheduler {
    pub fn new(settings: EffectSettings) -> Self {
        Self {
            settings,
            effects_by_actor: HashMap::new(),
        }
    }

    pub fn settings(&self) -> EffectSettings {
        self.settings
    }

    /// At most one effect per kind. Re-adding a flagged effect keeps it alive.
    pub fn add(&mut self, actor: ActorId, kind: EffectKind) {
        let effects = self.effects_by_actor.entry(actor).or_default();
        if let Some(existing) = effects.iter_mut().find(|effect| effect.kind == kind) {
            existing.pending_removal = false;
            return;
        }
        effects.push(StatusEffect {
            kind,
            remaining_seconds: self.settings.initial_seconds(kind),
            pending_removal: false,
        });
    }

    /// The effect is dropped on its next zero-crossing instead of firing.
    pub fn flag_for_removal(&mut self, actor: ActorId, kind: EffectKind) {
        let Some(effects) = self.effects_by_actor.get_mut(&actor) else {
            return;
        };
        if let Some(effect) = effects.iter_mut().find(|effect| effect.kind == kind) {
            effect.pending_removal = true;
        }
    }

    pub fn remove_all(&mut self, actor: ActorId) -> usize {
        self.effects_by_actor
            .remove(&actor)
            .map_or(0, |effects| effects.len())
    }

    pub fn has(&self, actor: ActorId, kind: EffectKind) -> bool {
        self.effect(actor, kind).is_some()
    }

    pub fn is_flagged(&self, actor: ActorId, kind: EffectKind) -> bool {
        self.effect(actor, kind)
            .is_some_and(|effect| effect.pending_removal)
    }

    pub fn effect(&self, actor: ActorId, kind: EffectKind) -> Option<&StatusEffect> {
        self.effects_by_actor
            .get(&actor)?
            .iter()
            .find(|effect| effect.kind == kind)
    }

    pub fn effect_count(&self, actor: ActorId) -> usize {
        self.effects_by_actor.get(&actor).map_or(0, Vec::len)
    }

    pub fn total_effects(&self) -> usize {
        self.effects_by_actor.values().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        self.effects_by_actor.clear();
    }

    /// Advances every timer by `dt_seconds`. Actors are visited in ascending id order.
    pub fn tick(&mut self, dt_seconds: f32) -> Vec<EffectFiring> {
        let mut actor_ids = self.effects_by_actor.keys().copied().collect::<Vec<_>>();
        actor_ids.sort();

        let settings = self.settings;
        let mut firings = Vec::new();
        for actor in actor_ids {
            let Some(effects) = self.effects_by_actor.get_mut(&actor) else {
                continue;
            };
            let mut expired = Vec::new();
            for effect in effects.iter_mut() {
                effect.remaining_seconds -= dt_seconds;
                if effect.remaining_seconds > 0.0 {
                    continue;
                }
                if effect.pending_removal {
                    expired.push(effect.kind);
                    continue;
                }
                firings.push(EffectFiring {
                    actor,
                    kind: effect.kind,
                    action: settings.action(effect.kind),
                });
                match settings.interval_seconds(effect.kind) {
                    Some(interval) => effect.remaining_seconds = interval,
                    None => expired.push(effect.kind),
                }
            }
            effects.retain(|effect| !expired.contains(&effect.kind));
            if effects.is_empty() {
                self.effects_by_actor.remove(&actor);
            }
        }
        firings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn damage_count(firings: &[EffectFiring]) -> usize {
        firings
            .iter()
            .filter(|firing| matches!(firing.action, EffectAction::Damage(_)))
            .count()
    }

    #[test]
    fn add_is_idempotent_per_kind() {
        let mut scheduler = StatusEffectScheduler::default();
        scheduler.add(ActorId(1), EffectKind::Spikes);
        scheduler.add(ActorId(1), EffectKind::Spikes);
        assert_eq!(scheduler.effect_count(ActorId(1)), 1);

        scheduler.add(ActorId(1), EffectKind::InvincibilityFrames);
        assert_eq!(scheduler.effect_count(ActorId(1)), 2);
    }

    #[test]
    fn spikes_fire_on_first_tick_then_every_interval() {
        let mut scheduler = StatusEffectScheduler::default();
        scheduler.add(ActorId(1), EffectKind::Spikes);

        let mut fired = Vec::new();
        for _ in 0..5 {
            fired.push(damage_count(&scheduler.tick(0.25)));
        }
        assert_eq!(fired, vec![1, 0, 1, 0, 1]);
    }

    #[test]
    fn flagged_effect_is_removed_at_next_zero_crossing() {
        let mut scheduler = StatusEffectScheduler::default();
        scheduler.add(ActorId(1), EffectKind::Spikes);
        assert_eq!(damage_count(&scheduler.tick(0.25)), 1);

        scheduler.flag_for_removal(ActorId(1), EffectKind::Spikes);
        assert!(scheduler.is_flagged(ActorId(1), EffectKind::Spikes));
        assert!(scheduler.tick(0.25).is_empty());
        assert!(scheduler.has(ActorId(1), EffectKind::Spikes));
        assert!(scheduler.tick(0.25).is_empty());
        assert!(!scheduler.has(ActorId(1), EffectKind::Spikes));
    }

    #[test]
    fn re_adding_clears_removal_flag() {
        let mut scheduler = StatusEffectScheduler::default();
        scheduler.add(ActorId(1), EffectKind::Spikes);
        scheduler.flag_for_removal(ActorId(1), EffectKind::Spikes);
        scheduler.add(ActorId(1), EffectKind::Spikes);
        assert!(!scheduler.is_flagged(ActorId(1), EffectKind::Spikes));
        assert_eq!(damage_count(&scheduler.tick(0.25)), 1);
    }

    #[test]
    fn one_shot_effect_fires_once_and_is_dropped() {
        let mut scheduler = StatusEffectScheduler::new(EffectSettings {
            invincibility_window_seconds: 0.5,
            ..EffectSettings::default()
        });
        scheduler.add(ActorId(2), EffectKind::InvincibilityFrames);

        assert!(scheduler.tick(0.25).is_empty());
        let firings = scheduler.tick(0.25);
        assert_eq!(
            firings,
            vec![EffectFiring {
                actor: ActorId(2),
                kind: EffectKind::InvincibilityFrames,
                action: EffectAction::ClearInvincibility,
            }]
        );
        assert_eq!(scheduler.total_effects(), 0);
    }

    #[test]
    fn firings_are_ordered_by_actor_id() {
        let mut scheduler = StatusEffectScheduler::default();
        for id in [9, 3, 5] {
            scheduler.add(ActorId(id), EffectKind::Spikes);
        }
        let actors: Vec<ActorId> = scheduler.tick(0.1).iter().map(|f| f.actor).collect();
        assert_eq!(actors, vec![ActorId(3), ActorId(5), ActorId(9)]);
    }

    #[test]
    fn remove_all_drops_every_kind() {
        let mut scheduler = StatusEffectScheduler::default();
        scheduler.add(ActorId(4), EffectKind::Spikes);
        scheduler.add(ActorId(4), EffectKind::InvincibilityFrames);
        assert_eq!(scheduler.remove_all(ActorId(4)), 2);
        assert_eq!(scheduler.effect_count(ActorId(4)), 0);
        assert!(scheduler.tick(1.0).is_empty());
    }
}
