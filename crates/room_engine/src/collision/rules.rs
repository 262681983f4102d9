use std::collections::{HashMap, HashSet};

use crate::actor::ActorId;

#[derive(Debug, Default)]
pub struct CollisionRules {
    pairs: HashMap<ActorId, HashSet<ActorId>>,
}

impl CollisionRules {
    pub fn add(&mut self, a: ActorId, b: ActorId) {
        self.pairs.entry(a).or_default().insert(b);
        self.pairs.entry(b).or_default().insert(a);
    }

    pub fn exists(&self, a: ActorId, b: ActorId) -> bool {
        self.pairs.get(&a).is_some_and(|others| others.contains(&b))
    }

    pub fn remove_all(&mut self, actor: ActorId) {
        let Some(others) = self.pairs.remove(&actor) else {
            return;
        };
        for other in others {
            let Some(set) = self.pairs.get_mut(&other) else {
                continue;
            };
            set.remove(&actor);
            if set.is_empty() {
                self.pairs.remove(&other);
            }
        }
    }

    pub fn rules_for(&self, actor: ActorId) -> usize {
        self.pairs.get(&actor).map_or(0, HashSet::len)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_are_symmetric() {
        let mut rules = CollisionRules::default();
        rules.add(ActorId(4), ActorId(1));
        assert!(rules.exists(ActorId(1), ActorId(4)));
        assert!(rules.exists(ActorId(4), ActorId(1)));
        assert!(!rules.exists(ActorId(1), ActorId(2)));
    }

    #[test]
    fn remove_all_clears_both_sides() {
        let mut rules = CollisionRules::default();
        rules.add(ActorId(1), ActorId(2));
        rules.add(ActorId(1), ActorId(3));
        rules.add(ActorId(2), ActorId(3));

        rules.remove_all(ActorId(1));

        assert!(!rules.exists(ActorId(2), ActorId(1)));
        assert!(!rules.exists(ActorId(3), ActorId(1)));
        assert!(rules.exists(ActorId(2), ActorId(3)));
        assert_eq!(rules.rules_for(ActorId(1)), 0);
    }

    #[test]
    fn adding_twice_keeps_one_rule() {
        let mut rules = CollisionRules::default();
        rules.add(ActorId(1), ActorId(2));
        rules.add(ActorId(2), ActorId(1));
        assert_eq!(rules.rules_for(ActorId(1)), 1);
        rules.remove_all(ActorId(2));
        assert!(rules.is_empty());
    }
}
