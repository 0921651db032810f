//! Authoritative particle and threat storage.

use std::collections::BTreeMap;

use roomba_core::{ParticleId, ParticleKind, Position, ThreatId};

/// Identifier type that a registry can allocate.
pub(crate) trait RegistryKey: Copy + Ord {
    fn from_raw(raw: u32) -> Self;
}

impl RegistryKey for ParticleId {
    fn from_raw(raw: u32) -> Self {
        ParticleId::new(raw)
    }
}

impl RegistryKey for ThreatId {
    fn from_raw(raw: u32) -> Self {
        ThreatId::new(raw)
    }
}

/// State stored for a particle inside the world.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Particle {
    pub(crate) position: Position,
    pub(crate) kind: ParticleKind,
}

/// State stored for a threat inside the world.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Threat {
    pub(crate) position: Position,
}

#[derive(Clone, Debug)]
struct Slot<V> {
    value: V,
    active: bool,
}

/// Registry that stores entities and manages identifier allocation.
///
/// Identifiers grow monotonically and are never handed out twice, so an entry
/// that was deactivated or compacted away can never come back to life.
#[derive(Clone, Debug)]
pub(crate) struct Registry<K, V> {
    entries: BTreeMap<K, Slot<V>>,
    next_raw: u32,
    inactive: usize,
}

impl<K: RegistryKey, V> Registry<K, V> {
    /// Creates an empty registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_raw: 0,
            inactive: 0,
        }
    }

    /// Stores a new active entity and returns its identifier.
    pub(crate) fn insert(&mut self, value: V) -> K {
        let id = K::from_raw(self.next_raw);
        self.next_raw = self.next_raw.wrapping_add(1);
        let _ = self.entries.insert(
            id,
            Slot {
                value,
                active: true,
            },
        );
        id
    }

    /// Active entities in ascending identifier order.
    pub(crate) fn iter_active(&self) -> impl Iterator<Item = (K, &V)> {
        self.entries
            .iter()
            .filter(|(_, slot)| slot.active)
            .map(|(id, slot)| (*id, &slot.value))
    }

    /// Reports whether `id` refers to a stored, active entity.
    pub(crate) fn is_active(&self, id: K) -> bool {
        self.entries.get(&id).is_some_and(|slot| slot.active)
    }

    /// Marks the entity inactive, returning `true` only for the first deactivation.
    pub(crate) fn deactivate(&mut self, id: K) -> bool {
        match self.entries.get_mut(&id) {
            Some(slot) if slot.active => {
                slot.active = false;
                self.inactive += 1;
                true
            }
            _ => false,
        }
    }

    /// Number of active entities.
    pub(crate) fn active_len(&self) -> usize {
        self.entries.len() - self.inactive
    }

    /// Number of deactivated entities still stored.
    pub(crate) fn inactive_len(&self) -> usize {
        self.inactive
    }

    /// Number of stored entities, active or not.
    pub(crate) fn stored_len(&self) -> usize {
        self.entries.len()
    }

    /// Drops every inactive entry and returns how many were removed.
    pub(crate) fn compact(&mut self) -> usize {
        let removed = self.inactive;
        if removed > 0 {
            self.entries.retain(|_, slot| slot.active);
            self.inactive = 0;
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle() -> Particle {
        Particle {
            position: Position::new(1.0, 2.0),
            kind: ParticleKind::Neutral,
        }
    }

    #[test]
    fn deactivation_is_idempotent() {
        let mut registry: Registry<ParticleId, Particle> = Registry::new();
        let id = registry.insert(particle());

        assert!(registry.deactivate(id));
        assert!(!registry.deactivate(id));
        assert_eq!(registry.inactive_len(), 1);
        assert_eq!(registry.active_len(), 0);
    }

    #[test]
    fn compaction_keeps_identifiers_unique() {
        let mut registry: Registry<ParticleId, Particle> = Registry::new();
        let first = registry.insert(particle());
        let _ = registry.insert(particle());
        assert!(registry.deactivate(first));

        assert_eq!(registry.compact(), 1);
        assert_eq!(registry.stored_len(), 1);
        assert!(!registry.is_active(first));

        let third = registry.insert(particle());
        assert_eq!(third, ParticleId::new(2));
    }
}
