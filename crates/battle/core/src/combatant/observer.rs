//! Entity-owned observer lists.
//!
//! Observers are plain callbacks registered on one combatant. Registration
//! returns an [`ObserverId`] that must be handed back to
//! [`Observers::remove`] on teardown; nothing holds a reference back into the
//! observing object, so a forgotten observer can only keep its own closure
//! alive.

use core::fmt;

use super::CombatantId;
use crate::status::EffectKind;

/// Domain events raised by a combatant when its state changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CombatantEvent {
    HealthChanged {
        id: CombatantId,
        old: u32,
        new: u32,
    },
    StatusAdded {
        id: CombatantId,
        kind: EffectKind,
    },
    StatusRemoved {
        id: CombatantId,
        kind: EffectKind,
    },
}

/// Handle returned by [`Observers::add`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u32);

type ObserverFn = Box<dyn Fn(&CombatantEvent) + Send + Sync>;

/// Ordered observer registrations owned by a combatant.
///
/// Cloning a combatant never copies its observers: a clone is an
/// independent entity and starts with an empty list.
#[derive(Default)]
pub struct Observers {
    next_id: u32,
    entries: Vec<(ObserverId, ObserverFn)>,
}

impl Observers {
    pub fn add(
        &mut self,
        observer: impl Fn(&CombatantEvent) + Send + Sync + 'static,
    ) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.push((id, Box::new(observer)));
        id
    }

    /// Removes an observer. Returns false if it was already gone.
    pub fn remove(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn notify(&self, event: CombatantEvent) {
        for (_, observer) in &self.entries {
            observer(&event);
        }
    }
}

impl Clone for Observers {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("len", &self.entries.len())
            .finish()
    }
}
