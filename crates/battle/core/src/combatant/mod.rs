//! Combatants: the monsters fighting on either side of a battle.
//!
//! A [`Combatant`] owns its health, attack, ordered status effects and card
//! deck. Health is kept inside `0..=max_hp` by construction; every mutation
//! goes through [`Combatant::take_damage`] or [`Combatant::heal`], which also
//! notify the combatant's observers.

mod observer;

pub use observer::{CombatantEvent, ObserverId, Observers};

use strum::{Display, EnumString};

use crate::card::Card;
use crate::status::{EffectKind, StatusEffect};

/// Monster type used whenever encounter data cannot be resolved.
pub const FALLBACK_MONSTER_TYPE: &str = "Knight";

/// Team affiliation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    Player,
    Enemy,
}

impl Side {
    pub const fn opponent(self) -> Side {
        match self {
            Side::Player => Side::Enemy,
            Side::Enemy => Side::Player,
        }
    }
}

/// Battle-local identity of a combatant: its side and its slot in that team.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantId {
    pub side: Side,
    pub slot: u16,
}

impl CombatantId {
    pub const fn new(side: Side, slot: u16) -> Self {
        Self { side, slot }
    }
}

impl core::fmt::Display for CombatantId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}#{}", self.side, self.slot)
    }
}

/// A monster taking part in a battle.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Combatant {
    id: CombatantId,
    monster_type: String,
    hp: u32,
    max_hp: u32,
    attack: u32,
    effects: Vec<StatusEffect>,
    deck: Vec<Card>,
    #[cfg_attr(feature = "serde", serde(skip))]
    observers: Observers,
}

impl Combatant {
    /// Creates a combatant at full health.
    ///
    /// The id is a placeholder until the combatant is placed on a
    /// [`crate::Battlefield`], which assigns the real side and slot.
    pub fn new(monster_type: impl Into<String>, max_hp: u32, attack: u32) -> Self {
        Self {
            id: CombatantId::new(Side::Player, 0),
            monster_type: monster_type.into(),
            hp: max_hp,
            max_hp,
            attack,
            effects: Vec::new(),
            deck: Vec::new(),
            observers: Observers::default(),
        }
    }

    /// Built-in stats for the universal fallback enemy.
    pub fn fallback_knight() -> Self {
        Self::new(FALLBACK_MONSTER_TYPE, 40, 6)
    }

    /// Sets current health, clamped to `0..=max_hp`.
    pub fn with_hp(mut self, hp: u32) -> Self {
        self.hp = hp.min(self.max_hp);
        self
    }

    pub fn with_deck(mut self, deck: Vec<Card>) -> Self {
        self.deck = deck;
        self
    }

    pub fn with_effect(mut self, effect: StatusEffect) -> Self {
        self.add_effect(effect);
        self
    }

    pub(crate) fn assign_id(&mut self, id: CombatantId) {
        self.id = id;
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> CombatantId {
        self.id
    }

    pub fn side(&self) -> Side {
        self.id.side
    }

    pub fn monster_type(&self) -> &str {
        &self.monster_type
    }

    pub fn hp(&self) -> u32 {
        self.hp
    }

    pub fn max_hp(&self) -> u32 {
        self.max_hp
    }

    pub fn attack(&self) -> u32 {
        self.attack
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn is_dead(&self) -> bool {
        self.hp == 0
    }

    pub fn deck(&self) -> &[Card] {
        &self.deck
    }

    /// Active and not-yet-pruned effects in application order.
    pub fn effects(&self) -> &[StatusEffect] {
        &self.effects
    }

    /// Mutable view used by effect behaviors to consume their own counters.
    ///
    /// The slice cannot grow or shrink; use [`Combatant::add_effect`] and
    /// [`Combatant::prune_expired`] for that.
    pub fn effects_mut(&mut self) -> &mut [StatusEffect] {
        &mut self.effects
    }

    pub fn effect(&self, kind: EffectKind) -> Option<&StatusEffect> {
        self.effects.iter().find(|e| e.kind == kind)
    }

    /// Returns true if a non-expired effect of this kind is attached.
    pub fn has_effect(&self, kind: EffectKind) -> bool {
        self.effects
            .iter()
            .any(|e| e.kind == kind && !e.is_expired())
    }

    // ========================================================================
    // Health
    // ========================================================================

    /// Reduces health by up to `amount` and returns the HP actually lost.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let old = self.hp;
        self.hp = old.saturating_sub(amount);
        let lost = old - self.hp;
        if lost > 0 {
            self.observers.notify(CombatantEvent::HealthChanged {
                id: self.id,
                old,
                new: self.hp,
            });
        }
        lost
    }

    /// Restores health up to `max_hp` and returns the HP actually gained.
    ///
    /// Dead combatants are not revived by healing.
    pub fn heal(&mut self, amount: u32) -> u32 {
        if self.is_dead() {
            return 0;
        }
        let old = self.hp;
        self.hp = old.saturating_add(amount).min(self.max_hp);
        let gained = self.hp - old;
        if gained > 0 {
            self.observers.notify(CombatantEvent::HealthChanged {
                id: self.id,
                old,
                new: self.hp,
            });
        }
        gained
    }

    // ========================================================================
    // Status effects
    // ========================================================================

    /// Attaches an effect, merging it into an existing effect of the same kind.
    pub fn add_effect(&mut self, effect: StatusEffect) {
        if let Some(existing) = self.effects.iter_mut().find(|e| e.kind == effect.kind) {
            existing.merge(&effect);
            return;
        }
        self.effects.push(effect);
        self.observers.notify(CombatantEvent::StatusAdded {
            id: self.id,
            kind: effect.kind,
        });
    }

    /// Removes an effect immediately, regardless of its counters.
    pub fn remove_effect(&mut self, kind: EffectKind) -> Option<StatusEffect> {
        let index = self.effects.iter().position(|e| e.kind == kind)?;
        let removed = self.effects.remove(index);
        self.observers.notify(CombatantEvent::StatusRemoved { id: self.id, kind });
        Some(removed)
    }

    /// Drops every expired effect and returns the kinds that were removed.
    pub fn prune_expired(&mut self) -> Vec<EffectKind> {
        let mut removed = Vec::new();
        self.effects.retain(|e| {
            if e.is_expired() {
                removed.push(e.kind);
                false
            } else {
                true
            }
        });
        for &kind in &removed {
            self.observers.notify(CombatantEvent::StatusRemoved { id: self.id, kind });
        }
        removed
    }

    pub fn clear_effects(&mut self) {
        let kinds: Vec<_> = self.effects.drain(..).map(|e| e.kind).collect();
        for kind in kinds {
            self.observers.notify(CombatantEvent::StatusRemoved { id: self.id, kind });
        }
    }

    // ========================================================================
    // Observers
    // ========================================================================

    pub fn observe(
        &mut self,
        observer: impl Fn(&CombatantEvent) + Send + Sync + 'static,
    ) -> ObserverId {
        self.observers.add(observer)
    }

    pub fn unobserve(&mut self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }

    /// Drops every observer; call on teardown.
    pub fn clear_observers(&mut self) {
        self.observers.clear();
    }
}
