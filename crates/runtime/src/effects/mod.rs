//! Status effect behaviors and the processor that runs them.
//!
//! Every [`EffectKind`] is bound to one stateless [`EffectBehavior`]. A
//! behavior declares which [`Triggers`] it reacts to and implements only
//! those hook methods; the counters it mutates live on the combatant's
//! [`StatusEffect`], never on the behavior itself.
//!
//! The [`EffectProcessor`] owns the kind → behavior table. At every trigger
//! point it walks the relevant combatant's effects in behavior priority order,
//! applies what the behaviors return, prunes effects that expired and
//! announces the changes on the event bus.
//!
//! # Trigger points
//!
//! | Trigger              | Runs on      | Used by                  |
//! |----------------------|--------------|--------------------------|
//! | `DAMAGE_TAKEN`       | target       | Shield                   |
//! | `DAMAGE_DEALT`       | attacker     | Strength                 |
//! | `CARD_PLAYED`        | actor        | Stun                     |
//! | `TURN_END`           | owner        | Poison, Regeneration, ...|
//! | `EFFECT_APPLIED`     | target       | Fortify                  |
//! | `AFTER_DAMAGE_TAKEN` | target       | Thorns                   |

mod behaviors;
mod pipeline;
mod processor;

use battle_core::{Card, Combatant, CombatantId, EffectKind, StatusEffect};
use bitflags::bitflags;
use strum::Display;
use thiserror::Error;

pub use behaviors::{
    FortifyBehavior, POISON_DAMAGE_PER_STACK, PoisonBehavior, RegenerationBehavior,
    ShieldBehavior, StrengthBehavior, StunBehavior, ThornsBehavior,
};
pub use pipeline::Hit;
pub use processor::{EffectProcessor, EffectProcessorBuilder};

bitflags! {
    /// Hook points an [`EffectBehavior`] participates in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Triggers: u8 {
        const DAMAGE_TAKEN = 1 << 0;
        const DAMAGE_DEALT = 1 << 1;
        const CARD_PLAYED = 1 << 2;
        const TURN_END = 1 << 3;
        const EFFECT_APPLIED = 1 << 4;
        const AFTER_DAMAGE_TAKEN = 1 << 5;
    }
}

/// Where a hit of damage came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum DamageSource {
    /// A basic attack.
    Attack,
    /// A damage step of a card.
    Card,
    /// A periodic effect ticking on its owner.
    StatusTick,
    /// Damage bounced back by a reactive effect.
    Reflect,
}

impl DamageSource {
    /// Direct hits from a combatant, as opposed to ticks and reflections.
    pub const fn is_direct(self) -> bool {
        matches!(self, Self::Attack | Self::Card)
    }
}

/// Context handed to damage hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageContext {
    /// The combatant whose effect is being consulted.
    pub owner: CombatantId,
    pub source: Option<CombatantId>,
    pub target: CombatantId,
    pub damage_source: DamageSource,
}

/// Read-only facts about an effect's owner, for hooks that also hold the
/// owner's effect mutably.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerView {
    pub id: CombatantId,
    pub hp: u32,
    pub max_hp: u32,
}

impl From<&Combatant> for OwnerView {
    fn from(combatant: &Combatant) -> Self {
        Self {
            id: combatant.id(),
            hp: combatant.hp(),
            max_hp: combatant.max_hp(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardPlayVerdict {
    Allowed,
    Prevented { by: EffectKind, reason: String },
}

impl CardPlayVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// What a periodic effect does to its owner at turn end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnEndOutcome {
    pub damage: u32,
    pub heal: u32,
}

/// Follow-up work requested by an after-damage hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Reflect { to: CombatantId, amount: u32 },
}

/// How incoming modifiers changed one hit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DamageModification {
    pub raw: u32,
    pub blocked: u32,
    pub final_damage: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EffectError {
    #[error("combatant {0} is not on the battlefield")]
    UnknownCombatant(CombatantId),
}

/// Strategy bound to one [`EffectKind`].
///
/// Hook methods default to "no change". The processor only calls the ones
/// whose flag is present in [`EffectBehavior::triggers`].
pub trait EffectBehavior: Send + Sync {
    fn kind(&self) -> EffectKind;

    fn triggers(&self) -> Triggers;

    /// Order among effects consulted at the same trigger. Lower runs first.
    ///
    /// This overrides the order effects were attached in; attachment order
    /// only breaks ties. Flat modifiers should run before absorbers so
    /// shields see the final amount.
    fn priority(&self) -> i32 {
        0
    }

    /// Adjusts damage the owner is about to take. May only lower it.
    fn on_damage_taken(
        &self,
        _ctx: &DamageContext,
        incoming: u32,
        _effect: &mut StatusEffect,
    ) -> u32 {
        incoming
    }

    /// Adjusts damage the owner is about to deal.
    fn on_damage_dealt(
        &self,
        _ctx: &DamageContext,
        outgoing: u32,
        _effect: &mut StatusEffect,
    ) -> u32 {
        outgoing
    }

    fn on_card_played(
        &self,
        _actor: &Combatant,
        _card: &Card,
        _effect: &StatusEffect,
    ) -> CardPlayVerdict {
        CardPlayVerdict::Allowed
    }

    fn on_turn_end(&self, _owner: OwnerView, _effect: &mut StatusEffect) -> TurnEndOutcome {
        TurnEndOutcome::default()
    }

    /// Rewrites an effect about to land on the owner. `existing` is the
    /// owner's effect bound to this behavior.
    fn on_effect_applied(&self, _incoming: &mut StatusEffect, _existing: &StatusEffect) {}

    fn after_damage_taken(
        &self,
        _ctx: &DamageContext,
        _damage: u32,
        _effect: &StatusEffect,
    ) -> Option<Reaction> {
        None
    }
}
