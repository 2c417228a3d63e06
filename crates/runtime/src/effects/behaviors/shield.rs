//! Shield: absorbs incoming damage and is consumed by it.

use battle_core::{EffectKind, StatusEffect};

use super::amount;
use crate::effects::{DamageContext, EffectBehavior, Triggers};

/// Absorbs up to its magnitude of each hit, losing what it absorbed.
///
/// Runs after every other incoming modifier so it only soaks what is left.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShieldBehavior;

impl EffectBehavior for ShieldBehavior {
    fn kind(&self) -> EffectKind {
        EffectKind::Shield
    }

    fn triggers(&self) -> Triggers {
        Triggers::DAMAGE_TAKEN
    }

    fn priority(&self) -> i32 {
        100
    }

    fn on_damage_taken(
        &self,
        _ctx: &DamageContext,
        incoming: u32,
        effect: &mut StatusEffect,
    ) -> u32 {
        let absorbed = amount(effect.magnitude).min(incoming);
        effect.magnitude -= absorbed as i32;
        incoming - absorbed
    }
}
