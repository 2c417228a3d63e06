//! Built-in effect behaviors, one per [`battle_core::EffectKind`].

mod fortify;
mod poison;
mod regeneration;
mod shield;
mod strength;
mod stun;
mod thorns;

pub use fortify::FortifyBehavior;
pub use poison::{POISON_DAMAGE_PER_STACK, PoisonBehavior};
pub use regeneration::RegenerationBehavior;
pub use shield::ShieldBehavior;
pub use strength::StrengthBehavior;
pub use stun::StunBehavior;
pub use thorns::ThornsBehavior;

/// Non-negative magnitude of an effect as an amount of HP.
fn amount(magnitude: i32) -> u32 {
    u32::try_from(magnitude).unwrap_or(0)
}
