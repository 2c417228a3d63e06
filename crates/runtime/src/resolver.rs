//! Card resolution: targets, application and per-step pacing.

use std::sync::Arc;

use battle_core::{
    Battlefield, Card, CardEffect, CardEffectKind, CombatantId, EffectKind, RandomSource, Side,
    StatusEffect, TargetPolicy, pick,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::barrier::{BarrierError, BarrierPhase, BarrierToken, CancelToken, InteractionBarrier};
use crate::effects::{DamageSource, EffectError, EffectProcessor, Hit};
use crate::events::{CardEffectResolved, EventBus, PublishOptions};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("caster {0} is not on the battlefield")]
    UnknownCaster(CombatantId),

    #[error("card '{0}' has no effects")]
    EmptyCard(String),

    #[error(transparent)]
    Barrier(#[from] BarrierError),

    #[error(transparent)]
    Effect(#[from] EffectError),
}

impl ResolveError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Barrier(err) if err.is_cancelled())
    }
}

/// What a resolved card did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionSummary {
    pub card: String,
    /// Targets that were affected, per step.
    pub steps: Vec<Vec<CombatantId>>,
    pub damage_dealt: u32,
    pub healing_done: u32,
}

/// Applies a card's effects in order against the battlefield.
///
/// Multi-step cards pause after every step but the last until the
/// presentation layer signals `(token, Step(n))`.
pub struct CardEffectResolver {
    processor: Arc<EffectProcessor>,
    barrier: InteractionBarrier,
    bus: EventBus,
}

impl CardEffectResolver {
    pub fn new(
        processor: Arc<EffectProcessor>,
        barrier: InteractionBarrier,
        bus: EventBus,
    ) -> Self {
        Self {
            processor,
            barrier,
            bus,
        }
    }

    /// Resolves `card` cast by `caster`.
    ///
    /// `primary` is the target chosen for single-target policies; when it is
    /// not a living member of the expected side the step has no target.
    #[allow(clippy::too_many_arguments)]
    pub async fn resolve(
        &self,
        card: &Card,
        caster: CombatantId,
        primary: Option<CombatantId>,
        field: &mut Battlefield,
        rng: &mut dyn RandomSource,
        token: BarrierToken,
        cancel: &CancelToken,
    ) -> Result<ResolutionSummary, ResolveError> {
        if card.effects.is_empty() {
            return Err(ResolveError::EmptyCard(card.name.clone()));
        }
        if field.get(caster).is_none() {
            return Err(ResolveError::UnknownCaster(caster));
        }

        let total = card.effects.len();
        let mut summary = ResolutionSummary {
            card: card.name.clone(),
            ..ResolutionSummary::default()
        };

        for (step, effect) in card.effects.iter().enumerate() {
            let targets = select_targets(effect.target, caster, primary, field, rng);
            let mut affected = Vec::with_capacity(targets.len());
            for target in targets {
                // Earlier steps or targets may have killed it.
                if !field.is_alive(target) {
                    continue;
                }
                if self.apply(effect, caster, target, field, token, &mut summary)? {
                    affected.push(target);
                }
            }

            debug!(
                target: "runtime::resolver",
                card = %card.name,
                step,
                total,
                kind = %effect.kind,
                targets = affected.len(),
                "Card step resolved"
            );
            let resolved = CardEffectResolved {
                token,
                card: card.name.clone(),
                step,
                total,
                targets: affected.clone(),
            };
            let awaits_signal = resolved.awaits_signal();
            self.bus
                .publish_with(resolved, PublishOptions::new().correlate(token));
            summary.steps.push(affected);

            if awaits_signal {
                let phase = BarrierPhase::Step(u16::try_from(step).unwrap_or(u16::MAX));
                self.barrier.wait(token.key(phase), cancel).await?;
            }
        }

        Ok(summary)
    }

    /// Applies one effect to one living target. Returns false when the effect
    /// kind is not understood.
    fn apply(
        &self,
        effect: &CardEffect,
        caster: CombatantId,
        target: CombatantId,
        field: &mut Battlefield,
        token: BarrierToken,
        summary: &mut ResolutionSummary,
    ) -> Result<bool, ResolveError> {
        match &effect.kind {
            CardEffectKind::Damage => {
                let hit = Hit::new(Some(caster), target, effect.amount, DamageSource::Card)
                    .with_token(token);
                let report = self.processor.deal_damage(field, hit)?;
                summary.damage_dealt += report.applied;
            }
            CardEffectKind::Heal => {
                summary.healing_done +=
                    self.processor
                        .heal(field, target, effect.amount, Some(caster), Some(token))?;
            }
            CardEffectKind::Block => {
                let shield = status(EffectKind::Shield, effect);
                self.processor
                    .apply_status(field, target, shield, Some(caster))?;
            }
            CardEffectKind::ApplyStatus(kind) => {
                self.processor
                    .apply_status(field, target, status(*kind, effect), Some(caster))?;
            }
            CardEffectKind::Unknown(name) => {
                warn!(
                    target: "runtime::resolver",
                    kind = %name,
                    %caster,
                    %target,
                    "Skipping unrecognized card effect"
                );
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn status(kind: EffectKind, effect: &CardEffect) -> StatusEffect {
    let magnitude = i32::try_from(effect.amount).unwrap_or(i32::MAX);
    StatusEffect::new(kind, magnitude, effect.duration)
}

/// Expands a target policy into concrete combatants.
pub fn select_targets(
    policy: TargetPolicy,
    caster: CombatantId,
    primary: Option<CombatantId>,
    field: &Battlefield,
    rng: &mut dyn RandomSource,
) -> Vec<CombatantId> {
    let allies = caster.side;
    let enemies = caster.side.opponent();

    let single = |side: Side| -> Vec<CombatantId> {
        match primary {
            Some(id) if id.side == side && field.is_alive(id) => vec![id],
            _ => {
                debug!(
                    target: "runtime::resolver",
                    %caster,
                    primary = ?primary,
                    expected = %side,
                    "Primary target unavailable, step has no target"
                );
                Vec::new()
            }
        }
    };

    match policy {
        TargetPolicy::Caster => vec![caster],
        TargetPolicy::SingleEnemy => single(enemies),
        TargetPolicy::SingleAlly => single(allies),
        TargetPolicy::AllEnemies => field.living_ids(enemies),
        TargetPolicy::AllAllies => field.living_ids(allies),
        TargetPolicy::RandomEnemy => pick(rng, &field.living_ids(enemies))
            .copied()
            .into_iter()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use battle_core::{Combatant, SequenceRandom};

    use super::*;

    const HERO: CombatantId = CombatantId::new(Side::Player, 0);
    const SQUIRE: CombatantId = CombatantId::new(Side::Player, 1);
    const SLIME: CombatantId = CombatantId::new(Side::Enemy, 0);
    const WOLF: CombatantId = CombatantId::new(Side::Enemy, 1);

    fn field() -> Battlefield {
        Battlefield::new(
            vec![Combatant::new("Knight", 30, 5), Combatant::new("Squire", 12, 2).with_hp(6)],
            vec![Combatant::new("Slime", 10, 1), Combatant::new("Wolf", 15, 3)],
        )
        .unwrap()
    }

    fn resolver() -> (CardEffectResolver, InteractionBarrier) {
        let bus = EventBus::new();
        let barrier = InteractionBarrier::new();
        let processor = Arc::new(EffectProcessor::with_default_behaviors(bus.clone()));
        (
            CardEffectResolver::new(processor, barrier.clone(), bus),
            barrier,
        )
    }

    #[test]
    fn policies_expand_to_living_targets() {
        let mut field = field();
        let mut rng = SequenceRandom::new(vec![1]);
        field.get_mut(SLIME).unwrap().take_damage(100);

        assert_eq!(
            select_targets(TargetPolicy::AllEnemies, HERO, None, &field, &mut rng),
            vec![WOLF]
        );
        assert_eq!(
            select_targets(TargetPolicy::AllAllies, HERO, None, &field, &mut rng),
            vec![HERO, SQUIRE]
        );
        assert_eq!(
            select_targets(TargetPolicy::RandomEnemy, HERO, None, &field, &mut rng),
            vec![WOLF]
        );
    }

    #[test]
    fn single_target_needs_a_living_primary_on_the_right_side() {
        let field = field();
        let mut rng = SequenceRandom::first();

        assert_eq!(
            select_targets(TargetPolicy::SingleEnemy, HERO, Some(WOLF), &field, &mut rng),
            vec![WOLF]
        );
        let targets =
            select_targets(TargetPolicy::SingleEnemy, HERO, Some(SQUIRE), &field, &mut rng);
        assert!(targets.is_empty());
        assert!(select_targets(TargetPolicy::SingleAlly, HERO, None, &field, &mut rng).is_empty());
    }

    #[tokio::test]
    async fn empty_card_and_unknown_caster_fail_fast() {
        let (resolver, barrier) = resolver();
        let mut field = field();
        let mut rng = SequenceRandom::first();
        let cancel = CancelToken::new();
        let token = barrier.mint_token();

        let err = resolver
            .resolve(
                &Card::new("Nothing", vec![]),
                HERO,
                None,
                &mut field,
                &mut rng,
                token,
                &cancel,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::EmptyCard(name) if name == "Nothing"));

        let ghost = CombatantId::new(Side::Player, 7);
        let card = Card::new("Jab", vec![CardEffect::damage(1, TargetPolicy::SingleEnemy)]);
        let err = resolver
            .resolve(&card, ghost, Some(SLIME), &mut field, &mut rng, token, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnknownCaster(id) if id == ghost));
    }

    #[tokio::test]
    async fn single_step_card_does_not_wait() {
        let (resolver, barrier) = resolver();
        let mut field = field();
        let mut rng = SequenceRandom::first();
        let card = Card::new(
            "Mend",
            vec![CardEffect::heal(10, TargetPolicy::SingleAlly)],
        );

        let summary = resolver
            .resolve(
                &card,
                HERO,
                Some(SQUIRE),
                &mut field,
                &mut rng,
                barrier.mint_token(),
                &CancelToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(summary.healing_done, 6);
        assert_eq!(field.get(SQUIRE).unwrap().hp(), 12);
    }

    #[tokio::test]
    async fn multi_step_card_waits_between_steps() {
        let (resolver, barrier) = resolver();
        let mut field = field();
        let mut rng = SequenceRandom::first();
        let token = barrier.mint_token();
        let card = Card::new(
            "Guarded Strike",
            vec![
                CardEffect::block(4, TargetPolicy::Caster),
                CardEffect::damage(7, TargetPolicy::SingleEnemy),
                CardEffect::new(CardEffectKind::Unknown("Dance".into()), 1, TargetPolicy::Caster),
            ],
        );

        // Pre-signal both intermediate steps; the last step never waits.
        barrier.signal(token.key(BarrierPhase::Step(0)));
        barrier.signal(token.key(BarrierPhase::Step(1)));

        let summary = resolver
            .resolve(&card, HERO, Some(SLIME), &mut field, &mut rng, token, &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(summary.steps, vec![vec![HERO], vec![SLIME], vec![]]);
        assert_eq!(summary.damage_dealt, 7);
        let shield = field.get(HERO).unwrap().effect(EffectKind::Shield);
        assert_eq!(shield.map(|e| e.magnitude), Some(4));
        assert_eq!(barrier.pending_waits(), 0);
    }

    #[tokio::test]
    async fn cancelled_step_wait_surfaces_as_cancelled() {
        let (resolver, barrier) = resolver();
        let mut field = field();
        let mut rng = SequenceRandom::first();
        let cancel = CancelToken::new();
        cancel.cancel();
        let card = Card::new(
            "Double Tap",
            vec![
                CardEffect::damage(1, TargetPolicy::SingleEnemy),
                CardEffect::damage(1, TargetPolicy::SingleEnemy),
            ],
        );

        let err = resolver
            .resolve(&card, HERO, Some(WOLF), &mut field, &mut rng, barrier.mint_token(), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        // The first step still landed before the wait was refused.
        assert_eq!(field.get(WOLF).unwrap().hp(), 14);
    }
}
