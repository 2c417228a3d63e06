//! Battle event payloads and their routing defaults.

use battle_core::{
    BattleOutcome, Combatant, CombatantId, DamageReport, EffectKind, Side, StatusEffect,
};

use super::message::{BusMessage, DispatchMode, Topic};
use crate::barrier::BarrierToken;
use crate::effects::DamageSource;
use crate::orchestrator::BattlePhase;

/// Presentation-facing snapshot of a combatant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombatantView {
    pub id: CombatantId,
    pub monster_type: String,
    pub hp: u32,
    pub max_hp: u32,
}

impl From<&Combatant> for CombatantView {
    fn from(combatant: &Combatant) -> Self {
        Self {
            id: combatant.id(),
            monster_type: combatant.monster_type().to_owned(),
            hp: combatant.hp(),
            max_hp: combatant.max_hp(),
        }
    }
}

// ============================================================================
// Battle lifecycle
// ============================================================================

#[derive(Debug, Clone)]
pub struct BattleStarted {
    pub room_id: String,
    pub players: Vec<CombatantView>,
    pub enemies: Vec<CombatantView>,
}

impl BusMessage for BattleStarted {
    const TOPIC: Topic = Topic::Battle;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChanged {
    pub from: Option<BattlePhase>,
    pub to: BattlePhase,
}

impl BusMessage for PhaseChanged {
    const TOPIC: Topic = Topic::Battle;
}

#[derive(Debug, Clone)]
pub struct BattleEnded {
    pub room_id: String,
    pub outcome: BattleOutcome,
    pub turn_count: u32,
    pub battle_number: u64,
}

impl BusMessage for BattleEnded {
    const TOPIC: Topic = Topic::Battle;
}

// ============================================================================
// Presentation rendezvous
// ============================================================================

/// Asks the presentation layer to bring up a combatant's view.
///
/// The presentation answers with [`ViewReady`] once per combatant.
#[derive(Debug, Clone)]
pub struct CombatantSpawned {
    pub token: BarrierToken,
    pub combatant: CombatantView,
    /// Number of combatants the spawn rendezvous waits for, dead ones included.
    pub expected_total: usize,
}

impl BusMessage for CombatantSpawned {
    const TOPIC: Topic = Topic::Presentation;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewReady {
    pub token: BarrierToken,
    pub combatant: CombatantId,
}

impl BusMessage for ViewReady {
    const TOPIC: Topic = Topic::Presentation;
}

// ============================================================================
// Turn flow
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnStarted {
    pub round: u32,
    pub side: Side,
}

impl BusMessage for TurnStarted {
    const TOPIC: Topic = Topic::Turn;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnEnded {
    pub round: u32,
    pub side: Side,
}

impl BusMessage for TurnEnded {
    const TOPIC: Topic = Topic::Turn;
}

/// An attacker committed to an action; the presentation signals `Hit` and
/// `End` on `token` to pace it.
#[derive(Debug, Clone)]
pub struct ActionSelected {
    pub token: BarrierToken,
    pub round: u32,
    pub attacker: CombatantId,
    pub target: CombatantId,
    pub card: String,
}

impl BusMessage for ActionSelected {
    const TOPIC: Topic = Topic::Turn;
}

#[derive(Debug, Clone)]
pub struct ActionPrevented {
    pub round: u32,
    pub attacker: CombatantId,
    pub card: String,
    pub blocked_by: EffectKind,
    pub reason: String,
}

impl BusMessage for ActionPrevented {
    const TOPIC: Topic = Topic::Turn;
}

/// One step of a card finished resolving.
///
/// For multi-step cards every step but the last is followed by a wait on
/// `(token, Step(step))`.
#[derive(Debug, Clone)]
pub struct CardEffectResolved {
    pub token: BarrierToken,
    pub card: String,
    pub step: usize,
    pub total: usize,
    pub targets: Vec<CombatantId>,
}

impl CardEffectResolved {
    pub fn awaits_signal(&self) -> bool {
        self.total > 1 && self.step + 1 < self.total
    }
}

impl BusMessage for CardEffectResolved {
    const TOPIC: Topic = Topic::Presentation;
}

// ============================================================================
// Combat results
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageApplied {
    pub token: Option<BarrierToken>,
    pub source: Option<CombatantId>,
    pub target: CombatantId,
    pub damage_source: DamageSource,
    pub report: DamageReport,
    pub hp_after: u32,
}

impl BusMessage for DamageApplied {
    const TOPIC: Topic = Topic::Combat;
    const MODE: DispatchMode = DispatchMode::Queued;
    const PRIORITY: i32 = 10;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Healed {
    pub token: Option<BarrierToken>,
    pub source: Option<CombatantId>,
    pub target: CombatantId,
    pub amount: u32,
    pub hp_after: u32,
}

impl BusMessage for Healed {
    const TOPIC: Topic = Topic::Combat;
    const MODE: DispatchMode = DispatchMode::Queued;
    const PRIORITY: i32 = 10;
}

/// Death animations play after the damage numbers that caused them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatantFainted {
    pub combatant: CombatantId,
    pub killer: Option<CombatantId>,
}

impl BusMessage for CombatantFainted {
    const TOPIC: Topic = Topic::Combat;
    const MODE: DispatchMode = DispatchMode::Queued;
    const PRIORITY: i32 = 20;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageReflected {
    pub from: CombatantId,
    pub to: CombatantId,
    pub amount: u32,
}

impl BusMessage for DamageReflected {
    const TOPIC: Topic = Topic::Combat;
    const MODE: DispatchMode = DispatchMode::NextFrame;
}

// ============================================================================
// Status effects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusApplied {
    pub target: CombatantId,
    pub source: Option<CombatantId>,
    pub effect: StatusEffect,
}

impl BusMessage for StatusApplied {
    const TOPIC: Topic = Topic::Effects;
    const MODE: DispatchMode = DispatchMode::NextFrame;
}

/// An existing effect rewrote an effect being applied (e.g. Fortify on Shield).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransformed {
    pub target: CombatantId,
    pub by: EffectKind,
    pub before: StatusEffect,
    pub after: StatusEffect,
}

impl BusMessage for StatusTransformed {
    const TOPIC: Topic = Topic::Effects;
    const MODE: DispatchMode = DispatchMode::NextFrame;
}

/// An effect changed an amount of damage in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageModified {
    pub owner: CombatantId,
    pub kind: EffectKind,
    pub before: u32,
    pub after: u32,
}

impl BusMessage for DamageModified {
    const TOPIC: Topic = Topic::Effects;
    const MODE: DispatchMode = DispatchMode::NextFrame;
}

/// A periodic effect fired at turn end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTicked {
    pub owner: CombatantId,
    pub kind: EffectKind,
    pub damage: u32,
    pub healed: u32,
    pub remaining: i32,
}

impl BusMessage for StatusTicked {
    const TOPIC: Topic = Topic::Effects;
    const MODE: DispatchMode = DispatchMode::NextFrame;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusExpired {
    pub owner: CombatantId,
    pub kind: EffectKind,
}

impl BusMessage for StatusExpired {
    const TOPIC: Topic = Topic::Effects;
    const MODE: DispatchMode = DispatchMode::NextFrame;
}
