//! Battle orchestration: one battle from setup to persisted result.
//!
//! [`BattleOrchestrator::run`] walks the [`BattlePhase`]s in order. The only
//! suspension points are barrier waits (where the presentation layer sets the
//! pace) and a cooperative yield between attackers, so a battle is fully
//! deterministic for a given random source and presenter.
//!
//! # Turn structure
//!
//! Each round the player side acts, then the enemy side. The acting roster of
//! a side is fixed when the round starts: a combatant that was alive at round
//! start still takes its action that round even if it falls earlier in the
//! round. A side's turn ends early only when the opposing side has been wiped.

mod phase;
mod spawn;

use std::sync::Arc;

use battle_core::{
    BattleConfig, BattleOutcome, BattleResult, Battlefield, Card, Combatant, CombatantId,
    EncounterError, EncounterProvider, FALLBACK_MONSTER_TYPE, PcgRandom, RandomSource, Side, pick,
};
use tracing::{debug, error, info, warn};

use crate::api::{BattleError, BattleFault, Result};
use crate::barrier::{BarrierError, BarrierPhase, BarrierToken, CancelToken, InteractionBarrier};
use crate::effects::{CardPlayVerdict, EffectError, EffectProcessor, Hit};
use crate::events::{
    ActionPrevented, ActionSelected, BattleEnded, BattleStarted, CombatantSpawned, CombatantView,
    EventBus, PhaseChanged, PublishOptions, TurnEnded, TurnStarted,
};
use crate::repository::{RepositoryError, TeamRepository};
use crate::resolver::{CardEffectResolver, ResolveError};

pub use phase::BattlePhase;
pub use spawn::SpawnAcknowledger;

/// Why a battle stopped before producing a result.
enum Interrupt {
    Cancelled,
    Rejected(BattleError),
    Fault(BattleFault),
}

impl From<BarrierError> for Interrupt {
    fn from(error: BarrierError) -> Self {
        if error.is_cancelled() {
            Self::Cancelled
        } else {
            Self::Fault(BattleFault::Barrier(error))
        }
    }
}

impl From<ResolveError> for Interrupt {
    fn from(error: ResolveError) -> Self {
        match error {
            ResolveError::Barrier(error) => error.into(),
            ResolveError::Effect(error) => error.into(),
            other => Self::Fault(BattleFault::Resolve(other)),
        }
    }
}

impl From<EffectError> for Interrupt {
    fn from(error: EffectError) -> Self {
        Self::Fault(error.into())
    }
}

impl From<RepositoryError> for Interrupt {
    fn from(error: RepositoryError) -> Self {
        Self::Fault(error.into())
    }
}

/// Runs battles against injected collaborators.
///
/// One orchestrator can run many battles in sequence; it keeps a counter of
/// completed battles that is stamped on every [`BattleResult`].
pub struct BattleOrchestrator {
    bus: EventBus,
    barrier: InteractionBarrier,
    processor: Arc<EffectProcessor>,
    resolver: CardEffectResolver,
    teams: Arc<dyn TeamRepository>,
    encounters: Arc<dyn EncounterProvider>,
    rng: Box<dyn RandomSource>,
    config: BattleConfig,
    phase: Option<BattlePhase>,
    battles_completed: u64,
}

impl BattleOrchestrator {
    pub fn builder() -> BattleOrchestratorBuilder {
        BattleOrchestratorBuilder::new()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn barrier(&self) -> &InteractionBarrier {
        &self.barrier
    }

    pub fn processor(&self) -> &Arc<EffectProcessor> {
        &self.processor
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Phase of the battle in progress, or of the last one that ran.
    pub fn phase(&self) -> Option<BattlePhase> {
        self.phase
    }

    pub fn battles_completed(&self) -> u64 {
        self.battles_completed
    }

    /// Runs one battle in `room_id` to completion.
    ///
    /// The player team is persisted only when the battle completes; a
    /// cancelled or aborted battle leaves the repository untouched.
    pub async fn run(&mut self, room_id: &str, cancel: &CancelToken) -> Result<BattleResult> {
        if room_id.trim().is_empty() {
            return Err(BattleError::InvalidArgument(
                "room id must not be empty".to_owned(),
            ));
        }

        info!(
            target: "runtime::orchestrator",
            room_id,
            battle = self.battles_completed + 1,
            "Battle starting"
        );

        match self.run_phases(room_id, cancel).await {
            Ok(result) => Ok(result),
            Err(Interrupt::Cancelled) => {
                warn!(
                    target: "runtime::orchestrator",
                    room_id,
                    phase = ?self.phase,
                    "Battle cancelled"
                );
                Err(BattleError::Cancelled)
            }
            Err(Interrupt::Rejected(error)) => {
                warn!(target: "runtime::orchestrator", room_id, %error, "Battle rejected");
                Err(error)
            }
            Err(Interrupt::Fault(fault)) => {
                error!(
                    target: "runtime::orchestrator",
                    room_id,
                    phase = ?self.phase,
                    error = %fault,
                    "Battle aborted"
                );
                Err(BattleError::Aborted {
                    room_id: room_id.to_owned(),
                    source: fault,
                })
            }
        }
    }

    async fn run_phases(
        &mut self,
        room_id: &str,
        cancel: &CancelToken,
    ) -> std::result::Result<BattleResult, Interrupt> {
        self.enter(BattlePhase::Setup);
        let mut field = self.setup(room_id)?;

        self.enter(BattlePhase::AwaitSpawnBarrier);
        self.await_spawn(&field, cancel).await?;

        self.enter(BattlePhase::TurnLoop);
        let rounds = self.turn_loop(&mut field, cancel).await?;

        self.enter(BattlePhase::Resolution);
        self.conclude(room_id, field, rounds)
    }

    fn enter(&mut self, phase: BattlePhase) {
        let from = self.phase.replace(phase);
        debug!(target: "runtime::orchestrator", from = ?from, to = %phase, "Phase changed");
        self.bus.publish(PhaseChanged { from, to: phase });
    }

    // ========================================================================
    // Setup
    // ========================================================================

    fn setup(&self, room_id: &str) -> std::result::Result<Battlefield, Interrupt> {
        let players = self.teams.load_player_team()?;
        if players.is_empty() {
            return Err(Interrupt::Rejected(BattleError::EmptyTeam { side: Side::Player }));
        }
        let enemies = self.enemy_team(room_id);
        if enemies.is_empty() {
            return Err(Interrupt::Rejected(BattleError::EmptyTeam { side: Side::Enemy }));
        }

        let field = Battlefield::new(players, enemies)
            .map_err(|error| Interrupt::Rejected(error.into()))?;
        let views = |side| -> Vec<CombatantView> {
            field.team(side).iter().map(CombatantView::from).collect()
        };
        self.bus.publish(BattleStarted {
            room_id: room_id.to_owned(),
            players: views(Side::Player),
            enemies: views(Side::Enemy),
        });
        info!(
            target: "runtime::orchestrator",
            room_id,
            players = field.team(Side::Player).len(),
            enemies = field.team(Side::Enemy).len(),
            "Teams placed"
        );
        Ok(field)
    }

    fn enemy_team(&self, room_id: &str) -> Vec<Combatant> {
        match self.lookup_enemies(room_id) {
            Ok(team) => team,
            Err(error) => {
                warn!(
                    target: "runtime::orchestrator",
                    room_id,
                    %error,
                    fallback = FALLBACK_MONSTER_TYPE,
                    "Encounter lookup failed, using fallback enemy"
                );
                vec![self.fallback_enemy()]
            }
        }
    }

    fn lookup_enemies(&self, room_id: &str) -> std::result::Result<Vec<Combatant>, EncounterError> {
        let room = self.encounters.room(room_id)?;
        let monster_types = self.encounters.monster_types(&room.biome, room.difficulty)?;
        debug!(
            target: "runtime::orchestrator",
            room_id,
            biome = %room.biome,
            difficulty = room.difficulty,
            monsters = ?monster_types,
            "Encounter resolved"
        );
        monster_types
            .iter()
            .map(|monster_type| self.encounters.create_monster(monster_type))
            .collect()
    }

    fn fallback_enemy(&self) -> Combatant {
        self.encounters
            .create_monster(FALLBACK_MONSTER_TYPE)
            .unwrap_or_else(|error| {
                warn!(
                    target: "runtime::orchestrator",
                    %error,
                    "Fallback monster unavailable, using built-in stats"
                );
                Combatant::fallback_knight()
            })
    }

    // ========================================================================
    // Spawn rendezvous
    // ========================================================================

    async fn await_spawn(
        &mut self,
        field: &Battlefield,
        cancel: &CancelToken,
    ) -> std::result::Result<(), Interrupt> {
        let token = self.barrier.mint_token();
        let expected_total = field.len();
        let dead = field.all().filter(|c| c.is_dead()).map(Combatant::id);
        let acknowledger =
            SpawnAcknowledger::install(&self.bus, &self.barrier, token, expected_total, dead);

        for combatant in field.all().filter(|c| c.is_alive()) {
            self.bus.publish_with(
                CombatantSpawned {
                    token,
                    combatant: combatant.into(),
                    expected_total,
                },
                PublishOptions::new().correlate(token),
            );
        }
        debug!(
            target: "runtime::orchestrator",
            %token,
            expected_total,
            "Awaiting spawn acknowledgements"
        );

        let waited = self.barrier.wait(token.key(BarrierPhase::Spawn), cancel).await;
        self.barrier.retire(token);
        drop(acknowledger);
        Ok(waited?)
    }

    // ========================================================================
    // Turn loop
    // ========================================================================

    /// Plays rounds until a side is wiped or the round cap is hit. Returns the
    /// number of completed rounds.
    async fn turn_loop(
        &mut self,
        field: &mut Battlefield,
        cancel: &CancelToken,
    ) -> std::result::Result<u32, Interrupt> {
        let mut completed = 0;
        while field.has_living(Side::Player) && field.has_living(Side::Enemy) {
            if completed >= self.config.max_rounds {
                warn!(
                    target: "runtime::orchestrator",
                    max_rounds = self.config.max_rounds,
                    "Round cap reached, ending battle"
                );
                break;
            }
            let round = completed + 1;
            let rosters = [Side::Player, Side::Enemy].map(|side| (side, field.living_ids(side)));

            for (side, roster) in rosters {
                self.bus.publish(TurnStarted { round, side });
                self.side_turn(field, side, &roster, round, cancel).await?;
                self.end_turn(field, side);
                self.bus.publish(TurnEnded { round, side });
            }

            completed = round;
            debug!(
                target: "runtime::orchestrator",
                round,
                players_alive = field.living_ids(Side::Player).len(),
                enemies_alive = field.living_ids(Side::Enemy).len(),
                "Round complete"
            );
        }
        Ok(completed)
    }

    async fn side_turn(
        &mut self,
        field: &mut Battlefield,
        side: Side,
        roster: &[CombatantId],
        round: u32,
        cancel: &CancelToken,
    ) -> std::result::Result<(), Interrupt> {
        for &attacker in roster {
            if !field.has_living(side.opponent()) {
                debug!(
                    target: "runtime::orchestrator",
                    %side,
                    round,
                    "Opposing side wiped, turn ends early"
                );
                break;
            }
            // The roster was fixed at round start, so an attacker felled
            // earlier this round still takes its action.
            self.take_action(field, attacker, round, cancel).await?;
            tokio::task::yield_now().await;
        }
        Ok(())
    }

    async fn take_action(
        &mut self,
        field: &mut Battlefield,
        attacker: CombatantId,
        round: u32,
        cancel: &CancelToken,
    ) -> std::result::Result<(), Interrupt> {
        let actor = field
            .get(attacker)
            .ok_or(Interrupt::Fault(BattleFault::UnknownCombatant(attacker)))?;
        let card = next_card(actor, round);

        let verdict = self.processor.on_card_played(actor, &card);
        if let CardPlayVerdict::Prevented { by, reason } = verdict {
            info!(
                target: "runtime::orchestrator",
                %attacker,
                card = %card.name,
                %reason,
                "Action prevented"
            );
            self.bus.publish(ActionPrevented {
                round,
                attacker,
                card: card.name,
                blocked_by: by,
                reason,
            });
            return Ok(());
        }

        let attack = actor.attack();
        let opponents = field.living_ids(attacker.side.opponent());
        let Some(&target) = pick(&mut *self.rng, &opponents) else {
            return Ok(());
        };

        let token = self.barrier.mint_token();
        debug!(
            target: "runtime::orchestrator",
            %token,
            round,
            %attacker,
            %target,
            card = %card.name,
            "Action selected"
        );
        self.bus.publish_with(
            ActionSelected {
                token,
                round,
                attacker,
                target,
                card: card.name.clone(),
            },
            PublishOptions::new().correlate(token),
        );

        let performed = self
            .perform(field, &card, attacker, target, attack, token, cancel)
            .await;
        self.barrier.retire(token);
        performed
    }

    #[allow(clippy::too_many_arguments)]
    async fn perform(
        &mut self,
        field: &mut Battlefield,
        card: &Card,
        attacker: CombatantId,
        target: CombatantId,
        attack: u32,
        token: BarrierToken,
        cancel: &CancelToken,
    ) -> std::result::Result<(), Interrupt> {
        self.barrier.wait(token.key(BarrierPhase::Hit), cancel).await?;

        if card.effects.is_empty() {
            let hit = Hit::attack(attacker, target, attack).with_token(token);
            self.processor.deal_damage(field, hit)?;
        } else {
            self.resolver
                .resolve(card, attacker, Some(target), field, &mut *self.rng, token, cancel)
                .await?;
        }

        self.barrier.wait(token.key(BarrierPhase::End), cancel).await?;
        Ok(())
    }

    fn end_turn(&self, field: &mut Battlefield, side: Side) {
        for id in field.living_ids(side) {
            if let Some(combatant) = field.get_mut(id) {
                self.processor.on_turn_end(combatant);
            }
        }
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    fn conclude(
        &mut self,
        room_id: &str,
        field: Battlefield,
        rounds: u32,
    ) -> std::result::Result<BattleResult, Interrupt> {
        let outcome =
            BattleOutcome::decide(field.has_living(Side::Player), field.has_living(Side::Enemy));
        let survivors: Vec<Combatant> = match outcome {
            BattleOutcome::PlayerVictory => field.living(Side::Player).cloned().collect(),
            BattleOutcome::EnemyVictory => field.living(Side::Enemy).cloned().collect(),
            BattleOutcome::Draw => field.all().filter(|c| c.is_alive()).cloned().collect(),
        };

        let (players, _) = field.into_teams();
        self.teams.save_player_team(&players)?;
        self.battles_completed += 1;

        info!(
            target: "runtime::orchestrator",
            room_id,
            ?outcome,
            rounds,
            survivors = survivors.len(),
            battle = self.battles_completed,
            "Battle finished"
        );
        self.bus.publish(BattleEnded {
            room_id: room_id.to_owned(),
            outcome,
            turn_count: rounds,
            battle_number: self.battles_completed,
        });

        Ok(BattleResult::new(
            room_id,
            outcome,
            rounds,
            survivors,
            self.battles_completed,
        ))
    }
}

/// The card a combatant plays in `round`: its deck in rotation, or a basic
/// attack when it has no deck.
fn next_card(combatant: &Combatant, round: u32) -> Card {
    let deck = combatant.deck();
    if deck.is_empty() {
        return Card::basic_attack();
    }
    let index = (round.saturating_sub(1) as usize) % deck.len();
    deck[index].clone()
}

/// Builder for [`BattleOrchestrator`].
///
/// The team repository and encounter provider are required. Everything else
/// defaults: a fresh bus and barrier, the built-in effect behaviors, and a
/// PCG random source seeded from the battle config (or from entropy when the
/// config has no seed).
pub struct BattleOrchestratorBuilder {
    bus: Option<EventBus>,
    barrier: Option<InteractionBarrier>,
    processor: Option<Arc<EffectProcessor>>,
    teams: Option<Arc<dyn TeamRepository>>,
    encounters: Option<Arc<dyn EncounterProvider>>,
    rng: Option<Box<dyn RandomSource>>,
    config: BattleConfig,
}

impl BattleOrchestratorBuilder {
    fn new() -> Self {
        Self {
            bus: None,
            barrier: None,
            processor: None,
            teams: None,
            encounters: None,
            rng: None,
            config: BattleConfig::default(),
        }
    }

    pub fn config(mut self, config: BattleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn barrier(mut self, barrier: InteractionBarrier) -> Self {
        self.barrier = Some(barrier);
        self
    }

    /// Custom effect table. It should publish on the same bus as the
    /// orchestrator.
    pub fn processor(mut self, processor: Arc<EffectProcessor>) -> Self {
        self.processor = Some(processor);
        self
    }

    pub fn teams(mut self, teams: Arc<dyn TeamRepository>) -> Self {
        self.teams = Some(teams);
        self
    }

    pub fn encounters(mut self, encounters: Arc<dyn EncounterProvider>) -> Self {
        self.encounters = Some(encounters);
        self
    }

    pub fn rng(mut self, rng: impl RandomSource + 'static) -> Self {
        self.rng = Some(Box::new(rng));
        self
    }

    pub fn build(self) -> Result<BattleOrchestrator> {
        let teams = self
            .teams
            .ok_or(BattleError::MissingCollaborator("a team repository"))?;
        let encounters = self
            .encounters
            .ok_or(BattleError::MissingCollaborator("an encounter provider"))?;

        let bus = self.bus.unwrap_or_default();
        let barrier = self.barrier.unwrap_or_default();
        let processor = self
            .processor
            .unwrap_or_else(|| Arc::new(EffectProcessor::with_default_behaviors(bus.clone())));
        let rng = self.rng.unwrap_or_else(|| {
            let seed = self.config.seed.unwrap_or_else(rand::random);
            debug!(target: "runtime::orchestrator", seed, "Seeding target selection");
            Box::new(PcgRandom::new(seed))
        });
        let resolver =
            CardEffectResolver::new(Arc::clone(&processor), barrier.clone(), bus.clone());

        Ok(BattleOrchestrator {
            bus,
            barrier,
            processor,
            resolver,
            teams,
            encounters,
            rng,
            config: self.config,
            phase: None,
            battles_completed: 0,
        })
    }
}
