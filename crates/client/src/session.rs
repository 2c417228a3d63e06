//! One battle session: content loading, wiring and the bus drain loop.

use std::sync::Arc;

use anyhow::{Context, Result};
use battle_content::{ConfigLoader, EncounterLoader, EncounterTable};
use battle_core::{
    BattleConfig, BattleOutcome, BattleResult, Card, CardEffect, Combatant, CombatantId,
    EffectKind, TargetPolicy,
};
use runtime::{
    BattleOrchestrator, CancelToken, EventBus, InMemoryTeamRepository, RuntimeConfig,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::presenter::SimulatedPresenter;

/// Printable summary of a finished battle.
#[derive(Debug, Clone, Serialize)]
pub struct BattleReport {
    pub room_id: String,
    pub outcome: BattleOutcome,
    pub turn_count: u32,
    pub battle_number: u64,
    pub survivors: Vec<SurvivorReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SurvivorReport {
    pub id: CombatantId,
    pub monster_type: String,
    pub hp: u32,
    pub max_hp: u32,
}

impl From<&BattleResult> for BattleReport {
    fn from(result: &BattleResult) -> Self {
        Self {
            room_id: result.room_id().to_owned(),
            outcome: result.outcome(),
            turn_count: result.turn_count(),
            battle_number: result.battle_number(),
            survivors: result
                .survivors()
                .iter()
                .map(|c| SurvivorReport {
                    id: c.id(),
                    monster_type: c.monster_type().to_owned(),
                    hp: c.hp(),
                    max_hp: c.max_hp(),
                })
                .collect(),
        }
    }
}

/// The party a new session starts with.
pub fn starter_team() -> Vec<Combatant> {
    vec![
        Combatant::new("Paladin", 48, 7).with_deck(vec![
            Card::basic_attack(),
            Card::new(
                "Smite",
                vec![
                    CardEffect::damage(9, TargetPolicy::SingleEnemy),
                    CardEffect::status(EffectKind::Strength, 2, 2, TargetPolicy::Caster),
                ],
            ),
        ]),
        Combatant::new("Cleric", 32, 4).with_deck(vec![
            Card::new("Mend", vec![CardEffect::heal(8, TargetPolicy::AllAllies)]),
            Card::new("Ward", vec![CardEffect::block(6, TargetPolicy::AllAllies)]),
        ]),
    ]
}

fn load_encounters(config: &ClientConfig) -> Result<EncounterTable> {
    let table = match &config.content_path {
        Some(path) => EncounterLoader::load(path)?,
        None => EncounterTable::builtin()?,
    };
    table.validate().context("encounter table is inconsistent")?;
    Ok(table)
}

fn load_battle_config(config: &ClientConfig) -> Result<BattleConfig> {
    match &config.config_path {
        Some(path) => ConfigLoader::load(path),
        None => Ok(BattleConfig::default()),
    }
}

/// Runs one battle in the configured room and reports its result.
///
/// Deferred bus traffic is drained on a fixed tick while the battle runs and
/// flushed once it ends.
pub async fn run_battle(config: &ClientConfig, cancel: &CancelToken) -> Result<BattleReport> {
    let runtime_config = config.runtime_config(load_battle_config(config)?);
    let encounters = load_encounters(config)?;
    info!(
        target: "client",
        room = %config.room_id,
        rooms = encounters.rooms.len(),
        max_rounds = runtime_config.battle.max_rounds,
        seed = ?runtime_config.battle.seed,
        "Session configured"
    );

    let mut orchestrator = BattleOrchestrator::builder()
        .config(runtime_config.battle.clone())
        .teams(Arc::new(InMemoryTeamRepository::with_team(starter_team())))
        .encounters(Arc::new(encounters))
        .build()?;
    let bus = orchestrator.bus().clone();
    let _presenter = SimulatedPresenter::attach(&bus, orchestrator.barrier(), config.animation);

    let stop = CancelToken::new();
    let ticker = tokio::spawn(drain_loop(bus.clone(), runtime_config.clone(), stop.clone()));

    let result = orchestrator.run(&config.room_id, cancel).await;

    stop.cancel();
    ticker.await.context("bus drain task failed")?;
    flush(&bus, runtime_config.drain_budget);

    Ok(BattleReport::from(&result?))
}

async fn drain_loop(bus: EventBus, config: RuntimeConfig, stop: CancelToken) {
    let mut ticks = tokio::time::interval(config.tick_interval);
    loop {
        tokio::select! {
            _ = ticks.tick() => {
                bus.drain_pending(config.drain_budget);
            }
            () = stop.cancelled() => break,
        }
    }
}

fn flush(bus: &EventBus, budget: usize) {
    let mut delivered = 0;
    loop {
        let stats = bus.drain_pending(budget);
        if stats.total() == 0 {
            break;
        }
        delivered += stats.total();
    }
    debug!(target: "client", delivered, "Flushed remaining events");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn starter_team_clears_the_first_meadow() {
        let config = ClientConfig {
            room_id: "meadow-1".to_owned(),
            seed: Some(3),
            animation: Duration::from_millis(1),
            tick_interval: Duration::from_millis(1),
            ..ClientConfig::default()
        };

        let report = run_battle(&config, &CancelToken::new()).await.unwrap();

        assert_eq!(report.outcome, BattleOutcome::PlayerVictory);
        assert_eq!(report.battle_number, 1);
        assert!(!report.survivors.is_empty());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["room_id"], "meadow-1");
    }

    #[test]
    fn custom_content_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ron");
        std::fs::write(
            &path,
            r#"(biomes: {"Swamp": [(min_difficulty: 1, max_difficulty: 1, monsters: ["Bog"])]})"#,
        )
        .unwrap();
        let config = ClientConfig {
            content_path: Some(path),
            ..ClientConfig::default()
        };

        assert!(load_encounters(&config).is_err());
    }
}
