//! Encounter tables: which monsters a room spawns.
//!
//! An [`EncounterTable`] maps room ids to a biome and difficulty, each biome
//! to difficulty tiers of monster types, and each monster type to a
//! [`MonsterTemplate`]. It implements [`EncounterProvider`] so the runtime can
//! build enemy teams from it without knowing where the data came from.

use std::collections::BTreeMap;

use battle_core::{Card, Combatant, EncounterError, EncounterProvider, RoomInfo, StatusEffect};
use serde::{Deserialize, Serialize};

use crate::loaders::{EncounterLoader, LoadResult};

const BUILTIN_ENCOUNTERS: &str = include_str!("../data/encounters.ron");

/// Stats and starting kit of one monster type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterTemplate {
    pub max_hp: u32,
    pub attack: u32,
    #[serde(default)]
    pub effects: Vec<StatusEffect>,
    #[serde(default)]
    pub deck: Vec<Card>,
}

impl MonsterTemplate {
    /// Spawns a full-health combatant from this template.
    pub fn spawn(&self, monster_type: &str) -> Combatant {
        let mut combatant =
            Combatant::new(monster_type, self.max_hp, self.attack).with_deck(self.deck.clone());
        for effect in &self.effects {
            combatant.add_effect(*effect);
        }
        combatant
    }
}

/// Monster types fielded by a biome within a difficulty band (inclusive).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterTier {
    pub min_difficulty: u32,
    pub max_difficulty: u32,
    pub monsters: Vec<String>,
}

impl EncounterTier {
    pub fn covers(&self, difficulty: u32) -> bool {
        (self.min_difficulty..=self.max_difficulty).contains(&difficulty)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterTable {
    #[serde(default)]
    pub rooms: BTreeMap<String, RoomInfo>,
    #[serde(default)]
    pub biomes: BTreeMap<String, Vec<EncounterTier>>,
    #[serde(default)]
    pub monsters: BTreeMap<String, MonsterTemplate>,
}

impl EncounterTable {
    /// The encounter table shipped with the crate.
    pub fn builtin() -> LoadResult<Self> {
        EncounterLoader::parse(BUILTIN_ENCOUNTERS)
    }

    /// Checks that every tier references a known monster type.
    pub fn validate(&self) -> LoadResult<()> {
        for (biome, tiers) in &self.biomes {
            for tier in tiers {
                if tier.min_difficulty > tier.max_difficulty {
                    anyhow::bail!(
                        "Biome '{}' has an empty difficulty band {}..={}",
                        biome,
                        tier.min_difficulty,
                        tier.max_difficulty
                    );
                }
                if let Some(missing) = tier
                    .monsters
                    .iter()
                    .find(|name| !self.monsters.contains_key(name.as_str()))
                {
                    anyhow::bail!("Biome '{}' references unknown monster '{}'", biome, missing);
                }
            }
        }
        Ok(())
    }
}

impl EncounterProvider for EncounterTable {
    fn room(&self, room_id: &str) -> Result<RoomInfo, EncounterError> {
        self.rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| EncounterError::UnknownRoom(room_id.to_owned()))
    }

    fn monster_types(&self, biome: &str, difficulty: u32) -> Result<Vec<String>, EncounterError> {
        let tiers = self
            .biomes
            .get(biome)
            .ok_or_else(|| EncounterError::UnknownBiome(biome.to_owned()))?;

        let monsters = tiers
            .iter()
            .find(|tier| tier.covers(difficulty))
            .map(|tier| tier.monsters.clone())
            .unwrap_or_default();

        if monsters.is_empty() {
            tracing::debug!(
                target: "content::encounters",
                biome,
                difficulty,
                "No encounter tier covers difficulty"
            );
        }
        Ok(monsters)
    }

    fn create_monster(&self, monster_type: &str) -> Result<Combatant, EncounterError> {
        self.monsters
            .get(monster_type)
            .map(|template| template.spawn(monster_type))
            .ok_or_else(|| EncounterError::UnknownMonster(monster_type.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use battle_core::{CardEffectKind, EffectKind, FALLBACK_MONSTER_TYPE};

    use super::*;

    #[test]
    fn builtin_table_parses_and_validates() {
        let table = EncounterTable::builtin().unwrap();
        assert!(table.monsters.contains_key(FALLBACK_MONSTER_TYPE));
        assert!(!table.rooms.is_empty());
    }

    #[test]
    fn room_lookup_resolves_biome_and_tier() {
        let table = EncounterTable::builtin().unwrap();
        let room = table.room("meadow-2").unwrap();
        assert_eq!(room, RoomInfo::new("Meadow", 2));
        assert_eq!(
            table.monster_types(&room.biome, room.difficulty).unwrap(),
            vec!["Slime".to_string(), "Wolf".to_string()]
        );
    }

    #[test]
    fn unknown_room_and_biome_are_errors() {
        let table = EncounterTable::builtin().unwrap();
        assert_eq!(
            table.room("nowhere"),
            Err(EncounterError::UnknownRoom("nowhere".into()))
        );
        assert_eq!(
            table.monster_types("Volcano", 1),
            Err(EncounterError::UnknownBiome("Volcano".into()))
        );
    }

    #[test]
    fn uncovered_difficulty_yields_empty_list() {
        let table = EncounterTable::builtin().unwrap();
        assert!(table.monster_types("Meadow", 99).unwrap().is_empty());
    }

    #[test]
    fn created_monsters_carry_template_kit() {
        let table = EncounterTable::builtin().unwrap();

        let skeleton = table.create_monster("Skeleton").unwrap();
        assert_eq!(skeleton.hp(), 20);
        assert!(skeleton.has_effect(EffectKind::Thorns));

        let wolf = table.create_monster("Wolf").unwrap();
        assert_eq!(wolf.deck().len(), 2);
        assert_eq!(
            wolf.deck()[1].effects[1].kind,
            CardEffectKind::ApplyStatus(EffectKind::Poison)
        );
    }

    #[test]
    fn created_monsters_are_independent() {
        let table = EncounterTable::builtin().unwrap();
        let mut first = table.create_monster("Slime").unwrap();
        let second = table.create_monster("Slime").unwrap();
        first.take_damage(5);
        assert_eq!(second.hp(), second.max_hp());
    }

    #[test]
    fn validation_rejects_unknown_monster_reference() {
        let source = r#"(
            biomes: { "Void": [(min_difficulty: 1, max_difficulty: 1, monsters: ["Ghost"])] },
        )"#;
        let err = EncounterLoader::parse(source).unwrap_err();
        assert!(err.to_string().contains("unknown monster 'Ghost'"));
    }
}
