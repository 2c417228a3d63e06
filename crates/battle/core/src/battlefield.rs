//! Battlefield: both teams of a single battle.
//!
//! The battlefield owns every combatant for the duration of a battle and
//! assigns battle-local [`CombatantId`]s (side + slot) when teams are placed,
//! so lookups are direct indexing and ids never collide across teams.

use thiserror::Error;

use crate::combatant::{Combatant, CombatantId, Side};

/// Largest team the battlefield can address with a `u16` slot.
pub const MAX_TEAM_SIZE: usize = u16::MAX as usize + 1;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BattlefieldError {
    #[error("{side} team has {size} combatants, at most {MAX_TEAM_SIZE} fit on the field")]
    TeamTooLarge { side: Side, size: usize },
}

#[derive(Clone, Debug, Default)]
pub struct Battlefield {
    players: Vec<Combatant>,
    enemies: Vec<Combatant>,
}

impl Battlefield {
    /// Places both teams, assigning ids in team order.
    pub fn new(
        players: Vec<Combatant>,
        enemies: Vec<Combatant>,
    ) -> Result<Self, BattlefieldError> {
        let mut field = Self { players, enemies };
        for side in [Side::Player, Side::Enemy] {
            let team = field.team_mut(side);
            let size = team.len();
            for (slot, combatant) in team.iter_mut().enumerate() {
                let slot = u16::try_from(slot)
                    .map_err(|_| BattlefieldError::TeamTooLarge { side, size })?;
                combatant.assign_id(CombatantId::new(side, slot));
            }
        }
        Ok(field)
    }

    pub fn team(&self, side: Side) -> &[Combatant] {
        match side {
            Side::Player => &self.players,
            Side::Enemy => &self.enemies,
        }
    }

    fn team_mut(&mut self, side: Side) -> &mut Vec<Combatant> {
        match side {
            Side::Player => &mut self.players,
            Side::Enemy => &mut self.enemies,
        }
    }

    pub fn get(&self, id: CombatantId) -> Option<&Combatant> {
        self.team(id.side).get(id.slot as usize)
    }

    pub fn get_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.team_mut(id.side).get_mut(id.slot as usize)
    }

    /// Iterates every combatant, players first.
    pub fn all(&self) -> impl Iterator<Item = &Combatant> {
        self.players.iter().chain(self.enemies.iter())
    }

    pub fn all_mut(&mut self) -> impl Iterator<Item = &mut Combatant> {
        self.players.iter_mut().chain(self.enemies.iter_mut())
    }

    pub fn living(&self, side: Side) -> impl Iterator<Item = &Combatant> {
        self.team(side).iter().filter(|c| c.is_alive())
    }

    pub fn living_ids(&self, side: Side) -> Vec<CombatantId> {
        self.living(side).map(Combatant::id).collect()
    }

    pub fn has_living(&self, side: Side) -> bool {
        self.team(side).iter().any(Combatant::is_alive)
    }

    pub fn is_alive(&self, id: CombatantId) -> bool {
        self.get(id).is_some_and(Combatant::is_alive)
    }

    /// Total number of combatants on both sides, dead or alive.
    pub fn len(&self) -> usize {
        self.players.len() + self.enemies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hands both teams back, players first.
    pub fn into_teams(self) -> (Vec<Combatant>, Vec<Combatant>) {
        (self.players, self.enemies)
    }
}
