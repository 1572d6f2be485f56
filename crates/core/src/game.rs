//! Turn engine facade over the rules state.
//! This file owns the Game struct, shared guards, and the replay dispatch;
//! the actual rules live in focused submodules.

use crate::content::ContentPack;
use crate::dice::DiceRng;
use crate::journal::InputPayload;
use crate::state::GameState;
use crate::types::*;

mod bootstrap;
mod combat;
mod encounters;
mod exploration;
mod hash;
mod items;
mod monsters;
mod movement;
mod phases;
mod statuses;
mod traps;

pub mod test_support;

pub struct Game {
    content: ContentPack,
    seed: u64,
    rng: DiceRng,
    state: GameState,
    log: Vec<LogEvent>,
    next_input_seq: u64,
    pending: Option<PendingInteraction>,
    outcome: Option<RunOutcome>,
}

impl Game {
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn content(&self) -> &ContentPack {
        &self.content
    }

    pub fn log(&self) -> &[LogEvent] {
        &self.log
    }

    pub fn pending(&self) -> Option<&PendingInteraction> {
        self.pending.as_ref()
    }

    pub fn outcome(&self) -> Option<RunOutcome> {
        self.outcome
    }

    pub fn next_input_seq(&self) -> u64 {
        self.next_input_seq
    }

    /// Replay entry point: one journaled command in, one engine call out.
    pub fn apply_input(&mut self, input: &InputPayload) -> Result<(), GameError> {
        match input {
            InputPayload::MoveHero { hero, to } => self.move_hero(*hero, *to),
            InputPayload::AttackMonster { hero, target } => self.attack_monster(*hero, *target),
            InputPayload::ResolveAttack { hero, target, roll } => {
                self.apply_attack_result(*hero, *target, *roll)
            }
            InputPayload::EndHeroPhase => self.end_hero_phase(),
            InputPayload::EndExplorationPhase => self.end_exploration_phase(),
            InputPayload::EndVillainPhase => self.end_villain_phase(),
            InputPayload::ActivateNextMonster => self.activate_next_monster(),
            InputPayload::ActivateTraps => self.activate_traps(),
            InputPayload::DisarmTrap { trap } => self.disarm_trap(*trap),
            InputPayload::DismissEncounter => self.dismiss_encounter(),
            InputPayload::CancelEncounter => self.cancel_encounter(),
            InputPayload::DismissAttackResult => self.dismiss_attack_result(),
            InputPayload::AssignTreasure { hero } => self.assign_treasure(*hero),
            InputPayload::DismissTreasure => self.dismiss_treasure(),
            InputPayload::DismissTrapResult => self.dismiss_trap_result(),
            InputPayload::DismissMonsterReport => self.dismiss_monster_report(),
            InputPayload::PlaceLairSpawn { tile } => self.place_lair_spawn(*tile),
            InputPayload::UseActionSurge { hero } => self.use_action_surge(*hero),
            InputPayload::SkipActionSurge { hero } => self.skip_action_surge(*hero),
            InputPayload::UseItem { hero, slot } => self.use_item(*hero, *slot),
            InputPayload::SetEnvironment { env } => self.set_environment(env.clone()),
        }?;
        self.next_input_seq += 1;
        Ok(())
    }

    // -- shared guards -----------------------------------------------------

    fn ensure_running(&self) -> Result<(), GameError> {
        if self.outcome.is_some() {
            return Err(GameError::RunFinished);
        }
        Ok(())
    }

    fn ensure_phase(&self, expected: Phase) -> Result<(), GameError> {
        if self.state.turn.phase != expected {
            return Err(GameError::WrongPhase { expected });
        }
        Ok(())
    }

    fn ensure_no_pending(&self) -> Result<(), GameError> {
        if self.pending.is_some() {
            return Err(GameError::InteractionPending);
        }
        Ok(())
    }

    fn ensure_active_hero(&self, hero: HeroId) -> Result<(), GameError> {
        if self.state.hero(hero).is_none() {
            return Err(GameError::HeroMissing);
        }
        if hero != self.state.turn.active_hero {
            return Err(GameError::NotActiveHero);
        }
        if self.state.active_hero().removed_from_play {
            return Err(GameError::HeroRemovedFromPlay);
        }
        Ok(())
    }

    // -- display names -----------------------------------------------------

    fn hero_name(&self, id: HeroId) -> String {
        let Some(hero) = self.state.hero(id) else {
            return format!("hero-{}", id.0);
        };
        match self.content.hero(&hero.key) {
            Some(def) => def.name.to_owned(),
            None => hero.key.clone(),
        }
    }

    fn monster_label(&self, id: MonsterId) -> String {
        match self.state.monsters.get(id) {
            Some(m) => m.instance.clone(),
            None => "a defeated monster".to_owned(),
        }
    }

    fn card_name(&self, key: &str) -> String {
        if let Some(def) = self.content.encounter(key) {
            return def.name.to_owned();
        }
        if let Some(def) = self.content.treasure(key) {
            return def.name.to_owned();
        }
        if let Some(def) = self.content.tile(key) {
            return def.name.to_owned();
        }
        if let Some(def) = self.content.monster(key) {
            return def.name.to_owned();
        }
        key.to_owned()
    }
}
