//! In-memory command journal: the seed, the party, and every accepted input.
//! This module exists so a finished run can be carried around as plain data.
//! It does not read or write files; journal_file.rs owns the on-disk form.

use serde::{Deserialize, Serialize};

use crate::content::ContentPack;
use crate::types::{HeroId, MonsterId, Pos, TileId};

pub const FORMAT_VERSION: u16 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputJournal {
    pub format_version: u16,
    pub build_id: String,
    pub content_hash: u64,
    pub seed: u64,
    pub heroes: Vec<String>,
    pub positions: Option<Vec<Pos>>,
    pub inputs: Vec<InputRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRecord {
    pub seq: u64,
    pub payload: InputPayload,
}

/// One accepted command, exactly as `Game::apply_input` dispatches it.
///
/// Monster ids are slot keys; they only mean something alongside the seed
/// and party recorded in the journal header, which reproduce the same
/// allocation order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputPayload {
    MoveHero { hero: HeroId, to: Pos },
    AttackMonster { hero: HeroId, target: MonsterId },
    /// Attack with a physical-dice roll instead of the engine rng.
    ResolveAttack { hero: HeroId, target: MonsterId, roll: i32 },
    EndHeroPhase,
    EndExplorationPhase,
    EndVillainPhase,
    ActivateNextMonster,
    ActivateTraps,
    DisarmTrap { trap: u32 },
    DismissEncounter,
    CancelEncounter,
    DismissAttackResult,
    AssignTreasure { hero: HeroId },
    DismissTreasure,
    DismissTrapResult,
    DismissMonsterReport,
    PlaceLairSpawn { tile: TileId },
    UseActionSurge { hero: HeroId },
    SkipActionSurge { hero: HeroId },
    UseItem { hero: HeroId, slot: usize },
    SetEnvironment { env: Option<String> },
}

impl InputJournal {
    /// Header mirrors the `Game::new` arguments, so a loaded journal is
    /// enough to reconstruct the run it records.
    pub fn new(seed: u64, hero_keys: &[&str], positions: Option<&[Pos]>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            build_id: env!("CARGO_PKG_VERSION").to_owned(),
            content_hash: ContentPack::build_default().content_hash(),
            seed,
            heroes: hero_keys.iter().map(|k| (*k).to_owned()).collect(),
            positions: positions.map(<[Pos]>::to_vec),
            inputs: Vec::new(),
        }
    }

    /// Callers pass the seq the engine reported for the input, normally
    /// `Game::next_input_seq` taken just before `apply_input`.
    pub fn append(&mut self, seq: u64, payload: InputPayload) {
        self.inputs.push(InputRecord { seq, payload });
    }
}
