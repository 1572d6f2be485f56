use std::fmt;

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    pub struct MonsterId;
}

/// Index into the party list, stable for the whole run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HeroId(pub u8);

/// Placed-tile id. The start tile is always `TileId(0)`; later tiles are
/// numbered in placement order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileId(pub u16);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub y: i32,
    pub x: i32,
}

impl Pos {
    pub fn manhattan(self, other: Pos) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Chebyshev adjacency: within one square in each axis, not the same square.
    pub fn adjacent(self, other: Pos) -> bool {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        dx <= 1 && dy <= 1 && (dx > 0 || dy > 0)
    }

    pub fn step(self, dir: Direction) -> Pos {
        let (dy, dx) = dir.delta();
        Pos { y: self.y + dy, x: self.x + dx }
    }

    pub fn offset(self, dy: i32, dx: i32) -> Pos {
        Pos { y: self.y + dy, x: self.x + dx }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] =
        [Direction::North, Direction::East, Direction::South, Direction::West];

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (-1, 0),
            Direction::East => (0, 1),
            Direction::South => (1, 0),
            Direction::West => (0, -1),
        }
    }
}

/// Clockwise tile rotation applied at placement time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [Rotation::R0, Rotation::R90, Rotation::R180, Rotation::R270];

    pub fn quarter_turns(self) -> u8 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 1,
            Rotation::R180 => 2,
            Rotation::R270 => 3,
        }
    }
}

/// Edge kind in a tile definition's default orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    Open,
    Wall,
}

/// Edge state on a placed tile. `Unexplored` is a placement-time state and
/// must agree with the unexplored-edge list at all times.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeState {
    Open,
    Wall,
    Unexplored,
}

/// Which part of an edge an unexplored entry covers. Halves only occur on
/// the double-height start tile's east and west edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeSegment {
    Whole,
    NorthHalf,
    SouthHalf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnexploredEdge {
    pub tile: TileId,
    pub direction: Direction,
    pub segment: EdgeSegment,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileColor {
    Black,
    White,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Hero,
    Exploration,
    Villain,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    Victory,
    Defeat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusType {
    Poisoned,
    Slowed,
    Immobilized,
    Stunned,
    Dazed,
    Weakened,
    Blinded,
    OngoingDamage,
    CurseBadLuck,
    CurseTimeLeap,
    CurseGapInArmor,
    CurseTerrifyingRoar,
    CurseCage,
    CurseDragonFear,
    CurseWrathOfEnemy,
    CurseBloodlust,
}

impl StatusType {
    pub fn is_curse(self) -> bool {
        matches!(
            self,
            StatusType::CurseBadLuck
                | StatusType::CurseTimeLeap
                | StatusType::CurseGapInArmor
                | StatusType::CurseTerrifyingRoar
                | StatusType::CurseCage
                | StatusType::CurseDragonFear
                | StatusType::CurseWrathOfEnemy
                | StatusType::CurseBloodlust
        )
    }

    /// Curses shed by the end-of-villain-phase d20 roll.
    pub fn removable_by_roll(self) -> bool {
        matches!(
            self,
            StatusType::CurseBadLuck
                | StatusType::CurseWrathOfEnemy
                | StatusType::CurseDragonFear
                | StatusType::CurseCage
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            StatusType::Poisoned => "Poisoned",
            StatusType::Slowed => "Slowed",
            StatusType::Immobilized => "Immobilized",
            StatusType::Stunned => "Stunned",
            StatusType::Dazed => "Dazed",
            StatusType::Weakened => "Weakened",
            StatusType::Blinded => "Blinded",
            StatusType::OngoingDamage => "Ongoing Damage",
            StatusType::CurseBadLuck => "Bad Luck",
            StatusType::CurseTimeLeap => "Time Leap",
            StatusType::CurseGapInArmor => "Gap in Armor",
            StatusType::CurseTerrifyingRoar => "Terrifying Roar",
            StatusType::CurseCage => "Cage",
            StatusType::CurseDragonFear => "Dragon Fear",
            StatusType::CurseWrathOfEnemy => "Wrath of the Enemy",
            StatusType::CurseBloodlust => "Bloodlust",
        }
    }
}

/// Where a status came from. Reapplication from the same source replaces the
/// existing record; different sources of the same type stack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusSource {
    Card(String),
    Monster(String),
    System,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusData {
    OngoingDamage { amount: i32 },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: StatusType,
    pub source: StatusSource,
    pub applied_on_turn: u32,
    pub duration: Option<u32>,
    pub data: Option<StatusData>,
}

// ---------------------------------------------------------------------------
// Pending interactions
// ---------------------------------------------------------------------------

/// The single interaction slot. At most one of these is ever pending; the
/// caller resolves it through the matching dismiss/resolve command before
/// phase-ending commands are accepted again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PendingInteraction {
    EncounterDrawn { card: String },
    AttackResolved(AttackOutcome),
    TreasureDrawn { card: String },
    TrapDisarm(DisarmOutcome),
    MonsterActed(MonsterReport),
    LairSpawn { monster: String },
    ActionSurge { hero: HeroId },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttackOutcome {
    pub hero: HeroId,
    pub target: String,
    pub attack: String,
    pub roll: i32,
    pub total: i32,
    pub hit: bool,
    pub damage: i32,
    pub defeated: bool,
    /// Treasure card drawn by a kill, surfaced after this result is dismissed.
    pub treasure: Option<String>,
    pub leveled_up: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisarmOutcome {
    pub trap: u32,
    pub roll: i32,
    pub total: i32,
    pub dc: i32,
    pub removed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonsterReport {
    pub monster: String,
    pub moved_to: Option<Pos>,
    pub attack: Option<MonsterAttackOutcome>,
    /// Tile key placed by monster-triggered exploration, if any.
    pub explored: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonsterAttackOutcome {
    pub target: HeroId,
    pub roll: i32,
    pub total: i32,
    pub hit: bool,
    pub damage: i32,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameError {
    RunFinished,
    WrongPhase { expected: Phase },
    NotActiveHero,
    HeroRemovedFromPlay,
    InteractionPending,
    NoInteraction,
    InteractionMismatch,
    PartySize { given: usize },
    StartPositionInvalid { pos: Pos },
    StartPositionTaken { pos: Pos },
    UnknownContent { key: String },
    ContentInvalid { key: String },
    HeroMissing,
    MonsterMissing,
    TrapMissing { trap: u32 },
    NotOnTrap { trap: u32 },
    TrapNotDisarmable { trap: u32 },
    TrapsAlreadyProcessed,
    ActivationsExhausted,
    ActivationsRemaining { left: usize },
    ActionAlreadySpent,
    OneActionWhileDazed,
    CannotMove,
    CannotAttack,
    DestinationUnreachable { to: Pos },
    TargetNotAdjacent,
    RollOutOfRange { roll: i32 },
    NotEnoughXp { need: i32, have: i32 },
    TileMissing { tile: TileId },
    ItemSlotInvalid { slot: usize },
    ItemNotUsable,
    NotAnEnvironment { key: String },
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RunFinished => write!(f, "the adventure is already over"),
            Self::WrongPhase { expected } => write!(f, "command requires the {expected:?} phase"),
            Self::NotActiveHero => write!(f, "only the active hero may act"),
            Self::HeroRemovedFromPlay => write!(f, "hero is removed from play"),
            Self::InteractionPending => write!(f, "an interaction is pending and must be resolved"),
            Self::NoInteraction => write!(f, "no interaction is pending"),
            Self::InteractionMismatch => {
                write!(f, "pending interaction does not match this command")
            }
            Self::PartySize { given } => write!(f, "party must have 1 to 5 heroes, got {given}"),
            Self::StartPositionInvalid { pos } => {
                write!(f, "({}, {}) is not a legal setup square", pos.x, pos.y)
            }
            Self::StartPositionTaken { pos } => {
                write!(f, "setup square ({}, {}) is already taken", pos.x, pos.y)
            }
            Self::UnknownContent { key } => write!(f, "unknown content key: {key}"),
            Self::ContentInvalid { key } => write!(f, "content entry {key} failed validation"),
            Self::HeroMissing => write!(f, "no such hero in the party"),
            Self::MonsterMissing => write!(f, "monster is no longer on the board"),
            Self::TrapMissing { trap } => write!(f, "no trap marker with id {trap}"),
            Self::NotOnTrap { trap } => write!(f, "hero is not standing on trap {trap}"),
            Self::TrapNotDisarmable { trap } => {
                write!(f, "hazard marker {trap} cannot be disarmed")
            }
            Self::TrapsAlreadyProcessed => {
                write!(f, "traps were already processed this villain phase")
            }
            Self::ActivationsExhausted => write!(f, "every controlled monster already activated"),
            Self::ActivationsRemaining { left } => {
                write!(f, "{left} controlled monster(s) still await activation")
            }
            Self::ActionAlreadySpent => write!(f, "that action was already used this turn"),
            Self::OneActionWhileDazed => write!(f, "a dazed hero gets only one action"),
            Self::CannotMove => write!(f, "hero cannot move right now"),
            Self::CannotAttack => write!(f, "hero cannot attack right now"),
            Self::DestinationUnreachable { to } => {
                write!(f, "({}, {}) is out of reach", to.x, to.y)
            }
            Self::TargetNotAdjacent => write!(f, "target is not adjacent"),
            Self::RollOutOfRange { roll } => write!(f, "d20 roll {roll} outside 1..=20"),
            Self::NotEnoughXp { need, have } => {
                write!(f, "needs {need} XP, party has {have}")
            }
            Self::TileMissing { tile } => write!(f, "no placed tile with id {}", tile.0),
            Self::ItemSlotInvalid { slot } => write!(f, "no item in inventory slot {slot}"),
            Self::ItemNotUsable => write!(f, "item has no use action or is spent"),
            Self::NotAnEnvironment { key } => write!(f, "{key} is not an environment card"),
        }
    }
}

impl std::error::Error for GameError {}

// ---------------------------------------------------------------------------
// Log events
// ---------------------------------------------------------------------------

/// Append-only narration of everything that happened. Tests match on
/// variants; `Display` renders the player-facing line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogEvent {
    TilePlaced { tile: String, id: TileId },
    PassageOpened { from: TileId, to: TileId },
    MonsterSpawned { monster: String },
    MonsterExplored { monster: String, tile: String },
    HeroAttack { hero: String, target: String, attack: String, roll: i32, hit: bool, damage: i32 },
    MonsterDefeated { monster: String, xp: i32 },
    LeveledUp { hero: String },
    MonsterMoved { monster: String, to: Pos },
    MonsterAttack { monster: String, target: String, roll: i32, hit: bool, damage: i32 },
    MonsterLured { monster: String, hero: String },
    EncounterDrawn { card: String },
    EncounterCancelled { card: String, cost: i32 },
    EnvironmentActivated { card: String },
    EnvironmentCleared { card: String },
    FollowUpDraw { card: String },
    BadLuckExtraDraw { hero: String },
    EncounterDamage { card: String, hero: String, damage: i32 },
    EncounterAttack { card: String, hero: String, roll: i32, hit: bool, damage: i32 },
    TreasureDrawn { card: String },
    TreasureAssigned { card: String, hero: String },
    TreasureDiscarded { card: String },
    ItemUsed { hero: String, card: String, healed: i32 },
    StatusApplied { hero: String, status: StatusType },
    StatusExpired { hero: String, status: StatusType },
    OngoingHurt { hero: String, amount: i32 },
    CurseHurt { hero: String, status: StatusType },
    CurseRemoved { hero: String, status: StatusType, roll: i32 },
    CurseRemovalFailed { hero: String, status: StatusType, roll: i32 },
    GapInArmorLifted { hero: String },
    PoisonRecovered { hero: String, roll: i32 },
    PoisonRecoveryFailed { hero: String, roll: i32 },
    TimeLeapDeparted { hero: String },
    TimeLeapReturned { hero: String },
    TrapSpawned { card: String, pos: Pos },
    LavaSpread { pos: Pos },
    TrapMoved { card: String, to: Pos },
    TrapDamage { card: String, hero: String, damage: i32 },
    TrapAttack { card: String, hero: String, roll: i32, hit: bool, damage: i32 },
    TrapDisarmed { trap: u32, roll: i32, total: i32 },
    DisarmFailed { trap: u32, roll: i32, total: i32 },
    TileDeckRearranged { card: String },
    SurgeUsed { hero: String, restored: i32 },
    SurgeDeclined { hero: String },
    HeroFell { hero: String },
    PartyOverwhelmed { threat: String },
    Victory,
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TilePlaced { tile, id } => write!(f, "Tile {tile} placed (#{}).", id.0),
            Self::PassageOpened { from, to } => {
                write!(f, "A passage opens between tiles #{} and #{}.", from.0, to.0)
            }
            Self::MonsterSpawned { monster } => write!(f, "A {monster} emerges."),
            Self::MonsterExplored { monster, tile } => {
                write!(f, "The {monster} pushes into unexplored halls: {tile} is revealed.")
            }
            Self::HeroAttack { hero, target, attack, roll, hit, damage } => {
                if *hit {
                    write!(f, "{hero}'s {attack} hits {target} for {damage} (rolled {roll}).")
                } else {
                    write!(f, "{hero}'s {attack} misses {target} (rolled {roll}).")
                }
            }
            Self::MonsterDefeated { monster, xp } => {
                write!(f, "{monster} is defeated, worth {xp} XP.")
            }
            Self::LeveledUp { hero } => write!(f, "{hero} reaches level 2."),
            Self::MonsterMoved { monster, to } => {
                write!(f, "{monster} moves to ({}, {}).", to.x, to.y)
            }
            Self::MonsterAttack { monster, target, roll, hit, damage } => {
                if *hit {
                    write!(f, "{monster} hits {target} for {damage} (rolled {roll}).")
                } else {
                    write!(f, "{monster} misses {target} (rolled {roll}).")
                }
            }
            Self::MonsterLured { monster, hero } => {
                write!(f, "The {monster} is drawn to {hero}'s side.")
            }
            Self::EncounterDrawn { card } => write!(f, "Encounter: {card}."),
            Self::EncounterCancelled { card, cost } => {
                write!(f, "{card} cancelled for {cost} XP.")
            }
            Self::EnvironmentActivated { card } => write!(f, "{card} settles over the dungeon."),
            Self::EnvironmentCleared { card } => write!(f, "{card} dissipates."),
            Self::FollowUpDraw { card } => write!(f, "{card} demands another encounter draw."),
            Self::BadLuckExtraDraw { hero } => {
                write!(f, "{hero}'s Bad Luck curse draws an extra encounter.")
            }
            Self::EncounterDamage { card, hero, damage } => {
                write!(f, "{card} deals {damage} to {hero}.")
            }
            Self::EncounterAttack { card, hero, roll, hit, damage } => {
                if *hit {
                    write!(f, "{card} hits {hero} for {damage} (rolled {roll}).")
                } else {
                    write!(f, "{card} misses {hero} (rolled {roll}).")
                }
            }
            Self::TreasureDrawn { card } => write!(f, "Treasure found: {card}."),
            Self::TreasureAssigned { card, hero } => write!(f, "{hero} takes the {card}."),
            Self::TreasureDiscarded { card } => write!(f, "The {card} is left behind."),
            Self::ItemUsed { hero, card, healed } => {
                write!(f, "{hero} uses the {card} and recovers {healed} HP.")
            }
            Self::StatusApplied { hero, status } => {
                write!(f, "{hero} is afflicted: {}.", status.name())
            }
            Self::StatusExpired { hero, status } => {
                write!(f, "{} wears off {hero}.", status.name())
            }
            Self::OngoingHurt { hero, amount } => {
                write!(f, "{hero} suffers {amount} ongoing damage.")
            }
            Self::CurseHurt { hero, status } => {
                write!(f, "{hero} suffers 1 damage from {}.", status.name())
            }
            Self::CurseRemoved { hero, status, roll } => {
                write!(f, "{hero} rolled {roll} and shook off {}.", status.name())
            }
            Self::CurseRemovalFailed { hero, status, roll } => {
                write!(f, "{hero} rolled {roll}; {} holds fast.", status.name())
            }
            Self::GapInArmorLifted { hero } => {
                write!(f, "{hero} did not move; the Gap in Armor curse is lifted.")
            }
            Self::PoisonRecovered { hero, roll } => {
                write!(f, "{hero} rolled {roll} and purges the poison.")
            }
            Self::PoisonRecoveryFailed { hero, roll } => {
                write!(f, "{hero} rolled {roll}; the poison lingers.")
            }
            Self::TimeLeapDeparted { hero } => {
                write!(f, "{hero} blinks out of time.")
            }
            Self::TimeLeapReturned { hero } => write!(f, "{hero} returns to play."),
            Self::TrapSpawned { card, pos } => {
                write!(f, "{card} appears at ({}, {}).", pos.x, pos.y)
            }
            Self::LavaSpread { pos } => write!(f, "Lava spreads to ({}, {}).", pos.x, pos.y),
            Self::TrapMoved { card, to } => {
                write!(f, "The {card} grinds to ({}, {}).", to.x, to.y)
            }
            Self::TrapDamage { card, hero, damage } => {
                write!(f, "{card} deals {damage} to {hero}.")
            }
            Self::TrapAttack { card, hero, roll, hit, damage } => {
                if *hit {
                    write!(f, "{card} hits {hero} for {damage} (rolled {roll}).")
                } else {
                    write!(f, "{card} misses {hero} (rolled {roll}).")
                }
            }
            Self::TrapDisarmed { trap, roll, total } => {
                write!(f, "Trap {trap} disarmed (rolled {roll}, total {total}).")
            }
            Self::DisarmFailed { trap, roll, total } => {
                write!(f, "Trap {trap} resists (rolled {roll}, total {total}).")
            }
            Self::TileDeckRearranged { card } => {
                write!(f, "{card} rearranges the tile stack.")
            }
            Self::SurgeUsed { hero, restored } => {
                write!(f, "{hero} spends a healing surge and recovers to {restored} HP.")
            }
            Self::SurgeDeclined { hero } => {
                write!(f, "{hero} chose not to use a healing surge while at 0 HP.")
            }
            Self::HeroFell { hero } => {
                write!(f, "{hero} fell with no healing surges remaining.")
            }
            Self::PartyOverwhelmed { threat } => {
                write!(f, "The party was overwhelmed by {threat}.")
            }
            Self::Victory => write!(f, "The objective is met. The party is victorious!"),
        }
    }
}
