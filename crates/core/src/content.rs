//! Static card and character catalogs consumed read-only by the engine.
//! This module exists so rules code never hardcodes stats inline.
//! It does not own any mutable run state.

use std::hash::Hasher;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

use crate::types::{Direction, EdgeKind, StatusType, TileColor};

pub mod keys {
    pub const HERO_QUINN: &str = "quinn";
    pub const HERO_VISTRA: &str = "vistra";
    pub const HERO_KEYLETH: &str = "keyleth";
    pub const HERO_TARAK: &str = "tarak";
    pub const HERO_HASKAN: &str = "haskan";

    pub const MONSTER_KOBOLD: &str = "kobold";
    pub const MONSTER_SNAKE: &str = "snake";
    pub const MONSTER_CULTIST: &str = "cultist";
    pub const MONSTER_ORC_SMASHER: &str = "orc_smasher";
    pub const MONSTER_ORC_ARCHER: &str = "orc_archer";
    pub const MONSTER_GRELL: &str = "grell";

    pub const TILE_START: &str = "tile_start";
    pub const TILE_BLACK_CORRIDOR: &str = "tile_black_corridor";
    pub const TILE_BLACK_CORNER: &str = "tile_black_corner";
    pub const TILE_BLACK_JUNCTION: &str = "tile_black_junction";
    pub const TILE_BLACK_CROSSING: &str = "tile_black_crossing";
    pub const TILE_BLACK_DEAD_END: &str = "tile_black_dead_end";
    pub const TILE_WHITE_GALLERY: &str = "tile_white_gallery";
    pub const TILE_WHITE_FOUNTAIN: &str = "tile_white_fountain";
    pub const TILE_WHITE_SHRINE: &str = "tile_white_shrine";

    pub const ENC_GOBLIN_AMBUSH: &str = "goblin_ambush";
    pub const ENC_CAVE_IN: &str = "cave_in";
    pub const ENC_VOLCANIC_SPRAY: &str = "volcanic_spray";
    pub const ENC_DARK_FOG: &str = "dark_fog";
    pub const ENC_UNSTABLE_GROUND: &str = "unstable_ground";
    pub const ENC_HIGH_ALERT: &str = "high_alert";
    pub const ENC_LAVA_FLOW: &str = "lava_flow";
    pub const ENC_POISONED_DART_TRAP: &str = "poisoned_dart_trap";
    pub const ENC_ROLLING_BOULDER: &str = "rolling_boulder";
    pub const ENC_WHIRLING_BLADES: &str = "whirling_blades";
    pub const ENC_CONCEALED_PIT: &str = "concealed_pit";
    pub const ENC_BAD_LUCK: &str = "bad_luck";
    pub const ENC_TIME_LEAP: &str = "time_leap";
    pub const ENC_GAP_IN_ARMOR: &str = "gap_in_armor";
    pub const ENC_TERRIFYING_ROAR: &str = "terrifying_roar";
    pub const ENC_CAGE: &str = "cage";
    pub const ENC_DRAGON_FEAR: &str = "dragon_fear";
    pub const ENC_WRATH_OF_ENEMY: &str = "wrath_of_enemy";
    pub const ENC_BLOODLUST: &str = "bloodlust";
    pub const ENC_OCCUPIED_LAIR: &str = "occupied_lair";
    pub const ENC_LOST: &str = "lost";
    pub const ENC_HIDDEN_TREASURE: &str = "hidden_treasure";

    pub const TREASURE_PLUS_ONE_SWORD: &str = "plus_one_magic_sword";
    pub const TREASURE_PLUS_TWO_SWORD: &str = "plus_two_magic_sword";
    pub const TREASURE_AMULET: &str = "amulet_of_protection";
    pub const TREASURE_SHIELD: &str = "shield_of_protection";
    pub const TREASURE_BOOTS: &str = "boots_of_striding";
    pub const TREASURE_GAUNTLETS: &str = "gauntlets_of_ogre_power";
    pub const TREASURE_THIEVES_TOOLS: &str = "thieves_tools";
    pub const TREASURE_HEALING_POTION: &str = "potion_of_healing";
}

// ---------------------------------------------------------------------------
// Heroes
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
pub struct HeroLevel {
    pub max_hp: i32,
    pub ac: i32,
    pub surge_value: i32,
    pub attack_bonus: i32,
}

pub struct HeroDef {
    pub key: &'static str,
    pub name: &'static str,
    pub class: &'static str,
    pub speed: i32,
    pub attack_name: &'static str,
    pub damage: i32,
    /// Stats at level 1 and level 2. Leveling recomputes from this table.
    pub levels: [HeroLevel; 2],
}

// ---------------------------------------------------------------------------
// Monsters
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
pub struct AttackLine {
    pub name: &'static str,
    pub bonus: i32,
    pub damage: i32,
    pub miss_damage: Option<i32>,
    pub status: Option<StatusType>,
}

/// Monster-type-level behavior. An activation never uses two attack lines.
#[derive(Clone, Copy, Debug)]
pub enum Tactic {
    AttackOnly { melee: AttackLine },
    MoveAndAttack { melee: AttackLine },
    RangedAttack { melee: AttackLine, ranged: AttackLine, range: i32 },
}

pub struct MonsterDef {
    pub key: &'static str,
    pub name: &'static str,
    pub ac: i32,
    pub hp: i32,
    pub xp: i32,
    pub tactic: Tactic,
}

// ---------------------------------------------------------------------------
// Tiles
// ---------------------------------------------------------------------------

pub struct TileDef {
    pub key: &'static str,
    pub name: &'static str,
    pub color: TileColor,
    /// Default-orientation edges in north, east, south, west order.
    pub edges: [EdgeKind; 4],
}

impl TileDef {
    pub fn edge(&self, dir: Direction) -> EdgeKind {
        match dir {
            Direction::North => self.edges[0],
            Direction::East => self.edges[1],
            Direction::South => self.edges[2],
            Direction::West => self.edges[3],
        }
    }
}

// ---------------------------------------------------------------------------
// Encounters
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetSelector {
    ActiveHero,
    AllHeroes,
    HeroesOnActiveTile,
    HeroesWithinOneTile,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrapAttack {
    pub bonus: i32,
    pub damage: i32,
    pub miss_damage: i32,
}

/// How a trap marker behaves during the villain-phase sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrapBehavior {
    /// Damages heroes on every same-card square, then spreads one square.
    Spreading { damage: i32 },
    /// Attacks heroes standing on the marker.
    Stationary { attack: TrapAttack },
    /// Steps toward the nearest hero, flat damage at the destination.
    Rolling { damage: i32 },
    /// Steps toward the nearest hero, attack roll at the destination.
    Sweeping { attack: TrapAttack },
    /// Sits on the board doing nothing after spawn. Hazards leave these,
    /// and they cannot be disarmed.
    Inert,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VillainEffect {
    /// Each hero not adjacent to a monster takes damage at end of villain phase.
    HighAlert { damage: i32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventAction {
    TileDeckBottomToTop,
    DrawTreasure,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecialKind {
    /// Draw the bottom monster card; the players pick the tile it spawns on.
    OccupiedLair,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncounterEffect {
    Damage {
        target: TargetSelector,
        amount: i32,
    },
    Attack {
        target: TargetSelector,
        bonus: i32,
        damage: i32,
        miss_damage: Option<i32>,
        status: Option<StatusType>,
    },
    Curse {
        status: StatusType,
        duration: Option<u32>,
    },
    Trap {
        behavior: TrapBehavior,
        dc: i32,
    },
    Hazard {
        on_spawn_damage: i32,
    },
    Environment {
        attack_mod: i32,
        disable_mod: i32,
        villain: Option<VillainEffect>,
    },
    Event {
        action: EventAction,
    },
    Special {
        kind: SpecialKind,
    },
}

pub struct EncounterDef {
    pub key: &'static str,
    pub name: &'static str,
    pub effect: EncounterEffect,
    /// Mandates one more encounter draw when this card resolves.
    pub follow_up: bool,
}

// ---------------------------------------------------------------------------
// Treasures
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemBonus {
    Attack(i32),
    Damage(i32),
    Ac(i32),
    Speed(i32),
    Disable(i32),
    HealOnUse(i32),
}

pub struct TreasureDef {
    pub key: &'static str,
    pub name: &'static str,
    pub bonus: ItemBonus,
}

pub struct ScenarioDef {
    pub objective: &'static str,
    pub monsters_to_defeat: u32,
}

// ---------------------------------------------------------------------------
// Pack
// ---------------------------------------------------------------------------

pub struct ContentPack {
    pub heroes: Vec<HeroDef>,
    pub monsters: Vec<MonsterDef>,
    pub tiles: Vec<TileDef>,
    pub encounters: Vec<EncounterDef>,
    pub treasures: Vec<TreasureDef>,
    pub tile_deck: Vec<&'static str>,
    pub monster_deck: Vec<&'static str>,
    pub encounter_deck: Vec<&'static str>,
    pub treasure_deck: Vec<&'static str>,
    pub scenario: ScenarioDef,
}

impl ContentPack {
    pub fn hero(&self, key: &str) -> Option<&HeroDef> {
        self.heroes.iter().find(|h| h.key == key)
    }

    pub fn monster(&self, key: &str) -> Option<&MonsterDef> {
        self.monsters.iter().find(|m| m.key == key)
    }

    pub fn tile(&self, key: &str) -> Option<&TileDef> {
        self.tiles.iter().find(|t| t.key == key)
    }

    pub fn encounter(&self, key: &str) -> Option<&EncounterDef> {
        self.encounters.iter().find(|e| e.key == key)
    }

    pub fn treasure(&self, key: &str) -> Option<&TreasureDef> {
        self.treasures.iter().find(|t| t.key == key)
    }

    /// Stable digest of the catalog, stored in journal headers so a replay
    /// against drifted content fails loudly instead of diverging.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        for h in &self.heroes {
            hasher.write(h.key.as_bytes());
            hasher.write_i32(h.speed);
            hasher.write_i32(h.damage);
            for level in &h.levels {
                hasher.write_i32(level.max_hp);
                hasher.write_i32(level.ac);
                hasher.write_i32(level.surge_value);
                hasher.write_i32(level.attack_bonus);
            }
        }
        for m in &self.monsters {
            hash_monster(&mut hasher, m);
        }
        for t in &self.tiles {
            hasher.write(t.key.as_bytes());
            hasher.write_u8(match t.color {
                TileColor::Black => 0,
                TileColor::White => 1,
            });
            for edge in &t.edges {
                hasher.write_u8(match edge {
                    EdgeKind::Open => 0,
                    EdgeKind::Wall => 1,
                });
            }
        }
        for e in &self.encounters {
            hasher.write(e.key.as_bytes());
            hasher.write_u8(u8::from(e.follow_up));
        }
        for t in &self.treasures {
            hasher.write(t.key.as_bytes());
        }
        for key in self
            .tile_deck
            .iter()
            .chain(&self.monster_deck)
            .chain(&self.encounter_deck)
            .chain(&self.treasure_deck)
        {
            hasher.write(key.as_bytes());
        }
        hasher.write_u32(self.scenario.monsters_to_defeat);
        hasher.finish()
    }

    pub fn build_default() -> Self {
        Self {
            heroes: vec![
                HeroDef {
                    key: keys::HERO_QUINN,
                    name: "Quinn",
                    class: "Cleric",
                    speed: 5,
                    attack_name: "Warhammer",
                    damage: 2,
                    levels: [
                        HeroLevel { max_hp: 8, ac: 17, surge_value: 4, attack_bonus: 6 },
                        HeroLevel { max_hp: 10, ac: 18, surge_value: 5, attack_bonus: 7 },
                    ],
                },
                HeroDef {
                    key: keys::HERO_VISTRA,
                    name: "Vistra",
                    class: "Fighter",
                    speed: 5,
                    attack_name: "Greataxe",
                    damage: 2,
                    levels: [
                        HeroLevel { max_hp: 10, ac: 18, surge_value: 5, attack_bonus: 8 },
                        HeroLevel { max_hp: 12, ac: 19, surge_value: 6, attack_bonus: 9 },
                    ],
                },
                HeroDef {
                    key: keys::HERO_KEYLETH,
                    name: "Keyleth",
                    class: "Paladin",
                    speed: 6,
                    attack_name: "Longsword",
                    damage: 2,
                    levels: [
                        HeroLevel { max_hp: 8, ac: 16, surge_value: 4, attack_bonus: 7 },
                        HeroLevel { max_hp: 10, ac: 17, surge_value: 5, attack_bonus: 8 },
                    ],
                },
                HeroDef {
                    key: keys::HERO_TARAK,
                    name: "Tarak",
                    class: "Rogue",
                    speed: 6,
                    attack_name: "Twin Daggers",
                    damage: 1,
                    levels: [
                        HeroLevel { max_hp: 8, ac: 15, surge_value: 4, attack_bonus: 7 },
                        HeroLevel { max_hp: 10, ac: 16, surge_value: 5, attack_bonus: 8 },
                    ],
                },
                HeroDef {
                    key: keys::HERO_HASKAN,
                    name: "Haskan",
                    class: "Wizard",
                    speed: 6,
                    attack_name: "Arc Lightning",
                    damage: 2,
                    levels: [
                        HeroLevel { max_hp: 6, ac: 14, surge_value: 3, attack_bonus: 4 },
                        HeroLevel { max_hp: 8, ac: 15, surge_value: 4, attack_bonus: 5 },
                    ],
                },
            ],
            monsters: vec![
                MonsterDef {
                    key: keys::MONSTER_KOBOLD,
                    name: "Kobold Dragonshield",
                    ac: 14,
                    hp: 1,
                    xp: 1,
                    tactic: Tactic::AttackOnly {
                        melee: AttackLine {
                            name: "Short Sword",
                            bonus: 7,
                            damage: 1,
                            miss_damage: None,
                            status: None,
                        },
                    },
                },
                MonsterDef {
                    key: keys::MONSTER_SNAKE,
                    name: "Snake",
                    ac: 12,
                    hp: 1,
                    xp: 1,
                    tactic: Tactic::MoveAndAttack {
                        melee: AttackLine {
                            name: "Bite",
                            bonus: 6,
                            damage: 1,
                            miss_damage: None,
                            status: Some(StatusType::Poisoned),
                        },
                    },
                },
                MonsterDef {
                    key: keys::MONSTER_CULTIST,
                    name: "Human Cultist",
                    ac: 13,
                    hp: 1,
                    xp: 2,
                    tactic: Tactic::MoveAndAttack {
                        melee: AttackLine {
                            name: "Ritual Dagger",
                            bonus: 6,
                            damage: 1,
                            miss_damage: None,
                            status: Some(StatusType::Poisoned),
                        },
                    },
                },
                MonsterDef {
                    key: keys::MONSTER_ORC_SMASHER,
                    name: "Orc Smasher",
                    ac: 13,
                    hp: 2,
                    xp: 2,
                    tactic: Tactic::MoveAndAttack {
                        melee: AttackLine {
                            name: "Heavy Mace",
                            bonus: 9,
                            damage: 1,
                            miss_damage: None,
                            status: None,
                        },
                    },
                },
                MonsterDef {
                    key: keys::MONSTER_ORC_ARCHER,
                    name: "Orc Archer",
                    ac: 13,
                    hp: 1,
                    xp: 2,
                    tactic: Tactic::RangedAttack {
                        melee: AttackLine {
                            name: "Punch",
                            bonus: 6,
                            damage: 1,
                            miss_damage: None,
                            status: Some(StatusType::Dazed),
                        },
                        ranged: AttackLine {
                            name: "Arrow",
                            bonus: 6,
                            damage: 2,
                            miss_damage: Some(1),
                            status: None,
                        },
                        range: 2,
                    },
                },
                MonsterDef {
                    key: keys::MONSTER_GRELL,
                    name: "Grell",
                    ac: 15,
                    hp: 2,
                    xp: 3,
                    tactic: Tactic::RangedAttack {
                        melee: AttackLine {
                            name: "Venomous Bite",
                            bonus: 7,
                            damage: 1,
                            miss_damage: Some(1),
                            status: Some(StatusType::Poisoned),
                        },
                        ranged: AttackLine {
                            name: "Tentacles",
                            bonus: 7,
                            damage: 1,
                            miss_damage: None,
                            status: Some(StatusType::Dazed),
                        },
                        range: 1,
                    },
                },
            ],
            tiles: vec![
                TileDef {
                    key: keys::TILE_START,
                    name: "Start Tile",
                    color: TileColor::Black,
                    edges: [EdgeKind::Open, EdgeKind::Open, EdgeKind::Open, EdgeKind::Open],
                },
                TileDef {
                    key: keys::TILE_BLACK_CORRIDOR,
                    name: "Dim Corridor",
                    color: TileColor::Black,
                    edges: [EdgeKind::Open, EdgeKind::Wall, EdgeKind::Open, EdgeKind::Wall],
                },
                TileDef {
                    key: keys::TILE_BLACK_CORNER,
                    name: "Collapsed Corner",
                    color: TileColor::Black,
                    edges: [EdgeKind::Open, EdgeKind::Open, EdgeKind::Wall, EdgeKind::Wall],
                },
                TileDef {
                    key: keys::TILE_BLACK_JUNCTION,
                    name: "Branching Junction",
                    color: TileColor::Black,
                    edges: [EdgeKind::Open, EdgeKind::Open, EdgeKind::Open, EdgeKind::Wall],
                },
                TileDef {
                    key: keys::TILE_BLACK_CROSSING,
                    name: "Grand Crossing",
                    color: TileColor::Black,
                    edges: [EdgeKind::Open, EdgeKind::Open, EdgeKind::Open, EdgeKind::Open],
                },
                TileDef {
                    key: keys::TILE_BLACK_DEAD_END,
                    name: "Sealed Vault",
                    color: TileColor::Black,
                    edges: [EdgeKind::Wall, EdgeKind::Wall, EdgeKind::Open, EdgeKind::Wall],
                },
                TileDef {
                    key: keys::TILE_WHITE_GALLERY,
                    name: "Quiet Gallery",
                    color: TileColor::White,
                    edges: [EdgeKind::Open, EdgeKind::Wall, EdgeKind::Open, EdgeKind::Wall],
                },
                TileDef {
                    key: keys::TILE_WHITE_FOUNTAIN,
                    name: "Fountain Chamber",
                    color: TileColor::White,
                    edges: [EdgeKind::Open, EdgeKind::Open, EdgeKind::Open, EdgeKind::Wall],
                },
                TileDef {
                    key: keys::TILE_WHITE_SHRINE,
                    name: "Abandoned Shrine",
                    color: TileColor::White,
                    edges: [EdgeKind::Open, EdgeKind::Open, EdgeKind::Open, EdgeKind::Open],
                },
            ],
            encounters: vec![
                EncounterDef {
                    key: keys::ENC_GOBLIN_AMBUSH,
                    name: "Goblin Ambush",
                    effect: EncounterEffect::Damage { target: TargetSelector::ActiveHero, amount: 1 },
                    follow_up: true,
                },
                EncounterDef {
                    key: keys::ENC_CAVE_IN,
                    name: "Cave-In",
                    effect: EncounterEffect::Damage { target: TargetSelector::AllHeroes, amount: 1 },
                    follow_up: false,
                },
                EncounterDef {
                    key: keys::ENC_VOLCANIC_SPRAY,
                    name: "Volcanic Spray",
                    effect: EncounterEffect::Attack {
                        target: TargetSelector::HeroesWithinOneTile,
                        bonus: 8,
                        damage: 1,
                        miss_damage: None,
                        status: None,
                    },
                    follow_up: false,
                },
                EncounterDef {
                    key: keys::ENC_DARK_FOG,
                    name: "Dark Fog",
                    effect: EncounterEffect::Environment {
                        attack_mod: -2,
                        disable_mod: 0,
                        villain: None,
                    },
                    follow_up: false,
                },
                EncounterDef {
                    key: keys::ENC_UNSTABLE_GROUND,
                    name: "Unstable Ground",
                    effect: EncounterEffect::Environment {
                        attack_mod: 0,
                        disable_mod: -2,
                        villain: None,
                    },
                    follow_up: false,
                },
                EncounterDef {
                    key: keys::ENC_HIGH_ALERT,
                    name: "High Alert",
                    effect: EncounterEffect::Environment {
                        attack_mod: 0,
                        disable_mod: 0,
                        villain: Some(VillainEffect::HighAlert { damage: 1 }),
                    },
                    follow_up: false,
                },
                EncounterDef {
                    key: keys::ENC_LAVA_FLOW,
                    name: "Lava Flow",
                    effect: EncounterEffect::Trap {
                        behavior: TrapBehavior::Spreading { damage: 1 },
                        dc: 10,
                    },
                    follow_up: false,
                },
                EncounterDef {
                    key: keys::ENC_POISONED_DART_TRAP,
                    name: "Poisoned Dart Trap",
                    effect: EncounterEffect::Trap {
                        behavior: TrapBehavior::Stationary {
                            attack: TrapAttack { bonus: 8, damage: 2, miss_damage: 1 },
                        },
                        dc: 12,
                    },
                    follow_up: false,
                },
                EncounterDef {
                    key: keys::ENC_ROLLING_BOULDER,
                    name: "Rolling Boulder",
                    effect: EncounterEffect::Trap {
                        behavior: TrapBehavior::Rolling { damage: 2 },
                        dc: 11,
                    },
                    follow_up: false,
                },
                EncounterDef {
                    key: keys::ENC_WHIRLING_BLADES,
                    name: "Whirling Blades",
                    effect: EncounterEffect::Trap {
                        behavior: TrapBehavior::Sweeping {
                            attack: TrapAttack { bonus: 8, damage: 2, miss_damage: 1 },
                        },
                        dc: 11,
                    },
                    follow_up: false,
                },
                EncounterDef {
                    key: keys::ENC_CONCEALED_PIT,
                    name: "Concealed Pit",
                    effect: EncounterEffect::Hazard { on_spawn_damage: 1 },
                    follow_up: false,
                },
                EncounterDef {
                    key: keys::ENC_BAD_LUCK,
                    name: "Bad Luck",
                    effect: EncounterEffect::Curse { status: StatusType::CurseBadLuck, duration: None },
                    follow_up: false,
                },
                EncounterDef {
                    key: keys::ENC_TIME_LEAP,
                    name: "Time Leap",
                    effect: EncounterEffect::Curse {
                        status: StatusType::CurseTimeLeap,
                        duration: None,
                    },
                    follow_up: false,
                },
                EncounterDef {
                    key: keys::ENC_GAP_IN_ARMOR,
                    name: "Gap in Armor",
                    effect: EncounterEffect::Curse {
                        status: StatusType::CurseGapInArmor,
                        duration: None,
                    },
                    follow_up: false,
                },
                EncounterDef {
                    key: keys::ENC_TERRIFYING_ROAR,
                    name: "Terrifying Roar",
                    effect: EncounterEffect::Curse {
                        status: StatusType::CurseTerrifyingRoar,
                        duration: Some(1),
                    },
                    follow_up: false,
                },
                EncounterDef {
                    key: keys::ENC_CAGE,
                    name: "Cage",
                    effect: EncounterEffect::Curse { status: StatusType::CurseCage, duration: None },
                    follow_up: false,
                },
                EncounterDef {
                    key: keys::ENC_DRAGON_FEAR,
                    name: "Dragon Fear",
                    effect: EncounterEffect::Curse {
                        status: StatusType::CurseDragonFear,
                        duration: None,
                    },
                    follow_up: false,
                },
                EncounterDef {
                    key: keys::ENC_WRATH_OF_ENEMY,
                    name: "Wrath of the Enemy",
                    effect: EncounterEffect::Curse {
                        status: StatusType::CurseWrathOfEnemy,
                        duration: None,
                    },
                    follow_up: false,
                },
                EncounterDef {
                    key: keys::ENC_BLOODLUST,
                    name: "Bloodlust",
                    effect: EncounterEffect::Curse {
                        status: StatusType::CurseBloodlust,
                        duration: None,
                    },
                    follow_up: false,
                },
                EncounterDef {
                    key: keys::ENC_OCCUPIED_LAIR,
                    name: "Occupied Lair",
                    effect: EncounterEffect::Special { kind: SpecialKind::OccupiedLair },
                    follow_up: false,
                },
                EncounterDef {
                    key: keys::ENC_LOST,
                    name: "Lost",
                    effect: EncounterEffect::Event { action: EventAction::TileDeckBottomToTop },
                    follow_up: false,
                },
                EncounterDef {
                    key: keys::ENC_HIDDEN_TREASURE,
                    name: "Hidden Treasure",
                    effect: EncounterEffect::Event { action: EventAction::DrawTreasure },
                    follow_up: false,
                },
            ],
            treasures: vec![
                TreasureDef {
                    key: keys::TREASURE_PLUS_ONE_SWORD,
                    name: "+1 Magic Sword",
                    bonus: ItemBonus::Attack(1),
                },
                TreasureDef {
                    key: keys::TREASURE_PLUS_TWO_SWORD,
                    name: "+2 Magic Sword",
                    bonus: ItemBonus::Attack(2),
                },
                TreasureDef {
                    key: keys::TREASURE_AMULET,
                    name: "Amulet of Protection",
                    bonus: ItemBonus::Ac(1),
                },
                TreasureDef {
                    key: keys::TREASURE_SHIELD,
                    name: "Shield of Protection",
                    bonus: ItemBonus::Ac(1),
                },
                TreasureDef {
                    key: keys::TREASURE_BOOTS,
                    name: "Boots of Striding",
                    bonus: ItemBonus::Speed(1),
                },
                TreasureDef {
                    key: keys::TREASURE_GAUNTLETS,
                    name: "Gauntlets of Ogre Power",
                    bonus: ItemBonus::Damage(1),
                },
                TreasureDef {
                    key: keys::TREASURE_THIEVES_TOOLS,
                    name: "Thieves' Tools",
                    bonus: ItemBonus::Disable(4),
                },
                TreasureDef {
                    key: keys::TREASURE_HEALING_POTION,
                    name: "Potion of Healing",
                    bonus: ItemBonus::HealOnUse(2),
                },
            ],
            tile_deck: vec![
                keys::TILE_BLACK_CORRIDOR,
                keys::TILE_BLACK_CORNER,
                keys::TILE_BLACK_JUNCTION,
                keys::TILE_BLACK_CROSSING,
                keys::TILE_BLACK_DEAD_END,
                keys::TILE_WHITE_GALLERY,
                keys::TILE_WHITE_FOUNTAIN,
                keys::TILE_WHITE_SHRINE,
            ],
            monster_deck: vec![
                keys::MONSTER_KOBOLD,
                keys::MONSTER_SNAKE,
                keys::MONSTER_KOBOLD,
                keys::MONSTER_CULTIST,
                keys::MONSTER_SNAKE,
                keys::MONSTER_ORC_SMASHER,
                keys::MONSTER_ORC_ARCHER,
                keys::MONSTER_GRELL,
                keys::MONSTER_CULTIST,
            ],
            encounter_deck: vec![
                keys::ENC_GOBLIN_AMBUSH,
                keys::ENC_CAVE_IN,
                keys::ENC_VOLCANIC_SPRAY,
                keys::ENC_DARK_FOG,
                keys::ENC_UNSTABLE_GROUND,
                keys::ENC_HIGH_ALERT,
                keys::ENC_LAVA_FLOW,
                keys::ENC_POISONED_DART_TRAP,
                keys::ENC_ROLLING_BOULDER,
                keys::ENC_WHIRLING_BLADES,
                keys::ENC_CONCEALED_PIT,
                keys::ENC_BAD_LUCK,
                keys::ENC_TIME_LEAP,
                keys::ENC_GAP_IN_ARMOR,
                keys::ENC_TERRIFYING_ROAR,
                keys::ENC_CAGE,
                keys::ENC_DRAGON_FEAR,
                keys::ENC_WRATH_OF_ENEMY,
                keys::ENC_BLOODLUST,
                keys::ENC_OCCUPIED_LAIR,
                keys::ENC_LOST,
                keys::ENC_HIDDEN_TREASURE,
            ],
            treasure_deck: vec![
                keys::TREASURE_PLUS_ONE_SWORD,
                keys::TREASURE_PLUS_TWO_SWORD,
                keys::TREASURE_AMULET,
                keys::TREASURE_SHIELD,
                keys::TREASURE_BOOTS,
                keys::TREASURE_GAUNTLETS,
                keys::TREASURE_THIEVES_TOOLS,
                keys::TREASURE_HEALING_POTION,
                keys::TREASURE_HEALING_POTION,
            ],
            scenario: ScenarioDef {
                objective: "Defeat two of the marauders haunting the upper halls.",
                monsters_to_defeat: 2,
            },
        }
    }
}

impl Default for ContentPack {
    fn default() -> Self {
        Self::build_default()
    }
}

fn hash_monster(hasher: &mut Xxh3, m: &MonsterDef) {
    hasher.write(m.key.as_bytes());
    hasher.write_i32(m.ac);
    hasher.write_i32(m.hp);
    hasher.write_i32(m.xp);
    let lines: Vec<&AttackLine> = match &m.tactic {
        Tactic::AttackOnly { melee } | Tactic::MoveAndAttack { melee } => vec![melee],
        Tactic::RangedAttack { melee, ranged, range } => {
            hasher.write_i32(*range);
            vec![melee, ranged]
        }
    };
    for line in lines {
        hasher.write(line.name.as_bytes());
        hasher.write_i32(line.bonus);
        hasher.write_i32(line.damage);
        hasher.write_i32(line.miss_damage.unwrap_or(0));
    }
}
