//! New-run construction: content checks, party placement, deck shuffling.
//! This module exists to keep setup-time concerns out of turn resolution.
//! It does not own anything that happens after the first hero phase starts.

use super::*;
use crate::state::{
    Deck, EdgeMap, GridPos, Hero, PartyResources, PlacedTile, ScenarioState, TurnState,
    START_SETUP_SQUARES,
};

impl Game {
    /// Starts a fresh run with the given party.
    ///
    /// When `positions` is `None` the start squares are dealt from the rng,
    /// which is also what replay relies on. All rng consumption here happens
    /// in a fixed order: positions first, then the four decks.
    pub fn new(seed: u64, hero_keys: &[&str], positions: Option<&[Pos]>) -> Result<Self, GameError> {
        let content = ContentPack::build_default();
        validate_content(&content)?;

        if hero_keys.is_empty() || hero_keys.len() > 5 {
            return Err(GameError::PartySize {
                given: hero_keys.len(),
            });
        }
        for (i, key) in hero_keys.iter().enumerate() {
            if content.hero(key).is_none() {
                return Err(GameError::UnknownContent {
                    key: (*key).to_owned(),
                });
            }
            if hero_keys[..i].contains(key) {
                return Err(GameError::ContentInvalid {
                    key: (*key).to_owned(),
                });
            }
        }

        let mut rng = DiceRng::seed_from_u64(seed);

        let start_positions: Vec<Pos> = match positions {
            Some(given) => {
                if given.len() != hero_keys.len() {
                    return Err(GameError::PartySize { given: given.len() });
                }
                for (i, pos) in given.iter().enumerate() {
                    if !START_SETUP_SQUARES.contains(pos) {
                        return Err(GameError::StartPositionInvalid { pos: *pos });
                    }
                    if given[..i].contains(pos) {
                        return Err(GameError::StartPositionTaken { pos: *pos });
                    }
                }
                given.to_vec()
            }
            None => {
                let mut squares = START_SETUP_SQUARES.to_vec();
                rng.shuffle(&mut squares);
                squares.truncate(hero_keys.len());
                squares
            }
        };

        let mut tile_deck = Deck::new(&content.tile_deck);
        tile_deck.shuffle(&mut rng);
        let mut monster_deck = Deck::new(&content.monster_deck);
        monster_deck.shuffle(&mut rng);
        let mut encounter_deck = Deck::new(&content.encounter_deck);
        encounter_deck.shuffle(&mut rng);
        let mut treasure_deck = Deck::new(&content.treasure_deck);
        treasure_deck.shuffle(&mut rng);

        let start_def = content
            .tile(crate::content::keys::TILE_START)
            .ok_or_else(|| GameError::ContentInvalid {
                key: crate::content::keys::TILE_START.to_owned(),
            })?;
        let start = PlacedTile {
            id: TileId(0),
            key: start_def.key.to_owned(),
            color: start_def.color,
            grid: GridPos { col: 0, row: 0 },
            rotation: Rotation::R0,
            edges: EdgeMap::all(EdgeState::Unexplored),
        };
        // The doubled-height start tile exposes six frontiers, one per half
        // on the long sides.
        let unexplored_edges = vec![
            UnexploredEdge {
                tile: start.id,
                direction: Direction::North,
                segment: EdgeSegment::Whole,
            },
            UnexploredEdge {
                tile: start.id,
                direction: Direction::South,
                segment: EdgeSegment::Whole,
            },
            UnexploredEdge {
                tile: start.id,
                direction: Direction::East,
                segment: EdgeSegment::NorthHalf,
            },
            UnexploredEdge {
                tile: start.id,
                direction: Direction::East,
                segment: EdgeSegment::SouthHalf,
            },
            UnexploredEdge {
                tile: start.id,
                direction: Direction::West,
                segment: EdgeSegment::NorthHalf,
            },
            UnexploredEdge {
                tile: start.id,
                direction: Direction::West,
                segment: EdgeSegment::SouthHalf,
            },
        ];

        let mut heroes = Vec::with_capacity(hero_keys.len());
        for (i, key) in hero_keys.iter().enumerate() {
            let def = content.hero(key).ok_or_else(|| GameError::UnknownContent {
                key: (*key).to_owned(),
            })?;
            heroes.push(Hero {
                id: HeroId(i as u8),
                key: def.key.to_owned(),
                level: 1,
                hp: def.levels[0].max_hp,
                pos: start_positions[i],
                moved: false,
                attacked: false,
                statuses: Vec::new(),
                inventory: Vec::new(),
                removed_from_play: false,
            });
        }

        let state = GameState {
            tiles: vec![start],
            unexplored_edges,
            heroes,
            monsters: slotmap::SlotMap::with_key(),
            roster: Vec::new(),
            traps: Vec::new(),
            tile_deck,
            monster_deck,
            encounter_deck,
            treasure_deck,
            active_environment: None,
            party: PartyResources {
                xp: 0,
                healing_surges: 2,
            },
            scenario: ScenarioState {
                monsters_defeated: 0,
                monsters_to_defeat: content.scenario.monsters_to_defeat,
            },
            turn: TurnState::first_turn(HeroId(0)),
            next_trap_id: 1,
            next_monster_number: 1,
        };

        Ok(Self {
            content,
            seed,
            rng,
            state,
            log: Vec::new(),
            next_input_seq: 0,
            pending: None,
            outcome: None,
        })
    }
}

/// Rejects packs whose decks point at missing definitions, and tile cards a
/// run could never place.
fn validate_content(content: &ContentPack) -> Result<(), GameError> {
    let bad = |key: &str| GameError::ContentInvalid { key: key.to_owned() };
    for key in &content.tile_deck {
        let def = content.tile(key).ok_or_else(|| bad(key))?;
        if !def.edges.iter().any(|e| *e == EdgeKind::Open) {
            return Err(bad(key));
        }
    }
    for key in &content.monster_deck {
        if content.monster(key).is_none() {
            return Err(bad(key));
        }
    }
    for key in &content.encounter_deck {
        if content.encounter(key).is_none() {
            return Err(bad(key));
        }
    }
    for key in &content.treasure_deck {
        if content.treasure(key).is_none() {
            return Err(bad(key));
        }
    }
    Ok(())
}
