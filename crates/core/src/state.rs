//! Serializable run state: board, party, decks, and the turn clock.
//! This module exists to hold the data the engine mutates plus the pure
//! geometry and deck queries over it. It does not make rules decisions.

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::content::{keys, TrapBehavior};
use crate::dice::DiceRng;
use crate::types::{
    Direction, EdgeSegment, EdgeState, HeroId, MonsterId, Phase, Pos, Rotation, StatusEffect,
    StatusType, TileColor, TileId, UnexploredEdge,
};

pub const TILE_SIZE: i32 = 4;

/// Staircase squares in start-tile local coordinates. Never walkable.
pub const START_STAIRCASE: [Pos; 4] = [
    Pos { y: 3, x: 1 },
    Pos { y: 3, x: 2 },
    Pos { y: 4, x: 1 },
    Pos { y: 4, x: 2 },
];

/// The eight legal setup squares around the staircase.
pub const START_SETUP_SQUARES: [Pos; 8] = [
    Pos { y: 2, x: 1 },
    Pos { y: 2, x: 2 },
    Pos { y: 2, x: 3 },
    Pos { y: 3, x: 3 },
    Pos { y: 4, x: 3 },
    Pos { y: 5, x: 1 },
    Pos { y: 5, x: 2 },
    Pos { y: 5, x: 3 },
];

/// Tile-grid cell. One cell per 4x4 tile; the start tile covers two rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub col: i32,
    pub row: i32,
}

pub fn grid_cell(pos: Pos) -> GridPos {
    GridPos { col: pos.x.div_euclid(TILE_SIZE), row: pos.y.div_euclid(TILE_SIZE) }
}

/// Canonical tile distance: Manhattan over grid cells. The start tile's two
/// halves count as distinct cells.
pub fn tile_distance(a: Pos, b: Pos) -> i32 {
    let ca = grid_cell(a);
    let cb = grid_cell(b);
    (ca.col - cb.col).abs() + (ca.row - cb.row).abs()
}

// ---------------------------------------------------------------------------
// Tiles
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeMap {
    pub north: EdgeState,
    pub east: EdgeState,
    pub south: EdgeState,
    pub west: EdgeState,
}

impl EdgeMap {
    pub fn all(state: EdgeState) -> Self {
        Self { north: state, east: state, south: state, west: state }
    }

    pub fn get(&self, dir: Direction) -> EdgeState {
        match dir {
            Direction::North => self.north,
            Direction::East => self.east,
            Direction::South => self.south,
            Direction::West => self.west,
        }
    }

    pub fn set(&mut self, dir: Direction, state: EdgeState) {
        match dir {
            Direction::North => self.north = state,
            Direction::East => self.east = state,
            Direction::South => self.south = state,
            Direction::West => self.west = state,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedTile {
    pub id: TileId,
    pub key: String,
    pub color: TileColor,
    pub grid: GridPos,
    pub rotation: Rotation,
    pub edges: EdgeMap,
}

impl PlacedTile {
    pub fn is_start(&self) -> bool {
        self.key == keys::TILE_START
    }

    /// Inclusive square bounds. Normal tiles are 4x4; the start tile also
    /// covers the grid row below its own.
    pub fn bounds(&self) -> (Pos, Pos) {
        let min = Pos { y: self.grid.row * TILE_SIZE, x: self.grid.col * TILE_SIZE };
        let height = if self.is_start() { 2 * TILE_SIZE } else { TILE_SIZE };
        let max = Pos { y: min.y + height - 1, x: min.x + TILE_SIZE - 1 };
        (min, max)
    }

    pub fn contains(&self, pos: Pos) -> bool {
        let (min, max) = self.bounds();
        pos.x >= min.x && pos.x <= max.x && pos.y >= min.y && pos.y <= max.y
    }

    pub fn local(&self, pos: Pos) -> Pos {
        let (min, _) = self.bounds();
        Pos { y: pos.y - min.y, x: pos.x - min.x }
    }

    pub fn global(&self, local: Pos) -> Pos {
        let (min, _) = self.bounds();
        Pos { y: min.y + local.y, x: min.x + local.x }
    }

    /// Which unexplored-list segment covers stepping off `local` through
    /// `dir`. Only the start tile's long edges split into halves.
    pub fn segment_for(&self, dir: Direction, local: Pos) -> EdgeSegment {
        if self.is_start() && matches!(dir, Direction::East | Direction::West) {
            if local.y < TILE_SIZE { EdgeSegment::NorthHalf } else { EdgeSegment::SouthHalf }
        } else {
            EdgeSegment::Whole
        }
    }

    /// Whether `local` sits on the boundary strip for `dir`, inside the
    /// half-edge `segment` where one applies.
    pub fn on_edge_strip(&self, dir: Direction, segment: EdgeSegment, local: Pos) -> bool {
        let height = if self.is_start() { 2 * TILE_SIZE } else { TILE_SIZE };
        let on_strip = match dir {
            Direction::North => local.y == 0,
            Direction::South => local.y == height - 1,
            Direction::East => local.x == TILE_SIZE - 1,
            Direction::West => local.x == 0,
        };
        let in_segment = match segment {
            EdgeSegment::Whole => true,
            EdgeSegment::NorthHalf => local.y < TILE_SIZE,
            EdgeSegment::SouthHalf => local.y >= TILE_SIZE,
        };
        on_strip && in_segment
    }

    /// Squares along a walled edge are part of the wall art and unwalkable.
    /// The start tile handles walls through its own bounds instead.
    pub fn on_wall_strip(&self, pos: Pos) -> bool {
        if self.is_start() {
            return false;
        }
        let local = self.local(pos);
        let last = TILE_SIZE - 1;
        (self.edges.north == EdgeState::Wall && local.y == 0)
            || (self.edges.south == EdgeState::Wall && local.y == last)
            || (self.edges.west == EdgeState::Wall && local.x == 0)
            || (self.edges.east == EdgeState::Wall && local.x == last)
    }
}

// ---------------------------------------------------------------------------
// Actors and markers
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemState {
    pub key: String,
    /// Set once a use-activated item is spent.
    pub flipped: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Hero {
    pub id: HeroId,
    pub key: String,
    pub level: u8,
    pub hp: i32,
    pub pos: Pos,
    pub moved: bool,
    pub attacked: bool,
    pub statuses: Vec<StatusEffect>,
    pub inventory: Vec<ItemState>,
    pub removed_from_play: bool,
}

impl Hero {
    pub fn has_status(&self, kind: StatusType) -> bool {
        self.statuses.iter().any(|s| s.kind == kind)
    }

    pub fn status_count(&self, kind: StatusType) -> usize {
        self.statuses.iter().filter(|s| s.kind == kind).count()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Monster {
    pub id: MonsterId,
    /// Unique per spawn, e.g. `kobold-3`.
    pub instance: String,
    pub key: String,
    pub tile: TileId,
    pub pos: Pos,
    pub hp: i32,
    pub controller: HeroId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrapMarker {
    pub id: u32,
    pub key: String,
    pub behavior: TrapBehavior,
    pub dc: i32,
    pub pos: Pos,
}

// ---------------------------------------------------------------------------
// Decks
// ---------------------------------------------------------------------------

/// Face-down draw pile plus a discard pile. Index 0 is the top.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    pub draw: Vec<String>,
    pub discard: Vec<String>,
}

impl Deck {
    pub fn new(cards: &[&str]) -> Self {
        Self { draw: cards.iter().map(|c| (*c).to_owned()).collect(), discard: Vec::new() }
    }

    pub fn shuffle(&mut self, rng: &mut DiceRng) {
        rng.shuffle(&mut self.draw);
    }

    /// Draws the top card, reshuffling the discard pile in first if the draw
    /// pile ran dry. `None` only when both piles are empty.
    pub fn draw(&mut self, rng: &mut DiceRng) -> Option<String> {
        if self.draw.is_empty() && !self.discard.is_empty() {
            self.draw.append(&mut self.discard);
            self.shuffle(rng);
        }
        if self.draw.is_empty() {
            return None;
        }
        Some(self.draw.remove(0))
    }

    /// Bottom draw never reshuffles; an empty pile yields nothing.
    pub fn draw_from_bottom(&mut self) -> Option<String> {
        self.draw.pop()
    }

    pub fn move_bottom_to_top(&mut self) {
        if self.draw.len() > 1 {
            let bottom = self.draw.pop();
            if let Some(card) = bottom {
                self.draw.insert(0, card);
            }
        }
    }

    pub fn put_discard(&mut self, card: String) {
        self.discard.push(card);
    }

    pub fn is_exhausted(&self) -> bool {
        self.draw.is_empty() && self.discard.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Aggregate state
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyResources {
    pub xp: i32,
    pub healing_surges: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioState {
    pub monsters_defeated: u32,
    pub monsters_to_defeat: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnState {
    pub phase: Phase,
    pub active_hero: HeroId,
    pub turn_number: u32,
    pub explored_this_turn: bool,
    pub drew_only_white: bool,
    pub treasure_drawn_this_turn: bool,
    pub activation_index: usize,
    pub traps_processed: bool,
    pub bad_luck_pending: bool,
}

impl TurnState {
    pub fn first_turn(active_hero: HeroId) -> Self {
        Self {
            phase: Phase::Hero,
            active_hero,
            turn_number: 1,
            explored_this_turn: false,
            drew_only_white: false,
            treasure_drawn_this_turn: false,
            activation_index: 0,
            traps_processed: false,
            bad_luck_pending: false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameState {
    pub tiles: Vec<PlacedTile>,
    pub unexplored_edges: Vec<UnexploredEdge>,
    pub heroes: Vec<Hero>,
    pub monsters: SlotMap<MonsterId, Monster>,
    /// Spawn-ordered monster ids; the canonical iteration order.
    pub roster: Vec<MonsterId>,
    pub traps: Vec<TrapMarker>,
    pub tile_deck: Deck,
    pub monster_deck: Deck,
    pub encounter_deck: Deck,
    pub treasure_deck: Deck,
    pub active_environment: Option<String>,
    pub party: PartyResources,
    pub scenario: ScenarioState,
    pub turn: TurnState,
    pub next_trap_id: u32,
    pub next_monster_number: u32,
}

impl GameState {
    pub fn tile(&self, id: TileId) -> Option<&PlacedTile> {
        self.tiles.iter().find(|t| t.id == id)
    }

    pub fn tile_mut(&mut self, id: TileId) -> Option<&mut PlacedTile> {
        self.tiles.iter_mut().find(|t| t.id == id)
    }

    pub fn tile_at(&self, pos: Pos) -> Option<&PlacedTile> {
        self.tiles.iter().find(|t| t.contains(pos))
    }

    pub fn hero(&self, id: HeroId) -> Option<&Hero> {
        self.heroes.get(id.0 as usize)
    }

    pub fn hero_mut(&mut self, id: HeroId) -> Option<&mut Hero> {
        self.heroes.get_mut(id.0 as usize)
    }

    pub fn active_hero(&self) -> &Hero {
        &self.heroes[self.turn.active_hero.0 as usize]
    }

    pub fn active_hero_mut(&mut self) -> &mut Hero {
        &mut self.heroes[self.turn.active_hero.0 as usize]
    }

    pub fn heroes_in_play(&self) -> impl Iterator<Item = &Hero> {
        self.heroes.iter().filter(|h| !h.removed_from_play)
    }

    pub fn hero_at(&self, pos: Pos) -> Option<HeroId> {
        self.heroes_in_play().find(|h| h.pos == pos).map(|h| h.id)
    }

    pub fn monster_at(&self, pos: Pos) -> Option<MonsterId> {
        self.roster.iter().copied().find(|&id| self.monsters[id].pos == pos)
    }

    pub fn controlled_monsters(&self, hero: HeroId) -> Vec<MonsterId> {
        self.roster
            .iter()
            .copied()
            .filter(|&id| self.monsters[id].controller == hero)
            .collect()
    }

    pub fn heroes_on_tile(&self, tile: TileId) -> Vec<HeroId> {
        self.heroes_in_play()
            .filter(|h| self.tile_at(h.pos).is_some_and(|t| t.id == tile))
            .map(|h| h.id)
            .collect()
    }

    pub fn trap(&self, id: u32) -> Option<&TrapMarker> {
        self.traps.iter().find(|t| t.id == id)
    }

    pub fn trap_at(&self, pos: Pos) -> Option<&TrapMarker> {
        self.traps.iter().find(|t| t.pos == pos)
    }

    // -- board geometry ----------------------------------------------------

    pub fn is_walkable(&self, pos: Pos) -> bool {
        let Some(tile) = self.tile_at(pos) else {
            return false;
        };
        if tile.is_start() {
            let local = tile.local(pos);
            local.x >= 1 && !START_STAIRCASE.contains(&local)
        } else {
            !tile.on_wall_strip(pos)
        }
    }

    /// Whether the edge in `dir` is open for a step off the square at `pos`.
    /// Resolves start-tile half edges where one half may be open while the
    /// other still awaits exploration.
    pub fn edge_open(&self, tile: &PlacedTile, pos: Pos, dir: Direction) -> bool {
        match tile.edges.get(dir) {
            EdgeState::Open => true,
            EdgeState::Wall => false,
            EdgeState::Unexplored => {
                let segment = tile.segment_for(dir, tile.local(pos));
                !self.unexplored_edges.iter().any(|e| {
                    e.tile == tile.id
                        && e.direction == dir
                        && (e.segment == EdgeSegment::Whole || e.segment == segment)
                })
            }
        }
    }

    /// Step legality ignoring occupancy: Chebyshev within a tile, orthogonal
    /// through mutually open edges between tiles.
    pub fn can_step(&self, from: Pos, to: Pos) -> bool {
        if !self.is_walkable(from) || !self.is_walkable(to) {
            return false;
        }
        let Some(src) = self.tile_at(from) else {
            return false;
        };
        let Some(dst) = self.tile_at(to) else {
            return false;
        };
        if src.id == dst.id {
            return from.adjacent(to);
        }
        let Some(dir) = step_direction(from, to) else {
            return false;
        };
        self.edge_open(src, from, dir) && self.edge_open(dst, to, dir.opposite())
    }

    /// Walkable squares reachable in one step, for movement search.
    pub fn step_neighbors(&self, pos: Pos) -> Vec<Pos> {
        let mut out = Vec::new();
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dy == 0 && dx == 0 {
                    continue;
                }
                let next = Pos { y: pos.y + dy, x: pos.x + dx };
                if self.can_step(pos, next) {
                    out.push(next);
                }
            }
        }
        out
    }
}

/// Direction of a single orthogonal step, if it is one.
fn step_direction(from: Pos, to: Pos) -> Option<Direction> {
    match (to.x - from.x, to.y - from.y) {
        (0, -1) => Some(Direction::North),
        (1, 0) => Some(Direction::East),
        (0, 1) => Some(Direction::South),
        (-1, 0) => Some(Direction::West),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start_tile() -> PlacedTile {
        PlacedTile {
            id: TileId(0),
            key: keys::TILE_START.to_owned(),
            color: TileColor::Black,
            grid: GridPos { col: 0, row: 0 },
            rotation: Rotation::R0,
            edges: EdgeMap::all(EdgeState::Unexplored),
        }
    }

    fn plain_tile(id: u16, col: i32, row: i32, edges: EdgeMap) -> PlacedTile {
        PlacedTile {
            id: TileId(id),
            key: keys::TILE_BLACK_CROSSING.to_owned(),
            color: TileColor::Black,
            grid: GridPos { col, row },
            rotation: Rotation::R0,
            edges,
        }
    }

    fn board(tiles: Vec<PlacedTile>, unexplored_edges: Vec<UnexploredEdge>) -> GameState {
        GameState {
            tiles,
            unexplored_edges,
            heroes: Vec::new(),
            monsters: SlotMap::with_key(),
            roster: Vec::new(),
            traps: Vec::new(),
            tile_deck: Deck::default(),
            monster_deck: Deck::default(),
            encounter_deck: Deck::default(),
            treasure_deck: Deck::default(),
            active_environment: None,
            party: PartyResources { xp: 0, healing_surges: 2 },
            scenario: ScenarioState { monsters_defeated: 0, monsters_to_defeat: 2 },
            turn: TurnState::first_turn(HeroId(0)),
            next_trap_id: 0,
            next_monster_number: 1,
        }
    }

    #[test]
    fn deck_draw_order_and_reshuffle() {
        let mut rng = DiceRng::seed_from_u64(7);
        let mut deck = Deck::new(&["a", "b"]);
        assert_eq!(deck.draw(&mut rng).as_deref(), Some("a"));
        assert_eq!(deck.draw(&mut rng).as_deref(), Some("b"));
        assert_eq!(deck.draw(&mut rng), None);

        deck.put_discard("a".to_owned());
        deck.put_discard("b".to_owned());
        let first = deck.draw(&mut rng).expect("reshuffled draw");
        let second = deck.draw(&mut rng).expect("second draw");
        let mut got = [first, second];
        got.sort();
        assert_eq!(got, ["a".to_owned(), "b".to_owned()]);
        assert!(deck.is_exhausted());
    }

    #[test]
    fn deck_bottom_operations() {
        let mut deck = Deck::new(&["a", "b", "c"]);
        assert_eq!(deck.draw_from_bottom().as_deref(), Some("c"));
        deck.move_bottom_to_top();
        assert_eq!(deck.draw, vec!["b".to_owned(), "a".to_owned()]);
    }

    #[test]
    fn start_tile_walkability() {
        let state = board(vec![start_tile()], Vec::new());
        assert!(state.is_walkable(Pos { y: 2, x: 1 }));
        assert!(state.is_walkable(Pos { y: 7, x: 3 }));
        assert!(!state.is_walkable(Pos { y: 3, x: 1 }), "staircase is blocked");
        assert!(!state.is_walkable(Pos { y: 2, x: 0 }), "west wall column is blocked");
        assert!(!state.is_walkable(Pos { y: 8, x: 2 }), "off the tile");
    }

    #[test]
    fn wall_strips_are_not_walkable() {
        let edges = EdgeMap {
            north: EdgeState::Wall,
            east: EdgeState::Wall,
            south: EdgeState::Open,
            west: EdgeState::Open,
        };
        let state = board(vec![start_tile(), plain_tile(1, 1, 0, edges)], Vec::new());
        assert!(!state.is_walkable(Pos { y: 0, x: 5 }), "north strip");
        assert!(!state.is_walkable(Pos { y: 2, x: 7 }), "east strip");
        assert!(state.is_walkable(Pos { y: 1, x: 5 }));
        assert!(state.is_walkable(Pos { y: 3, x: 4 }));
    }

    #[test]
    fn tile_distance_counts_start_halves() {
        assert_eq!(tile_distance(Pos { y: 2, x: 2 }, Pos { y: 2, x: 3 }), 0);
        assert_eq!(tile_distance(Pos { y: 2, x: 2 }, Pos { y: 6, x: 2 }), 1);
        assert_eq!(tile_distance(Pos { y: 6, x: 2 }, Pos { y: 1, x: 5 }), 2);
        assert_eq!(tile_distance(Pos { y: -1, x: 2 }, Pos { y: 2, x: 2 }), 1);
    }

    #[test]
    fn cross_tile_steps_are_orthogonal_through_open_edges() {
        let mut start = start_tile();
        start.edges.east = EdgeState::Open;
        let east = plain_tile(
            1,
            1,
            0,
            EdgeMap {
                north: EdgeState::Unexplored,
                east: EdgeState::Unexplored,
                south: EdgeState::Unexplored,
                west: EdgeState::Open,
            },
        );
        let state = board(vec![start, east], Vec::new());
        assert!(state.can_step(Pos { y: 2, x: 3 }, Pos { y: 2, x: 4 }));
        assert!(!state.can_step(Pos { y: 2, x: 3 }, Pos { y: 1, x: 4 }), "no diagonal crossing");
        assert!(state.can_step(Pos { y: 2, x: 2 }, Pos { y: 1, x: 3 }), "diagonal within a tile");
    }

    #[test]
    fn half_open_start_edge_resolves_per_segment() {
        let open_west = EdgeMap {
            north: EdgeState::Unexplored,
            east: EdgeState::Unexplored,
            south: EdgeState::Unexplored,
            west: EdgeState::Open,
        };
        // South-half entry remains, so the edge map still reads Unexplored,
        // but the explored north half must already admit crossings.
        let state = board(
            vec![start_tile(), plain_tile(1, 1, 0, open_west), plain_tile(2, 1, 1, open_west)],
            vec![UnexploredEdge {
                tile: TileId(0),
                direction: Direction::East,
                segment: EdgeSegment::SouthHalf,
            }],
        );
        assert!(state.can_step(Pos { y: 2, x: 3 }, Pos { y: 2, x: 4 }));
        assert!(!state.can_step(Pos { y: 5, x: 3 }, Pos { y: 5, x: 4 }), "south half still closed");
    }
}
