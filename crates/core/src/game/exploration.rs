//! Tile placement off unexplored edges.
//! This module exists to keep the frontier bookkeeping in one place.
//! It does not decide when exploration happens; phases.rs and monsters.rs call in.

use super::*;
use crate::content::TileDef;
use crate::state::{EdgeMap, GridPos, PlacedTile};

/// What a single exploration step produced.
pub(super) enum ExploreResult {
    Placed { tile: TileId, name: String, color: TileColor },
    PassageOpened,
    DeckEmpty,
}

impl Game {
    /// Index into the unexplored list of the first entry whose strip covers
    /// `pos`, if any.
    pub(super) fn unexplored_entry_at(&self, pos: Pos) -> Option<usize> {
        let tile = self.state.tile_at(pos)?;
        let local = tile.local(pos);
        self.state
            .unexplored_edges
            .iter()
            .position(|e| e.tile == tile.id && tile.on_edge_strip(e.direction, e.segment, local))
    }

    /// Resolves one unexplored entry: either the frontier meets an already
    /// placed tile and a passage opens, or a tile comes off the deck and a
    /// monster spawns on it.
    pub(super) fn explore_edge(
        &mut self,
        index: usize,
        controller: HeroId,
    ) -> Result<ExploreResult, GameError> {
        let entry = self.state.unexplored_edges[index];
        let source = self
            .state
            .tile(entry.tile)
            .ok_or(GameError::TileMissing { tile: entry.tile })?;
        let target = target_cell(source, entry.direction, entry.segment);

        if let Some(other) = self.state.tiles.iter().find(|t| covers_cell(t, target)) {
            let other_id = other.id;
            return Ok(self.open_passage(index, entry, other_id, target));
        }

        let Some(key) = self.state.tile_deck.draw(&mut self.rng) else {
            return Ok(ExploreResult::DeckEmpty);
        };
        let def = self
            .content
            .tile(&key)
            .ok_or_else(|| GameError::UnknownContent { key: key.clone() })?;
        let back = entry.direction.opposite();
        let rotation = fit_rotation(def, back);
        let name = def.name.to_owned();
        let color = def.color;
        let id = TileId(self.state.tiles.len() as u16);

        // The connecting edge opens; every other open edge of the new tile
        // becomes frontier.
        let mut edges = EdgeMap::all(EdgeState::Wall);
        edges.set(back, EdgeState::Open);
        let mut frontier = Vec::new();
        for dir in Direction::ALL {
            if dir == back {
                continue;
            }
            if placed_edge(def, dir, rotation) == EdgeKind::Open {
                edges.set(dir, EdgeState::Unexplored);
                frontier.push(UnexploredEdge {
                    tile: id,
                    direction: dir,
                    segment: EdgeSegment::Whole,
                });
            }
        }

        self.state.unexplored_edges.remove(index);
        if let Some(tile) = self.state.tile_mut(entry.tile) {
            tile.edges.set(entry.direction, EdgeState::Open);
        }
        self.state.tiles.push(PlacedTile { id, key, color, grid: target, rotation, edges });
        self.state.unexplored_edges.extend(frontier);
        self.log.push(LogEvent::TilePlaced { tile: name.clone(), id });

        if let Some(monster_key) = self.state.monster_deck.draw(&mut self.rng) {
            self.spawn_monster_on_tile(&monster_key, id, controller);
        }
        Ok(ExploreResult::Placed { tile: id, name, color })
    }

    /// Walks the active hero's exploration chain, one entry at a time, until
    /// the hero stands on no frontier square or the tile deck runs dry.
    pub(super) fn resolve_hero_exploration(&mut self) -> Result<(), GameError> {
        loop {
            let hero = self.state.turn.active_hero;
            let Some(pos) = self.state.hero(hero).map(|h| h.pos) else {
                return Ok(());
            };
            let Some(index) = self.unexplored_entry_at(pos) else {
                return Ok(());
            };
            match self.explore_edge(index, hero)? {
                ExploreResult::DeckEmpty => return Ok(()),
                ExploreResult::PassageOpened => {}
                ExploreResult::Placed { color, .. } => {
                    if color == TileColor::Black {
                        self.state.turn.drew_only_white = false;
                    } else if !self.state.turn.explored_this_turn {
                        self.state.turn.drew_only_white = true;
                    }
                    self.state.turn.explored_this_turn = true;
                }
            }
        }
    }

    /// The frontier ran into a tile already on the board. Both facing edges
    /// open and the reciprocal entry on the other tile is retired.
    fn open_passage(
        &mut self,
        index: usize,
        entry: UnexploredEdge,
        other_id: TileId,
        cell: GridPos,
    ) -> ExploreResult {
        self.state.unexplored_edges.remove(index);
        let back = entry.direction.opposite();
        if let Some(tile) = self.state.tile_mut(entry.tile) {
            tile.edges.set(entry.direction, EdgeState::Open);
        }
        let mut other_segment = EdgeSegment::Whole;
        if let Some(other) = self.state.tile_mut(other_id) {
            if other.is_start() && matches!(back, Direction::East | Direction::West) {
                other_segment = if cell.row == other.grid.row {
                    EdgeSegment::NorthHalf
                } else {
                    EdgeSegment::SouthHalf
                };
            }
            other.edges.set(back, EdgeState::Open);
        }
        self.state.unexplored_edges.retain(|e| {
            !(e.tile == other_id && e.direction == back && e.segment == other_segment)
        });
        self.log.push(LogEvent::PassageOpened { from: entry.tile, to: other_id });
        ExploreResult::PassageOpened
    }
}

// ---------------------------------------------------------------------------
// Placement geometry
// ---------------------------------------------------------------------------

/// Grid cell a frontier entry points into. The start tile's south edge sits
/// below its second cell, and its half-height side entries pick the matching
/// row.
fn target_cell(source: &PlacedTile, dir: Direction, segment: EdgeSegment) -> GridPos {
    let base = source.grid;
    match dir {
        Direction::North => GridPos { col: base.col, row: base.row - 1 },
        Direction::South => {
            let below = if source.is_start() { 2 } else { 1 };
            GridPos { col: base.col, row: base.row + below }
        }
        Direction::East | Direction::West => {
            let col = if dir == Direction::East { base.col + 1 } else { base.col - 1 };
            let row = if segment == EdgeSegment::SouthHalf { base.row + 1 } else { base.row };
            GridPos { col, row }
        }
    }
}

fn covers_cell(tile: &PlacedTile, cell: GridPos) -> bool {
    if tile.grid == cell {
        return true;
    }
    tile.is_start() && cell.col == tile.grid.col && cell.row == tile.grid.row + 1
}

fn ccw(dir: Direction) -> Direction {
    match dir {
        Direction::North => Direction::West,
        Direction::West => Direction::South,
        Direction::South => Direction::East,
        Direction::East => Direction::North,
    }
}

/// Edge shown at `dir` once the default-orientation definition is rotated
/// clockwise by `rotation`.
fn placed_edge(def: &TileDef, dir: Direction, rotation: Rotation) -> EdgeKind {
    let mut probe = dir;
    for _ in 0..rotation.quarter_turns() {
        probe = ccw(probe);
    }
    def.edge(probe)
}

/// First rotation that turns an open definition edge toward the doorway.
/// Validation guarantees every tile in the deck has one.
fn fit_rotation(def: &TileDef, back: Direction) -> Rotation {
    Rotation::ALL
        .into_iter()
        .find(|r| placed_edge(def, back, *r) == EdgeKind::Open)
        .unwrap_or(Rotation::R0)
}
