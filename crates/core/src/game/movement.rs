//! Hero movement: speed-bounded reachability and the move command.
//! This module exists so walkability queries and the move action share one BFS.
//! It does not own tile discovery, which the hero phase triggers on its own.

use std::collections::{BTreeSet, VecDeque};

use super::*;

impl Game {
    /// Squares the given hero may legally end a move on right now.
    ///
    /// Empty when the hero is unknown, off the board, or unable to move.
    /// Squares under other heroes are transit-only and never returned.
    pub fn valid_moves(&self, hero: HeroId) -> Vec<Pos> {
        let Some(h) = self.state.hero(hero) else {
            return Vec::new();
        };
        if h.removed_from_play || !self.can_move(hero) {
            return Vec::new();
        }
        let origin = h.pos;
        let mut out: Vec<Pos> = self
            .reachable_squares(origin, self.effective_speed(hero))
            .into_iter()
            .filter(|&pos| pos != origin && self.state.hero_at(pos).is_none())
            .collect();
        out.sort();
        out
    }

    pub(super) fn move_hero(&mut self, hero: HeroId, to: Pos) -> Result<(), GameError> {
        self.ensure_running()?;
        self.ensure_phase(Phase::Hero)?;
        self.ensure_no_pending()?;
        self.ensure_active_hero(hero)?;
        let h = self.state.active_hero();
        if h.moved {
            return Err(GameError::ActionAlreadySpent);
        }
        if h.has_status(StatusType::Dazed) && h.attacked {
            return Err(GameError::OneActionWhileDazed);
        }
        if !self.can_move(hero) {
            return Err(GameError::CannotMove);
        }
        if !self.valid_moves(hero).contains(&to) {
            return Err(GameError::DestinationUnreachable { to });
        }

        let from = self.state.active_hero().pos;
        let from_tile = self.state.tile_at(from).map(|t| t.id);
        let to_tile = self.state.tile_at(to).map(|t| t.id);
        {
            let h = self.state.active_hero_mut();
            h.pos = to;
            h.moved = true;
        }
        if from_tile != to_tile
            && self.state.active_hero().has_status(StatusType::CurseDragonFear)
        {
            self.log.push(LogEvent::CurseHurt {
                hero: self.hero_name(hero),
                status: StatusType::CurseDragonFear,
            });
            self.damage_hero(hero, 1, "Dragon Fear");
        }
        Ok(())
    }

    /// Breadth-first flood out to `speed` steps. Occupancy is ignored here;
    /// callers filter destinations.
    fn reachable_squares(&self, from: Pos, speed: i32) -> BTreeSet<Pos> {
        let mut visited = BTreeSet::new();
        visited.insert(from);
        if speed <= 0 {
            return visited;
        }
        let mut queue = VecDeque::new();
        queue.push_back((from, 0));
        while let Some((pos, depth)) = queue.pop_front() {
            if depth == speed {
                continue;
            }
            for next in self.state.step_neighbors(pos) {
                if visited.insert(next) {
                    queue.push_back((next, depth + 1));
                }
            }
        }
        visited
    }
}
