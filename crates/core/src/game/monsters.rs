//! Monster spawns and villain-phase activations.
//! This module exists so the whole monster turn reads as one pipeline.
//! It does not apply hero damage itself; combat.rs owns that sink.

use super::*;
use crate::content::{AttackLine, Tactic};
use crate::game::exploration::ExploreResult;
use crate::state::{tile_distance, Monster};

// Scorch-mark fallback ring, probed in this order when the mark is taken.
const SPAWN_SCAN: [(i32, i32); 8] =
    [(-1, 0), (1, 0), (0, 1), (0, -1), (-1, 1), (-1, -1), (1, 1), (1, -1)];

impl Game {
    /// Puts a freshly drawn monster on its tile's scorch-mark square, or the
    /// first free square of the ring around it. A fully packed tile drops
    /// the spawn.
    pub(super) fn spawn_monster_on_tile(
        &mut self,
        key: &str,
        tile: TileId,
        controller: HeroId,
    ) -> Option<MonsterId> {
        let hp = self.content.monster(key).map(|d| d.hp)?;
        let placed = self.state.tile(tile)?;
        let scorch = placed.global(scorch_square(placed.rotation));
        let (min, max) = placed.bounds();

        let mut pos = None;
        if self.state.monster_at(scorch).is_none() {
            pos = Some(scorch);
        } else {
            for (dy, dx) in SPAWN_SCAN {
                let next = scorch.offset(dy, dx);
                let inside =
                    next.x >= min.x && next.x <= max.x && next.y >= min.y && next.y <= max.y;
                if inside && self.state.monster_at(next).is_none() {
                    pos = Some(next);
                    break;
                }
            }
        }
        let pos = pos?;

        let number = self.state.next_monster_number;
        self.state.next_monster_number += 1;
        let instance = format!("{key}-{number}");
        let monster = Monster {
            id: MonsterId::default(),
            instance: instance.clone(),
            key: key.to_owned(),
            tile,
            pos,
            hp,
            controller,
        };
        let id = self.state.monsters.insert(monster);
        self.state.monsters[id].id = id;
        self.state.roster.push(id);
        self.log.push(LogEvent::MonsterSpawned { monster: instance });
        Some(id)
    }

    /// Runs one activation for the next monster controlled by the active
    /// hero. The index always advances, so a refused dismissal never replays
    /// the same monster.
    pub(super) fn activate_next_monster(&mut self) -> Result<(), GameError> {
        self.ensure_running()?;
        self.ensure_phase(Phase::Villain)?;
        self.ensure_no_pending()?;
        let controlled = self.state.controlled_monsters(self.state.turn.active_hero);
        let index = self.state.turn.activation_index;
        if index >= controlled.len() {
            return Err(GameError::ActivationsExhausted);
        }
        self.state.turn.activation_index += 1;
        let report = self.run_activation(controlled[index]);
        self.pending = Some(PendingInteraction::MonsterActed(report));
        Ok(())
    }

    pub(super) fn dismiss_monster_report(&mut self) -> Result<(), GameError> {
        self.ensure_running()?;
        match self.pending.take() {
            Some(PendingInteraction::MonsterActed(_)) => Ok(()),
            Some(other) => {
                self.pending = Some(other);
                Err(GameError::InteractionMismatch)
            }
            None => Err(GameError::NoInteraction),
        }
    }

    fn run_activation(&mut self, id: MonsterId) -> MonsterReport {
        let (instance, key, pos) = {
            let m = &self.state.monsters[id];
            (m.instance.clone(), m.key.clone(), m.pos)
        };
        let idle = MonsterReport {
            monster: instance.clone(),
            moved_to: None,
            attack: None,
            explored: None,
        };
        let Some(tactic) = self.content.monster(&key).map(|d| d.tactic) else {
            return idle;
        };
        let Some(target) = self.nearest_hero_target(pos) else {
            return idle;
        };

        let mut moved_to = None;
        let mut explored = None;
        let mut attack = None;
        match tactic {
            Tactic::AttackOnly { melee } => {
                if self.adjacent_to_hero(id, target) {
                    attack = Some(self.monster_attack(id, target, &melee));
                } else {
                    moved_to = self.monster_step(id, target);
                    explored = self.monster_explore(id);
                }
            }
            Tactic::MoveAndAttack { melee } => {
                moved_to = self.monster_step(id, target);
                explored = self.monster_explore(id);
                if explored.is_none() && self.adjacent_to_hero(id, target) {
                    attack = Some(self.monster_attack(id, target, &melee));
                }
            }
            Tactic::RangedAttack { melee, ranged, range } => {
                if self.adjacent_to_hero(id, target) {
                    attack = Some(self.monster_attack(id, target, &melee));
                } else {
                    moved_to = self.monster_step(id, target);
                    explored = self.monster_explore(id);
                    if explored.is_none() && self.within_range(id, target, range) {
                        attack = Some(self.monster_attack(id, target, &ranged));
                    }
                }
            }
        }
        MonsterReport { monster: instance, moved_to, attack, explored }
    }

    /// Nearest hero by tile distance, then Manhattan, then party order.
    /// Downed and removed heroes are not targets.
    fn nearest_hero_target(&self, from: Pos) -> Option<HeroId> {
        self.state
            .heroes
            .iter()
            .filter(|h| !h.removed_from_play && h.hp > 0)
            .min_by_key(|h| (tile_distance(from, h.pos), from.manhattan(h.pos)))
            .map(|h| h.id)
    }

    fn adjacent_to_hero(&self, id: MonsterId, hero: HeroId) -> bool {
        let m = &self.state.monsters[id];
        self.state.hero(hero).is_some_and(|h| m.pos.adjacent(h.pos))
    }

    fn within_range(&self, id: MonsterId, hero: HeroId, range: i32) -> bool {
        let m = &self.state.monsters[id];
        self.state.hero(hero).is_some_and(|h| {
            let dx = (m.pos.x - h.pos.x).abs();
            let dy = (m.pos.y - h.pos.y).abs();
            dx.max(dy) <= range
        })
    }

    /// One orthogonal step onto a free square that shrinks the Manhattan
    /// distance to the target, first direction wins. Stays put otherwise.
    fn monster_step(&mut self, id: MonsterId, target: HeroId) -> Option<Pos> {
        let from = self.state.monsters[id].pos;
        let goal = self.state.hero(target)?.pos;
        let mut best: Option<(i32, Pos)> = None;
        for dir in Direction::ALL {
            let next = from.step(dir);
            if !self.state.can_step(from, next) {
                continue;
            }
            if self.state.hero_at(next).is_some() || self.state.monster_at(next).is_some() {
                continue;
            }
            let d = next.manhattan(goal);
            if best.map_or(true, |(b, _)| d < b) {
                best = Some((d, next));
            }
        }
        let (d, next) = best?;
        if d >= from.manhattan(goal) {
            return None;
        }
        let tile = self.state.tile_at(next).map(|t| t.id);
        let m = &mut self.state.monsters[id];
        m.pos = next;
        if let Some(t) = tile {
            m.tile = t;
        }
        let instance = self.state.monsters[id].instance.clone();
        self.log.push(LogEvent::MonsterMoved { monster: instance, to: next });
        Some(next)
    }

    /// After a step onto an unexplored edge square of a tile holding no
    /// heroes, the placement algorithm runs once under this monster's
    /// controller.
    fn monster_explore(&mut self, id: MonsterId) -> Option<String> {
        let (pos, controller, instance) = {
            let m = &self.state.monsters[id];
            (m.pos, m.controller, m.instance.clone())
        };
        let tile_id = self.state.tile_at(pos)?.id;
        if !self.state.heroes_on_tile(tile_id).is_empty() {
            return None;
        }
        let index = self.unexplored_entry_at(pos)?;
        match self.explore_edge(index, controller) {
            Ok(ExploreResult::Placed { name, .. }) => {
                self.log.push(LogEvent::MonsterExplored {
                    monster: instance,
                    tile: name.clone(),
                });
                Some(name)
            }
            _ => None,
        }
    }

    fn monster_attack(
        &mut self,
        id: MonsterId,
        target: HeroId,
        line: &AttackLine,
    ) -> MonsterAttackOutcome {
        let (instance, key) = {
            let m = &self.state.monsters[id];
            (m.instance.clone(), m.key.clone())
        };
        let threat = self
            .content
            .monster(&key)
            .map(|d| d.name.to_owned())
            .unwrap_or_else(|| instance.clone());

        let roll = self.rng.d20();
        let total = roll + line.bonus;
        let hit = roll == 20 || total >= self.hero_ac(target);
        let damage = if hit { line.damage } else { line.miss_damage.unwrap_or(0) };

        self.log.push(LogEvent::MonsterAttack {
            monster: instance.clone(),
            target: self.hero_name(target),
            roll,
            hit,
            damage,
        });
        self.damage_hero(target, damage, &threat);

        if hit {
            if let Some(kind) = line.status {
                let duration = if kind == StatusType::Dazed { Some(1) } else { None };
                self.apply_status(
                    target,
                    StatusEffect {
                        kind,
                        source: StatusSource::Monster(instance),
                        applied_on_turn: self.state.turn.turn_number,
                        duration,
                        data: None,
                    },
                );
            }
        }
        MonsterAttackOutcome { target, roll, total, hit, damage }
    }
}

/// Scorch-mark square in tile-local coordinates for each facing.
fn scorch_square(rotation: Rotation) -> Pos {
    match rotation {
        Rotation::R0 => Pos { y: 1, x: 2 },
        Rotation::R90 => Pos { y: 2, x: 2 },
        Rotation::R180 => Pos { y: 2, x: 1 },
        Rotation::R270 => Pos { y: 1, x: 1 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::keys;
    use crate::game::test_support;
    use crate::state::{EdgeMap, GridPos, PlacedTile};

    fn villain_board(monster: &str, at: Pos) -> (Game, MonsterId) {
        let mut game = Game::new(11, &[keys::HERO_QUINN], Some(&[Pos { y: 2, x: 2 }])).unwrap();
        let id = test_support::add_monster(&mut game, monster, at);
        test_support::force_phase(&mut game, Phase::Villain);
        (game, id)
    }

    #[test]
    fn attack_only_monsters_step_when_out_of_reach() {
        let (mut game, kobold) = villain_board(keys::MONSTER_KOBOLD, Pos { y: 5, x: 3 });
        game.activate_next_monster().unwrap();

        let Some(PendingInteraction::MonsterActed(report)) = game.pending() else {
            panic!("an activation should leave a report");
        };
        assert_eq!(report.moved_to, Some(Pos { y: 4, x: 3 }));
        assert!(report.attack.is_none(), "a step and a swing never share an activation");
        assert_eq!(game.state.monsters[kobold].pos, Pos { y: 4, x: 3 });
    }

    #[test]
    fn adjacent_kobolds_swing_instead_of_stepping() {
        let (mut game, _) = villain_board(keys::MONSTER_KOBOLD, Pos { y: 2, x: 3 });
        game.activate_next_monster().unwrap();

        let Some(PendingInteraction::MonsterActed(report)) = game.pending() else {
            panic!("an activation should leave a report");
        };
        assert!(report.moved_to.is_none());
        let attack = report.attack.as_ref().expect("adjacent monsters attack");
        assert!((1..=20).contains(&attack.roll));
        assert_eq!(attack.hit, attack.roll == 20 || attack.roll + 7 >= 17);
        let expected = if attack.hit { 1 } else { 0 };
        assert_eq!(attack.damage, expected);
        assert_eq!(game.state.heroes[0].hp, 8 - expected);
    }

    #[test]
    fn the_activation_index_walks_the_roster_once() {
        let mut game = Game::new(11, &[keys::HERO_QUINN], Some(&[Pos { y: 2, x: 2 }])).unwrap();
        test_support::add_monster(&mut game, keys::MONSTER_KOBOLD, Pos { y: 5, x: 1 });
        test_support::add_monster(&mut game, keys::MONSTER_KOBOLD, Pos { y: 5, x: 3 });
        test_support::force_phase(&mut game, Phase::Villain);

        game.activate_next_monster().unwrap();
        let blocked = game.activate_next_monster().unwrap_err();
        assert_eq!(blocked, GameError::InteractionPending);
        game.dismiss_monster_report().unwrap();
        game.activate_next_monster().unwrap();
        game.dismiss_monster_report().unwrap();

        let spent = game.activate_next_monster().unwrap_err();
        assert_eq!(spent, GameError::ActivationsExhausted);
    }

    #[test]
    fn monsters_refuse_to_activate_during_the_hero_phase() {
        let mut game = Game::new(11, &[keys::HERO_QUINN], Some(&[Pos { y: 2, x: 2 }])).unwrap();
        test_support::add_monster(&mut game, keys::MONSTER_KOBOLD, Pos { y: 5, x: 2 });
        let err = game.activate_next_monster().unwrap_err();
        assert_eq!(err, GameError::WrongPhase { expected: Phase::Villain });
    }

    #[test]
    fn a_snake_bite_poisons_on_a_hit() {
        let (mut game, _) = villain_board(keys::MONSTER_SNAKE, Pos { y: 2, x: 3 });
        game.activate_next_monster().unwrap();

        let Some(PendingInteraction::MonsterActed(report)) = game.pending() else {
            panic!("an activation should leave a report");
        };
        let attack = report.attack.as_ref().expect("an adjacent snake bites");
        let poisoned = game.state.heroes[0]
            .statuses
            .iter()
            .any(|s| s.kind == StatusType::Poisoned);
        assert_eq!(poisoned, attack.hit, "poison rides only on a hit");
        if attack.hit {
            let effect = game.state.heroes[0]
                .statuses
                .iter()
                .find(|s| s.kind == StatusType::Poisoned)
                .unwrap();
            assert_eq!(effect.source, StatusSource::Monster("snake-1".to_owned()));
            assert_eq!(effect.duration, None);
        }
    }

    #[test]
    fn archers_loose_arrows_after_closing_the_gap() {
        let (mut game, archer) = villain_board(keys::MONSTER_ORC_ARCHER, Pos { y: 5, x: 3 });
        game.activate_next_monster().unwrap();

        let Some(PendingInteraction::MonsterActed(report)) = game.pending() else {
            panic!("an activation should leave a report");
        };
        assert_eq!(report.moved_to, Some(Pos { y: 4, x: 3 }));
        let attack = report.attack.as_ref().expect("range two covers the gap after the step");
        let expected = if attack.hit { 2 } else { 1 };
        assert_eq!(attack.damage, expected, "arrows graze for one on a miss");
        assert_eq!(game.state.monsters[archer].pos, Pos { y: 4, x: 3 });
    }

    #[test]
    fn monsters_explore_unattended_frontiers() {
        let mut game = Game::new(11, &[keys::HERO_QUINN], Some(&[Pos { y: 3, x: 3 }])).unwrap();
        game.state.tiles.push(PlacedTile {
            id: TileId(1),
            key: keys::TILE_BLACK_JUNCTION.to_owned(),
            color: TileColor::Black,
            grid: GridPos { col: 1, row: 0 },
            rotation: Rotation::R90,
            edges: EdgeMap {
                north: EdgeState::Wall,
                east: EdgeState::Unexplored,
                south: EdgeState::Unexplored,
                west: EdgeState::Open,
            },
        });
        game.state.unexplored_edges.push(UnexploredEdge {
            tile: TileId(1),
            direction: Direction::East,
            segment: EdgeSegment::Whole,
        });
        game.state.unexplored_edges.push(UnexploredEdge {
            tile: TileId(1),
            direction: Direction::South,
            segment: EdgeSegment::Whole,
        });
        test_support::stack_tile_deck(&mut game, &[keys::TILE_BLACK_DEAD_END]);
        test_support::stack_monster_deck(&mut game, &[keys::MONSTER_SNAKE]);
        let kobold = test_support::add_monster(&mut game, keys::MONSTER_KOBOLD, Pos { y: 2, x: 6 });
        test_support::force_phase(&mut game, Phase::Villain);

        game.activate_next_monster().unwrap();

        let Some(PendingInteraction::MonsterActed(report)) = game.pending() else {
            panic!("an activation should leave a report");
        };
        assert_eq!(report.moved_to, Some(Pos { y: 3, x: 6 }), "south beats west in probe order");
        assert_eq!(report.explored.as_deref(), Some("Sealed Vault"));
        assert!(report.attack.is_none(), "an activation that explored does not attack");

        assert_eq!(game.state.tiles.len(), 3);
        let placed = game.state.tile(TileId(2)).unwrap();
        assert_eq!(placed.grid, GridPos { col: 1, row: 1 });
        assert_eq!(placed.rotation, Rotation::R180);
        assert_eq!(game.state.roster.len(), 2, "the new tile spawned its own monster");
        assert_eq!(game.state.monsters[kobold].pos, Pos { y: 3, x: 6 });
        assert!(game
            .log
            .iter()
            .any(|e| matches!(e, LogEvent::MonsterExplored { .. })));
    }

    #[test]
    fn a_packed_tile_drops_the_spawn() {
        let mut game = Game::new(11, &[keys::HERO_QUINN], Some(&[Pos { y: 5, x: 2 }])).unwrap();
        let scorch = Pos { y: 1, x: 2 };
        test_support::add_monster(&mut game, keys::MONSTER_KOBOLD, scorch);
        for (dy, dx) in SPAWN_SCAN {
            test_support::add_monster(&mut game, keys::MONSTER_KOBOLD, scorch.offset(dy, dx));
        }

        let spawned = game.spawn_monster_on_tile(keys::MONSTER_SNAKE, TileId(0), HeroId(0));
        assert!(spawned.is_none());
        assert_eq!(game.state.roster.len(), 9);
    }
}
