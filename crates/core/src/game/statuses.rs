//! Status bookkeeping: application, expiry, derived stats, curse hooks.
//! This module exists so every reader of "can this hero act" asks one place.
//! It does not own the phase points that trigger sweeps; phases.rs calls in.

use super::*;
use crate::state::tile_distance;

// Chebyshev ring around a cursed hero, probed in this order when a monster
// is lured adjacent.
const LURE_SCAN: [(i32, i32); 8] =
    [(-1, 0), (0, 1), (1, 0), (0, -1), (-1, 1), (-1, -1), (1, 1), (1, -1)];

impl Game {
    pub(super) fn can_move(&self, hero: HeroId) -> bool {
        let Some(h) = self.state.hero(hero) else {
            return false;
        };
        !h.has_status(StatusType::Immobilized)
            && !h.has_status(StatusType::Stunned)
            && !h.has_status(StatusType::CurseCage)
    }

    pub(super) fn can_attack(&self, hero: HeroId) -> bool {
        self.state.hero(hero).is_some_and(|h| !h.has_status(StatusType::Stunned))
    }

    pub(super) fn effective_speed(&self, hero: HeroId) -> i32 {
        let Some(h) = self.state.hero(hero) else {
            return 0;
        };
        let Some(def) = self.content.hero(&h.key) else {
            return 0;
        };
        if h.has_status(StatusType::Immobilized) {
            return 0;
        }
        let mut speed = def.speed;
        if h.has_status(StatusType::Slowed) {
            speed /= 2;
        }
        (speed + self.item_speed_bonus(hero)).max(0)
    }

    /// Penalty subtracted from the hero's attack rolls.
    pub(super) fn status_attack_penalty(&self, hero: HeroId) -> i32 {
        let Some(h) = self.state.hero(hero) else {
            return 0;
        };
        let mut penalty = 0;
        if h.has_status(StatusType::Blinded) {
            penalty += 2;
        }
        if h.has_status(StatusType::CurseTerrifyingRoar) {
            penalty += 4;
        }
        penalty
    }

    /// Penalty subtracted from damage the hero deals.
    pub(super) fn status_damage_penalty(&self, hero: HeroId) -> i32 {
        let Some(h) = self.state.hero(hero) else {
            return 0;
        };
        if h.has_status(StatusType::Weakened) { 1 } else { 0 }
    }

    pub(super) fn hero_ac(&self, hero: HeroId) -> i32 {
        let Some(h) = self.state.hero(hero) else {
            return 0;
        };
        let Some(def) = self.content.hero(&h.key) else {
            return 0;
        };
        let mut ac = def.levels[(h.level - 1) as usize].ac + self.item_ac_bonus(hero);
        if h.has_status(StatusType::CurseGapInArmor) {
            ac -= 4;
        }
        if h.has_status(StatusType::CurseCage) {
            ac -= 2;
        }
        ac
    }

    /// Applies a status, replacing an existing instance with the same type
    /// and source. Curses with an on-application bite fire here.
    pub(super) fn apply_status(&mut self, hero: HeroId, effect: StatusEffect) {
        let name = self.hero_name(hero);
        let kind = effect.kind;
        let Some(h) = self.state.hero_mut(hero) else {
            return;
        };
        match h
            .statuses
            .iter_mut()
            .find(|s| s.kind == effect.kind && s.source == effect.source)
        {
            Some(slot) => *slot = effect,
            None => h.statuses.push(effect),
        }
        self.log.push(LogEvent::StatusApplied { hero: name, status: kind });

        match kind {
            StatusType::CurseTimeLeap => self.time_leap_depart(hero),
            StatusType::CurseWrathOfEnemy => self.lure_nearest_monster(hero),
            _ => {}
        }
    }

    fn time_leap_depart(&mut self, hero: HeroId) {
        let name = self.hero_name(hero);
        if let Some(h) = self.state.hero_mut(hero) {
            h.removed_from_play = true;
        }
        self.log.push(LogEvent::TimeLeapDeparted { hero: name });
    }

    /// The monster nearest the bearer jumps to the first free adjacent
    /// square. No monster or no free square means nothing happens.
    fn lure_nearest_monster(&mut self, hero: HeroId) {
        let Some(h) = self.state.hero(hero) else {
            return;
        };
        let anchor = h.pos;
        let Some(monster) = self
            .state
            .roster
            .iter()
            .copied()
            .min_by_key(|&id| {
                let m = &self.state.monsters[id];
                (tile_distance(m.pos, anchor), m.pos.manhattan(anchor))
            })
        else {
            return;
        };
        let Some(dest) = LURE_SCAN.iter().map(|&(dy, dx)| anchor.offset(dy, dx)).find(|&pos| {
            self.state.is_walkable(pos)
                && self.state.hero_at(pos).is_none()
                && self.state.monster_at(pos).is_none()
        }) else {
            return;
        };
        let tile = self.state.tile_at(dest).map(|t| t.id);
        let label = {
            let m = &mut self.state.monsters[monster];
            m.pos = dest;
            if let Some(tile) = tile {
                m.tile = tile;
            }
            m.instance.clone()
        };
        self.log.push(LogEvent::MonsterLured { monster: label, hero: self.hero_name(hero) });
    }

    /// Start-of-turn sweep for the hero whose phase begins: ongoing damage,
    /// poison ticks, duration expiry, then the Bloodlust bite.
    pub(super) fn start_of_turn_statuses(&mut self) {
        let hero = self.state.turn.active_hero;
        let turn = self.state.turn.turn_number;
        let name = self.hero_name(hero);
        let Some(h) = self.state.hero_mut(hero) else {
            return;
        };

        let mut ongoing = 0;
        let mut poison = 0;
        for s in &h.statuses {
            match s.kind {
                StatusType::OngoingDamage => {
                    if let Some(StatusData::OngoingDamage { amount }) = s.data {
                        ongoing += amount;
                    }
                }
                StatusType::Poisoned => poison += 1,
                _ => {}
            }
        }
        let bloodlust = h.has_status(StatusType::CurseBloodlust);

        if ongoing > 0 {
            self.log.push(LogEvent::OngoingHurt { hero: name.clone(), amount: ongoing });
            self.damage_hero(hero, ongoing, "lingering wounds");
        }
        if poison > 0 && self.outcome.is_none() {
            self.log.push(LogEvent::OngoingHurt { hero: name.clone(), amount: poison });
            self.damage_hero(hero, poison, "poison");
        }

        let mut expired = Vec::new();
        if let Some(h) = self.state.hero_mut(hero) {
            h.statuses.retain(|s| match s.duration {
                Some(d) if s.applied_on_turn + d <= turn => {
                    expired.push(s.kind);
                    false
                }
                _ => true,
            });
        }
        for kind in expired {
            self.log.push(LogEvent::StatusExpired { hero: name.clone(), status: kind });
        }

        if bloodlust && self.outcome.is_none() {
            self.log.push(LogEvent::CurseHurt {
                hero: name,
                status: StatusType::CurseBloodlust,
            });
            self.damage_hero(hero, 1, "Bloodlust");
        }
    }

    /// End-of-villain recovery rolls, party order: one poison roll per
    /// poisoned hero, then one roll per removable curse instance.
    pub(super) fn villain_end_recovery(&mut self) {
        let ids: Vec<HeroId> = self.state.heroes.iter().map(|h| h.id).collect();

        for &id in &ids {
            let poisoned = self
                .state
                .hero(id)
                .is_some_and(|h| !h.removed_from_play && h.has_status(StatusType::Poisoned));
            if !poisoned {
                continue;
            }
            let roll = self.rng.d20();
            let name = self.hero_name(id);
            if roll >= 10 {
                if let Some(h) = self.state.hero_mut(id) {
                    h.statuses.retain(|s| s.kind != StatusType::Poisoned);
                }
                self.log.push(LogEvent::PoisonRecovered { hero: name, roll });
            } else {
                self.log.push(LogEvent::PoisonRecoveryFailed { hero: name, roll });
            }
        }

        for &id in &ids {
            let Some(h) = self.state.hero(id) else {
                continue;
            };
            if h.removed_from_play {
                continue;
            }
            let targets: Vec<(StatusType, StatusSource)> = h
                .statuses
                .iter()
                .filter(|s| s.kind.removable_by_roll())
                .map(|s| (s.kind, s.source.clone()))
                .collect();
            for (kind, source) in targets {
                let roll = self.rng.d20();
                let name = self.hero_name(id);
                if roll >= 10 {
                    if let Some(h) = self.state.hero_mut(id) {
                        if let Some(at) = h
                            .statuses
                            .iter()
                            .position(|s| s.kind == kind && s.source == source)
                        {
                            h.statuses.remove(at);
                        }
                    }
                    self.log.push(LogEvent::CurseRemoved { hero: name, status: kind, roll });
                } else {
                    self.log
                        .push(LogEvent::CurseRemovalFailed { hero: name, status: kind, roll });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Monster;

    fn card_status(kind: StatusType, turn: u32) -> StatusEffect {
        StatusEffect {
            kind,
            source: StatusSource::Card("test-card".to_owned()),
            applied_on_turn: turn,
            duration: None,
            data: None,
        }
    }

    #[test]
    fn same_type_and_source_replaces_instead_of_stacking() {
        let mut game = Game::new(3, &["quinn"], Some(&[Pos { y: 2, x: 1 }])).unwrap();
        game.apply_status(HeroId(0), card_status(StatusType::Poisoned, 1));
        game.apply_status(HeroId(0), card_status(StatusType::Poisoned, 2));
        assert_eq!(game.state.heroes[0].status_count(StatusType::Poisoned), 1);

        let mut other = card_status(StatusType::Poisoned, 2);
        other.source = StatusSource::Monster("kobold-1".to_owned());
        game.apply_status(HeroId(0), other);
        assert_eq!(game.state.heroes[0].status_count(StatusType::Poisoned), 2);
    }

    #[test]
    fn terrifying_roar_expires_at_the_next_turn_sweep() {
        let mut game = Game::new(3, &["quinn"], Some(&[Pos { y: 2, x: 1 }])).unwrap();
        let mut roar = card_status(StatusType::CurseTerrifyingRoar, 1);
        roar.duration = Some(1);
        game.apply_status(HeroId(0), roar);
        assert_eq!(game.status_attack_penalty(HeroId(0)), 4);

        game.state.turn.turn_number = 2;
        game.start_of_turn_statuses();
        assert!(!game.state.heroes[0].has_status(StatusType::CurseTerrifyingRoar));
        assert!(game.log.iter().any(|e| matches!(
            e,
            LogEvent::StatusExpired { status: StatusType::CurseTerrifyingRoar, .. }
        )));
    }

    #[test]
    fn cage_locks_movement_and_dents_armor() {
        let mut game = Game::new(3, &["quinn"], Some(&[Pos { y: 2, x: 1 }])).unwrap();
        let base_ac = game.hero_ac(HeroId(0));
        game.apply_status(HeroId(0), card_status(StatusType::CurseCage, 1));
        assert!(!game.can_move(HeroId(0)));
        assert_eq!(game.hero_ac(HeroId(0)), base_ac - 2);
    }

    #[test]
    fn wrath_of_enemy_pulls_the_nearest_monster_adjacent() {
        let mut game = Game::new(3, &["quinn"], Some(&[Pos { y: 2, x: 2 }])).unwrap();
        for (n, pos) in [(1, Pos { y: 7, x: 3 }), (2, Pos { y: 5, x: 3 })] {
            let id = game.state.monsters.insert_with_key(|k| Monster {
                id: k,
                instance: format!("kobold-{n}"),
                key: "kobold".to_owned(),
                tile: TileId(0),
                pos,
                hp: 1,
                controller: HeroId(0),
            });
            game.state.roster.push(id);
        }

        game.apply_status(HeroId(0), card_status(StatusType::CurseWrathOfEnemy, 1));

        let lured = game
            .state
            .roster
            .iter()
            .map(|&id| &game.state.monsters[id])
            .find(|m| m.instance == "kobold-2")
            .unwrap();
        assert_eq!(lured.pos, Pos { y: 1, x: 2 }, "first free square in the scan is north");
        assert!(game.log.iter().any(|e| matches!(e, LogEvent::MonsterLured { .. })));
    }

    #[test]
    fn poison_recovery_roll_is_consistent_with_its_log() {
        for seed in 0..8 {
            let mut game = Game::new(seed, &["quinn"], Some(&[Pos { y: 2, x: 1 }])).unwrap();
            game.apply_status(HeroId(0), card_status(StatusType::Poisoned, 1));
            game.villain_end_recovery();

            let cured = !game.state.heroes[0].has_status(StatusType::Poisoned);
            if cured {
                assert!(
                    game.log
                        .iter()
                        .any(|e| matches!(e, LogEvent::PoisonRecovered { roll, .. } if *roll >= 10))
                );
            } else {
                assert!(game.log.iter().any(
                    |e| matches!(e, LogEvent::PoisonRecoveryFailed { roll, .. } if *roll < 10)
                ));
            }
        }
    }
}
