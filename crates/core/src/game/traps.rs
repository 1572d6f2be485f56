//! Trap and hazard markers: spawning, the villain-phase sweep, disarm rolls.
//! This module exists so every marker behavior lives behind one sweep loop.
//! It does not decide when the sweep runs; phases.rs auto-runs it when skipped.

use super::*;
use crate::content::{TrapAttack, TrapBehavior};
use crate::state::TrapMarker;

impl Game {
    /// Drops a marker on the active hero's square. Traps skip the spawn when
    /// a trap marker already sits there; hazards only skip for another
    /// hazard, so a trap and a hazard can share a square.
    pub(super) fn spawn_trap(&mut self, card: &str, behavior: TrapBehavior, dc: i32) {
        let pos = self.state.active_hero().pos;
        let hazard = matches!(behavior, TrapBehavior::Inert);
        let blocked = self
            .state
            .traps
            .iter()
            .any(|t| t.pos == pos && matches!(t.behavior, TrapBehavior::Inert) == hazard);
        if blocked {
            return;
        }
        let id = self.state.next_trap_id;
        self.state.next_trap_id += 1;
        self.state.traps.push(TrapMarker { id, key: card.to_owned(), behavior, dc, pos });
        let name = self.card_name(card);
        self.log.push(LogEvent::TrapSpawned { card: name, pos });
    }

    /// Villain-phase sweep command, once per villain phase.
    pub(super) fn activate_traps(&mut self) -> Result<(), GameError> {
        self.ensure_running()?;
        self.ensure_phase(Phase::Villain)?;
        self.ensure_no_pending()?;
        if self.state.turn.traps_processed {
            return Err(GameError::TrapsAlreadyProcessed);
        }
        self.state.turn.traps_processed = true;
        self.run_trap_sweep();
        Ok(())
    }

    /// Processes markers in placement order. Markers spawned mid-sweep (lava
    /// spreads) wait for the next sweep.
    pub(super) fn run_trap_sweep(&mut self) {
        let snapshot: Vec<u32> = self.state.traps.iter().map(|t| t.id).collect();
        for id in snapshot {
            if self.outcome.is_some() {
                return;
            }
            let Some(marker) = self.state.trap(id) else {
                continue;
            };
            let (key, behavior, pos, dc) =
                (marker.key.clone(), marker.behavior, marker.pos, marker.dc);
            match behavior {
                TrapBehavior::Spreading { damage } => self.lava_tick(&key, pos, damage, dc),
                TrapBehavior::Stationary { attack } => self.trap_attack_square(&key, pos, attack),
                TrapBehavior::Rolling { damage } => {
                    let dest = self.trap_step(id, pos, &key);
                    self.trap_damage_square(&key, dest, damage);
                }
                TrapBehavior::Sweeping { attack } => {
                    let dest = self.trap_step(id, pos, &key);
                    self.trap_attack_square(&key, dest, attack);
                }
                TrapBehavior::Inert => {}
            }
        }
    }

    /// Every hero standing in lava takes the burn, then this flow tries one
    /// spread onto a random orthogonal square that is on a tile and not
    /// already lava.
    fn lava_tick(&mut self, key: &str, origin: Pos, damage: i32, dc: i32) {
        let lava: Vec<Pos> = self.lava_squares();
        let victims: Vec<HeroId> = self
            .state
            .heroes_in_play()
            .filter(|h| lava.contains(&h.pos))
            .map(|h| h.id)
            .collect();
        let card = self.card_name(key);
        for hero in victims {
            self.log.push(LogEvent::TrapDamage {
                card: card.clone(),
                hero: self.hero_name(hero),
                damage,
            });
            self.damage_hero(hero, damage, &card);
            if self.outcome.is_some() {
                return;
            }
        }

        let lava = self.lava_squares();
        let candidates: Vec<Pos> = Direction::ALL
            .iter()
            .map(|d| origin.step(*d))
            .filter(|p| self.state.tile_at(*p).is_some() && !lava.contains(p))
            .collect();
        if candidates.is_empty() {
            return;
        }
        let choice = candidates[self.rng.pick(candidates.len())];
        let id = self.state.next_trap_id;
        self.state.next_trap_id += 1;
        self.state.traps.push(TrapMarker {
            id,
            key: key.to_owned(),
            behavior: TrapBehavior::Spreading { damage },
            dc,
            pos: choice,
        });
        self.log.push(LogEvent::LavaSpread { pos: choice });
    }

    fn lava_squares(&self) -> Vec<Pos> {
        self.state
            .traps
            .iter()
            .filter(|t| matches!(t.behavior, TrapBehavior::Spreading { .. }))
            .map(|t| t.pos)
            .collect()
    }

    /// One orthogonal step shrinking the Manhattan distance to the nearest
    /// hero, first direction wins. Returns the marker's square either way,
    /// so a blocked marker still works over its own square.
    fn trap_step(&mut self, id: u32, from: Pos, key: &str) -> Pos {
        let Some(goal) = self
            .state
            .heroes_in_play()
            .map(|h| h.pos)
            .min_by_key(|p| from.manhattan(*p))
        else {
            return from;
        };

        let mut best = (from.manhattan(goal), from);
        for dir in Direction::ALL {
            let next = from.step(dir);
            if !self.state.can_step(from, next) {
                continue;
            }
            let d = next.manhattan(goal);
            if d < best.0 {
                best = (d, next);
            }
        }
        if best.1 != from {
            if let Some(m) = self.state.traps.iter_mut().find(|t| t.id == id) {
                m.pos = best.1;
            }
            let card = self.card_name(key);
            self.log.push(LogEvent::TrapMoved { card, to: best.1 });
        }
        best.1
    }

    fn trap_damage_square(&mut self, key: &str, pos: Pos, damage: i32) {
        let victims: Vec<HeroId> = self
            .state
            .heroes_in_play()
            .filter(|h| h.pos == pos)
            .map(|h| h.id)
            .collect();
        let card = self.card_name(key);
        for hero in victims {
            self.log.push(LogEvent::TrapDamage {
                card: card.clone(),
                hero: self.hero_name(hero),
                damage,
            });
            self.damage_hero(hero, damage, &card);
            if self.outcome.is_some() {
                return;
            }
        }
    }

    /// Attack roll against every hero on the square. No natural-20 rule on
    /// trap attacks.
    fn trap_attack_square(&mut self, key: &str, pos: Pos, attack: TrapAttack) {
        let victims: Vec<HeroId> = self
            .state
            .heroes_in_play()
            .filter(|h| h.pos == pos)
            .map(|h| h.id)
            .collect();
        let card = self.card_name(key);
        for hero in victims {
            let roll = self.rng.d20();
            let hit = roll + attack.bonus >= self.hero_ac(hero);
            let damage = if hit { attack.damage } else { attack.miss_damage };
            self.log.push(LogEvent::TrapAttack {
                card: card.clone(),
                hero: self.hero_name(hero),
                roll,
                hit,
                damage,
            });
            self.damage_hero(hero, damage, &card);
            if self.outcome.is_some() {
                return;
            }
        }
    }

    /// d20 plus the environment disable modifier and any Thieves' Tools
    /// bonus against the marker's DC. Only the disable roll takes the
    /// environment modifier, never the sweep math.
    pub(super) fn disarm_trap(&mut self, trap: u32) -> Result<(), GameError> {
        self.ensure_running()?;
        self.ensure_no_pending()?;
        let Some(marker) = self.state.trap(trap) else {
            return Err(GameError::TrapMissing { trap });
        };
        let (dc, pos, behavior) = (marker.dc, marker.pos, marker.behavior);
        if matches!(behavior, TrapBehavior::Inert) {
            return Err(GameError::TrapNotDisarmable { trap });
        }
        let hero = self.state.turn.active_hero;
        let h = self.state.active_hero();
        if h.removed_from_play {
            return Err(GameError::HeroRemovedFromPlay);
        }
        if h.pos != pos {
            return Err(GameError::NotOnTrap { trap });
        }

        let roll = self.rng.d20();
        let total = roll + self.environment_disable_mod() + self.item_disable_bonus(hero);
        let removed = total >= dc;
        if removed {
            self.state.traps.retain(|t| t.id != trap);
            self.log.push(LogEvent::TrapDisarmed { trap, roll, total });
        } else {
            self.log.push(LogEvent::DisarmFailed { trap, roll, total });
        }
        self.pending =
            Some(PendingInteraction::TrapDisarm(DisarmOutcome { trap, roll, total, dc, removed }));
        Ok(())
    }

    pub(super) fn dismiss_trap_result(&mut self) -> Result<(), GameError> {
        self.ensure_running()?;
        match self.pending.take() {
            Some(PendingInteraction::TrapDisarm(_)) => Ok(()),
            Some(other) => {
                self.pending = Some(other);
                Err(GameError::InteractionMismatch)
            }
            None => Err(GameError::NoInteraction),
        }
    }
}
