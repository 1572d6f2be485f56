//! Stable snapshot hashing for deterministic verification.
//! This module exists to keep hashing concerns separate from rules code.
//! It does not own replay execution or journal persistence policies.

use std::hash::Hasher;

use super::*;
use crate::content::TrapBehavior;
use crate::state::Deck;
use xxhash_rust::xxh3::Xxh3;

impl Game {
    /// Canonical field walk over the observable state. Never hashes serde
    /// output; field order here is the format.
    pub fn snapshot_hash(&self) -> u64 {
        let mut h = Xxh3::new();
        h.write_u64(self.seed);
        h.write_u64(self.next_input_seq);

        for hero in &self.state.heroes {
            write_str(&mut h, &hero.key);
            h.write_u8(hero.level);
            h.write_i32(hero.hp);
            write_pos(&mut h, hero.pos);
            h.write_u8(u8::from(hero.moved));
            h.write_u8(u8::from(hero.attacked));
            h.write_u8(u8::from(hero.removed_from_play));
            for status in &hero.statuses {
                h.write_u8(status.kind as u8);
                match &status.source {
                    StatusSource::Card(key) => {
                        h.write_u8(0);
                        write_str(&mut h, key);
                    }
                    StatusSource::Monster(instance) => {
                        h.write_u8(1);
                        write_str(&mut h, instance);
                    }
                    StatusSource::System => h.write_u8(2),
                }
                h.write_u32(status.applied_on_turn);
                h.write_u32(status.duration.map_or(0, |d| d + 1));
                match status.data {
                    Some(StatusData::OngoingDamage { amount }) => {
                        h.write_u8(1);
                        h.write_i32(amount);
                    }
                    None => h.write_u8(0),
                }
            }
            for item in &hero.inventory {
                write_str(&mut h, &item.key);
                h.write_u8(u8::from(item.flipped));
            }
        }

        for tile in &self.state.tiles {
            write_str(&mut h, &tile.key);
            h.write_u16(tile.id.0);
            h.write_i32(tile.grid.col);
            h.write_i32(tile.grid.row);
            h.write_u8(tile.rotation as u8);
            for dir in Direction::ALL {
                h.write_u8(tile.edges.get(dir) as u8);
            }
        }
        for edge in &self.state.unexplored_edges {
            h.write_u16(edge.tile.0);
            h.write_u8(edge.direction as u8);
            h.write_u8(edge.segment as u8);
        }

        for &id in &self.state.roster {
            let m = &self.state.monsters[id];
            write_str(&mut h, &m.instance);
            write_str(&mut h, &m.key);
            h.write_u16(m.tile.0);
            write_pos(&mut h, m.pos);
            h.write_i32(m.hp);
            h.write_u8(m.controller.0);
        }

        for trap in &self.state.traps {
            h.write_u32(trap.id);
            write_str(&mut h, &trap.key);
            h.write_u8(match trap.behavior {
                TrapBehavior::Spreading { .. } => 0,
                TrapBehavior::Stationary { .. } => 1,
                TrapBehavior::Rolling { .. } => 2,
                TrapBehavior::Sweeping { .. } => 3,
                TrapBehavior::Inert => 4,
            });
            h.write_i32(trap.dc);
            write_pos(&mut h, trap.pos);
        }

        write_deck(&mut h, &self.state.tile_deck);
        write_deck(&mut h, &self.state.monster_deck);
        write_deck(&mut h, &self.state.encounter_deck);
        write_deck(&mut h, &self.state.treasure_deck);
        match &self.state.active_environment {
            Some(key) => {
                h.write_u8(1);
                write_str(&mut h, key);
            }
            None => h.write_u8(0),
        }

        h.write_i32(self.state.party.xp);
        h.write_i32(self.state.party.healing_surges);
        h.write_u32(self.state.scenario.monsters_defeated);
        h.write_u32(self.state.scenario.monsters_to_defeat);

        h.write_u8(self.state.turn.phase as u8);
        h.write_u8(self.state.turn.active_hero.0);
        h.write_u32(self.state.turn.turn_number);
        h.write_u8(u8::from(self.state.turn.explored_this_turn));
        h.write_u8(u8::from(self.state.turn.drew_only_white));
        h.write_u8(u8::from(self.state.turn.treasure_drawn_this_turn));
        h.write_u64(self.state.turn.activation_index as u64);
        h.write_u8(u8::from(self.state.turn.traps_processed));
        h.write_u8(u8::from(self.state.turn.bad_luck_pending));
        h.write_u32(self.state.next_trap_id);
        h.write_u32(self.state.next_monster_number);

        h.write_u8(match &self.pending {
            None => 0,
            Some(PendingInteraction::EncounterDrawn { .. }) => 1,
            Some(PendingInteraction::AttackResolved(_)) => 2,
            Some(PendingInteraction::TreasureDrawn { .. }) => 3,
            Some(PendingInteraction::TrapDisarm(_)) => 4,
            Some(PendingInteraction::MonsterActed(_)) => 5,
            Some(PendingInteraction::LairSpawn { .. }) => 6,
            Some(PendingInteraction::ActionSurge { .. }) => 7,
        });
        h.write_u8(match self.outcome {
            None => 0,
            Some(RunOutcome::Victory) => 1,
            Some(RunOutcome::Defeat) => 2,
        });
        h.write_u64(self.log.len() as u64);
        h.finish()
    }
}

fn write_str(h: &mut Xxh3, s: &str) {
    h.write_u64(s.len() as u64);
    h.write(s.as_bytes());
}

fn write_pos(h: &mut Xxh3, pos: Pos) {
    h.write_i32(pos.y);
    h.write_i32(pos.x);
}

fn write_deck(h: &mut Xxh3, deck: &Deck) {
    h.write_u64(deck.draw.len() as u64);
    for card in &deck.draw {
        write_str(h, card);
    }
    h.write_u64(deck.discard.len() as u64);
    for card in &deck.discard {
        write_str(h, card);
    }
}
