//! Shared test fixtures for the `game` test suites.
//! This module exists to avoid repeating party, deck, and monster setup across many tests.
//! It does not own production gameplay logic.

use super::*;
use crate::state::{Deck, ItemState, Monster};

/// Places a monster directly on the board, bypassing the tile deck.
pub fn add_monster(game: &mut Game, key: &str, pos: Pos) -> MonsterId {
    let def = game
        .content
        .monster(key)
        .unwrap_or_else(|| panic!("unknown monster key {key}"));
    let number = game.state.next_monster_number;
    game.state.next_monster_number += 1;
    let tile = game
        .state
        .tile_at(pos)
        .map(|t| t.id)
        .unwrap_or(TileId(0));
    let controller = game.state.turn.active_hero;
    let monster = Monster {
        id: MonsterId::default(),
        instance: format!("{key}-{number}"),
        key: key.to_owned(),
        tile,
        pos,
        hp: def.hp,
        controller,
    };
    let id = game.state.monsters.insert(monster);
    game.state.monsters[id].id = id;
    game.state.roster.push(id);
    id
}

/// Replaces the tile deck draw pile, top card first.
pub fn stack_tile_deck(game: &mut Game, keys: &[&str]) {
    game.state.tile_deck = Deck::new(keys);
}

pub fn stack_monster_deck(game: &mut Game, keys: &[&str]) {
    game.state.monster_deck = Deck::new(keys);
}

pub fn stack_encounter_deck(game: &mut Game, keys: &[&str]) {
    game.state.encounter_deck = Deck::new(keys);
}

pub fn stack_treasure_deck(game: &mut Game, keys: &[&str]) {
    game.state.treasure_deck = Deck::new(keys);
}

/// Jumps the turn engine to a phase without walking the usual commands.
pub fn force_phase(game: &mut Game, phase: Phase) {
    game.state.turn.phase = phase;
    if phase == Phase::Villain {
        game.state.turn.activation_index = 0;
        game.state.turn.traps_processed = false;
    }
}

pub fn set_hero_pos(game: &mut Game, hero: HeroId, pos: Pos) {
    if let Some(h) = game.state.hero_mut(hero) {
        h.pos = pos;
    }
}

pub fn set_hero_hp(game: &mut Game, hero: HeroId, hp: i32) {
    if let Some(h) = game.state.hero_mut(hero) {
        h.hp = hp;
    }
}

pub fn grant_status(game: &mut Game, hero: HeroId, effect: StatusEffect) {
    if let Some(h) = game.state.hero_mut(hero) {
        h.statuses.push(effect);
    }
}

pub fn give_item(game: &mut Game, hero: HeroId, key: &str) {
    if let Some(h) = game.state.hero_mut(hero) {
        h.inventory.push(ItemState { key: key.to_owned(), flipped: false });
    }
}
