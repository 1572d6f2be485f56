//! Encounter card lifecycle: draw, resolve, cancel, environments.
//! This module exists to keep effect dispatch in one match.
//! It does not place markers or spawn monsters itself; traps.rs and
//! monsters.rs own those.

use super::*;
use crate::content::{
    EncounterEffect, EventAction, SpecialKind, TargetSelector, TrapBehavior, VillainEffect,
};
use crate::state::tile_distance;

const CANCEL_COST: i32 = 5;

impl Game {
    /// Draws the top encounter into the pending slot. Exhausted deck plus
    /// empty discard draws nothing.
    pub(super) fn draw_encounter(&mut self) {
        let Some(key) = self.state.encounter_deck.draw(&mut self.rng) else {
            return;
        };
        self.log.push(LogEvent::EncounterDrawn { card: self.card_name(&key) });
        self.pending = Some(PendingInteraction::EncounterDrawn { card: key });
    }

    /// Resolves the pending card's effect, then discards it. Environments
    /// stay in play instead of discarding. At most one chained draw follows:
    /// the card's own follow-up mandate wins over the Bad Luck extra.
    pub(super) fn dismiss_encounter(&mut self) -> Result<(), GameError> {
        self.ensure_running()?;
        let key = match self.pending.take() {
            Some(PendingInteraction::EncounterDrawn { card }) => card,
            Some(other) => {
                self.pending = Some(other);
                return Err(GameError::InteractionMismatch);
            }
            None => return Err(GameError::NoInteraction),
        };
        let Some(def) = self.content.encounter(&key) else {
            return Err(GameError::UnknownContent { key });
        };
        let effect = def.effect;
        let follow_up = def.follow_up;

        self.resolve_effect(&key, effect);

        if !matches!(effect, EncounterEffect::Environment { .. }) {
            self.state.encounter_deck.put_discard(key.clone());
        }
        if self.outcome.is_some() || self.pending.is_some() {
            return Ok(());
        }
        if follow_up {
            self.log.push(LogEvent::FollowUpDraw { card: self.card_name(&key) });
            self.draw_encounter();
        } else if self.state.turn.bad_luck_pending {
            self.state.turn.bad_luck_pending = false;
            let hero = self.hero_name(self.state.turn.active_hero);
            self.log.push(LogEvent::BadLuckExtraDraw { hero });
            self.draw_encounter();
        }
        Ok(())
    }

    /// Pays 5 XP to discard the pending card with no effect.
    pub(super) fn cancel_encounter(&mut self) -> Result<(), GameError> {
        self.ensure_running()?;
        let key = match self.pending.take() {
            Some(PendingInteraction::EncounterDrawn { card }) => card,
            Some(other) => {
                self.pending = Some(other);
                return Err(GameError::InteractionMismatch);
            }
            None => return Err(GameError::NoInteraction),
        };
        if self.state.party.xp < CANCEL_COST {
            let have = self.state.party.xp;
            self.pending = Some(PendingInteraction::EncounterDrawn { card: key });
            return Err(GameError::NotEnoughXp { need: CANCEL_COST, have });
        }
        self.state.party.xp -= CANCEL_COST;
        let name = self.card_name(&key);
        self.state.encounter_deck.put_discard(key);
        self.log.push(LogEvent::EncounterCancelled { card: name, cost: CANCEL_COST });
        Ok(())
    }

    fn resolve_effect(&mut self, key: &str, effect: EncounterEffect) {
        match effect {
            EncounterEffect::Damage { target, amount } => {
                let card = self.card_name(key);
                for hero in self.select_targets(target) {
                    self.log.push(LogEvent::EncounterDamage {
                        card: card.clone(),
                        hero: self.hero_name(hero),
                        damage: amount,
                    });
                    self.damage_hero(hero, amount, &card);
                    if self.outcome.is_some() {
                        return;
                    }
                }
            }
            EncounterEffect::Attack { target, bonus, damage, miss_damage, status } => {
                let card = self.card_name(key);
                for hero in self.select_targets(target) {
                    let roll = self.rng.d20();
                    let hit = roll + bonus >= self.hero_ac(hero);
                    let dealt = if hit { damage } else { miss_damage.unwrap_or(0) };
                    self.log.push(LogEvent::EncounterAttack {
                        card: card.clone(),
                        hero: self.hero_name(hero),
                        roll,
                        hit,
                        damage: dealt,
                    });
                    if hit {
                        if let Some(kind) = status {
                            let duration =
                                if kind == StatusType::Dazed { Some(1) } else { None };
                            self.apply_status(hero, StatusEffect {
                                kind,
                                source: StatusSource::Card(key.to_owned()),
                                applied_on_turn: self.state.turn.turn_number,
                                duration,
                                data: None,
                            });
                        }
                    }
                    self.damage_hero(hero, dealt, &card);
                    if self.outcome.is_some() {
                        return;
                    }
                }
            }
            EncounterEffect::Curse { status, duration } => {
                let hero = self.state.turn.active_hero;
                self.apply_status(hero, StatusEffect {
                    kind: status,
                    source: StatusSource::Card(key.to_owned()),
                    applied_on_turn: self.state.turn.turn_number,
                    duration,
                    data: None,
                });
            }
            EncounterEffect::Trap { behavior, dc } => self.spawn_trap(key, behavior, dc),
            EncounterEffect::Hazard { on_spawn_damage } => {
                self.spawn_trap(key, TrapBehavior::Inert, 0);
                if on_spawn_damage > 0 {
                    let hero = self.state.turn.active_hero;
                    let card = self.card_name(key);
                    self.log.push(LogEvent::EncounterDamage {
                        card: card.clone(),
                        hero: self.hero_name(hero),
                        damage: on_spawn_damage,
                    });
                    self.damage_hero(hero, on_spawn_damage, &card);
                }
            }
            EncounterEffect::Environment { .. } => self.activate_environment(key.to_owned()),
            EncounterEffect::Event { action } => match action {
                EventAction::TileDeckBottomToTop => {
                    self.state.tile_deck.move_bottom_to_top();
                    self.log.push(LogEvent::TileDeckRearranged { card: self.card_name(key) });
                }
                EventAction::DrawTreasure => self.draw_treasure(),
            },
            EncounterEffect::Special { kind } => match kind {
                SpecialKind::OccupiedLair => {
                    if let Some(monster) = self.state.monster_deck.draw_from_bottom() {
                        self.pending = Some(PendingInteraction::LairSpawn { monster });
                    }
                }
            },
        }
    }

    fn select_targets(&self, target: TargetSelector) -> Vec<HeroId> {
        let active = self.state.turn.active_hero;
        match target {
            TargetSelector::ActiveHero => match self.state.hero(active) {
                Some(h) if !h.removed_from_play => vec![active],
                _ => Vec::new(),
            },
            TargetSelector::AllHeroes => self.state.heroes_in_play().map(|h| h.id).collect(),
            TargetSelector::HeroesOnActiveTile => {
                let Some(pos) = self.state.hero(active).map(|h| h.pos) else {
                    return Vec::new();
                };
                match self.state.tile_at(pos) {
                    Some(t) => self.state.heroes_on_tile(t.id),
                    None => Vec::new(),
                }
            }
            TargetSelector::HeroesWithinOneTile => {
                let Some(pos) = self.state.hero(active).map(|h| h.pos) else {
                    return Vec::new();
                };
                self.state
                    .heroes_in_play()
                    .filter(|h| tile_distance(pos, h.pos) <= 1)
                    .map(|h| h.id)
                    .collect()
            }
        }
    }

    /// Resolves the lair interaction: the chosen tile's scorch mark gets the
    /// stashed monster. A bad tile id keeps the choice open.
    pub(super) fn place_lair_spawn(&mut self, tile: TileId) -> Result<(), GameError> {
        self.ensure_running()?;
        let monster = match self.pending.take() {
            Some(PendingInteraction::LairSpawn { monster }) => monster,
            Some(other) => {
                self.pending = Some(other);
                return Err(GameError::InteractionMismatch);
            }
            None => return Err(GameError::NoInteraction),
        };
        if self.state.tile(tile).is_none() {
            self.pending = Some(PendingInteraction::LairSpawn { monster });
            return Err(GameError::TileMissing { tile });
        }
        let controller = self.state.turn.active_hero;
        self.spawn_monster_on_tile(&monster, tile, controller);
        Ok(())
    }

    // -- environments ------------------------------------------------------

    fn activate_environment(&mut self, key: String) {
        if let Some(previous) = self.state.active_environment.take() {
            self.state.encounter_deck.put_discard(previous);
        }
        self.log.push(LogEvent::EnvironmentActivated { card: self.card_name(&key) });
        self.state.active_environment = Some(key);
    }

    /// Direct environment swap outside the draw flow.
    pub(super) fn set_environment(&mut self, env: Option<String>) -> Result<(), GameError> {
        self.ensure_running()?;
        self.ensure_no_pending()?;
        match env {
            Some(key) => {
                let Some(def) = self.content.encounter(&key) else {
                    return Err(GameError::UnknownContent { key });
                };
                if !matches!(def.effect, EncounterEffect::Environment { .. }) {
                    return Err(GameError::NotAnEnvironment { key });
                }
                self.activate_environment(key);
            }
            None => {
                if let Some(previous) = self.state.active_environment.take() {
                    let name = self.card_name(&previous);
                    self.state.encounter_deck.put_discard(previous);
                    self.log.push(LogEvent::EnvironmentCleared { card: name });
                }
            }
        }
        Ok(())
    }

    /// Modifier the active environment adds to hero attack rolls.
    pub(super) fn environment_attack_mod(&self) -> i32 {
        match self.active_environment_effect() {
            Some(EncounterEffect::Environment { attack_mod, .. }) => attack_mod,
            _ => 0,
        }
    }

    /// Modifier the active environment adds to disable rolls.
    pub(super) fn environment_disable_mod(&self) -> i32 {
        match self.active_environment_effect() {
            Some(EncounterEffect::Environment { disable_mod, .. }) => disable_mod,
            _ => 0,
        }
    }

    fn active_environment_effect(&self) -> Option<EncounterEffect> {
        let key = self.state.active_environment.as_deref()?;
        self.content.encounter(key).map(|d| d.effect)
    }

    /// End-of-villain-phase environment tick.
    pub(super) fn run_environment_villain_effect(&mut self) {
        let Some(EncounterEffect::Environment { villain: Some(effect), .. }) =
            self.active_environment_effect()
        else {
            return;
        };
        let Some(key) = self.state.active_environment.clone() else {
            return;
        };
        match effect {
            VillainEffect::HighAlert { damage } => {
                let victims: Vec<HeroId> = self
                    .state
                    .heroes_in_play()
                    .filter(|h| {
                        !self
                            .state
                            .roster
                            .iter()
                            .any(|&m| self.state.monsters[m].pos.adjacent(h.pos))
                    })
                    .map(|h| h.id)
                    .collect();
                let card = self.card_name(&key);
                for hero in victims {
                    self.log.push(LogEvent::EncounterDamage {
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
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::keys;
    use crate::game::test_support;
    use crate::state::TrapMarker;

    fn solo() -> Game {
        Game::new(5, &[keys::HERO_QUINN], Some(&[Pos { y: 2, x: 2 }])).unwrap()
    }

    fn pair() -> Game {
        Game::new(
            5,
            &[keys::HERO_QUINN, keys::HERO_VISTRA],
            Some(&[Pos { y: 2, x: 2 }, Pos { y: 3, x: 3 }]),
        )
        .unwrap()
    }

    #[test]
    fn an_empty_encounter_deck_draws_nothing() {
        let mut game = solo();
        test_support::stack_encounter_deck(&mut game, &[]);
        game.draw_encounter();
        assert!(game.pending().is_none());
    }

    #[test]
    fn an_ambush_mandates_a_second_draw() {
        let mut game = solo();
        test_support::stack_encounter_deck(&mut game, &[keys::ENC_GOBLIN_AMBUSH, keys::ENC_CAVE_IN]);
        game.draw_encounter();

        game.dismiss_encounter().unwrap();

        assert_eq!(game.state.heroes[0].hp, 7);
        assert!(game.log.iter().any(|e| matches!(e, LogEvent::FollowUpDraw { .. })));
        assert_eq!(
            game.pending(),
            Some(&PendingInteraction::EncounterDrawn { card: keys::ENC_CAVE_IN.to_owned() })
        );

        game.dismiss_encounter().unwrap();
        assert_eq!(game.state.heroes[0].hp, 6);
        assert!(game.pending().is_none());
        assert_eq!(game.state.encounter_deck.discard.len(), 2);
    }

    #[test]
    fn a_cave_in_batters_the_whole_party() {
        let mut game = pair();
        test_support::stack_encounter_deck(&mut game, &[keys::ENC_CAVE_IN]);
        game.draw_encounter();

        game.dismiss_encounter().unwrap();

        assert_eq!(game.state.heroes[0].hp, 7);
        assert_eq!(game.state.heroes[1].hp, 9);
        assert_eq!(game.state.encounter_deck.discard, vec![keys::ENC_CAVE_IN.to_owned()]);
    }

    #[test]
    fn spray_attack_rolls_match_the_damage_dealt() {
        let mut game = pair();
        test_support::stack_encounter_deck(&mut game, &[keys::ENC_VOLCANIC_SPRAY]);
        game.draw_encounter();
        let before: i32 = game.state.heroes.iter().map(|h| h.hp).sum();

        game.dismiss_encounter().unwrap();

        let rolls: Vec<(bool, i32)> = game
            .log
            .iter()
            .filter_map(|e| match e {
                LogEvent::EncounterAttack { hit, damage, .. } => Some((*hit, *damage)),
                _ => None,
            })
            .collect();
        assert_eq!(rolls.len(), 2, "both heroes are within one tile");
        for (hit, damage) in &rolls {
            assert_eq!(*damage, if *hit { 1 } else { 0 });
        }
        let after: i32 = game.state.heroes.iter().map(|h| h.hp).sum();
        assert_eq!(before - after, rolls.iter().map(|(_, d)| d).sum::<i32>());
    }

    #[test]
    fn a_curse_sticks_to_the_active_hero() {
        let mut game = solo();
        test_support::stack_encounter_deck(&mut game, &[keys::ENC_GAP_IN_ARMOR]);
        game.draw_encounter();

        game.dismiss_encounter().unwrap();

        let hero = &game.state.heroes[0];
        assert!(hero.has_status(StatusType::CurseGapInArmor));
        assert_eq!(
            hero.statuses[0].source,
            StatusSource::Card(keys::ENC_GAP_IN_ARMOR.to_owned())
        );
    }

    #[test]
    fn an_environment_hangs_until_replaced() {
        let mut game = solo();
        test_support::stack_encounter_deck(
            &mut game,
            &[keys::ENC_DARK_FOG, keys::ENC_UNSTABLE_GROUND],
        );

        game.draw_encounter();
        game.dismiss_encounter().unwrap();
        assert_eq!(game.state.active_environment.as_deref(), Some(keys::ENC_DARK_FOG));
        assert_eq!(game.environment_attack_mod(), -2);
        assert!(game.state.encounter_deck.discard.is_empty(), "environments are not discarded");

        game.draw_encounter();
        game.dismiss_encounter().unwrap();
        assert_eq!(game.state.active_environment.as_deref(), Some(keys::ENC_UNSTABLE_GROUND));
        assert_eq!(game.environment_attack_mod(), 0);
        assert_eq!(game.environment_disable_mod(), -2);
        assert_eq!(game.state.encounter_deck.discard, vec![keys::ENC_DARK_FOG.to_owned()]);
    }

    #[test]
    fn set_environment_rejects_ordinary_cards() {
        let mut game = solo();
        let err = game.set_environment(Some(keys::ENC_GOBLIN_AMBUSH.to_owned())).unwrap_err();
        assert_eq!(
            err,
            GameError::NotAnEnvironment { key: keys::ENC_GOBLIN_AMBUSH.to_owned() }
        );

        game.set_environment(Some(keys::ENC_DARK_FOG.to_owned())).unwrap();
        assert_eq!(game.environment_attack_mod(), -2);

        game.set_environment(None).unwrap();
        assert!(game.state.active_environment.is_none());
        assert!(game.log.iter().any(|e| matches!(e, LogEvent::EnvironmentCleared { .. })));
        assert_eq!(game.state.encounter_deck.discard, vec![keys::ENC_DARK_FOG.to_owned()]);
    }

    #[test]
    fn hidden_treasure_ignores_the_kill_cap() {
        let mut game = solo();
        game.state.turn.treasure_drawn_this_turn = true;
        test_support::stack_encounter_deck(&mut game, &[keys::ENC_HIDDEN_TREASURE]);
        test_support::stack_treasure_deck(&mut game, &[keys::TREASURE_HEALING_POTION]);
        game.draw_encounter();

        game.dismiss_encounter().unwrap();

        assert_eq!(
            game.pending(),
            Some(&PendingInteraction::TreasureDrawn {
                card: keys::TREASURE_HEALING_POTION.to_owned()
            })
        );
    }

    #[test]
    fn lost_cycles_the_bottom_tile_to_the_top() {
        let mut game = solo();
        test_support::stack_tile_deck(
            &mut game,
            &[keys::TILE_BLACK_CORRIDOR, keys::TILE_BLACK_CORNER, keys::TILE_BLACK_JUNCTION],
        );
        test_support::stack_encounter_deck(&mut game, &[keys::ENC_LOST]);
        game.draw_encounter();

        game.dismiss_encounter().unwrap();

        assert_eq!(
            game.state.tile_deck.draw,
            vec![
                keys::TILE_BLACK_JUNCTION.to_owned(),
                keys::TILE_BLACK_CORRIDOR.to_owned(),
                keys::TILE_BLACK_CORNER.to_owned(),
            ]
        );
        assert!(game.log.iter().any(|e| matches!(e, LogEvent::TileDeckRearranged { .. })));
    }

    #[test]
    fn the_lair_asks_for_a_tile_and_spawns_at_its_scorch() {
        let mut game = solo();
        test_support::stack_encounter_deck(&mut game, &[keys::ENC_OCCUPIED_LAIR]);
        test_support::stack_monster_deck(&mut game, &[keys::MONSTER_KOBOLD, keys::MONSTER_SNAKE]);
        game.draw_encounter();

        game.dismiss_encounter().unwrap();
        assert_eq!(
            game.pending(),
            Some(&PendingInteraction::LairSpawn { monster: keys::MONSTER_SNAKE.to_owned() }),
            "the lair draws from the bottom of the monster deck"
        );

        let err = game.place_lair_spawn(TileId(9)).unwrap_err();
        assert_eq!(err, GameError::TileMissing { tile: TileId(9) });
        assert!(game.pending().is_some(), "a bad tile keeps the choice open");

        game.place_lair_spawn(TileId(0)).unwrap();
        assert_eq!(game.state.roster.len(), 1);
        let spawned = &game.state.monsters[game.state.roster[0]];
        assert_eq!(spawned.instance, "snake-1");
        assert_eq!(spawned.pos, Pos { y: 1, x: 2 });
    }

    #[test]
    fn a_poor_party_cannot_cancel() {
        let mut game = solo();
        test_support::stack_encounter_deck(&mut game, &[keys::ENC_CAVE_IN]);
        game.draw_encounter();

        let err = game.cancel_encounter().unwrap_err();
        assert_eq!(err, GameError::NotEnoughXp { need: 5, have: 0 });
        assert!(game.pending().is_some(), "the card stays on the table");

        game.state.party.xp = 6;
        game.cancel_encounter().unwrap();
        assert_eq!(game.state.party.xp, 1);
        assert_eq!(game.state.heroes[0].hp, 8, "a cancelled card has no effect");
        assert_eq!(game.state.encounter_deck.discard, vec![keys::ENC_CAVE_IN.to_owned()]);
    }

    #[test]
    fn bad_luck_forces_exactly_one_extra_draw() {
        let mut game = solo();
        game.state.turn.bad_luck_pending = true;
        test_support::stack_encounter_deck(&mut game, &[keys::ENC_CAVE_IN, keys::ENC_DARK_FOG]);
        game.draw_encounter();

        game.dismiss_encounter().unwrap();

        assert!(game.log.iter().any(|e| matches!(e, LogEvent::BadLuckExtraDraw { .. })));
        assert!(!game.state.turn.bad_luck_pending);
        assert_eq!(
            game.pending(),
            Some(&PendingInteraction::EncounterDrawn { card: keys::ENC_DARK_FOG.to_owned() })
        );
    }

    #[test]
    fn a_pit_opens_under_the_active_hero() {
        let mut game = solo();
        test_support::stack_encounter_deck(
            &mut game,
            &[keys::ENC_CONCEALED_PIT, keys::ENC_CONCEALED_PIT],
        );

        game.draw_encounter();
        game.dismiss_encounter().unwrap();
        assert_eq!(game.state.traps.len(), 1);
        assert_eq!(game.state.traps[0].pos, Pos { y: 2, x: 2 });
        assert_eq!(game.state.heroes[0].hp, 7);

        game.draw_encounter();
        game.dismiss_encounter().unwrap();
        assert_eq!(game.state.traps.len(), 1, "one hazard marker per square");
        assert_eq!(game.state.heroes[0].hp, 6, "the fall still hurts");
    }

    #[test]
    fn a_lava_card_and_a_pit_can_share_a_square() {
        let mut game = solo();
        game.state.traps.push(TrapMarker {
            id: 7,
            key: keys::ENC_CONCEALED_PIT.to_owned(),
            behavior: TrapBehavior::Inert,
            dc: 0,
            pos: Pos { y: 2, x: 2 },
        });
        test_support::stack_encounter_deck(&mut game, &[keys::ENC_LAVA_FLOW]);
        game.draw_encounter();

        game.dismiss_encounter().unwrap();

        assert_eq!(game.state.traps.len(), 2);
        assert!(matches!(game.state.traps[1].behavior, TrapBehavior::Spreading { .. }));
    }
}
