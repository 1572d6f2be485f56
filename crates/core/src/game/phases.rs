//! Phase transitions and end-of-turn bookkeeping.
//! This module exists so the Hero -> Exploration -> Villain cycle reads in
//! one place. It does not resolve cards, fights, or markers; it sequences
//! the modules that do.

use super::*;

impl Game {
    /// Ends the hero phase: the Gap-in-Armor check, then the exploration
    /// chain from the hero's final square.
    pub(super) fn end_hero_phase(&mut self) -> Result<(), GameError> {
        self.ensure_running()?;
        self.ensure_phase(Phase::Hero)?;
        self.ensure_no_pending()?;

        self.state.turn.explored_this_turn = false;
        self.state.turn.drew_only_white = false;

        self.lift_gap_in_armor();
        self.resolve_hero_exploration()?;
        self.state.turn.phase = Phase::Exploration;
        Ok(())
    }

    /// Gap in Armor lifts at the end of the bearer's own hero phase, but
    /// only if they took no move action.
    fn lift_gap_in_armor(&mut self) {
        let hero = self.state.turn.active_hero;
        let Some(h) = self.state.hero(hero) else {
            return;
        };
        if h.moved || !h.has_status(StatusType::CurseGapInArmor) {
            return;
        }
        let name = self.hero_name(hero);
        if let Some(h) = self.state.hero_mut(hero) {
            h.statuses.retain(|s| s.kind != StatusType::CurseGapInArmor);
        }
        self.log.push(LogEvent::GapInArmorLifted { hero: name });
    }

    /// Opens the villain phase: activation and sweep counters reset, the
    /// entry encounter draw unless this turn explored only white tiles.
    pub(super) fn end_exploration_phase(&mut self) -> Result<(), GameError> {
        self.ensure_running()?;
        self.ensure_phase(Phase::Exploration)?;
        self.ensure_no_pending()?;

        self.state.turn.phase = Phase::Villain;
        self.state.turn.activation_index = 0;
        self.state.turn.traps_processed = false;
        if self.state.active_hero().has_status(StatusType::CurseBadLuck) {
            self.state.turn.bad_luck_pending = true;
        }
        if !self.state.turn.drew_only_white {
            self.draw_encounter();
        }
        Ok(())
    }

    /// Closes out the villain phase and hands the turn to the next hero.
    /// Refused while activations remain; the trap sweep auto-runs if the
    /// explicit command was skipped.
    pub(super) fn end_villain_phase(&mut self) -> Result<(), GameError> {
        self.ensure_running()?;
        self.ensure_phase(Phase::Villain)?;
        self.ensure_no_pending()?;
        let controlled = self.state.controlled_monsters(self.state.turn.active_hero);
        if self.state.turn.activation_index < controlled.len() {
            return Err(GameError::ActivationsRemaining {
                left: controlled.len() - self.state.turn.activation_index,
            });
        }

        if !self.state.turn.traps_processed {
            self.state.turn.traps_processed = true;
            self.run_trap_sweep();
        }
        if self.outcome.is_some() {
            return Ok(());
        }
        self.run_environment_villain_effect();
        if self.outcome.is_some() {
            return Ok(());
        }
        self.villain_end_recovery();
        self.advance_turn();
        Ok(())
    }

    fn advance_turn(&mut self) {
        let current = self.state.turn.active_hero;
        let idx = self.state.heroes.iter().position(|h| h.id == current).unwrap_or(0);
        let next = (idx + 1) % self.state.heroes.len();
        if next == 0 {
            self.state.turn.turn_number += 1;
        }
        let next_id = self.state.heroes[next].id;
        self.state.turn.active_hero = next_id;
        self.state.turn.phase = Phase::Hero;
        self.state.turn.treasure_drawn_this_turn = false;
        self.state.turn.bad_luck_pending = false;
        {
            let h = &mut self.state.heroes[next];
            h.moved = false;
            h.attacked = false;
        }
        self.return_time_leaper(next_id);
        self.start_of_turn_statuses();
        if self.outcome.is_none() {
            self.check_turn_start_surge();
        }
    }

    /// The turn cycle coming back to the bearer's index restores a
    /// Time-Leap hero.
    fn return_time_leaper(&mut self, hero: HeroId) {
        let leaping = self
            .state
            .hero(hero)
            .is_some_and(|h| h.removed_from_play && h.has_status(StatusType::CurseTimeLeap));
        if !leaping {
            return;
        }
        let name = self.hero_name(hero);
        if let Some(h) = self.state.hero_mut(hero) {
            h.removed_from_play = false;
            h.statuses.retain(|s| s.kind != StatusType::CurseTimeLeap);
        }
        self.log.push(LogEvent::TimeLeapReturned { hero: name });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{keys, TrapAttack, TrapBehavior};
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

    fn card_status(kind: StatusType) -> StatusEffect {
        StatusEffect {
            kind,
            source: StatusSource::Card("test-card".to_owned()),
            applied_on_turn: 1,
            duration: None,
            data: None,
        }
    }

    fn cycle(game: &mut Game) {
        game.end_hero_phase().unwrap();
        game.end_exploration_phase().unwrap();
        if matches!(game.pending(), Some(PendingInteraction::EncounterDrawn { .. })) {
            game.dismiss_encounter().unwrap();
        }
        game.end_villain_phase().unwrap();
    }

    #[test]
    fn a_full_turn_hands_play_back_to_the_hero() {
        let mut game = solo();
        test_support::stack_encounter_deck(&mut game, &[keys::ENC_DARK_FOG]);
        cycle(&mut game);
        assert_eq!(game.state.turn.phase, Phase::Hero);
        assert_eq!(game.state.turn.active_hero, HeroId(0));
        assert_eq!(game.state.turn.turn_number, 2);
    }

    #[test]
    fn two_heroes_alternate_and_the_wrap_bumps_the_turn() {
        let mut game = pair();
        test_support::stack_encounter_deck(&mut game, &[keys::ENC_DARK_FOG]);
        cycle(&mut game);
        assert_eq!(game.state.turn.active_hero, HeroId(1));
        assert_eq!(game.state.turn.turn_number, 1);

        cycle(&mut game);
        assert_eq!(game.state.turn.active_hero, HeroId(0));
        assert_eq!(game.state.turn.turn_number, 2);
    }

    #[test]
    fn phases_refuse_to_end_out_of_order() {
        let mut game = solo();
        assert_eq!(
            game.end_exploration_phase().unwrap_err(),
            GameError::WrongPhase { expected: Phase::Exploration }
        );
        assert_eq!(
            game.end_villain_phase().unwrap_err(),
            GameError::WrongPhase { expected: Phase::Villain }
        );
    }

    #[test]
    fn a_pending_interaction_blocks_the_phase_end() {
        let mut game = solo();
        game.pending = Some(PendingInteraction::TreasureDrawn {
            card: keys::TREASURE_BOOTS.to_owned(),
        });
        assert_eq!(game.end_hero_phase().unwrap_err(), GameError::InteractionPending);
        assert_eq!(game.state.turn.phase, Phase::Hero);
    }

    #[test]
    fn unactivated_monsters_block_the_villain_end() {
        let mut game = solo();
        test_support::add_monster(&mut game, keys::MONSTER_KOBOLD, Pos { y: 5, x: 3 });
        test_support::force_phase(&mut game, Phase::Villain);

        let err = game.end_villain_phase().unwrap_err();
        assert_eq!(err, GameError::ActivationsRemaining { left: 1 });

        game.activate_next_monster().unwrap();
        game.dismiss_monster_report().unwrap();
        game.end_villain_phase().unwrap();
        assert_eq!(game.state.turn.turn_number, 2);
    }

    #[test]
    fn exploration_fires_on_the_way_out_of_the_hero_phase() {
        let mut game = solo();
        test_support::set_hero_pos(&mut game, HeroId(0), Pos { y: 2, x: 3 });
        test_support::stack_tile_deck(&mut game, &[keys::TILE_BLACK_CORRIDOR]);
        test_support::stack_encounter_deck(&mut game, &[keys::ENC_DARK_FOG]);

        game.end_hero_phase().unwrap();
        assert_eq!(game.state.tiles.len(), 2);
        assert!(game.state.turn.explored_this_turn);
        assert_eq!(game.state.turn.phase, Phase::Exploration);

        game.end_exploration_phase().unwrap();
        assert!(
            matches!(game.pending(), Some(PendingInteraction::EncounterDrawn { .. })),
            "a black tile does not spare the party the encounter"
        );
    }

    #[test]
    fn white_only_exploration_skips_the_encounter_draw() {
        let mut game = solo();
        test_support::set_hero_pos(&mut game, HeroId(0), Pos { y: 2, x: 3 });
        test_support::stack_tile_deck(&mut game, &[keys::TILE_WHITE_GALLERY]);
        test_support::stack_encounter_deck(&mut game, &[keys::ENC_DARK_FOG]);

        game.end_hero_phase().unwrap();
        assert!(game.state.turn.drew_only_white);

        game.end_exploration_phase().unwrap();
        assert!(game.pending().is_none());
        assert_eq!(game.state.turn.phase, Phase::Villain);
    }

    #[test]
    fn gap_in_armor_lifts_only_for_the_idle() {
        let mut game = solo();
        game.apply_status(HeroId(0), card_status(StatusType::CurseGapInArmor));
        game.end_hero_phase().unwrap();
        assert!(!game.state.heroes[0].has_status(StatusType::CurseGapInArmor));
        assert!(game.log.iter().any(|e| matches!(e, LogEvent::GapInArmorLifted { .. })));

        let mut game = solo();
        game.apply_status(HeroId(0), card_status(StatusType::CurseGapInArmor));
        game.state.heroes[0].moved = true;
        game.end_hero_phase().unwrap();
        assert!(game.state.heroes[0].has_status(StatusType::CurseGapInArmor));
    }

    #[test]
    fn bad_luck_forces_a_second_draw_at_villain_entry() {
        let mut game = solo();
        game.apply_status(HeroId(0), card_status(StatusType::CurseBadLuck));
        test_support::stack_encounter_deck(&mut game, &[keys::ENC_CAVE_IN, keys::ENC_DARK_FOG]);

        game.end_hero_phase().unwrap();
        game.end_exploration_phase().unwrap();
        assert!(game.state.turn.bad_luck_pending);
        assert_eq!(
            game.pending(),
            Some(&PendingInteraction::EncounterDrawn { card: keys::ENC_CAVE_IN.to_owned() })
        );

        game.dismiss_encounter().unwrap();
        assert!(!game.state.turn.bad_luck_pending);
        assert_eq!(
            game.pending(),
            Some(&PendingInteraction::EncounterDrawn { card: keys::ENC_DARK_FOG.to_owned() })
        );
        assert_eq!(game.state.heroes[0].hp, 7);
    }

    #[test]
    fn the_trap_sweep_auto_runs_at_the_villain_end() {
        let mut game = solo();
        game.state.traps.push(TrapMarker {
            id: 0,
            key: keys::ENC_POISONED_DART_TRAP.to_owned(),
            behavior: TrapBehavior::Stationary {
                attack: TrapAttack { bonus: 8, damage: 2, miss_damage: 1 },
            },
            dc: 12,
            pos: Pos { y: 2, x: 2 },
        });
        game.state.next_trap_id = 1;
        test_support::force_phase(&mut game, Phase::Villain);

        game.end_villain_phase().unwrap();

        assert!(game.log.iter().any(|e| matches!(e, LogEvent::TrapAttack { .. })));
        assert_eq!(game.state.turn.turn_number, 2);
    }

    #[test]
    fn time_leap_holds_the_bearer_out_for_one_cycle() {
        let mut game = pair();
        test_support::stack_encounter_deck(&mut game, &[]);
        game.apply_status(HeroId(0), card_status(StatusType::CurseTimeLeap));
        assert!(game.state.heroes[0].removed_from_play);

        cycle(&mut game);
        assert_eq!(game.state.turn.active_hero, HeroId(1));
        assert!(game.state.heroes[0].removed_from_play, "the leap outlasts the bearer's turn end");

        cycle(&mut game);
        assert_eq!(game.state.turn.active_hero, HeroId(0));
        assert!(!game.state.heroes[0].removed_from_play);
        assert!(!game.state.heroes[0].has_status(StatusType::CurseTimeLeap));
        assert!(game.log.iter().any(|e| matches!(e, LogEvent::TimeLeapReturned { .. })));
    }

    #[test]
    fn the_new_turn_wipes_action_and_treasure_flags() {
        let mut game = solo();
        test_support::stack_encounter_deck(&mut game, &[]);
        game.state.heroes[0].moved = true;
        game.state.heroes[0].attacked = true;
        game.state.turn.treasure_drawn_this_turn = true;

        cycle(&mut game);

        assert!(!game.state.heroes[0].moved);
        assert!(!game.state.heroes[0].attacked);
        assert!(!game.state.turn.treasure_drawn_this_turn);
    }
}
