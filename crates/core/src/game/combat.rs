//! Hero attacks, the shared damage sink, level-ups, and healing surges.
//! This module exists so every hit-point change funnels through one helper.
//! It does not own monster activations; monsters.rs drives those.

use super::*;

impl Game {
    /// Attack with an engine-rolled d20.
    pub(super) fn attack_monster(&mut self, hero: HeroId, target: MonsterId) -> Result<(), GameError> {
        self.attack_guards(hero, target)?;
        let roll = self.rng.d20();
        self.resolve_hero_attack(hero, target, roll);
        Ok(())
    }

    /// Attack with a caller-supplied d20 face, for physical-dice play.
    pub(super) fn apply_attack_result(
        &mut self,
        hero: HeroId,
        target: MonsterId,
        roll: i32,
    ) -> Result<(), GameError> {
        self.attack_guards(hero, target)?;
        if !(1..=20).contains(&roll) {
            return Err(GameError::RollOutOfRange { roll });
        }
        self.resolve_hero_attack(hero, target, roll);
        Ok(())
    }

    fn attack_guards(&self, hero: HeroId, target: MonsterId) -> Result<(), GameError> {
        self.ensure_running()?;
        self.ensure_phase(Phase::Hero)?;
        self.ensure_no_pending()?;
        self.ensure_active_hero(hero)?;
        let h = self.state.active_hero();
        if h.attacked {
            return Err(GameError::ActionAlreadySpent);
        }
        if h.has_status(StatusType::Dazed) && h.moved {
            return Err(GameError::OneActionWhileDazed);
        }
        if !self.can_attack(hero) {
            return Err(GameError::CannotAttack);
        }
        let Some(m) = self.state.monsters.get(target) else {
            return Err(GameError::MonsterMissing);
        };
        if !h.pos.adjacent(m.pos) {
            return Err(GameError::TargetNotAdjacent);
        }
        Ok(())
    }

    fn resolve_hero_attack(&mut self, hero: HeroId, target: MonsterId, roll: i32) {
        let h = self.state.active_hero();
        let level = h.level;
        let (base_bonus, weapon_damage, attack_name) = match self.content.hero(&h.key) {
            Some(def) => (
                def.levels[(level - 1) as usize].attack_bonus,
                def.damage,
                def.attack_name.to_owned(),
            ),
            None => (0, 0, h.key.clone()),
        };
        let monster_ac = self
            .state
            .monsters
            .get(target)
            .and_then(|m| self.content.monster(&m.key))
            .map(|d| d.ac)
            .unwrap_or(0);

        let bonus = base_bonus + self.item_attack_bonus(hero) - self.status_attack_penalty(hero)
            + self.environment_attack_mod();
        let total = roll + bonus;
        let crit = roll == 20;
        let hit = crit || total >= monster_ac;

        self.state.active_hero_mut().attacked = true;

        // A natural 20 opens the level-up window before damage lands, so the
        // critical bonus reads the new level.
        let leveled_up = if crit { self.try_level_up(hero) } else { false };

        let mut damage = 0;
        if hit {
            damage = weapon_damage + self.item_damage_bonus(hero)
                - self.status_damage_penalty(hero);
            if crit && self.state.active_hero().level == 2 {
                damage += 1;
            }
            damage = damage.max(0);
        }

        let target_name = self.monster_label(target);
        self.log.push(LogEvent::HeroAttack {
            hero: self.hero_name(hero),
            target: target_name.clone(),
            attack: attack_name.clone(),
            roll,
            hit,
            damage,
        });

        let mut defeated = false;
        if hit && damage > 0 {
            if let Some(m) = self.state.monsters.get_mut(target) {
                m.hp -= damage;
                defeated = m.hp <= 0;
            }
        }
        let treasure = if defeated { self.defeat_monster(target, hero) } else { None };

        self.pending = Some(PendingInteraction::AttackResolved(AttackOutcome {
            hero,
            target: target_name,
            attack: attack_name,
            roll,
            total,
            hit,
            damage,
            defeated,
            treasure,
            leveled_up,
        }));
    }

    /// Level 1, five party XP, a natural 20: pay the XP and take the level 2
    /// statline. Damage already taken carries over, hp never below 1.
    fn try_level_up(&mut self, hero: HeroId) -> bool {
        let Some(h) = self.state.hero(hero) else {
            return false;
        };
        if h.level != 1 || self.state.party.xp < 5 {
            return false;
        }
        let Some(def) = self.content.hero(&h.key) else {
            return false;
        };
        let taken = def.levels[0].max_hp - h.hp;
        let new_hp = (def.levels[1].max_hp - taken).max(1);
        let name = self.hero_name(hero);

        self.state.party.xp -= 5;
        if let Some(h) = self.state.hero_mut(hero) {
            h.level = 2;
            h.hp = new_hp;
        }
        self.log.push(LogEvent::LeveledUp { hero: name });
        true
    }

    /// Kill bookkeeping: XP, counters, card to discard, Bloodlust lift,
    /// the once-per-turn treasure draw, and the victory check.
    fn defeat_monster(&mut self, target: MonsterId, killer: HeroId) -> Option<String> {
        let Some(m) = self.state.monsters.get(target) else {
            return None;
        };
        let key = m.key.clone();
        let label = m.instance.clone();
        let xp = self.content.monster(&key).map(|d| d.xp).unwrap_or(0);

        self.state.party.xp += xp;
        self.state.scenario.monsters_defeated += 1;
        self.state.roster.retain(|&id| id != target);
        self.state.monsters.remove(target);
        self.state.monster_deck.put_discard(key);
        self.log.push(LogEvent::MonsterDefeated { monster: label, xp });

        let bearer = self
            .state
            .hero(killer)
            .is_some_and(|h| h.has_status(StatusType::CurseBloodlust));
        if bearer {
            if let Some(h) = self.state.hero_mut(killer) {
                h.statuses.retain(|s| s.kind != StatusType::CurseBloodlust);
            }
            self.log.push(LogEvent::StatusExpired {
                hero: self.hero_name(killer),
                status: StatusType::CurseBloodlust,
            });
        }

        let treasure = if self.state.turn.treasure_drawn_this_turn {
            None
        } else {
            self.state.turn.treasure_drawn_this_turn = true;
            self.state.treasure_deck.draw(&mut self.rng)
        };

        if self.state.scenario.monsters_defeated >= self.state.scenario.monsters_to_defeat {
            self.log.push(LogEvent::Victory);
            self.outcome = Some(RunOutcome::Victory);
        }
        treasure
    }

    pub(super) fn dismiss_attack_result(&mut self) -> Result<(), GameError> {
        self.ensure_running()?;
        let outcome = match self.pending.take() {
            Some(PendingInteraction::AttackResolved(outcome)) => outcome,
            Some(other) => {
                self.pending = Some(other);
                return Err(GameError::InteractionMismatch);
            }
            None => return Err(GameError::NoInteraction),
        };
        if let Some(key) = outcome.treasure {
            self.log.push(LogEvent::TreasureDrawn { card: self.card_name(&key) });
            self.pending = Some(PendingInteraction::TreasureDrawn { card: key });
        }
        let h = self.state.active_hero();
        if self.pending.is_none() && h.moved && h.attacked {
            self.end_hero_phase()?;
        }
        Ok(())
    }

    /// Single sink for hero damage. A hero falling with the party out of
    /// surges ends the run on the spot.
    pub(super) fn damage_hero(&mut self, hero: HeroId, amount: i32, threat: &str) {
        if amount <= 0 {
            return;
        }
        let name = self.hero_name(hero);
        let Some(h) = self.state.hero_mut(hero) else {
            return;
        };
        let before = h.hp;
        h.hp = (h.hp - amount).max(0);
        let fell = before > 0 && h.hp == 0;
        if fell && self.state.party.healing_surges == 0 {
            self.log.push(LogEvent::HeroFell { hero: name });
            self.log.push(LogEvent::PartyOverwhelmed { threat: threat.to_owned() });
            self.outcome = Some(RunOutcome::Defeat);
        }
    }

    /// Turn-start check for a hero opening their phase at 0 hp.
    pub(super) fn check_turn_start_surge(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        let hero = self.state.turn.active_hero;
        let Some(h) = self.state.hero(hero) else {
            return;
        };
        if h.removed_from_play || h.hp > 0 {
            return;
        }
        if self.state.party.healing_surges == 0 {
            self.log.push(LogEvent::HeroFell { hero: self.hero_name(hero) });
            self.outcome = Some(RunOutcome::Defeat);
        } else {
            self.pending = Some(PendingInteraction::ActionSurge { hero });
        }
    }

    pub(super) fn use_action_surge(&mut self, hero: HeroId) -> Result<(), GameError> {
        self.ensure_running()?;
        self.ensure_surge_prompt(hero)?;
        let Some(h) = self.state.hero(hero) else {
            return Err(GameError::HeroMissing);
        };
        let restored = match self.content.hero(&h.key) {
            Some(def) => {
                let lvl = (h.level - 1) as usize;
                def.levels[lvl].surge_value.min(def.levels[lvl].max_hp)
            }
            None => 1,
        };
        self.state.party.healing_surges -= 1;
        if let Some(h) = self.state.hero_mut(hero) {
            h.hp = restored;
        }
        self.pending = None;
        self.log.push(LogEvent::SurgeUsed { hero: self.hero_name(hero), restored });
        Ok(())
    }

    pub(super) fn skip_action_surge(&mut self, hero: HeroId) -> Result<(), GameError> {
        self.ensure_running()?;
        self.ensure_surge_prompt(hero)?;
        self.pending = None;
        self.log.push(LogEvent::SurgeDeclined { hero: self.hero_name(hero) });
        self.outcome = Some(RunOutcome::Defeat);
        Ok(())
    }

    fn ensure_surge_prompt(&self, hero: HeroId) -> Result<(), GameError> {
        match self.pending {
            Some(PendingInteraction::ActionSurge { hero: expected }) if expected == hero => Ok(()),
            Some(_) => Err(GameError::InteractionMismatch),
            None => Err(GameError::NoInteraction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::test_support;

    fn duel() -> (Game, MonsterId) {
        let mut game = Game::new(5, &["quinn"], Some(&[Pos { y: 2, x: 2 }])).unwrap();
        let kobold = test_support::add_monster(&mut game, "kobold", Pos { y: 2, x: 3 });
        (game, kobold)
    }

    #[test]
    fn a_total_meeting_ac_hits_and_kills() {
        let (mut game, kobold) = duel();
        game.apply_attack_result(HeroId(0), kobold, 8).unwrap();

        let Some(PendingInteraction::AttackResolved(outcome)) = game.pending() else {
            panic!("attack should leave a pending result");
        };
        assert!(outcome.hit, "8 + 6 meets AC 14");
        assert_eq!(outcome.damage, 2);
        assert!(outcome.defeated);
        assert!(outcome.treasure.is_some(), "first kill of the turn draws treasure");
        assert_eq!(game.state().party.xp, 1);
        assert!(game.state().roster.is_empty());
        assert!(game.state().turn.treasure_drawn_this_turn);
    }

    #[test]
    fn a_total_below_ac_misses() {
        let (mut game, kobold) = duel();
        game.apply_attack_result(HeroId(0), kobold, 7).unwrap();

        let Some(PendingInteraction::AttackResolved(outcome)) = game.pending() else {
            panic!("attack should leave a pending result");
        };
        assert!(!outcome.hit);
        assert_eq!(outcome.damage, 0);
        assert_eq!(game.state().monsters[kobold].hp, 1);
    }

    #[test]
    fn natural_twenty_levels_up_when_xp_allows() {
        let (mut game, kobold) = duel();
        game.state.party.xp = 6;
        game.apply_attack_result(HeroId(0), kobold, 20).unwrap();

        let hero = &game.state.heroes[0];
        assert_eq!(hero.level, 2);
        assert_eq!(hero.hp, 10, "undamaged hero takes the full level 2 pool");
        assert_eq!(game.state.party.xp, 2, "five paid, one earned from the kill");
        let Some(PendingInteraction::AttackResolved(outcome)) = game.pending() else {
            panic!("attack should leave a pending result");
        };
        assert!(outcome.leveled_up);
        assert_eq!(outcome.damage, 3, "crit at level 2 adds one");
        assert!(game.log.iter().any(|e| matches!(e, LogEvent::LeveledUp { .. })));
    }

    #[test]
    fn second_attack_in_a_phase_is_refused() {
        let (mut game, kobold) = duel();
        game.apply_attack_result(HeroId(0), kobold, 7).unwrap();
        game.dismiss_attack_result().unwrap();
        let err = game.apply_attack_result(HeroId(0), kobold, 7).unwrap_err();
        assert_eq!(err, GameError::ActionAlreadySpent);
    }

    #[test]
    fn out_of_reach_targets_are_refused() {
        let mut game = Game::new(5, &["quinn"], Some(&[Pos { y: 2, x: 2 }])).unwrap();
        let far = test_support::add_monster(&mut game, "kobold", Pos { y: 5, x: 3 });
        let err = game.apply_attack_result(HeroId(0), far, 10).unwrap_err();
        assert_eq!(err, GameError::TargetNotAdjacent);
    }

    #[test]
    fn dazed_heroes_get_one_action_only() {
        let (mut game, kobold) = duel();
        game.state.heroes[0].statuses.push(StatusEffect {
            kind: StatusType::Dazed,
            source: StatusSource::System,
            applied_on_turn: 1,
            duration: None,
            data: None,
        });
        game.state.heroes[0].moved = true;
        let err = game.apply_attack_result(HeroId(0), kobold, 10).unwrap_err();
        assert_eq!(err, GameError::OneActionWhileDazed);
    }

    #[test]
    fn dismissing_a_kill_surfaces_the_treasure_and_holds_the_phase() {
        let (mut game, kobold) = duel();
        game.state.heroes[0].moved = true;
        game.apply_attack_result(HeroId(0), kobold, 8).unwrap();
        game.dismiss_attack_result().unwrap();

        assert!(matches!(game.pending(), Some(PendingInteraction::TreasureDrawn { .. })));
        assert_eq!(game.state.turn.phase, Phase::Hero, "treasure blocks the auto phase end");
    }

    #[test]
    fn dismissing_a_spent_turn_ends_the_hero_phase() {
        let (mut game, kobold) = duel();
        game.state.heroes[0].moved = true;
        game.apply_attack_result(HeroId(0), kobold, 7).unwrap();
        game.dismiss_attack_result().unwrap();
        assert_eq!(game.state.turn.phase, Phase::Exploration);
    }

    #[test]
    fn falling_with_no_surges_loses_the_run() {
        let mut game = Game::new(5, &["quinn"], Some(&[Pos { y: 2, x: 2 }])).unwrap();
        game.state.party.healing_surges = 0;
        game.damage_hero(HeroId(0), 8, "the Kobold");

        assert_eq!(game.outcome(), Some(RunOutcome::Defeat));
        assert!(game.log.iter().any(|e| matches!(e, LogEvent::HeroFell { .. })));
        assert!(game.log.iter().any(|e| matches!(e, LogEvent::PartyOverwhelmed { .. })));
    }

    #[test]
    fn surge_prompt_restores_to_surge_value() {
        let mut game = Game::new(5, &["quinn"], Some(&[Pos { y: 2, x: 2 }])).unwrap();
        game.state.heroes[0].hp = 0;
        game.check_turn_start_surge();
        assert!(matches!(game.pending(), Some(PendingInteraction::ActionSurge { .. })));

        game.use_action_surge(HeroId(0)).unwrap();
        assert_eq!(game.state.heroes[0].hp, 4);
        assert_eq!(game.state.party.healing_surges, 1);
        assert!(game.pending().is_none());
    }

    #[test]
    fn declining_the_surge_ends_the_adventure() {
        let mut game = Game::new(5, &["quinn"], Some(&[Pos { y: 2, x: 2 }])).unwrap();
        game.state.heroes[0].hp = 0;
        game.check_turn_start_surge();
        game.skip_action_surge(HeroId(0)).unwrap();
        assert_eq!(game.outcome(), Some(RunOutcome::Defeat));
    }
}
