//! Inventory handling: treasure draws, passive item bonuses, item use.
//! This module exists so stat readers never inspect raw inventories.
//! It does not own the kill-flow treasure cap; combat checks that flag.

use super::*;
use crate::content::ItemBonus;
use crate::state::ItemState;

impl Game {
    pub(super) fn item_attack_bonus(&self, hero: HeroId) -> i32 {
        self.item_bonus_sum(hero, |b| if let ItemBonus::Attack(n) = b { n } else { 0 })
    }

    pub(super) fn item_damage_bonus(&self, hero: HeroId) -> i32 {
        self.item_bonus_sum(hero, |b| if let ItemBonus::Damage(n) = b { n } else { 0 })
    }

    pub(super) fn item_ac_bonus(&self, hero: HeroId) -> i32 {
        self.item_bonus_sum(hero, |b| if let ItemBonus::Ac(n) = b { n } else { 0 })
    }

    pub(super) fn item_speed_bonus(&self, hero: HeroId) -> i32 {
        self.item_bonus_sum(hero, |b| if let ItemBonus::Speed(n) = b { n } else { 0 })
    }

    pub(super) fn item_disable_bonus(&self, hero: HeroId) -> i32 {
        self.item_bonus_sum(hero, |b| if let ItemBonus::Disable(n) = b { n } else { 0 })
    }

    /// Face-down items contribute nothing.
    fn item_bonus_sum(&self, hero: HeroId, pick: fn(ItemBonus) -> i32) -> i32 {
        let Some(h) = self.state.hero(hero) else {
            return 0;
        };
        h.inventory
            .iter()
            .filter(|item| !item.flipped)
            .filter_map(|item| self.content.treasure(&item.key))
            .map(|def| pick(def.bonus))
            .sum()
    }

    /// Draws the next treasure card into the pending slot. An exhausted deck
    /// with an empty discard simply draws nothing.
    pub(super) fn draw_treasure(&mut self) {
        let Some(key) = self.state.treasure_deck.draw(&mut self.rng) else {
            return;
        };
        self.log.push(LogEvent::TreasureDrawn { card: self.card_name(&key) });
        self.pending = Some(PendingInteraction::TreasureDrawn { card: key });
    }

    pub(super) fn assign_treasure(&mut self, hero: HeroId) -> Result<(), GameError> {
        self.ensure_running()?;
        if self.state.hero(hero).is_none() {
            return Err(GameError::HeroMissing);
        }
        let card = match self.pending.take() {
            Some(PendingInteraction::TreasureDrawn { card }) => card,
            Some(other) => {
                self.pending = Some(other);
                return Err(GameError::InteractionMismatch);
            }
            None => return Err(GameError::NoInteraction),
        };
        let name = self.card_name(&card);
        if let Some(h) = self.state.hero_mut(hero) {
            h.inventory.push(ItemState { key: card, flipped: false });
        }
        self.log.push(LogEvent::TreasureAssigned { card: name, hero: self.hero_name(hero) });
        Ok(())
    }

    pub(super) fn dismiss_treasure(&mut self) -> Result<(), GameError> {
        self.ensure_running()?;
        let card = match self.pending.take() {
            Some(PendingInteraction::TreasureDrawn { card }) => card,
            Some(other) => {
                self.pending = Some(other);
                return Err(GameError::InteractionMismatch);
            }
            None => return Err(GameError::NoInteraction),
        };
        let name = self.card_name(&card);
        self.state.treasure_deck.put_discard(card);
        self.log.push(LogEvent::TreasureDiscarded { card: name });
        Ok(())
    }

    /// Spends a use-activated item. The card flips face down and keeps its
    /// inventory slot, so its passive side is gone for good.
    pub(super) fn use_item(&mut self, hero: HeroId, slot: usize) -> Result<(), GameError> {
        self.ensure_running()?;
        self.ensure_no_pending()?;
        let Some(h) = self.state.hero(hero) else {
            return Err(GameError::HeroMissing);
        };
        let Some(item) = h.inventory.get(slot) else {
            return Err(GameError::ItemSlotInvalid { slot });
        };
        if item.flipped {
            return Err(GameError::ItemNotUsable);
        }
        let Some(def) = self.content.treasure(&item.key) else {
            return Err(GameError::UnknownContent { key: item.key.clone() });
        };
        let ItemBonus::HealOnUse(amount) = def.bonus else {
            return Err(GameError::ItemNotUsable);
        };
        let max_hp = self
            .content
            .hero(&h.key)
            .map(|d| d.levels[(h.level - 1) as usize].max_hp)
            .unwrap_or(h.hp);

        let name = self.hero_name(hero);
        let card = def.name.to_owned();
        let Some(h) = self.state.hero_mut(hero) else {
            return Err(GameError::HeroMissing);
        };
        let before = h.hp;
        h.hp = (h.hp + amount).min(max_hp);
        let healed = h.hp - before;
        h.inventory[slot].flipped = true;
        self.log.push(LogEvent::ItemUsed { hero: name, card, healed });
        Ok(())
    }
}
