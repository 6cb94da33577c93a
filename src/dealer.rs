use crate::card::{Card, Color, Rank};
use crate::deck::Deck;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Total number of cards in the fixed composition.
pub const FULL_DECK_SIZE: usize = 108;

/// The fixed dealt composition: per color one 0, two each of 1-9, two Skip,
/// two Reverse, two Draw Two; plus four Wilds and four Wild Draw Fours.
/// Color-only cards are not part of the pool; they are synthesized when a
/// wild's color is chosen.
pub fn standard_pool() -> Vec<Card> {
    let mut pool = Vec::with_capacity(FULL_DECK_SIZE);
    for color in Color::CHOOSABLE {
        pool.push(Card::new(color, Rank::Number(0)));
        for number in 1..=9 {
            pool.push(Card::new(color, Rank::Number(number)));
            pool.push(Card::new(color, Rank::Number(number)));
        }
        for _ in 0..2 {
            pool.push(Card::new(color, Rank::Skip));
            pool.push(Card::new(color, Rank::Reverse));
            pool.push(Card::new(color, Rank::Draw));
        }
    }
    for _ in 0..4 {
        pool.push(Card::wild());
        pool.push(Card::wild_draw_four());
    }
    pool
}

/// Whether `card` exists in the fixed composition. Color-only cards are not
/// playable from a hand and are rejected here.
pub fn is_valid_card(card: &Card) -> bool {
    match card.rank {
        None => card.color == Color::Wild,
        Some(Rank::Number(n)) => card.color != Color::Wild && n <= 9,
        Some(Rank::Draw) => true,
        Some(Rank::Skip) | Some(Rank::Reverse) => card.color != Color::Wild,
    }
}

/// The shared draw pile. Draws are uniformly random; replenishing the pile
/// (`repile`) is triggered by the game, not by the dealer itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dealer {
    pool: Vec<Card>,
}

impl Default for Dealer {
    fn default() -> Self {
        Self::new()
    }
}

impl Dealer {
    pub fn new() -> Self {
        Self {
            pool: standard_pool(),
        }
    }

    pub fn size(&self) -> usize {
        self.pool.len()
    }

    pub fn can_draw(&self, amount: usize) -> bool {
        self.pool.len() >= amount
    }

    /// Removes up to `amount` uniformly random cards from the pool. Returns
    /// fewer when the pool runs short; the caller detects under-delivery and
    /// repiles.
    pub fn draw(&mut self, amount: usize, exclude_wild: bool) -> Vec<Card> {
        let mut rng = rand::rng();
        let mut drawn = Vec::with_capacity(amount);
        for _ in 0..amount {
            let candidates: Vec<usize> = (0..self.pool.len())
                .filter(|&i| !(exclude_wild && self.pool[i].is_wild()))
                .collect();
            if candidates.is_empty() {
                break;
            }
            let index = candidates[rng.random_range(0..candidates.len())];
            drawn.push(self.pool.swap_remove(index));
        }
        drawn
    }

    /// Draws `amount` cards into `deck`, returning copies of what was dealt
    /// so the caller can notify the owner.
    pub fn populate(&mut self, deck: &mut Deck, amount: usize) -> Vec<Card> {
        let cards = self.draw(amount, false);
        for card in &cards {
            deck.append(*card);
        }
        cards
    }

    /// Rebuilds the pool as the full composition minus every card currently
    /// held, minus one copy standing in for the active top card. A rank-less
    /// top card (a wild, fixed or not) stands in for one Wild copy.
    pub fn repile<'a>(
        &mut self,
        held: impl IntoIterator<Item = &'a Card>,
        top_card: Option<&Card>,
    ) {
        self.pool = standard_pool();
        for card in held {
            remove_first(&mut self.pool, card);
        }
        if let Some(top) = top_card {
            let physical = if top.rank.is_none() {
                Card::wild()
            } else {
                *top
            };
            remove_first(&mut self.pool, &physical);
        }
    }
}

fn remove_first(pool: &mut Vec<Card>, card: &Card) {
    if let Some(index) = pool.iter().position(|c| c == card) {
        pool.swap_remove(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composition_has_108_cards() {
        let pool = standard_pool();
        assert_eq!(pool.len(), FULL_DECK_SIZE);
        assert_eq!(pool.iter().filter(|c| **c == Card::wild()).count(), 4);
        assert_eq!(
            pool.iter()
                .filter(|c| **c == Card::wild_draw_four())
                .count(),
            4
        );
        let r5: Card = "r5".parse().unwrap();
        let g0: Card = "g0".parse().unwrap();
        assert_eq!(pool.iter().filter(|c| **c == r5).count(), 2);
        assert_eq!(pool.iter().filter(|c| **c == g0).count(), 1);
    }

    #[test]
    fn validator_follows_composition() {
        for s in ["r0", "b9", "gs", "yr", "rd", "w", "wd"] {
            assert!(is_valid_card(&s.parse().unwrap()), "{} should be valid", s);
        }
        // ws/wr do not exist, and bare colors are not playable cards
        assert!(!is_valid_card(&Card::new(Color::Wild, Rank::Skip)));
        assert!(!is_valid_card(&Card::new(Color::Wild, Rank::Reverse)));
        assert!(!is_valid_card(&Card::new(Color::Wild, Rank::Number(3))));
        assert!(!is_valid_card(&Card::color_only(Color::Red)));
    }

    #[test]
    fn draw_removes_from_pool() {
        let mut dealer = Dealer::new();
        let cards = dealer.draw(7, false);
        assert_eq!(cards.len(), 7);
        assert_eq!(dealer.size(), FULL_DECK_SIZE - 7);
    }

    #[test]
    fn draw_can_exclude_wilds() {
        let mut dealer = Dealer::new();
        // 100 non-wild cards exist; drawing them all wild-free must succeed
        let cards = dealer.draw(100, true);
        assert_eq!(cards.len(), 100);
        assert!(cards.iter().all(|c| !c.is_wild()));
        // only wilds remain, so an excluding draw under-delivers
        assert!(dealer.draw(1, true).is_empty());
        assert_eq!(dealer.size(), 8);
    }

    #[test]
    fn draw_under_delivers_when_short() {
        let mut dealer = Dealer::new();
        dealer.draw(FULL_DECK_SIZE - 3, false);
        assert!(!dealer.can_draw(4));
        let cards = dealer.draw(10, false);
        assert_eq!(cards.len(), 3);
        assert_eq!(dealer.size(), 0);
    }

    #[test]
    fn populate_appends_and_reports() {
        let mut dealer = Dealer::new();
        let mut deck = Deck::new();
        let cards = dealer.populate(&mut deck, 10);
        assert_eq!(cards.len(), 10);
        assert_eq!(deck.len(), 10);
        assert_eq!(deck.cards(), &cards[..]);
    }

    #[test]
    fn repile_restores_everything_not_held() {
        let mut dealer = Dealer::new();
        let mut hand = Deck::new();
        dealer.populate(&mut hand, 10);
        let top = dealer.draw(1, true)[0];
        // everything else has been played and discarded
        dealer.draw(FULL_DECK_SIZE, false);
        assert_eq!(dealer.size(), 0);

        dealer.repile(hand.cards(), Some(&top));
        assert_eq!(dealer.size() + hand.len() + 1, FULL_DECK_SIZE);
    }

    #[test]
    fn repile_counts_a_fixed_wild_as_a_wild_copy() {
        let mut dealer = Dealer::new();
        let hand = Deck::new();
        let top = Card::color_only(Color::Red);
        dealer.repile(hand.cards(), Some(&top));
        assert_eq!(dealer.size(), FULL_DECK_SIZE - 1);
        assert_eq!(
            dealer.pool.iter().filter(|c| **c == Card::wild()).count(),
            3
        );
    }
}
