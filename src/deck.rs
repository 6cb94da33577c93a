use crate::card::Card;
use serde::{Deserialize, Serialize};

/// An ordered collection of cards owned by one participant (or the dealer).
/// Duplicate values are expected; a physical deck has two of most cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    cards: Vec<Card>,
    colored_display: bool,
}

impl Deck {
    pub fn new() -> Self {
        Self {
            cards: Vec::new(),
            colored_display: true,
        }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn append(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn contains(&self, card: &Card) -> bool {
        self.cards.contains(card)
    }

    /// Removes the first card equal to `card`. Returns whether one was found.
    pub fn remove_one(&mut self, card: &Card) -> bool {
        match self.cards.iter().position(|c| c == card) {
            Some(index) => {
                self.cards.remove(index);
                true
            }
            None => false,
        }
    }

    /// Sorts by the canonical string form; a total order, so re-sorting is
    /// idempotent.
    pub fn sort_cards(&mut self) {
        self.cards.sort_by_key(|card| card.to_string());
    }

    /// The cards in this deck that may be played on `top`.
    pub fn valid_cards(&self, top: &Card) -> Vec<Card> {
        self.cards
            .iter()
            .filter(|card| card.compatible(top))
            .copied()
            .collect()
    }

    /// Whether the owner wants colors in their private card listings.
    /// Display preference only; never consulted by game logic.
    pub fn colored_display(&self) -> bool {
        self.colored_display
    }

    pub fn set_colored_display(&mut self, colored: bool) {
        self.colored_display = colored;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deck_of(cards: &[&str]) -> Deck {
        let mut deck = Deck::new();
        for s in cards {
            deck.append(s.parse().unwrap());
        }
        deck
    }

    #[test]
    fn remove_one_takes_a_single_copy() {
        let mut deck = deck_of(&["r5", "r5", "g3"]);
        assert!(deck.remove_one(&"r5".parse().unwrap()));
        assert_eq!(deck.len(), 2);
        assert!(deck.contains(&"r5".parse().unwrap()));
        assert!(!deck.remove_one(&"b1".parse().unwrap()));
    }

    #[test]
    fn sort_is_idempotent_and_total() {
        let mut deck = deck_of(&["y3", "r5", "wd", "g0", "w", "bs", "r5"]);
        deck.sort_cards();
        let once: Vec<String> = deck.cards().iter().map(|c| c.to_string()).collect();
        deck.sort_cards();
        let twice: Vec<String> = deck.cards().iter().map(|c| c.to_string()).collect();
        assert_eq!(once, twice);
        let mut expected = once.clone();
        expected.sort();
        assert_eq!(once, expected);
    }

    #[test]
    fn valid_cards_filters_on_compatibility() {
        let deck = deck_of(&["r5", "b5", "g3", "w"]);
        let top: Card = "b9".parse().unwrap();
        let valid = deck.valid_cards(&top);
        let strings: Vec<String> = valid.iter().map(|c| c.to_string()).collect();
        assert_eq!(strings, ["b5", "w"]);
    }

    #[test]
    fn colored_display_defaults_on() {
        let mut deck = Deck::new();
        assert!(deck.colored_display());
        deck.set_colored_display(false);
        assert!(!deck.colored_display());
    }
}
