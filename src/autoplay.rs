use crate::card::{Card, Color};
use crate::deck::Deck;
use crate::game::Game;
use crate::participant::ParticipantId;
use serde::Serialize;

/// One step of an automatic turn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum AutoMove {
    Play(Card),
    Draw,
    Pass,
    ChooseColor(Color),
}

/// Move-selection policy for bot seats and timed-out humans. Decoupled from
/// the scheduling side so hosts can substitute their own policy.
pub trait AutoPlayer: Send + Sync {
    fn choose_move(&self, game: &Game, participant: ParticipantId) -> AutoMove;
}

/// The stock policy: fix wilds to the hand's dominant color, play the first
/// legal card (a Wild Draw Four only when nothing else is legal), otherwise
/// draw once and then pass.
#[derive(Debug, Default)]
pub struct StandardAutoPlayer;

impl AutoPlayer for StandardAutoPlayer {
    fn choose_move(&self, game: &Game, participant: ParticipantId) -> AutoMove {
        let deck = game.participant(participant).deck();

        if game.player_must_choose_color() == Some(participant) {
            return AutoMove::ChooseColor(dominant_color(deck));
        }

        let top = game.last_card().expect("the game has not started");
        let valid = deck.valid_cards(&top);
        let draw_four = Card::wild_draw_four();
        if let Some(card) = valid.iter().find(|c| **c != draw_four) {
            return AutoMove::Play(*card);
        }
        if let Some(card) = valid.first() {
            // only a Wild Draw Four is legal, so it may be played
            return AutoMove::Play(*card);
        }
        if game.current_player_has_drawn() {
            AutoMove::Pass
        } else {
            AutoMove::Draw
        }
    }
}

/// The most frequent non-wild color in the hand, defaulting to red for a
/// hand of nothing but wilds.
fn dominant_color(deck: &Deck) -> Color {
    let mut best = Color::Red;
    let mut best_count = 0;
    for color in Color::CHOOSABLE {
        let count = deck
            .cards()
            .iter()
            .filter(|card| card.color == color)
            .count();
        if count > best_count {
            best = color;
            best_count = count;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::{PlayerId, SeatKind};

    fn game_with_hand(cards: &[&str], top: &str) -> (Game, ParticipantId) {
        let mut game = Game::new();
        let pid = game.create_participant(PlayerId::from("alice"), SeatKind::Human);
        game.create_participant(PlayerId::from("bob"), SeatKind::Human);
        game.start().unwrap();
        let mut deck = Deck::new();
        for s in cards {
            deck.append(s.parse().unwrap());
        }
        *game.participant_mut(pid).deck_mut() = deck;
        game.set_last_card_for_tests(top.parse().unwrap());
        (game, pid)
    }

    #[test]
    fn plays_the_first_legal_card() {
        let (game, pid) = game_with_hand(&["g3", "b9", "r2"], "r5");
        assert_eq!(
            StandardAutoPlayer.choose_move(&game, pid),
            AutoMove::Play("r2".parse().unwrap())
        );
    }

    #[test]
    fn holds_the_wild_draw_four_while_alternatives_exist() {
        let (game, pid) = game_with_hand(&["wd", "r2"], "r5");
        assert_eq!(
            StandardAutoPlayer.choose_move(&game, pid),
            AutoMove::Play("r2".parse().unwrap())
        );
    }

    #[test]
    fn plays_the_wild_draw_four_as_a_last_resort() {
        let (game, pid) = game_with_hand(&["wd", "b2"], "r5");
        assert_eq!(
            StandardAutoPlayer.choose_move(&game, pid),
            AutoMove::Play(Card::wild_draw_four())
        );
    }

    #[test]
    fn draws_then_passes_without_a_legal_card() {
        let (mut game, pid) = game_with_hand(&["b2", "g3"], "r5");
        assert_eq!(StandardAutoPlayer.choose_move(&game, pid), AutoMove::Draw);
        game.draw();
        // the drawn card may be legal; force a hand without moves again
        let mut deck = Deck::new();
        deck.append("b2".parse().unwrap());
        *game.participant_mut(pid).deck_mut() = deck;
        assert_eq!(StandardAutoPlayer.choose_move(&game, pid), AutoMove::Pass);
    }

    #[test]
    fn fixes_wilds_to_the_dominant_color() {
        let (mut game, pid) = game_with_hand(&["w", "g3", "g7", "b2"], "b5");
        game.play_card(pid, "w".parse().unwrap());
        assert_eq!(
            StandardAutoPlayer.choose_move(&game, pid),
            AutoMove::ChooseColor(Color::Green)
        );
    }
}
