use crate::card::{Card, Color, Rank};
use crate::dealer::Dealer;
use crate::deck::Deck;
use crate::order::PlayerOrder;
use crate::participant::{Participant, ParticipantId, PlayerId, SeatKind};
use crate::scores::{hand_points, HighScores};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cards dealt to each participant when they join.
pub const HAND_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    NotStarted,
    Started,
    /// `winner` is `None` when the game was stopped without a winner.
    Finished { winner: Option<ParticipantId> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartError {
    AlreadyStarted,
    NoParticipants,
    /// The pool holds no non-wild card to open with (only possible when the
    /// deals left nothing but wilds).
    NoOpeningCard,
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartError::AlreadyStarted => write!(f, "the game has already started"),
            StartError::NoParticipants => write!(f, "cannot start a game without participants"),
            StartError::NoOpeningCard => {
                write!(f, "no non-wild card is available for the opening draw")
            }
        }
    }
}

impl std::error::Error for StartError {}

/// What playing a card did, beyond replacing the top card. Consumed by the
/// hosting layer to decide what to announce.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PlayEffect {
    None,
    /// Direction of play toggled (three or more participants).
    Reversed,
    /// Two-player game: a Reverse acts as a Skip and leaves direction alone.
    SkippedTwoPlayer { skipped: ParticipantId },
    Skipped { skipped: ParticipantId },
    /// Draw Two or Wild Draw Four: the next participant was dealt `cards`
    /// and their turn skipped.
    ForcedDraw {
        target: ParticipantId,
        cards: Vec<Card>,
        repiled: bool,
    },
}

/// Result of a drawn-out turn step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawOutcome {
    pub cards: Vec<Card>,
    pub repiled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinSummary {
    pub winner: ParticipantId,
    pub points: u32,
    pub new_high_score: bool,
    /// Every non-winning participant's remaining hand.
    pub leftovers: Vec<(ParticipantId, Vec<Card>)>,
}

/// Everything the caller needs to relay after a validated play, plus whether
/// advancing the turn is safe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnOutcome {
    pub effect: PlayEffect,
    /// The direction flag flipped during this play; announce the new order.
    pub order_changed: bool,
    /// This participant is down to one card.
    pub uno: Option<ParticipantId>,
    /// This participant must pick a color before play continues.
    pub awaiting_color: Option<ParticipantId>,
    pub win: Option<WinSummary>,
    /// False while a win or a pending color choice suspends the turn.
    pub advance: bool,
}

/// The game state machine: one dealer, one player order, the last played
/// card, the per-turn draw flag and the pending color choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    participants: Vec<Participant>,
    dealer: Dealer,
    order: Option<PlayerOrder>,
    last_card: Option<Card>,
    current_player_has_drawn: bool,
    must_choose_color: Option<ParticipantId>,
    status: GameStatus,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    pub fn new() -> Self {
        Self {
            participants: Vec::new(),
            dealer: Dealer::new(),
            order: None,
            last_card: None,
            current_player_has_drawn: false,
            must_choose_color: None,
            status: GameStatus::NotStarted,
        }
    }

    /// Seats a player and deals them a hand. Idempotent: an already-seated
    /// player keeps their existing seat and deck.
    pub fn create_participant(&mut self, player: PlayerId, kind: SeatKind) -> ParticipantId {
        if let Some(existing) = self.find_participant(&player) {
            return existing;
        }
        let mut deck = Deck::new();
        self.dealer.populate(&mut deck, HAND_SIZE);
        debug!("seating {} with {} cards", player, deck.len());
        self.participants.push(Participant::new(player, kind, deck));
        ParticipantId(self.participants.len() - 1)
    }

    /// Freezes the seat list into a player order and draws a non-wild
    /// opening card.
    pub fn start(&mut self) -> Result<(), StartError> {
        if self.status != GameStatus::NotStarted {
            return Err(StartError::AlreadyStarted);
        }
        if self.participants.is_empty() {
            return Err(StartError::NoParticipants);
        }
        let top = self
            .dealer
            .draw(1, true)
            .pop()
            .ok_or(StartError::NoOpeningCard)?;
        let seats = (0..self.participants.len()).map(ParticipantId).collect();
        self.order = Some(PlayerOrder::new(seats));
        self.last_card = Some(top);
        self.status = GameStatus::Started;
        debug!(
            "game started with {} participants, top card {}",
            self.participants.len(),
            top
        );
        Ok(())
    }

    /// Ends the game without a winner. Idempotent once finished.
    pub fn stop(&mut self) {
        if let GameStatus::Finished { .. } = self.status {
            return;
        }
        self.status = GameStatus::Finished { winner: None };
        debug!("game stopped");
    }

    /// Draws one card for the current participant, repiling first when the
    /// pool is empty, and marks the turn as drawn-out.
    pub fn draw(&mut self) -> DrawOutcome {
        let current = self.order().current();
        let repiled = self.ensure_available(1);
        let cards = self
            .dealer
            .populate(self.participants[current.0].deck_mut(), 1);
        self.current_player_has_drawn = true;
        DrawOutcome { cards, repiled }
    }

    /// Core transition: removes `card` from the participant's deck, makes it
    /// the top card and applies its effect. The caller must have validated
    /// membership and compatibility; an absent card is a programmer error
    /// and panics rather than corrupting state.
    pub fn play_card(&mut self, participant: ParticipantId, card: Card) -> PlayEffect {
        let next = self.order().peek_next();
        let removed = self.participants[participant.0].deck_mut().remove_one(&card);
        assert!(
            removed,
            "played card {} is not in the participant's deck",
            card
        );
        self.last_card = Some(card);

        if card.color == Color::Wild {
            self.must_choose_color = Some(participant);
        }

        let Some(rank) = card.rank else {
            // A fresh wild; nothing further happens until a color is chosen.
            return PlayEffect::None;
        };

        match rank {
            Rank::Reverse => {
                if self.order().len() > 2 {
                    self.order_mut().reverse();
                    PlayEffect::Reversed
                } else {
                    // With two players reversing is meaningless; skip instead.
                    self.order_mut().advance(1);
                    PlayEffect::SkippedTwoPlayer { skipped: next }
                }
            }
            Rank::Draw => {
                let amount = if card.color == Color::Wild { 4 } else { 2 };
                let repiled = self.ensure_available(amount);
                let cards = self
                    .dealer
                    .populate(self.participants[next.0].deck_mut(), amount);
                self.order_mut().advance(1);
                PlayEffect::ForcedDraw {
                    target: next,
                    cards,
                    repiled,
                }
            }
            Rank::Skip => {
                self.order_mut().advance(1);
                PlayEffect::Skipped { skipped: next }
            }
            Rank::Number(_) => PlayEffect::None,
        }
    }

    /// The validating gameplay entry point: plays the card, then reports
    /// win, order change, UNO and pending color choice, and whether the
    /// caller should advance the turn.
    pub fn play_card_checked(
        &mut self,
        card: Card,
        participant: ParticipantId,
        scores: &mut HighScores,
    ) -> TurnOutcome {
        let was_reversed = self.order().is_reversed();
        let effect = self.play_card(participant, card);

        let hand_left = self.participants[participant.0].deck().len();
        if hand_left == 0 {
            let win = self.win(participant, scores);
            return TurnOutcome {
                effect,
                order_changed: false,
                uno: None,
                awaiting_color: None,
                win: Some(win),
                advance: false,
            };
        }

        let awaiting_color = self.must_choose_color;
        TurnOutcome {
            effect,
            order_changed: was_reversed != self.order().is_reversed(),
            uno: (hand_left == 1).then_some(participant),
            awaiting_color,
            win: None,
            advance: awaiting_color.is_none(),
        }
    }

    /// Fixes the color of the wild that was just played. Only valid while a
    /// color choice is pending; the pending flag is cleared by `advance`.
    pub fn choose_color(&mut self, color: Color) {
        assert!(
            self.must_choose_color.is_some(),
            "no color choice is pending"
        );
        assert!(color != Color::Wild, "a wild cannot be fixed to wild");
        self.last_card = Some(Card::color_only(color));
    }

    /// The single per-turn transition: clears the draw flag and the pending
    /// color choice, moves the order one step and returns the new current
    /// participant. Must run exactly once per completed turn.
    pub fn advance(&mut self) -> ParticipantId {
        self.current_player_has_drawn = false;
        self.must_choose_color = None;
        let next = self.order_mut().advance(1);
        debug!("turn advanced to {}", self.participants[next.0].player());
        next
    }

    fn win(&mut self, winner: ParticipantId, scores: &mut HighScores) -> WinSummary {
        let mut points = 0;
        let mut leftovers = Vec::new();
        for (index, participant) in self.participants.iter().enumerate() {
            points += hand_points(participant.deck());
            if !participant.deck().is_empty() {
                leftovers.push((ParticipantId(index), participant.deck().cards().to_vec()));
            }
        }
        let player = self.participants[winner.0].player().clone();
        let new_high_score = scores.update_high_score(&player, points);
        self.status = GameStatus::Finished {
            winner: Some(winner),
        };
        debug!("{} won with {} points", player, points);
        WinSummary {
            winner,
            points,
            new_high_score,
            leftovers,
        }
    }

    /// Repiles when the pool cannot supply `amount` cards. Returns whether a
    /// repile happened.
    fn ensure_available(&mut self, amount: usize) -> bool {
        if self.dealer.can_draw(amount) {
            return false;
        }
        let last = self.last_card;
        self.dealer.repile(
            self.participants.iter().flat_map(|p| p.deck().cards()),
            last.as_ref(),
        );
        debug!("draw pile exhausted; repiled to {} cards", self.dealer.size());
        true
    }

    // Query surface used by the hosting layer for turn legality.

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_started(&self) -> bool {
        self.status == GameStatus::Started
    }

    pub fn last_card(&self) -> Option<Card> {
        self.last_card
    }

    pub fn current_player_has_drawn(&self) -> bool {
        self.current_player_has_drawn
    }

    pub fn player_must_choose_color(&self) -> Option<ParticipantId> {
        self.must_choose_color
    }

    /// Panics before `start`; querying the order of an unstarted game is a
    /// caller defect.
    pub fn order(&self) -> &PlayerOrder {
        self.order.as_ref().expect("the game has not started")
    }

    fn order_mut(&mut self) -> &mut PlayerOrder {
        self.order.as_mut().expect("the game has not started")
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, id: ParticipantId) -> &Participant {
        &self.participants[id.0]
    }

    pub(crate) fn participant_mut(&mut self, id: ParticipantId) -> &mut Participant {
        &mut self.participants[id.0]
    }

    pub fn find_participant(&self, player: &PlayerId) -> Option<ParticipantId> {
        self.participants
            .iter()
            .position(|p| p.player() == player)
            .map(ParticipantId)
    }

    pub fn dealer(&self) -> &Dealer {
        &self.dealer
    }
}

#[cfg(test)]
impl Game {
    pub(crate) fn set_last_card_for_tests(&mut self, card: Card) {
        self.last_card = Some(card);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dealer::FULL_DECK_SIZE;

    fn started_game(players: &[&str]) -> Game {
        let mut game = Game::new();
        for name in players {
            game.create_participant(PlayerId::from(*name), SeatKind::Human);
        }
        game.start().unwrap();
        game
    }

    fn set_hand(game: &mut Game, id: ParticipantId, cards: &[&str]) {
        let mut deck = Deck::new();
        for s in cards {
            deck.append(s.parse().unwrap());
        }
        *game.participant_mut(id).deck_mut() = deck;
    }

    fn card(s: &str) -> Card {
        s.parse().unwrap()
    }

    #[test]
    fn create_participant_deals_ten_and_is_idempotent() {
        let mut game = Game::new();
        let alice = game.create_participant(PlayerId::from("alice"), SeatKind::Human);
        assert_eq!(game.participant(alice).deck().len(), HAND_SIZE);
        assert_eq!(game.dealer().size(), FULL_DECK_SIZE - HAND_SIZE);
        let again = game.create_participant(PlayerId::from("alice"), SeatKind::Human);
        assert_eq!(alice, again);
        assert_eq!(game.participants().len(), 1);
        assert_eq!(game.dealer().size(), FULL_DECK_SIZE - HAND_SIZE);
    }

    #[test]
    fn start_draws_a_non_wild_opening_card() {
        let game = started_game(&["alice", "bob"]);
        assert!(game.is_started());
        let top = game.last_card().unwrap();
        assert!(!top.is_wild());
        assert_eq!(game.dealer().size(), FULL_DECK_SIZE - 2 * HAND_SIZE - 1);
    }

    #[test]
    fn start_twice_fails() {
        let mut game = started_game(&["alice", "bob"]);
        assert_eq!(game.start(), Err(StartError::AlreadyStarted));
    }

    #[test]
    fn start_without_participants_fails() {
        let mut game = Game::new();
        assert_eq!(game.start(), Err(StartError::NoParticipants));
    }

    #[test]
    fn start_reports_a_missing_opening_card() {
        let mut game = Game::new();
        game.create_participant(PlayerId::from("alice"), SeatKind::Human);
        game.create_participant(PlayerId::from("bob"), SeatKind::Human);
        // drain every remaining non-wild so only wilds are left to open with
        game.dealer.draw(FULL_DECK_SIZE, true);
        assert_eq!(game.start(), Err(StartError::NoOpeningCard));
        assert_eq!(game.status(), GameStatus::NotStarted);
        assert!(game.last_card().is_none());
    }

    #[test]
    fn plain_number_play_changes_top_card_only() {
        let mut game = started_game(&["alice", "bob"]);
        let alice = ParticipantId(0);
        set_hand(&mut game, alice, &["b5", "g3"]);
        game.last_card = Some(card("r5"));

        let mut scores = HighScores::in_memory();
        let outcome = game.play_card_checked(card("b5"), alice, &mut scores);
        assert_eq!(outcome.effect, PlayEffect::None);
        assert!(outcome.advance);
        assert!(outcome.win.is_none());
        assert!(outcome.uno.is_some()); // down to one card
        assert_eq!(game.last_card().unwrap(), card("b5"));
        assert_eq!(game.advance(), ParticipantId(1));
    }

    #[test]
    fn draw_two_deals_and_skips_the_next_player() {
        let mut game = started_game(&["alice", "bob", "carol"]);
        let alice = ParticipantId(0);
        let bob = ParticipantId(1);
        set_hand(&mut game, alice, &["rd", "g3"]);
        game.last_card = Some(card("r5"));
        let bob_hand = game.participant(bob).deck().len();

        let effect = game.play_card(alice, card("rd"));
        match effect {
            PlayEffect::ForcedDraw {
                target,
                cards,
                repiled,
            } => {
                assert_eq!(target, bob);
                assert_eq!(cards.len(), 2);
                assert!(!repiled);
            }
            other => panic!("unexpected effect {:?}", other),
        }
        assert_eq!(game.participant(bob).deck().len(), bob_hand + 2);
        // the played advance skipped bob; the turn advance lands on carol
        assert_eq!(game.advance(), ParticipantId(2));
    }

    #[test]
    fn reverse_toggles_direction_with_three_players() {
        let mut game = started_game(&["alice", "bob", "carol"]);
        let alice = ParticipantId(0);
        set_hand(&mut game, alice, &["rr", "g3"]);
        game.last_card = Some(card("r5"));

        let mut scores = HighScores::in_memory();
        let outcome = game.play_card_checked(card("rr"), alice, &mut scores);
        assert_eq!(outcome.effect, PlayEffect::Reversed);
        assert!(outcome.order_changed);
        assert!(game.order().is_reversed());
        // reversed: the next player is carol
        assert_eq!(game.advance(), ParticipantId(2));
    }

    #[test]
    fn two_player_reverse_acts_as_skip() {
        let mut game = started_game(&["alice", "bob"]);
        let alice = ParticipantId(0);
        let bob = ParticipantId(1);
        set_hand(&mut game, alice, &["rr", "g3"]);
        game.last_card = Some(card("r5"));
        let bob_hand = game.participant(bob).deck().len();

        let effect = game.play_card(alice, card("rr"));
        assert_eq!(effect, PlayEffect::SkippedTwoPlayer { skipped: bob });
        assert!(!game.order().is_reversed());
        assert_eq!(game.participant(bob).deck().len(), bob_hand);
        // the cursor ends up back at alice after the turn advance
        assert_eq!(game.advance(), alice);
    }

    #[test]
    fn skip_passes_over_the_next_player() {
        let mut game = started_game(&["alice", "bob", "carol"]);
        let alice = ParticipantId(0);
        set_hand(&mut game, alice, &["rs", "g3"]);
        game.last_card = Some(card("r5"));

        let effect = game.play_card(alice, card("rs"));
        assert_eq!(
            effect,
            PlayEffect::Skipped {
                skipped: ParticipantId(1)
            }
        );
        assert_eq!(game.advance(), ParticipantId(2));
    }

    #[test]
    fn wild_suspends_the_turn_for_a_color_choice() {
        let mut game = started_game(&["alice", "bob"]);
        let alice = ParticipantId(0);
        set_hand(&mut game, alice, &["w", "g3"]);
        game.last_card = Some(card("r5"));

        let mut scores = HighScores::in_memory();
        let outcome = game.play_card_checked(card("w"), alice, &mut scores);
        assert_eq!(outcome.effect, PlayEffect::None);
        assert_eq!(outcome.awaiting_color, Some(alice));
        assert!(!outcome.advance);

        game.choose_color(Color::Green);
        assert_eq!(game.last_card().unwrap(), Card::color_only(Color::Green));
        game.advance();
        assert_eq!(game.player_must_choose_color(), None);
    }

    #[test]
    fn wild_draw_four_deals_four_and_awaits_color() {
        let mut game = started_game(&["alice", "bob"]);
        let alice = ParticipantId(0);
        let bob = ParticipantId(1);
        set_hand(&mut game, alice, &["wd", "g3"]);
        game.last_card = Some(card("r5"));
        let bob_hand = game.participant(bob).deck().len();

        let mut scores = HighScores::in_memory();
        let outcome = game.play_card_checked(card("wd"), alice, &mut scores);
        match &outcome.effect {
            PlayEffect::ForcedDraw { target, cards, .. } => {
                assert_eq!(*target, bob);
                assert_eq!(cards.len(), 4);
            }
            other => panic!("unexpected effect {:?}", other),
        }
        assert_eq!(game.participant(bob).deck().len(), bob_hand + 4);
        assert_eq!(outcome.awaiting_color, Some(alice));
        assert!(!outcome.advance);
    }

    #[test]
    fn drawing_marks_the_turn_and_repiles_when_empty() {
        let mut game = started_game(&["alice", "bob"]);
        // exhaust the pool
        game.dealer.draw(FULL_DECK_SIZE, false);
        assert!(!game.dealer.can_draw(1));

        let outcome = game.draw();
        assert_eq!(outcome.cards.len(), 1);
        assert!(outcome.repiled);
        assert!(game.current_player_has_drawn());
    }

    #[test]
    fn repile_preserves_the_card_count_invariant() {
        let mut game = started_game(&["alice", "bob"]);
        game.dealer.draw(FULL_DECK_SIZE, false);
        game.draw();

        let hands: usize = game.participants().iter().map(|p| p.deck().len()).sum();
        assert_eq!(game.dealer().size() + hands + 1, FULL_DECK_SIZE);
    }

    #[test]
    fn winning_awards_the_other_hands_points() {
        let mut game = started_game(&["alice", "bob"]);
        let alice = ParticipantId(0);
        set_hand(&mut game, alice, &["g3"]);
        set_hand(&mut game, ParticipantId(1), &["r5", "wd"]);
        game.last_card = Some(card("b3"));

        let mut scores = HighScores::in_memory();
        let outcome = game.play_card_checked(card("g3"), alice, &mut scores);
        let win = outcome.win.expect("alice should have won");
        assert_eq!(win.winner, alice);
        assert_eq!(win.points, 55);
        assert!(win.new_high_score);
        assert_eq!(win.leftovers.len(), 1);
        assert!(!outcome.advance);
        assert_eq!(scores.get_high_score(&PlayerId::from("alice")), 55);
        assert_eq!(
            game.status(),
            GameStatus::Finished {
                winner: Some(alice)
            }
        );
    }

    #[test]
    fn advance_clears_per_turn_state() {
        let mut game = started_game(&["alice", "bob"]);
        let alice = ParticipantId(0);
        set_hand(&mut game, alice, &["w", "g3"]);
        game.last_card = Some(card("r5"));
        game.draw();
        assert!(game.current_player_has_drawn());

        game.play_card(alice, card("w"));
        assert_eq!(game.player_must_choose_color(), Some(alice));
        game.choose_color(Color::Red);

        let next = game.advance();
        assert_eq!(next, ParticipantId(1));
        assert!(!game.current_player_has_drawn());
        assert_eq!(game.player_must_choose_color(), None);
    }

    #[test]
    #[should_panic(expected = "not in the participant's deck")]
    fn playing_an_absent_card_is_a_contract_violation() {
        let mut game = started_game(&["alice", "bob"]);
        let alice = ParticipantId(0);
        set_hand(&mut game, alice, &["g3"]);
        game.play_card(alice, card("r9"));
    }

    #[test]
    fn stop_finishes_without_a_winner() {
        let mut game = started_game(&["alice", "bob"]);
        game.stop();
        assert_eq!(game.status(), GameStatus::Finished { winner: None });
        assert!(!game.is_started());
    }
}
