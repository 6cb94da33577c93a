use crate::autoplay::{AutoMove, AutoPlayer};
use crate::card::{Card, Color};
use crate::dealer;
use crate::game::{Game, GameStatus, PlayEffect, StartError, TurnOutcome};
use crate::participant::{ParticipantId, PlayerId, SeatKind};
use crate::scores::HighScores;
use crate::timeout::{TimeoutController, TimerToken, DEFAULT_TURN_TIMEOUT};
use log::info;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Host-supplied policy knobs. The participant floor is deliberately not a
/// `Game` invariant.
#[derive(Debug, Clone)]
pub struct TableConfig {
    pub min_participants: usize,
    pub turn_timeout: Duration,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            min_participants: 2,
            turn_timeout: DEFAULT_TURN_TIMEOUT,
        }
    }
}

/// Outbound notifications for the hosting chat layer to render. The engine
/// never formats user-facing text itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Notification {
    GameOpened { player: PlayerId },
    PlayerJoined { player: PlayerId },
    BotJoined { player: PlayerId },
    GameStarted { participants: Vec<PlayerId>, top_card: Card },
    TurnAnnounce { player: PlayerId, top_card: Card },
    /// Private: the owner's full hand, sorted.
    HandNotice { player: PlayerId, cards: Vec<Card>, colored: bool },
    CardPlayed { player: PlayerId, card: Card },
    Drew { player: PlayerId },
    Passed { player: PlayerId },
    /// The discard pile was shuffled back into the draw pile.
    Repiled,
    OrderReversed { order: Vec<PlayerId> },
    TurnSkipped { player: PlayerId, two_player_rule: bool },
    /// Public: a Draw Two / Wild Draw Four penalty.
    DrewPenalty { player: PlayerId, count: usize },
    /// Private: cards just added to the owner's hand, sorted.
    NewCards { player: PlayerId, cards: Vec<Card>, colored: bool },
    Uno { player: PlayerId },
    AwaitingColor { player: PlayerId },
    ColorChosen { player: PlayerId, color: Color },
    /// The current player stalled or is a bot; their turn is being played
    /// automatically.
    AutoPlaying { player: PlayerId },
    Win { winner: PlayerId, points: u32, leftovers: Vec<(PlayerId, Vec<Card>)> },
    NewHighScore { player: PlayerId, points: u32 },
    GameStopped,
}

/// Expected rule violations, reported as values. The offending player keeps
/// their turn and the idle timer is re-armed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Rejection {
    GameAlreadyStarted,
    GameNotStarted,
    NotAParticipant,
    AlreadyJoined,
    NotYourTurn,
    AwaitingColorChoice { chooser: PlayerId },
    NoColorPending,
    NotColorChooser { chooser: PlayerId },
    InvalidColor,
    UnknownCard,
    CardNotHeld,
    IncompatibleCard,
    WildDrawFourWithAlternative,
    AlreadyDrawn,
    MustDrawFirst,
    NotEnoughParticipants { required: usize },
    NoOpeningCard,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::GameAlreadyStarted => write!(f, "a game is already in progress"),
            Rejection::GameNotStarted => write!(f, "a game has not been started"),
            Rejection::NotAParticipant => write!(f, "you are not a participant"),
            Rejection::AlreadyJoined => write!(f, "you are already a participant"),
            Rejection::NotYourTurn => write!(f, "it is not your turn"),
            Rejection::AwaitingColorChoice { chooser } => {
                write!(f, "waiting for {} to pick a color (r/g/b/y)", chooser)
            }
            Rejection::NoColorPending => write!(f, "a color cannot be picked now"),
            Rejection::NotColorChooser { chooser } => {
                write!(f, "{} must choose the new color", chooser)
            }
            Rejection::InvalidColor => write!(f, "that is not a valid color (r/g/b/y)"),
            Rejection::UnknownCard => write!(f, "that is not a card"),
            Rejection::CardNotHeld => write!(f, "you do not have that card"),
            Rejection::IncompatibleCard => write!(f, "that is not a valid move"),
            Rejection::WildDrawFourWithAlternative => {
                write!(f, "play your other playable cards before a Wild Draw Four")
            }
            Rejection::AlreadyDrawn => write!(f, "you cannot draw a card twice"),
            Rejection::MustDrawFirst => write!(f, "you need to draw a card first"),
            Rejection::NotEnoughParticipants { required } => {
                write!(f, "at least {} participants are required", required)
            }
            Rejection::NoOpeningCard => {
                write!(f, "the draw pile cannot supply an opening card")
            }
        }
    }
}

impl std::error::Error for Rejection {}

pub type ActionResult = Result<Vec<Notification>, Rejection>;

enum TurnEnd {
    Advance,
    Finished,
}

/// One running game plus its idle timer and auto-play policy; the surface
/// the hosting command layer drives. All actions are serialized through the
/// game lock, so concurrent commands cannot interleave turn transitions.
pub struct GameTable {
    game: Mutex<Game>,
    scores: Arc<Mutex<HighScores>>,
    timeout: TimeoutController,
    auto: Box<dyn AutoPlayer>,
    sink: UnboundedSender<Notification>,
    config: TableConfig,
}

impl GameTable {
    pub fn new(
        config: TableConfig,
        scores: Arc<Mutex<HighScores>>,
        auto: Box<dyn AutoPlayer>,
        sink: UnboundedSender<Notification>,
    ) -> Arc<Self> {
        Arc::new(Self {
            game: Mutex::new(Game::new()),
            scores,
            timeout: TimeoutController::new(config.turn_timeout),
            auto,
            sink,
            config,
        })
    }

    /// Opens a table and seats the initiating player.
    pub fn new_game(
        initiator: PlayerId,
        config: TableConfig,
        scores: Arc<Mutex<HighScores>>,
        auto: Box<dyn AutoPlayer>,
        sink: UnboundedSender<Notification>,
    ) -> (Arc<Self>, Vec<Notification>) {
        let table = Self::new(config, scores, auto, sink);
        let mut game = table.game.lock().unwrap();
        let seat = game.create_participant(initiator.clone(), SeatKind::Human);
        info!("{} opened a game", initiator);
        let notes = vec![
            Notification::GameOpened { player: initiator },
            hand_notice(&game, seat),
        ];
        drop(game);
        (table, notes)
    }

    /// Seats a player in the not-yet-started game.
    pub fn join(&self, player: PlayerId) -> ActionResult {
        let mut game = self.game.lock().unwrap();
        if game.status() != GameStatus::NotStarted {
            return Err(Rejection::GameAlreadyStarted);
        }
        if game.find_participant(&player).is_some() {
            return Err(Rejection::AlreadyJoined);
        }
        info!("{} joined", player);
        let seat = game.create_participant(player.clone(), SeatKind::Human);
        Ok(vec![
            Notification::PlayerJoined { player },
            hand_notice(&game, seat),
        ])
    }

    /// Fills a seat with a bot.
    pub fn add_bot(&self) -> ActionResult {
        let mut game = self.game.lock().unwrap();
        if game.status() != GameStatus::NotStarted {
            return Err(Rejection::GameAlreadyStarted);
        }
        let player = next_bot_id(&game);
        info!("bot {} joined", player);
        game.create_participant(player.clone(), SeatKind::Bot);
        Ok(vec![Notification::BotJoined { player }])
    }

    /// Starts the game. A lone human gets a bot opponent; any stricter
    /// participant floor comes from the table config.
    pub fn start(self: &Arc<Self>) -> ActionResult {
        let mut game = self.game.lock().unwrap();
        if game.status() != GameStatus::NotStarted {
            return Err(Rejection::GameAlreadyStarted);
        }
        let mut notes = Vec::new();
        if game.participants().len() == 1 {
            let player = next_bot_id(&game);
            game.create_participant(player.clone(), SeatKind::Bot);
            notes.push(Notification::BotJoined { player });
        }
        if game.participants().len() < self.config.min_participants {
            return Err(Rejection::NotEnoughParticipants {
                required: self.config.min_participants,
            });
        }
        game.start().map_err(|e| match e {
            StartError::AlreadyStarted => Rejection::GameAlreadyStarted,
            StartError::NoParticipants => Rejection::NotEnoughParticipants {
                required: self.config.min_participants,
            },
            StartError::NoOpeningCard => Rejection::NoOpeningCard,
        })?;
        info!(
            "game started with {} participants",
            game.participants().len()
        );
        notes.push(Notification::GameStarted {
            participants: game.participants().iter().map(|p| p.player().clone()).collect(),
            top_card: game.last_card().expect("started game has a top card"),
        });
        notes.push(turn_announce(&game));
        self.drive_turn(&mut game, &mut notes);
        Ok(notes)
    }

    /// Plays a card on behalf of `player`, given in canonical string form.
    pub fn play(self: &Arc<Self>, player: &PlayerId, card: &str) -> ActionResult {
        let mut game = self.game.lock().unwrap();
        let seat = current_turn_checked(&game, player)?;
        self.timeout.reset_timers();

        let card: Card = match card.trim().to_lowercase().parse() {
            Ok(card) if dealer::is_valid_card(&card) => card,
            _ => return self.rearm_rejected(Rejection::UnknownCard),
        };
        if !game.participant(seat).deck().contains(&card) {
            return self.rearm_rejected(Rejection::CardNotHeld);
        }
        let top = game.last_card().expect("started game has a top card");
        if !card.compatible(&top) {
            return self.rearm_rejected(Rejection::IncompatibleCard);
        }
        if card == Card::wild_draw_four() {
            let has_alternative = game
                .participant(seat)
                .deck()
                .valid_cards(&top)
                .iter()
                .any(|c| !c.is_wild());
            if has_alternative {
                return self.rearm_rejected(Rejection::WildDrawFourWithAlternative);
            }
        }

        info!("{} plays {}", player, card);
        let outcome = {
            let mut scores = self.scores.lock().unwrap();
            game.play_card_checked(card, seat, &mut scores)
        };
        let mut notes = Vec::new();
        push_play_notes(&game, player.clone(), card, &outcome, &mut notes);
        if outcome.win.is_some() {
            return Ok(notes);
        }
        if outcome.awaiting_color.is_some() {
            self.arm_timer();
            return Ok(notes);
        }
        self.advance_notify(&mut game, &mut notes);
        Ok(notes)
    }

    /// Draws one card for `player`; their turn continues.
    pub fn draw(self: &Arc<Self>, player: &PlayerId) -> ActionResult {
        let mut game = self.game.lock().unwrap();
        let seat = current_turn_checked(&game, player)?;
        self.timeout.reset_timers();
        if game.current_player_has_drawn() {
            return self.rearm_rejected(Rejection::AlreadyDrawn);
        }

        info!("{} draws a card", player);
        let outcome = game.draw();
        let mut notes = Vec::new();
        if outcome.repiled {
            notes.push(Notification::Repiled);
        }
        notes.push(Notification::Drew {
            player: player.clone(),
        });
        notes.push(Notification::NewCards {
            player: player.clone(),
            cards: sorted(&outcome.cards),
            colored: game.participant(seat).deck().colored_display(),
        });
        self.arm_timer();
        Ok(notes)
    }

    /// Passes the turn; only legal after drawing.
    pub fn pass(self: &Arc<Self>, player: &PlayerId) -> ActionResult {
        let mut game = self.game.lock().unwrap();
        current_turn_checked(&game, player)?;
        self.timeout.reset_timers();
        if !game.current_player_has_drawn() {
            return self.rearm_rejected(Rejection::MustDrawFirst);
        }

        info!("{} passes", player);
        let mut notes = vec![Notification::Passed {
            player: player.clone(),
        }];
        self.advance_notify(&mut game, &mut notes);
        Ok(notes)
    }

    /// Fixes the color of the wild that suspended the turn.
    pub fn choose_color(self: &Arc<Self>, player: &PlayerId, color: &str) -> ActionResult {
        let mut game = self.game.lock().unwrap();
        let seat = participant_checked(&game, player)?;
        let Some(chooser) = game.player_must_choose_color() else {
            return Err(Rejection::NoColorPending);
        };
        if chooser != seat {
            return Err(Rejection::NotColorChooser {
                chooser: player_of(&game, chooser),
            });
        }
        self.timeout.reset_timers();

        let color = match parse_choosable_color(color) {
            Some(color) => color,
            None => return self.rearm_rejected(Rejection::InvalidColor),
        };
        info!("{} picks {:?}", player, color);
        game.choose_color(color);
        let mut notes = vec![Notification::ColorChosen {
            player: player.clone(),
            color,
        }];
        self.advance_notify(&mut game, &mut notes);
        Ok(notes)
    }

    /// Aborts the game (or the lobby) without a winner.
    pub fn stop(&self) -> ActionResult {
        self.timeout.reset_timers();
        let mut game = self.game.lock().unwrap();
        if matches!(game.status(), GameStatus::Finished { .. }) {
            return Err(Rejection::GameNotStarted);
        }
        game.stop();
        Ok(vec![Notification::GameStopped])
    }

    /// The player's current hand, sorted.
    pub fn hand(&self, player: &PlayerId) -> Result<Vec<Card>, Rejection> {
        let game = self.game.lock().unwrap();
        let seat = game
            .find_participant(player)
            .ok_or(Rejection::NotAParticipant)?;
        Ok(sorted(game.participant(seat).deck().cards()))
    }

    /// The player's legal moves against the current top card, sorted.
    pub fn valid_moves(&self, player: &PlayerId) -> Result<Vec<Card>, Rejection> {
        let game = self.game.lock().unwrap();
        let seat = participant_checked(&game, player)?;
        let top = game.last_card().expect("started game has a top card");
        Ok(sorted(&game.participant(seat).deck().valid_cards(&top)))
    }

    /// Toggles the player's colored-display preference, returning the new
    /// setting.
    pub fn toggle_colors(&self, player: &PlayerId) -> Result<bool, Rejection> {
        let mut game = self.game.lock().unwrap();
        let seat = game
            .find_participant(player)
            .ok_or(Rejection::NotAParticipant)?;
        let deck = game.participant_mut(seat).deck_mut();
        deck.set_colored_display(!deck.colored_display());
        Ok(deck.colored_display())
    }

    pub fn status(&self) -> GameStatus {
        self.game.lock().unwrap().status()
    }

    pub fn is_started(&self) -> bool {
        self.game.lock().unwrap().is_started()
    }

    /// Whose turn it is, once started.
    pub fn current_player(&self) -> Option<PlayerId> {
        let game = self.game.lock().unwrap();
        if !game.is_started() {
            return None;
        }
        Some(player_of(&game, game.order().current()))
    }

    /// Advances the turn, announces it, and keeps going while bot seats are
    /// up; arms the idle timer once a human is reached.
    fn advance_notify(self: &Arc<Self>, game: &mut Game, notes: &mut Vec<Notification>) {
        game.advance();
        notes.push(turn_announce(game));
        self.drive_turn(game, notes);
    }

    fn drive_turn(self: &Arc<Self>, game: &mut Game, notes: &mut Vec<Notification>) {
        loop {
            if !game.is_started() {
                break;
            }
            let current = game.order().current();
            if game.participant(current).is_bot() {
                notes.push(Notification::AutoPlaying {
                    player: player_of(game, current),
                });
                match self.auto_turn(game, notes) {
                    TurnEnd::Advance => {
                        game.advance();
                        notes.push(turn_announce(game));
                    }
                    TurnEnd::Finished => break,
                }
            } else {
                notes.push(hand_notice(game, current));
                self.arm_timer();
                break;
            }
        }
    }

    /// Takes one whole turn with the auto-play policy: zero or one draw,
    /// then a play, pass or color choice.
    fn auto_turn(&self, game: &mut Game, notes: &mut Vec<Notification>) -> TurnEnd {
        loop {
            let actor = game
                .player_must_choose_color()
                .unwrap_or_else(|| game.order().current());
            let player = player_of(game, actor);
            match self.auto.choose_move(game, actor) {
                AutoMove::ChooseColor(color) => {
                    game.choose_color(color);
                    notes.push(Notification::ColorChosen { player, color });
                    return TurnEnd::Advance;
                }
                AutoMove::Play(card) => {
                    let outcome = {
                        let mut scores = self.scores.lock().unwrap();
                        game.play_card_checked(card, actor, &mut scores)
                    };
                    push_play_notes(game, player, card, &outcome, notes);
                    if outcome.win.is_some() {
                        return TurnEnd::Finished;
                    }
                    if outcome.awaiting_color.is_some() {
                        continue;
                    }
                    return TurnEnd::Advance;
                }
                AutoMove::Draw => {
                    let outcome = game.draw();
                    if outcome.repiled {
                        notes.push(Notification::Repiled);
                    }
                    notes.push(Notification::Drew { player });
                }
                AutoMove::Pass => {
                    notes.push(Notification::Passed { player });
                    return TurnEnd::Advance;
                }
            }
        }
    }

    fn arm_timer(self: &Arc<Self>) {
        let table = Arc::clone(self);
        self.timeout.set_timer(move |token| async move {
            table.on_timeout(token);
        });
    }

    /// Fired when the current human stalls: their whole turn is played
    /// automatically and the results go out through the notification sink.
    fn on_timeout(self: Arc<Self>, token: TimerToken) {
        let mut game = self.game.lock().unwrap();
        // an action that raced the expiry has reset or re-armed; aborting
        // could not stop this task once fired, so the token check under the
        // game lock is the authoritative cancel
        if !self.timeout.is_current(token) {
            return;
        }
        self.timeout.reset_timers();
        if !game.is_started() {
            return;
        }
        let current = game.order().current();
        info!("{} timed out; autoplaying", player_of(&game, current));
        let mut notes = vec![Notification::AutoPlaying {
            player: player_of(&game, current),
        }];
        match self.auto_turn(&mut game, &mut notes) {
            TurnEnd::Advance => self.advance_notify(&mut game, &mut notes),
            TurnEnd::Finished => {}
        }
        drop(game);
        for note in notes {
            let _ = self.sink.send(note);
        }
    }

    fn rearm_rejected<T>(self: &Arc<Self>, rejection: Rejection) -> Result<T, Rejection> {
        self.arm_timer();
        Err(rejection)
    }
}

fn participant_checked(game: &Game, player: &PlayerId) -> Result<ParticipantId, Rejection> {
    if !game.is_started() {
        return Err(Rejection::GameNotStarted);
    }
    game.find_participant(player)
        .ok_or(Rejection::NotAParticipant)
}

fn current_turn_checked(game: &Game, player: &PlayerId) -> Result<ParticipantId, Rejection> {
    let seat = participant_checked(game, player)?;
    if let Some(chooser) = game.player_must_choose_color() {
        return Err(Rejection::AwaitingColorChoice {
            chooser: player_of(game, chooser),
        });
    }
    if game.order().current() != seat {
        return Err(Rejection::NotYourTurn);
    }
    Ok(seat)
}

fn player_of(game: &Game, seat: ParticipantId) -> PlayerId {
    game.participant(seat).player().clone()
}

fn next_bot_id(game: &Game) -> PlayerId {
    let bots = game.participants().iter().filter(|p| p.is_bot()).count();
    PlayerId::new(format!("bot-{}", bots + 1))
}

fn sorted(cards: &[Card]) -> Vec<Card> {
    let mut cards = cards.to_vec();
    cards.sort_by_key(|card| card.to_string());
    cards
}

fn turn_announce(game: &Game) -> Notification {
    Notification::TurnAnnounce {
        player: player_of(game, game.order().current()),
        top_card: game.last_card().expect("started game has a top card"),
    }
}

fn hand_notice(game: &Game, seat: ParticipantId) -> Notification {
    let deck = game.participant(seat).deck();
    Notification::HandNotice {
        player: player_of(game, seat),
        cards: sorted(deck.cards()),
        colored: deck.colored_display(),
    }
}

fn parse_choosable_color(input: &str) -> Option<Color> {
    let input = input.trim().to_lowercase();
    let mut chars = input.chars();
    let color = Color::from_letter(chars.next()?)?;
    if chars.next().is_some() || color == Color::Wild {
        return None;
    }
    Some(color)
}

fn push_play_notes(
    game: &Game,
    player: PlayerId,
    card: Card,
    outcome: &TurnOutcome,
    notes: &mut Vec<Notification>,
) {
    notes.push(Notification::CardPlayed { player, card });
    match &outcome.effect {
        PlayEffect::None | PlayEffect::Reversed => {}
        PlayEffect::SkippedTwoPlayer { skipped } => notes.push(Notification::TurnSkipped {
            player: player_of(game, *skipped),
            two_player_rule: true,
        }),
        PlayEffect::Skipped { skipped } => notes.push(Notification::TurnSkipped {
            player: player_of(game, *skipped),
            two_player_rule: false,
        }),
        PlayEffect::ForcedDraw {
            target,
            cards,
            repiled,
        } => {
            if *repiled {
                notes.push(Notification::Repiled);
            }
            notes.push(Notification::DrewPenalty {
                player: player_of(game, *target),
                count: cards.len(),
            });
            notes.push(Notification::NewCards {
                player: player_of(game, *target),
                cards: sorted(cards),
                colored: game.participant(*target).deck().colored_display(),
            });
            notes.push(Notification::TurnSkipped {
                player: player_of(game, *target),
                two_player_rule: false,
            });
        }
    }
    if outcome.order_changed {
        notes.push(Notification::OrderReversed {
            order: game
                .order()
                .in_play_order()
                .into_iter()
                .map(|seat| player_of(game, seat))
                .collect(),
        });
    }
    if let Some(seat) = outcome.uno {
        notes.push(Notification::Uno {
            player: player_of(game, seat),
        });
    }
    if let Some(win) = &outcome.win {
        notes.push(Notification::Win {
            winner: player_of(game, win.winner),
            points: win.points,
            leftovers: win
                .leftovers
                .iter()
                .map(|(seat, cards)| (player_of(game, *seat), sorted(cards)))
                .collect(),
        });
        if win.new_high_score {
            notes.push(Notification::NewHighScore {
                player: player_of(game, win.winner),
                points: win.points,
            });
        }
    }
    if let Some(seat) = outcome.awaiting_color {
        notes.push(Notification::AwaitingColor {
            player: player_of(game, seat),
        });
    }
}
