//! A rules engine for an Uno-style card game, meant to sit behind a chat or
//! command frontend. The engine validates moves, runs turn order, times out
//! idle players and keeps persistent high scores; rendering and transport
//! are the host's job.

pub mod autoplay;
pub mod card;
pub mod dealer;
pub mod deck;
pub mod game;
pub mod order;
pub mod participant;
pub mod scores;
pub mod table;
pub mod timeout;

pub use card::{Card, Color, ParseCardError, Rank};
pub use dealer::Dealer;
pub use deck::Deck;
pub use game::{Game, GameStatus};
pub use participant::{Participant, ParticipantId, PlayerId, SeatKind};
pub use scores::{HighScores, JsonScoreStore};
pub use table::{GameTable, Notification, Rejection, TableConfig};
