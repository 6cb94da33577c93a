use crate::deck::Deck;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque player identity supplied by the host. The engine only compares it
/// for equality; display names are the host's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Index of a participant in the game's seat list. Stable for the lifetime
/// of the game; participants are never removed mid-game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub(crate) usize);

impl ParticipantId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeatKind {
    Human,
    Bot,
}

/// A player seated in one running game, owning exactly one deck.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    player: PlayerId,
    kind: SeatKind,
    deck: Deck,
}

impl Participant {
    pub fn new(player: PlayerId, kind: SeatKind, deck: Deck) -> Self {
        Self { player, kind, deck }
    }

    pub fn player(&self) -> &PlayerId {
        &self.player
    }

    pub fn kind(&self) -> SeatKind {
        self.kind
    }

    pub fn is_bot(&self) -> bool {
        self.kind == SeatKind::Bot
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn deck_mut(&mut self) -> &mut Deck {
        &mut self.deck
    }
}
