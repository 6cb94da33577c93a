use crate::participant::ParticipantId;
use serde::{Deserialize, Serialize};

/// Circular, directionally-reversible cursor over the seated participants.
/// The seat list is frozen when the game starts; next/previous/current are
/// plain index arithmetic modulo the seat count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerOrder {
    seats: Vec<ParticipantId>,
    cursor: usize,
    reversed: bool,
}

impl PlayerOrder {
    pub fn new(seats: Vec<ParticipantId>) -> Self {
        assert!(!seats.is_empty(), "player order requires at least one seat");
        Self {
            seats,
            cursor: 0,
            reversed: false,
        }
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn current(&self) -> ParticipantId {
        self.seats[self.cursor]
    }

    /// Peeks at the participant one step ahead without moving the cursor.
    pub fn peek_next(&self) -> ParticipantId {
        self.seats[self.step(self.cursor, !self.reversed)]
    }

    /// Peeks at the participant one step behind without moving the cursor.
    pub fn peek_previous(&self) -> ParticipantId {
        self.seats[self.step(self.cursor, self.reversed)]
    }

    /// Moves the cursor `times` steps in the active direction and returns the
    /// new current participant.
    pub fn advance(&mut self, times: usize) -> ParticipantId {
        for _ in 0..times {
            self.cursor = self.step(self.cursor, !self.reversed);
        }
        self.current()
    }

    /// Toggles direction without moving the cursor.
    pub fn reverse(&mut self) {
        self.reversed = !self.reversed;
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Seats starting from the current participant, in play direction.
    pub fn in_play_order(&self) -> Vec<ParticipantId> {
        let mut seats = Vec::with_capacity(self.seats.len());
        let mut cursor = self.cursor;
        for _ in 0..self.seats.len() {
            seats.push(self.seats[cursor]);
            cursor = self.step(cursor, !self.reversed);
        }
        seats
    }

    fn step(&self, from: usize, forward: bool) -> usize {
        let len = self.seats.len();
        if forward {
            (from + 1) % len
        } else {
            (from + len - 1) % len
        }
    }
}
