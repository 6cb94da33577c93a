use crate::card::{Card, Color, Rank};
use crate::deck::Deck;
use crate::participant::PlayerId;
use log::{error, warn};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Point value of a single leftover card: wilds 50, action cards 20,
/// numbers their face value.
pub fn card_points(card: &Card) -> u32 {
    if card.color == Color::Wild {
        return 50;
    }
    match card.rank {
        Some(Rank::Number(n)) => u32::from(n),
        Some(Rank::Skip) | Some(Rank::Reverse) | Some(Rank::Draw) => 20,
        None => 0,
    }
}

/// Total point value of a leftover hand.
pub fn hand_points(deck: &Deck) -> u32 {
    deck.cards().iter().map(card_points).sum()
}

/// Persistence contract for high scores. `load_all` is consulted once at
/// construction; `save_one` runs after every accepted update.
pub trait ScoreStore: Send {
    fn load_all(&mut self) -> io::Result<HashMap<PlayerId, u32>>;
    fn save_one(&mut self, player: &PlayerId, points: u32) -> io::Result<()>;
}

/// Stores the whole score map as one JSON file.
#[derive(Debug)]
pub struct JsonScoreStore {
    path: PathBuf,
}

impl JsonScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ScoreStore for JsonScoreStore {
    fn load_all(&mut self) -> io::Result<HashMap<PlayerId, u32>> {
        match fs::read_to_string(&self.path) {
            Ok(json) => serde_json::from_str(&json)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e),
        }
    }

    fn save_one(&mut self, player: &PlayerId, points: u32) -> io::Result<()> {
        let mut scores = self.load_all()?;
        scores.insert(player.clone(), points);
        let json = serde_json::to_string_pretty(&scores)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, json)
    }
}

/// Discards writes; used for tests and throwaway games.
#[derive(Debug, Default)]
pub struct MemoryScoreStore;

impl ScoreStore for MemoryScoreStore {
    fn load_all(&mut self) -> io::Result<HashMap<PlayerId, u32>> {
        Ok(HashMap::new())
    }

    fn save_one(&mut self, _player: &PlayerId, _points: u32) -> io::Result<()> {
        Ok(())
    }
}

/// Per-player best score ever recorded. Monotonically non-decreasing;
/// updated only on game completion.
pub struct HighScores {
    scores: HashMap<PlayerId, u32>,
    store: Box<dyn ScoreStore>,
}

impl HighScores {
    pub fn new(mut store: Box<dyn ScoreStore>) -> Self {
        let scores = match store.load_all() {
            Ok(scores) => scores,
            Err(e) => {
                warn!("could not load high scores, starting empty: {}", e);
                HashMap::new()
            }
        };
        Self { scores, store }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryScoreStore))
    }

    pub fn get_high_score(&self, player: &PlayerId) -> u32 {
        self.scores.get(player).copied().unwrap_or(0)
    }

    /// Replaces and persists the stored score iff `points` beats the current
    /// record. Returns whether an update occurred.
    pub fn update_high_score(&mut self, player: &PlayerId, points: u32) -> bool {
        if points <= self.get_high_score(player) {
            return false;
        }
        self.scores.insert(player.clone(), points);
        if let Err(e) = self.store.save_one(player, points) {
            error!("failed to persist high score for {}: {}", player, e);
        }
        true
    }

    /// The top `n` scores, highest first. Ties break on player id so the
    /// listing is stable.
    pub fn top(&self, n: usize) -> Vec<(PlayerId, u32)> {
        let mut all: Vec<(PlayerId, u32)> =
            self.scores.iter().map(|(p, s)| (p.clone(), *s)).collect();
        all.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));
        all.truncate(n);
        all
    }
}

impl std::fmt::Debug for HighScores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HighScores")
            .field("scores", &self.scores)
            .finish()
    }
}
