use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
    Wild,
}

impl Color {
    /// The four colors a player may fix a wild card to.
    pub const CHOOSABLE: [Color; 4] = [Color::Red, Color::Green, Color::Blue, Color::Yellow];

    pub fn letter(self) -> char {
        match self {
            Color::Red => 'r',
            Color::Green => 'g',
            Color::Blue => 'b',
            Color::Yellow => 'y',
            Color::Wild => 'w',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'r' => Some(Color::Red),
            'g' => Some(Color::Green),
            'b' => Some(Color::Blue),
            'y' => Some(Color::Yellow),
            'w' => Some(Color::Wild),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "Red",
            Color::Green => "Green",
            Color::Blue => "Blue",
            Color::Yellow => "Yellow",
            Color::Wild => "Wild",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    Number(u8),
    Skip,
    Reverse,
    Draw,
}

impl Rank {
    pub fn letter(self) -> char {
        match self {
            Rank::Number(n) => (b'0' + n) as char,
            Rank::Skip => 's',
            Rank::Reverse => 'r',
            Rank::Draw => 'd',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            '0'..='9' => Some(Rank::Number(letter as u8 - b'0')),
            's' => Some(Rank::Skip),
            'r' => Some(Rank::Reverse),
            'd' => Some(Rank::Draw),
            _ => None,
        }
    }

    pub fn name(self) -> String {
        match self {
            Rank::Number(n) => n.to_string(),
            Rank::Skip => "Skip".to_string(),
            Rank::Reverse => "Reverse".to_string(),
            Rank::Draw => "Draw Two".to_string(),
        }
    }
}

/// An immutable card value. A `rank` of `None` marks a wild whose color has
/// not been fixed yet, or the transient color-only card that fixes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub color: Color,
    pub rank: Option<Rank>,
}

impl Card {
    pub fn new(color: Color, rank: Rank) -> Self {
        Self {
            color,
            rank: Some(rank),
        }
    }

    /// A rank-less card: `w` for an unfixed wild, or a bare color card
    /// synthesized when a wild's color is chosen.
    pub fn color_only(color: Color) -> Self {
        Self { color, rank: None }
    }

    pub fn wild() -> Self {
        Self::color_only(Color::Wild)
    }

    pub fn wild_draw_four() -> Self {
        Self::new(Color::Wild, Rank::Draw)
    }

    pub fn is_wild(&self) -> bool {
        self.color == Color::Wild
    }

    /// Two cards are compatible if either is wild-colored, or their colors
    /// match, or their ranks match. An absent rank only equals an absent rank.
    pub fn compatible(&self, other: &Card) -> bool {
        if self.color == Color::Wild || other.color == Color::Wild {
            return true;
        }
        self.color == other.color || self.rank == other.rank
    }

    /// Human-readable name, e.g. `Red 5`, `Green Skip`, `Wild Draw Four`.
    pub fn human_name(&self) -> String {
        if *self == Card::wild_draw_four() {
            return "Wild Draw Four".to_string();
        }
        match self.rank {
            Some(rank) => format!("{} {}", self.color.name(), rank.name()),
            None => self.color.name().to_string(),
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.color.letter())?;
        if let Some(rank) = self.rank {
            write!(f, "{}", rank.letter())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCardError(pub String);

impl fmt::Display for ParseCardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a card: {:?}", self.0)
    }
}

impl std::error::Error for ParseCardError {}

impl FromStr for Card {
    type Err = ParseCardError;

    /// Parses the canonical one- or two-letter form, e.g. `r5`, `gs`, `wd`, `w`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseCardError(s.to_string());
        let mut chars = s.chars();
        let color = chars.next().and_then(Color::from_letter).ok_or_else(err)?;
        let rank = match chars.next() {
            Some(letter) => Some(Rank::from_letter(letter).ok_or_else(err)?),
            None => None,
        };
        if chars.next().is_some() {
            return Err(err());
        }
        Ok(Card { color, rank })
    }
}
