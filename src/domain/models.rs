use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Durable identifier of a game, shared between the session registry and the store.
pub type GameId = Uuid;
/// Identifier of one live websocket connection.
pub type ConnId = Uuid;
/// Caller-supplied identity token. Opaque to the server.
pub type UserId = String;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(&self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl From<shakmaty::Color> for Color {
    fn from(c: shakmaty::Color) -> Self {
        match c {
            shakmaty::Color::White => Color::White,
            shakmaty::Color::Black => Color::Black,
        }
    }
}

impl From<Color> for shakmaty::Color {
    fn from(c: Color) -> Self {
        match c {
            Color::White => shakmaty::Color::White,
            Color::Black => shakmaty::Color::Black,
        }
    }
}

/// Client-facing difficulty tier for single-player games.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// Engine strength tier. One more rung than [`Difficulty`] exposes, so the
/// top setting stays available to embedders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strength {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl Strength {
    pub fn depth(&self) -> u8 {
        match self {
            Strength::Beginner => 1,
            Strength::Intermediate => 2,
            Strength::Advanced => 3,
            Strength::Expert => 4,
        }
    }

    pub fn thinking_time(&self) -> Duration {
        match self {
            Strength::Beginner => Duration::from_millis(500),
            Strength::Intermediate => Duration::from_millis(1000),
            Strength::Advanced => Duration::from_millis(1500),
            Strength::Expert => Duration::from_millis(2000),
        }
    }
}

impl From<Difficulty> for Strength {
    fn from(d: Difficulty) -> Self {
        match d {
            Difficulty::Easy => Strength::Beginner,
            Difficulty::Medium => Strength::Intermediate,
            Difficulty::Hard => Strength::Advanced,
        }
    }
}

/// A move as submitted over the wire: coordinate squares plus an optional
/// promotion tag. Validation happens against the live position, not here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePayload {
    pub from: String,
    pub to: String,
    pub promotion: Option<String>,
}

impl MovePayload {
    pub fn new(from: &str, to: &str, promotion: Option<&str>) -> Self {
        MovePayload {
            from: from.to_string(),
            to: to.to_string(),
            promotion: promotion.map(str::to_string),
        }
    }

    /// The promotion tag as a lowercase piece letter, if present and valid.
    /// Anything outside q/r/b/n is treated as absent.
    pub fn promotion_char(&self) -> Option<char> {
        match self.promotion.as_deref() {
            Some("q") => Some('q'),
            Some("r") => Some('r'),
            Some("b") => Some('b'),
            Some("n") => Some('n'),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Checkmate,
    Stalemate,
    ThreefoldRepetition,
    InsufficientMaterial,
    FiftyMoveRule,
}

/// Terminal verdict of a finished game. `winner` is `None` for draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    pub winner: Option<Color>,
    pub reason: EndReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_opponent_flips() {
        assert_eq!(Color::White.opponent(), Color::Black);
        assert_eq!(Color::Black.opponent(), Color::White);
    }

    #[test]
    fn difficulty_parses_known_tiers_only() {
        assert_eq!(Difficulty::parse("easy"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::parse("hard"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse("EXPERT"), None);
        assert_eq!(Difficulty::parse(""), None);
    }

    #[test]
    fn strength_depth_increases_per_tier() {
        assert_eq!(Strength::Beginner.depth(), 1);
        assert_eq!(Strength::Expert.depth(), 4);
        assert!(Strength::from(Difficulty::Hard).depth() > Strength::from(Difficulty::Easy).depth());
    }

    #[test]
    fn promotion_tag_must_be_a_piece_letter() {
        assert_eq!(MovePayload::new("a7", "a8", Some("q")).promotion_char(), Some('q'));
        assert_eq!(MovePayload::new("a7", "a8", Some("k")).promotion_char(), None);
        assert_eq!(MovePayload::new("a7", "a8", Some("Q")).promotion_char(), None);
        assert_eq!(MovePayload::new("a7", "a8", None).promotion_char(), None);
    }
}
