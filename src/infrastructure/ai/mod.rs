pub mod book;
pub mod eval;
pub mod search;
pub mod transposition;

use crate::domain::models::{Color, Difficulty, MovePayload, Strength};
use crate::domain::position::Board;
use crate::infrastructure::ai::transposition::TranspositionTable;
use rand::Rng;
use shakmaty::{uci::UciMove, CastlingMode, Move, Position};
use std::time::Duration;

/// How long the engine pretends to think before replying, per difficulty.
/// A random jitter keeps consecutive replies from feeling mechanical.
pub fn reply_delay(difficulty: Difficulty) -> Duration {
    let mut rng = rand::thread_rng();
    let millis = match difficulty {
        Difficulty::Easy => 300 + rng.gen_range(0..200),
        Difficulty::Medium => 800 + rng.gen_range(0..400),
        Difficulty::Hard => 1500 + rng.gen_range(0..1000),
    };
    Duration::from_millis(millis)
}

/// The built-in opponent: opening book backed by a minimax search with a
/// per-engine transposition cache.
///
/// The cache carries over between moves of one game. It is dropped whenever
/// the strength changes and whenever the engine is asked to search for the
/// other color, since stored scores are view-dependent.
pub struct Engine {
    strength: Strength,
    searching_for: Option<Color>,
    table: TranspositionTable,
}

impl Engine {
    pub fn new(strength: Strength) -> Self {
        Engine {
            strength,
            searching_for: None,
            table: TranspositionTable::new(),
        }
    }

    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        Engine::new(difficulty.into())
    }

    pub fn strength(&self) -> Strength {
        self.strength
    }

    pub fn set_strength(&mut self, strength: Strength) {
        self.strength = strength;
        self.table.clear();
    }

    /// Picks a move for `side` in the given position.
    ///
    /// Returns `None` exactly when `side` has no legal move, which the
    /// caller must resolve with a terminal-state check. Any other outcome
    /// of the search still yields some legal move.
    pub fn choose_move(&mut self, board: &Board, side: Color) -> Option<MovePayload> {
        let legal = board.inner().legal_moves();
        if legal.is_empty() {
            return None;
        }

        if self.searching_for != Some(side) {
            self.table.clear();
            self.searching_for = Some(side);
        }

        if let Some(book) = book::opening_move(board) {
            return Some(book);
        }

        let result = search::minimax(
            board.inner(),
            self.strength.depth(),
            i32::MIN,
            i32::MAX,
            true,
            side,
            &mut self.table,
        );
        let chosen = result.best.unwrap_or_else(|| legal[0].clone());
        Some(payload_of(&chosen))
    }

    #[cfg(test)]
    fn cached_positions(&self) -> usize {
        self.table.len()
    }
}

fn payload_of(m: &Move) -> MovePayload {
    let uci = UciMove::from_move(m, CastlingMode::Standard).to_string();
    let promotion = if uci.len() > 4 { Some(&uci[4..5]) } else { None };
    MovePayload::new(&uci[0..2], &uci[2..4], promotion)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_drops_on_strength_change() {
        let mut engine = Engine::new(Strength::Intermediate);
        let board = Board::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        engine.choose_move(&board, Color::White).unwrap();
        assert!(engine.cached_positions() > 0);

        engine.set_strength(Strength::Advanced);
        assert_eq!(engine.cached_positions(), 0);
    }

    #[test]
    fn cache_drops_when_the_engine_switches_sides() {
        // Depth 1 stores exactly the root node per search, which makes the
        // clear observable: without it the second search would leave two
        // entries behind.
        let mut engine = Engine::new(Strength::Beginner);
        let board = Board::from_fen("4k3/4r3/8/8/8/8/4R3/4K3 w - - 10 20").unwrap();
        engine.choose_move(&board, Color::White).unwrap();
        assert_eq!(engine.cached_positions(), 1);

        let flipped = Board::from_fen("4k3/4r3/8/8/8/8/4R3/4K3 b - - 10 20").unwrap();
        engine.choose_move(&flipped, Color::Black).unwrap();
        assert_eq!(engine.cached_positions(), 1);
    }

    #[test]
    fn promotion_moves_carry_their_tag() {
        let mut engine = Engine::new(Strength::Intermediate);
        let board = Board::from_fen("8/P6k/8/8/8/8/8/K7 w - - 20 40").unwrap();
        let mv = engine.choose_move(&board, Color::White).unwrap();
        if mv.from == "a7" {
            assert_eq!(mv.to, "a8");
            assert!(mv.promotion.is_some());
        }
        assert!(board.validate(&mv).is_ok());
    }

    #[test]
    fn reply_delay_stays_inside_its_band() {
        for _ in 0..50 {
            let d = reply_delay(Difficulty::Easy).as_millis();
            assert!((300..500).contains(&d));
            let d = reply_delay(Difficulty::Hard).as_millis();
            assert!((1500..2500).contains(&d));
        }
    }
}
