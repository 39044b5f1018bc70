use crate::domain::models::Color;
use crate::domain::position::position_key;
use crate::infrastructure::ai::eval::evaluate;
use crate::infrastructure::ai::transposition::TranspositionTable;
use shakmaty::{Chess, Move, Position};

const CAPTURE_PRIORITY: i32 = 100;
const CHECK_PRIORITY: i32 = 50;

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub best: Option<Move>,
    pub score: i32,
}

/// Fixed-depth minimax with alpha-beta pruning.
///
/// `maximizing` says whether the side to move is trying to raise the score;
/// `view` fixes whose perspective the leaf evaluation takes, so the same
/// search serves an engine playing either color. Interior results land in
/// the transposition table and are reused when stored at sufficient depth.
pub fn minimax(
    pos: &Chess,
    depth: u8,
    mut alpha: i32,
    mut beta: i32,
    maximizing: bool,
    view: Color,
    table: &mut TranspositionTable,
) -> SearchResult {
    let key = position_key(pos);
    if let Some(hit) = table.probe(&key, depth) {
        return SearchResult {
            best: hit.best.clone(),
            score: hit.score,
        };
    }

    let legal = pos.legal_moves();
    if depth == 0 || legal.is_empty() || is_drawn(pos) {
        return SearchResult {
            best: None,
            score: evaluate(pos, view),
        };
    }

    let moves = order_moves(pos, &legal);
    let mut best: Option<Move> = None;
    let score = if maximizing {
        let mut max_eval = i32::MIN;
        for m in &moves {
            let mut child = pos.clone();
            child.play_unchecked(m);
            let eval = minimax(&child, depth - 1, alpha, beta, false, view, table).score;
            if eval > max_eval {
                max_eval = eval;
                best = Some(m.clone());
            }
            alpha = alpha.max(eval);
            if beta <= alpha {
                break;
            }
        }
        max_eval
    } else {
        let mut min_eval = i32::MAX;
        for m in &moves {
            let mut child = pos.clone();
            child.play_unchecked(m);
            let eval = minimax(&child, depth - 1, alpha, beta, true, view, table).score;
            if eval < min_eval {
                min_eval = eval;
                best = Some(m.clone());
            }
            beta = beta.min(eval);
            if beta <= alpha {
                break;
            }
        }
        min_eval
    };

    table.store(key, depth, score, best.clone());
    SearchResult { best, score }
}

fn is_drawn(pos: &Chess) -> bool {
    pos.is_insufficient_material() || pos.halfmoves() >= 100
}

/// Captures first, then checking moves, then the rest. The sort is stable
/// so equally ranked moves keep generation order.
fn order_moves(pos: &Chess, legal: &[Move]) -> Vec<Move> {
    let mut scored: Vec<(Move, i32)> = legal
        .iter()
        .map(|m| {
            let mut priority = 0;
            if m.is_capture() {
                priority += CAPTURE_PRIORITY;
            }
            let mut probe = pos.clone();
            probe.play_unchecked(m);
            if probe.is_check() {
                priority += CHECK_PRIORITY;
            }
            (m.clone(), priority)
        })
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.into_iter().map(|(m, _)| m).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::Board;
    use crate::infrastructure::ai::eval::MATE_SCORE;
    use shakmaty::{uci::UciMove, CastlingMode};

    fn pos(fen: &str) -> Chess {
        Board::from_fen(fen).unwrap().inner().clone()
    }

    fn uci(m: &Move) -> String {
        UciMove::from_move(m, CastlingMode::Standard).to_string()
    }

    #[test]
    fn finds_mate_in_one_for_white() {
        let mut table = TranspositionTable::new();
        let position = pos("k7/8/1K6/8/8/8/8/7R w - - 0 1");
        let result = minimax(&position, 1, i32::MIN, i32::MAX, true, Color::White, &mut table);
        assert_eq!(uci(&result.best.unwrap()), "h1h8");
        assert_eq!(result.score, MATE_SCORE);
    }

    #[test]
    fn finds_mate_in_one_for_black() {
        let mut table = TranspositionTable::new();
        let position = pos("7r/8/8/8/8/1k6/8/K7 b - - 0 1");
        let result = minimax(&position, 1, i32::MIN, i32::MAX, true, Color::Black, &mut table);
        assert_eq!(uci(&result.best.unwrap()), "h8h1");
        assert_eq!(result.score, MATE_SCORE);
    }

    #[test]
    fn grabs_a_hanging_queen() {
        let mut table = TranspositionTable::new();
        let position = pos("k7/8/8/3q4/8/8/3R4/K7 w - - 0 1");
        let result = minimax(&position, 2, i32::MIN, i32::MAX, true, Color::White, &mut table);
        assert_eq!(uci(&result.best.unwrap()), "d2d5");
    }

    #[test]
    fn terminal_positions_return_no_move() {
        let mut table = TranspositionTable::new();
        let mated = pos("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        let result = minimax(&mated, 3, i32::MIN, i32::MAX, true, Color::White, &mut table);
        assert!(result.best.is_none());
        assert_eq!(result.score, -MATE_SCORE);
    }

    #[test]
    fn captures_and_checks_are_searched_first() {
        // White can capture on d5 or give a rook check, among quiet moves.
        let position = pos("3k4/8/8/3p4/8/8/3R4/3K4 w - - 0 1");
        let legal = position.legal_moves();
        let ordered = order_moves(&position, &legal);
        assert!(ordered[0].is_capture());
    }

    #[test]
    fn search_fills_the_table_and_reuses_deep_entries() {
        let mut table = TranspositionTable::new();
        let position = pos("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
        minimax(&position, 2, i32::MIN, i32::MAX, true, Color::White, &mut table);
        assert!(!table.is_empty());

        let key = position_key(&position);
        assert!(table.probe(&key, 2).is_some());
        assert!(table.probe(&key, 3).is_none());
    }
}
