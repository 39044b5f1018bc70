use crate::domain::models::MovePayload;
use crate::domain::position::Board;
use rand::seq::SliceRandom;
use shakmaty::Position;

/// Developing moves worth playing on sight. Only consulted while the game
/// is still inside the opening window.
const OPENING_MOVES: [(&str, &str); 6] = [
    ("e2", "e4"),
    ("d2", "d4"),
    ("g1", "f3"),
    ("b1", "c3"),
    ("f1", "c4"),
    ("c2", "c4"),
];

const OPENING_PLY_WINDOW: u32 = 6;

/// Picks a random book move that is legal in the current position, or
/// `None` once the opening window has passed or no book move applies.
pub fn opening_move(board: &Board) -> Option<MovePayload> {
    if board.ply() >= OPENING_PLY_WINDOW {
        return None;
    }
    let candidates: Vec<MovePayload> = board
        .inner()
        .legal_moves()
        .iter()
        .filter_map(|m| {
            let from = m.from()?.to_string();
            let to = m.to().to_string();
            OPENING_MOVES
                .iter()
                .any(|&(f, t)| f == from && t == to)
                .then(|| MovePayload::new(&from, &to, None))
        })
        .collect();
    candidates.choose(&mut rand::thread_rng()).cloned()
}
