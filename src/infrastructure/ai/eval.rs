use crate::domain::models::Color;
use shakmaty::{fen::Fen, CastlingMode, Chess, Color as PieceColor, EnPassantMode, Position, Role};

pub const MATE_SCORE: i32 = 20000;

// Material values
const VAL_PAWN: i32 = 100;
const VAL_KNIGHT: i32 = 320;
const VAL_BISHOP: i32 = 330;
const VAL_ROOK: i32 = 500;
const VAL_QUEEN: i32 = 900;

const MOBILITY_WEIGHT: i32 = 10;
const SHIELD_PAWN_BONUS: i32 = 10;

// Piece-square tables, printed from White's point of view with the eighth
// rank on top. Lookup flips the row for White and mirrors for Black.
const PAWN_TABLE: [[i32; 8]; 8] = [
    [0, 0, 0, 0, 0, 0, 0, 0],
    [50, 50, 50, 50, 50, 50, 50, 50],
    [10, 10, 20, 30, 30, 20, 10, 10],
    [5, 5, 10, 25, 25, 10, 5, 5],
    [0, 0, 0, 20, 20, 0, 0, 0],
    [5, -5, -10, 0, 0, -10, -5, 5],
    [5, 10, 10, -20, -20, 10, 10, 5],
    [0, 0, 0, 0, 0, 0, 0, 0],
];

const KNIGHT_TABLE: [[i32; 8]; 8] = [
    [-50, -40, -30, -30, -30, -30, -40, -50],
    [-40, -20, 0, 0, 0, 0, -20, -40],
    [-30, 0, 10, 15, 15, 10, 0, -30],
    [-30, 5, 15, 20, 20, 15, 5, -30],
    [-30, 0, 15, 20, 20, 15, 0, -30],
    [-30, 5, 10, 15, 15, 10, 5, -30],
    [-40, -20, 0, 5, 5, 0, -20, -40],
    [-50, -40, -30, -30, -30, -30, -40, -50],
];

const BISHOP_TABLE: [[i32; 8]; 8] = [
    [-20, -10, -10, -10, -10, -10, -10, -20],
    [-10, 0, 0, 0, 0, 0, 0, -10],
    [-10, 0, 5, 10, 10, 5, 0, -10],
    [-10, 5, 5, 10, 10, 5, 5, -10],
    [-10, 0, 10, 10, 10, 10, 0, -10],
    [-10, 10, 10, 10, 10, 10, 10, -10],
    [-10, 5, 0, 0, 0, 0, 5, -10],
    [-20, -10, -10, -10, -10, -10, -10, -20],
];

const ROOK_TABLE: [[i32; 8]; 8] = [
    [0, 0, 0, 0, 0, 0, 0, 0],
    [5, 10, 10, 10, 10, 10, 10, 5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [0, 0, 0, 5, 5, 0, 0, 0],
];

const QUEEN_TABLE: [[i32; 8]; 8] = [
    [-20, -10, -10, -5, -5, -10, -10, -20],
    [-10, 0, 0, 0, 0, 0, 0, -10],
    [-10, 0, 5, 5, 5, 5, 0, -10],
    [-5, 0, 5, 5, 5, 5, 0, -5],
    [0, 0, 5, 5, 5, 5, 0, -5],
    [-10, 5, 5, 5, 5, 5, 0, -10],
    [-10, 0, 5, 0, 0, 0, 0, -10],
    [-20, -10, -10, -5, -5, -10, -10, -20],
];

const KING_TABLE: [[i32; 8]; 8] = [
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-20, -30, -30, -40, -40, -30, -30, -20],
    [-10, -20, -20, -20, -20, -20, -20, -10],
    [20, 20, 0, 0, 0, 0, 20, 20],
    [20, 30, 10, 0, 0, 10, 30, 20],
];

/// Static evaluation of a position from `view`'s perspective: positive is
/// good for `view`. Checkmate and draws short-circuit; otherwise the score
/// is material plus piece placement, mobility and a pawn-shield term.
pub fn evaluate(pos: &Chess, view: Color) -> i32 {
    if pos.is_checkmate() {
        // The side to move is the side that got mated.
        return if Color::from(pos.turn()) == view {
            -MATE_SCORE
        } else {
            MATE_SCORE
        };
    }
    if pos.is_stalemate() || pos.is_insufficient_material() || pos.halfmoves() >= 100 {
        return 0;
    }

    let mut score = 0;
    let board = pos.board();
    for sq in board.occupied() {
        if let Some(piece) = board.piece_at(sq) {
            let (file, rank) = coords(sq);
            let value = material_value(piece.role) + table_value(piece.role, file, rank, piece.color);
            score += if piece.color == PieceColor::White {
                value
            } else {
                -value
            };
        }
    }

    score += mobility_difference(pos) * MOBILITY_WEIGHT;
    score += pawn_shield(pos, PieceColor::White) - pawn_shield(pos, PieceColor::Black);

    match view {
        Color::White => score,
        Color::Black => -score,
    }
}

fn material_value(role: Role) -> i32 {
    match role {
        Role::Pawn => VAL_PAWN,
        Role::Knight => VAL_KNIGHT,
        Role::Bishop => VAL_BISHOP,
        Role::Rook => VAL_ROOK,
        Role::Queen => VAL_QUEEN,
        // Kings only score through their placement table.
        Role::King => 0,
    }
}

fn table_value(role: Role, file: usize, rank: usize, color: PieceColor) -> i32 {
    let table = match role {
        Role::Pawn => &PAWN_TABLE,
        Role::Knight => &KNIGHT_TABLE,
        Role::Bishop => &BISHOP_TABLE,
        Role::Rook => &ROOK_TABLE,
        Role::Queen => &QUEEN_TABLE,
        Role::King => &KING_TABLE,
    };
    let row = match color {
        PieceColor::White => 7 - rank,
        PieceColor::Black => rank,
    };
    table[row][file]
}

/// Zero-based (file, rank) of a square, a1 being (0, 0).
fn coords(sq: shakmaty::Square) -> (usize, usize) {
    let name = sq.to_string();
    let bytes = name.as_bytes();
    ((bytes[0] - b'a') as usize, (bytes[1] - b'1') as usize)
}

/// White legal-move count minus Black's. The side not to move is counted by
/// handing it the move in a copy of the position; if that copy is not a
/// valid position the term collapses to zero.
fn mobility_difference(pos: &Chess) -> i32 {
    let to_move = pos.legal_moves().len() as i32;

    let fen = Fen::from_position(pos.clone(), EnPassantMode::Legal).to_string();
    let mut fields: Vec<&str> = fen.split(' ').collect();
    if fields.len() < 4 {
        return 0;
    }
    fields[1] = if fields[1] == "w" { "b" } else { "w" };
    fields[3] = "-";
    let swapped = fields.join(" ");

    let waiting = swapped
        .parse::<Fen>()
        .ok()
        .and_then(|f| f.into_position::<Chess>(CastlingMode::Standard).ok())
        .map(|p| p.legal_moves().len() as i32)
        .unwrap_or(to_move);

    match pos.turn() {
        PieceColor::White => to_move - waiting,
        PieceColor::Black => waiting - to_move,
    }
}

/// Bonus for friendly pawns on the three squares directly ahead of the king.
fn pawn_shield(pos: &Chess, color: PieceColor) -> i32 {
    let board = pos.board();
    let mut king: Option<(i32, i32)> = None;
    let mut pawns: Vec<(i32, i32)> = Vec::new();
    for sq in board.occupied() {
        if let Some(piece) = board.piece_at(sq) {
            if piece.color != color {
                continue;
            }
            let (file, rank) = coords(sq);
            match piece.role {
                Role::King => king = Some((file as i32, rank as i32)),
                Role::Pawn => pawns.push((file as i32, rank as i32)),
                _ => {}
            }
        }
    }
    let Some((king_file, king_rank)) = king else {
        return 0;
    };

    let ahead = if color == PieceColor::White { 1 } else { -1 };
    let mut safety = 0;
    for offset in -1..=1 {
        let file = king_file + offset;
        let rank = king_rank + ahead;
        if (0..8).contains(&file) && (0..8).contains(&rank) && pawns.contains(&(file, rank)) {
            safety += SHIELD_PAWN_BONUS;
        }
    }
    safety
}
