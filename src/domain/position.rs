use crate::domain::models::{Color, EndReason, GameOutcome, MovePayload};
use shakmaty::{
    fen::Fen, san::San, uci::UciMove, CastlingMode, Chess, EnPassantMode, Move, Position,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MoveError {
    #[error("unparseable move {0}")]
    BadSquare(String),
    #[error("illegal move {0}")]
    Illegal(String),
    #[error("invalid FEN {0}")]
    InvalidFen(String),
}

/// Outcome of successfully resolving a move against a position: the SAN
/// notation of the move and the FEN of the position after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMove {
    pub san: String,
    pub fen: String,
}

/// The first four FEN fields: placement, side to move, castling rights and
/// en passant square. Two positions with the same key are the same position
/// for repetition and caching purposes; the move counters are deliberately
/// excluded.
pub fn position_key(pos: &Chess) -> String {
    let fen = Fen::from_position(pos.clone(), EnPassantMode::Legal).to_string();
    fen.split(' ').take(4).collect::<Vec<_>>().join(" ")
}

/// A live chess position plus the history needed for repetition claims.
///
/// All mutation goes through [`Board::apply`], which keeps the seen-key list
/// and the ply counter in sync with the underlying position.
#[derive(Debug, Clone)]
pub struct Board {
    inner: Chess,
    seen_keys: Vec<String>,
    ply: u32,
}

impl Board {
    pub fn new() -> Self {
        let inner = Chess::default();
        let seen_keys = vec![position_key(&inner)];
        Board {
            inner,
            seen_keys,
            ply: 0,
        }
    }

    /// Builds a board from a FEN string. The ply counter is reconstructed
    /// from the fullmove number, so opening-phase checks keep working for
    /// positions that did not pass through [`Board::apply`].
    pub fn from_fen(fen: &str) -> Result<Self, MoveError> {
        let parsed: Fen = fen
            .parse()
            .map_err(|_| MoveError::InvalidFen(fen.to_string()))?;
        let inner: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|_| MoveError::InvalidFen(fen.to_string()))?;
        let ply = (inner.fullmoves().get() - 1) * 2
            + if inner.turn() == shakmaty::Color::Black {
                1
            } else {
                0
            };
        let seen_keys = vec![position_key(&inner)];
        Ok(Board {
            inner,
            seen_keys,
            ply,
        })
    }

    /// Replays a recorded move sequence onto a fresh board.
    pub fn replay<I>(moves: I) -> Result<Self, MoveError>
    where
        I: IntoIterator<Item = MovePayload>,
    {
        let mut board = Board::new();
        for mv in moves {
            board.apply(&mv)?;
        }
        Ok(board)
    }

    pub fn inner(&self) -> &Chess {
        &self.inner
    }

    /// Number of half-moves played on this board.
    pub fn ply(&self) -> u32 {
        self.ply
    }

    pub fn turn(&self) -> Color {
        self.inner.turn().into()
    }

    pub fn fen(&self) -> String {
        Fen::from_position(self.inner.clone(), EnPassantMode::Legal).to_string()
    }

    pub fn legal_move_count(&self) -> usize {
        self.inner.legal_moves().len()
    }

    /// True when the from/to pair matches a legal pawn promotion, meaning a
    /// promotion tag is mandatory to disambiguate the move.
    pub fn requires_promotion(&self, from: &str, to: &str) -> bool {
        self.inner.legal_moves().iter().any(|m| {
            m.promotion().is_some()
                && m.from().map(|sq| sq.to_string()).as_deref() == Some(from)
                && m.to().to_string() == to
        })
    }

    fn resolve(&self, mv: &MovePayload) -> Result<Move, MoveError> {
        let mut uci = format!("{}{}", mv.from, mv.to);
        if self.requires_promotion(&mv.from, &mv.to) {
            if let Some(tag) = mv.promotion_char() {
                uci.push(tag);
            }
        }
        let parsed: UciMove = uci.parse().map_err(|_| MoveError::BadSquare(uci.clone()))?;
        parsed
            .to_move(&self.inner)
            .map_err(|_| MoveError::Illegal(uci))
    }

    /// Checks a move for legality without touching this board.
    pub fn validate(&self, mv: &MovePayload) -> Result<AppliedMove, MoveError> {
        let mut probe = self.clone();
        probe.apply(mv)
    }

    /// Plays a move, returning its SAN notation and the resulting FEN.
    pub fn apply(&mut self, mv: &MovePayload) -> Result<AppliedMove, MoveError> {
        let resolved = self.resolve(mv)?;
        let san = San::from_move(&self.inner, &resolved).to_string();
        let uci = UciMove::from_move(&resolved, CastlingMode::Standard).to_string();
        self.inner = self
            .inner
            .clone()
            .play(&resolved)
            .map_err(|_| MoveError::Illegal(uci))?;
        self.seen_keys.push(position_key(&self.inner));
        self.ply += 1;
        Ok(AppliedMove {
            san,
            fen: self.fen(),
        })
    }

    fn is_threefold(&self) -> bool {
        match self.seen_keys.last() {
            Some(current) => self.seen_keys.iter().filter(|k| *k == current).count() >= 3,
            None => false,
        }
    }

    /// Terminal verdict for the current position, if the game is over.
    ///
    /// Checkmate wins over every draw claim; among draws, stalemate is
    /// reported before repetition, repetition before insufficient material,
    /// and the fifty-move rule last.
    pub fn outcome(&self) -> Option<GameOutcome> {
        if self.inner.is_checkmate() {
            let winner: Color = self.turn().opponent();
            return Some(GameOutcome {
                winner: Some(winner),
                reason: EndReason::Checkmate,
            });
        }
        if self.inner.is_stalemate() {
            return Some(GameOutcome {
                winner: None,
                reason: EndReason::Stalemate,
            });
        }
        if self.is_threefold() {
            return Some(GameOutcome {
                winner: None,
                reason: EndReason::ThreefoldRepetition,
            });
        }
        if self.inner.is_insufficient_material() {
            return Some(GameOutcome {
                winner: None,
                reason: EndReason::InsufficientMaterial,
            });
        }
        if self.inner.halfmoves() >= 100 {
            return Some(GameOutcome {
                winner: None,
                reason: EndReason::FiftyMoveRule,
            });
        }
        None
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}
