//! Mailbox board representation.
//!
//! `Board` is an 8×8 grid of optional pieces — pure data with accessors and
//! no rules knowledge. It is an explicitly-owned value type: move simulation
//! clones it, and a board is never shared between two live games.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::engine::types::{Color, Piece, PieceKind, Square};

/// Back-rank piece order, a-file to h-file.
const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// An 8×8 chess board, indexed `[rank][file]` with rank 0 = White's back rank.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    squares: [[Option<Piece>; 8]; 8],
}

impl Board {
    /// An empty board with no pieces.
    pub fn empty() -> Self {
        Board {
            squares: [[None; 8]; 8],
        }
    }

    /// Standard starting position. No piece has moved.
    pub fn initial() -> Self {
        let mut board = Board::empty();
        for (file, &kind) in BACK_RANK.iter().enumerate() {
            let file = file as u8;
            board.set(Square::new(file, 0), Some(Piece::new(kind, Color::White)));
            board.set(Square::new(file, 7), Some(Piece::new(kind, Color::Black)));
            board.set(
                Square::new(file, 1),
                Some(Piece::new(PieceKind::Pawn, Color::White)),
            );
            board.set(
                Square::new(file, 6),
                Some(Piece::new(PieceKind::Pawn, Color::Black)),
            );
        }
        board
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// What piece (if any) is on a given square?
    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.rank as usize][sq.file as usize]
    }

    /// Place a piece (or clear the square with `None`).
    #[inline]
    pub fn set(&mut self, sq: Square, piece: Option<Piece>) {
        self.squares[sq.rank as usize][sq.file as usize] = piece;
    }

    /// Whether a square holds no piece.
    #[inline]
    pub fn is_empty(&self, sq: Square) -> bool {
        self.piece_at(sq).is_none()
    }

    /// All occupied squares with their pieces, in stable board order.
    pub fn occupied(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(|sq| self.piece_at(sq).map(|p| (sq, p)))
    }

    /// All pieces of one color with their squares, in stable board order.
    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.occupied().filter(move |(_, p)| p.color == color)
    }

    /// Total number of pieces on the board.
    pub fn piece_count(&self) -> usize {
        self.occupied().count()
    }

    /// Find the king square for a color.
    ///
    /// Panics if that color has no king: the board invariant (exactly one
    /// king per color) has been violated and the game state is corrupt.
    pub fn king_square(&self, color: Color) -> Square {
        self.pieces_of(color)
            .find(|(_, p)| p.kind == PieceKind::King)
            .map(|(sq, _)| sq)
            .unwrap_or_else(|| panic!("invariant violated: no {color} king on board:\n{self}"))
    }

    // -----------------------------------------------------------------------
    // Display (8×8 text grid)
    // -----------------------------------------------------------------------

    /// Render the board as an 8-line string (rank 8 at top), for debugging.
    pub fn board_string(&self) -> String {
        let mut s = String::with_capacity(200);
        for rank in (0..8u8).rev() {
            s.push((b'1' + rank) as char);
            s.push(' ');
            for file in 0..8u8 {
                let ch = match self.piece_at(Square::new(file, rank)) {
                    Some(p) => p.kind.to_char(p.color),
                    None => '.',
                };
                s.push(ch);
                if file < 7 {
                    s.push(' ');
                }
            }
            s.push('\n');
        }
        s.push_str("  a b c d e f g h");
        s
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.board_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    #[test]
    fn initial_position_piece_count() {
        let board = Board::initial();
        assert_eq!(board.piece_count(), 32);
        assert_eq!(board.pieces_of(Color::White).count(), 16);
        assert_eq!(board.pieces_of(Color::Black).count(), 16);
    }

    #[test]
    fn initial_back_ranks() {
        let board = Board::initial();
        for (name, kind) in [
            ("a1", PieceKind::Rook),
            ("b1", PieceKind::Knight),
            ("c1", PieceKind::Bishop),
            ("d1", PieceKind::Queen),
            ("e1", PieceKind::King),
            ("f1", PieceKind::Bishop),
            ("g1", PieceKind::Knight),
            ("h1", PieceKind::Rook),
        ] {
            let p = board.piece_at(sq(name)).unwrap();
            assert_eq!((p.kind, p.color), (kind, Color::White), "wrong piece on {name}");
        }
        let p = board.piece_at(sq("d8")).unwrap();
        assert_eq!((p.kind, p.color), (PieceKind::Queen, Color::Black));
    }

    #[test]
    fn initial_pawn_ranks() {
        let board = Board::initial();
        for file in b'a'..=b'h' {
            let white = board.piece_at(sq(&format!("{}2", file as char))).unwrap();
            let black = board.piece_at(sq(&format!("{}7", file as char))).unwrap();
            assert_eq!(white.kind, PieceKind::Pawn);
            assert_eq!(white.color, Color::White);
            assert_eq!(black.kind, PieceKind::Pawn);
            assert_eq!(black.color, Color::Black);
        }
    }

    #[test]
    fn initial_middle_is_empty() {
        let board = Board::initial();
        for rank in 2..6u8 {
            for file in 0..8u8 {
                assert!(board.is_empty(Square::new(file, rank)));
            }
        }
    }

    #[test]
    fn initial_nothing_has_moved() {
        let board = Board::initial();
        assert!(board.occupied().all(|(_, p)| !p.has_moved));
    }

    #[test]
    fn set_and_clear() {
        let mut board = Board::empty();
        let e4 = sq("e4");
        board.set(e4, Some(Piece::new(PieceKind::Knight, Color::White)));
        assert_eq!(
            board.piece_at(e4).map(|p| p.kind),
            Some(PieceKind::Knight)
        );
        board.set(e4, None);
        assert!(board.is_empty(e4));
    }

    #[test]
    fn king_square_lookup() {
        let board = Board::initial();
        assert_eq!(board.king_square(Color::White), sq("e1"));
        assert_eq!(board.king_square(Color::Black), sq("e8"));
    }

    #[test]
    #[should_panic(expected = "invariant violated")]
    fn king_square_panics_without_king() {
        let board = Board::empty();
        board.king_square(Color::White);
    }

    #[test]
    fn board_string_layout() {
        let board = Board::initial();
        let s = board.board_string();
        assert!(s.starts_with("8 r n b q k b n r"));
        assert!(s.ends_with("a b c d e f g h"));
    }

    #[test]
    fn clone_is_independent() {
        let board = Board::initial();
        let mut copy = board.clone();
        copy.set(sq("e2"), None);
        assert!(copy.is_empty(sq("e2")));
        assert!(!board.is_empty(sq("e2")));
    }

    #[test]
    fn serde_round_trip() {
        let board = Board::initial();
        let json = serde_json::to_string(&board).unwrap();
        assert_eq!(serde_json::from_str::<Board>(&json).unwrap(), board);
    }
}
