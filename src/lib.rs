//! A chess rules engine: board representation, legal move generation,
//! two-phase pawn promotion, SAN notation, FEN I/O, and terminal-state
//! detection (checkmate, stalemate, insufficient material, the fifty-move
//! rule).
//!
//! The main entry point is [`Game`]:
//!
//! ```
//! use chess_core::{Game, MoveOutcome, Square};
//!
//! let mut game = Game::new();
//! let from = Square::from_algebraic("e2").unwrap();
//! let to = Square::from_algebraic("e4").unwrap();
//! match game.make_move(from, to) {
//!     Ok(MoveOutcome::Played(san)) => assert_eq!(san, "e4"),
//!     other => panic!("unexpected outcome: {other:?}"),
//! }
//! ```

pub mod engine;

pub use engine::{
    Board, ChessError, Color, DrawReason, Game, GameStatus, Move, MoveOutcome, Piece, PieceKind,
    Square,
};
