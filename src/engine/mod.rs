//! The chess rules engine.
//!
//! Layering, bottom up: `types` (colors, pieces, squares, moves, errors),
//! `board` (the 8×8 mailbox), `movegen` (pseudo-legal patterns and the
//! king-safety filter), `attacks` (check detection), `san` (notation), and
//! `game` (the stateful move-making machine with FEN I/O).

pub mod attacks;
pub mod board;
pub mod game;
pub mod movegen;
pub mod san;
pub mod types;

pub use board::Board;
pub use game::Game;
pub use movegen::{attack_squares, legal_moves, pseudo_legal_moves};
pub use types::*;
