//! Attack detection, built on the move generator's attack patterns.
//!
//! Used both for check detection and for the king-safety legality filter.

use crate::engine::board::Board;
use crate::engine::movegen;
use crate::engine::types::{Color, Square};

/// Is `sq` attacked by any piece of color `by`?
pub fn is_square_attacked(board: &Board, sq: Square, by: Color) -> bool {
    board
        .pieces_of(by)
        .any(|(from, piece)| movegen::attack_squares(board, from, piece).contains(&sq))
}

/// Is the king of `color` currently in check?
///
/// Panics (via `Board::king_square`) if the color has no king — a violated
/// invariant, not a recoverable condition.
pub fn is_king_in_check(board: &Board, color: Color) -> bool {
    is_square_attacked(board, board.king_square(color), !color)
}

// =========================================================================
// Tests
// =========================================================================
