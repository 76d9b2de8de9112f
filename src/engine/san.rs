//! Standard Algebraic Notation (SAN) generation.
//!
//! SAN examples: `e4`, `Nf3`, `Bxe5`, `O-O`, `e8=Q`, `Raxd1`.
//!
//! Check/checkmate suffixes (`+`, `#`) are NOT appended here — the caller
//! (`Game`) adds them once the move is applied and the resulting status is
//! known. Parsing SAN back into moves is a collaborator concern and is not
//! part of this engine.

use crate::engine::board::Board;
use crate::engine::movegen;
use crate::engine::types::{Move, PieceKind, Square};

/// Convert a move to SAN, given the board it is about to be played on.
///
/// `preceding` is the move played on the previous ply (needed so the
/// disambiguation scan sees the same legal-move sets the mover did).
pub fn move_to_san(board: &Board, mv: &Move, preceding: Option<&Move>) -> String {
    // Castling.
    if mv.is_castling {
        return if mv.to.file > mv.from.file {
            "O-O".into()
        } else {
            "O-O-O".into()
        };
    }

    let mut san = String::with_capacity(8);

    if mv.piece.kind == PieceKind::Pawn {
        // Pawn moves: departure file prefix on captures (incl. en passant).
        if mv.captured.is_some() || mv.is_en_passant {
            san.push((b'a' + mv.from.file) as char);
            san.push('x');
        }
        san.push_str(&mv.to.to_algebraic());

        if let Some(promo) = mv.promotion {
            san.push('=');
            san.push(promo.letter());
        }
    } else {
        san.push(mv.piece.kind.letter());
        san.push_str(&disambiguation(board, mv, preceding));
        if mv.captured.is_some() {
            san.push('x');
        }
        san.push_str(&mv.to.to_algebraic());
    }

    san
}

/// Disambiguation string for a piece move: empty if no other like-colored
/// piece of the same kind can legally reach the destination, otherwise the
/// origin file if that alone distinguishes, else the rank, else both.
fn disambiguation(board: &Board, mv: &Move, preceding: Option<&Move>) -> String {
    let rivals: Vec<Square> = board
        .pieces_of(mv.piece.color)
        .filter(|&(sq, p)| sq != mv.from && p.kind == mv.piece.kind)
        .filter(|&(sq, p)| movegen::legal_moves(board, sq, p, preceding).contains(&mv.to))
        .map(|(sq, _)| sq)
        .collect();

    if rivals.is_empty() {
        return String::new();
    }

    let file = (b'a' + mv.from.file) as char;
    let rank = (b'1' + mv.from.rank) as char;
    let same_file = rivals.iter().any(|s| s.file == mv.from.file);
    let same_rank = rivals.iter().any(|s| s.rank == mv.from.rank);

    match (same_file, same_rank) {
        (false, _) => file.to_string(),
        (true, false) => rank.to_string(),
        (true, true) => format!("{file}{rank}"),
    }
}

// =========================================================================
// Tests
// =========================================================================
