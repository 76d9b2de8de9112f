//! Move generation.
//!
//! Pipeline:
//!   1. `pseudo_legal_moves` — destinations per movement pattern, ignoring
//!      whether the mover's own king ends up attacked.
//!   2. `legal_moves` — the subset that survives a king-safety simulation:
//!      clone the board, perform the piece move, reject if the own king is
//!      attacked.
//!
//! Direction and offset tables are iterated in a fixed order so generated
//! move lists are stable across runs.

use crate::engine::attacks;
use crate::engine::board::Board;
use crate::engine::types::{Move, Piece, PieceKind, Square};

/// Orthogonal ray directions (rook), fixed order.
const ROOK_DIRS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Diagonal ray directions (bishop), fixed order.
const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// All eight directions (queen, king).
const QUEEN_DIRS: [(i8, i8); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// The eight knight jumps.
const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

// =========================================================================
// Public API
// =========================================================================

/// Destinations a piece on `from` can move to by its movement pattern alone.
///
/// King safety is NOT checked here. `preceding` is the move played on the
/// previous ply, consulted only for en-passant eligibility. Castling
/// destinations are included, with the full castling conditions (unmoved
/// king and rook, empty path, king neither in check nor crossing an
/// attacked square) — those conditions are part of the pattern, not of the
/// king-safety filter.
pub fn pseudo_legal_moves(
    board: &Board,
    from: Square,
    piece: Piece,
    preceding: Option<&Move>,
) -> Vec<Square> {
    let mut moves = Vec::new();
    match piece.kind {
        PieceKind::Pawn => pawn_moves(board, from, piece, preceding, &mut moves),
        PieceKind::Knight => step_moves(board, from, piece, &KNIGHT_JUMPS, &mut moves),
        PieceKind::Bishop => ray_moves(board, from, piece, &BISHOP_DIRS, &mut moves),
        PieceKind::Rook => ray_moves(board, from, piece, &ROOK_DIRS, &mut moves),
        PieceKind::Queen => ray_moves(board, from, piece, &QUEEN_DIRS, &mut moves),
        PieceKind::King => {
            step_moves(board, from, piece, &QUEEN_DIRS, &mut moves);
            castling_moves(board, from, piece, &mut moves);
        }
    }
    moves
}

/// The subset of `pseudo_legal_moves` that does not leave the mover's own
/// king attacked.
///
/// Each candidate is checked by simulating the primary piece move on a board
/// clone (for en passant, removal of the captured pawn is part of the
/// capture and is simulated too; castling rook relocation is not — it can
/// never expose the king, and the transit squares were already verified).
pub fn legal_moves(
    board: &Board,
    from: Square,
    piece: Piece,
    preceding: Option<&Move>,
) -> Vec<Square> {
    pseudo_legal_moves(board, from, piece, preceding)
        .into_iter()
        .filter(|&to| {
            let sim = simulate(board, from, to, piece);
            !attacks::is_king_in_check(&sim, piece.color)
        })
        .collect()
}

/// Squares a piece on `from` threatens.
///
/// Differs from the movement pattern in two ways required for attack
/// detection: pawn forward pushes are excluded (a push captures nothing),
/// and castling is excluded (a castling king attacks no square by castling).
pub fn attack_squares(board: &Board, from: Square, piece: Piece) -> Vec<Square> {
    let mut moves = Vec::new();
    match piece.kind {
        PieceKind::Pawn => {
            let dir = piece.color.pawn_direction();
            for df in [-1i8, 1] {
                if let Some(diag) = from.offset(df, dir)
                    && board.piece_at(diag).is_none_or(|p| p.color != piece.color)
                {
                    moves.push(diag);
                }
            }
        }
        PieceKind::Knight => step_moves(board, from, piece, &KNIGHT_JUMPS, &mut moves),
        PieceKind::Bishop => ray_moves(board, from, piece, &BISHOP_DIRS, &mut moves),
        PieceKind::Rook => ray_moves(board, from, piece, &ROOK_DIRS, &mut moves),
        PieceKind::Queen => ray_moves(board, from, piece, &QUEEN_DIRS, &mut moves),
        PieceKind::King => step_moves(board, from, piece, &QUEEN_DIRS, &mut moves),
    }
    moves
}

/// Apply the primary piece move on a clone of the board, for king-safety
/// checks. Handles en-passant pawn removal; ignores castling rook
/// relocation.
pub(crate) fn simulate(board: &Board, from: Square, to: Square, piece: Piece) -> Board {
    let mut sim = board.clone();
    if piece.kind == PieceKind::Pawn && from.file != to.file && sim.is_empty(to) {
        // Diagonal pawn move onto an empty square is en passant: the
        // captured pawn sits beside the origin, not on the destination.
        sim.set(Square::new(to.file, from.rank), None);
    }
    sim.set(to, Some(piece));
    sim.set(from, None);
    sim
}

// =========================================================================
// Pawn moves
// =========================================================================

fn pawn_moves(
    board: &Board,
    from: Square,
    piece: Piece,
    preceding: Option<&Move>,
    moves: &mut Vec<Square>,
) {
    let dir = piece.color.pawn_direction();

    // Pushes: one step if empty, two from the start rank if both are empty.
    if let Some(one) = from.offset(0, dir)
        && board.is_empty(one)
    {
        moves.push(one);
        if from.rank == piece.color.pawn_start_rank()
            && let Some(two) = from.offset(0, 2 * dir)
            && board.is_empty(two)
        {
            moves.push(two);
        }
    }

    // Diagonal captures, including en passant.
    let ep = en_passant_destination(from, piece, preceding);
    for df in [-1i8, 1] {
        if let Some(diag) = from.offset(df, dir) {
            match board.piece_at(diag) {
                Some(target) if target.color != piece.color => moves.push(diag),
                None if ep == Some(diag) => moves.push(diag),
                _ => {}
            }
        }
    }
}

/// If the preceding move was a two-square pawn advance by the opponent,
/// landing on `from`'s rank and file-adjacent to it, return the en-passant
/// destination (the square behind the advanced pawn). The window exists for
/// exactly one ply because only the immediately preceding move is consulted.
fn en_passant_destination(from: Square, piece: Piece, preceding: Option<&Move>) -> Option<Square> {
    let last = preceding?;
    if piece.kind != PieceKind::Pawn
        || last.piece.color == piece.color
        || !last.is_double_pawn_push()
        || last.to.rank != from.rank
        || last.to.file.abs_diff(from.file) != 1
    {
        return None;
    }
    from.offset(last.to.file as i8 - from.file as i8, piece.color.pawn_direction())
}

// =========================================================================
// Fixed-offset and ray movement
// =========================================================================

/// Single-step destinations (knight jumps, king steps): on the board and not
/// occupied by an own piece.
fn step_moves(
    board: &Board,
    from: Square,
    piece: Piece,
    offsets: &[(i8, i8)],
    moves: &mut Vec<Square>,
) {
    for &(df, dr) in offsets {
        if let Some(to) = from.offset(df, dr)
            && board.piece_at(to).is_none_or(|p| p.color != piece.color)
        {
            moves.push(to);
        }
    }
}

/// Sliding destinations: walk each ray until the board edge, an own piece
/// (stop, exclude) or an opposing piece (stop, include as capture).
fn ray_moves(
    board: &Board,
    from: Square,
    piece: Piece,
    dirs: &[(i8, i8)],
    moves: &mut Vec<Square>,
) {
    for &(df, dr) in dirs {
        let mut current = from;
        while let Some(to) = current.offset(df, dr) {
            match board.piece_at(to) {
                None => moves.push(to),
                Some(target) => {
                    if target.color != piece.color {
                        moves.push(to);
                    }
                    break;
                }
            }
            current = to;
        }
    }
}

// =========================================================================
// Castling
// =========================================================================

/// Castling destinations for a king on `from`.
///
/// Requires: king and the relevant rook unmoved, all squares strictly
/// between them empty, the king not currently in check, and the squares the
/// king crosses or lands on not attacked by the opponent.
fn castling_moves(board: &Board, from: Square, piece: Piece, moves: &mut Vec<Square>) {
    if piece.has_moved {
        return;
    }
    let rank = from.rank;
    let them = !piece.color;

    if attacks::is_square_attacked(board, from, them) {
        return;
    }

    let unmoved_rook = |file: u8| {
        matches!(
            board.piece_at(Square::new(file, rank)),
            Some(r) if r.kind == PieceKind::Rook && r.color == piece.color && !r.has_moved
        )
    };

    // Kingside: king e→g; f and g empty, neither attacked.
    if unmoved_rook(7) {
        let f = Square::new(5, rank);
        let g = Square::new(6, rank);
        if board.is_empty(f)
            && board.is_empty(g)
            && !attacks::is_square_attacked(board, f, them)
            && !attacks::is_square_attacked(board, g, them)
        {
            moves.push(g);
        }
    }

    // Queenside: king e→c; b, c, d empty; c and d not attacked (the king
    // never crosses b).
    if unmoved_rook(0) {
        let b = Square::new(1, rank);
        let c = Square::new(2, rank);
        let d = Square::new(3, rank);
        if board.is_empty(b)
            && board.is_empty(c)
            && board.is_empty(d)
            && !attacks::is_square_attacked(board, c, them)
            && !attacks::is_square_attacked(board, d, them)
        {
            moves.push(c);
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
