//! Game state and the move-making state machine.
//!
//! `Game` owns the board, the side to move, the move history, the captured
//! ledger, the draw clocks, and the derived status. All mutation goes through
//! `make_move` / `apply_promotion`; a call that returns an error leaves the
//! game exactly as it was.
//!
//! Promotion is two-phase. A pawn move onto the last rank is validated like
//! any other move, but instead of being applied it is parked as a pending
//! promotion and `make_move` returns [`MoveOutcome::PromotionPending`]. The
//! board does not change until the caller picks a piece with
//! `apply_promotion`, which applies move and promotion atomically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::engine::attacks;
use crate::engine::board::Board;
use crate::engine::movegen;
use crate::engine::san;
use crate::engine::types::{
    ChessError, Color, DrawReason, GameStatus, Move, MoveOutcome, Piece, PieceKind, Square,
};

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

/// A chess game in progress.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Game {
    /// Unique game id.
    pub id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    board: Board,
    side_to_move: Color,
    move_history: Vec<Move>,
    /// Captured pieces, indexed by the captured piece's own color.
    captured: [Vec<Piece>; 2],
    /// Plies since the last pawn move or capture. 100 plies = fifty-move rule.
    halfmove_clock: u32,
    /// Starts at 1, incremented after each Black move.
    fullmove_number: u32,
    status: GameStatus,
    /// A validated pawn move awaiting its promotion choice.
    pending_promotion: Option<(Square, Square)>,
}

impl Game {
    /// A new game from the standard starting position, White to move.
    pub fn new() -> Self {
        let game = Game {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            board: Board::initial(),
            side_to_move: Color::White,
            move_history: Vec::new(),
            captured: [Vec::new(), Vec::new()],
            halfmove_clock: 0,
            fullmove_number: 1,
            status: GameStatus::Active,
            pending_promotion: None,
        };
        debug!(id = %game.id, "created new game");
        game
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn move_history(&self) -> &[Move] {
        &self.move_history
    }

    /// Captured pieces of `color` (i.e. the material `!color` has won).
    pub fn captured_pieces(&self, color: Color) -> &[Piece] {
        &self.captured[color.index()]
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// The (from, to) of a pawn move awaiting its promotion choice.
    pub fn pending_promotion(&self) -> Option<(Square, Square)> {
        self.pending_promotion
    }

    /// The move played on the previous ply, if any.
    fn preceding(&self) -> Option<&Move> {
        self.move_history.last()
    }

    // -----------------------------------------------------------------------
    // Move queries
    // -----------------------------------------------------------------------

    /// Every legal (from, to) pair for the side to move.
    ///
    /// Empty when the game is over or a promotion choice is pending.
    pub fn legal_moves(&self) -> Vec<(Square, Square)> {
        if self.status.is_game_over() || self.pending_promotion.is_some() {
            return Vec::new();
        }
        let mut all = Vec::new();
        for (from, piece) in self.board.pieces_of(self.side_to_move) {
            for to in movegen::legal_moves(&self.board, from, piece, self.preceding()) {
                all.push((from, to));
            }
        }
        all
    }

    /// Legal destinations for the piece on `from`.
    ///
    /// Errors if the square is empty or holds an opposing piece. Empty when
    /// the game is over or a promotion choice is pending.
    pub fn legal_destinations(&self, from: Square) -> Result<Vec<Square>, ChessError> {
        let piece = self
            .board
            .piece_at(from)
            .ok_or(ChessError::NoPieceAtOrigin(from))?;
        if piece.color != self.side_to_move {
            return Err(ChessError::WrongSideToMove {
                square: from,
                color: piece.color,
            });
        }
        if self.status.is_game_over() || self.pending_promotion.is_some() {
            return Ok(Vec::new());
        }
        Ok(movegen::legal_moves(&self.board, from, piece, self.preceding()))
    }

    /// Whether playing `from -> to` would require a promotion choice.
    ///
    /// Assumes the move is otherwise legal; this only inspects the pattern
    /// (a pawn of the side to move reaching its promotion rank).
    pub fn move_requires_promotion_choice(&self, from: Square, to: Square) -> bool {
        matches!(
            self.board.piece_at(from),
            Some(p) if p.kind == PieceKind::Pawn
                && p.color == self.side_to_move
                && to.rank == p.color.promotion_rank()
        )
    }

    // -----------------------------------------------------------------------
    // Making moves
    // -----------------------------------------------------------------------

    /// Play a move for the side to move.
    ///
    /// Validation order: finished game, pending promotion, empty origin,
    /// wrong color, then legality. On any error nothing changes. A legal
    /// pawn move onto the last rank is parked and reported as
    /// [`MoveOutcome::PromotionPending`] instead of being applied.
    pub fn make_move(&mut self, from: Square, to: Square) -> Result<MoveOutcome, ChessError> {
        if self.status.is_game_over() {
            return Err(ChessError::GameOver(self.status));
        }
        if self.pending_promotion.is_some() {
            return Err(ChessError::PromotionPending);
        }
        let piece = self
            .board
            .piece_at(from)
            .ok_or(ChessError::NoPieceAtOrigin(from))?;
        if piece.color != self.side_to_move {
            return Err(ChessError::WrongSideToMove {
                square: from,
                color: piece.color,
            });
        }
        if !movegen::legal_moves(&self.board, from, piece, self.preceding()).contains(&to) {
            return Err(ChessError::IllegalMove { from, to });
        }

        if piece.kind == PieceKind::Pawn && to.rank == piece.color.promotion_rank() {
            self.pending_promotion = Some((from, to));
            debug!(%from, %to, "promotion pending");
            return Ok(MoveOutcome::PromotionPending);
        }

        let san = self.apply(from, to, piece, None);
        Ok(MoveOutcome::Played(san))
    }

    /// Resolve a pending promotion with the chosen piece kind.
    ///
    /// The parked pawn move and the promotion are applied as one atomic
    /// step; an invalid choice leaves the promotion pending so the caller
    /// can retry. Returns the move's SAN (e.g. `e8=Q+`).
    pub fn apply_promotion(&mut self, choice: PieceKind) -> Result<String, ChessError> {
        let (from, to) = self
            .pending_promotion
            .ok_or(ChessError::NoPromotionPending)?;
        if !choice.is_promotion_choice() {
            return Err(ChessError::InvalidPromotionChoice(choice.to_string()));
        }
        let piece = self
            .board
            .piece_at(from)
            .ok_or(ChessError::NoPieceAtOrigin(from))?;
        self.pending_promotion = None;
        Ok(self.apply(from, to, piece, Some(choice)))
    }

    /// Apply a validated move: record it, mutate the board (including the
    /// castling rook and the en-passant pawn), update ledger and clocks,
    /// flip the side to move, and recompute the status. Returns the SAN.
    fn apply(&mut self, from: Square, to: Square, piece: Piece, promotion: Option<PieceKind>) -> String {
        let is_en_passant =
            piece.kind == PieceKind::Pawn && from.file != to.file && self.board.is_empty(to);
        let is_castling = piece.kind == PieceKind::King && from.file.abs_diff(to.file) == 2;
        let captured = if is_en_passant {
            self.board.piece_at(Square::new(to.file, from.rank))
        } else {
            self.board.piece_at(to)
        };

        let mut mv = Move {
            from,
            to,
            piece,
            captured,
            is_castling,
            is_en_passant,
            promotion,
            san: String::new(),
        };
        mv.san = san::move_to_san(&self.board, &mv, self.preceding());

        // Board mutation.
        if is_en_passant {
            self.board.set(Square::new(to.file, from.rank), None);
        }
        let mut placed = piece;
        placed.has_moved = true;
        if let Some(kind) = promotion {
            placed.kind = kind;
        }
        self.board.set(to, Some(placed));
        self.board.set(from, None);
        if is_castling {
            let (rook_from, rook_to) = if to.file > from.file { (7, 5) } else { (0, 3) };
            let rf = Square::new(rook_from, from.rank);
            if let Some(mut rook) = self.board.piece_at(rf) {
                rook.has_moved = true;
                self.board.set(Square::new(rook_to, from.rank), Some(rook));
                self.board.set(rf, None);
            }
        }

        // Ledger, clocks, side to move.
        if let Some(taken) = captured {
            self.captured[taken.color.index()].push(taken);
        }
        if piece.kind == PieceKind::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if self.side_to_move == Color::Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = !self.side_to_move;

        self.status = self.compute_status(Some(&mv));
        match self.status {
            GameStatus::Checkmate => mv.san.push('#'),
            GameStatus::Check => mv.san.push('+'),
            _ => {}
        }

        debug!(san = %mv.san, status = %self.status, "applied move");
        let san = mv.san.clone();
        self.move_history.push(mv);
        san
    }

    /// Status for the side to move, given the move just played (`last` feeds
    /// en-passant eligibility into the legal-move scan).
    fn compute_status(&self, last: Option<&Move>) -> GameStatus {
        let us = self.side_to_move;
        let in_check = attacks::is_king_in_check(&self.board, us);
        let any_legal = self
            .board
            .pieces_of(us)
            .any(|(sq, p)| !movegen::legal_moves(&self.board, sq, p, last).is_empty());

        if !any_legal {
            return if in_check {
                GameStatus::Checkmate
            } else {
                GameStatus::Draw(DrawReason::Stalemate)
            };
        }
        if self.halfmove_clock >= 100 {
            return GameStatus::Draw(DrawReason::FiftyMoveRule);
        }
        if insufficient_material(&self.board) {
            return GameStatus::Draw(DrawReason::InsufficientMaterial);
        }
        if in_check {
            GameStatus::Check
        } else {
            GameStatus::Active
        }
    }

    // -----------------------------------------------------------------------
    // FEN
    // -----------------------------------------------------------------------

    /// Load a position from Forsyth-Edwards Notation.
    ///
    /// Accepts 4 to 6 fields; missing clocks default to `0 1`. Castling
    /// rights are translated into `has_moved` flags on kings and rooks, and
    /// an en-passant target square is reconstructed as the double pawn push
    /// that must have just been played.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let invalid = |msg: &str| ChessError::InvalidFen(format!("{msg}: {fen}"));

        let parts: Vec<&str> = fen.split_whitespace().collect();
        if !(4..=6).contains(&parts.len()) {
            return Err(invalid("expected 4 to 6 fields"));
        }

        // Field 1: piece placement, rank 8 first.
        let ranks: Vec<&str> = parts[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(invalid("expected 8 ranks"));
        }
        let mut board = Board::empty();
        for (i, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - i as u8;
            let mut file = 0u8;
            for c in rank_str.chars() {
                if let Some(d) = c.to_digit(10) {
                    file += d as u8;
                } else {
                    let (color, kind) =
                        PieceKind::from_char(c).ok_or_else(|| invalid("bad piece character"))?;
                    if file >= 8 {
                        return Err(invalid("rank overflows 8 files"));
                    }
                    let mut piece = Piece::new(kind, color);
                    piece.has_moved = match kind {
                        PieceKind::Pawn => rank != color.pawn_start_rank(),
                        PieceKind::King => !(file == 4 && rank == color.back_rank()),
                        PieceKind::Rook => {
                            !((file == 0 || file == 7) && rank == color.back_rank())
                        }
                        _ => false,
                    };
                    board.set(Square::new(file, rank), Some(piece));
                    file += 1;
                }
            }
            if file != 8 {
                return Err(invalid("rank does not sum to 8 files"));
            }
        }
        for color in [Color::White, Color::Black] {
            let kings = board
                .pieces_of(color)
                .filter(|(_, p)| p.kind == PieceKind::King)
                .count();
            if kings != 1 {
                return Err(invalid("expected exactly one king per color"));
            }
        }

        // Field 2: side to move.
        let side_to_move = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return Err(invalid("side to move must be 'w' or 'b'")),
        };

        // Field 3: castling rights, translated into has_moved on the rooks.
        let rights = parts[2];
        if rights != "-" && (rights.is_empty() || rights.chars().any(|c| !"KQkq".contains(c))) {
            return Err(invalid("bad castling rights"));
        }
        for (right, file, rank) in [('K', 7, 0), ('Q', 0, 0), ('k', 7, 7), ('q', 0, 7)] {
            if !rights.contains(right) {
                let corner = Square::new(file, rank);
                if let Some(mut rook) = board.piece_at(corner)
                    && rook.kind == PieceKind::Rook
                {
                    rook.has_moved = true;
                    board.set(corner, Some(rook));
                }
            }
        }

        // Field 4: en-passant target, reconstructed as the preceding move.
        let mut move_history = Vec::new();
        if parts[3] != "-" {
            let target =
                Square::from_algebraic(parts[3]).ok_or_else(|| invalid("bad en-passant square"))?;
            let (color, from_rank, to_rank) = match target.rank {
                2 => (Color::White, 1u8, 3u8),
                5 => (Color::Black, 6, 4),
                _ => return Err(invalid("en-passant square must be on rank 3 or 6")),
            };
            let landing = Square::new(target.file, to_rank);
            match board.piece_at(landing) {
                Some(p) if p.kind == PieceKind::Pawn && p.color == color => {}
                _ => return Err(invalid("no pawn behind the en-passant square")),
            }
            move_history.push(Move {
                from: Square::new(target.file, from_rank),
                to: landing,
                piece: Piece::new(PieceKind::Pawn, color),
                captured: None,
                is_castling: false,
                is_en_passant: false,
                promotion: None,
                san: landing.to_algebraic(),
            });
        }

        // Fields 5 and 6: clocks.
        let halfmove_clock = match parts.get(4) {
            Some(s) => s.parse().map_err(|_| invalid("bad halfmove clock"))?,
            None => 0,
        };
        let fullmove_number = match parts.get(5) {
            Some(s) => s.parse().map_err(|_| invalid("bad fullmove number"))?,
            None => 1,
        };

        let mut game = Game {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            board,
            side_to_move,
            move_history,
            captured: [Vec::new(), Vec::new()],
            halfmove_clock,
            fullmove_number,
            status: GameStatus::Active,
            pending_promotion: None,
        };
        let last = game.move_history.last().cloned();
        game.status = game.compute_status(last.as_ref());
        Ok(game)
    }

    /// Serialize the current position to Forsyth-Edwards Notation.
    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(90);

        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                match self.board.piece_at(Square::new(file, rank)) {
                    None => empty += 1,
                    Some(p) => {
                        if empty > 0 {
                            fen.push((b'0' + empty) as char);
                            empty = 0;
                        }
                        fen.push(p.kind.to_char(p.color));
                    }
                }
            }
            if empty > 0 {
                fen.push((b'0' + empty) as char);
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        fen.push(' ');
        let mut rights = String::new();
        for (color, kingside, queenside) in
            [(Color::White, 'K', 'Q'), (Color::Black, 'k', 'q')]
        {
            if self.castling_possible(color, 7) {
                rights.push(kingside);
            }
            if self.castling_possible(color, 0) {
                rights.push(queenside);
            }
        }
        fen.push_str(if rights.is_empty() { "-" } else { &rights });

        fen.push(' ');
        match self.preceding() {
            Some(last) if last.is_double_pawn_push() => {
                let behind = Square::new(last.to.file, (last.from.rank + last.to.rank) / 2);
                fen.push_str(&behind.to_algebraic());
            }
            _ => fen.push('-'),
        }

        fen.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        fen
    }

    /// Unmoved king on its home square plus unmoved rook on `rook_file`.
    fn castling_possible(&self, color: Color, rook_file: u8) -> bool {
        let rank = color.back_rank();
        let king_home = matches!(
            self.board.piece_at(Square::new(4, rank)),
            Some(k) if k.kind == PieceKind::King && k.color == color && !k.has_moved
        );
        let rook_home = matches!(
            self.board.piece_at(Square::new(rook_file, rank)),
            Some(r) if r.kind == PieceKind::Rook && r.color == color && !r.has_moved
        );
        king_home && rook_home
    }
}

impl Default for Game {
    fn default() -> Self {
        Game::new()
    }
}

/// Neither side can possibly deliver mate: only the two kings remain, or
/// the two kings plus a single bishop or knight.
fn insufficient_material(board: &Board) -> bool {
    match board.piece_count() {
        2 => true,
        3 => board.occupied().any(|(_, p)| {
            matches!(p.kind, PieceKind::Bishop | PieceKind::Knight)
        }),
        _ => false,
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn play(game: &mut Game, from: &str, to: &str) -> String {
        match game.make_move(sq(from), sq(to)).unwrap() {
            MoveOutcome::Played(san) => san,
            MoveOutcome::PromotionPending => panic!("unexpected promotion for {from}{to}"),
        }
    }

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    // -------------------------------------------------------------------
    // Basics
    // -------------------------------------------------------------------

    #[test]
    fn new_game_state() {
        let game = Game::new();
        assert_eq!(game.side_to_move(), Color::White);
        assert_eq!(game.status(), GameStatus::Active);
        assert_eq!(game.halfmove_clock(), 0);
        assert_eq!(game.fullmove_number(), 1);
        assert!(game.move_history().is_empty());
        assert!(!game.id.is_empty());
    }

    #[test]
    fn twenty_legal_moves_at_start() {
        assert_eq!(Game::new().legal_moves().len(), 20);
    }

    #[test]
    fn simple_move_flips_side_and_records_history() {
        let mut game = Game::new();
        assert_eq!(play(&mut game, "e2", "e4"), "e4");
        assert_eq!(game.side_to_move(), Color::Black);
        assert_eq!(game.move_history().len(), 1);
        assert_eq!(game.move_history()[0].san, "e4");
        assert!(game.board().is_empty(sq("e2")));
        assert_eq!(
            game.board().piece_at(sq("e4")).map(|p| p.kind),
            Some(PieceKind::Pawn)
        );
    }

    #[test]
    fn moved_piece_is_flagged() {
        let mut game = Game::new();
        play(&mut game, "g1", "f3");
        assert!(game.board().piece_at(sq("f3")).unwrap().has_moved);
    }

    // -------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------

    #[test]
    fn rejects_empty_origin() {
        let mut game = Game::new();
        assert!(matches!(
            game.make_move(sq("e4"), sq("e5")),
            Err(ChessError::NoPieceAtOrigin(_))
        ));
    }

    #[test]
    fn rejects_wrong_side() {
        let mut game = Game::new();
        assert!(matches!(
            game.make_move(sq("e7"), sq("e5")),
            Err(ChessError::WrongSideToMove { .. })
        ));
    }

    #[test]
    fn rejects_illegal_move() {
        let mut game = Game::new();
        assert!(matches!(
            game.make_move(sq("e2"), sq("e5")),
            Err(ChessError::IllegalMove { .. })
        ));
    }

    #[test]
    fn failed_move_leaves_state_unchanged() {
        let mut game = Game::new();
        let before = game.to_fen();
        let _ = game.make_move(sq("e2"), sq("e5"));
        let _ = game.make_move(sq("e7"), sq("e5"));
        assert_eq!(game.to_fen(), before);
        assert!(game.move_history().is_empty());
    }

    #[test]
    fn legal_destinations_errors() {
        let game = Game::new();
        assert!(matches!(
            game.legal_destinations(sq("e4")),
            Err(ChessError::NoPieceAtOrigin(_))
        ));
        assert!(matches!(
            game.legal_destinations(sq("e7")),
            Err(ChessError::WrongSideToMove { .. })
        ));
        let dests = game.legal_destinations(sq("e2")).unwrap();
        assert_eq!(dests, vec![sq("e3"), sq("e4")]);
    }

    // -------------------------------------------------------------------
    // Captures and the ledger
    // -------------------------------------------------------------------

    #[test]
    fn capture_records_into_ledger() {
        let mut game = Game::new();
        play(&mut game, "e2", "e4");
        play(&mut game, "d7", "d5");
        assert_eq!(play(&mut game, "e4", "d5"), "exd5");
        let black_losses = game.captured_pieces(Color::Black);
        assert_eq!(black_losses.len(), 1);
        assert_eq!(black_losses[0].kind, PieceKind::Pawn);
        assert!(game.captured_pieces(Color::White).is_empty());
    }

    #[test]
    fn halfmove_clock_resets_on_pawn_moves_and_captures() {
        let mut game = Game::new();
        play(&mut game, "g1", "f3");
        assert_eq!(game.halfmove_clock(), 1);
        play(&mut game, "b8", "c6");
        assert_eq!(game.halfmove_clock(), 2);
        play(&mut game, "e2", "e4");
        assert_eq!(game.halfmove_clock(), 0);
    }

    #[test]
    fn fullmove_number_increments_after_black() {
        let mut game = Game::new();
        play(&mut game, "e2", "e4");
        assert_eq!(game.fullmove_number(), 1);
        play(&mut game, "e7", "e5");
        assert_eq!(game.fullmove_number(), 2);
    }

    // -------------------------------------------------------------------
    // Check and checkmate
    // -------------------------------------------------------------------

    #[test]
    fn check_is_reported_with_suffix() {
        // 1. e4 f6 2. Qh5+
        let mut game = Game::new();
        play(&mut game, "e2", "e4");
        play(&mut game, "f7", "f6");
        assert_eq!(play(&mut game, "d1", "h5"), "Qh5+");
        assert_eq!(game.status(), GameStatus::Check);
    }

    #[test]
    fn fools_mate() {
        // 1. f3 e5 2. g4 Qh4#
        let mut game = Game::new();
        play(&mut game, "f2", "f3");
        play(&mut game, "e7", "e5");
        play(&mut game, "g2", "g4");
        assert_eq!(play(&mut game, "d8", "h4"), "Qh4#");
        assert_eq!(game.status(), GameStatus::Checkmate);
        assert!(game.status().is_game_over());
        assert!(game.legal_moves().is_empty());
        assert!(matches!(
            game.make_move(sq("e2"), sq("e4")),
            Err(ChessError::GameOver(GameStatus::Checkmate))
        ));
    }

    // -------------------------------------------------------------------
    // Castling
    // -------------------------------------------------------------------

    #[test]
    fn kingside_castling_moves_both_pieces_in_one_record() {
        let mut game =
            Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        assert_eq!(play(&mut game, "e1", "g1"), "O-O");
        assert_eq!(game.move_history().len(), 1);
        assert!(game.move_history()[0].is_castling);
        let king = game.board().piece_at(sq("g1")).unwrap();
        let rook = game.board().piece_at(sq("f1")).unwrap();
        assert_eq!(king.kind, PieceKind::King);
        assert_eq!(rook.kind, PieceKind::Rook);
        assert!(king.has_moved && rook.has_moved);
        assert!(game.board().is_empty(sq("e1")));
        assert!(game.board().is_empty(sq("h1")));
    }

    #[test]
    fn queenside_castling() {
        let mut game =
            Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 0 1").unwrap();
        assert_eq!(play(&mut game, "e8", "c8"), "O-O-O");
        assert_eq!(
            game.board().piece_at(sq("d8")).map(|p| p.kind),
            Some(PieceKind::Rook)
        );
        assert!(game.board().is_empty(sq("a8")));
    }

    // -------------------------------------------------------------------
    // En passant
    // -------------------------------------------------------------------

    #[test]
    fn en_passant_window_is_one_ply() {
        // 1. e4 a6 2. e5 d5: exd6 is available immediately...
        let mut game = Game::new();
        play(&mut game, "e2", "e4");
        play(&mut game, "a7", "a6");
        play(&mut game, "e4", "e5");
        play(&mut game, "d7", "d5");
        assert!(game.legal_destinations(sq("e5")).unwrap().contains(&sq("d6")));

        // ...but gone after an intervening move pair.
        let mut delayed = game.clone();
        play(&mut delayed, "b1", "c3");
        play(&mut delayed, "a6", "a5");
        assert!(!delayed.legal_destinations(sq("e5")).unwrap().contains(&sq("d6")));
    }

    #[test]
    fn en_passant_removes_pawn_beside_not_behind() {
        let mut game = Game::from_fen("k7/8/8/3pP3/8/8/8/K7 w - d6 0 1").unwrap();
        assert_eq!(play(&mut game, "e5", "d6"), "exd6");
        assert!(game.board().is_empty(sq("d5")), "captured pawn removed from d5");
        assert_eq!(
            game.board().piece_at(sq("d6")).map(|p| p.kind),
            Some(PieceKind::Pawn)
        );
        assert_eq!(game.captured_pieces(Color::Black).len(), 1);
        assert!(game.move_history().last().unwrap().is_en_passant);
    }

    // -------------------------------------------------------------------
    // Promotion
    // -------------------------------------------------------------------

    #[test]
    fn promotion_is_two_phase_and_non_mutating() {
        let mut game = Game::from_fen("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let outcome = game.make_move(sq("a7"), sq("a8")).unwrap();
        assert_eq!(outcome, MoveOutcome::PromotionPending);
        assert_eq!(game.pending_promotion(), Some((sq("a7"), sq("a8"))));

        // Nothing applied yet: pawn still on a7, White still to move.
        assert_eq!(
            game.board().piece_at(sq("a7")).map(|p| p.kind),
            Some(PieceKind::Pawn)
        );
        assert_eq!(game.side_to_move(), Color::White);
        assert!(game.move_history().is_empty());

        // Ordinary moves are refused while the choice is pending.
        assert!(matches!(
            game.make_move(sq("a1"), sq("a2")),
            Err(ChessError::PromotionPending)
        ));

        // An invalid choice is rejected and the promotion stays pending.
        assert!(matches!(
            game.apply_promotion(PieceKind::King),
            Err(ChessError::InvalidPromotionChoice(_))
        ));
        assert!(game.pending_promotion().is_some());

        // a8=Q checks the king on h8 along the back rank.
        let san = game.apply_promotion(PieceKind::Queen).unwrap();
        assert_eq!(san, "a8=Q+");
        assert_eq!(
            game.board().piece_at(sq("a8")).map(|p| p.kind),
            Some(PieceKind::Queen)
        );
        assert!(game.board().is_empty(sq("a7")));
        assert_eq!(game.side_to_move(), Color::Black);
        assert_eq!(game.status(), GameStatus::Check);
        assert!(game.pending_promotion().is_none());
    }

    #[test]
    fn underpromotion_to_knight() {
        let mut game = Game::from_fen("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        assert_eq!(
            game.make_move(sq("a7"), sq("a8")).unwrap(),
            MoveOutcome::PromotionPending
        );
        let san = game.apply_promotion(PieceKind::Knight).unwrap();
        assert_eq!(san, "a8=N");
        assert_eq!(
            game.board().piece_at(sq("a8")).map(|p| p.kind),
            Some(PieceKind::Knight)
        );
    }

    #[test]
    fn apply_promotion_without_pending_is_an_error() {
        let mut game = Game::new();
        assert!(matches!(
            game.apply_promotion(PieceKind::Queen),
            Err(ChessError::NoPromotionPending)
        ));
    }

    #[test]
    fn move_requires_promotion_choice_pattern() {
        let game = Game::from_fen("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        assert!(game.move_requires_promotion_choice(sq("a7"), sq("a8")));
        assert!(!game.move_requires_promotion_choice(sq("a1"), sq("a2")));
    }

    // -------------------------------------------------------------------
    // Draws
    // -------------------------------------------------------------------

    #[test]
    fn stalemate_detected() {
        // Black to move: king on a8 has no moves and is not in check.
        let game = Game::from_fen("k7/8/1Q6/8/8/8/8/K7 b - - 0 1").unwrap();
        assert_eq!(game.status(), GameStatus::Draw(DrawReason::Stalemate));
        assert!(game.status().is_game_over());
    }

    #[test]
    fn fifty_move_rule_at_one_hundred_plies() {
        let mut game = Game::from_fen("k7/8/8/8/8/8/8/K6R w - - 99 80").unwrap();
        play(&mut game, "h1", "h2");
        assert_eq!(game.halfmove_clock(), 100);
        assert_eq!(game.status(), GameStatus::Draw(DrawReason::FiftyMoveRule));
    }

    #[test]
    fn capture_resets_clock_and_avoids_fifty_move_draw() {
        let mut game = Game::from_fen("k6r/8/8/8/8/8/8/K6R w - - 99 80").unwrap();
        play(&mut game, "h1", "h8");
        assert_eq!(game.halfmove_clock(), 0);
        assert_ne!(game.status(), GameStatus::Draw(DrawReason::FiftyMoveRule));
    }

    #[test]
    fn insufficient_material_after_last_capture() {
        // Bxd3 leaves king + bishop vs king.
        let mut game = Game::from_fen("k7/8/8/8/8/3r4/2B5/K7 w - - 0 1").unwrap();
        play(&mut game, "c2", "d3");
        assert_eq!(
            game.status(),
            GameStatus::Draw(DrawReason::InsufficientMaterial)
        );
    }

    #[test]
    fn two_kings_is_insufficient() {
        let game = Game::from_fen("k7/8/8/8/8/8/8/K7 w - - 0 1").unwrap();
        assert_eq!(
            game.status(),
            GameStatus::Draw(DrawReason::InsufficientMaterial)
        );
    }

    #[test]
    fn king_and_rook_is_sufficient() {
        let game = Game::from_fen("k7/8/8/8/8/8/8/K6R w - - 0 1").unwrap();
        assert_eq!(game.status(), GameStatus::Active);
    }

    // -------------------------------------------------------------------
    // FEN
    // -------------------------------------------------------------------

    #[test]
    fn new_game_fen_round_trip() {
        let game = Game::new();
        assert_eq!(game.to_fen(), START_FEN);
        let reloaded = Game::from_fen(START_FEN).unwrap();
        assert_eq!(reloaded.to_fen(), START_FEN);
        assert_eq!(reloaded.legal_moves().len(), 20);
    }

    #[test]
    fn fen_records_en_passant_target_after_double_push() {
        let mut game = Game::new();
        play(&mut game, "e2", "e4");
        assert_eq!(
            game.to_fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );
    }

    #[test]
    fn fen_castling_rights_follow_rook_and_king_moves() {
        let mut game = Game::new();
        play(&mut game, "h2", "h4");
        play(&mut game, "e7", "e5");
        play(&mut game, "h1", "h3");
        assert!(game.to_fen().contains(" Qkq "));
    }

    #[test]
    fn from_fen_respects_castling_rights_field() {
        let game = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w Kq - 0 1").unwrap();
        let dests = game.legal_destinations(sq("e1")).unwrap();
        assert!(dests.contains(&sq("g1")), "kingside right kept");
        assert!(!dests.contains(&sq("c1")), "queenside right revoked");
        let fen = game.to_fen();
        assert!(fen.contains(" Kq "));
    }

    #[test]
    fn from_fen_en_passant_is_immediately_playable() {
        let game = Game::from_fen("k7/8/8/3pP3/8/8/8/K7 w - d6 0 1").unwrap();
        assert!(game.legal_destinations(sq("e5")).unwrap().contains(&sq("d6")));
    }

    #[test]
    fn from_fen_rejects_garbage() {
        for bad in [
            "",
            "not a fen",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR", // too few fields
            "rnbqkbnr/pppppppp/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", // 7 ranks
            "rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", // rank sums to 9
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1", // bad side
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQxq - 0 1", // bad rights
            "8/8/8/8/8/8/8/8 w - - 0 1",                   // no kings
            "kk6/8/8/8/8/8/8/K7 w - - 0 1",                // two black kings
            "k7/8/8/8/8/8/8/K7 w - e6 0 1",                // ep without a pawn
        ] {
            assert!(Game::from_fen(bad).is_err(), "accepted bad FEN: {bad}");
        }
    }

    #[test]
    fn loaded_check_position_reports_check() {
        let game = Game::from_fen("k7/8/8/8/8/8/8/Kq6 w - - 0 1").unwrap();
        assert_eq!(game.status(), GameStatus::Check);
    }

    #[test]
    fn serde_round_trip() {
        let mut game = Game::new();
        play(&mut game, "e2", "e4");
        play(&mut game, "c7", "c5");
        let json = serde_json::to_string(&game).unwrap();
        let back: Game = serde_json::from_str(&json).unwrap();
        assert_eq!(back.to_fen(), game.to_fen());
        assert_eq!(back.move_history(), game.move_history());
    }
}
