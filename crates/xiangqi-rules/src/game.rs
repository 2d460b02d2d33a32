use serde::{Deserialize, Serialize};

use crate::board::{initial_board, Board, Color};
use crate::error::MoveError;
use crate::moves::validate_move;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Waiting,
    Playing,
    Finished,
}

/// A single game in progress: board, whose turn it is, and terminal state.
///
/// Checkmate/stalemate detection is intentionally out of scope — the only
/// terminal condition this engine recognizes is a captured king.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub board: Board,
    pub current_player: Color,
    pub status: GameStatus,
    pub winner: Option<Color>,
}

/// Outcome of a successfully applied move: the new turn and, if the move
/// ended the game, the winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub current_player: Color,
    pub status: GameStatus,
    pub winner: Option<Color>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    pub fn new() -> Self {
        Self {
            board: initial_board(),
            current_player: Color::Red,
            status: GameStatus::Waiting,
            winner: None,
        }
    }

    /// Validates and, if legal, applies `mover`'s move. On success the
    /// board, turn and terminal state are updated and the outcome is
    /// returned. On rejection the game is left untouched.
    pub fn try_move(
        &mut self,
        mover: Color,
        from_row: i32,
        from_col: i32,
        to_row: i32,
        to_col: i32,
    ) -> Result<ApplyOutcome, MoveError> {
        validate_move(self, mover, from_row, from_col, to_row, to_col)?;

        let (fr, fc, tr, tc) = (
            from_row as usize,
            from_col as usize,
            to_row as usize,
            to_col as usize,
        );
        let piece = self.board.get(fr, fc);
        self.board.set(tr, tc, piece);
        self.board.set(fr, fc, None);
        self.current_player = self.current_player.opposite();

        if self.board.find_king(Color::Red).is_none() {
            self.status = GameStatus::Finished;
            self.winner = Some(Color::Black);
        } else if self.board.find_king(Color::Black).is_none() {
            self.status = GameStatus::Finished;
            self.winner = Some(Color::Red);
        }

        Ok(ApplyOutcome {
            current_player: self.current_player,
            status: self.status,
            winner: self.winner,
        })
    }
}
