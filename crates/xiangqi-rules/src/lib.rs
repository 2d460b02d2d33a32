//! Pure Xiangqi rules engine.
//!
//! No I/O, no concurrency: board representation, move validation and move
//! application only. Consumers (the room layer) own all game-session state
//! and transport concerns.

mod board;
mod error;
mod game;
mod moves;

pub use board::{
    in_bounds, in_palace, initial_board, Board, Color, Piece, PieceType, COLS, ROWS,
};
pub use error::MoveError;
pub use game::{ApplyOutcome, Game, GameStatus};
pub use moves::{kings_face_each_other, validate_move};
