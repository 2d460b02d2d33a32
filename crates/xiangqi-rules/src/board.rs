use serde::{Deserialize, Serialize};

pub const ROWS: usize = 10;
pub const COLS: usize = 9;

/// River boundary: red pieces live on rows 0..=4, black on rows 5..=9.
pub const RIVER_RED_SIDE: usize = 4;
pub const RIVER_BLACK_SIDE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Black,
}

impl Color {
    pub fn opposite(self) -> Color {
        match self {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceType {
    King,
    Advisor,
    Elephant,
    Horse,
    Rook,
    Cannon,
    Pawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    #[serde(rename = "type")]
    pub piece_type: PieceType,
    pub color: Color,
}

impl Piece {
    pub fn new(piece_type: PieceType, color: Color) -> Self {
        Self { piece_type, color }
    }
}

/// A 10-row by 9-column grid of optional pieces, indexed `[row][col]`.
///
/// Row 0 is red's back rank, row 9 is black's. This mirrors the layout the
/// wire format serializes directly (§6 board serialization).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board(pub [[Option<Piece>; COLS]; ROWS]);

impl Board {
    pub fn empty() -> Self {
        Board([[None; COLS]; ROWS])
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Piece> {
        self.0[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize, piece: Option<Piece>) {
        self.0[row][col] = piece;
    }

    pub fn find_king(&self, color: Color) -> Option<(usize, usize)> {
        for row in 0..ROWS {
            for col in 0..COLS {
                if let Some(p) = self.0[row][col] {
                    if p.piece_type == PieceType::King && p.color == color {
                        return Some((row, col));
                    }
                }
            }
        }
        None
    }
}

pub fn in_bounds(row: i32, col: i32) -> bool {
    row >= 0 && row < ROWS as i32 && col >= 0 && col < COLS as i32
}

/// Palace bounds for the owning color: rows 0-2 cols 3-5 (red), rows 7-9
/// cols 3-5 (black).
pub fn in_palace(color: Color, row: usize, col: usize) -> bool {
    if !(3..=5).contains(&col) {
        return false;
    }
    match color {
        Color::Red => row <= 2,
        Color::Black => row >= 7,
    }
}

/// Builds the canonical Xiangqi starting position (§4.2).
pub fn initial_board() -> Board {
    let mut board = Board::empty();

    let back_rank = [
        PieceType::Rook,
        PieceType::Horse,
        PieceType::Elephant,
        PieceType::Advisor,
        PieceType::King,
        PieceType::Advisor,
        PieceType::Elephant,
        PieceType::Horse,
        PieceType::Rook,
    ];
    for (col, piece_type) in back_rank.iter().enumerate() {
        board.set(0, col, Some(Piece::new(*piece_type, Color::Red)));
        board.set(9, col, Some(Piece::new(*piece_type, Color::Black)));
    }

    for col in [1, 7] {
        board.set(2, col, Some(Piece::new(PieceType::Cannon, Color::Red)));
        board.set(7, col, Some(Piece::new(PieceType::Cannon, Color::Black)));
    }

    for col in [0, 2, 4, 6, 8] {
        board.set(3, col, Some(Piece::new(PieceType::Pawn, Color::Red)));
        board.set(6, col, Some(Piece::new(PieceType::Pawn, Color::Black)));
    }

    board
}
